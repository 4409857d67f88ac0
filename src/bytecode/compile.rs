use log::{debug, trace, warn};

use crate::{
    bytecode::{
        compile_error::CompileError,
        dispatch::{self, Descriptor, Routine},
        op::{BinaryKind, Op, OpArray, OpId, OpLine, UnaryKind},
    },
    lang::{
        node::{Child, Node},
        slot::ValueSlot,
        value::{ParamRecord, Value},
    },
};

/// Translates syntax trees into op-lines.
///
/// A compiler hands out op-line handles from a private counter, so every
/// handle it emits is unique for the compiler's lifetime. Jump op-lines
/// refer to their targets by these handles.
pub struct Compiler {
    /// Next op-line handle
    next_id: u32,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    pub fn new() -> Self {
        Self { next_id: 0 }
    }

    /// Compile a statement list.
    ///
    /// `context` is the return context: when given, every top-level node
    /// writes its result there instead of into a fresh slot. The first
    /// unsupported node aborts the whole compilation.
    pub fn compile(
        &mut self,
        ast: &[Node],
        context: Option<&ValueSlot>,
    ) -> Result<OpArray, CompileError> {
        let mut ops = Vec::new();
        for node in ast {
            ops.extend(self.compile_node(node, context)?);
        }

        Ok(ops)
    }

    fn compile_node(
        &mut self,
        node: &Node,
        context: Option<&ValueSlot>,
    ) -> Result<OpArray, CompileError> {
        if let Some(descriptor) = dispatch::descriptor(&node.kind) {
            trace!("{} -> {:?}", node.kind, descriptor);
            return match descriptor {
                Descriptor::ArrayOp { field } => self.compile_array(node, context, field),
                Descriptor::ScalarOp { field, separator } => {
                    Ok(self.compile_scalar(node, context, field, separator))
                }
                Descriptor::UnaryOp { kind, field } => {
                    self.compile_unary(node, context, kind, field)
                }
                Descriptor::BinaryOp { kind, left, right } => {
                    self.compile_binary(node, context, kind, left, right)
                }
            };
        }

        let Some(routine) = dispatch::routine(&node.kind) else {
            return Err(CompileError::unsupported(&node.kind));
        };

        debug!("compiling {} with {:?} routine", node.kind, routine);
        match routine {
            Routine::Param => self.compile_param(node, context),
            Routine::Function => self.compile_function(node),
            Routine::If => self.compile_if(node),
            Routine::While => self.compile_while(node),
            Routine::Do => self.compile_do(node),
            Routine::InlineHtml => Ok(self.compile_inline_html(node)),
        }
    }

    /// Compile the content of `field`, writing into `context`.
    ///
    /// A field holding exactly one literal is folded into the context
    /// directly (tagged `String`) and produces no op-lines.
    fn compile_child(
        &mut self,
        node: &Node,
        field: &str,
        context: Option<&ValueSlot>,
    ) -> Result<OpArray, CompileError> {
        let elements = match node.field(field) {
            None | Some(Child::Null) => return Ok(Vec::new()),
            Some(Child::List(items)) => items.as_slice(),
            Some(child) => std::slice::from_ref(child),
        };

        if let (Some(context), [Child::Scalar(scalar)]) = (context, elements) {
            context.set_literal(scalar);
            return Ok(Vec::new());
        }

        self.compile_elements(elements, context)
    }

    fn compile_elements(
        &mut self,
        elements: &[Child],
        context: Option<&ValueSlot>,
    ) -> Result<OpArray, CompileError> {
        let mut ops = Vec::new();
        for element in elements {
            match element {
                Child::Node(child) => ops.extend(self.compile_node(child, context)?),
                Child::List(nested) => ops.extend(self.compile_elements(nested, context)?),
                Child::Scalar(scalar) => {
                    warn!("dropping literal '{}' inside a multi-element field", scalar)
                }
                Child::Null => {}
            }
        }

        Ok(ops)
    }

    // =========================================================================
    // Generic strategies
    // =========================================================================

    fn compile_scalar(
        &self,
        node: &Node,
        context: Option<&ValueSlot>,
        field: &str,
        separator: Option<&str>,
    ) -> OpArray {
        if let Some(context) = context {
            let value = match (node.field(field), separator) {
                (Some(Child::List(parts)), Some(separator)) => {
                    Value::String(join_parts(parts, separator))
                }
                (Some(child), _) => child_value(child),
                (None, _) => Value::Null,
            };
            context.assign(value);
        }

        Vec::new()
    }

    fn compile_unary(
        &mut self,
        node: &Node,
        context: Option<&ValueSlot>,
        kind: UnaryKind,
        field: &str,
    ) -> Result<OpArray, CompileError> {
        let op1 = ValueSlot::new();
        let mut ops = self.compile_child(node, field, Some(&op1))?;

        let result = result_slot(context);
        ops.push(self.emit(Op::Unary { kind, op1, result }));
        Ok(ops)
    }

    fn compile_binary(
        &mut self,
        node: &Node,
        context: Option<&ValueSlot>,
        kind: BinaryKind,
        left: &str,
        right: &str,
    ) -> Result<OpArray, CompileError> {
        let op1 = ValueSlot::new();
        let op2 = ValueSlot::new();
        let mut ops = self.compile_child(node, left, Some(&op1))?;
        ops.extend(self.compile_child(node, right, Some(&op2))?);

        let result = result_slot(context);
        ops.push(self.emit(Op::Binary {
            kind,
            op1,
            op2,
            result,
        }));
        Ok(ops)
    }

    fn compile_array(
        &mut self,
        node: &Node,
        context: Option<&ValueSlot>,
        field: &str,
    ) -> Result<OpArray, CompileError> {
        let op1 = ValueSlot::new();
        let ops = self.compile_child(node, field, Some(&op1))?;

        if let Some(context) = context {
            context.push(Value::Slot(op1));
        }
        Ok(ops)
    }

    // =========================================================================
    // Functions
    // =========================================================================

    fn compile_param(
        &mut self,
        node: &Node,
        context: Option<&ValueSlot>,
    ) -> Result<OpArray, CompileError> {
        let default = ValueSlot::new();
        let ops = self.compile_child(node, "default", Some(&default))?;

        if let Some(context) = context {
            context.push(Value::Param(ParamRecord {
                name: node
                    .scalar("name")
                    .map(|name| name.to_string())
                    .unwrap_or_default(),
                default,
                ops,
                by_ref: node.flag("byRef"),
                type_hint: node.field("type").and_then(type_hint),
            }));
        }

        // Default-value op-lines travel inside the record.
        Ok(Vec::new())
    }

    fn compile_function(&mut self, node: &Node) -> Result<OpArray, CompileError> {
        let stmts = self.compile_child(node, "stmts", None)?;

        let name = ValueSlot::new();
        let mut ops = self.compile_child(node, "name", Some(&name))?;

        let params = ValueSlot::with_value(Value::Array(Vec::new()));
        ops.extend(self.compile_child(node, "params", Some(&params))?);

        debug!(
            "function {:?}: {} body op-lines, {} params",
            name.value(),
            stmts.len(),
            params.elements().len()
        );

        ops.push(self.emit(Op::FunctionDef {
            name,
            stmts,
            params,
        }));
        Ok(ops)
    }

    // =========================================================================
    // Control flow
    // =========================================================================

    /// Layout:
    /// ```text
    ///   <cond>        JUMP_IF_NOT cond -> mid     <stmts>   JUMP -> end   mid:
    ///   <cond'>       JUMP_IF_NOT cond' -> mid'   <stmts'>  JUMP -> end   mid':
    ///   <else stmts>
    ///   end:
    /// ```
    fn compile_if(&mut self, node: &Node) -> Result<OpArray, CompileError> {
        let end = self.label();

        let mut ops = self.compile_branch(node, end.id())?;
        for branch in node.nodes("elseifs") {
            ops.extend(self.compile_branch(branch, end.id())?);
        }

        // Reached only by falling through the last mid label.
        for otherwise in node.nodes("else") {
            ops.extend(self.compile_child(otherwise, "stmts", None)?);
        }

        ops.push(end);
        Ok(ops)
    }

    /// One guarded `cond`/`stmts` pair ending in a jump to `end`.
    fn compile_branch(&mut self, branch: &Node, end: OpId) -> Result<OpArray, CompileError> {
        let cond = ValueSlot::new();
        let mut ops = self.compile_child(branch, "cond", Some(&cond))?;

        let mid = self.label();
        ops.push(self.emit(Op::JumpIfNot {
            cond,
            target: mid.id(),
        }));
        ops.extend(self.compile_child(branch, "stmts", None)?);
        ops.push(self.emit(Op::JumpTo { target: end }));
        ops.push(mid);

        Ok(ops)
    }

    /// Layout: `<cond> JUMP_IF_NOT cond -> end <stmts> JUMP -> ops[0] end:`
    ///
    /// The back jump goes to the first op-line of the sequence. When the
    /// condition emits nothing that first op-line is the guard itself.
    fn compile_while(&mut self, node: &Node) -> Result<OpArray, CompileError> {
        let cond = ValueSlot::new();
        let mut ops = self.compile_child(node, "cond", Some(&cond))?;

        let end = self.label();
        ops.push(self.emit(Op::JumpIfNot {
            cond,
            target: end.id(),
        }));
        ops.extend(self.compile_child(node, "stmts", None)?);

        // ops holds at least the guard
        let head = ops[0].id();
        ops.push(self.emit(Op::JumpTo { target: head }));
        ops.push(end);

        Ok(ops)
    }

    /// Layout: `<stmts> <cond> JUMP_IF cond -> ops[0]`
    fn compile_do(&mut self, node: &Node) -> Result<OpArray, CompileError> {
        let cond = ValueSlot::new();
        let mut ops = self.compile_child(node, "stmts", None)?;
        ops.extend(self.compile_child(node, "cond", Some(&cond))?);

        // An empty loop jumps onto itself.
        let id = self.next_id();
        let target = ops.first().map_or(id, OpLine::id);
        ops.push(OpLine::new(id, Op::JumpIf { cond, target }));

        Ok(ops)
    }

    // =========================================================================
    // Template text
    // =========================================================================

    fn compile_inline_html(&mut self, node: &Node) -> OpArray {
        let text = node.field("value").map(child_value).unwrap_or_default();

        vec![self.emit(Op::Unary {
            kind: UnaryKind::EchoOp,
            op1: ValueSlot::with_value(text),
            result: ValueSlot::new(),
        })]
    }

    // =========================================================================
    // Emission helpers
    // =========================================================================

    fn next_id(&mut self) -> OpId {
        let id = OpId(self.next_id);
        self.next_id += 1;
        id
    }

    fn emit(&mut self, op: Op) -> OpLine {
        let id = self.next_id();
        OpLine::new(id, op)
    }

    fn label(&mut self) -> OpLine {
        self.emit(Op::NoOp)
    }
}

/// The caller's context, or a fresh slot when there is none.
fn result_slot(context: Option<&ValueSlot>) -> ValueSlot {
    context.cloned().unwrap_or_default()
}

fn join_parts(parts: &[Child], separator: &str) -> String {
    parts
        .iter()
        .filter_map(|part| match part {
            Child::Scalar(scalar) => Some(scalar.to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(separator)
}

/// Literal content of a field as a runtime value.
fn child_value(child: &Child) -> Value {
    match child {
        Child::Null => Value::Null,
        Child::Scalar(scalar) => Value::from(scalar),
        Child::List(items) => Value::Array(items.iter().map(child_value).collect()),
        Child::Node(node) => {
            warn!("expected a literal, found a {} node", node.kind);
            Value::Null
        }
    }
}

/// Declared parameter type: a bare string or a `Name` node.
fn type_hint(child: &Child) -> Option<String> {
    match child {
        Child::Scalar(scalar) => Some(scalar.to_string()),
        Child::Node(node) => match node.field("parts") {
            Some(Child::List(parts)) => Some(join_parts(parts, "\\")),
            _ => Some(node.kind.to_string()),
        },
        Child::Null | Child::List(_) => None,
    }
}
