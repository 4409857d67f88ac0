//! Linking pass: op-line handles become positions, shared slots become
//! indices into one slot table.

use std::collections::HashMap;

use log::debug;
use thiserror::Error;

use crate::bytecode::ir::{Image, LinkedOp, SlotImage, SlotRef, ValueImage};
use crate::bytecode::op::{Op, OpId, OpLine};
use crate::lang::slot::ValueSlot;
use crate::lang::value::Value;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    /// A jump names an op-line that is not in its sequence
    #[error("link error: jump target {target} is not in the same op-line sequence")]
    UnresolvedTarget { target: OpId },

    /// Two op-lines in one sequence carry the same handle
    #[error("link error: op-line handle {id} appears twice")]
    DuplicateId { id: OpId },
}

/// Link a compiled op-line sequence into an [`Image`].
///
/// Each sequence (the top level, every function body, every parameter
/// default) resolves its jumps against its own positions.
pub fn link(ops: &[OpLine]) -> Result<Image, LinkError> {
    let mut linker = Linker::default();
    let ops = linker.link_ops(ops)?;

    debug!("linked {} op-lines, {} slots", ops.len(), linker.slots.len());
    Ok(Image {
        ops,
        slots: linker.slots,
    })
}

#[derive(Default)]
struct Linker {
    slots: Vec<SlotImage>,
    /// Slot storage address -> table index
    index: HashMap<*const (), SlotRef>,
}

impl Linker {
    fn link_ops(&mut self, ops: &[OpLine]) -> Result<Vec<LinkedOp>, LinkError> {
        let mut positions = HashMap::with_capacity(ops.len());
        for (position, line) in ops.iter().enumerate() {
            if positions.insert(line.id(), position as u32).is_some() {
                return Err(LinkError::DuplicateId { id: line.id() });
            }
        }

        ops.iter()
            .map(|line| self.link_op(line.op(), &positions))
            .collect()
    }

    fn link_op(&mut self, op: &Op, positions: &HashMap<OpId, u32>) -> Result<LinkedOp, LinkError> {
        let resolve = |target: OpId| {
            positions
                .get(&target)
                .copied()
                .ok_or(LinkError::UnresolvedTarget { target })
        };

        Ok(match op {
            Op::Unary { kind, op1, result } => LinkedOp::Unary {
                kind: *kind,
                op1: self.slot(op1)?,
                result: self.slot(result)?,
            },
            Op::Binary {
                kind,
                op1,
                op2,
                result,
            } => LinkedOp::Binary {
                kind: *kind,
                op1: self.slot(op1)?,
                op2: self.slot(op2)?,
                result: self.slot(result)?,
            },
            Op::FunctionDef {
                name,
                stmts,
                params,
            } => LinkedOp::FunctionDef {
                name: self.slot(name)?,
                body: self.link_ops(stmts)?,
                params: self.slot(params)?,
            },
            Op::JumpTo { target } => LinkedOp::JumpTo {
                target: resolve(*target)?,
            },
            Op::JumpIf { cond, target } => LinkedOp::JumpIf {
                cond: self.slot(cond)?,
                target: resolve(*target)?,
            },
            Op::JumpIfNot { cond, target } => LinkedOp::JumpIfNot {
                cond: self.slot(cond)?,
                target: resolve(*target)?,
            },
            Op::NoOp => LinkedOp::NoOp,
        })
    }

    /// Table index of `slot`, registering it on first sight.
    fn slot(&mut self, slot: &ValueSlot) -> Result<SlotRef, LinkError> {
        if let Some(existing) = self.index.get(&slot.addr()) {
            return Ok(*existing);
        }

        let slot_ref = SlotRef(self.slots.len() as u32);
        self.index.insert(slot.addr(), slot_ref);
        self.slots.push(SlotImage {
            value: ValueImage::Null,
            ty: slot.ty(),
        });

        // Registered before descending so nested references resolve to it.
        let value = self.value(&slot.value())?;
        self.slots[slot_ref.0 as usize].value = value;
        Ok(slot_ref)
    }

    fn value(&mut self, value: &Value) -> Result<ValueImage, LinkError> {
        Ok(match value {
            Value::Null => ValueImage::Null,
            Value::Bool(b) => ValueImage::Bool(*b),
            Value::Long(n) => ValueImage::Long(*n),
            Value::Double(n) => ValueImage::Double(*n),
            Value::String(s) => ValueImage::String(s.clone()),
            Value::Array(items) => ValueImage::Array(
                items
                    .iter()
                    .map(|item| self.value(item))
                    .collect::<Result<_, _>>()?,
            ),
            Value::Slot(slot) => ValueImage::Slot(self.slot(slot)?),
            Value::Param(record) => ValueImage::Param {
                name: record.name.clone(),
                default: self.slot(&record.default)?,
                ops: self.link_ops(&record.ops)?,
                by_ref: record.by_ref,
                type_hint: record.type_hint.clone(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::compile::Compiler;
    use crate::bytecode::op::UnaryKind;
    use crate::lang::node::{Node, NodeKind};
    use crate::lang::value::TypeTag;
    use pretty_assertions::assert_eq;

    fn var(name: &str) -> Node {
        Node::new(NodeKind::ExprVariable).with("name", name)
    }

    #[test]
    fn test_jumps_resolve_to_positions() {
        let node = Node::new(NodeKind::StmtWhile)
            .with("cond", var("go"))
            .with(
                "stmts",
                vec![Node::new(NodeKind::StmtEcho).with("exprs", vec![var("x")])],
            );
        let ops = Compiler::new().compile(&[node], None).unwrap();

        let image = link(&ops).unwrap();

        // FETCH go, JUMP_IF_NOT, FETCH x, ECHO, JUMP, NOP
        assert_eq!(image.ops.len(), 6);
        assert_eq!(image.ops[1].target(), Some(5));
        assert_eq!(image.ops[4].target(), Some(0));
    }

    #[test]
    fn test_shared_slots_get_one_index() {
        let node = Node::new(NodeKind::ExprAssign)
            .with("var", var("x"))
            .with("expr", var("y"));
        let ops = Compiler::new().compile(&[node], None).unwrap();

        let image = link(&ops).unwrap();

        let LinkedOp::Unary { result: first, .. } = image.ops[0] else {
            panic!("expected fetch");
        };
        let LinkedOp::Binary { op1, .. } = image.ops[2] else {
            panic!("expected assign");
        };
        assert_eq!(first, op1);
    }

    #[test]
    fn test_context_slot_is_shared_across_statements() {
        let ctx = ValueSlot::new();
        let ops = Compiler::new()
            .compile(&[var("a"), var("b")], Some(&ctx))
            .unwrap();

        let image = link(&ops).unwrap();

        match (&image.ops[0], &image.ops[1]) {
            (LinkedOp::Unary { result: a, .. }, LinkedOp::Unary { result: b, .. }) => {
                assert_eq!(a, b)
            }
            other => panic!("expected two fetches, got {:?}", other),
        }
    }

    #[test]
    fn test_argument_slots_are_linked_by_reference() {
        let call = Node::new(NodeKind::ExprFuncCall)
            .with("name", "f")
            .with(
                "args",
                vec![Node::new(NodeKind::Arg).with("value", var("x"))],
            );
        let ops = Compiler::new().compile(&[call], None).unwrap();

        let image = link(&ops).unwrap();

        let LinkedOp::Unary { result: fetched, .. } = image.ops[0] else {
            panic!("expected fetch");
        };
        let LinkedOp::Binary { op2, .. } = image.ops[1] else {
            panic!("expected call");
        };
        let args = image.slot(op2).unwrap();
        assert_eq!(args.value, ValueImage::Array(vec![ValueImage::Slot(fetched)]));
        assert_eq!(args.ty, TypeTag::Array);
    }

    #[test]
    fn test_function_body_links_locally() {
        let function = Node::new(NodeKind::StmtFunction)
            .with("name", "loop_forever")
            .with(
                "stmts",
                vec![Node::new(NodeKind::StmtDo)
                    .with("stmts", vec![var("x")])
                    .with("cond", var("y"))],
            )
            .with(
                "params",
                vec![Node::new(NodeKind::Param)
                    .with("name", "p")
                    .with("default", var("d"))],
            );
        let ops = Compiler::new().compile(&[function], None).unwrap();

        let image = link(&ops).unwrap();

        let LinkedOp::FunctionDef { body, params, .. } = &image.ops[0] else {
            panic!("expected function");
        };
        assert_eq!(body.last().and_then(LinkedOp::target), Some(0));

        let ValueImage::Array(records) = &image.slot(*params).unwrap().value else {
            panic!("expected parameter list");
        };
        match &records[0] {
            ValueImage::Param { name, ops, .. } => {
                assert_eq!(name, "p");
                assert_eq!(ops.len(), 1);
            }
            other => panic!("expected param record, got {:?}", other),
        }
    }

    #[test]
    fn test_unresolved_target_is_rejected() {
        let ops = vec![OpLine::new(OpId(0), Op::JumpTo { target: OpId(9) })];

        assert_eq!(
            link(&ops),
            Err(LinkError::UnresolvedTarget { target: OpId(9) })
        );
    }

    #[test]
    fn test_duplicate_handle_is_rejected() {
        let echo = || Op::Unary {
            kind: UnaryKind::EchoOp,
            op1: ValueSlot::new(),
            result: ValueSlot::new(),
        };
        let ops = vec![OpLine::new(OpId(1), echo()), OpLine::new(OpId(1), echo())];

        assert_eq!(link(&ops), Err(LinkError::DuplicateId { id: OpId(1) }));
    }

    #[test]
    fn test_link_error_display() {
        let err = LinkError::UnresolvedTarget { target: OpId(4) };
        assert!(err.to_string().contains("#4"));
    }
}
