use serde::{Deserialize, Serialize};

use crate::lang::slot::ValueSlot;

// =============================================================================
// OP - Op-line instructions
// =============================================================================

/// Stable handle of an emitted op-line, used as a jump target.
///
/// Handles are unique within one compiler run; [`crate::bytecode::link`]
/// turns them into positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OpId(pub u32);

impl std::fmt::Display for OpId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Operations taking one operand slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryKind {
    IssetOp,
    PostInc,
    PostDec,
    PreInc,
    PreDec,
    FetchVariable,
    FetchConstant,
    BooleanNot,
    UnaryMinus,
    EchoOp,
    PrintOp,
    ReturnOp,
}

impl UnaryKind {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            UnaryKind::IssetOp => "ISSET",
            UnaryKind::PostInc => "POST_INC",
            UnaryKind::PostDec => "POST_DEC",
            UnaryKind::PreInc => "PRE_INC",
            UnaryKind::PreDec => "PRE_DEC",
            UnaryKind::FetchVariable => "FETCH_VAR",
            UnaryKind::FetchConstant => "FETCH_CONST",
            UnaryKind::BooleanNot => "BOOL_NOT",
            UnaryKind::UnaryMinus => "NEG",
            UnaryKind::EchoOp => "ECHO",
            UnaryKind::PrintOp => "PRINT",
            UnaryKind::ReturnOp => "RETURN",
        }
    }
}

/// Operations taking two operand slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryKind {
    // assignment
    Assign,
    AssignConcat,
    AssignAdd,
    AssignSub,
    AssignMul,

    // logic
    BooleanAnd,
    BooleanOr,

    // comparison
    Smaller,
    SmallerOrEqual,
    Equal,
    NotEqual,
    Identical,
    NotIdentical,

    // arithmetic
    Add,
    Sub,
    Multiply,
    Div,
    Mod,
    Concat,

    // calls
    FunctionCall,
    IncludeOp,
}

impl BinaryKind {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            BinaryKind::Assign => "ASSIGN",
            BinaryKind::AssignConcat => "ASSIGN_CONCAT",
            BinaryKind::AssignAdd => "ASSIGN_ADD",
            BinaryKind::AssignSub => "ASSIGN_SUB",
            BinaryKind::AssignMul => "ASSIGN_MUL",
            BinaryKind::BooleanAnd => "BOOL_AND",
            BinaryKind::BooleanOr => "BOOL_OR",
            BinaryKind::Smaller => "LT",
            BinaryKind::SmallerOrEqual => "LE",
            BinaryKind::Equal => "EQ",
            BinaryKind::NotEqual => "NE",
            BinaryKind::Identical => "IDENTICAL",
            BinaryKind::NotIdentical => "NOT_IDENTICAL",
            BinaryKind::Add => "ADD",
            BinaryKind::Sub => "SUB",
            BinaryKind::Multiply => "MUL",
            BinaryKind::Div => "DIV",
            BinaryKind::Mod => "MOD",
            BinaryKind::Concat => "CONCAT",
            BinaryKind::FunctionCall => "CALL",
            BinaryKind::IncludeOp => "INCLUDE",
        }
    }
}

/// Payload of one op-line.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Unary {
        kind: UnaryKind,
        op1: ValueSlot,
        result: ValueSlot,
    },

    Binary {
        kind: BinaryKind,
        op1: ValueSlot,
        op2: ValueSlot,
        result: ValueSlot,
    },

    /// Declares a function: its name slot, compiled body, and the slot holding
    /// its parameter records.
    FunctionDef {
        name: ValueSlot,
        stmts: OpArray,
        params: ValueSlot,
    },

    // ==========================================================================
    // Control flow: targets are op-line handles, never offsets
    // ==========================================================================
    JumpTo {
        target: OpId,
    },

    /// Jump when `cond` is truthy, otherwise fall through.
    JumpIf {
        cond: ValueSlot,
        target: OpId,
    },

    /// Jump when `cond` is falsy, otherwise fall through.
    JumpIfNot {
        cond: ValueSlot,
        target: OpId,
    },

    /// Addressable label; does nothing.
    NoOp,
}

impl Op {
    /// Jump target, for control op-lines.
    pub fn target(&self) -> Option<OpId> {
        match self {
            Op::JumpTo { target } | Op::JumpIf { target, .. } | Op::JumpIfNot { target, .. } => {
                Some(*target)
            }
            _ => None,
        }
    }

    /// Result slot, for operation op-lines.
    pub fn result(&self) -> Option<&ValueSlot> {
        match self {
            Op::Unary { result, .. } | Op::Binary { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn is_jump(&self) -> bool {
        self.target().is_some()
    }
}

/// One emitted instruction. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct OpLine {
    id: OpId,
    op: Op,
}

impl OpLine {
    pub(crate) fn new(id: OpId, op: Op) -> Self {
        Self { id, op }
    }

    pub fn id(&self) -> OpId {
        self.id
    }

    pub fn op(&self) -> &Op {
        &self.op
    }
}

/// Ordered op-lines of one statement block.
pub type OpArray = Vec<OpLine>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jump_targets() {
        let jump = Op::JumpIfNot {
            cond: ValueSlot::new(),
            target: OpId(3),
        };
        assert_eq!(jump.target(), Some(OpId(3)));
        assert!(jump.is_jump());
        assert!(!Op::NoOp.is_jump());
    }

    #[test]
    fn test_result_slot() {
        let result = ValueSlot::new();
        let op = Op::Unary {
            kind: UnaryKind::EchoOp,
            op1: ValueSlot::new(),
            result: result.clone(),
        };

        assert!(op.result().is_some_and(|r| r.ptr_eq(&result)));
        assert!(Op::JumpTo { target: OpId(0) }.result().is_none());
    }

    #[test]
    fn test_op_id_display() {
        assert_eq!(OpId(12).to_string(), "#12");
    }
}
