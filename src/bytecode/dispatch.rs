//! Node kind → compilation strategy.
//!
//! Most node kinds compile through one of four generic strategies; the
//! [`Descriptor`] returned by [`descriptor`] carries everything the strategy
//! needs. Kinds without a descriptor may have a dedicated [`Routine`].

use crate::bytecode::op::{BinaryKind, UnaryKind};
use crate::lang::node::NodeKind;

const LEFT: &str = "left";
const RIGHT: &str = "right";
const VALUE: &str = "value";

/// How to compile a node kind generically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Descriptor {
    /// Compile `field` into a fresh slot and append it to the context array.
    ArrayOp { field: &'static str },

    /// Write `field` into the context, joining list parts with `separator`.
    ScalarOp {
        field: &'static str,
        separator: Option<&'static str>,
    },

    /// One operand from `field`, one op-line.
    UnaryOp { kind: UnaryKind, field: &'static str },

    /// Two operands from `left` and `right`, one op-line.
    BinaryOp {
        kind: BinaryKind,
        left: &'static str,
        right: &'static str,
    },
}

impl Descriptor {
    const fn array(field: &'static str) -> Self {
        Descriptor::ArrayOp { field }
    }

    const fn scalar() -> Self {
        Descriptor::ScalarOp {
            field: VALUE,
            separator: None,
        }
    }

    const fn joined(field: &'static str, separator: &'static str) -> Self {
        Descriptor::ScalarOp {
            field,
            separator: Some(separator),
        }
    }

    const fn unary(kind: UnaryKind, field: &'static str) -> Self {
        Descriptor::UnaryOp { kind, field }
    }

    const fn binary(kind: BinaryKind) -> Self {
        Descriptor::BinaryOp {
            kind,
            left: LEFT,
            right: RIGHT,
        }
    }

    const fn binary_fields(kind: BinaryKind, left: &'static str, right: &'static str) -> Self {
        Descriptor::BinaryOp { kind, left, right }
    }
}

/// Node-specific compilation routines for kinds the generic strategies
/// cannot express.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routine {
    Param,
    Function,
    If,
    While,
    Do,
    InlineHtml,
}

/// Generic descriptor for `kind`, if it has one.
pub fn descriptor(kind: &NodeKind) -> Option<Descriptor> {
    use BinaryKind as B;
    use UnaryKind as U;

    Some(match kind {
        NodeKind::Arg => Descriptor::array(VALUE),

        // scalars
        NodeKind::Name => Descriptor::joined("parts", "\\"),
        NodeKind::ScalarDNumber | NodeKind::ScalarLNumber | NodeKind::ScalarString => {
            Descriptor::scalar()
        }

        // unary operators
        NodeKind::ExprIsset => Descriptor::unary(U::IssetOp, "vars"),
        NodeKind::ExprPostInc => Descriptor::unary(U::PostInc, "var"),
        NodeKind::ExprPostDec => Descriptor::unary(U::PostDec, "var"),
        NodeKind::ExprPreInc => Descriptor::unary(U::PreInc, "var"),
        NodeKind::ExprPreDec => Descriptor::unary(U::PreDec, "var"),
        NodeKind::ExprVariable => Descriptor::unary(U::FetchVariable, "name"),
        NodeKind::ExprConstFetch => Descriptor::unary(U::FetchConstant, "name"),
        NodeKind::ExprBooleanNot => Descriptor::unary(U::BooleanNot, "expr"),
        NodeKind::ExprUnaryMinus => Descriptor::unary(U::UnaryMinus, "expr"),
        NodeKind::ExprPrint => Descriptor::unary(U::PrintOp, "expr"),
        NodeKind::StmtEcho => Descriptor::unary(U::EchoOp, "exprs"),
        NodeKind::StmtReturn => Descriptor::unary(U::ReturnOp, "expr"),

        // binary operators
        NodeKind::ExprAssign => Descriptor::binary_fields(B::Assign, "var", "expr"),
        NodeKind::ExprAssignConcat => Descriptor::binary_fields(B::AssignConcat, "var", "expr"),
        NodeKind::ExprAssignPlus => Descriptor::binary_fields(B::AssignAdd, "var", "expr"),
        NodeKind::ExprAssignMinus => Descriptor::binary_fields(B::AssignSub, "var", "expr"),
        NodeKind::ExprAssignMul => Descriptor::binary_fields(B::AssignMul, "var", "expr"),

        NodeKind::ExprBooleanAnd => Descriptor::binary(B::BooleanAnd),
        NodeKind::ExprBooleanOr => Descriptor::binary(B::BooleanOr),
        NodeKind::ExprSmaller => Descriptor::binary(B::Smaller),
        NodeKind::ExprSmallerOrEqual => Descriptor::binary(B::SmallerOrEqual),
        NodeKind::ExprGreater => Descriptor::binary_fields(B::Smaller, RIGHT, LEFT),
        NodeKind::ExprGreaterOrEqual => Descriptor::binary_fields(B::SmallerOrEqual, RIGHT, LEFT),
        NodeKind::ExprEqual => Descriptor::binary(B::Equal),
        NodeKind::ExprNotEqual => Descriptor::binary(B::NotEqual),
        NodeKind::ExprIdentical => Descriptor::binary(B::Identical),
        NodeKind::ExprNotIdentical => Descriptor::binary(B::NotIdentical),
        NodeKind::ExprPlus => Descriptor::binary(B::Add),
        NodeKind::ExprMinus => Descriptor::binary(B::Sub),
        NodeKind::ExprMul => Descriptor::binary(B::Multiply),
        NodeKind::ExprDiv => Descriptor::binary(B::Div),
        NodeKind::ExprMod => Descriptor::binary(B::Mod),
        NodeKind::ExprConcat => Descriptor::binary(B::Concat),

        NodeKind::ExprFuncCall => Descriptor::binary_fields(B::FunctionCall, "name", "args"),
        NodeKind::ExprInclude => Descriptor::binary_fields(B::IncludeOp, "type", "expr"),

        _ => return None,
    })
}

/// Dedicated routine for `kind`, consulted when [`descriptor`] has none.
pub fn routine(kind: &NodeKind) -> Option<Routine> {
    match kind {
        NodeKind::Param => Some(Routine::Param),
        NodeKind::StmtFunction => Some(Routine::Function),
        NodeKind::StmtIf => Some(Routine::If),
        NodeKind::StmtWhile => Some(Routine::While),
        NodeKind::StmtDo => Some(Routine::Do),
        NodeKind::StmtInlineHtml => Some(Routine::InlineHtml),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greater_swaps_operands() {
        assert_eq!(
            descriptor(&NodeKind::ExprGreater),
            Some(Descriptor::BinaryOp {
                kind: BinaryKind::Smaller,
                left: "right",
                right: "left",
            })
        );
        assert_eq!(
            descriptor(&NodeKind::ExprGreaterOrEqual),
            Some(Descriptor::BinaryOp {
                kind: BinaryKind::SmallerOrEqual,
                left: "right",
                right: "left",
            })
        );
    }

    #[test]
    fn test_binary_defaults_to_left_right() {
        assert_eq!(
            descriptor(&NodeKind::ExprPlus),
            Some(Descriptor::BinaryOp {
                kind: BinaryKind::Add,
                left: "left",
                right: "right",
            })
        );
    }

    #[test]
    fn test_name_joins_parts() {
        assert_eq!(
            descriptor(&NodeKind::Name),
            Some(Descriptor::ScalarOp {
                field: "parts",
                separator: Some("\\"),
            })
        );
    }

    #[test]
    fn test_routines_have_no_descriptor() {
        for kind in [
            NodeKind::Param,
            NodeKind::StmtFunction,
            NodeKind::StmtIf,
            NodeKind::StmtWhile,
            NodeKind::StmtDo,
            NodeKind::StmtInlineHtml,
        ] {
            assert!(descriptor(&kind).is_none(), "{kind} has a descriptor");
            assert!(routine(&kind).is_some(), "{kind} has no routine");
        }
    }

    #[test]
    fn test_branch_containers_are_not_compilable() {
        for kind in [
            NodeKind::StmtElseIf,
            NodeKind::StmtElse,
            NodeKind::Other("Stmt_For".into()),
        ] {
            assert!(descriptor(&kind).is_none());
            assert!(routine(&kind).is_none());
        }
    }
}
