use serde::{Deserialize, Serialize};

use crate::bytecode::op::{BinaryKind, UnaryKind};
use crate::lang::value::TypeTag;

/// Index into [`Image::slots`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotRef(pub u32);

impl std::fmt::Display for SlotRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "${}", self.0)
    }
}

/// A linked, executable program.
///
/// Jump targets are positions in the enclosing op list. Every distinct slot
/// of the compiled program appears once in `slots`; op-lines and values
/// that shared a slot share its index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub ops: Vec<LinkedOp>,
    pub slots: Vec<SlotImage>,
}

impl Image {
    /// Encode with postcard.
    pub fn to_bytes(&self) -> Result<Vec<u8>, postcard::Error> {
        postcard::to_allocvec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, postcard::Error> {
        postcard::from_bytes(bytes)
    }

    pub fn slot(&self, slot: SlotRef) -> Option<&SlotImage> {
        self.slots.get(slot.0 as usize)
    }
}

/// Op-line with resolved targets and indexed slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LinkedOp {
    Unary {
        kind: UnaryKind,
        op1: SlotRef,
        result: SlotRef,
    },
    Binary {
        kind: BinaryKind,
        op1: SlotRef,
        op2: SlotRef,
        result: SlotRef,
    },
    /// `body` is linked on its own: its targets are positions within `body`.
    FunctionDef {
        name: SlotRef,
        body: Vec<LinkedOp>,
        params: SlotRef,
    },
    JumpTo {
        target: u32,
    },
    JumpIf {
        cond: SlotRef,
        target: u32,
    },
    JumpIfNot {
        cond: SlotRef,
        target: u32,
    },
    NoOp,
}

impl LinkedOp {
    pub fn target(&self) -> Option<u32> {
        match self {
            LinkedOp::JumpTo { target }
            | LinkedOp::JumpIf { target, .. }
            | LinkedOp::JumpIfNot { target, .. } => Some(*target),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotImage {
    pub value: ValueImage,
    pub ty: TypeTag,
}

/// Slot content with nested slots replaced by their indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValueImage {
    Null,
    Bool(bool),
    Long(i64),
    Double(f64),
    String(String),
    Array(Vec<ValueImage>),
    Slot(SlotRef),
    Param {
        name: String,
        default: SlotRef,
        ops: Vec<LinkedOp>,
        by_ref: bool,
        type_hint: Option<String>,
    },
}

impl std::fmt::Display for ValueImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueImage::Null => write!(f, "null"),
            ValueImage::Bool(b) => write!(f, "{}", b),
            ValueImage::Long(n) => write!(f, "{}", n),
            ValueImage::Double(n) => write!(f, "{}", n),
            ValueImage::String(s) => write!(f, "{:?}", s),
            ValueImage::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            ValueImage::Slot(slot) => write!(f, "{}", slot),
            ValueImage::Param {
                name,
                default,
                ops,
                by_ref,
                type_hint,
            } => {
                write!(f, "param ")?;
                if let Some(ty) = type_hint {
                    write!(f, "{} ", ty)?;
                }
                if *by_ref {
                    write!(f, "&")?;
                }
                write!(f, "${} = {}", name, default)?;
                if !ops.is_empty() {
                    write!(f, " ({} ops)", ops.len())?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postcard_round_trip() {
        let image = Image {
            ops: vec![
                LinkedOp::JumpIfNot {
                    cond: SlotRef(0),
                    target: 2,
                },
                LinkedOp::Unary {
                    kind: UnaryKind::EchoOp,
                    op1: SlotRef(1),
                    result: SlotRef(2),
                },
                LinkedOp::NoOp,
            ],
            slots: vec![
                SlotImage {
                    value: ValueImage::Bool(true),
                    ty: TypeTag::Bool,
                },
                SlotImage {
                    value: ValueImage::String("hi".into()),
                    ty: TypeTag::String,
                },
                SlotImage {
                    value: ValueImage::Null,
                    ty: TypeTag::Null,
                },
            ],
        };

        let bytes = image.to_bytes().unwrap();
        assert_eq!(Image::from_bytes(&bytes).unwrap(), image);
    }

    #[test]
    fn test_value_display() {
        let value = ValueImage::Array(vec![
            ValueImage::Slot(SlotRef(3)),
            ValueImage::String("x".into()),
            ValueImage::Param {
                name: "n".into(),
                default: SlotRef(4),
                ops: vec![],
                by_ref: true,
                type_hint: Some("int".into()),
            },
        ]);

        assert_eq!(value.to_string(), r#"[$3, "x", param int &$n = $4]"#);
    }

    #[test]
    fn test_slot_lookup() {
        let image = Image {
            ops: vec![],
            slots: vec![SlotImage {
                value: ValueImage::Long(1),
                ty: TypeTag::String,
            }],
        };

        assert_eq!(image.slot(SlotRef(0)).map(|s| s.ty), Some(TypeTag::String));
        assert!(image.slot(SlotRef(1)).is_none());
    }
}
