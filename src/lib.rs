//! Compiles syntax trees into flat op-line sequences for a separate
//! executor.
//!
//! ```text
//! Vec<Node> ──Compiler::compile──▶ OpArray ──link──▶ Image
//! ```
//!
//! The [`OpArray`] keeps shared [`ValueSlot`]s and refers to jump targets by
//! [`OpId`]; [`link`] resolves both into the serializable [`Image`].

pub mod bytecode;
pub mod lang;

pub use bytecode::{
    CompileError, Compiler, Image, LinkError, Op, OpArray, OpId, OpLine, link,
};
pub use lang::{
    node::{Child, Node, NodeKind, Scalar},
    slot::ValueSlot,
    value::{TypeTag, Value},
};
