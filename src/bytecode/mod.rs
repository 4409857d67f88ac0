pub mod compile;
pub mod compile_error;
pub mod disasm;
pub mod dispatch;
pub mod ir;
pub mod link;
pub mod op;

pub use compile::Compiler;
pub use compile_error::CompileError;
pub use ir::{Image, LinkedOp, SlotRef};
pub use link::{LinkError, link};
pub use op::{Op, OpArray, OpId, OpLine};
