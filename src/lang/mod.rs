//! # Syntax tree and runtime values
//!
//! This module defines what the compiler consumes and what its output
//! refers to:
//!
//! - [`node`]: the syntax tree handed over by the parser. Each node carries a
//!   kind tag and named fields; a field is a node, a literal, a list, or null.
//! - [`slot`]: shared value slots that op-lines read as operands and write as
//!   results.
//! - [`value`]: what a slot holds, plus its type tag.

pub mod node;
pub mod slot;
pub mod value;
