use thiserror::Error;

use crate::lang::node::NodeKind;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// A node kind with neither a dispatch entry nor a dedicated routine
    #[error("compile error: cannot compile '{kind}' node: unsupported construct")]
    Unsupported { kind: String },
}

impl CompileError {
    pub fn unsupported(kind: &NodeKind) -> Self {
        CompileError::Unsupported {
            kind: kind.to_string(),
        }
    }

    /// Tag of the node that failed to compile.
    pub fn kind(&self) -> &str {
        match self {
            CompileError::Unsupported { kind } => kind,
        }
    }
}
