//! Parser error types

/// The two conditions the parser refuses to skip.
///
/// Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ObjError {
    #[error("line {line}: face index {index} is out of range for {len} declared entries")]
    MalformedIndex { line: usize, index: String, len: usize },

    #[error("line {line}: '{token}' is not a number")]
    MalformedNumber { line: usize, token: String },
}

impl ObjError {
    pub fn line(&self) -> usize {
        match self {
            ObjError::MalformedIndex { line, .. } => *line,
            ObjError::MalformedNumber { line, .. } => *line,
        }
    }
}
