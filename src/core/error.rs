//! Error taxonomy shared by every area of the crate.

use std::fmt;

/// Broad class of a failure, used by callers that only care about how to
/// react (show a validation hint, offer to retry, report a storage fault).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Input or state rejected by a model invariant
    Validation,
    /// Entity absent by id
    NotFound,
    /// AI backend failure
    AiService,
    /// Storage create/update/delete/query failure
    Persistence,
    /// Request rejected because conflicting work is in progress
    Conflict,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation error"),
            Self::NotFound => write!(f, "not found"),
            Self::AiService => write!(f, "AI service error"),
            Self::Persistence => write!(f, "persistence error"),
            Self::Conflict => write!(f, "conflict"),
        }
    }
}
