use std::{
    error::Error,
    fmt::{Display, Formatter, Result as FmtResult},
};

/// Errors produced while rendering templates or policies.
///
/// Errors are cloneable so they can be handed to every consumer of a shared [Output][crate::Output].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DeferError {
    /// The template text could not be parsed.
    TemplateCompile(String),

    /// The template referenced a missing variable or an invalid field while rendering.
    TemplateExecute(String),

    /// The rendered template is not valid JSON. `offset` is the byte position of the syntax error, if known.
    InvalidJson {
        offset: Option<usize>,
        detail: String,
    },

    /// A policy is missing its version or id, or one of its statements is invalid.
    InvalidPolicy {
        id: String,
        detail: String,
        statement: Option<Box<DeferError>>,
    },

    /// A statement has no effect, no Action/NotAction, or sets both halves of an exclusive pair.
    InvalidStatement(String),

    /// A value could not be serialized to JSON.
    Serialization(String),

    /// An input output failed before it could be used.
    Upstream(String),
}

impl Display for DeferError {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Self::TemplateCompile(msg) => write!(f, "Template compile error: {}", msg),
            Self::TemplateExecute(msg) => write!(f, "Template execution error: {}", msg),
            Self::InvalidJson {
                offset: Some(offset),
                detail,
            } => write!(f, "Template produced invalid JSON with syntax error at byte {}: {}", offset, detail),
            Self::InvalidJson {
                offset: None,
                detail,
            } => write!(f, "Template produced invalid JSON: {}", detail),
            Self::InvalidPolicy {
                id,
                detail,
                ..
            } => write!(f, "Invalid policy {:?}: {}", id, detail),
            Self::InvalidStatement(msg) => write!(f, "Invalid statement: {}", msg),
            Self::Serialization(msg) => write!(f, "Serialization failed: {}", msg),
            Self::Upstream(msg) => write!(f, "Upstream output failed: {}", msg),
        }
    }
}

impl Error for DeferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidPolicy {
                statement: Some(statement),
                ..
            } => Some(statement.as_ref()),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for DeferError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
