//! Error taxonomy for test actions and registration
//!
//! Test actions fail with a [`TestError`] carrying a closed [`ErrorKind`];
//! expected-error cases compare kinds, never type names.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use thiserror::Error;

/// Discriminated category of a test failure
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Runtime,
    Logic,
    InvalidArgument,
    OutOfRange,
    Overflow,
    Io,
    /// A panic escaped the action or hook
    Panic,
}

impl ErrorKind {
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Runtime => "runtime_error",
            ErrorKind::Logic => "logic_error",
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::OutOfRange => "out_of_range",
            ErrorKind::Overflow => "overflow_error",
            ErrorKind::Io => "io_error",
            ErrorKind::Panic => "panic",
        }
    }

    pub fn all() -> Vec<ErrorKind> {
        vec![
            ErrorKind::Runtime,
            ErrorKind::Logic,
            ErrorKind::InvalidArgument,
            ErrorKind::OutOfRange,
            ErrorKind::Overflow,
            ErrorKind::Io,
            ErrorKind::Panic,
        ]
    }

    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.to_lowercase();
        ErrorKind::all()
            .into_iter()
            .find(|kind| kind.name() == s || kind.name().trim_end_matches("_error") == s)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Failure raised by a test action or fixture hook
#[derive(Error, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct TestError {
    kind: ErrorKind,
    message: String,
}

impl TestError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Runtime, message)
    }

    pub fn logic(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Logic, message)
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    pub fn out_of_range(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::OutOfRange, message)
    }

    pub fn overflow(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Overflow, message)
    }

    /// Build a [`ErrorKind::Panic`] error from a caught unwind payload
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let reason = if let Some(msg) = payload.downcast_ref::<&str>() {
            (*msg).to_string()
        } else if let Some(msg) = payload.downcast_ref::<String>() {
            msg.clone()
        } else {
            "unknown panic".to_string()
        };
        Self::new(ErrorKind::Panic, reason)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<std::io::Error> for TestError {
    fn from(err: std::io::Error) -> Self {
        Self::new(ErrorKind::Io, err.to_string())
    }
}

/// Result type returned by test actions and fixture hooks
pub type TestOutcome = Result<(), TestError>;

/// Registration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HarnessError {
    #[error("Test suite '{0}' is already registered")]
    DuplicateSuite(String),

    #[error("Test case '{case}' is already registered in suite '{suite}'")]
    DuplicateCase { suite: String, case: String },
}
