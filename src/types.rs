use std::collections::HashMap;
use std::fmt;

use uuid::Uuid;

/// Caller-supplied values, keyed by input id.
pub type InputValues = HashMap<String, String>;

/// Opaque identifier of one background execution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExecutionId(String);

impl ExecutionId {
    /// A fresh random id (UUID v4, 32 hex characters).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ExecutionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Result of one run: the exit verdict plus everything the caller may show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    pub success: bool,
    pub output: String,
}

impl RunOutput {
    pub fn failure(output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
        }
    }
}

/// Arguments handed to a `run_async` completion callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub execution_id: ExecutionId,
    pub success: bool,
    pub output: String,
}
