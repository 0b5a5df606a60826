//! Task invocation contract.
//!
//! A run is started either directly from a link, or from a deployed
//! collection contract whose link and supply are read from the ledger.
//! Input is parsed and validated before any external call is made.

use schemars::schema::RootSchema;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::{Validate, ValidationError, ValidationErrors};

/// Errors from parsing or validating task input.
#[derive(Debug, Error)]
pub enum TaskInputError {
    #[error("Malformed task input: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Invalid task input: {0}")]
    Invalid(#[from] ValidationErrors),
}

/// Start a run from a video link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DirectTask {
    /// Source video link
    #[validate(url)]
    pub link: String,

    /// Number of equal-length segments
    #[serde(alias = "chunks")]
    #[validate(range(min = 1, max = 10000))]
    pub segment_count: u32,

    /// Interest oracle relevance threshold
    #[serde(alias = "threshold")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub score_threshold: f64,
}

/// Start a run from a deployed collection contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CollectionTask {
    /// 0x-prefixed 20-byte contract address
    #[validate(custom(function = "validate_contract_address"))]
    pub contract_address: String,
}

/// Structured task input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum TaskInput {
    Direct(DirectTask),
    Collection(CollectionTask),
}

impl TaskInput {
    /// Parse and validate task input from JSON.
    pub fn from_json(raw: &str) -> Result<Self, TaskInputError> {
        let input: TaskInput = serde_json::from_str(raw)?;
        input.validate()?;
        Ok(input)
    }

    /// Validate whichever variant this is.
    pub fn validate(&self) -> Result<(), TaskInputError> {
        match self {
            TaskInput::Direct(task) => task.validate()?,
            TaskInput::Collection(task) => task.validate()?,
        }
        Ok(())
    }
}

/// Check for `0x` followed by exactly 40 hex digits.
pub fn validate_contract_address(address: &str) -> Result<(), ValidationError> {
    let valid = address
        .strip_prefix("0x")
        .map(|hex| hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()))
        .unwrap_or(false);

    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("contract_address"))
    }
}

/// JSON schema of the task input, for callers that validate upstream.
pub fn task_input_schema() -> RootSchema {
    schemars::schema_for!(TaskInput)
}
