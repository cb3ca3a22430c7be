//! Serialization of the task collection to its durable JSON form.
//!
//! The persisted value is a JSON array of task records in collection order.

use crate::error::Result;
use crate::tasks::models::Task;

/// Serialize the full collection.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode(tasks: &[Task]) -> Result<String> {
    Ok(serde_json::to_string(tasks)?)
}

/// Parse a persisted collection.
///
/// # Errors
///
/// Returns an error if the blob is not a JSON array of task records.
pub fn decode(blob: &str) -> Result<Vec<Task>> {
    Ok(serde_json::from_str(blob)?)
}
