// src/job/loader.rs

use std::fs;
use std::path::Path;

use crate::errors::Result;
use crate::job::model::{JobDescriptor, RawJobDescriptor};

/// Parse a JSON job descriptor without validating it.
pub fn parse_raw(json: &str) -> Result<RawJobDescriptor> {
    Ok(serde_json::from_str(json)?)
}

/// Parse and validate a JSON job descriptor.
pub fn parse_and_validate(json: &str) -> Result<JobDescriptor> {
    JobDescriptor::try_from(parse_raw(json)?)
}

/// Read, parse and validate a JSON job descriptor file.
///
/// Validation errors surface here, before any topology is synthesized.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<JobDescriptor> {
    let contents = fs::read_to_string(path.as_ref())?;
    parse_and_validate(&contents)
}
