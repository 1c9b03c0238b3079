//! Payload intake from a text stream.

use crate::error::PublishError;
use std::io::Read;

/// Read the whole stream and return the trimmed payload line.
///
/// The payload is not interpreted here; it only has to be one non-empty line.
pub fn read_payload<R: Read>(mut reader: R) -> Result<String, PublishError> {
    let mut raw = String::new();
    reader.read_to_string(&mut raw)?;
    accept_payload(&raw)
}

/// Apply the same checks to a payload handed over directly.
pub fn accept_payload(raw: &str) -> Result<String, PublishError> {
    let payload = raw.trim();
    if payload.is_empty() {
        return Err(PublishError::EmptyPayload);
    }
    if payload.contains('\n') || payload.contains('\r') {
        return Err(PublishError::MultilinePayload);
    }
    Ok(payload.to_string())
}

/// Reject payloads that do not match the generator schema.
pub fn validate_schema(payload: &str) -> Result<(), PublishError> {
    genrelay::GeneratorPayload::from_line(payload)?;
    Ok(())
}
