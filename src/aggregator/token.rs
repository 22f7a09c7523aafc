use crate::error::{AppError, AppResult};

/// Token handed to the caller while the stream has more to give.
///
/// The whole multi-category position lives in the stored session state, so
/// the token itself carries no data beyond "keep going".
pub const MORE_AVAILABLE: &str = "more";

/// Encodes the caller-facing token for a batch result
pub fn encode(has_more: bool) -> Option<String> {
    has_more.then(|| MORE_AVAILABLE.to_string())
}

/// Checks an incoming page token.
///
/// Absent, empty and the sentinel all resume whatever the session has
/// stored. Restarting a stream is a separate, explicit operation.
pub fn validate(token: Option<&str>) -> AppResult<()> {
    match token.map(str::trim) {
        None | Some("") | Some(MORE_AVAILABLE) => Ok(()),
        Some(other) => Err(AppError::InvalidInput(format!(
            "Unrecognized page token: {}",
            other
        ))),
    }
}
