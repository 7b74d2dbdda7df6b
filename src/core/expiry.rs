use crate::utils::error::{ReaperError, Result};
use chrono::{DateTime, Duration, Utc};

/// Whether a resource created at `created_at` (RFC 3339) has outlived `interval`.
///
/// Expired means `now()` is strictly after `created_at + interval`. An
/// unparsable timestamp is an error, never "not expired".
pub fn is_expired(
    created_at: &str,
    interval: Duration,
    now: impl Fn() -> DateTime<Utc>,
) -> Result<bool> {
    let created = DateTime::parse_from_rfc3339(created_at).map_err(|source| {
        ReaperError::InvalidCreationTime {
            value: created_at.to_string(),
            source,
        }
    })?;

    Ok(created
        .with_timezone(&Utc)
        .checked_add_signed(interval)
        .is_some_and(|expiry| now() > expiry))
}
