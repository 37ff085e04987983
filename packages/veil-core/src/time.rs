//! Clock helpers.
//!
//! Every time-dependent operation in the crate has an `_at(.., now)` form;
//! this supplies `now` for the convenience wrappers.

use chrono::{DateTime, Utc};

/// Returns the current wall-clock time in UTC.
pub fn now() -> DateTime<Utc> {
    Utc::now()
}
