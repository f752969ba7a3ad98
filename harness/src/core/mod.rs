pub mod platform;
pub mod verdict;

use serde::Serializer;
use std::time::Duration;

pub use platform::Platform;
pub use verdict::Verdict;

/// Serialize a `Duration` as fractional seconds
pub fn serialize_secs<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(value.as_secs_f64())
}
