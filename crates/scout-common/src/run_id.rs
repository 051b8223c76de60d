//! Identifier for one scouting run.
//!
//! Generated once per process and attached to the top-level tracing span, so
//! every log line of a run (including rotated log files) can be grouped.

use once_cell::sync::Lazy;
use ulid::Ulid;

static RUN_ID: Lazy<String> = Lazy::new(|| Ulid::new().to_string());

/// The process-level run id. Time-ordered, 26 characters.
#[inline]
pub fn get() -> &'static str {
    &RUN_ID
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_id_is_stable_within_a_process() {
        assert_eq!(get(), get());
        assert_eq!(get().len(), 26);
    }

    #[test]
    fn run_id_parses_as_ulid() {
        assert!(Ulid::from_string(get()).is_ok());
    }
}
