//! Action tags and input coercion.

use tracing::warn;

use areg_types::limits::{char_len, MAX_ACTION_CHARS, MAX_DETAIL_CHARS};

/// Sentinel stored in place of an empty or over-long action tag.
pub const UNKNOWN_ACTION: &str = "UNKNOWN";
/// Sentinel stored in place of an empty or over-long detail.
pub const NO_DETAIL: &str = "No details provided";

pub const REGISTER: &str = "REGISTER";
pub const REVISE: &str = "REVISE";
pub const UPDATE_METADATA: &str = "UPDATE_METADATA";
pub const GRANT_ACCESS: &str = "GRANT_ACCESS";
pub const REVOKE_ACCESS: &str = "REVOKE_ACCESS";
pub const TRANSFER: &str = "TRANSFER";
pub const RETIRE: &str = "RETIRE";
pub const RATE: &str = "RATE";
pub const COLLAB_SESSION: &str = "COLLAB_SESSION";
pub const SUBSCRIBE: &str = "SUBSCRIBE";

pub fn sanitize_action(action: &str) -> String {
    coerce(action, MAX_ACTION_CHARS, UNKNOWN_ACTION, "action")
}

pub fn sanitize_detail(detail: &str) -> String {
    coerce(detail, MAX_DETAIL_CHARS, NO_DETAIL, "detail")
}

fn coerce(value: &str, max_chars: usize, sentinel: &str, field: &'static str) -> String {
    let len = char_len(value);
    if len == 0 || len > max_chars {
        warn!(field, len, max_chars, "audit field coerced to sentinel");
        sentinel.to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_values_pass_through() {
        assert_eq!(sanitize_action(REGISTER), "REGISTER");
        assert_eq!(sanitize_detail("created"), "created");
    }

    #[test]
    fn empty_values_become_sentinels() {
        assert_eq!(sanitize_action(""), UNKNOWN_ACTION);
        assert_eq!(sanitize_detail(""), NO_DETAIL);
    }

    #[test]
    fn oversized_values_become_sentinels() {
        assert_eq!(sanitize_action(&"A".repeat(33)), UNKNOWN_ACTION);
        assert_eq!(sanitize_action(&"A".repeat(32)), "A".repeat(32));
        assert_eq!(sanitize_detail(&"d".repeat(257)), NO_DETAIL);
    }

    #[test]
    fn bounds_count_characters_not_bytes() {
        let detail = "é".repeat(256);
        assert_eq!(sanitize_detail(&detail), detail);
    }
}
