//! Keeps response bodies and secrets out of logs in full.

/// Maximum number of bytes of a body included in log output.
const TRUNCATE_LIMIT: usize = 256;

/// MSRV-compatible replacement for `str::floor_char_boundary` (stable since 1.91.0).
fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        s.len()
    } else {
        let mut i = index;
        while i > 0 && !s.is_char_boundary(i) {
            i -= 1;
        }
        i
    }
}

/// Truncates a vendor response body for logging.
pub fn truncate_for_log(s: &str) -> String {
    if s.len() <= TRUNCATE_LIMIT {
        s.to_string()
    } else {
        format!(
            "{}... [truncated, total {} bytes]",
            &s[..floor_char_boundary(s, TRUNCATE_LIMIT)],
            s.len()
        )
    }
}

/// Masks a credential, keeping at most the first four characters.
///
/// Short secrets are fully masked.
pub fn redact_secret(secret: &str) -> String {
    let chars = secret.chars().count();
    if chars <= 8 {
        return "*".repeat(chars.max(4));
    }
    let prefix: String = secret.chars().take(4).collect();
    format!("{prefix}****")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_string_unchanged() {
        assert_eq!(truncate_for_log("{\"ok\":true}"), "{\"ok\":true}");
    }

    #[test]
    fn over_limit_truncated() {
        let s = "a".repeat(TRUNCATE_LIMIT + 100);
        let result = truncate_for_log(&s);
        assert!(result.ends_with(&format!("total {} bytes]", TRUNCATE_LIMIT + 100)));
        assert!(result.len() < s.len());
    }

    #[test]
    fn multibyte_chars_safe() {
        let s = "默".repeat(200);
        assert!(truncate_for_log(&s).contains("[truncated"));
    }

    #[test]
    fn redacts_secrets() {
        assert_eq!(redact_secret("LTAI5tAbCdEfGh"), "LTAI****");
        assert_eq!(redact_secret("abc"), "****");
        assert_eq!(redact_secret(""), "****");
        assert!(!redact_secret("12345678").contains('1'));
    }
}
