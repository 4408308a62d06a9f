//! Key-to-file-name sanitization.

/// Characters replaced by `_` when a key becomes a file name.
const REPLACED: &[char] = &['/', '\\', ':', ' ', '.', '!', '?', '&', ';', '|'];

/// Sanitizes a record key into a file-system-safe stem.
///
/// Each of `/ \ : space . ! ? & ; |` is replaced by `_`, and the result
/// is lowercased. Distinct keys can map to the same stem; the last writer
/// wins on disk.
///
/// # Example
///
/// ```
/// use mirrordb_codec::sanitize_key;
///
/// assert_eq!(sanitize_key("Test://1?"), "test___1_");
/// ```
#[must_use]
pub fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| if REPLACED.contains(&c) { '_' } else { c })
        .collect::<String>()
        .to_lowercase()
}

/// Returns the backing file name for a key: the sanitized stem plus `.json`.
#[must_use]
pub fn file_name(key: &str) -> String {
    format!("{}.json", sanitize_key(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn replaces_reserved_characters() {
        assert_eq!(sanitize_key("a/b\\c:d e.f!g?h&i;j|k"), "a_b_c_d_e_f_g_h_i_j_k");
    }

    #[test]
    fn lowercases() {
        assert_eq!(sanitize_key("UserProfile"), "userprofile");
    }

    #[test]
    fn file_name_appends_extension() {
        assert_eq!(file_name("Test://1?"), "test___1_.json");
    }

    #[test]
    fn plain_keys_pass_through() {
        assert_eq!(sanitize_key("user-42_v2"), "user-42_v2");
    }

    proptest! {
        #[test]
        fn never_contains_reserved_characters(key in ".*") {
            let sanitized = sanitize_key(&key);
            prop_assert!(!sanitized.contains(|c| REPLACED.contains(&c)));
        }

        #[test]
        fn sanitization_is_idempotent(key in ".*") {
            let once = sanitize_key(&key);
            prop_assert_eq!(sanitize_key(&once), once);
        }
    }
}
