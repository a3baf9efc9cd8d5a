//! Deterministic identifier generation.
//!
//! Separate files must be able to regenerate the identifier for a name they
//! reference without sharing any state, so the identifier is a pure function
//! of `(logical key, name, salt, uidLength, debug)`.

use crate::LogicalKey;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use cssnames_config::Options;

/// Generates the identifier that replaces `name` within the file `key`.
///
/// The MD5 digest of `"{key}:{name}{salt}"` is encoded with the URL-safe
/// base64 alphabet (no `+`, `/` or `=`), truncated to `uid_length`, and
/// patched so it can start a CSS identifier. In debug mode the local name is
/// kept as a readable prefix.
///
/// ```
/// use cssnames_config::Options;
/// use cssnames_rename::{LogicalKey, uid};
///
/// let options = Options::default();
/// assert_eq!(uid::generate(&LogicalKey::from("a"), "bar", &options), "mDK9I");
///
/// let debug = Options { debug: true, ..Options::default() };
/// assert_eq!(uid::generate(&LogicalKey::from("a"), "bar", &debug), "bar-mDK9I");
/// ```
pub fn generate(key: &LogicalKey, name: &str, options: &Options) -> String {
    let digest = md5::compute(format!("{key}:{name}{}", options.salt));
    let encoded = URL_SAFE_NO_PAD.encode(digest.0);
    let uid = sanitize(encoded.chars().take(options.uid_length).collect());
    match options.debug {
        true => format!("{name}-{uid}"),
        false => uid,
    }
}

/// Identifiers may not start with a digit, nor with `-` followed by a digit
/// (or `-` on its own).
fn sanitize(mut uid: String) -> String {
    let mut chars = uid.chars();
    let illegal_start = match (chars.next(), chars.next()) {
        (Some(c), _) if c.is_ascii_digit() => true,
        (Some('-'), None) => true,
        (Some('-'), Some(c)) => c.is_ascii_digit(),
        _ => false,
    };
    if illegal_start {
        uid.replace_range(..1, "_");
    }
    uid
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn options(uid_length: usize) -> Options {
        Options { uid_length, ..Options::default() }
    }

    #[rstest]
    // md5("a:box") = 54QF9ysf…, leading digit gets replaced.
    #[case("a", "box", "_4QF9")]
    #[case("a", "bar", "mDK9I")]
    #[case("a", "foo", "_FS3B")]
    #[case("b", "title", "tG5vJ")]
    #[case("c/c", "item", "IsZ-r")]
    #[case("styles/a", "box", "Zy-qv")]
    fn test_known_identifiers(#[case] key: &str, #[case] name: &str, #[case] expected: &str) {
        assert_eq!(generate(&LogicalKey::from(key), name, &options(5)), expected);
    }

    #[test]
    fn test_deterministic() {
        let key = LogicalKey::from("c/c");
        let options = Options { salt: "pepper".into(), ..Options::default() };
        assert_eq!(generate(&key, "item", &options), generate(&key, "item", &options));
    }

    #[test]
    fn test_names_and_keys_are_namespaced() {
        let options = options(5);
        let a = LogicalKey::from("a");
        assert_ne!(generate(&a, "box", &options), generate(&a, "bar", &options));
        assert_ne!(generate(&a, "box", &options), generate(&LogicalKey::from("b"), "box", &options));
        // Names are case-sensitive.
        assert_ne!(generate(&a, "box", &options), generate(&a, "Box", &options));
    }

    #[test]
    fn test_salt_changes_identifier() {
        let a = LogicalKey::from("a");
        let salted = Options { salt: "pepper".into(), ..Options::default() };
        // md5("a:boxpepper") = LxKBW3Bn…
        assert_eq!(generate(&a, "box", &salted), "LxKBW");
    }

    #[rstest]
    #[case(1, "m")]
    #[case(8, "mDK9IJb9")]
    #[case(22, "mDK9IJb9-E0Tn0PDdccpKg")]
    // Digest only has 22 characters to give.
    #[case(40, "mDK9IJb9-E0Tn0PDdccpKg")]
    fn test_uid_length(#[case] uid_length: usize, #[case] expected: &str) {
        assert_eq!(generate(&LogicalKey::from("a"), "bar", &options(uid_length)), expected);
    }

    #[test]
    fn test_debug_prefix() {
        let debug = Options { debug: true, ..Options::default() };
        let uid = generate(&LogicalKey::from("a"), "box", &debug);
        assert_eq!(uid, "box-_4QF9");
        assert!(!generate(&LogicalKey::from("a"), "box", &options(5)).contains("box"));
    }

    #[rstest]
    #[case("abc", "abc")]
    #[case("5bc", "_bc")]
    #[case("-5c", "_5c")]
    #[case("-", "_")]
    #[case("-a5", "-a5")]
    #[case("--a", "--a")]
    #[case("_5c", "_5c")]
    fn test_sanitize(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(sanitize(input.to_string()), expected);
    }
}
