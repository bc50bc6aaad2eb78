//! Filesystem-safe names for output files.
//!
//! Identifiers contain `/` and other characters that are either illegal or
//! meaningful in paths. Every character outside `[A-Za-z0-9_.-]` becomes `_`,
//! one underscore per character, so `1234567/23.ABC` is stored as
//! `1234567_23.ABC.pdf`.

/// Replace every character outside `[A-Za-z0-9_.-]` with `_`.
///
/// Total and idempotent: the output alphabet is a subset of the kept set.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if is_safe(c) { c } else { '_' })
        .collect()
}

/// True when every character of `name` survives [`sanitize`] unchanged.
pub fn is_sanitized(name: &str) -> bool {
    name.chars().all(is_safe)
}

fn is_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slash_becomes_underscore() {
        assert_eq!(sanitize("1234567/23.ABC"), "1234567_23.ABC");
        assert_eq!(sanitize("999/23.A"), "999_23.A");
    }

    #[test]
    fn test_safe_chars_untouched() {
        assert_eq!(sanitize("SEM_PROCESSO_PAG_2"), "SEM_PROCESSO_PAG_2");
        assert_eq!(sanitize("a-b.c_D9"), "a-b.c_D9");
    }

    #[test]
    fn test_non_ascii_is_one_underscore_per_char() {
        assert_eq!(sanitize("nº 12"), "n__12");
        assert_eq!(sanitize("ação"), "a__o");
    }

    #[test]
    fn test_empty() {
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn test_idempotent_and_alphabet() {
        let inputs = [
            "1234567-89.2023.8.26.0100",
            "a b\tc\n",
            "../../etc/passwd",
            "C:\\dir\\file",
            "名前/テスト",
            "",
        ];
        for input in inputs {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "not idempotent for {input:?}");
            assert!(is_sanitized(&once), "bad alphabet in {once:?}");
            assert_eq!(once.chars().count(), input.chars().count());
        }
    }

    #[test]
    fn test_path_traversal_neutralised() {
        let s = sanitize("../../etc/passwd");
        assert!(!s.contains('/'));
        assert_eq!(s, ".._.._etc_passwd");
    }
}
