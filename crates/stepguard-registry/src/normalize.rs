//! Pattern normalization
//!
//! Every comparison in the registry goes through [`normalize`]: two step
//! patterns are the same step exactly when their normalized forms are equal.

use regex::Regex;
use std::sync::OnceLock;
use stepguard_core::PARAM_MARKER;

/// Matches one innermost `{...}` placeholder
fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{[^{}]*\}").expect("placeholder regex is valid"))
}

/// Canonical comparable form of a step pattern
///
/// Placeholders such as `{string}` or `{ amount }` fold into `{param}`,
/// whitespace runs collapse to one space, ends are trimmed and the result is
/// lower-cased. Total and idempotent; `""` maps to `""`.
pub fn normalize(raw: &str) -> String {
    let folded = placeholder_regex().replace_all(raw, PARAM_MARKER);
    folded
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Whether the pattern contains at least one `{...}` placeholder
///
/// Parentheses are not parameters: in a Cucumber expression `(s)` is optional
/// text, and regex-literal capture groups cannot be told apart from it once
/// the literal is unwrapped.
pub fn is_parameterized(raw: &str) -> bool {
    placeholder_regex().is_match(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folds_placeholders() {
        assert_eq!(
            normalize("Alex enters {string} into the {word} field"),
            "alex enters {param} into the {param} field"
        );
        assert_eq!(normalize("pays { amount } now"), "pays {param} now");
        assert_eq!(normalize("{}"), "{param}");
    }

    #[test]
    fn test_whitespace_and_case() {
        assert_eq!(
            normalize("  Alex   clicks\tthe\nBilling  button "),
            "alex clicks the billing button"
        );
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" \t\n "), "");
    }

    #[test]
    fn test_nested_braces() {
        assert_eq!(normalize("a {{b}} c"), "a {{param}} c");
        assert_eq!(normalize("unbalanced { brace"), "unbalanced { brace");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "",
            "Alex clicks the billing Get Started button",
            "  {STRING}  and {Int} ",
            "a {{b}} {c d} }{ {",
            "Ünïcödé   Straße {x}",
            "{param}",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", sample);
        }
    }

    #[test]
    fn test_is_parameterized() {
        assert!(is_parameterized("Alex enters {string}"));
        assert!(!is_parameterized("Alex clicks the button"));
        assert!(!is_parameterized("a { b"));
    }

    #[test]
    fn test_parentheses_are_not_parameters() {
        assert!(!is_parameterized(r"Alex enters (\d+) seats"));
        assert!(is_parameterized("Alex has {int} cucumber(s)"));
        assert!(!is_parameterized("Alex adds a cucumber(s)"));
        assert_eq!(normalize(r"Alex enters (\d+) seats"), r"alex enters (\d+) seats");
    }
}
