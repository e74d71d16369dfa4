//! Standalone validation patterns.
//!
//! Five anchored patterns exercised against fixed input vectors. They sit
//! beside the interpreter pipeline but take no part in it.

use std::sync::LazyLock;

use regex::Regex;

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("pattern must compile")
}

/// User of at least two word characters, a domain, any number of
/// intermediate labels, and a three-letter lowercase TLD.
pub static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^[A-Za-z0-9._]{2,}@[A-Za-z0-9~]+\.([A-Za-z0-9-]+\.)*[a-z]{3}$"));

/// Strings of odd length between 11 and 19 characters.
pub static ODD_STRINGS: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^.{11}$|^.{13}$|^.{15}$|^.{17}$|^.{19}$"));

/// Bracketed single-quoted letters separated by `,` or `, `.
pub static CHARACTER_LIST: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^\[(('[a-zA-Z]'(,\s?'[a-zA-Z]')*)?)\]$"));

/// Optionally negative decimal with no leading zeros and at least one
/// digit on both sides of the point.
pub static DECIMAL: LazyLock<Regex> = LazyLock::new(|| compile(r"^(-)?(0|[1-9]\d*)\.\d+$"));

/// Double-quoted string with the language's escape sequences.
pub static STRING: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"^"([^"\\]|\\[bnrt'"\\])*"$"#));

#[cfg(test)]
mod tests {
    use super::*;

    fn check(pattern: &Regex, cases: &[(&str, &str, bool)]) {
        for (name, input, expected) in cases {
            assert_eq!(
                pattern.is_match(input),
                *expected,
                "{name}: {input:?} should {}match",
                if *expected { "" } else { "not " }
            );
        }
    }

    #[test]
    fn email_pattern() {
        check(
            &EMAIL,
            &[
                ("alphanumeric", "thelegend27@gmail.com", true),
                ("university domain", "otherdomain@ufl.edu", true),
                ("dots in user", "dot.domain@gmail.com", true),
                ("underscore in user", "under_score@gmail.com", true),
                ("fourth-level domain", "fourthlvl@docs.developer.google.com", true),
                ("missing domain dot", "missingdot@gmailcom", false),
                ("missing at sign", "missingatgmail.com", false),
                ("symbols in user", "symbols#$%@gmail.com", false),
                ("two-letter tld", "toplvl@domain.io", false),
                ("four-letter tld", "longdomain@domain.info", false),
                ("one-letter user", "t@gmail.com", false),
                ("empty user", "@gmail.com", false),
            ],
        );
    }

    #[test]
    fn odd_strings_pattern() {
        check(
            &ODD_STRINGS,
            &[
                ("11 characters", "automobiles", true),
                ("13 characters", "i<3pancakes13", true),
                ("15 characters", "...pancakes1515", true),
                ("17 characters", "___pancakes171717", true),
                ("19 characters", "~~~pancakes19191919", true),
                ("5 characters", "5five", false),
                ("12 characters", "<3pancakes12", false),
                ("14 characters", "i<3pancakes14!", false),
                ("16 characters", "i<3pancakes16!16", false),
                ("20 characters", "i<3i<3i<3pancakes20!", false),
            ],
        );
    }

    #[test]
    fn character_list_pattern() {
        check(
            &CHARACTER_LIST,
            &[
                ("single element", "['a']", true),
                ("empty list", "[]", true),
                ("multiple elements", "['a','b','c']", true),
                ("mixed spaces", "['a','b', 'c']", true),
                ("even spaces", "['a', 'b', 'c']", true),
                ("missing brackets", "'a','b','c'", false),
                ("missing commas", "['a' 'b' 'c']", false),
                ("space before comma", "['a' ,'b', 'c']", false),
                ("space before end", "['a','b','c' ]", false),
                ("trailing comma", "['a','b','c',]", false),
                ("space at start", "[ 'a','b','c']", false),
            ],
        );
    }

    #[test]
    fn decimal_pattern() {
        check(
            &DECIMAL,
            &[
                ("plain", "10100.001", true),
                ("negative", "-1.0", true),
                ("zero", "0.0", true),
                ("trailing zeros", "1.000", true),
                ("zero whole part", "0.5", true),
                ("integer", "1", false),
                ("missing whole part", ".5", false),
                ("leading zeros", "0001.10", false),
                ("negative integer", "-5", false),
                ("negative missing whole part", "-.01", false),
            ],
        );
    }

    #[test]
    fn string_pattern() {
        check(
            &STRING,
            &[
                ("empty string", r#""""#, true),
                ("plain text", r#""Hello, World!""#, true),
                ("tab escape", r#""1\t2""#, true),
                ("backspace escape", r#""a\bb""#, true),
                ("backslash escape", r#""x\\y""#, true),
                ("missing end quote", r#""unterminated"#, false),
                ("invalid escape", r#""invalid\escape""#, false),
                ("three quotes", r#"""""#, false),
                ("unquoted", "unquoted", false),
                ("text outside quotes", r#""inside"outside"#, false),
            ],
        );
    }
}
