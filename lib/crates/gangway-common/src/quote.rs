//! POSIX shell quoting for values the controller interpolates into remote
//! command lines (deploy-template substitutions, `cd <cwd>` prefixes,
//! `pct exec` payloads, environment exports).

use std::borrow::Cow;

/// Characters that never need quoting in a POSIX shell word.
fn is_safe(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '@' | '%' | '+' | '=' | ':' | ',' | '.' | '/' | '-')
}

/// Quote `value` so a POSIX shell treats it as a single literal word.
///
/// Safe strings pass through unchanged; everything else is wrapped in
/// single quotes, with embedded single quotes escaped as `'"'"'`.
#[must_use]
pub fn sh_quote(value: &str) -> Cow<'_, str> {
    if !value.is_empty() && value.chars().all(is_safe) {
        return Cow::Borrowed(value);
    }
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for ch in value.chars() {
        if ch == '\'' {
            quoted.push_str("'\"'\"'");
        } else {
            quoted.push(ch);
        }
    }
    quoted.push('\'');
    Cow::Owned(quoted)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Splitting a quoted value back through POSIX word rules yields
        /// exactly the original value.
        #[test]
        #[allow(clippy::expect_used)]
        fn prop_sh_quote_roundtrips_through_word_splitting(value in "[ -~]{0,40}") {
            let quoted = sh_quote(&value);
            let words = shell_words::split(&quoted).expect("quoted value must tokenize");
            prop_assert_eq!(words, vec![value]);
        }
    }
}
