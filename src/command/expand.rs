// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 procpipe contributors

//! Variable expansion
//!
//! Replaces `$NAME` and `${NAME}` in a word with values from an [`EnvPolicy`].

use std::iter::Peekable;
use std::str::Chars;

use crate::env::EnvPolicy;

/// Single-character names that terminate immediately after `$`
fn is_special(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '*' | '#' | '$' | '@' | '!' | '?' | '-')
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Expand every variable reference in `input`.
///
/// A `$` that does not start a reference, and an unterminated `${`, are kept
/// as literal text.
pub fn expand(input: &str, env: &EnvPolicy) -> String {
    if !input.contains('$') {
        return input.to_string();
    }

    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' {
            expand_dollar(&mut chars, env, &mut out);
        } else {
            out.push(c);
        }
    }

    out
}

fn expand_dollar(chars: &mut Peekable<Chars>, env: &EnvPolicy, out: &mut String) {
    match chars.peek().copied() {
        Some('{') => {
            let rest: String = chars.clone().skip(1).collect();
            match rest.find('}') {
                Some(end) => {
                    let name = &rest[..end];
                    out.push_str(&env.lookup(name));
                    // '{' + name + '}'
                    for _ in 0..name.chars().count() + 2 {
                        chars.next();
                    }
                }
                None => out.push('$'),
            }
        }
        Some(c) if is_special(c) => {
            chars.next();
            out.push_str(&env.lookup(c.encode_utf8(&mut [0; 4])));
        }
        Some(c) if is_name_start(c) => {
            let mut name = String::new();
            while let Some(&c) = chars.peek() {
                if !is_name_char(c) {
                    break;
                }
                name.push(c);
                chars.next();
            }
            out.push_str(&env.lookup(&name));
        }
        _ => out.push('$'),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn override_env(pairs: &[(&str, &str)]) -> EnvPolicy {
        EnvPolicy::Override(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    #[test]
    fn test_simple_and_braced() {
        let env = override_env(&[("FOO", "bar"), ("N", "1")]);
        assert_eq!(expand("$FOO", &env), "bar");
        assert_eq!(expand("${FOO}baz", &env), "barbaz");
        assert_eq!(expand("x$FOO-$N.y", &env), "xbar-1.y");
    }

    #[test]
    fn test_override_does_not_fall_back() {
        std::env::set_var("PROCPIPE_EXPAND_AMBIENT", "ambient");
        let env = override_env(&[]);
        assert_eq!(expand("[$PROCPIPE_EXPAND_AMBIENT]", &env), "[]");
        assert_eq!(
            expand("[$PROCPIPE_EXPAND_AMBIENT]", &EnvPolicy::Inherit),
            "[ambient]"
        );
    }

    #[test]
    fn test_literal_dollars() {
        let env = override_env(&[]);
        assert_eq!(expand("cost: 5$", &env), "cost: 5$");
        assert_eq!(expand("$ $%", &env), "$ $%");
        assert_eq!(expand("${UNCLOSED", &env), "${UNCLOSED");
    }

    #[test]
    fn test_special_names() {
        let env = override_env(&[("1", "first"), ("?", "0")]);
        assert_eq!(expand("$1x $?", &env), "firstx 0");
    }

    #[test]
    fn test_no_dollar_is_unchanged() {
        assert_eq!(expand("plain text", &EnvPolicy::Inherit), "plain text");
    }
}
