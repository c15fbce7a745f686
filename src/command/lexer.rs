// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 procpipe contributors

//! Command string lexer
//!
//! Splits a command string into words and pipe separators. Quotes and escapes
//! are removed from words; `$` references are left untouched for the expander.

use std::fmt;

use crate::errors::ParseError;

/// A lexical token of a command string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A word with quotes and escapes removed
    Word(String),
    /// An unquoted, unescaped `|`
    Pipe,
}

impl Token {
    /// Shorthand for building word tokens
    pub fn word(s: impl Into<String>) -> Self {
        Self::Word(s.into())
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Word(w) => write!(f, "{}", w),
            Self::Pipe => write!(f, "|"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quote {
    None,
    Single,
    Double,
}

/// Tokenize a command string.
///
/// `a "b c"|d` yields `[Word("a"), Word("b c"), Pipe, Word("d")]`.
pub fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    // Separate from `word.is_empty()` so that `""` still yields a token
    let mut in_word = false;
    let mut quote = Quote::None;
    let mut quote_start = 0;

    let mut chars = input.char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        match quote {
            Quote::Single => {
                if c == '\'' {
                    quote = Quote::None;
                } else {
                    word.push(c);
                }
            }
            Quote::Double => match c {
                '"' => quote = Quote::None,
                '\\' => match chars.peek() {
                    Some(&(_, next @ ('"' | '\\'))) => {
                        word.push(next);
                        chars.next();
                    }
                    _ => word.push(c),
                },
                _ => word.push(c),
            },
            Quote::None => match c {
                '\'' | '"' => {
                    quote = if c == '\'' { Quote::Single } else { Quote::Double };
                    quote_start = offset;
                    in_word = true;
                }
                '\\' => {
                    let Some((_, next)) = chars.next() else {
                        return Err(ParseError::TrailingEscape { offset });
                    };
                    word.push(next);
                    in_word = true;
                }
                '|' => {
                    if in_word {
                        tokens.push(Token::Word(std::mem::take(&mut word)));
                        in_word = false;
                    }
                    tokens.push(Token::Pipe);
                }
                c if c.is_whitespace() => {
                    if in_word {
                        tokens.push(Token::Word(std::mem::take(&mut word)));
                        in_word = false;
                    }
                }
                _ => {
                    word.push(c);
                    in_word = true;
                }
            },
        }
    }

    match quote {
        Quote::None => {}
        Quote::Single => {
            return Err(ParseError::UnterminatedQuote {
                quote: '\'',
                offset: quote_start,
            })
        }
        Quote::Double => {
            return Err(ParseError::UnterminatedQuote {
                quote: '"',
                offset: quote_start,
            })
        }
    }

    if in_word {
        tokens.push(Token::Word(word));
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(input: &str) -> Vec<String> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|t| t.to_string())
            .collect()
    }

    #[test]
    fn test_quoted_word_is_one_token() {
        assert_eq!(words(r#"a "b c" d"#), vec!["a", "b c", "d"]);
    }

    #[test]
    fn test_pipe_without_spaces() {
        assert_eq!(
            tokenize("echo hi|wc -l").unwrap(),
            vec![
                Token::word("echo"),
                Token::word("hi"),
                Token::Pipe,
                Token::word("wc"),
                Token::word("-l"),
            ]
        );
    }

    #[test]
    fn test_quoted_pipe_is_a_word() {
        assert_eq!(
            tokenize("echo '|' \"a|b\"").unwrap(),
            vec![Token::word("echo"), Token::word("|"), Token::word("a|b")]
        );
    }

    #[test]
    fn test_escaped_pipe_is_a_word() {
        assert_eq!(
            tokenize(r"echo a\|b").unwrap(),
            vec![Token::word("echo"), Token::word("a|b")]
        );
    }

    #[test]
    fn test_adjacent_quotes_join() {
        assert_eq!(words(r#"pre"mid dle"'post'"#), vec!["premid dlepost"]);
    }

    #[test]
    fn test_empty_quotes_yield_empty_word() {
        assert_eq!(words(r#"printf '' """#), vec!["printf", "", ""]);
    }

    #[test]
    fn test_single_quotes_are_literal() {
        assert_eq!(words(r#"echo 'a\"b $X'"#), vec!["echo", r#"a\"b $X"#]);
    }

    #[test]
    fn test_double_quote_escapes() {
        assert_eq!(words(r#"echo "say \"hi\" \n""#), vec!["echo", r#"say "hi" \n"#]);
    }

    #[test]
    fn test_dollar_is_kept_for_expansion() {
        assert_eq!(words("echo $HOME ${USER}"), vec!["echo", "$HOME", "${USER}"]);
    }

    #[test]
    fn test_unterminated_quote() {
        assert_eq!(
            tokenize("echo \"oops"),
            Err(ParseError::UnterminatedQuote {
                quote: '"',
                offset: 5
            })
        );
        assert!(matches!(
            tokenize("echo 'oops"),
            Err(ParseError::UnterminatedQuote { quote: '\'', .. })
        ));
    }

    #[test]
    fn test_trailing_escape() {
        assert_eq!(
            tokenize("echo \\"),
            Err(ParseError::TrailingEscape { offset: 5 })
        );
    }

    #[test]
    fn test_whitespace_only() {
        assert!(tokenize("  \t \n").unwrap().is_empty());
    }
}
