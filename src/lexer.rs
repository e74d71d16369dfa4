use thiserror::Error;

use crate::token::{Token, TokenKind};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LexError {
    #[error("Invalid identifier start at index {index}")]
    MalformedIdentifier { index: usize },
    #[error("Leading zeros are not allowed at index {index}")]
    LeadingZero { index: usize },
    #[error("Integer zero cannot be negative at index {index}")]
    NegativeZero { index: usize },
    #[error("Digit must follow the decimal point at index {index}")]
    ExpectedFractionDigit { index: usize },
    #[error("Character literal cannot be empty at index {index}")]
    EmptyCharacter { index: usize },
    #[error("Unterminated character literal at index {index}")]
    UnterminatedCharacter { index: usize },
    #[error("Unterminated string literal at index {index}")]
    UnterminatedString { index: usize },
    #[error("String literal cannot span multiple lines at index {index}")]
    StringLineBreak { index: usize },
    #[error("Invalid escape sequence at index {index}")]
    InvalidEscape { index: usize },
    #[error("Lexer invariant violated: {message}")]
    InvariantViolation { message: &'static str },
}

pub type LexResult<T> = Result<T, LexError>;

/// Character-cursor lexer. `pos` is the current byte offset and
/// `token_start` marks the beginning of the token being assembled; `emit`
/// slices the input between the two.
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    token_start: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            token_start: 0,
        }
    }

    /// Lexes the whole input, skipping runs of whitespace between tokens.
    pub fn lex(mut self) -> LexResult<Vec<Token<'a>>> {
        let mut tokens = Vec::new();
        loop {
            self.consume_while(char::is_whitespace);
            if self.peek_char().is_none() {
                return Ok(tokens);
            }
            self.token_start = self.pos;
            tokens.push(self.lex_token()?);
        }
    }

    /// Dispatches on single-character lookahead. Whitespace is handled by
    /// `lex`, so the next character starts a token.
    fn lex_token(&mut self) -> LexResult<Token<'a>> {
        let c = self.peek_char().ok_or(LexError::InvariantViolation {
            message: "lex_token called at end of input",
        })?;

        if c.is_ascii_alphabetic() || c == '@' {
            self.lex_identifier()
        } else if c.is_ascii_digit() || (c == '-' && self.digit_follows()) {
            self.lex_number()
        } else if c == '\'' {
            self.lex_character()
        } else if c == '"' {
            self.lex_string()
        } else {
            self.lex_operator()
        }
    }

    fn lex_identifier(&mut self) -> LexResult<Token<'a>> {
        if self.peek_char() == Some('@') {
            self.consume_char();
        }
        match self.peek_char() {
            Some(c) if c.is_ascii_alphabetic() => {}
            _ => return Err(LexError::MalformedIdentifier { index: self.pos }),
        }
        self.consume_while(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        Ok(self.emit(TokenKind::Identifier))
    }

    fn lex_number(&mut self) -> LexResult<Token<'a>> {
        let negative = self.peek_char() == Some('-');
        if negative {
            self.consume_char();
        }

        // A whole-number part of `0` must be exactly `0`.
        if self.peek_char() == Some('0') {
            self.consume_char();
            if self.peek_char() == Some('.') {
                return self.lex_fraction();
            }
            if matches!(self.peek_char(), Some(c) if c.is_ascii_digit()) {
                return Err(LexError::LeadingZero { index: self.pos });
            }
            if negative {
                return Err(LexError::NegativeZero { index: self.pos });
            }
            return Ok(self.emit(TokenKind::Integer));
        }

        self.consume_while(|c| c.is_ascii_digit());
        if self.peek_char() == Some('.') {
            return self.lex_fraction();
        }
        Ok(self.emit(TokenKind::Integer))
    }

    fn lex_fraction(&mut self) -> LexResult<Token<'a>> {
        self.consume_char(); // decimal point
        if !matches!(self.peek_char(), Some(c) if c.is_ascii_digit()) {
            return Err(LexError::ExpectedFractionDigit { index: self.pos });
        }
        self.consume_while(|c| c.is_ascii_digit());
        Ok(self.emit(TokenKind::Decimal))
    }

    fn lex_character(&mut self) -> LexResult<Token<'a>> {
        self.consume_char(); // opening quote
        match self.peek_char() {
            Some('\'') => return Err(LexError::EmptyCharacter { index: self.pos }),
            Some('\\') => {
                self.consume_char();
                self.lex_escape()?;
            }
            Some(c) if c != '\n' && c != '\r' => {
                self.consume_char();
            }
            Some(_) | None => return Err(LexError::UnterminatedCharacter { index: self.pos }),
        }
        if self.peek_char() != Some('\'') {
            return Err(LexError::UnterminatedCharacter { index: self.pos });
        }
        self.consume_char(); // closing quote
        Ok(self.emit(TokenKind::Character))
    }

    fn lex_string(&mut self) -> LexResult<Token<'a>> {
        self.consume_char(); // opening quote
        loop {
            match self.peek_char() {
                None => return Err(LexError::UnterminatedString { index: self.pos }),
                Some('"') => {
                    self.consume_char();
                    return Ok(self.emit(TokenKind::String));
                }
                Some('\n') | Some('\r') => {
                    return Err(LexError::StringLineBreak { index: self.pos });
                }
                Some('\\') => {
                    self.consume_char();
                    self.lex_escape()?;
                }
                Some(_) => {
                    self.consume_char();
                }
            }
        }
    }

    fn lex_escape(&mut self) -> LexResult<()> {
        match self.peek_char() {
            Some('b' | 'n' | 'r' | 't' | '\'' | '"' | '\\') => {
                self.consume_char();
                Ok(())
            }
            _ => Err(LexError::InvalidEscape { index: self.pos }),
        }
    }

    fn lex_operator(&mut self) -> LexResult<Token<'a>> {
        let first = self.consume_char().ok_or(LexError::InvariantViolation {
            message: "lex_operator called at end of input",
        })?;
        if let Some(second) = self.peek_char() {
            if matches!(
                (first, second),
                ('!', '=') | ('=', '=') | ('&', '&') | ('|', '|')
            ) {
                self.consume_char();
            }
        }
        Ok(self.emit(TokenKind::Operator))
    }

    fn digit_follows(&self) -> bool {
        matches!(self.char_at(self.pos + 1), Some(c) if c.is_ascii_digit())
    }

    fn consume_while<P>(&mut self, keep_predicate: P)
    where
        P: Fn(char) -> bool,
    {
        while let Some(c) = self.peek_char() {
            if !keep_predicate(c) {
                break;
            }
            self.consume_char();
        }
    }

    fn char_at(&self, index: usize) -> Option<char> {
        if index >= self.input.len() {
            None
        } else {
            self.input[index..].chars().next()
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.char_at(self.pos)
    }

    fn consume_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn emit(&self, kind: TokenKind) -> Token<'a> {
        Token::new(kind, &self.input[self.token_start..self.pos], self.token_start)
    }
}

pub fn lex(input: &str) -> LexResult<Vec<Token<'_>>> {
    Lexer::new(input).lex()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds_and_literals<'a>(tokens: &[Token<'a>]) -> Vec<(TokenKind, &'a str)> {
        tokens
            .iter()
            .map(|token| (token.kind, token.literal))
            .collect()
    }

    #[test]
    fn lexes_declaration_statement() {
        let tokens = lex("LET x: Integer = 1 + 2;").expect("lex should succeed");
        let expected = vec![
            (TokenKind::Identifier, "LET"),
            (TokenKind::Identifier, "x"),
            (TokenKind::Operator, ":"),
            (TokenKind::Identifier, "Integer"),
            (TokenKind::Operator, "="),
            (TokenKind::Integer, "1"),
            (TokenKind::Operator, "+"),
            (TokenKind::Integer, "2"),
            (TokenKind::Operator, ";"),
        ];
        assert_eq!(kinds_and_literals(&tokens), expected);
    }

    #[test]
    fn records_token_start_indices() {
        let tokens = lex("VAR name = 10;").expect("lex should succeed");
        let indices = tokens.iter().map(Token::index).collect::<Vec<_>>();
        assert_eq!(indices, vec![0, 4, 9, 11, 13]);
    }

    #[test]
    fn lexes_negative_decimal_as_single_token() {
        let tokens = lex("-123.456").expect("lex should succeed");
        assert_eq!(
            kinds_and_literals(&tokens),
            vec![(TokenKind::Decimal, "-123.456")]
        );
    }

    #[test]
    fn lexes_lone_minus_as_operator() {
        let tokens = lex("-").expect("lex should succeed");
        assert_eq!(kinds_and_literals(&tokens), vec![(TokenKind::Operator, "-")]);
    }

    #[test]
    fn minus_before_digit_starts_a_number() {
        let tokens = lex("1-2").expect("lex should succeed");
        assert_eq!(
            kinds_and_literals(&tokens),
            vec![(TokenKind::Integer, "1"), (TokenKind::Integer, "-2")]
        );
    }

    #[test]
    fn minus_with_space_stays_an_operator() {
        let tokens = lex("1 - 2").expect("lex should succeed");
        assert_eq!(
            kinds_and_literals(&tokens),
            vec![
                (TokenKind::Integer, "1"),
                (TokenKind::Operator, "-"),
                (TokenKind::Integer, "2"),
            ]
        );
    }

    #[test]
    fn errors_on_leading_zero() {
        let err = lex("01").expect_err("expected leading zero failure");
        assert_eq!(err, LexError::LeadingZero { index: 1 });
    }

    #[test]
    fn errors_on_negative_zero_integer() {
        let err = lex("-0").expect_err("expected negative zero failure");
        assert_eq!(err, LexError::NegativeZero { index: 2 });
    }

    #[test]
    fn lexes_zero_and_zero_fractions() {
        let tokens = lex("0 0.5 -0.5").expect("lex should succeed");
        assert_eq!(
            kinds_and_literals(&tokens),
            vec![
                (TokenKind::Integer, "0"),
                (TokenKind::Decimal, "0.5"),
                (TokenKind::Decimal, "-0.5"),
            ]
        );
    }

    #[test]
    fn errors_when_no_digit_follows_decimal_point() {
        let err = lex("123.x").expect_err("expected fraction digit failure");
        assert_eq!(err, LexError::ExpectedFractionDigit { index: 4 });
    }

    #[test]
    fn lexes_two_character_operators() {
        let tokens = lex("a != b == c && d || e").expect("lex should succeed");
        let operators = tokens
            .iter()
            .filter(|token| token.kind == TokenKind::Operator)
            .map(Token::literal)
            .collect::<Vec<_>>();
        assert_eq!(operators, vec!["!=", "==", "&&", "||"]);
    }

    #[test]
    fn lexes_at_prefixed_identifier() {
        let tokens = lex("@name list-2 under_score").expect("lex should succeed");
        assert_eq!(
            kinds_and_literals(&tokens),
            vec![
                (TokenKind::Identifier, "@name"),
                (TokenKind::Identifier, "list-2"),
                (TokenKind::Identifier, "under_score"),
            ]
        );
    }

    #[test]
    fn errors_when_at_is_not_followed_by_letter() {
        let err = lex("@1").expect_err("expected identifier failure");
        assert_eq!(err, LexError::MalformedIdentifier { index: 1 });
    }

    #[test]
    fn lexes_character_literals_with_escapes() {
        let tokens = lex(r"'a' '\n' '\''").expect("lex should succeed");
        assert_eq!(
            kinds_and_literals(&tokens),
            vec![
                (TokenKind::Character, "'a'"),
                (TokenKind::Character, r"'\n'"),
                (TokenKind::Character, r"'\''"),
            ]
        );
    }

    #[test]
    fn errors_on_empty_character_literal() {
        let err = lex("''").expect_err("expected empty character failure");
        assert_eq!(err, LexError::EmptyCharacter { index: 1 });
    }

    #[test]
    fn errors_on_overlong_character_literal() {
        let err = lex("'ab'").expect_err("expected unterminated character failure");
        assert_eq!(err, LexError::UnterminatedCharacter { index: 2 });
    }

    #[test]
    fn lexes_string_literals_with_escapes() {
        let tokens = lex(r#""Hello, World!" "1\t2""#).expect("lex should succeed");
        assert_eq!(
            kinds_and_literals(&tokens),
            vec![
                (TokenKind::String, r#""Hello, World!""#),
                (TokenKind::String, r#""1\t2""#),
            ]
        );
    }

    #[test]
    fn errors_on_unterminated_string() {
        let err = lex("\"abc").expect_err("expected unterminated string failure");
        assert_eq!(err, LexError::UnterminatedString { index: 4 });
    }

    #[test]
    fn errors_on_string_line_break() {
        let err = lex("\"abc\ndef\"").expect_err("expected line break failure");
        assert_eq!(err, LexError::StringLineBreak { index: 4 });
    }

    #[test]
    fn errors_on_invalid_escape() {
        let err = lex(r#""invalid\escape""#).expect_err("expected invalid escape failure");
        assert_eq!(err, LexError::InvalidEscape { index: 9 });
    }

    #[test]
    fn skips_unicode_whitespace() {
        let tokens = lex(" \t\u{2003}FUN\u{00a0}main \n").expect("lex should succeed");
        assert_eq!(
            kinds_and_literals(&tokens),
            vec![
                (TokenKind::Identifier, "FUN"),
                (TokenKind::Identifier, "main"),
            ]
        );
    }

    #[test]
    fn lexes_empty_input_to_no_tokens() {
        assert_eq!(lex("").expect("lex should succeed"), Vec::new());
    }
}
