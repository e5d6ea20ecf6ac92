use crate::{
    ast::Literal,
    error::{ErrorMsg, SyntaxError},
    token::{Pos, Token, TokenKind},
};
use std::{fmt::Display, iter::Peekable, str::Chars};

#[derive(Debug)]
pub struct Lexer<'a> {
    source: &'a str,
    stream: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
    // Byte offsets into `source`
    start: usize,
    current: usize,
    start_pos: Pos,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            stream: source.chars().peekable(),
            line: 1,
            column: 1,
            start: 0,
            current: 0,
            start_pos: Pos::new(1, 1),
        }
    }

    /// Lex the whole source. The first error aborts lexing, as
    /// nothing after an unknown character can be trusted.
    pub fn lex_all(mut self) -> Result<Vec<Token>, SyntaxError> {
        let mut tokens: Vec<Token> = Vec::default();
        loop {
            let t = self.lex()?;
            if t.kind == TokenKind::EOF {
                break;
            }
            tokens.push(t);
        }
        Ok(tokens)
    }

    /// Same as [`Lexer::lex_all`], without whitespace and comments.
    pub fn lex_all_sanitised(self) -> Result<Vec<Token>, SyntaxError> {
        Ok(self
            .lex_all()?
            .into_iter()
            .filter(|t| !matches!(t.kind, TokenKind::WHITESPACE | TokenKind::COMMENT))
            .collect())
    }

    pub fn lex(&mut self) -> Result<Token, SyntaxError> {
        self.start = self.current;
        self.start_pos = Pos::new(self.line, self.column);
        let Some(c) = self.advance() else {
            return Ok(self.make_token(TokenKind::EOF));
        };
        match c {
            '!' => Ok(self.lookahead_for_token('=', TokenKind::BANG_EQUAL, TokenKind::BANG)),
            '=' => Ok(self.lookahead_for_token('=', TokenKind::EQUAL_EQUAL, TokenKind::EQUAL)),
            '>' => Ok(self.lookahead_for_token(
                '=',
                TokenKind::GREATER_EQUAL,
                TokenKind::GREATER,
            )),
            '<' => Ok(self.lookahead_for_token('=', TokenKind::LESS_EQUAL, TokenKind::LESS)),
            '+' => Ok(self.lookahead_for_token('=', TokenKind::PLUS_EQUAL, TokenKind::PLUS)),
            '-' => Ok(self.lookahead_for_token('=', TokenKind::MINUS_EQUAL, TokenKind::MINUS)),
            '*' => Ok(self.lookahead_for_token('=', TokenKind::STAR_EQUAL, TokenKind::STAR)),
            '%' => Ok(self.lookahead_for_token(
                '=',
                TokenKind::PERCENT_EQUAL,
                TokenKind::PERCENT,
            )),
            '^' => Ok(self.lookahead_for_token('=', TokenKind::CARET_EQUAL, TokenKind::CARET)),
            '/' => Ok(self.lex_slash()),
            '&' => self.lex_pair('&', TokenKind::AND_AND),
            '|' => self.lex_pair('|', TokenKind::OR_OR),
            '#' => {
                self.advance_while(|c| c != '\n');
                Ok(self.make_token(TokenKind::COMMENT))
            }
            '"' => self.lex_string(),
            '$' => {
                if self
                    .stream
                    .peek()
                    .filter(|&&c| c.is_ascii_alphabetic() || c == '_')
                    .is_some()
                {
                    Ok(self.lex_ident())
                } else {
                    Err(self.error(ErrorMsg::UnexpectedChar, "`$`"))
                }
            }
            _ => {
                if let Some(t) = TokenKind::from_char(c) {
                    Ok(self.make_token(t))
                } else if c.is_ascii_alphabetic() || c == '_' {
                    Ok(self.lex_ident())
                } else if c.is_ascii_digit() {
                    self.lex_number(c)
                } else {
                    Err(self.error(ErrorMsg::UnexpectedChar, format!("`{c}`")))
                }
            }
        }
    }

    fn lex_ident(&mut self) -> Token {
        self.advance_while(|c| c.is_ascii_alphanumeric() || c == '_');
        let lexeme = self.lexeme_from_range();
        if lexeme == "else" && self.consume_trailing_if() {
            return self.make_token(TokenKind::ELSE_IF);
        }
        match TokenKind::from_keyword(lexeme) {
            Some(t) => self.make_token(t),
            None => self.make_token(TokenKind::IDENT),
        }
    }

    /// `else if` is lexed as a single token so that the parser never
    /// has to decide which `if` an `else` belongs to.
    fn consume_trailing_if(&mut self) -> bool {
        let rest = &self.source[self.current..];
        let after_gap = rest.trim_start_matches(|c| c == ' ' || c == '\t');
        let gap = rest.len() - after_gap.len();
        let is_if = after_gap
            .strip_prefix("if")
            .is_some_and(|tail| !tail.starts_with(|c: char| c.is_ascii_alphanumeric() || c == '_'));
        if gap == 0 || !is_if {
            return false;
        }
        // The gap is made of single-byte characters
        for _ in 0..gap + 2 {
            self.advance();
        }
        true
    }

    fn lex_number(&mut self, first: char) -> Result<Token, SyntaxError> {
        let radix = match (first, self.stream.peek()) {
            ('0', Some('x')) => Some(16),
            ('0', Some('o')) => Some(8),
            ('0', Some('b')) => Some(2),
            _ => None,
        };
        if let Some(radix) = radix {
            // Consume the radix prefix
            self.advance();
            if self.advance_while(|c| c.is_digit(radix)).is_none() {
                return Err(self.error(
                    ErrorMsg::MissingDigits,
                    format!("`{}`", self.lexeme_from_range()),
                ));
            }
            let digits = &self.source[self.start + 2..self.current];
            let value = i64::from_str_radix(digits, radix).map_err(|_| {
                self.error(
                    ErrorMsg::IntegerTooLarge,
                    format!("`{}`", self.lexeme_from_range()),
                )
            })?;
            return Ok(self.make_token(TokenKind::INT).with_literal(Literal::Int(value)));
        }

        // Consume the integral part
        self.advance_while(|c| c.is_ascii_digit());
        let mut is_float = false;
        // A trailing dot alone is enough to make a float, e.g. `1.`
        if self.advance_if(|c| c == '.').is_some() {
            is_float = true;
            self.advance_while(|c| c.is_ascii_digit());
        }
        if self.exponent_follows() {
            is_float = true;
            // Consume the `e` and the optional sign
            self.advance();
            self.advance_if(|c| c == '+' || c == '-');
            self.advance_while(|c| c.is_ascii_digit());
        }

        let lexeme = self.lexeme_from_range();
        if is_float {
            let value: f64 = lexeme
                .parse()
                .map_err(|_| self.error(ErrorMsg::MissingDigits, format!("`{lexeme}`")))?;
            Ok(self.make_token(TokenKind::FLOAT).with_literal(Literal::Float(value)))
        } else {
            let value: i64 = lexeme
                .parse()
                .map_err(|_| self.error(ErrorMsg::IntegerTooLarge, format!("`{lexeme}`")))?;
            Ok(self.make_token(TokenKind::INT).with_literal(Literal::Int(value)))
        }
    }

    /// Whether the upcoming characters form an exponent such as `e3`,
    /// `e+3` or `e-3`. A bare `e` is left alone to be lexed as an identifier.
    fn exponent_follows(&self) -> bool {
        let mut rest = self.source[self.current..].chars();
        if rest.next() != Some('e') {
            return false;
        }
        match rest.next() {
            Some(c) if c.is_ascii_digit() => true,
            Some('+' | '-') => rest.next().is_some_and(|c| c.is_ascii_digit()),
            _ => false,
        }
    }

    fn lex_string(&mut self) -> Result<Token, SyntaxError> {
        loop {
            match self.advance() {
                Some('"') => break,
                // Skip over the escaped character, which may be a quote
                Some('\\') => {
                    if self.advance().is_none() {
                        return Err(self.error(ErrorMsg::UnterminatedString, ""));
                    }
                }
                Some(_) => {}
                None => return Err(self.error(ErrorMsg::UnterminatedString, "")),
            }
        }
        // Strip the surrounding quotes; escapes are kept verbatim
        let contents = self.source[self.start + 1..self.current - 1].to_string();
        Ok(self
            .make_token(TokenKind::STRING)
            .with_literal(Literal::Str(contents)))
    }

    fn lex_slash(&mut self) -> Token {
        if self.advance_if(|c| c == '/').is_some() {
            self.lookahead_for_token(
                '=',
                TokenKind::SLASH_SLASH_EQUAL,
                TokenKind::SLASH_SLASH,
            )
        } else {
            self.lookahead_for_token('=', TokenKind::SLASH_EQUAL, TokenKind::SLASH)
        }
    }

    fn lex_pair(&mut self, second: char, kind: TokenKind) -> Result<Token, SyntaxError> {
        if self.advance_if(|c| c == second).is_some() {
            Ok(self.make_token(kind))
        } else {
            Err(self.error(ErrorMsg::UnexpectedChar, format!("`{second}`")))
        }
    }

    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.start_pos, self.lexeme_from_range().to_string())
    }

    fn lexeme_from_range(&self) -> &'a str {
        &self.source[self.start..self.current]
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.stream.next()?;
        self.current += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn advance_if<F>(&mut self, cond: F) -> Option<char>
    where
        F: FnOnce(char) -> bool,
    {
        if self.stream.peek().filter(|&&c| cond(c)).is_some() {
            self.advance()
        } else {
            None
        }
    }

    fn advance_while<F>(&mut self, cond: F) -> Option<usize>
    where
        F: Fn(char) -> bool,
    {
        let mut count: usize = 0;
        while self.stream.peek().filter(|&&c| cond(c)).is_some() {
            count += 1;
            self.advance();
        }
        count.ne(&0).then_some(count)
    }

    fn lookahead_for_token(
        &mut self,
        match_char: char,
        if_match: TokenKind,
        no_match: TokenKind,
    ) -> Token {
        if self.advance_if(|c| c == match_char).is_some() {
            self.make_token(if_match)
        } else {
            self.make_token(no_match)
        }
    }

    fn error(&self, msg: ErrorMsg, ctx: impl Display) -> SyntaxError {
        SyntaxError::new(self.start_pos, msg, ctx)
    }
}
