//! Minimal MySQL lexer separating code from literals and comments

use std::iter::Peekable;
use std::str::CharIndices;

/// A lexical unit of a SQL string. Offsets are byte offsets into the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lexeme {
    /// A character outside literals and comments
    Code { offset: usize, ch: char },
    /// A `'...'`, `"..."` or `` `...` `` region including its delimiters
    Quoted { start: usize, end: usize },
    /// A `-- `, `#` or `/* */` comment
    Comment { start: usize, end: usize },
}

/// Backslash handling inside quoted regions, one variant per relevant `sql_mode`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeMode {
    /// Server default: backslash escapes inside `'...'` and `"..."`
    Backslash,
    /// `ANSI_QUOTES`: `"..."` is an identifier, backslash escapes only inside `'...'`
    AnsiQuotes,
    /// `NO_BACKSLASH_ESCAPES`: backslash is an ordinary character
    NoBackslash,
}

impl EscapeMode {
    pub const ALL: [Self; 3] = [Self::Backslash, Self::AnsiQuotes, Self::NoBackslash];

    const fn escapes(self, quote: char) -> bool {
        match self {
            Self::Backslash => quote != '`',
            Self::AnsiQuotes => quote == '\'',
            Self::NoBackslash => false,
        }
    }
}

/// Iterator over the lexemes of a SQL string.
///
/// Executable comments (MySQL `/*! ... */`, MariaDB `/*M! ... */`) are lexed
/// as code so their contents take part in statement checks.
#[derive(Debug)]
pub struct Lexer<'a> {
    sql: &'a str,
    chars: Peekable<CharIndices<'a>>,
    mode: EscapeMode,
}

impl<'a> Lexer<'a> {
    /// Lexer using MySQL's default string escaping
    pub fn new(sql: &'a str) -> Self {
        Self::with_escape_mode(sql, EscapeMode::Backslash)
    }

    pub fn with_escape_mode(sql: &'a str, mode: EscapeMode) -> Self {
        Self {
            sql,
            chars: sql.char_indices().peekable(),
            mode,
        }
    }

    fn quoted(&mut self, start: usize, quote: char) -> Lexeme {
        while let Some((offset, ch)) = self.chars.next() {
            if ch == '\\' && self.mode.escapes(quote) {
                self.chars.next();
                continue;
            }

            if ch == quote {
                // Doubled delimiter is an escaped delimiter
                if self.chars.peek().is_some_and(|&(_, next)| next == quote) {
                    self.chars.next();
                    continue;
                }
                return Lexeme::Quoted {
                    start,
                    end: offset + ch.len_utf8(),
                };
            }
        }

        Lexeme::Quoted {
            start,
            end: self.sql.len(),
        }
    }

    fn line_comment(&mut self, start: usize) -> Lexeme {
        for (offset, ch) in self.chars.by_ref() {
            if ch == '\n' {
                return Lexeme::Comment {
                    start,
                    end: offset + 1,
                };
            }
        }

        Lexeme::Comment {
            start,
            end: self.sql.len(),
        }
    }

    fn block_comment(&mut self, start: usize) -> Lexeme {
        // Skip the '*' of the opening delimiter
        self.chars.next();

        while let Some((_, ch)) = self.chars.next() {
            if ch == '*'
                && let Some(&(offset, '/')) = self.chars.peek()
            {
                self.chars.next();
                return Lexeme::Comment {
                    start,
                    end: offset + 1,
                };
            }
        }

        Lexeme::Comment {
            start,
            end: self.sql.len(),
        }
    }

    /// `--` starts a comment only when followed by an ASCII space, a control
    /// character or end of input
    fn starts_dash_comment(&self, offset: usize) -> bool {
        let rest = &self.sql[offset..];
        rest.starts_with("--")
            && rest[2..]
                .chars()
                .next()
                .is_none_or(|ch| ch.is_ascii_whitespace() || ch.is_ascii_control())
    }

    fn starts_block_comment(&self, offset: usize) -> bool {
        let rest = &self.sql[offset..];
        rest.starts_with("/*") && !rest.starts_with("/*!") && !rest.starts_with("/*M!")
    }
}

impl Iterator for Lexer<'_> {
    type Item = Lexeme;

    fn next(&mut self) -> Option<Lexeme> {
        let (offset, ch) = self.chars.next()?;

        let lexeme = match ch {
            '\'' | '"' | '`' => self.quoted(offset, ch),
            '#' => self.line_comment(offset),
            '-' if self.starts_dash_comment(offset) => self.line_comment(offset),
            '/' if self.starts_block_comment(offset) => self.block_comment(offset),
            _ => Lexeme::Code { offset, ch },
        };

        Some(lexeme)
    }
}
