//! Statement classification and single-statement enforcement

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::lexer::{EscapeMode, Lexeme, Lexer};
use crate::Error;
use crate::config::Permission;

/// Category of a SQL statement, derived from its leading keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum StatementCategory {
    /// SELECT, SHOW, DESCRIBE, DESC, EXPLAIN
    #[serde(rename = "select")]
    SelectLike,
    /// INSERT, REPLACE
    #[serde(rename = "insert")]
    InsertLike,
    Update,
    Delete,
    /// CREATE, ALTER, DROP, TRUNCATE
    Ddl,
    Unknown,
}

impl StatementCategory {
    /// Map a leading keyword to its category
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword.to_ascii_uppercase().as_str() {
            "SELECT" | "SHOW" | "DESCRIBE" | "DESC" | "EXPLAIN" => Self::SelectLike,
            "INSERT" | "REPLACE" => Self::InsertLike,
            "UPDATE" => Self::Update,
            "DELETE" => Self::Delete,
            "CREATE" | "ALTER" | "DROP" | "TRUNCATE" => Self::Ddl,
            _ => Self::Unknown,
        }
    }

    /// Permission the policy must grant, `None` for unknown statements
    #[must_use]
    pub const fn required_permission(&self) -> Option<Permission> {
        match self {
            Self::SelectLike => Some(Permission::Select),
            Self::InsertLike => Some(Permission::Insert),
            Self::Update => Some(Permission::Update),
            Self::Delete => Some(Permission::Delete),
            Self::Ddl => Some(Permission::Ddl),
            Self::Unknown => None,
        }
    }

    /// Whether the statement produces a row-set
    #[must_use]
    pub const fn returns_rows(&self) -> bool {
        matches!(self, Self::SelectLike)
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SelectLike => "select",
            Self::InsertLike => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Ddl => "ddl",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for StatementCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Leading keyword of a statement, skipping whitespace, comments and opening parentheses.
///
/// Returns `None` when the statement starts with anything other than a word
/// (a literal, an executable comment, punctuation).
#[must_use]
pub fn leading_keyword(sql: &str) -> Option<&str> {
    let mut start = None;
    let mut end = sql.len();

    for lexeme in Lexer::new(sql) {
        match (lexeme, start) {
            (Lexeme::Comment { .. }, None) => {}
            (Lexeme::Code { ch, .. }, None) if ch.is_whitespace() || ch == '(' => {}
            (Lexeme::Code { offset, ch }, None) if ch.is_ascii_alphabetic() => {
                start = Some(offset);
            }
            (_, None) => return None,
            (Lexeme::Code { ch, .. }, Some(_)) if ch.is_ascii_alphanumeric() || ch == '_' => {}
            (Lexeme::Code { offset, .. }, Some(_))
            | (Lexeme::Quoted { start: offset, .. }, Some(_))
            | (Lexeme::Comment { start: offset, .. }, Some(_)) => {
                end = offset;
                break;
            }
        }
    }

    start.map(|start| &sql[start..end])
}

/// Classify a single SQL statement by its leading keyword
#[must_use]
pub fn classify(sql: &str) -> StatementCategory {
    leading_keyword(sql).map_or(StatementCategory::Unknown, StatementCategory::from_keyword)
}

/// Reject input holding more than one statement.
///
/// A `;` outside literals and comments is accepted only when nothing but
/// whitespace follows it. The input is lexed under every [`EscapeMode`], so a
/// separator visible under any `sql_mode` rejects the input.
/// On success returns the statement with its terminating `;` and surrounding
/// whitespace removed.
pub fn check_single_statement(sql: &str) -> Result<&str, Error> {
    let trimmed = sql.trim();

    for mode in EscapeMode::ALL {
        let has_separator = Lexer::with_escape_mode(trimmed, mode).any(
            |lexeme| matches!(lexeme, Lexeme::Code { offset, ch: ';' } if offset + 1 < trimmed.len()),
        );

        if has_separator {
            return Err(Error::MultiStatement);
        }
    }

    let terminated = matches!(
        Lexer::new(trimmed).last(),
        Some(Lexeme::Code { ch: ';', .. })
    );

    if terminated {
        Ok(trimmed[..trimmed.len() - 1].trim_end())
    } else {
        Ok(trimmed)
    }
}
