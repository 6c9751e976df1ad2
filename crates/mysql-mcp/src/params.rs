//! Bind parameters and placeholder translation

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::security::{Lexeme, Lexer};
use crate::{Error, Result};

/// Bind parameters for a statement.
///
/// A JSON array binds to `?` or `%s` placeholders in order; a JSON object binds
/// to `%(name)s` placeholders by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum QueryParams {
    Positional(Vec<Value>),
    Named(Map<String, Value>),
}

enum Placeholder<'a> {
    Positional,
    Named(&'a str),
    /// `%%`, a literal percent sign
    Percent,
}

/// Recognise a placeholder starting at `offset`, returning it and its byte length
fn placeholder_at(sql: &str, offset: usize) -> Option<(Placeholder<'_>, usize)> {
    let rest = &sql[offset..];

    if rest.starts_with('?') {
        return Some((Placeholder::Positional, 1));
    }
    if rest.starts_with("%s") {
        return Some((Placeholder::Positional, 2));
    }
    if rest.starts_with("%%") {
        return Some((Placeholder::Percent, 2));
    }

    let name_and_tail = rest.strip_prefix("%(")?;
    let close = name_and_tail.find(')')?;
    let name = &name_and_tail[..close];
    let valid_name =
        !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid_name && name_and_tail[close + 1..].starts_with('s') {
        // "%(" + name + ")s"
        Some((Placeholder::Named(name), name.len() + 4))
    } else {
        None
    }
}

impl QueryParams {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Positional(values) => values.len(),
            Self::Named(values) => values.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rewrite every placeholder in code regions to `?` and collect the values
    /// in placeholder order.
    ///
    /// Literals and comments are copied untouched.
    pub fn bind(&self, sql: &str) -> Result<(String, Vec<Value>)> {
        let mut rewritten = String::with_capacity(sql.len());
        let mut values = Vec::with_capacity(self.len());
        let mut positional_seen = 0usize;
        let mut skip_until = 0usize;

        for lexeme in Lexer::new(sql) {
            let (offset, ch) = match lexeme {
                Lexeme::Quoted { start, end } | Lexeme::Comment { start, end } => {
                    rewritten.push_str(&sql[start..end]);
                    continue;
                }
                Lexeme::Code { offset, ch } => (offset, ch),
            };

            if offset < skip_until {
                continue;
            }

            let Some((placeholder, len)) = placeholder_at(sql, offset) else {
                rewritten.push(ch);
                continue;
            };
            skip_until = offset + len;

            match (placeholder, self) {
                (Placeholder::Percent, _) => rewritten.push('%'),
                (Placeholder::Positional, Self::Positional(params)) => {
                    if let Some(value) = params.get(positional_seen) {
                        values.push(value.clone());
                    }
                    positional_seen += 1;
                    rewritten.push('?');
                }
                (Placeholder::Named(name), Self::Named(params)) => {
                    let value = params.get(name).ok_or_else(|| {
                        Error::InvalidParams(format!("missing value for named parameter '{name}'"))
                    })?;
                    values.push(value.clone());
                    rewritten.push('?');
                }
                (Placeholder::Positional, Self::Named(_)) => {
                    return Err(Error::InvalidParams(
                        "positional placeholder used with named parameters".to_string(),
                    ));
                }
                (Placeholder::Named(name), Self::Positional(_)) => {
                    return Err(Error::InvalidParams(format!(
                        "named placeholder '{name}' used with positional parameters"
                    )));
                }
            }
        }

        if let Self::Positional(params) = self
            && positional_seen != params.len()
        {
            return Err(Error::InvalidParams(format!(
                "statement has {positional_seen} placeholders but {} parameters were given",
                params.len()
            )));
        }

        Ok((rewritten, values))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn positional(values: Value) -> QueryParams {
        serde_json::from_value(values).unwrap()
    }

    #[test]
    fn test_deserialize_untagged() {
        assert!(matches!(positional(json!([1, "a"])), QueryParams::Positional(v) if v.len() == 2));
        assert!(matches!(
            serde_json::from_value::<QueryParams>(json!({"id": 1})).unwrap(),
            QueryParams::Named(m) if m.contains_key("id")
        ));
        assert!(serde_json::from_value::<QueryParams>(json!("nope")).is_err());
    }

    #[test]
    fn test_bind_question_marks() {
        let params = positional(json!([1, "bob"]));
        let (sql, values) = params
            .bind("SELECT * FROM users WHERE id = ? AND name = ?")
            .unwrap();
        assert_eq!(sql, "SELECT * FROM users WHERE id = ? AND name = ?");
        assert_eq!(values, vec![json!(1), json!("bob")]);
    }

    #[test]
    fn test_bind_pyformat_positional() {
        let params = positional(json!([42]));
        let (sql, values) = params.bind("DELETE FROM t WHERE id = %s").unwrap();
        assert_eq!(sql, "DELETE FROM t WHERE id = ?");
        assert_eq!(values, vec![json!(42)]);
    }

    #[test]
    fn test_bind_named() {
        let params: QueryParams =
            serde_json::from_value(json!({"name": "x", "id": 7, "unused": true})).unwrap();
        let (sql, values) = params
            .bind("UPDATE t SET name = %(name)s WHERE id = %(id)s OR parent = %(id)s")
            .unwrap();
        assert_eq!(sql, "UPDATE t SET name = ? WHERE id = ? OR parent = ?");
        assert_eq!(values, vec![json!("x"), json!(7), json!(7)]);
    }

    #[test]
    fn test_placeholders_in_literals_and_comments_untouched() {
        let params = positional(json!([1]));
        let (sql, values) = params
            .bind("SELECT '?', \"%s\" /* ? */ FROM t WHERE id = ? -- %s\n")
            .unwrap();
        assert_eq!(sql, "SELECT '?', \"%s\" /* ? */ FROM t WHERE id = ? -- %s\n");
        assert_eq!(values, vec![json!(1)]);
    }

    #[test]
    fn test_percent_escape() {
        let params = positional(json!(["a"]));
        let (sql, _) = params
            .bind("SELECT 10 %% 3, name FROM t WHERE name = %s")
            .unwrap();
        assert_eq!(sql, "SELECT 10 % 3, name FROM t WHERE name = ?");

        // Inside a literal `%%` stays as written
        let (sql, _) = params.bind("SELECT '%%' WHERE a = %s").unwrap();
        assert_eq!(sql, "SELECT '%%' WHERE a = ?");
    }

    #[test]
    fn test_count_mismatch() {
        let err = positional(json!([1])).bind("SELECT ?, ?").unwrap_err();
        assert!(matches!(err, Error::InvalidParams(_)));

        let err = positional(json!([1, 2])).bind("SELECT ?").unwrap_err();
        assert!(err.to_string().contains("1 placeholders but 2 parameters"));

        let err = positional(json!([])).bind("SELECT ?").unwrap_err();
        assert!(matches!(err, Error::InvalidParams(_)));
    }

    #[test]
    fn test_missing_named_value() {
        let params: QueryParams = serde_json::from_value(json!({"a": 1})).unwrap();
        let err = params.bind("SELECT %(b)s").unwrap_err();
        assert!(err.to_string().contains("'b'"));
    }

    #[test]
    fn test_mixed_styles_rejected() {
        let named: QueryParams = serde_json::from_value(json!({"a": 1})).unwrap();
        assert!(matches!(
            named.bind("SELECT %(a)s, ?"),
            Err(Error::InvalidParams(_))
        ));
        assert!(matches!(
            positional(json!([1])).bind("SELECT %(a)s"),
            Err(Error::InvalidParams(_))
        ));
    }

    #[test]
    fn test_malformed_named_placeholder_is_plain_text() {
        let params = positional(json!([]));
        let (sql, values) = params.bind("SELECT 5 %(x y)s").unwrap();
        assert_eq!(sql, "SELECT 5 %(x y)s");
        assert!(values.is_empty());
    }

    #[test]
    fn test_multibyte_text_preserved() {
        let params = positional(json!(["ü"]));
        let (sql, _) = params.bind("SELECT 'héllo', ? AS naïve").unwrap();
        assert_eq!(sql, "SELECT 'héllo', ? AS naïve");
    }
}
