use std::time::Duration;

use rmcp::ErrorData;
use serde_json::json;
use thiserror::Error;

use crate::config::Permission;
use crate::security::StatementCategory;

#[derive(Error, Debug)]
pub enum Error {
    #[error("'sql' must be a non-empty string")]
    EmptyStatement,

    #[error("Multiple statements per call are not allowed")]
    MultiStatement,

    #[error("{} permission denied for {category} statement", .permission.as_str().to_uppercase())]
    PermissionDenied {
        category: StatementCategory,
        permission: Permission,
    },

    #[error("Unrecognized statement{}: only SELECT, SHOW, DESCRIBE, EXPLAIN, INSERT, REPLACE, UPDATE, DELETE, CREATE, ALTER, DROP and TRUNCATE are accepted", .keyword.as_ref().map(|k| format!(" '{k}'")).unwrap_or_default())]
    UnknownStatement { keyword: Option<String> },

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Database error ({context}): {source}")]
    Driver {
        context: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("Query timeout after {0:?}")]
    QueryTimeout(Duration),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl Error {
    /// Wrap a driver failure with the statement category or operation it happened in
    pub const fn driver(context: &'static str, source: sqlx::Error) -> Self {
        Self::Driver { context, source }
    }

    /// Stable machine-readable error kind
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::EmptyStatement => "empty_statement",
            Self::MultiStatement => "multi_statement",
            Self::PermissionDenied { .. } => "permission_denied",
            Self::UnknownStatement { .. } => "unknown_statement",
            Self::InvalidParams(_) => "invalid_params",
            Self::Driver { .. } => "driver",
            Self::QueryTimeout(_) => "timeout",
            Self::Config(_) => "config",
            Self::Transport(_) => "transport",
        }
    }

    /// Rejected by the guard without contacting the database
    #[must_use]
    pub const fn is_policy_rejection(&self) -> bool {
        matches!(
            self,
            Self::EmptyStatement
                | Self::MultiStatement
                | Self::PermissionDenied { .. }
                | Self::UnknownStatement { .. }
        )
    }

    #[must_use]
    pub const fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }

    #[must_use]
    pub const fn is_driver(&self) -> bool {
        matches!(self, Self::Driver { .. })
    }

    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::QueryTimeout(_))
    }

    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Convert our Error type to rmcp `ErrorData`
impl From<Error> for ErrorData {
    fn from(err: Error) -> Self {
        let message = err.to_string();
        let mut data = json!({ "kind": err.kind() });

        match &err {
            Error::PermissionDenied {
                category,
                permission,
            } => {
                data["category"] = json!(category);
                data["missing_permission"] = json!(permission);
            }
            Error::UnknownStatement {
                keyword: Some(keyword),
            } => {
                data["keyword"] = json!(keyword);
            }
            Error::Driver { context, .. } => {
                data["context"] = json!(context);
            }
            _ => {}
        }

        if err.is_policy_rejection() || matches!(err, Error::InvalidParams(_) | Error::Config(_)) {
            Self::invalid_params(message, Some(data))
        } else {
            Self::internal_error(message, Some(data))
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
