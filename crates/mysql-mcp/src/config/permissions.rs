//! Statement permission policy

use std::num::NonZeroU32;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A single permission flag of the policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Select,
    Insert,
    Update,
    Delete,
    Ddl,
}

impl Permission {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Ddl => "ddl",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Default maximum rows returned by SELECT-like statements (1000)
pub const DEFAULT_MAX_ROWS: u32 = 1000;

/// Permission policy applied to every statement.
///
/// Loaded once at startup and never mutated afterwards. `max_rows = 0` disables
/// row truncation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PermissionPolicy {
    /// Allow SELECT, SHOW, DESCRIBE and EXPLAIN. Default: true
    #[schemars(description = "SELECT, SHOW, DESCRIBE and EXPLAIN allowed")]
    pub select: bool,
    /// Allow INSERT and REPLACE. Default: false
    #[schemars(description = "INSERT and REPLACE allowed")]
    pub insert: bool,
    /// Allow UPDATE. Default: false
    #[schemars(description = "UPDATE allowed")]
    pub update: bool,
    /// Allow DELETE. Default: false
    #[schemars(description = "DELETE allowed")]
    pub delete: bool,
    /// Allow CREATE, ALTER, DROP and TRUNCATE. Default: false
    #[schemars(description = "CREATE, ALTER, DROP and TRUNCATE allowed")]
    pub ddl: bool,
    /// Maximum rows returned per query (0 = unlimited). Default: 1000
    #[schemars(description = "Maximum rows returned per query, 0 means unlimited")]
    pub max_rows: u32,
}

impl PermissionPolicy {
    /// Read-only policy with the default row limit
    #[must_use]
    pub const fn new() -> Self {
        Self {
            select: true,
            insert: false,
            update: false,
            delete: false,
            ddl: false,
            max_rows: DEFAULT_MAX_ROWS,
        }
    }

    /// Policy granting every permission, without a row limit
    #[must_use]
    pub const fn allow_all() -> Self {
        Self {
            select: true,
            insert: true,
            update: true,
            delete: true,
            ddl: true,
            max_rows: 0,
        }
    }

    /// Policy denying every permission
    #[must_use]
    pub const fn deny_all() -> Self {
        Self {
            select: false,
            insert: false,
            update: false,
            delete: false,
            ddl: false,
            max_rows: 0,
        }
    }

    #[must_use]
    pub const fn allows(&self, permission: Permission) -> bool {
        match permission {
            Permission::Select => self.select,
            Permission::Insert => self.insert,
            Permission::Update => self.update,
            Permission::Delete => self.delete,
            Permission::Ddl => self.ddl,
        }
    }

    /// Row limit, `None` when unlimited
    #[must_use]
    pub const fn row_limit(&self) -> Option<NonZeroU32> {
        NonZeroU32::new(self.max_rows)
    }
}

impl Default for PermissionPolicy {
    fn default() -> Self {
        Self::new()
    }
}
