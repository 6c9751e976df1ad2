//! Statement policy guard

use super::statement::{StatementCategory, check_single_statement, classify, leading_keyword};
use crate::Error;
use crate::config::{Permission, PermissionPolicy};
use crate::driver::{DriverOutcome, Row};

/// Why a statement was denied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// The policy does not grant the permission the category requires
    MissingPermission(Permission),
    /// The statement could not be classified
    UnknownStatement,
}

/// Outcome of a policy check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Check a statement category against the policy. Unknown statements are always denied.
#[must_use]
pub const fn authorize(category: StatementCategory, policy: &PermissionPolicy) -> Decision {
    match category.required_permission() {
        None => Decision::Deny(DenyReason::UnknownStatement),
        Some(permission) if policy.allows(permission) => Decision::Allow,
        Some(permission) => Decision::Deny(DenyReason::MissingPermission(permission)),
    }
}

/// A statement that passed every guard check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Statement<'a> {
    /// Statement text without its terminating `;`
    pub sql: &'a str,
    pub category: StatementCategory,
}

/// Shaped result of an executed statement
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    RowSet {
        rows: Vec<Row>,
        /// Rows were dropped to honour `max_rows`
        truncated: bool,
    },
    Mutation {
        affected_rows: u64,
        last_insert_id: Option<u64>,
    },
}

/// Stateless gate deciding whether a statement may reach the database.
///
/// Checks run in a fixed order: empty input, multiple statements,
/// classification, permission. None of them touch the database.
#[derive(Debug, Clone)]
pub struct StatementGuard {
    policy: PermissionPolicy,
}

impl StatementGuard {
    #[must_use]
    pub const fn new(policy: PermissionPolicy) -> Self {
        Self { policy }
    }

    #[must_use]
    pub const fn policy(&self) -> &PermissionPolicy {
        &self.policy
    }

    /// Validate, classify and authorize a raw statement
    pub fn inspect<'a>(&self, sql: &'a str) -> Result<Statement<'a>, Error> {
        if sql.trim().is_empty() {
            return Err(Error::EmptyStatement);
        }

        let sql = check_single_statement(sql)?;
        let category = classify(sql);

        match authorize(category, &self.policy) {
            Decision::Allow => Ok(Statement { sql, category }),
            Decision::Deny(DenyReason::MissingPermission(permission)) => {
                Err(Error::PermissionDenied {
                    category,
                    permission,
                })
            }
            Decision::Deny(DenyReason::UnknownStatement) => Err(Error::UnknownStatement {
                keyword: leading_keyword(sql).map(str::to_ascii_uppercase),
            }),
        }
    }

    /// Shape a driver outcome, truncating row-sets to `max_rows`
    #[must_use]
    pub fn shape(&self, outcome: DriverOutcome) -> ExecutionResult {
        match outcome {
            DriverOutcome::Rows(mut rows) => {
                let truncated = match self.policy.row_limit() {
                    Some(limit) if rows.len() > limit.get() as usize => {
                        rows.truncate(limit.get() as usize);
                        true
                    }
                    _ => false,
                };
                ExecutionResult::RowSet { rows, truncated }
            }
            DriverOutcome::Mutation {
                affected_rows,
                last_insert_id,
            } => ExecutionResult::Mutation {
                affected_rows,
                last_insert_id: last_insert_id.filter(|id| *id != 0),
            },
        }
    }
}
