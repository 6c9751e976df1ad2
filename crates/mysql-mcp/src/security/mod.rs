//! Statement policy enforcement

mod guard;
mod lexer;
mod statement;

pub use guard::{
    Decision, DenyReason, ExecutionResult, Statement, StatementGuard, authorize,
};
pub use lexer::{EscapeMode, Lexeme, Lexer};
pub use statement::{StatementCategory, check_single_statement, classify, leading_keyword};
