//! # safe-migrate
//!
//! > **Run it twice. Nothing breaks.**
//!
//! Rewrites a PostgreSQL migration script so that re-running it is a no-op
//! for objects that already exist.
//!
//! ## Quick Example
//!
//! ```
//! let sql = safe_migrate::make_safe(r#"CREATE TABLE "users" (id INT);"#);
//! assert_eq!(sql, r#"CREATE TABLE IF NOT EXISTS "users" (id INT);"#);
//! ```
//!
//! ## Rewrites
//!
//! | Statement                          | Becomes                                         |
//! |------------------------------------|-------------------------------------------------|
//! | `CREATE TYPE "t" AS ENUM (...)`    | `DO` block catching `duplicate_object`          |
//! | `CREATE TABLE`                     | `CREATE TABLE IF NOT EXISTS`                    |
//! | `CREATE [UNIQUE] INDEX name`       | `CREATE [UNIQUE] INDEX IF NOT EXISTS name`      |
//! | `ALTER TABLE ... ADD CONSTRAINT`   | `DO` block checking `pg_constraint` first       |
//!
//! Everything else passes through unchanged.

use std::path::Path;

pub mod config;
pub mod error;
pub mod parser;
pub mod rewriter;
pub mod scanner;
pub mod statement;

pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::*;
    pub use crate::rewriter::{Rewritten, make_safe, rewrite};
    pub use crate::statement::{Outcome, Report, Rewrite, StatementKind};
    pub use crate::convert_file;
}

pub use rewriter::{make_safe, rewrite};

use error::{SafeMigrateError, SafeMigrateResult};
use statement::Report;

/// Read `input`, rewrite it, and overwrite `output` with the result.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
///
/// let report = safe_migrate::convert_file(
///     Path::new("manual_migration.sql"),
///     Path::new("safe_migration.sql"),
/// )?;
/// println!("{} statement(s) guarded", report.rewritten());
/// # Ok::<(), safe_migrate::error::SafeMigrateError>(())
/// ```
pub fn convert_file(input: &Path, output: &Path) -> SafeMigrateResult<Report> {
    let script =
        std::fs::read_to_string(input).map_err(|e| SafeMigrateError::read(input, e))?;
    let rewritten = rewrite(&script);
    std::fs::write(output, &rewritten.sql).map_err(|e| SafeMigrateError::write(output, e))?;
    Ok(rewritten.report)
}
