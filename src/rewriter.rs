//! Idempotent rewrites for PostgreSQL DDL.
//!
//! Each rule is a pure function from statement text to guarded text;
//! [`rewrite`] drives them over a whole script.
//!
//! Lines are classified one by one with no memory of enclosing blocks, so the
//! statements inside a `DO $$` block produced by an earlier run get wrapped
//! again. Feed it hand-written scripts, not its own output.

use std::borrow::Cow;

use crate::parser::{self, Leading};
use crate::scanner::{Scanner, TERMINATOR};
use crate::statement::{Outcome, Report, StatementKind};

/// The output of one run over a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
    pub sql: String,
    pub report: Report,
}

/// Rewrite a whole migration script into its idempotent form.
///
/// Lines that don't open a recognized statement are copied through as-is, so
/// a script without any CREATE TYPE / TABLE / INDEX or ADD CONSTRAINT comes
/// back byte-for-byte.
pub fn rewrite(script: &str) -> Rewritten {
    let mut scanner = Scanner::new(script);
    let mut out: Vec<Cow<'_, str>> = Vec::with_capacity(scanner.len());
    let mut report = Report::default();

    while let Some((number, line)) = scanner.next_line() {
        match parser::classify(line) {
            Leading::CreateEnum { name } => {
                let statement = scanner.collect_statement(line);
                match guard_enum(name, &statement) {
                    Some(block) => {
                        report.record(number, StatementKind::CreateEnum, Some(name), Outcome::Rewritten);
                        out.push(block.into());
                    }
                    None => {
                        // Composite or range type: nothing to split, emit as collected.
                        report.record(number, StatementKind::CreateEnum, Some(name), Outcome::Skipped);
                        out.push(statement.into());
                    }
                }
            }
            Leading::CreateTable { guarded, name } => {
                if guarded {
                    report.record(number, StatementKind::CreateTable, name, Outcome::AlreadyGuarded);
                    out.push(line.into());
                } else {
                    report.record(number, StatementKind::CreateTable, name, Outcome::Rewritten);
                    out.push(guard_table(line).into());
                }
            }
            Leading::CreateIndex { at, guarded, name } => {
                if guarded {
                    report.record(number, StatementKind::CreateIndex, name, Outcome::AlreadyGuarded);
                    out.push(line.into());
                } else {
                    report.record(number, StatementKind::CreateIndex, name, Outcome::Rewritten);
                    out.push(guard_index(line, at).into());
                }
            }
            Leading::AddConstraint { constraint, .. } => {
                let statement = scanner.collect_statement(line);
                report.record(
                    number,
                    StatementKind::AddConstraint,
                    Some(constraint),
                    Outcome::Rewritten,
                );
                out.push(guard_constraint(constraint, &statement).into());
            }
            Leading::Incomplete(kind) => {
                report.record(number, kind, None, Outcome::Skipped);
                out.push(line.into());
            }
            Leading::Other => out.push(line.into()),
        }
    }

    Rewritten {
        sql: out.join("\n"),
        report,
    }
}

/// Rewrite a script and return only the SQL.
pub fn make_safe(script: &str) -> String {
    rewrite(script).sql
}

/// Wrap a CREATE TYPE ... AS ENUM statement in a block that swallows
/// `duplicate_object`.
///
/// `name` is the type name as written, quotes included. Returns `None` when
/// the statement has no `AS ENUM`.
pub fn guard_enum(name: &str, statement: &str) -> Option<String> {
    let values = parser::enum_values(statement)?
        .trim()
        .trim_end_matches(TERMINATOR);
    Some(format!(
        "DO $$ BEGIN
    CREATE TYPE {name} AS ENUM {values};
EXCEPTION
    WHEN duplicate_object THEN null;
END $$;"
    ))
}

/// Insert ` IF NOT EXISTS` after every unguarded `CREATE TABLE` on the line.
pub fn guard_table(line: &str) -> String {
    let mut out = String::with_capacity(line.len() + 14);
    let mut copied = 0;
    for at in parser::unguarded_tables(line) {
        out.push_str(&line[copied..at]);
        out.push_str(" IF NOT EXISTS");
        copied = at;
    }
    out.push_str(&line[copied..]);
    out
}

/// Insert `IF NOT EXISTS ` at `at`, the start of the index name.
pub fn guard_index(line: &str, at: usize) -> String {
    insert_at(line, at, "IF NOT EXISTS ")
}

/// Run `statement` only when `pg_constraint` has no constraint named
/// `constraint`.
///
/// The statement is substituted verbatim; continuation lines keep their own
/// indentation.
pub fn guard_constraint(constraint: &str, statement: &str) -> String {
    let conname = constraint.replace('\'', "''");
    format!(
        "DO $$
BEGIN
    IF NOT EXISTS (SELECT 1 FROM pg_constraint WHERE conname = '{conname}') THEN
        {statement}
    END IF;
END
$$;"
    )
}

fn insert_at(line: &str, at: usize, text: &str) -> String {
    let mut out = String::with_capacity(line.len() + text.len());
    out.push_str(&line[..at]);
    out.push_str(text);
    out.push_str(&line[at..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_enum_rewrite() {
        let sql = make_safe(r#"CREATE TYPE "Color" AS ENUM ('RED', 'BLUE');"#);
        assert_eq!(
            sql,
            r#"DO $$ BEGIN
    CREATE TYPE "Color" AS ENUM ('RED', 'BLUE');
EXCEPTION
    WHEN duplicate_object THEN null;
END $$;"#
        );
    }

    #[test]
    fn test_enum_rewrite_multi_line() {
        let input = "CREATE TYPE \"Status\" AS ENUM (\n    'ACTIVE',\n    'INACTIVE'\n);\nSELECT 1;";
        assert_eq!(
            make_safe(input),
            "DO $$ BEGIN\n    CREATE TYPE \"Status\" AS ENUM (\n    'ACTIVE',\n    'INACTIVE'\n);\nEXCEPTION\n    WHEN duplicate_object THEN null;\nEND $$;\nSELECT 1;"
        );
    }

    #[test]
    fn test_table_rewrite() {
        assert_eq!(
            make_safe(r#"CREATE TABLE "users" (id INT);"#),
            r#"CREATE TABLE IF NOT EXISTS "users" (id INT);"#
        );
    }

    #[test]
    fn test_table_rewrite_only_first_line() {
        let input = "CREATE TABLE \"users\" (\n    \"id\" SERIAL NOT NULL,\n    CONSTRAINT \"users_pkey\" PRIMARY KEY (\"id\")\n);";
        assert_eq!(
            make_safe(input),
            "CREATE TABLE IF NOT EXISTS \"users\" (\n    \"id\" SERIAL NOT NULL,\n    CONSTRAINT \"users_pkey\" PRIMARY KEY (\"id\")\n);"
        );
    }

    #[test]
    fn test_table_already_guarded_untouched() {
        let input = r#"CREATE TABLE IF NOT EXISTS "users" (id INT);"#;
        let out = rewrite(input);
        assert_eq!(out.sql, input);
        assert_eq!(out.report.count(Outcome::AlreadyGuarded), 1);
    }

    #[test]
    fn test_table_rewrite_every_statement_on_line() {
        assert_eq!(
            make_safe(r#"CREATE TABLE "a" (id INT); CREATE TABLE "b" (id INT);"#),
            r#"CREATE TABLE IF NOT EXISTS "a" (id INT); CREATE TABLE IF NOT EXISTS "b" (id INT);"#
        );
    }

    #[test]
    fn test_table_rewrite_skips_guarded_occurrence() {
        let out = rewrite(r#"CREATE TABLE IF NOT EXISTS "a" (id INT); CREATE TABLE "b" (id INT);"#);
        assert_eq!(
            out.sql,
            r#"CREATE TABLE IF NOT EXISTS "a" (id INT); CREATE TABLE IF NOT EXISTS "b" (id INT);"#
        );
        assert_eq!(out.report.rewritten(), 1);
    }

    #[test]
    fn test_index_rewrite() {
        assert_eq!(
            make_safe(r#"CREATE UNIQUE INDEX "idx_email" ON "users" ("email");"#),
            r#"CREATE UNIQUE INDEX IF NOT EXISTS "idx_email" ON "users" ("email");"#
        );
        assert_eq!(
            make_safe(r#"CREATE INDEX "orders_user_id_idx" ON "orders"("user_id");"#),
            r#"CREATE INDEX IF NOT EXISTS "orders_user_id_idx" ON "orders"("user_id");"#
        );
    }

    #[test]
    fn test_index_concurrently() {
        assert_eq!(
            make_safe(r#"CREATE INDEX CONCURRENTLY "idx" ON "t" ("c");"#),
            r#"CREATE INDEX CONCURRENTLY IF NOT EXISTS "idx" ON "t" ("c");"#
        );
    }

    #[test]
    fn test_index_already_guarded() {
        let input = r#"CREATE INDEX IF NOT EXISTS "idx" ON "t" ("c");"#;
        assert_eq!(make_safe(input), input);
    }

    #[test]
    fn test_constraint_rewrite() {
        let input = r#"ALTER TABLE "orders" ADD CONSTRAINT "fk_user" FOREIGN KEY ("user_id") REFERENCES "users"("id");"#;
        assert_eq!(
            make_safe(input),
            r#"DO $$
BEGIN
    IF NOT EXISTS (SELECT 1 FROM pg_constraint WHERE conname = 'fk_user') THEN
        ALTER TABLE "orders" ADD CONSTRAINT "fk_user" FOREIGN KEY ("user_id") REFERENCES "users"("id");
    END IF;
END
$$;"#
        );
    }

    #[test]
    fn test_constraint_multi_line_kept_verbatim() {
        let input = "ALTER TABLE \"orders\" ADD CONSTRAINT \"fk_user\" FOREIGN KEY (\"user_id\")\nREFERENCES \"users\"(\"id\") ON DELETE CASCADE;\n-- done";
        assert_eq!(
            make_safe(input),
            "DO $$\nBEGIN\n    IF NOT EXISTS (SELECT 1 FROM pg_constraint WHERE conname = 'fk_user') THEN\n        ALTER TABLE \"orders\" ADD CONSTRAINT \"fk_user\" FOREIGN KEY (\"user_id\")\nREFERENCES \"users\"(\"id\") ON DELETE CASCADE;\n    END IF;\nEND\n$$;\n-- done"
        );
    }

    #[test]
    fn test_constraint_name_quote_escaped() {
        let block = guard_constraint("it's", "ALTER TABLE \"t\" ADD CONSTRAINT \"it's\" CHECK (x > 0);");
        assert!(block.contains("conname = 'it''s'"));
    }

    #[test]
    fn test_malformed_enum_passes_through() {
        let input = "CREATE TYPE WeirdLine AS ENUM (...)\nCREATE TABLE \"t\" (id INT);";
        let out = rewrite(input);
        assert_eq!(
            out.sql,
            "CREATE TYPE WeirdLine AS ENUM (...)\nCREATE TABLE IF NOT EXISTS \"t\" (id INT);"
        );
        assert_eq!(out.report.rewrites.len(), 2);
        assert_eq!(out.report.rewrites[0].outcome, Outcome::Skipped);
        assert_eq!(out.report.rewrites[1].line, 2);
    }

    #[test]
    fn test_constraint_without_quoted_names_does_not_consume() {
        let input = "ALTER TABLE orders ADD CONSTRAINT fk_user\nCREATE INDEX \"i\" ON \"t\" (c);";
        assert_eq!(
            make_safe(input),
            "ALTER TABLE orders ADD CONSTRAINT fk_user\nCREATE INDEX IF NOT EXISTS \"i\" ON \"t\" (c);"
        );
    }

    #[test]
    fn test_composite_type_emitted_as_collected() {
        let input = "CREATE TYPE \"pair\" AS (\n  a int,\n  b int\n);";
        let out = rewrite(input);
        assert_eq!(out.sql, input);
        assert_eq!(out.report.rewrites[0].outcome, Outcome::Skipped);
    }

    #[test]
    fn test_pass_through_round_trip() {
        let input = "-- comment\r\nINSERT INTO \"t\" VALUES (1);\n\nDROP TABLE \"old\";\n";
        let out = rewrite(input);
        assert_eq!(out.sql, input);
        assert!(out.report.is_empty());
    }

    #[test]
    fn test_report_line_numbers() {
        let input = "CREATE TYPE \"a\" AS ENUM (\n'x'\n);\nCREATE TABLE \"t\" (id INT);";
        let out = rewrite(input);
        let lines: Vec<usize> = out.report.rewrites.iter().map(|r| r.line).collect();
        assert_eq!(lines, vec![1, 4]);
        assert_eq!(out.report.rewritten(), 2);
    }
}
