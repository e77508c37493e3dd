//! Statement kinds and the per-run rewrite report.

use serde::Serialize;

/// The DDL statement shapes the rewriter knows how to guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    /// CREATE TYPE "name" AS ENUM (...)
    CreateEnum,
    /// CREATE TABLE
    CreateTable,
    /// CREATE [UNIQUE] INDEX
    CreateIndex,
    /// ALTER TABLE "table" ADD CONSTRAINT "name"
    AddConstraint,
}

impl std::fmt::Display for StatementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatementKind::CreateEnum => write!(f, "CREATE TYPE"),
            StatementKind::CreateTable => write!(f, "CREATE TABLE"),
            StatementKind::CreateIndex => write!(f, "CREATE INDEX"),
            StatementKind::AddConstraint => write!(f, "ADD CONSTRAINT"),
        }
    }
}

/// What happened to a recognized statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Emitted in its guarded form.
    Rewritten,
    /// Already carried an existence guard; emitted unchanged.
    AlreadyGuarded,
    /// Identifiers could not be extracted; emitted unchanged.
    Skipped,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Rewritten => write!(f, "rewritten"),
            Outcome::AlreadyGuarded => write!(f, "already guarded"),
            Outcome::Skipped => write!(f, "skipped"),
        }
    }
}

/// One recognized statement and its fate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rewrite {
    /// 1-based line number where the statement starts.
    pub line: usize,
    pub kind: StatementKind,
    /// Type, table, index or constraint name, when one was extracted.
    pub object: Option<String>,
    pub outcome: Outcome,
}

/// Everything the rewriter recognized during one run, in script order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub rewrites: Vec<Rewrite>,
}

impl Report {
    pub(crate) fn record(
        &mut self,
        line: usize,
        kind: StatementKind,
        object: Option<&str>,
        outcome: Outcome,
    ) {
        self.rewrites.push(Rewrite {
            line,
            kind,
            object: object.map(str::to_string),
            outcome,
        });
    }

    /// Number of statements emitted in guarded form.
    pub fn rewritten(&self) -> usize {
        self.count(Outcome::Rewritten)
    }

    /// Number of recognized statements left untouched.
    pub fn unchanged(&self) -> usize {
        self.rewrites.len() - self.rewritten()
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.rewrites.iter().filter(|r| r.outcome == outcome).count()
    }

    pub fn is_empty(&self) -> bool {
        self.rewrites.is_empty()
    }
}
