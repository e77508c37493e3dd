//! Leading-keyword classification using nom.
//!
//! Only the start of a line decides what kind of statement it opens:
//!
//! ```text
//! CREATE TYPE "mood" AS ENUM ('sad', 'ok');
//! ───┬─────── ───┬──
//!    │           └── quoted (optionally schema-qualified) type name
//!    └── leading keywords, case-insensitive, any run of blanks between them
//! ```
//!
//! Keywords must end on a word boundary, so `CREATE TABLESPACE` is not a
//! `CREATE TABLE`.

use nom::{
    branch::alt,
    bytes::complete::{is_not, tag_no_case, take_while1},
    character::complete::{char, satisfy, space1},
    combinator::{not, opt, recognize},
    multi::many0,
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

use crate::statement::StatementKind;

/// How a single line opens, as far as the rewriter cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leading<'a> {
    /// `CREATE TYPE "name"`; `name` keeps its quotes.
    CreateEnum { name: &'a str },
    /// `CREATE TABLE`; `guarded` when no `CREATE TABLE` on the line is
    /// missing its `IF NOT EXISTS`.
    CreateTable { guarded: bool, name: Option<&'a str> },
    /// `CREATE [UNIQUE] INDEX [CONCURRENTLY]`; `at` is the byte offset where
    /// the index name starts.
    CreateIndex {
        at: usize,
        guarded: bool,
        name: Option<&'a str>,
    },
    /// `ALTER TABLE "table" ... ADD CONSTRAINT "constraint"`; `constraint`
    /// is unquoted.
    AddConstraint {
        table: &'a str,
        constraint: &'a str,
    },
    /// Leading keywords matched but the identifiers the rewrite needs did not.
    Incomplete(StatementKind),
    /// Anything else.
    Other,
}

/// Classify a line by its leading keywords.
pub fn classify(line: &str) -> Leading<'_> {
    let head = line.trim_start();

    if let Ok((rest, _)) = create_type(head) {
        return match preceded(space1, quoted_name)(rest) {
            Ok((_, name)) => Leading::CreateEnum { name },
            Err(_) => Leading::Incomplete(StatementKind::CreateEnum),
        };
    }

    if let Ok((rest, _)) = create_table(head) {
        let after = rest.trim_start();
        let name = match if_not_exists(after) {
            Ok((tail, _)) => object_name(tail.trim_start()),
            Err(_) => object_name(after),
        };
        return Leading::CreateTable {
            guarded: unguarded_tables(line).is_empty(),
            name,
        };
    }

    if let Ok((rest, _)) = create_index(head) {
        return classify_index(line, rest);
    }

    if let Ok((rest, _)) = alter_table(head) {
        if first_match(rest, add_constraint).is_none() {
            return Leading::Other;
        }
        let table = preceded(
            pair(opt(preceded(space1, keyword("ONLY"))), space1),
            quoted_name,
        )(rest);
        let constraint = first_match(rest, preceded(pair(add_constraint, space1), quoted))
            .map(|(_, _, name)| name);
        return match (table, constraint) {
            (Ok((_, table)), Some(constraint)) => Leading::AddConstraint { table, constraint },
            _ => Leading::Incomplete(StatementKind::AddConstraint),
        };
    }

    Leading::Other
}

fn classify_index<'a>(line: &'a str, rest: &'a str) -> Leading<'a> {
    let rest = match preceded(space1, keyword("CONCURRENTLY"))(rest) {
        Ok((after, _)) => after,
        Err(_) => rest,
    };

    // The guard goes after exactly one blank, the way it is written by hand.
    let Some(blank) = rest.chars().next().filter(|c| *c == ' ' || *c == '\t') else {
        return Leading::Incomplete(StatementKind::CreateIndex);
    };
    let at = offset(line, rest) + blank.len_utf8();
    let after = rest.trim_start();

    if let Ok((tail, _)) = if_not_exists(after) {
        return Leading::CreateIndex {
            at,
            guarded: true,
            name: object_name(tail.trim_start()),
        };
    }

    // PostgreSQL needs a name for IF NOT EXISTS; `CREATE INDEX ON ...` can't be guarded.
    if after.is_empty() || keyword("ON")(after).is_ok() {
        return Leading::Incomplete(StatementKind::CreateIndex);
    }

    Leading::CreateIndex {
        at,
        guarded: false,
        name: object_name(after),
    }
}

/// Split a CREATE TYPE statement at its `AS ENUM` keywords and return the
/// value-list text that follows.
///
/// The value list runs up to a second `AS ENUM`, if any.
pub fn enum_values(statement: &str) -> Option<&str> {
    let mut found = find_all(statement, as_enum);
    let (_, after, _) = found.next()?;
    let end = found.next().map_or(statement.len(), |(start, _, _)| start);
    Some(&statement[after..end])
}

/// Byte offsets right after every `CREATE TABLE` on the line that is not
/// already followed by `IF NOT EXISTS`.
pub fn unguarded_tables(line: &str) -> Vec<usize> {
    find_all(line, create_table)
        .map(|(_, end, _)| end)
        .filter(|end| if_not_exists(line[*end..].trim_start()).is_err())
        .collect()
}

/// Byte offset of `rest` inside `line`; `rest` must be a suffix of `line`.
fn offset(line: &str, rest: &str) -> usize {
    line.len() - rest.len()
}

/// Every match of `parser` starting on a word boundary of `input`, as
/// `(start, end, output)`.
fn find_all<'a, O, P>(input: &'a str, mut parser: P) -> impl Iterator<Item = (usize, usize, O)>
where
    P: FnMut(&'a str) -> IResult<&'a str, O>,
{
    input.char_indices().filter_map(move |(start, _)| {
        let at_boundary = input[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !is_word_char(c));
        if !at_boundary {
            return None;
        }
        parser(&input[start..])
            .ok()
            .map(|(rest, out)| (start, offset(input, rest), out))
    })
}

fn first_match<'a, O, P>(input: &'a str, parser: P) -> Option<(usize, usize, O)>
where
    P: FnMut(&'a str) -> IResult<&'a str, O>,
{
    find_all(input, parser).next()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// A case-insensitive keyword ending on a word boundary.
fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    terminated(tag_no_case(word), not(satisfy(is_word_char)))
}

fn create_type(input: &str) -> IResult<&str, &str> {
    recognize(tuple((keyword("CREATE"), space1, keyword("TYPE"))))(input)
}

fn create_table(input: &str) -> IResult<&str, &str> {
    recognize(tuple((keyword("CREATE"), space1, keyword("TABLE"))))(input)
}

fn create_index(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        keyword("CREATE"),
        opt(pair(space1, keyword("UNIQUE"))),
        space1,
        keyword("INDEX"),
    )))(input)
}

fn alter_table(input: &str) -> IResult<&str, &str> {
    recognize(tuple((keyword("ALTER"), space1, keyword("TABLE"))))(input)
}

fn add_constraint(input: &str) -> IResult<&str, &str> {
    recognize(tuple((keyword("ADD"), space1, keyword("CONSTRAINT"))))(input)
}

fn if_not_exists(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        keyword("IF"),
        space1,
        keyword("NOT"),
        space1,
        keyword("EXISTS"),
    )))(input)
}

fn as_enum(input: &str) -> IResult<&str, &str> {
    recognize(tuple((keyword("AS"), space1, keyword("ENUM"))))(input)
}

/// `"name"`, returning the text between the quotes.
fn quoted(input: &str) -> IResult<&str, &str> {
    delimited(char('"'), is_not("\""), char('"'))(input)
}

/// `"schema"."name"` or `"name"`, returned as written.
fn quoted_name(input: &str) -> IResult<&str, &str> {
    recognize(pair(quoted, many0(preceded(char('.'), quoted))))(input)
}

fn name_part(input: &str) -> IResult<&str, &str> {
    alt((recognize(quoted), take_while1(is_word_char)))(input)
}

/// Quoted or bare, optionally qualified, returned as written.
fn object_name(input: &str) -> Option<&str> {
    recognize(pair(name_part, many0(preceded(char('.'), name_part))))(input)
        .ok()
        .map(|(_, name)| name)
}
