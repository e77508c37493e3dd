//! Line cursor over a migration script.
//!
//! Statements are delimited by the first `;` seen anywhere in the accumulated
//! text. A `;` inside a string literal or a comment therefore ends the
//! statement early; migration scripts fed to this tool are expected not to
//! contain one there.

/// The statement terminator.
pub const TERMINATOR: char = ';';

/// Forward-only cursor over the lines of a script.
///
/// Lines are split on `\n` alone, so a `\r` stays attached to its line and
/// joining the lines back with `\n` reproduces the input exactly.
#[derive(Debug)]
pub struct Scanner<'a> {
    lines: Vec<&'a str>,
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(script: &'a str) -> Self {
        Self {
            lines: script.split('\n').collect(),
            pos: 0,
        }
    }

    /// Advance to the next line, returning its 1-based number and text.
    pub fn next_line(&mut self) -> Option<(usize, &'a str)> {
        let line = *self.lines.get(self.pos)?;
        self.pos += 1;
        Some((self.pos, line))
    }

    /// Extend `first` with following lines until the text contains the
    /// terminator or the script runs out.
    pub fn collect_statement(&mut self, first: &str) -> String {
        let mut statement = first.to_string();
        while !statement.contains(TERMINATOR) {
            let Some((_, line)) = self.next_line() else {
                break;
            };
            statement.push('\n');
            statement.push_str(line);
        }
        statement
    }

    pub(crate) fn len(&self) -> usize {
        self.lines.len()
    }
}
