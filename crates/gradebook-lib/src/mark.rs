// ABOUTME: Parser for the text of a single assignment cell
// ABOUTME: Grammar is `mark | late-days ; comment`, with late days and comment optional

use crate::{GradebookError, Result};
use std::fmt;

/// Why a mark cell did not yield a mark
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkProblem {
    /// The text could not be split into mark, late days, and comment
    Unparseable { text: String },
    /// The text parsed, but the mark part is blank
    MissingMark { text: String },
}

impl fmt::Display for MarkProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkProblem::Unparseable { text } => write!(f, "=>{text}<= doesn't parse!"),
            MarkProblem::MissingMark { text } => write!(f, "Mark is empty in =>{text}<="),
        }
    }
}

/// Structured content of one mark cell
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkRecord {
    /// The mark itself, trimmed; `None` when missing or unparseable
    pub mark: Option<String>,
    /// Number of late days, if the cell has a `|` section
    pub late: Option<u32>,
    /// Free-text comment, if the cell has a non-blank `;` section
    pub comment: Option<String>,
    /// Set whenever `mark` is `None`
    pub problem: Option<MarkProblem>,
}

/// Parse the text of a non-empty mark cell.
///
/// Never fails outright: problems are reported through [`MarkRecord::problem`]
/// so the caller can warn and keep going.
pub fn parse_mark_cell(text: &str) -> MarkRecord {
    match Scanner::new(text).cell() {
        None => MarkRecord {
            problem: Some(MarkProblem::Unparseable {
                text: text.to_string(),
            }),
            ..Default::default()
        },
        Some(parts) => {
            let comment = parts
                .comment
                .map(trim_ascii)
                .filter(|c| !c.is_empty())
                .map(str::to_string);
            if parts.mark.is_empty() {
                MarkRecord {
                    mark: None,
                    late: parts.late,
                    comment,
                    problem: Some(MarkProblem::MissingMark {
                        text: text.to_string(),
                    }),
                }
            } else {
                MarkRecord {
                    mark: Some(parts.mark.to_string()),
                    late: parts.late,
                    comment,
                    problem: None,
                }
            }
        }
    }
}

/// Parse a cell value that callers have already checked for presence.
///
/// Passing `None` is a caller defect and yields [`GradebookError::Internal`].
pub fn parse_mark_value(value: Option<&str>) -> Result<MarkRecord> {
    value.map(parse_mark_cell).ok_or_else(|| {
        GradebookError::internal("the mark parser must not be called with an absent cell value")
    })
}

/// Cells are split on ASCII whitespace only; non-breaking spaces are content
fn trim_ascii(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_ascii_whitespace())
}

struct Parts<'a> {
    mark: &'a str,
    late: Option<u32>,
    comment: Option<&'a str>,
}

/// Hand-written scanner over the cell text
struct Scanner<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        &self.text[start..self.pos]
    }

    fn skip_ws(&mut self) {
        self.take_while(|c| c.is_ascii_whitespace());
    }

    fn rest(&mut self) -> &'a str {
        let rest = &self.text[self.pos..];
        self.pos = self.text.len();
        rest
    }

    fn at_end(&self) -> bool {
        self.pos == self.text.len()
    }

    // cell := mark ("|" WS* digits WS*)? (";" comment)?
    fn cell(&mut self) -> Option<Parts<'a>> {
        let mark = trim_ascii(self.take_while(|c| c != '|' && c != ';'));
        let late = if self.eat('|') { Some(self.late_days()?) } else { None };
        let comment = if self.eat(';') { Some(self.rest()) } else { None };
        if !self.at_end() {
            return None;
        }
        Some(Parts {
            mark,
            late,
            comment,
        })
    }

    fn late_days(&mut self) -> Option<u32> {
        self.skip_ws();
        let digits = self.take_while(|c| c.is_ascii_digit());
        if digits.is_empty() {
            return None;
        }
        self.skip_ws();
        digits.parse().ok()
    }
}
