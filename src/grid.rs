//! Grid parsing and normalization.
//!
//! Both pasted text and uploaded files are reduced to the same canonical
//! form the solver expects: a first line holding `N`, then `N` lines of `N`
//! space-separated integers in `0..=N` (0 = empty cell).
//!
//! Pasted text is user-typed, so parsing is lenient: the `N` header may be
//! omitted (inferred from a square grid) and digit-only rows may be written
//! without spaces. Uploaded files are expected to already conform, so they
//! are validated strictly: header required, whitespace-separated tokens only.

use crate::error::GridError;

/// A validated puzzle grid. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PuzzleGrid {
    size: u32,
    rows: Vec<Vec<u32>>,
}

impl PuzzleGrid {
    /// Parse pasted grid text. Header optional, compact digit rows allowed.
    pub fn parse_flexible(raw: &str) -> Result<Self, GridError> {
        let lines = non_blank_lines(raw);
        if lines.is_empty() {
            return Err(GridError::Empty);
        }

        let mut rest = &lines[..];
        let declared = if is_unsigned_int(lines[0]) {
            rest = &lines[1..];
            Some(parse_header(lines[0])?)
        } else {
            None
        };

        let token_rows: Vec<Vec<&str>> = rest.iter().map(|l| split_tokens(l)).collect();
        if token_rows.is_empty() {
            return Err(GridError::Empty);
        }

        let size = match declared {
            Some(n) => n,
            None => {
                let width = token_rows[0].len();
                let height = token_rows.len();
                if width != height {
                    return Err(GridError::NotSquare {
                        rows: height,
                        cols: width,
                    });
                }
                width as u32
            }
        };

        validate_rows(size, &token_rows)
    }

    /// Parse file-sourced grid text. Header required, no inference.
    pub fn parse_strict(raw: &str) -> Result<Self, GridError> {
        let lines = non_blank_lines(raw);
        if lines.is_empty() {
            return Err(GridError::Empty);
        }
        if !is_unsigned_int(lines[0]) {
            return Err(GridError::MissingHeader);
        }
        let size = parse_header(lines[0])?;

        let token_rows: Vec<Vec<&str>> = lines[1..]
            .iter()
            .map(|l| l.split_whitespace().collect())
            .collect();

        validate_rows(size, &token_rows)
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Canonical text form: `N` header plus space-joined rows. Feeding the
    /// result back through either parser yields the same string.
    pub fn canonical_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.size.to_string());
        for row in &self.rows {
            out.push('\n');
            let mut first = true;
            for v in row {
                if !first {
                    out.push(' ');
                }
                out.push_str(&v.to_string());
                first = false;
            }
        }
        out
    }
}

fn non_blank_lines(raw: &str) -> Vec<&str> {
    raw.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect()
}

fn is_unsigned_int(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn parse_header(line: &str) -> Result<u32, GridError> {
    let n: u32 = line.parse().map_err(|_| GridError::MissingHeader)?;
    if n == 0 {
        return Err(GridError::ZeroSize);
    }
    Ok(n)
}

/// Split a row into cell tokens: whitespace-separated if any whitespace is
/// present, otherwise one token per character (compact digit-only rows).
fn split_tokens(line: &str) -> Vec<&str> {
    if line.contains(char::is_whitespace) {
        line.split_whitespace().collect()
    } else {
        let mut toks = Vec::with_capacity(line.len());
        let mut iter = line.char_indices().peekable();
        while let Some((start, _)) = iter.next() {
            let end = iter.peek().map_or(line.len(), |&(i, _)| i);
            toks.push(&line[start..end]);
        }
        toks
    }
}

/// Shared row/cell validation. First violation in row-major order wins.
fn validate_rows(size: u32, token_rows: &[Vec<&str>]) -> Result<PuzzleGrid, GridError> {
    let expected = size as usize;
    if token_rows.len() != expected {
        return Err(GridError::RowCount {
            expected,
            found: token_rows.len(),
        });
    }

    let mut rows = Vec::with_capacity(expected);
    for (i, toks) in token_rows.iter().enumerate() {
        if toks.len() != expected {
            return Err(GridError::RowLength {
                row: i + 1,
                found: toks.len(),
                expected,
            });
        }
        let mut row = Vec::with_capacity(expected);
        for (j, tok) in toks.iter().enumerate() {
            if !is_unsigned_int(tok) {
                return Err(GridError::BadToken {
                    row: i + 1,
                    col: j + 1,
                    token: (*tok).to_string(),
                });
            }
            let value: u64 = tok.parse().map_err(|_| GridError::BadToken {
                row: i + 1,
                col: j + 1,
                token: (*tok).to_string(),
            })?;
            if value > u64::from(size) {
                return Err(GridError::OutOfRange {
                    row: i + 1,
                    col: j + 1,
                    value,
                    max: size,
                });
            }
            row.push(value as u32);
        }
        rows.push(row);
    }

    Ok(PuzzleGrid { size, rows })
}
