//! Inline parameter binding for logging and ad-hoc SQL.
//!
//! Statements sent to a driver always use real placeholders; the binder
//! renders a statement with its parameters quoted in place, which is what
//! the debug trace prints.

mod scanner;

use scanner::{
    State, close_quote, is_block_comment_end, is_block_comment_start, is_line_comment_start,
    scan_digits,
};

use crate::error::DbalError;
use crate::types::RowValues;

/// Quotes values and substitutes them for `?` / `?N` placeholders.
#[derive(Debug, Default, Clone, Copy)]
pub struct Binder;

impl Binder {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Render a value as an SQL literal.
    ///
    /// ```rust
    /// use sql_dbal::prelude::*;
    ///
    /// let binder = Binder::new();
    /// assert_eq!(binder.quote(&RowValues::Text("o'neil".into())), "'o''neil'");
    /// assert_eq!(binder.quote(&RowValues::Null), "NULL");
    /// ```
    #[must_use]
    pub fn quote(&self, value: &RowValues) -> String {
        match value {
            RowValues::Int(i) => i.to_string(),
            RowValues::Float(f) => f.to_string(),
            RowValues::Text(s) => quote_str(s),
            RowValues::Bool(b) => i64::from(*b).to_string(),
            RowValues::Timestamp(dt) => quote_str(&dt.format("%F %T%.f").to_string()),
            RowValues::Null => "NULL".to_string(),
            RowValues::JSON(json) => quote_str(&json.to_string()),
            RowValues::Blob(bytes) => {
                let mut out = String::with_capacity(bytes.len() * 2 + 3);
                out.push_str("X'");
                for b in bytes {
                    out.push_str(&format!("{b:02X}"));
                }
                out.push('\'');
                out
            }
        }
    }

    /// Substitute quoted parameters for the placeholders in `sql`.
    ///
    /// Bare `?` placeholders consume parameters in order; `?N` refers to the
    /// N-th parameter (1-based). Placeholders inside string literals, quoted
    /// identifiers and comments are left alone.
    ///
    /// # Errors
    /// Returns `DbalError::Parameter` if a placeholder has no parameter or
    /// sequential placeholders leave parameters unused.
    pub fn bind(&self, sql: &str, params: &[RowValues]) -> Result<String, DbalError> {
        let bytes = sql.as_bytes();
        let mut out = String::with_capacity(sql.len() + params.len() * 8);
        let mut state = State::Normal;
        let mut copied = 0;
        let mut next_param = 0;
        let mut numbered = false;
        let mut idx = 0;

        while idx < bytes.len() {
            let b = bytes[idx];
            match state {
                State::Normal => match b {
                    b'\'' => state = State::SingleQuoted,
                    b'"' => state = State::DoubleQuoted,
                    b'`' => state = State::Backticked,
                    _ if is_line_comment_start(bytes, idx) => state = State::LineComment,
                    _ if is_block_comment_start(bytes, idx) => {
                        state = State::BlockComment;
                        idx += 1;
                    }
                    b'?' => {
                        let (end, position) = match scan_digits(bytes, idx + 1) {
                            Some((end, digits)) => {
                                numbered = true;
                                let n: usize = digits.parse().map_err(|_| {
                                    DbalError::Parameter(format!("bad placeholder ?{digits}"))
                                })?;
                                (end, n.checked_sub(1))
                            }
                            None => {
                                next_param += 1;
                                (idx + 1, Some(next_param - 1))
                            }
                        };
                        let value = position.and_then(|p| params.get(p)).ok_or_else(|| {
                            DbalError::Parameter(format!(
                                "placeholder at byte {idx} has no parameter ({} given)",
                                params.len()
                            ))
                        })?;
                        out.push_str(&sql[copied..idx]);
                        out.push_str(&self.quote(value));
                        copied = end;
                        idx = end;
                        continue;
                    }
                    _ => {}
                },
                State::SingleQuoted | State::DoubleQuoted | State::Backticked => {
                    let quote = match state {
                        State::SingleQuoted => b'\'',
                        State::DoubleQuoted => b'"',
                        _ => b'`',
                    };
                    let (at, closed) = close_quote(bytes, idx, quote);
                    idx = at;
                    if closed {
                        state = State::Normal;
                    }
                }
                State::LineComment => {
                    if b == b'\n' {
                        state = State::Normal;
                    }
                }
                State::BlockComment => {
                    if is_block_comment_end(bytes, idx) {
                        state = State::Normal;
                        idx += 1;
                    }
                }
            }
            idx += 1;
        }

        if !numbered && next_param != params.len() {
            return Err(DbalError::Parameter(format!(
                "statement has {next_param} placeholders but {} parameters were given",
                params.len()
            )));
        }

        out.push_str(&sql[copied..]);
        Ok(out)
    }
}

fn quote_str(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}
