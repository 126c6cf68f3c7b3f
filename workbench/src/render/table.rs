//! Text renderings of code tables, token lists and truncated code lists.

use std::fmt;

use crate::session::{CodeEntry, Token};

/// One row per code table entry, symbol column padded, in the order the
/// codec built the table.
pub fn code_rows(entries: &[CodeEntry]) -> Vec<String> {
    let width = entries
        .iter()
        .map(|entry| entry.symbol.chars().count())
        .max()
        .unwrap_or(0);

    entries
        .iter()
        .map(|entry| format!("{:<width$}  {}", entry.symbol, entry.code))
        .collect()
}

/// One row per token, numbered from 1.
pub fn token_rows(tokens: &[Token]) -> Vec<String> {
    tokens
        .iter()
        .enumerate()
        .map(|(index, token)| {
            format!(
                "Token {}: (offset={}, length={}, char={})",
                index + 1,
                token.offset,
                token.match_length,
                token.next_char
            )
        })
        .collect()
}

/// A list of codes cut off after a fixed number of entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeListView {
    /// Heading, including the total count
    pub title: String,
    /// The entries that are shown
    pub entries: Vec<String>,
    /// How many entries were left out
    pub remaining: usize,
    separator: &'static str,
}

impl CodeListView {
    /// Emitted dictionary codes, comma separated.
    pub fn emitted_codes(codes: &[u64], limit: usize) -> Self {
        Self {
            title: format!("Emitted Codes ({} total):", codes.len()),
            entries: codes.iter().take(limit).map(u64::to_string).collect(),
            remaining: codes.len().saturating_sub(limit),
            separator: ", ",
        }
    }

    /// Decoded dictionary entries, one per line.
    pub fn decoded_codes(codes: &[(String, String)], limit: usize) -> Self {
        Self {
            title: format!("Decoded Codes ({} total):", codes.len()),
            entries: codes
                .iter()
                .take(limit)
                .map(|(index, decoded)| format!("[{index}]: {decoded}"))
                .collect(),
            remaining: codes.len().saturating_sub(limit),
            separator: "\n",
        }
    }

    /// The line announcing the hidden entries, if any were hidden.
    pub fn trailer(&self) -> Option<String> {
        (self.remaining > 0).then(|| format!("... and {} more codes", self.remaining))
    }
}

impl fmt::Display for CodeListView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        write!(f, "{}", self.entries.join(self.separator))?;
        if let Some(trailer) = self.trailer() {
            write!(f, "\n{trailer}")?;
        }
        Ok(())
    }
}
