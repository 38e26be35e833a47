//! Static parser for snapshot source files.
//!
//! Snapshot sources are Jest-style `.snap` files: a sequence of
//! ``exports[`id`] = `value`;`` entries, optionally preceded by line
//! comments and blank lines. The file is parsed as data and never
//! evaluated. Inside a backtick literal a backslash escapes the following
//! character, which covers the writer-side escapes for `` ` ``, `\` and `$`.

use std::collections::BTreeMap;

/// Marker separating the plain snapshot text from its rendered HTML preview
/// inside a raw entry value.
pub const HTML_PREVIEW_SEPARATOR: &str = "------------HTML PREVIEW---------------";

const ENTRY_PREFIX: &str = "exports[";

#[derive(Debug, thiserror::Error)]
#[error("{message} at line {line}")]
pub struct SnapParseError {
    pub message: String,
    pub line: usize,
}

/// Parses a snapshot source into an id-to-raw-value map.
///
/// Entries are returned in lexicographic id order. Duplicate ids keep the
/// last value (last writer wins).
pub fn parse_snapshot_source(source: &str) -> Result<BTreeMap<String, String>, SnapParseError> {
    let mut entries = BTreeMap::new();
    let mut cursor = Cursor::new(source);
    loop {
        cursor.skip_trivia();
        if cursor.at_end() {
            break;
        }
        cursor.expect(ENTRY_PREFIX)?;
        cursor.skip_whitespace();
        let id = cursor.parse_backtick_string()?;
        cursor.skip_whitespace();
        cursor.expect("]")?;
        cursor.skip_whitespace();
        cursor.expect("=")?;
        cursor.skip_whitespace();
        let value = cursor.parse_backtick_string()?;
        cursor.skip_whitespace();
        cursor.expect(";")?;
        entries.insert(id, value);
    }
    Ok(entries)
}

/// Splits a raw entry value into its plain text and optional HTML preview.
pub fn split_preview(raw: &str) -> (String, Option<String>) {
    match raw.split_once(HTML_PREVIEW_SEPARATOR) {
        Some((snap, html)) => (snap.to_string(), Some(html.to_string())),
        None => (raw.to_string(), None),
    }
}

struct Cursor<'a> {
    rest: &'a str,
    line: usize,
}

impl<'a> Cursor<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            rest: source,
            line: 1,
        }
    }

    fn at_end(&self) -> bool {
        self.rest.is_empty()
    }

    fn advance(&mut self, len: usize) {
        let (consumed, rest) = self.rest.split_at(len);
        self.line += consumed.matches('\n').count();
        self.rest = rest;
    }

    fn skip_whitespace(&mut self) {
        let trimmed = self.rest.trim_start();
        let skipped = self.rest.len() - trimmed.len();
        if skipped > 0 {
            self.advance(skipped);
        }
    }

    /// Skips whitespace and `//` line comments between entries.
    fn skip_trivia(&mut self) {
        loop {
            self.skip_whitespace();
            if self.rest.starts_with("//") {
                let len = self.rest.find('\n').unwrap_or(self.rest.len());
                self.advance(len);
            } else {
                return;
            }
        }
    }

    fn expect(&mut self, token: &str) -> Result<(), SnapParseError> {
        if self.rest.starts_with(token) {
            self.advance(token.len());
            Ok(())
        } else {
            Err(self.error(format!("expected `{token}`")))
        }
    }

    fn parse_backtick_string(&mut self) -> Result<String, SnapParseError> {
        if !self.rest.starts_with('`') {
            return Err(self.error("expected a backtick string".to_string()));
        }
        self.advance(1);

        let mut value = String::new();
        let mut chars = self.rest.char_indices();
        while let Some((offset, character)) = chars.next() {
            match character {
                '\\' => match chars.next() {
                    Some((_, escaped)) => value.push(escaped),
                    None => break,
                },
                '`' => {
                    self.advance(offset + 1);
                    return Ok(value);
                }
                _ => value.push(character),
            }
        }
        Err(self.error("unterminated backtick string".to_string()))
    }

    fn error(&self, message: String) -> SnapParseError {
        SnapParseError {
            message,
            line: self.line,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_entries_and_skips_header() {
        let source = "// Jest Snapshot v1, https://goo.gl/fbAQLP\n\n\
            exports[`App renders 1`] = `\n<div />\n`;\n\n\
            exports[`App renders 2`] = `plain`;\n";
        let entries = parse_snapshot_source(source).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries["App renders 1"], "\n<div />\n");
        assert_eq!(entries["App renders 2"], "plain");
    }

    #[test]
    fn unescapes_backticks_backslashes_and_dollars() {
        let source = r"exports[`esc 1`] = `a \` b \\ c \${d}`;";
        let entries = parse_snapshot_source(source).unwrap();
        assert_eq!(entries["esc 1"], "a ` b \\ c ${d}");
    }

    #[test]
    fn empty_source_yields_no_entries() {
        assert!(parse_snapshot_source("").unwrap().is_empty());
        assert!(parse_snapshot_source("// header only\n").unwrap().is_empty());
    }

    #[test]
    fn rejects_missing_semicolon() {
        let source = "exports[`a 1`] = `x`\nexports[`a 2`] = `y`;";
        let error = parse_snapshot_source(source).unwrap_err();
        assert!(error.message.contains("expected `;`"));
        assert_eq!(error.line, 2);
    }

    #[test]
    fn rejects_unterminated_value() {
        let source = "exports[`a 1`] = `never closed";
        let error = parse_snapshot_source(source).unwrap_err();
        assert!(error.message.contains("unterminated"));
    }

    #[test]
    fn rejects_arbitrary_code() {
        let source = "const fs = require('fs');\n";
        assert!(parse_snapshot_source(source).is_err());
    }

    #[test]
    fn split_preview_honors_marker() {
        let raw = format!("text\n{HTML_PREVIEW_SEPARATOR}\n<div />");
        let (snap, html) = split_preview(&raw);
        assert_eq!(snap, "text\n");
        assert_eq!(html.as_deref(), Some("\n<div />"));

        let (snap, html) = split_preview("no preview");
        assert_eq!(snap, "no preview");
        assert_eq!(html, None);
    }
}
