//! Tokenized-document reader
//!
//! Input is JSON Lines: one token record per line, in corpus order.
//! The reader is an iterator so arbitrarily long documents never need
//! to fit in memory; parse failures carry the offending line number.

use scholia_common::error::{Error, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines, Read};
use std::path::Path;

/// One token occurrence from the input stream
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenRecord {
    /// Paragraph coordinate
    pub p: i64,
    /// Sentence coordinate
    pub s: i64,
    /// Line coordinate
    pub line: i64,
    /// Surface form, the dedup key together with the language
    pub form: String,
    /// Display representation; falls back to the surface form
    #[serde(default)]
    pub repr: Option<String>,
    /// Formatting flags carried onto the string row
    #[serde(default)]
    pub fmt: Vec<String>,
    /// Part-of-speech metadata; first seen wins per (form, language)
    #[serde(default)]
    pub meta: Option<String>,
}

impl TokenRecord {
    /// Display representation for the string row
    pub fn repr(&self) -> &str {
        self.repr.as_deref().unwrap_or(&self.form)
    }
}

/// Line-by-line reader over a JSON Lines token document
pub struct RecordReader<R> {
    lines: Lines<BufReader<R>>,
    line_no: usize,
}

impl RecordReader<File> {
    /// Open a token document from disk
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(file))
    }
}

impl<R: Read> RecordReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            lines: BufReader::new(inner).lines(),
            line_no: 0,
        }
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<TokenRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?;
            self.line_no += 1;
            match line {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => {
                    return Some(serde_json::from_str(&line).map_err(|e| {
                        Error::Validation(format!("line {}: {}", self.line_no, e))
                    }));
                }
                Err(e) => return Some(Err(Error::Io(e))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_reads_records_in_order() {
        let input = concat!(
            r#"{"p":1,"s":1,"line":1,"form":"arma"}"#,
            "\n",
            r#"{"p":1,"s":1,"line":2,"form":"virum","repr":"virumque","fmt":["i"],"meta":"NOUN"}"#,
            "\n",
        );
        let records: Vec<TokenRecord> = RecordReader::new(Cursor::new(input))
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].form, "arma");
        assert_eq!(records[0].repr(), "arma");
        assert!(records[0].fmt.is_empty());
        assert_eq!(records[1].repr(), "virumque");
        assert_eq!(records[1].fmt, vec!["i".to_string()]);
        assert_eq!(records[1].meta.as_deref(), Some("NOUN"));
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let input = "\n{\"p\":1,\"s\":1,\"line\":1,\"form\":\"a\"}\n   \n";
        let records: Vec<TokenRecord> = RecordReader::new(Cursor::new(input))
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_parse_error_names_the_line() {
        let input = "{\"p\":1,\"s\":1,\"line\":1,\"form\":\"ok\"}\nnot json\n";
        let results: Vec<Result<TokenRecord>> = RecordReader::new(Cursor::new(input)).collect();

        assert!(results[0].is_ok());
        let err = results[1].as_ref().unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_missing_required_field_fails() {
        let input = r#"{"p":1,"s":1,"line":1}"#;
        let result: Result<TokenRecord> = RecordReader::new(Cursor::new(input)).next().unwrap();
        assert!(result.is_err());
    }
}
