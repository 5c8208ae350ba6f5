//! Stackable, line-oriented text sources.
//!
//! The lexer pulls text one line at a time through the [`SourceText`] trait,
//! which keeps it indifferent to where the text lives: a file on disk
//! ([`FileText`]) or a string in memory ([`StrText`], used for the
//! predefined preamble the parser injects ahead of the user's file).

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// A line-oriented text source.
pub trait SourceText {
    /// Title of the stream, used in diagnostics (file name or a synthetic
    /// name like `*predefined*`).
    fn title(&self) -> &str;

    /// Read the next line into `buf`, replacing its contents and keeping the
    /// end-of-line character(s). Returns false at end of source.
    fn read_line(&mut self, buf: &mut String) -> bool;
}

/// An in-memory source with a synthetic title.
pub struct StrText {
    title: String,
    text: String,
    pos: usize,
}

impl StrText {
    /// Create a source over `text` titled `title`.
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            pos: 0,
        }
    }
}

impl SourceText for StrText {
    fn title(&self) -> &str {
        &self.title
    }

    fn read_line(&mut self, buf: &mut String) -> bool {
        buf.clear();
        if self.pos >= self.text.len() {
            return false;
        }
        let rest = &self.text[self.pos..];
        let end = match rest.find('\n') {
            Some(i) => i + 1,
            None => rest.len(),
        };
        buf.push_str(&rest[..end]);
        self.pos += end;
        true
    }
}

/// A buffered file source.
pub struct FileText {
    title: String,
    reader: BufReader<File>,
    at_eof: bool,
}

impl FileText {
    /// Open `path` for line-oriented reading.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            title: path.to_string_lossy().into_owned(),
            reader: BufReader::new(file),
            at_eof: false,
        })
    }
}

impl SourceText for FileText {
    fn title(&self) -> &str {
        &self.title
    }

    fn read_line(&mut self, buf: &mut String) -> bool {
        buf.clear();
        if self.at_eof {
            return false;
        }
        match self.reader.read_line(buf) {
            Ok(0) | Err(_) => {
                self.at_eof = true;
                false
            }
            Ok(_) => true,
        }
    }
}
