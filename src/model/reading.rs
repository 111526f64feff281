//! Reading-log records and the tables they are written to

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque user handle, unique across a crawl
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Book row; stored once per user that read it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: String,
    pub title: String,
}

/// Author row; stored once per reading-log row that names it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    pub name: String,
}

/// One line of a user's "books read" history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingLogEntry {
    pub book_id: String,
    pub author_id: String,
    pub read_date: String,
    pub user_id: String,
}

/// A reading-log row as it appears on the page, before it is tied to a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub read_date: String,
    pub book: Book,
    pub author: Author,
}

impl LogRecord {
    /// Attaches the owning user, producing the (book, author, entry) triple
    pub fn into_row(self, user_id: &UserId) -> ReadingLogRow {
        let entry = ReadingLogEntry {
            book_id: self.book.id.clone(),
            author_id: self.author.id.clone(),
            read_date: self.read_date,
            user_id: user_id.to_string(),
        };
        ReadingLogRow {
            book: self.book,
            author: self.author,
            entry,
        }
    }
}

/// The triple emitted for every reading-log row of a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingLogRow {
    pub book: Book,
    pub author: Author,
    pub entry: ReadingLogEntry,
}

/// The three per-user tables, in row order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserTables {
    pub books: Vec<Book>,
    pub authors: Vec<Author>,
    pub reading_logs: Vec<ReadingLogEntry>,
}

impl UserTables {
    pub fn push(&mut self, row: ReadingLogRow) {
        self.books.push(row.book);
        self.authors.push(row.author);
        self.reading_logs.push(row.entry);
    }

    pub fn len(&self) -> usize {
        self.reading_logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reading_logs.is_empty()
    }
}
