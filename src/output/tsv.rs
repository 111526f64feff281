//! Tab-delimited table files
//!
//! Each table starts with a header row. Fields containing a tab, a line
//! break or a double quote are double-quoted with inner quotes doubled, so
//! a tab-delimited CSV reader gets the original text back.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

/// The three tables written for every user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Books,
    Authors,
    ReadingLogs,
}

impl Table {
    pub const ALL: [Table; 3] = [Table::Books, Table::Authors, Table::ReadingLogs];

    /// Suffix used in the file name, `{user_id}-{name}.tsv`
    pub fn name(&self) -> &'static str {
        match self {
            Self::Books => "books",
            Self::Authors => "authors",
            Self::ReadingLogs => "reading_logs",
        }
    }

    /// Column names, in record attribute order
    pub fn header(&self) -> &'static [&'static str] {
        match self {
            Self::Books => &["id", "title"],
            Self::Authors => &["id", "name"],
            Self::ReadingLogs => &["book_id", "author_id", "read_date", "user_id"],
        }
    }

    pub fn file_name(&self, user_id: &str) -> String {
        format!("{}-{}.tsv", user_id, self.name())
    }

    pub fn path_in(&self, dir: &Path, user_id: &str) -> PathBuf {
        dir.join(self.file_name(user_id))
    }
}

/// Serializes `rows` under `header` to any writer
pub fn write_rows<W: Write, T: Serialize>(
    writer: W,
    header: &[&str],
    rows: &[T],
) -> Result<(), csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(writer);

    writer.write_record(header)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes one table file, replacing any existing file
pub fn write_table<T: Serialize>(path: &Path, header: &[&str], rows: &[T]) -> Result<(), csv::Error> {
    let file = std::fs::File::create(path)?;
    write_rows(std::io::BufWriter::new(file), header, rows)
}

/// Reads a table file written by `write_table`
pub fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_path(path)?;
    reader.deserialize().collect()
}
