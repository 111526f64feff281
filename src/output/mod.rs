//! Output module for persisting harvested reading logs
//!
//! This module handles:
//! - The per-user output tree (`{root}/{user_id}/{user_id}-{table}.tsv`)
//! - Tab-delimited table encoding
//! - The end-of-crawl report

mod report;
pub mod tsv;

pub use report::{print_report, CrawlReport};
pub use tsv::{read_table, write_table, Table};

use crate::model::{UserId, UserTables};
use std::io;
use std::path::{Path, PathBuf};

/// The directory tree holding one sub-directory per harvested user
///
/// A user directory only ever appears complete: tables are written to a
/// hidden staging directory that is renamed into place afterwards. The
/// existence of a user directory is what marks the user as done.
#[derive(Debug, Clone)]
pub struct OutputTree {
    root: PathBuf,
}

impl OutputTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn user_dir(&self, user_id: &UserId) -> PathBuf {
        self.root.join(user_id.as_str())
    }

    /// Returns true if the user's directory already exists
    pub fn is_materialized(&self, user_id: &UserId) -> bool {
        is_safe_component(user_id.as_str()) && self.user_dir(user_id).exists()
    }

    /// Writes the user's three tables and moves them into place
    ///
    /// An existing user directory is replaced.
    ///
    /// # Returns
    ///
    /// * `Ok(PathBuf)` - The user directory
    /// * `Err(HarvestError)` - The user id is not usable as a directory name, or a write failed
    pub fn write_user(&self, user_id: &UserId, tables: &UserTables) -> crate::Result<PathBuf> {
        let id = user_id.as_str();
        if !is_safe_component(id) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("user id {:?} cannot be used as a directory name", id),
            )
            .into());
        }

        std::fs::create_dir_all(&self.root)?;

        let staging = self.root.join(format!(".{}.partial", id));
        if staging.exists() {
            std::fs::remove_dir_all(&staging)?;
        }
        std::fs::create_dir(&staging)?;

        write_table(&Table::Books.path_in(&staging, id), Table::Books.header(), &tables.books)?;
        write_table(
            &Table::Authors.path_in(&staging, id),
            Table::Authors.header(),
            &tables.authors,
        )?;
        write_table(
            &Table::ReadingLogs.path_in(&staging, id),
            Table::ReadingLogs.header(),
            &tables.reading_logs,
        )?;

        let target = self.user_dir(user_id);
        if target.exists() {
            std::fs::remove_dir_all(&target)?;
        }
        std::fs::rename(&staging, &target)?;

        tracing::debug!("Wrote {} rows to {}", tables.len(), target.display());
        Ok(target)
    }
}

/// A user id must name exactly one directory inside the output root
fn is_safe_component(id: &str) -> bool {
    !id.is_empty()
        && id != "."
        && id != ".."
        && !id.starts_with('.')
        && !id.contains(['/', '\\'])
}
