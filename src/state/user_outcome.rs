use std::fmt;

/// What happened to one user during the extraction phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserOutcome {
    /// Every reading-log page was extracted and the tables were written
    Completed { entries: usize },

    /// Tables were written, but some pages after the first failed and were skipped
    Partial { entries: usize, failed_pages: u32 },

    /// The output directory already existed and `force` was not set
    Skipped,

    /// Nothing was written; the next run will retry this user
    Failed { error: String },
}

impl UserOutcome {
    /// Returns true if tables were written for this user
    pub fn is_persisted(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Partial { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Number of reading-log entries written
    pub fn entries(&self) -> usize {
        match self {
            Self::Completed { entries } | Self::Partial { entries, .. } => *entries,
            Self::Skipped | Self::Failed { .. } => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed { .. } => "completed",
            Self::Partial { .. } => "partial",
            Self::Skipped => "skipped",
            Self::Failed { .. } => "failed",
        }
    }
}

impl fmt::Display for UserOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed { entries } => write!(f, "completed ({} entries)", entries),
            Self::Partial {
                entries,
                failed_pages,
            } => write!(
                f,
                "partial ({} entries, {} pages skipped)",
                entries, failed_pages
            ),
            Self::Skipped => f.write_str("skipped"),
            Self::Failed { error } => write!(f, "failed: {}", error),
        }
    }
}
