//! Record types produced by the crawl
//!
//! - `Community`: discovered from the community listing, used only to find users
//! - `UserId`: handles collected from community member listings
//! - `Book`, `Author`, `ReadingLogEntry`: the per-user output tables

mod community;
mod reading;

pub use community::{
    Community, CommunityListing, CommunityOwner, CommunityResource, ListingMetadata, ResourceId,
};
pub use reading::{
    Author, Book, LogRecord, ReadingLogEntry, ReadingLogRow, UserId, UserTables,
};

/// The DOM shape a listing page is parsed as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// Community listing (embedded JSON payload)
    Community,
    /// Community member listing (user handle anchors)
    User,
    /// A user's reading history
    ReadingLog,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Community => "community",
            Self::User => "user",
            Self::ReadingLog => "reading_log",
        }
    }
}

/// A record extracted from one listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Community(Community),
    User(UserId),
    ReadingLog(LogRecord),
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Community(_) => RecordKind::Community,
            Self::User(_) => RecordKind::User,
            Self::ReadingLog(_) => RecordKind::ReadingLog,
        }
    }
}
