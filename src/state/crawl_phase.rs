/// Crawl phase definitions for the orchestrator state machine
///
/// A crawl moves strictly forward through these phases; discovery and
/// extraction never overlap.
use crate::HarvestError;
use std::fmt;

/// The phase an orchestrator run is in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// Walking community listing pages
    DiscoveringCommunities,

    /// Walking member listings of every community on the worker pool
    DiscoveringUsers,

    /// Extracting and persisting reading logs, one user at a time per worker
    ExtractingLogs,

    /// Every non-skipped user has been processed
    Done,
}

impl CrawlPhase {
    /// Returns true if `next` directly follows this phase
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        matches!(
            (self, next),
            (Self::DiscoveringCommunities, Self::DiscoveringUsers)
                | (Self::DiscoveringUsers, Self::ExtractingLogs)
                | (Self::ExtractingLogs, Self::Done)
        )
    }

    /// Moves to `next`, rejecting anything but the following phase
    pub fn advance(self, next: CrawlPhase) -> Result<CrawlPhase, HarvestError> {
        if self.can_transition_to(next) {
            tracing::debug!("Phase {} -> {}", self, next);
            Ok(next)
        } else {
            Err(HarvestError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DiscoveringCommunities => "discovering_communities",
            Self::DiscoveringUsers => "discovering_users",
            Self::ExtractingLogs => "extracting_logs",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
