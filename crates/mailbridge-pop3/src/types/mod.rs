//! POP3 response types.

/// Maildrop summary returned by `STAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stat {
    /// Number of messages, excluding those marked as deleted.
    pub count: u32,
    /// Total size of those messages in octets.
    pub size: u64,
}

/// One entry of a `LIST` scan listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanListing {
    /// 1-based message number.
    pub index: u32,
    /// Message size in octets.
    pub size: u64,
}
