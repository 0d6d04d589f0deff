//! Pagination state for a single listing query
//!
//! Each distinct query (one keyword, one creator timeline, one comment thread)
//! owns its own `PaginationState`; nothing is shared between queries.

use std::fmt;

/// Opaque position in a listing plus the end-of-list flag reported with it
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cursor {
    /// Token handed back to the remote API on the next call (an offset for most listings)
    pub next: String,

    /// True when the remote side reported that no further page exists
    pub is_end: bool,
}

impl Cursor {
    /// Cursor for the first page of a listing
    pub fn start() -> Self {
        Self {
            next: String::new(),
            is_end: false,
        }
    }

    /// Cursor at a numeric offset
    pub fn at_offset(offset: u64) -> Self {
        Self {
            next: offset.to_string(),
            is_end: false,
        }
    }

    /// Parses the cursor as a numeric offset, treating an empty token as zero
    pub fn offset(&self) -> u64 {
        self.next.trim().parse().unwrap_or(0)
    }

    /// Cursor reporting the end of a listing
    pub fn end() -> Self {
        Self {
            next: String::new(),
            is_end: true,
        }
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_end {
            write!(f, "end")
        } else if self.next.is_empty() {
            write!(f, "start")
        } else {
            write!(f, "{}", self.next)
        }
    }
}

/// One page of extracted records and the cursor for the page after it
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub cursor: Cursor,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, cursor: Cursor) -> Self {
        Self { items, cursor }
    }

    /// An empty final page (e.g. the remote side answered 404)
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            cursor: Cursor::end(),
        }
    }
}

/// Two-state machine driving every pagination loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaginationState {
    /// Another page may be requested with this cursor
    HasMore { cursor: Cursor },

    /// No further page may be requested
    End,
}

impl PaginationState {
    /// Initial state: `HasMore` with the start cursor
    pub fn start() -> Self {
        Self::HasMore {
            cursor: Cursor::start(),
        }
    }

    /// Applies a fetched page
    ///
    /// Moves to `End` when the page reports the end flag or carries no items,
    /// otherwise to `HasMore` with the page's cursor.
    pub fn advance<T>(&mut self, page: &Page<T>) {
        *self = if page.cursor.is_end || page.items.is_empty() {
            Self::End
        } else {
            Self::HasMore {
                cursor: page.cursor.clone(),
            }
        };
    }

    pub fn is_end(&self) -> bool {
        matches!(self, Self::End)
    }

    /// Cursor for the next request, `None` once the listing has ended
    pub fn cursor(&self) -> Option<&Cursor> {
        match self {
            Self::HasMore { cursor } => Some(cursor),
            Self::End => None,
        }
    }
}
