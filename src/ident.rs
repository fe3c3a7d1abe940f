//! Channel, nick and context value types
//!
//! Every identity carries two views: the canonical (as-typed, display) form
//! and the normalized (trimmed, lowercased) lookup key. Equality, hashing and
//! ordering use only the normalized key, so "#Rust" and "#rust" are the same
//! channel with whichever spelling was seen.

use std::fmt;
use std::hash::{Hash, Hasher};

/// Reserved context name; never a valid channel.
pub const GLOBAL_CONTEXT: &str = "global";

#[derive(Debug)]
pub enum IdentError {
    Empty,
    ReservedName(String),
}

impl fmt::Display for IdentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentError::Empty => write!(f, "Name cannot be empty"),
            IdentError::ReservedName(name) => {
                write!(f, "'{}' is a reserved context name, not a channel", name)
            }
        }
    }
}

impl std::error::Error for IdentError {}

fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// A tracked conversation space.
#[derive(Debug, Clone)]
pub struct Channel {
    canonical: String,
}

impl Channel {
    pub fn parse(raw: &str) -> Result<Self, IdentError> {
        let normalized = normalize(raw);
        if normalized.is_empty() {
            return Err(IdentError::Empty);
        }
        if normalized == GLOBAL_CONTEXT {
            return Err(IdentError::ReservedName(raw.trim().to_string()));
        }
        Ok(Self {
            canonical: raw.trim().to_string(),
        })
    }

    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    pub fn normalized(&self) -> String {
        normalize(&self.canonical)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical)
    }
}

impl PartialEq for Channel {
    fn eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

impl Eq for Channel {}

impl Hash for Channel {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized().hash(state);
    }
}

/// A message author.
#[derive(Debug, Clone)]
pub struct Nick {
    canonical: String,
}

impl Nick {
    pub fn new(raw: &str) -> Self {
        Self {
            canonical: raw.trim().to_string(),
        }
    }

    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    pub fn normalized(&self) -> String {
        normalize(&self.canonical)
    }
}

impl fmt::Display for Nick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical)
    }
}

impl PartialEq for Nick {
    fn eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

impl Eq for Nick {}

impl Hash for Nick {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized().hash(state);
    }
}

/// An ignore scope: a specific channel, or everywhere.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Context {
    Global,
    Channel(Channel),
}

impl Context {
    pub fn parse(raw: &str) -> Result<Self, IdentError> {
        if normalize(raw) == GLOBAL_CONTEXT {
            return Ok(Context::Global);
        }
        Ok(Context::Channel(Channel::parse(raw)?))
    }

    pub fn channel(channel: &Channel) -> Self {
        Context::Channel(channel.clone())
    }

    pub fn is_global(&self) -> bool {
        matches!(self, Context::Global)
    }

    /// Lookup key for the scope: `"global"` or the channel's normalized name.
    pub fn normalized(&self) -> String {
        match self {
            Context::Global => GLOBAL_CONTEXT.to_string(),
            Context::Channel(channel) => channel.normalized(),
        }
    }

    /// Human phrasing for replies: "globally" or "in #chan".
    pub fn locative(&self) -> String {
        match self {
            Context::Global => "globally".to_string(),
            Context::Channel(channel) => format!("in {}", channel),
        }
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Context::Global => write!(f, "{}", GLOBAL_CONTEXT),
            Context::Channel(channel) => write!(f, "{}", channel),
        }
    }
}
