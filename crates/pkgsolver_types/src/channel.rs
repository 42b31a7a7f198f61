//! A named source of records with a priority rank.

use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};

use thiserror::Error;

/// A channel name together with its priority rank.
///
/// Lower `priority` values are preferred: rank `0` outranks rank `1`. Ranks
/// are assigned by [`rank_channels`] from the order channels were configured
/// in, not carried in the channel name itself.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Channel {
    name: String,
    priority: i64,
}

/// An error produced when a string cannot be used as a channel name.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum ParseChannelError {
    /// The name was empty.
    #[error("channel name cannot be empty")]
    Empty,
}

impl Channel {
    /// Constructs a channel with an explicit priority rank.
    pub fn new(name: impl Into<String>, priority: i64) -> Result<Self, ParseChannelError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ParseChannelError::Empty);
        }
        Ok(Self { name, priority })
    }

    /// The channel's name, as configured (e.g. `conda-forge`, `main`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The channel's priority rank. Lower outranks higher.
    pub fn priority(&self) -> i64 {
        self.priority
    }
}

impl Display for Channel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Assigns priority ranks to an ordered list of channel names: the first
/// channel gets rank `0`, the second rank `1`, and so on. This mirrors how
/// a user's channel list is configured — first listed, first tried.
pub fn rank_channels<'a>(ordered: impl IntoIterator<Item = &'a str>) -> HashMap<String, i64> {
    ordered
        .into_iter()
        .enumerate()
        .map(|(rank, name)| (name.to_string(), rank as i64))
        .collect()
}
