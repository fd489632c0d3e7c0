//! Type definitions for transfer market records.

use serde::{Deserialize, Serialize};

/// Direction of a player move relative to the acting club.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// The player joined the acting club; the counter-party sold.
    In,
    /// The player left the acting club; the counter-party bought.
    Out,
}

impl Direction {
    /// Parse the dataset's `dir` column.
    ///
    /// The source data spells outbound moves `left`; `out` is accepted
    /// as a synonym so synthetic fixtures read naturally.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "in" => Some(Self::In),
            "left" | "out" => Some(Self::Out),
            _ => None,
        }
    }
}

/// One player move between two clubs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransferRecord {
    /// Club the row was recorded for.
    pub team: String,
    /// The other club in the deal.
    pub counter_team: String,
    /// Whether the player joined or left the acting club.
    pub dir: Direction,
    /// Fee in base currency units (euros, not millions).
    pub fee: f64,
}

impl TransferRecord {
    /// Resolve the ordered (source, destination) club pair for the flow graph.
    ///
    /// Inbound: the counter-party is the source, the acting club the
    /// destination. Outbound: the reverse. Flipping this silently swaps the
    /// meaning of in-degree and out-degree downstream.
    pub fn flow(&self) -> (&str, &str) {
        match self.dir {
            Direction::In => (self.counter_team.as_str(), self.team.as_str()),
            Direction::Out => (self.team.as_str(), self.counter_team.as_str()),
        }
    }
}
