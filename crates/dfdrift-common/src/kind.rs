//! Distribution kinds.

use serde::{Deserialize, Serialize};

/// Which concrete distribution a store holds.
///
/// Two distributions can only be compared when their kinds match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionKind {
    /// Counts of directly-follows pairs.
    #[default]
    DirectlyFollows,
    /// Counts of single event labels.
    Activity,
}

impl std::str::FromStr for DistributionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "directly_follows" | "directly-follows" | "df" | "dfg" => {
                Ok(DistributionKind::DirectlyFollows)
            }
            "activity" | "activities" | "event_class" => Ok(DistributionKind::Activity),
            _ => Err(format!("unknown distribution kind: {}", s)),
        }
    }
}

impl std::fmt::Display for DistributionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DistributionKind::DirectlyFollows => write!(f, "directly_follows"),
            DistributionKind::Activity => write!(f, "activity"),
        }
    }
}
