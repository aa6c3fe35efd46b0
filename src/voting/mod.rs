pub mod tally;
pub mod verification;

use serde::Serialize;

use crate::models::{Record, VoteRecord, VoterRecord};

pub use tally::compute_vote_summary;
pub use verification::compute_voter_summary;

// Derived statistics for the votes collection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoteSummary {
    pub total_votes: u64,
    pub leader: Option<VoteRecord>,
    pub standings: Vec<Standing>, // One per record, in snapshot order
}

// One candidate's share of the total
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Standing {
    pub id: String,
    pub candidate: String,
    pub vote_count: u64,
    pub percentage: f64,
}

// Derived statistics for the voters collection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoterSummary {
    pub total_voters: usize,
    pub verified_count: usize,
    pub pending_count: usize,
    pub verified_ratio: f64,
}

// A record type whose snapshots reduce to a summary.
pub trait Summarize: Record {
    type Summary: std::fmt::Debug + Clone + Send + 'static;

    fn summarize(records: &[Self]) -> Self::Summary;
}

impl Summarize for VoteRecord {
    type Summary = VoteSummary;

    fn summarize(records: &[Self]) -> VoteSummary {
        compute_vote_summary(records)
    }
}

impl Summarize for VoterRecord {
    type Summary = VoterSummary;

    fn summarize(records: &[Self]) -> VoterSummary {
        compute_voter_summary(records)
    }
}

// Rounds a percentage to one decimal place for display.
pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

// Share of `part` in `whole` as a percentage, 0 when `whole` is empty
pub(crate) fn percentage(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        (part * 100.0 / whole).clamp(0.0, 100.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_tenth_keeps_one_decimal() {
        assert_eq!(round_tenth(66.666_666), 66.7);
        assert_eq!(round_tenth(30.0), 30.0);
        assert_eq!(round_tenth(0.04), 0.0);
    }

    #[test]
    fn percentage_of_empty_whole_is_zero() {
        assert_eq!(percentage(5.0, 0.0), 0.0);
        assert_eq!(percentage(1.0, 4.0), 25.0);
    }
}
