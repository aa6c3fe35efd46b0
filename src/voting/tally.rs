use crate::models::VoteRecord;
use crate::voting::{Standing, VoteSummary, percentage};

pub fn compute_vote_summary(records: &[VoteRecord]) -> VoteSummary {
    let total_votes = records
        .iter()
        .fold(0u64, |sum, record| sum.saturating_add(record.vote_count));

    // First record holding the maximum count wins a tie
    let leader = records
        .iter()
        .reduce(|best, record| if record.vote_count > best.vote_count { record } else { best })
        .cloned();

    let standings = records
        .iter()
        .map(|record| Standing {
            id: record.id.clone(),
            candidate: record.candidate.clone(),
            vote_count: record.vote_count,
            percentage: percentage(record.vote_count as f64, total_votes as f64),
        })
        .collect();

    VoteSummary {
        total_votes,
        leader,
        standings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voting::round_tenth;
    use chrono::{TimeZone, Utc};

    fn vote(id: &str, candidate: &str, vote_count: u64) -> VoteRecord {
        VoteRecord {
            id: id.to_string(),
            candidate: candidate.to_string(),
            vote_count,
            recorded_at: Utc.with_ymd_and_hms(2024, 4, 19, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn empty_snapshot_is_zeroed() {
        let summary = compute_vote_summary(&[]);
        assert_eq!(summary.total_votes, 0);
        assert!(summary.leader.is_none());
        assert!(summary.standings.is_empty());
    }

    #[test]
    fn two_candidates() {
        let summary = compute_vote_summary(&[vote("1", "A", 30), vote("2", "B", 70)]);
        assert_eq!(summary.total_votes, 100);
        assert_eq!(summary.leader.map(|l| l.candidate), Some("B".to_string()));
        let shares: Vec<f64> = summary.standings.iter().map(|s| s.percentage).collect();
        assert_eq!(shares, vec![30.0, 70.0]);
    }

    #[test]
    fn tie_goes_to_the_first_listed() {
        let summary = compute_vote_summary(&[
            vote("1", "A", 5),
            vote("2", "B", 12),
            vote("3", "C", 12),
        ]);
        assert_eq!(summary.leader.map(|l| l.id), Some("2".to_string()));
    }

    #[test]
    fn leader_has_the_highest_count() {
        let records = vec![vote("1", "A", 3), vote("2", "B", 9), vote("3", "C", 4)];
        let summary = compute_vote_summary(&records);
        let leader = summary.leader.expect("leader");
        assert!(records.iter().all(|r| leader.vote_count >= r.vote_count));
        assert!(records.iter().all(|r| summary.total_votes >= r.vote_count));
    }

    #[test]
    fn shares_add_up_to_one_hundred() {
        let summary = compute_vote_summary(&[
            vote("1", "A", 1),
            vote("2", "B", 1),
            vote("3", "C", 1),
        ]);
        let sum: f64 = summary.standings.iter().map(|s| s.percentage).sum();
        assert!((sum - 100.0).abs() < 1e-9);
        assert_eq!(round_tenth(summary.standings[0].percentage), 33.3);
    }

    #[test]
    fn all_zero_counts_give_zero_shares() {
        let summary = compute_vote_summary(&[vote("1", "A", 0), vote("2", "B", 0)]);
        assert_eq!(summary.total_votes, 0);
        assert_eq!(summary.leader.map(|l| l.id), Some("1".to_string()));
        assert!(summary.standings.iter().all(|s| s.percentage == 0.0));
    }

    #[test]
    fn same_snapshot_same_summary() {
        let records = vec![vote("1", "A", 4), vote("2", "B", 6)];
        assert_eq!(compute_vote_summary(&records), compute_vote_summary(&records));
    }
}
