use crate::models::VoterRecord;
use crate::voting::{VoterSummary, percentage};

pub fn compute_voter_summary(records: &[VoterRecord]) -> VoterSummary {
    let total_voters = records.len();
    let verified_count = records.iter().filter(|voter| voter.verified).count();

    VoterSummary {
        total_voters,
        verified_count,
        pending_count: total_voters - verified_count,
        verified_ratio: percentage(verified_count as f64, total_voters as f64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voting::round_tenth;
    use chrono::Utc;

    fn voter(name: &str, verified: bool) -> VoterRecord {
        VoterRecord {
            id: name.to_lowercase(),
            name: name.to_string(),
            email: format!("{}@example.org", name.to_lowercase()),
            verified,
            registered_at: Utc::now(),
        }
    }

    #[test]
    fn empty_snapshot_is_zeroed() {
        let summary = compute_voter_summary(&[]);
        assert_eq!(summary.total_voters, 0);
        assert_eq!(summary.verified_count, 0);
        assert_eq!(summary.pending_count, 0);
        assert_eq!(summary.verified_ratio, 0.0);
    }

    #[test]
    fn two_of_three_verified() {
        let summary = compute_voter_summary(&[
            voter("Bhuwin", true),
            voter("Dsp", false),
            voter("Nikhil", true),
        ]);
        assert_eq!(summary.total_voters, 3);
        assert_eq!(summary.verified_count, 2);
        assert_eq!(summary.pending_count, 1);
        assert_eq!(round_tenth(summary.verified_ratio), 66.7);
    }

    #[test]
    fn counts_always_partition_the_total() {
        let snapshots = vec![
            vec![voter("A", false)],
            vec![voter("A", true), voter("B", true)],
            vec![voter("A", false), voter("B", true), voter("C", false), voter("D", false)],
        ];
        for records in snapshots {
            let summary = compute_voter_summary(&records);
            assert_eq!(summary.verified_count + summary.pending_count, summary.total_voters);
            assert!((0.0..=100.0).contains(&summary.verified_ratio));
        }
    }

    #[test]
    fn same_snapshot_same_summary() {
        let records = vec![voter("A", true), voter("B", false)];
        assert_eq!(compute_voter_summary(&records), compute_voter_summary(&records));
    }
}
