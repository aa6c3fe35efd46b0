use serde::Serialize;
use std::fmt::Write;

use crate::queue::{QueueStatus, QueueSummary};
use crate::voting::{VoteSummary, VoterSummary, round_tenth};

// Admin dashboard counters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub total_voters: usize,
    pub verified: usize,
    pub queue_length: usize,
}

impl Dashboard {
    pub fn new(voters: &VoterSummary, queue: &QueueSummary) -> Self {
        Self {
            total_voters: voters.total_voters,
            verified: voters.verified_count,
            queue_length: queue.waiting,
        }
    }
}

pub fn render_vote_summary(summary: &VoteSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Total Votes: {}", summary.total_votes);

    match &summary.leader {
        Some(leader) => {
            let _ = writeln!(out, "Leading: \"{}\" ({} votes)", leader.candidate, leader.vote_count);
        }
        None => {
            out.push_str("No votes yet.\n");
            return out;
        }
    }

    out.push('\n');
    for standing in &summary.standings {
        let _ = writeln!(
            out,
            "\"{}\": {} votes ({:.1}%)",
            standing.candidate,
            standing.vote_count,
            round_tenth(standing.percentage)
        );
    }
    out
}

pub fn render_voter_summary(summary: &VoterSummary) -> String {
    format!(
        "Total: {}  Verified: {}  Pending: {}\nVerified {:.1}%\n",
        summary.total_voters,
        summary.verified_count,
        summary.pending_count,
        round_tenth(summary.verified_ratio)
    )
}

pub fn render_queue_status(status: &QueueStatus) -> String {
    let mut out = format!(
        "Token #{}\nNow serving: #{}\nPeople ahead: {}\nEstimated wait: {} min\n",
        status.token, status.now_serving, status.people_ahead, status.estimated_wait_minutes
    );
    let _ = writeln!(out, "{}% to your turn", (status.progress * 100.0).round());
    out
}

pub fn render_queue_summary(summary: &QueueSummary) -> String {
    let next = summary
        .next_token
        .map(|token| format!("#{}", token))
        .unwrap_or_else(|| "None".to_string());
    format!("In queue: {}\nNext token: {}\n", summary.waiting, next)
}

pub fn render_dashboard(dashboard: &Dashboard) -> String {
    format!(
        "Total Voters: {}\nVerified: {}\nQueue: {}\n",
        dashboard.total_voters, dashboard.verified, dashboard.queue_length
    )
}

pub fn to_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}
