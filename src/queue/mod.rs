// Queue tokens are handed out by a counter in join order and called
// lowest-first, so a token's place in line is fixed once assigned.

use serde::Serialize;

use crate::models::QueueEntry;

pub const DEFAULT_MINUTES_PER_TOKEN: u32 = 2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueStatus {
    pub token: u32,
    pub now_serving: u32,
    pub people_ahead: u32,
    pub estimated_wait_minutes: u32,
    pub progress: f64, // 0.0 at join, 1.0 when it's your turn
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueSummary {
    pub waiting: usize,
    pub next_token: Option<u32>,
}

// Steps from the token being served up to `token`, counting the one at the desk
fn ahead_of(token: u32, serving: u32) -> u32 {
    token.saturating_sub(serving)
}

pub fn queue_status(entry: &QueueEntry, now_serving: u32, minutes_per_token: u32) -> QueueStatus {
    let people_ahead = if entry.served { 0 } else { ahead_of(entry.token, now_serving) };
    let ahead_at_join = ahead_of(entry.token, entry.serving_at_join);

    let progress = if ahead_at_join == 0 {
        1.0
    } else {
        (1.0 - people_ahead as f64 / ahead_at_join as f64).clamp(0.0, 1.0)
    };

    QueueStatus {
        token: entry.token,
        now_serving,
        people_ahead,
        estimated_wait_minutes: people_ahead.saturating_mul(minutes_per_token),
        progress,
    }
}

pub fn queue_summary(waiting: &[QueueEntry]) -> QueueSummary {
    QueueSummary {
        waiting: waiting.iter().filter(|entry| !entry.served).count(),
        next_token: waiting
            .iter()
            .filter(|entry| !entry.served)
            .map(|entry| entry.token)
            .min(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(token: u32, serving_at_join: u32) -> QueueEntry {
        QueueEntry {
            token,
            name: format!("voter-{}", token),
            joined_at: Utc::now(),
            serving_at_join,
            served: false,
        }
    }

    #[test]
    fn next_in_line_waits_for_the_one_at_the_desk() {
        let status = queue_status(&entry(101, 100), 100, DEFAULT_MINUTES_PER_TOKEN);
        assert_eq!(status.people_ahead, 1);
        assert_eq!(status.estimated_wait_minutes, 2);
        assert_eq!(status.progress, 0.0);

        let called = queue_status(&entry(101, 100), 101, DEFAULT_MINUTES_PER_TOKEN);
        assert_eq!((called.people_ahead, called.progress), (0, 1.0));
    }

    #[test]
    fn wait_shrinks_as_tokens_are_called() {
        let ticket = entry(105, 100);
        let at_join = queue_status(&ticket, 100, DEFAULT_MINUTES_PER_TOKEN);
        assert_eq!(at_join.people_ahead, 5);
        assert_eq!(at_join.estimated_wait_minutes, 10);
        assert_eq!(at_join.progress, 0.0);

        let later = queue_status(&ticket, 102, DEFAULT_MINUTES_PER_TOKEN);
        assert_eq!(later.people_ahead, 3);
        assert_eq!(later.estimated_wait_minutes, 6);
        assert!((later.progress - 0.4).abs() < 1e-9);
    }

    #[test]
    fn served_or_passed_tokens_wait_for_nothing() {
        let mut ticket = entry(3, 0);
        assert_eq!(queue_status(&ticket, 7, 5).people_ahead, 0);
        ticket.served = true;
        let status = queue_status(&ticket, 3, 5);
        assert_eq!((status.people_ahead, status.progress), (0, 1.0));
    }

    #[test]
    fn summary_points_at_the_lowest_waiting_token() {
        let mut served = entry(1, 0);
        served.served = true;
        let summary = queue_summary(&[served, entry(3, 0), entry(2, 0)]);
        assert_eq!(summary.waiting, 2);
        assert_eq!(summary.next_token, Some(2));
        assert_eq!(queue_summary(&[]).next_token, None);
    }
}
