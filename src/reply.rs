//! Reply behavior analysis
//!
//! A single pass over adjacent message pairs collects reply latencies,
//! conversation streaks and unanswered messages. Latencies are then
//! aggregated per participant.

use crate::types::{LongestStreak, Message, ParsedTranscript, ReplyReport, SpeedDistribution};
use chrono::{NaiveDate, Timelike};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Messages this close together belong to the same streak
pub const STREAK_GAP_SECS: i64 = 300;

/// Replies at or under this latency count as instant
pub const INSTANT_REPLY_SECS: i64 = 60;

/// Upper edge of the `5-30m` latency bucket
pub const HALF_HOUR_REPLY_SECS: i64 = 1800;

/// Replies slower than this are left out of the average
pub const REPLY_CAP_SECS: i64 = 3600;

/// Silence longer than this after someone else's message counts as left on read
pub const LEFT_ON_READ_SECS: i64 = 3600;

/// Last message at or after this hour may be followed by sleep
pub const SLEEP_LATE_HOUR: u32 = 20;

/// ...or before this hour (past midnight)
pub const SLEEP_EARLY_HOUR: u32 = 2;

/// Morning window for the message that ends a sleep gap, `[start, end)`
pub const WAKE_START_HOUR: u32 = 8;
pub const WAKE_END_HOUR: u32 = 12;

/// Elapsed-time window of a sleep gap, inclusive
pub const SLEEP_GAP_MIN_HOURS: f64 = 4.0;
pub const SLEEP_GAP_MAX_HOURS: f64 = 14.0;

/// Reply behavior analyzer
pub struct ReplyAnalyzer;

impl ReplyAnalyzer {
    /// Analyze a chronologically ordered transcript
    pub fn analyze(transcript: &ParsedTranscript) -> ReplyReport {
        analyze_replies(transcript)
    }
}

/// Whether the silence between two messages looks like an overnight sleep
pub fn is_sleep_gap(prev: &Message, curr: &Message) -> bool {
    let prev_hour = prev.timestamp.hour();
    let curr_hour = curr.timestamp.hour();

    let prev_before_sleep = prev_hour >= SLEEP_LATE_HOUR || prev_hour < SLEEP_EARLY_HOUR;
    let curr_after_wake = (WAKE_START_HOUR..WAKE_END_HOUR).contains(&curr_hour);
    let gap_hours = (curr.timestamp - prev.timestamp).num_seconds() as f64 / 3600.0;

    prev_before_sleep
        && curr_after_wake
        && (SLEEP_GAP_MIN_HOURS..=SLEEP_GAP_MAX_HOURS).contains(&gap_hours)
}

/// Running streak state
struct StreakTracker {
    current: u32,
    current_start: NaiveDate,
    longest: u32,
    longest_start: NaiveDate,
}

impl StreakTracker {
    fn new(first: &Message) -> Self {
        let date = first.timestamp.date();
        Self {
            current: 1,
            current_start: date,
            longest: 1,
            longest_start: date,
        }
    }

    fn step(&mut self, delta_secs: i64, msg: &Message) {
        if delta_secs <= STREAK_GAP_SECS {
            self.current += 1;
        } else {
            self.close();
            self.current = 1;
            self.current_start = msg.timestamp.date();
        }
    }

    fn close(&mut self) {
        if self.current > self.longest {
            self.longest = self.current;
            self.longest_start = self.current_start;
        }
    }

    fn finish(mut self) -> LongestStreak {
        self.close();
        LongestStreak {
            count: self.longest,
            date: Some(self.longest_start),
        }
    }
}

/// Compute per-participant reply metrics
///
/// Returns an all-zero report when there are fewer than two messages.
pub fn analyze_replies(transcript: &ParsedTranscript) -> ReplyReport {
    let messages = &transcript.messages;
    if messages.len() < 2 {
        return empty_report(&transcript.persons);
    }

    let mut reply_times: BTreeMap<&str, Vec<i64>> = BTreeMap::new();
    let mut speed_distribution = SpeedDistribution::default();
    let mut left_on_read: BTreeMap<String, u32> = BTreeMap::new();
    let mut streak = StreakTracker::new(&messages[0]);

    for pair in messages.windows(2) {
        let (prev, msg) = (&pair[0], &pair[1]);
        let delta = (msg.timestamp - prev.timestamp).num_seconds();
        let sender_changed = msg.sender != prev.sender;

        streak.step(delta, msg);

        if delta > LEFT_ON_READ_SECS && sender_changed && !is_sleep_gap(prev, msg) {
            *left_on_read.entry(prev.sender.clone()).or_insert(0) += 1;
        }

        // Follow-ups to one's own message are not replies
        if sender_changed && delta >= 0 {
            reply_times.entry(msg.sender.as_str()).or_default().push(delta);
            speed_distribution.record(delta);
        }
    }

    let participants: BTreeSet<&str> = transcript
        .persons
        .iter()
        .map(String::as_str)
        .chain(reply_times.keys().copied())
        .collect();

    let mut instant_reply_rate = BTreeMap::new();
    let mut avg_reply_time = BTreeMap::new();
    for person in participants {
        let times = reply_times.get(person).map(Vec::as_slice).unwrap_or_default();
        instant_reply_rate.insert(person.to_string(), instant_rate(times));
        avg_reply_time.insert(person.to_string(), capped_average(times));
    }

    let longest_streak = streak.finish();
    debug!(
        replies = speed_distribution.total(),
        longest_streak = longest_streak.count,
        left_on_read = left_on_read.values().sum::<u32>(),
        "reply analysis complete"
    );

    ReplyReport {
        instant_reply_rate,
        avg_reply_time,
        speed_distribution,
        longest_streak,
        left_on_read,
    }
}

/// Percentage of replies within the instant threshold, one decimal
fn instant_rate(times: &[i64]) -> f64 {
    if times.is_empty() {
        return 0.0;
    }
    let instant = times.iter().filter(|&&t| t <= INSTANT_REPLY_SECS).count();
    let pct = instant as f64 / times.len() as f64 * 100.0;
    (pct * 10.0).round() / 10.0
}

/// Mean of replies under the cap, whole seconds
fn capped_average(times: &[i64]) -> u64 {
    let active: Vec<i64> = times
        .iter()
        .copied()
        .filter(|&t| t <= REPLY_CAP_SECS)
        .collect();
    if active.is_empty() {
        return 0;
    }
    (active.iter().sum::<i64>() as f64 / active.len() as f64).round() as u64
}

fn empty_report(persons: &[String]) -> ReplyReport {
    ReplyReport {
        instant_reply_rate: persons.iter().map(|p| (p.clone(), 0.0)).collect(),
        avg_reply_time: persons.iter().map(|p| (p.clone(), 0)).collect(),
        speed_distribution: SpeedDistribution::default(),
        longest_streak: LongestStreak::default(),
        left_on_read: BTreeMap::new(),
    }
}
