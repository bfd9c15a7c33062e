//! Time-of-day patterns
//!
//! Derives when conversations happen:
//! - Weekday × hour activity heatmap
//! - Daily per-participant message trend
//! - Goodnight/good-morning habits and bedtime chat length

use crate::parser::content::URL_RE;
use crate::types::{
    GoodnightAnalysis, Message, MessageType, ParsedTranscript, TimePatterns, TrendPoint,
};
use chrono::{Datelike, NaiveDate, Timelike};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Goodnight messages only count from this hour on
pub const GOODNIGHT_FROM_HOUR: u32 = 21;

/// Good-morning messages count within `[start, end)`
pub const GOODMORNING_HOURS: (u32, u32) = (5, 12);

/// Evening window used for the last-chat time
pub const LAST_CHAT_FROM_HOUR: u32 = 20;

/// Bedtime chat window start
pub const BEDTIME_FROM_HOUR: u32 = 22;

/// Gap that ends a bedtime conversation block
pub const BEDTIME_BLOCK_GAP_SECS: i64 = 600;

static GOODNIGHT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(晚安|good\s*night\b|睡了|想睡|睡覺)").expect("Invalid regex: goodnight")
});

static GOODMORNING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(早安|早～|早啊|good\s*morning\b|起床了)")
        .expect("Invalid regex: good morning")
});

/// Compute heatmap, trend and bedtime habits
pub fn compute_time_patterns(transcript: &ParsedTranscript) -> TimePatterns {
    TimePatterns {
        heatmap: build_heatmap(&transcript.messages),
        trend: build_trend(&transcript.messages, &transcript.persons),
        goodnight_analysis: build_goodnight(&transcript.messages),
    }
}

fn build_heatmap(messages: &[Message]) -> [[u32; 24]; 7] {
    let mut grid = [[0u32; 24]; 7];
    for m in messages {
        let weekday = m.timestamp.weekday().num_days_from_monday() as usize;
        grid[weekday][m.timestamp.hour() as usize] += 1;
    }
    grid
}

fn build_trend(messages: &[Message], persons: &[String]) -> Vec<TrendPoint> {
    let mut buckets: BTreeMap<NaiveDate, BTreeMap<String, u32>> = BTreeMap::new();
    for m in messages {
        let counts = buckets
            .entry(m.timestamp.date())
            .or_insert_with(|| persons.iter().map(|p| (p.clone(), 0)).collect());
        *counts.entry(m.sender.clone()).or_insert(0) += 1;
    }

    buckets
        .into_iter()
        .map(|(period, counts)| TrendPoint { period, counts })
        .collect()
}

/// Greeting match on text messages, ignoring anything inside URLs
fn is_greeting(message: &Message, pattern: &Regex) -> bool {
    message.msg_type == MessageType::Text
        && pattern.is_match(&URL_RE.replace_all(&message.content, ""))
}

fn build_goodnight(messages: &[Message]) -> GoodnightAnalysis {
    let mut by_date: BTreeMap<NaiveDate, Vec<&Message>> = BTreeMap::new();
    for m in messages {
        by_date.entry(m.timestamp.date()).or_default().push(m);
    }

    let mut goodnight_first: BTreeMap<String, u32> = BTreeMap::new();
    let mut goodmorning_first: BTreeMap<String, u32> = BTreeMap::new();
    let mut last_chat_hours: Vec<f64> = Vec::new();
    let mut bedtime_minutes: Vec<f64> = Vec::new();

    for day in by_date.values() {
        if let Some(m) = day
            .iter()
            .find(|m| m.timestamp.hour() >= GOODNIGHT_FROM_HOUR && is_greeting(m, &GOODNIGHT_RE))
        {
            *goodnight_first.entry(m.sender.clone()).or_insert(0) += 1;
        }

        let (morning_start, morning_end) = GOODMORNING_HOURS;
        if let Some(m) = day.iter().find(|m| {
            (morning_start..morning_end).contains(&m.timestamp.hour())
                && is_greeting(m, &GOODMORNING_RE)
        }) {
            *goodmorning_first.entry(m.sender.clone()).or_insert(0) += 1;
        }

        if let Some(last) = day
            .iter()
            .filter(|m| m.timestamp.hour() >= LAST_CHAT_FROM_HOUR)
            .last()
        {
            let hour = last.timestamp.hour() as f64 + last.timestamp.minute() as f64 / 60.0;
            last_chat_hours.push(hour);
        }

        let night: Vec<&Message> = day
            .iter()
            .copied()
            .filter(|m| m.timestamp.hour() >= BEDTIME_FROM_HOUR)
            .collect();
        if let Some(minutes) = bedtime_block_minutes(&night) {
            bedtime_minutes.push(minutes);
        }
    }

    let avg_last_chat_time = mean(&last_chat_hours)
        .map(|h| (h * 10.0).round() / 10.0)
        .unwrap_or(0.0);
    let avg_bedtime_chat_minutes = mean(&bedtime_minutes).map(|m| m.round() as u64).unwrap_or(0);

    GoodnightAnalysis {
        who_says_goodnight_first: goodnight_first,
        who_says_goodmorning_first: goodmorning_first,
        avg_last_chat_time,
        avg_bedtime_chat_minutes,
        bedtime_chat_count: bedtime_minutes.len() as u32,
    }
}

/// Length of the final late-night block, walking back while gaps stay short
fn bedtime_block_minutes(night: &[&Message]) -> Option<f64> {
    if night.len() < 2 {
        return None;
    }
    let end = night[night.len() - 1].timestamp;
    let mut block_start = end;
    for pair in night.windows(2).rev() {
        let gap = (pair[1].timestamp - pair[0].timestamp).num_seconds();
        if gap > BEDTIME_BLOCK_GAP_SECS {
            break;
        }
        block_start = pair[0].timestamp;
    }

    let minutes = (end - block_start).num_seconds() as f64 / 60.0;
    (minutes >= 1.0).then_some(minutes)
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use pretty_assertions::assert_eq;

    // 2024-01-15 is a Monday
    fn at(d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    fn text(sender: &str, timestamp: NaiveDateTime, content: &str) -> Message {
        Message {
            timestamp,
            sender: sender.to_string(),
            content: content.to_string(),
            msg_type: MessageType::Text,
        }
    }

    fn transcript(messages: Vec<Message>) -> ParsedTranscript {
        ParsedTranscript {
            messages,
            persons: vec!["A".to_string(), "B".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_heatmap_positions() {
        let patterns = compute_time_patterns(&transcript(vec![
            text("A", at(15, 9, 0), "hi"),
            text("B", at(15, 9, 30), "hey"),
            text("A", at(21, 23, 10), "late"),
        ]));
        assert_eq!(patterns.heatmap[0][9], 2);
        assert_eq!(patterns.heatmap[6][23], 1);
        let total: u32 = patterns.heatmap.iter().flatten().sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn test_trend_lists_every_participant() {
        let patterns = compute_time_patterns(&transcript(vec![
            text("A", at(15, 9, 0), "hi"),
            text("A", at(15, 9, 1), "again"),
            text("B", at(17, 9, 0), "hey"),
        ]));
        assert_eq!(
            patterns.trend,
            vec![
                TrendPoint {
                    period: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
                    counts: BTreeMap::from([("A".to_string(), 2), ("B".to_string(), 0)]),
                },
                TrendPoint {
                    period: NaiveDate::from_ymd_opt(2024, 1, 17).unwrap(),
                    counts: BTreeMap::from([("A".to_string(), 0), ("B".to_string(), 1)]),
                },
            ]
        );
    }

    #[test]
    fn test_goodnight_and_goodmorning_first() {
        let patterns = compute_time_patterns(&transcript(vec![
            text("B", at(15, 7, 30), "Good morning!"),
            text("A", at(15, 7, 31), "早安"),
            // Too early in the evening to count
            text("A", at(15, 20, 0), "good night soon"),
            text("B", at(15, 22, 40), "晚安"),
            text("A", at(15, 22, 41), "晚安～"),
            text("A", at(16, 21, 5), "goodnight"),
            text("B", at(16, 21, 6), "https://goodnight.example.com"),
        ]));
        let gn = patterns.goodnight_analysis;
        assert_eq!(
            gn.who_says_goodnight_first,
            BTreeMap::from([("A".to_string(), 1), ("B".to_string(), 1)])
        );
        assert_eq!(
            gn.who_says_goodmorning_first,
            BTreeMap::from([("B".to_string(), 1)])
        );
    }

    #[test]
    fn test_greeting_ignores_non_text_and_urls() {
        let mut link = text("A", at(15, 22, 0), "https://example.com/goodnight");
        link.msg_type = MessageType::Link;
        let patterns = compute_time_patterns(&transcript(vec![
            link,
            text("B", at(15, 22, 1), "see http://x.io/晚安"),
        ]));
        assert!(patterns.goodnight_analysis.who_says_goodnight_first.is_empty());
    }

    #[test]
    fn test_last_chat_time_average() {
        let patterns = compute_time_patterns(&transcript(vec![
            text("A", at(15, 20, 30), "a"),
            text("B", at(15, 22, 0), "b"),
            text("A", at(16, 23, 0), "c"),
            text("A", at(17, 10, 0), "morning only"),
        ]));
        // (22.0 + 23.0) / 2
        assert_eq!(patterns.goodnight_analysis.avg_last_chat_time, 22.5);
    }

    #[test]
    fn test_bedtime_block() {
        let patterns = compute_time_patterns(&transcript(vec![
            text("A", at(15, 22, 0), "early block"),
            text("B", at(15, 22, 5), "still early"),
            // 20 minute gap ends the walk back
            text("A", at(15, 22, 25), "start"),
            text("B", at(15, 22, 30), "mid"),
            text("A", at(15, 22, 37), "end"),
            // Single late message is not a block
            text("A", at(16, 23, 0), "alone"),
        ]));
        let gn = patterns.goodnight_analysis;
        assert_eq!(gn.bedtime_chat_count, 1);
        assert_eq!(gn.avg_bedtime_chat_minutes, 12);
    }

    #[test]
    fn test_empty_transcript() {
        let patterns = compute_time_patterns(&ParsedTranscript::default());
        assert!(patterns.trend.is_empty());
        assert_eq!(patterns.goodnight_analysis, GoodnightAnalysis::default());
        assert!(patterns.heatmap.iter().flatten().all(|&c| c == 0));
    }
}
