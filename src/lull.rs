//! Lull ("cold war") detection
//!
//! Finds sustained runs of days whose message volume falls well below a
//! trailing baseline. The message timeline is first turned into a dense daily
//! series (silent days count as zero), then each day is compared against the
//! mean of the days before it.

use crate::config::LullConfig;
use crate::types::{DailyCount, LullEvent, ParsedTranscript};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::debug;

/// Days of history required before a day can be judged low
pub const MIN_BASELINE_HISTORY_DAYS: usize = 3;

/// Baselines below this many messages per day are too quiet to judge against
pub const MIN_BASELINE_VOLUME: f64 = 3.0;

/// Lull detector over a parsed transcript
#[derive(Debug, Clone, Default)]
pub struct LullDetector {
    config: LullConfig,
}

impl LullDetector {
    pub fn new(config: LullConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LullConfig {
        &self.config
    }

    /// Detect lull events in chronological order
    pub fn detect(&self, transcript: &ParsedTranscript) -> Vec<LullEvent> {
        detect_lulls(
            transcript,
            self.config.drop_threshold,
            self.config.min_days,
            self.config.baseline_window,
        )
    }
}

/// Detect runs of at least `min_days` low days
///
/// A day is low when its count is at most `max(baseline * (1 - drop_threshold), 1)`,
/// where the baseline is the mean of up to `baseline_window` preceding days.
pub fn detect_lulls(
    transcript: &ParsedTranscript,
    drop_threshold: f64,
    min_days: usize,
    baseline_window: usize,
) -> Vec<LullEvent> {
    let series = daily_series(transcript);
    if series.is_empty() || series.len() < min_days {
        return Vec::new();
    }

    let counts: Vec<f64> = series.iter().map(|d| d.count as f64).collect();
    let low: Vec<bool> = (0..counts.len())
        .map(|i| is_low_day(&counts, i, drop_threshold, baseline_window))
        .collect();

    let events: Vec<LullEvent> = low_runs(&low)
        .into_iter()
        .filter(|&(start, end)| end - start + 1 >= min_days.max(1))
        .map(|(start, end)| LullEvent {
            start_date: series[start].date,
            end_date: series[end].date,
            percent_drop: percent_drop(&counts, start, end, baseline_window),
        })
        .collect();

    debug!(
        days = series.len(),
        low_days = low.iter().filter(|&&l| l).count(),
        events = events.len(),
        "lull detection complete"
    );

    events
}

/// Dense per-day message counts from the first to the last active day
pub fn daily_series(transcript: &ParsedTranscript) -> Vec<DailyCount> {
    let mut by_day: BTreeMap<NaiveDate, u32> = BTreeMap::new();
    for message in &transcript.messages {
        *by_day.entry(message.timestamp.date()).or_insert(0) += 1;
    }

    let (Some((&first, _)), Some((&last, _))) = (by_day.first_key_value(), by_day.last_key_value())
    else {
        return Vec::new();
    };

    first
        .iter_days()
        .take_while(|date| *date <= last)
        .map(|date| DailyCount {
            date,
            count: by_day.get(&date).copied().unwrap_or(0),
        })
        .collect()
}

/// Mean of up to `window` values immediately before index `end`
fn trailing_mean(counts: &[f64], end: usize, window: usize) -> Option<(f64, usize)> {
    let history = &counts[end.saturating_sub(window)..end];
    if history.is_empty() {
        return None;
    }
    let sum: f64 = history.iter().sum();
    Some((sum / history.len() as f64, history.len()))
}

fn is_low_day(counts: &[f64], i: usize, drop_threshold: f64, window: usize) -> bool {
    match trailing_mean(counts, i, window) {
        Some((baseline, days))
            if days >= MIN_BASELINE_HISTORY_DAYS && baseline >= MIN_BASELINE_VOLUME =>
        {
            counts[i] <= (baseline * (1.0 - drop_threshold)).max(1.0)
        }
        _ => false,
    }
}

/// Maximal runs of `true`, as inclusive index ranges
fn low_runs(flags: &[bool]) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut run_start: Option<usize> = None;

    for (i, &flag) in flags.iter().enumerate() {
        match (flag, run_start) {
            (true, None) => run_start = Some(i),
            (false, Some(start)) => {
                runs.push((start, i - 1));
                run_start = None;
            }
            _ => {}
        }
    }

    // A run still open at the end closes on the last day
    if let Some(start) = run_start {
        runs.push((start, flags.len() - 1));
    }

    runs
}

/// Drop of the run's mean against the baseline right before it, 0-100
fn percent_drop(counts: &[f64], start: usize, end: usize, window: usize) -> u8 {
    let run = &counts[start..=end];
    let run_avg = run.iter().sum::<f64>() / run.len() as f64;

    match trailing_mean(counts, start, window) {
        Some((baseline, _)) if baseline > 0.0 => {
            ((1.0 - run_avg / baseline) * 100.0).round().clamp(0.0, 100.0) as u8
        }
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Message, MessageType};
    use pretty_assertions::assert_eq;

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap() + chrono::Duration::days(offset)
    }

    /// One transcript day per entry, `count` messages spread across the day
    fn transcript_from_counts(counts: &[u32]) -> ParsedTranscript {
        let mut messages = Vec::new();
        for (offset, &count) in counts.iter().enumerate() {
            for n in 0..count {
                messages.push(Message {
                    timestamp: day(offset as i64).and_hms_opt(9 + n % 12, n % 60, 0).unwrap(),
                    sender: if n % 2 == 0 { "A" } else { "B" }.to_string(),
                    content: "hi".to_string(),
                    msg_type: MessageType::Text,
                });
            }
        }
        messages.sort_by_key(|m| m.timestamp);
        ParsedTranscript {
            messages,
            persons: vec!["A".to_string(), "B".to_string()],
            ..Default::default()
        }
    }

    fn default_detect(transcript: &ParsedTranscript) -> Vec<LullEvent> {
        LullDetector::default().detect(transcript)
    }

    #[test]
    fn test_empty_transcript() {
        assert!(default_detect(&ParsedTranscript::default()).is_empty());
        assert!(daily_series(&ParsedTranscript::default()).is_empty());
    }

    #[test]
    fn test_dense_series_fills_gaps() {
        let mut counts = vec![0; 10];
        counts[0] = 2;
        counts[4] = 1;
        counts[9] = 3;
        let series = daily_series(&transcript_from_counts(&counts));

        assert_eq!(series.len(), 10);
        assert_eq!(series[0], DailyCount { date: day(0), count: 2 });
        assert_eq!(series[1], DailyCount { date: day(1), count: 0 });
        assert_eq!(series[4].count, 1);
        assert_eq!(series[9], DailyCount { date: day(9), count: 3 });
        for pair in series.windows(2) {
            assert_eq!((pair[1].date - pair[0].date).num_days(), 1);
        }
    }

    #[test]
    fn test_short_span_never_yields_events() {
        let transcript = transcript_from_counts(&[20, 20, 20, 0, 0, 1]);
        for threshold in [0.05, 0.5, 0.65, 0.95] {
            assert!(detect_lulls(&transcript, threshold, 7, 30).is_empty());
        }
    }

    #[test]
    fn test_forty_day_scenario() {
        let mut counts = vec![20; 40];
        for c in &mut counts[14..24] {
            *c = 2;
        }
        let events = default_detect(&transcript_from_counts(&counts));

        assert_eq!(
            events,
            vec![LullEvent {
                start_date: day(14),
                end_date: day(23),
                percent_drop: 90,
            }]
        );
    }

    #[test]
    fn test_zero_dip_of_exactly_min_days() {
        let mut counts = vec![10; 30];
        counts.extend([0; 7]);
        counts.extend([10; 10]);
        let events = default_detect(&transcript_from_counts(&counts));

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].start_date, day(30));
        assert_eq!(events[0].end_date, day(36));
        assert_eq!(events[0].percent_drop, 100);
        assert_eq!(events[0].days(), 7);
    }

    #[test]
    fn test_dip_shorter_than_min_days_is_ignored() {
        let mut counts = vec![10; 30];
        counts.extend([0; 6]);
        counts.extend([10; 10]);
        assert!(default_detect(&transcript_from_counts(&counts)).is_empty());
    }

    #[test]
    fn test_run_through_last_day_is_closed() {
        let mut counts = vec![12; 20];
        counts.extend([1; 8]);
        let events = default_detect(&transcript_from_counts(&counts));

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].start_date, day(20));
        assert_eq!(events[0].end_date, day(27));
        assert_eq!(events[0].percent_drop, 92);
    }

    #[test]
    fn test_quiet_chat_has_no_baseline() {
        // Baseline stays under the volume floor, so nothing can be judged low
        let mut counts = vec![2; 20];
        counts.extend([0; 10]);
        counts.push(2);
        assert!(default_detect(&transcript_from_counts(&counts)).is_empty());
    }

    #[test]
    fn test_first_days_lack_history() {
        // Days 1-3 have fewer than three days of history even though they are low
        let counts = [30, 1, 1, 1, 1, 1, 1, 1, 30];
        let events = detect_lulls(&transcript_from_counts(&counts), 0.65, 3, 30);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].start_date, day(3));
        assert_eq!(events[0].end_date, day(7));
    }

    #[test]
    fn test_custom_threshold() {
        let mut counts = vec![20; 30];
        counts.extend([10; 7]);
        counts.extend([20; 5]);
        let transcript = transcript_from_counts(&counts);

        // Halving the volume is not a 65% drop
        assert!(detect_lulls(&transcript, 0.65, 7, 30).is_empty());

        let events = detect_lulls(&transcript, 0.4, 7, 30);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].percent_drop, 50);
    }

    #[test]
    fn test_detector_applies_its_config() {
        let mut counts = vec![20; 30];
        counts.extend([10; 7]);
        counts.extend([20; 5]);
        let transcript = transcript_from_counts(&counts);
        let config = LullConfig {
            drop_threshold: 0.4,
            min_days: 7,
            baseline_window: 30,
        };
        let detector = LullDetector::new(config);

        assert_eq!(detector.config(), &config);
        assert_eq!(detector.detect(&transcript), detect_lulls(&transcript, 0.4, 7, 30));
        assert_eq!(detector.detect(&transcript).len(), 1);
        assert!(LullDetector::default().detect(&transcript).is_empty());
    }

    #[test]
    fn test_low_runs() {
        assert_eq!(low_runs(&[]), vec![]);
        assert_eq!(low_runs(&[false, false]), vec![]);
        assert_eq!(
            low_runs(&[true, true, false, true, false, true, true]),
            vec![(0, 1), (3, 3), (5, 6)]
        );
    }
}
