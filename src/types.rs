//! Core data types for ChatPulse
//!
//! This module defines the transcript event model produced by the parser and
//! the report types produced by the analyzers that consume it.

use crate::reply::{HALF_HOUR_REPLY_SECS, INSTANT_REPLY_SECS, REPLY_CAP_SECS, STREAK_GAP_SECS};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Transcript model
// ============================================================================

/// Message content classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Text,
    Sticker,
    Photo,
    Video,
    File,
    Link,
    Emoji,
    Transfer,
}

impl MessageType {
    /// Placeholder shown instead of the raw content for media-like messages.
    ///
    /// `None` means the content itself is meaningful (text and transfers).
    pub fn placeholder(&self) -> Option<&'static str> {
        match self {
            MessageType::Sticker => Some("[Sticker]"),
            MessageType::Photo => Some("[Photo]"),
            MessageType::Video => Some("[Video]"),
            MessageType::File => Some("[File]"),
            MessageType::Link => Some("[Link]"),
            MessageType::Emoji => Some("[Emoji]"),
            MessageType::Text | MessageType::Transfer => None,
        }
    }
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// When the message was sent (transcript local time, minute precision)
    pub timestamp: NaiveDateTime,
    /// Sender display name
    pub sender: String,
    /// Message text; continuation lines are newline-joined
    pub content: String,
    /// Content classification
    #[serde(rename = "type")]
    pub msg_type: MessageType,
}

/// A voice or video call entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRecord {
    pub timestamp: NaiveDateTime,
    /// Who placed the call; empty when the export omits the caller column
    pub caller: String,
    /// Call length in seconds, 0 for missed or cancelled calls
    pub duration_seconds: u32,
}

impl CallRecord {
    pub fn is_missed(&self) -> bool {
        self.duration_seconds == 0
    }
}

/// A money transfer between participants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRecord {
    pub timestamp: NaiveDateTime,
    /// Payer; empty when it could not be inferred
    pub sender: String,
    /// Payee
    pub receiver: String,
    /// Amount in whole currency units as written
    pub amount: u64,
}

impl TransferRecord {
    pub fn has_known_payer(&self) -> bool {
        !self.sender.is_empty()
    }
}

/// Structured result of parsing a transcript
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedTranscript {
    /// Messages in input order
    pub messages: Vec<Message>,
    /// Call entries in input order
    pub calls: Vec<CallRecord>,
    /// Transfers in input order (each also appears in `messages`)
    pub transfers: Vec<TransferRecord>,
    /// Sorted, de-duplicated participant names
    pub persons: Vec<String>,
}

impl ParsedTranscript {
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// First and last message dates, if any messages exist
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.messages.iter().map(|m| m.timestamp.date()).min()?;
        let last = self.messages.iter().map(|m| m.timestamp.date()).max()?;
        Some((first, last))
    }
}

// ============================================================================
// Lull detection
// ============================================================================

/// Message count for one calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: u32,
}

/// A sustained run of low-activity days
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LullEvent {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Drop relative to the preceding baseline, 0-100
    pub percent_drop: u8,
}

impl LullEvent {
    /// Number of calendar days covered, inclusive
    pub fn days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

// ============================================================================
// Reply behavior
// ============================================================================

/// Histogram of reply latencies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeedDistribution {
    #[serde(rename = "<1m")]
    pub under_1m: u32,
    #[serde(rename = "1-5m")]
    pub from_1_to_5m: u32,
    #[serde(rename = "5-30m")]
    pub from_5_to_30m: u32,
    #[serde(rename = "30m-1h")]
    pub from_30m_to_1h: u32,
    #[serde(rename = ">1h")]
    pub over_1h: u32,
}

impl SpeedDistribution {
    /// Count one reply sample into its bucket
    pub fn record(&mut self, delta_secs: i64) {
        match delta_secs {
            d if d <= INSTANT_REPLY_SECS => self.under_1m += 1,
            d if d <= STREAK_GAP_SECS => self.from_1_to_5m += 1,
            d if d <= HALF_HOUR_REPLY_SECS => self.from_5_to_30m += 1,
            d if d <= REPLY_CAP_SECS => self.from_30m_to_1h += 1,
            _ => self.over_1h += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.under_1m + self.from_1_to_5m + self.from_5_to_30m + self.from_30m_to_1h + self.over_1h
    }
}

/// Longest run of rapid-fire messages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LongestStreak {
    pub count: u32,
    /// Date of the first message of the run
    pub date: Option<NaiveDate>,
}

/// Per-participant responsiveness metrics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyReport {
    /// Share of replies sent within a minute, 0-100
    pub instant_reply_rate: BTreeMap<String, f64>,
    /// Mean reply latency in seconds over replies within the cap
    pub avg_reply_time: BTreeMap<String, u64>,
    pub speed_distribution: SpeedDistribution,
    pub longest_streak: LongestStreak,
    /// Unanswered-for-an-hour counts, keyed by the ignored participant
    pub left_on_read: BTreeMap<String, u32>,
}

// ============================================================================
// Time patterns
// ============================================================================

/// Message counts for one day, split by participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub period: NaiveDate,
    pub counts: BTreeMap<String, u32>,
}

/// Bedtime and greeting habits
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoodnightAnalysis {
    pub who_says_goodnight_first: BTreeMap<String, u32>,
    pub who_says_goodmorning_first: BTreeMap<String, u32>,
    /// Mean hour-of-day (fractional) of the last evening message
    pub avg_last_chat_time: f64,
    pub avg_bedtime_chat_minutes: u64,
    pub bedtime_chat_count: u32,
}

/// When conversations happen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimePatterns {
    /// Rows Monday..Sunday, columns hour 0..23
    pub heatmap: [[u32; 24]; 7],
    pub trend: Vec<TrendPoint>,
    pub goodnight_analysis: GoodnightAnalysis,
}

// ============================================================================
// Transfers
// ============================================================================

/// Money sent by one participant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonTransfers {
    pub sent: u64,
    pub count: u32,
}

/// Transfer totals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferSummary {
    pub total_amount: u64,
    pub total_count: u32,
    pub per_person: BTreeMap<String, PersonTransfers>,
}

// ============================================================================
// First conversation
// ============================================================================

/// A message rendered for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationLine {
    pub timestamp: NaiveDateTime,
    pub sender: String,
    pub content: String,
    #[serde(rename = "type")]
    pub msg_type: MessageType,
}

/// Opening exchange of the transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirstConversation {
    pub messages: Vec<ConversationLine>,
    pub start_date: NaiveDate,
    /// True when no burst was long enough and the leading messages were used instead
    pub is_fallback: bool,
}

// ============================================================================
// Combined report
// ============================================================================

/// Combined output of every analysis run over one transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub persons: Vec<String>,
    pub reply_behavior: ReplyReport,
    pub cold_wars: Vec<LullEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_patterns: Option<TimePatterns>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer_analysis: Option<TransferSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_conversation: Option<FirstConversation>,
}

/// Producer metadata stamped on every payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Producer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Span of the analyzed transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub total_days: i64,
}

/// Encoded report envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPayload {
    pub report_version: String,
    pub producer: Producer,
    /// When this payload was computed (RFC3339)
    pub computed_at_utc: String,
    pub date_range: DateRange,
    pub report: AnalysisReport,
}
