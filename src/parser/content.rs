//! Message content interpretation
//!
//! Classifies message bodies (media markers, links, emoji tokens), recognizes
//! money-transfer notices and reads call durations.

use crate::types::{MessageType, TransferRecord};
use chrono::NaiveDateTime;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

pub(crate) static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)https?://\S+|www\.\S+").expect("Invalid regex: URL pattern")
});

// ASCII words only, so parenthesized CJK text such as (哈哈) is kept
static EMOJI_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\([a-zA-Z]+(?:\s+[a-zA-Z]+){0,3}\)").expect("Invalid regex: emoji token")
});

static TRANSFER_SEND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"已將NT\$\s*([\d,]+)\s*轉帳給(.+?)[。.]").expect("Invalid regex: transfer send")
});

static TRANSFER_RECEIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"您已收到NT\$\s*([\d,]+)[。.]（來自：(.+?)）")
        .expect("Invalid regex: transfer receive")
});

static TRANSFER_RECEIVE_SHORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"收到NT\$\s*([\d,]+)\s*的轉帳[。.]").expect("Invalid regex: transfer receive short")
});

static LABELED_DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:通話時間|Duration)\s*(?:(\d+):)?(\d{1,2}):(\d{2})")
        .expect("Invalid regex: labeled call duration")
});

static BARE_DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:(\d+):)?(\d{1,2}):(\d{2})\b").expect("Invalid regex: call duration")
});

/// Substrings that mark a call as missed or cancelled
pub const MISSED_CALL_MARKERS: [&str; 6] =
    ["未接來電", "已取消", "未接", "Missed", "Canceled", "Cancelled"];

/// Exact-match media marker lookup
pub fn media_marker(content: &str) -> Option<MessageType> {
    match content.trim() {
        "[貼圖]" | "[Sticker]" => Some(MessageType::Sticker),
        "[照片]" | "[Photo]" => Some(MessageType::Photo),
        "[影片]" | "[Video]" => Some(MessageType::Video),
        "[檔案]" | "[File]" => Some(MessageType::File),
        _ => None,
    }
}

/// Classify a message body and return the content to store with it
pub fn classify(content: &str) -> (String, MessageType) {
    match media_marker(content) {
        Some(kind) => (content.to_string(), kind),
        None => clean_content(content),
    }
}

/// Strip URLs and emoji tokens from text content
///
/// A body that strips down to nothing keeps its original content and becomes
/// `Link` when it held a URL, `Emoji` otherwise (this includes empty and
/// whitespace-only bodies). Otherwise the stripped text is returned as `Text`.
/// Applying this to its own output is a no-op.
pub fn clean_content(content: &str) -> (String, MessageType) {
    let cleaned = strip_tokens(content);
    if cleaned.is_empty() {
        let kind = if URL_RE.is_match(content) {
            MessageType::Link
        } else {
            MessageType::Emoji
        };
        return (content.to_string(), kind);
    }
    (cleaned, MessageType::Text)
}

/// Remove tokens until nothing changes, so nested tokens cannot resurface
fn strip_tokens(content: &str) -> String {
    let mut current = content.trim().to_string();
    loop {
        let without_urls = URL_RE.replace_all(&current, "");
        let next = EMOJI_TOKEN_RE
            .replace_all(&without_urls, "")
            .trim()
            .to_string();
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Recognize a transfer notice in a message body
///
/// `persons` must already include `sender`. The short receive notice names no
/// payer; in a two-person chat the payer is the other participant, otherwise
/// the payer is left empty.
pub fn detect_transfer(
    content: &str,
    sender: &str,
    persons: &BTreeSet<String>,
    timestamp: NaiveDateTime,
) -> Option<TransferRecord> {
    if let Some(caps) = TRANSFER_SEND_RE.captures(content) {
        if let Some(amount) = parse_amount(&caps[1]) {
            return Some(TransferRecord {
                timestamp,
                sender: sender.to_string(),
                receiver: caps[2].trim().to_string(),
                amount,
            });
        }
    }

    if let Some(caps) = TRANSFER_RECEIVE_RE.captures(content) {
        if let Some(amount) = parse_amount(&caps[1]) {
            return Some(TransferRecord {
                timestamp,
                sender: caps[2].trim().to_string(),
                receiver: sender.to_string(),
                amount,
            });
        }
    }

    if let Some(caps) = TRANSFER_RECEIVE_SHORT_RE.captures(content) {
        if let Some(amount) = parse_amount(&caps[1]) {
            return Some(TransferRecord {
                timestamp,
                sender: infer_other_participant(sender, persons).unwrap_or_default(),
                receiver: sender.to_string(),
                amount,
            });
        }
    }

    None
}

/// The single participant other than `sender`, if there is exactly one
fn infer_other_participant(sender: &str, persons: &BTreeSet<String>) -> Option<String> {
    let mut others = persons.iter().filter(|p| p.as_str() != sender);
    match (others.next(), others.next()) {
        (Some(other), None) => Some(other.clone()),
        _ => None,
    }
}

/// Amount with optional thousands separators, e.g. `1,200`
fn parse_amount(raw: &str) -> Option<u64> {
    let digits: String = raw.chars().filter(|c| *c != ',').collect();
    digits.parse().ok()
}

/// Call length in seconds; 0 for missed or cancelled calls
///
/// A duration whose hour field does not fit counts as no duration.
pub fn parse_call_duration(text: &str) -> u32 {
    if MISSED_CALL_MARKERS.iter().any(|marker| text.contains(marker)) {
        return 0;
    }

    let Some(caps) = LABELED_DURATION_RE
        .captures(text)
        .or_else(|| BARE_DURATION_RE.captures(text))
    else {
        return 0;
    };

    // Absent hours are zero; a present field must parse
    let field = |idx: usize| -> Option<u32> {
        match caps.get(idx) {
            Some(m) => m.as_str().parse().ok(),
            None => Some(0),
        }
    };
    let (Some(hours), Some(minutes), Some(seconds)) = (field(1), field(2), field(3)) else {
        return 0;
    };
    hours
        .saturating_mul(3600)
        .saturating_add(minutes * 60)
        .saturating_add(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn persons(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_media_markers() {
        assert_eq!(media_marker("[貼圖]"), Some(MessageType::Sticker));
        assert_eq!(media_marker(" [Photo] "), Some(MessageType::Photo));
        assert_eq!(media_marker("[影片]"), Some(MessageType::Video));
        assert_eq!(media_marker("[File]"), Some(MessageType::File));
        assert_eq!(media_marker("look [Photo]"), None);
    }

    #[test]
    fn test_classify_keeps_marker_content() {
        assert_eq!(
            classify("[Sticker]"),
            ("[Sticker]".to_string(), MessageType::Sticker)
        );
    }

    #[test]
    fn test_pure_url_is_link() {
        let (content, kind) = clean_content("https://example.com/a?b=c");
        assert_eq!(kind, MessageType::Link);
        assert_eq!(content, "https://example.com/a?b=c");

        let (_, kind) = clean_content("www.example.com");
        assert_eq!(kind, MessageType::Link);
    }

    #[test]
    fn test_pure_emoji_is_emoji() {
        let (content, kind) = clean_content("(salute)(toilet thumbs up)");
        assert_eq!(kind, MessageType::Emoji);
        assert_eq!(content, "(salute)(toilet thumbs up)");
    }

    #[test]
    fn test_mixed_content_is_stripped() {
        assert_eq!(
            clean_content("see this https://example.com (smile)"),
            ("see this".to_string(), MessageType::Text)
        );
    }

    #[test]
    fn test_cjk_parentheses_are_kept() {
        assert_eq!(
            clean_content("(哈哈)"),
            ("(哈哈)".to_string(), MessageType::Text)
        );
    }

    #[test]
    fn test_empty_content_is_emoji() {
        assert_eq!(clean_content(""), (String::new(), MessageType::Emoji));
        assert_eq!(
            clean_content("   "),
            ("   ".to_string(), MessageType::Emoji)
        );
    }

    #[test]
    fn test_cleaning_is_idempotent() {
        let samples = [
            "hello",
            "  hi (smile) there  ",
            "((smile)smile)",
            "(a (b) c)",
            "https://x.io/(smile) text",
            "(smile)",
            "www.a.com",
            "",
            "   ",
            "tab\tinside (wink)",
            "(哈哈) (laugh)",
        ];
        for sample in samples {
            let (once, kind_once) = clean_content(sample);
            let (twice, kind_twice) = clean_content(&once);
            assert_eq!(once, twice, "content changed on second pass for {sample:?}");
            assert_eq!(kind_once, kind_twice, "type changed on second pass for {sample:?}");
        }
    }

    #[test]
    fn test_nested_emoji_tokens_fully_removed() {
        assert_eq!(
            clean_content("ok ((smile)smile)"),
            ("ok".to_string(), MessageType::Text)
        );
    }

    #[test]
    fn test_transfer_send() {
        let record = detect_transfer(
            "已將NT$ 1,200轉帳給阿明。",
            "小美",
            &persons(&["小美"]),
            ts(),
        )
        .unwrap();
        assert_eq!(record.sender, "小美");
        assert_eq!(record.receiver, "阿明");
        assert_eq!(record.amount, 1200);
    }

    #[test]
    fn test_transfer_receive_named_payer() {
        let record = detect_transfer(
            "您已收到NT$ 170。（來自：阿明）",
            "小美",
            &persons(&["小美"]),
            ts(),
        )
        .unwrap();
        assert_eq!(record.sender, "阿明");
        assert_eq!(record.receiver, "小美");
        assert_eq!(record.amount, 170);
    }

    #[test]
    fn test_transfer_receive_short_infers_other_person() {
        let record =
            detect_transfer("收到NT$300的轉帳。", "小美", &persons(&["小美", "阿明"]), ts())
                .unwrap();
        assert_eq!(record.sender, "阿明");
        assert_eq!(record.receiver, "小美");
        assert_eq!(record.amount, 300);
    }

    #[test]
    fn test_transfer_receive_short_unknown_payer() {
        let alone = detect_transfer("收到NT$300的轉帳。", "小美", &persons(&["小美"]), ts())
            .unwrap();
        assert_eq!(alone.sender, "");
        assert!(!alone.has_known_payer());

        let crowd = detect_transfer(
            "收到NT$300的轉帳。",
            "小美",
            &persons(&["小美", "阿明", "小華"]),
            ts(),
        )
        .unwrap();
        assert_eq!(crowd.sender, "");
    }

    #[test]
    fn test_not_a_transfer() {
        assert!(detect_transfer("NT$300 is a lot", "Amy", &persons(&["Amy"]), ts()).is_none());
        assert!(
            detect_transfer("已將NT$ ,轉帳給阿明。", "Amy", &persons(&["Amy"]), ts()).is_none()
        );
    }

    #[test]
    fn test_transfer_amount_overflow_rejected() {
        let max = format!("已將NT${}轉帳給阿明。", u64::MAX);
        let record = detect_transfer(&max, "Amy", &persons(&["Amy"]), ts()).unwrap();
        assert_eq!(record.amount, u64::MAX);

        let over = "已將NT$99,999,999,999,999,999,999轉帳給阿明。";
        assert!(detect_transfer(over, "Amy", &persons(&["Amy"]), ts()).is_none());
        assert_eq!(parse_amount("18446744073709551616"), None);
    }

    #[test]
    fn test_call_duration_minutes_seconds() {
        assert_eq!(parse_call_duration("通話時間 5:32"), 332);
        assert_eq!(parse_call_duration("Duration 05:32"), 332);
        assert_eq!(parse_call_duration("Call time 5:32"), 332);
    }

    #[test]
    fn test_call_duration_with_hours() {
        assert_eq!(parse_call_duration("通話時間1:23:45"), 5025);
        assert_eq!(parse_call_duration("Duration 2:00:00"), 7200);
    }

    #[test]
    fn test_missed_call_is_zero() {
        assert_eq!(parse_call_duration("未接來電"), 0);
        assert_eq!(parse_call_duration("Missed call 12:34"), 0);
        assert_eq!(parse_call_duration("Canceled Duration 1:00"), 0);
        assert_eq!(parse_call_duration("已取消"), 0);
    }

    #[test]
    fn test_call_without_duration_is_zero() {
        assert_eq!(parse_call_duration("Voice call"), 0);
    }

    #[test]
    fn test_call_duration_overflowing_hours_is_no_match() {
        assert_eq!(parse_call_duration("通話時間99999999999:00:00"), 0);
        assert_eq!(parse_call_duration("Duration 99999999999:12:34"), 0);
        assert_eq!(parse_call_duration("通話時間1000:00:00"), 3_600_000);
    }
}
