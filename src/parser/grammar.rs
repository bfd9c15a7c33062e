//! Line grammar for exported transcripts
//!
//! Each line is one of: a date header, a call entry (with or without a caller
//! column), a message, or a tab-indented continuation of the previous message.
//! Timed lines share the `time<TAB>...` prefix, so they are matched through an
//! ordered list where call shapes come before the generic message shape.

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use std::sync::LazyLock;

/// Glyph that prefixes call entries
pub const CALL_MARKER: char = '☎';

/// Time token: `09:15`, `上午09:15`, `下午02:07`, `10:50 PM`, `6:05 am`
const TIME_PATTERN: &str = r"(?:[上下]午)?\d{1,2}:\d{2}(?:\s*[APap][Mm])?";

static DATE_HEADER_LOCALIZED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})/(\d{1,2})/(\d{1,2})（[一二三四五六日]）\s*$")
        .expect("Invalid regex: localized date header")
});

static DATE_HEADER_EN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})/(\d{1,2})/(\d{1,2}),\s*(?:Mon|Tue|Wed|Thu|Fri|Sat|Sun)\s*$")
        .expect("Invalid regex: English date header")
});

static CALL_3COL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^({TIME_PATTERN})\t(.+?)\t{CALL_MARKER}\s*(.+)$"))
        .expect("Invalid regex: 3-column call line")
});

static CALL_2COL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^({TIME_PATTERN})\t{CALL_MARKER}\s*(.+)$"))
        .expect("Invalid regex: 2-column call line")
});

static MESSAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^({TIME_PATTERN})\t(.+?)\t(.*)$")).expect("Invalid regex: message line")
});

/// A line that starts with a time token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimedLine<'a> {
    Call {
        time: &'a str,
        /// `None` for the 2-column shape
        caller: Option<&'a str>,
        text: &'a str,
    },
    Message {
        time: &'a str,
        sender: &'a str,
        content: &'a str,
    },
}

/// A named matcher for one timed-line shape
pub struct LineMatcher {
    pub name: &'static str,
    pub try_match: fn(&str) -> Option<TimedLine<'_>>,
}

/// Timed-line matchers in precedence order
pub static TIMED_LINE_MATCHERS: [LineMatcher; 3] = [
    LineMatcher {
        name: "call_3col",
        try_match: match_call_3col,
    },
    LineMatcher {
        name: "call_2col",
        try_match: match_call_2col,
    },
    LineMatcher {
        name: "message",
        try_match: match_message,
    },
];

/// Match a date header in either supported shape
pub fn match_date_header(line: &str) -> Option<NaiveDate> {
    let caps = DATE_HEADER_LOCALIZED_RE
        .captures(line)
        .or_else(|| DATE_HEADER_EN_RE.captures(line))?;

    let year = caps[1].parse().ok()?;
    let month = caps[2].parse().ok()?;
    let day = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Run the ordered matchers; the first hit wins
pub fn match_timed_line(line: &str) -> Option<TimedLine<'_>> {
    TIMED_LINE_MATCHERS
        .iter()
        .find_map(|matcher| (matcher.try_match)(line))
}

/// Text of a continuation line, without its leading tabs
pub fn match_continuation(line: &str) -> Option<&str> {
    if line.starts_with('\t') {
        Some(line.trim_start_matches('\t'))
    } else {
        None
    }
}

fn match_call_3col(line: &str) -> Option<TimedLine<'_>> {
    let caps = CALL_3COL_RE.captures(line)?;
    Some(TimedLine::Call {
        time: caps.get(1)?.as_str(),
        caller: Some(caps.get(2)?.as_str()),
        text: caps.get(3)?.as_str(),
    })
}

fn match_call_2col(line: &str) -> Option<TimedLine<'_>> {
    let caps = CALL_2COL_RE.captures(line)?;
    Some(TimedLine::Call {
        time: caps.get(1)?.as_str(),
        caller: None,
        text: caps.get(2)?.as_str(),
    })
}

fn match_message(line: &str) -> Option<TimedLine<'_>> {
    let caps = MESSAGE_RE.captures(line)?;
    Some(TimedLine::Message {
        time: caps.get(1)?.as_str(),
        sender: caps.get(2)?.as_str(),
        content: caps.get(3)?.as_str(),
    })
}

/// Parse a time token into a 24-hour clock time
///
/// PM adds 12 unless the hour is already 12; 12 AM becomes hour 0.
pub fn parse_time(token: &str) -> Option<NaiveTime> {
    let token = token.trim();

    let (mut is_am, mut is_pm, rest) = if let Some(rest) = token.strip_prefix("上午") {
        (true, false, rest)
    } else if let Some(rest) = token.strip_prefix("下午") {
        (false, true, rest)
    } else {
        (false, false, token)
    };

    let upper = rest.trim().to_ascii_uppercase();
    let clock = if let Some(clock) = upper.strip_suffix("PM") {
        is_pm = true;
        clock.trim()
    } else if let Some(clock) = upper.strip_suffix("AM") {
        is_am = true;
        clock.trim()
    } else {
        upper.as_str()
    };

    let (hour, minute) = clock.split_once(':')?;
    let mut hour: u32 = hour.parse().ok()?;
    let minute: u32 = minute.parse().ok()?;

    if is_pm && hour != 12 {
        hour += 12;
    } else if is_am && hour == 12 {
        hour = 0;
    }

    NaiveTime::from_hms_opt(hour, minute, 0)
}
