//! Transcript parser
//!
//! Turns an exported chat transcript into an ordered event model in a single
//! forward pass. The only state carried between lines is the current date and
//! the most recently emitted message (target for continuation lines).
//!
//! Parsing is lenient: lines that match no known shape, including everything
//! before the first date header, are skipped rather than reported.

pub mod content;
pub mod grammar;

use crate::types::{CallRecord, Message, MessageType, ParsedTranscript, TransferRecord};
use chrono::NaiveDate;
use grammar::TimedLine;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Line accounting for one parse run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct ParseStats {
    date_headers: usize,
    continuations: usize,
    skipped: usize,
}

/// Parse a transcript into messages, calls, transfers and participants
pub fn parse(text: &str) -> ParsedTranscript {
    let mut messages: Vec<Message> = Vec::new();
    let mut calls: Vec<CallRecord> = Vec::new();
    let mut transfers: Vec<TransferRecord> = Vec::new();
    let mut persons: BTreeSet<String> = BTreeSet::new();

    let mut current_date: Option<NaiveDate> = None;
    let mut stats = ParseStats::default();

    for raw_line in text.split('\n') {
        let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);

        if let Some(date) = grammar::match_date_header(line) {
            current_date = Some(date);
            stats.date_headers += 1;
            continue;
        }

        let Some(date) = current_date else {
            if !line.trim().is_empty() {
                stats.skipped += 1;
            }
            continue;
        };

        match grammar::match_timed_line(line) {
            Some(TimedLine::Call { time, caller, text }) => {
                let Some(time) = grammar::parse_time(time) else {
                    stats.skipped += 1;
                    continue;
                };
                let caller = caller.unwrap_or_default();
                if !caller.is_empty() {
                    persons.insert(caller.to_string());
                }
                calls.push(CallRecord {
                    timestamp: date.and_time(time),
                    caller: caller.to_string(),
                    duration_seconds: content::parse_call_duration(text),
                });
            }

            Some(TimedLine::Message {
                time,
                sender,
                content: body,
            }) => {
                let Some(time) = grammar::parse_time(time) else {
                    stats.skipped += 1;
                    continue;
                };
                let timestamp = date.and_time(time);
                persons.insert(sender.to_string());

                // Transfers are checked before classification and keep their raw content
                if let Some(transfer) = content::detect_transfer(body, sender, &persons, timestamp)
                {
                    if !transfer.has_known_payer() {
                        warn!(%timestamp, "could not infer payer for transfer notice");
                    }
                    for name in [&transfer.sender, &transfer.receiver] {
                        if !name.is_empty() {
                            persons.insert(name.clone());
                        }
                    }
                    transfers.push(transfer);
                    messages.push(Message {
                        timestamp,
                        sender: sender.to_string(),
                        content: body.to_string(),
                        msg_type: MessageType::Transfer,
                    });
                    continue;
                }

                let (cleaned, msg_type) = content::classify(body);
                messages.push(Message {
                    timestamp,
                    sender: sender.to_string(),
                    content: cleaned,
                    msg_type,
                });
            }

            None => match (grammar::match_continuation(line), messages.last_mut()) {
                (Some(rest), Some(last)) => {
                    last.content.push('\n');
                    last.content.push_str(rest);
                    stats.continuations += 1;
                }
                _ => {
                    if !line.trim().is_empty() {
                        stats.skipped += 1;
                    }
                }
            },
        }
    }

    debug!(
        messages = messages.len(),
        calls = calls.len(),
        transfers = transfers.len(),
        persons = persons.len(),
        date_headers = stats.date_headers,
        continuations = stats.continuations,
        skipped = stats.skipped,
        "parsed transcript"
    );

    ParsedTranscript {
        messages,
        calls,
        transfers,
        persons: persons.into_iter().collect(),
    }
}
