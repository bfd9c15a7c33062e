//! First conversation extraction
//!
//! Picks the opening burst of the transcript for display. A burst is the
//! first message plus every following message that arrives within
//! [`BURST_GAP_SECS`] of its predecessor.

use crate::types::{ConversationLine, FirstConversation, Message, ParsedTranscript};

/// Largest gap between adjacent messages of one burst
pub const BURST_GAP_SECS: i64 = 30 * 60;

/// Bursts shorter than this fall back to the leading messages
pub const MIN_BURST: usize = 5;

/// Messages shown in fallback mode
pub const FALLBACK_COUNT: usize = 20;

/// Hard cap on returned messages
pub const MAX_MESSAGES: usize = 50;

/// Extract the first conversation, `None` for an empty transcript
pub fn extract_first_conversation(transcript: &ParsedTranscript) -> Option<FirstConversation> {
    let messages = &transcript.messages;
    let first = messages.first()?;

    let burst_len = 1 + messages
        .windows(2)
        .take_while(|pair| (pair[1].timestamp - pair[0].timestamp).num_seconds() <= BURST_GAP_SECS)
        .count();

    let is_fallback = burst_len < MIN_BURST;
    let chosen = if is_fallback {
        messages.len().min(FALLBACK_COUNT)
    } else {
        burst_len
    };

    Some(FirstConversation {
        messages: messages[..chosen.min(MAX_MESSAGES)]
            .iter()
            .map(render_line)
            .collect(),
        start_date: first.timestamp.date(),
        is_fallback,
    })
}

fn render_line(message: &Message) -> ConversationLine {
    let content = message
        .msg_type
        .placeholder()
        .map(str::to_string)
        .unwrap_or_else(|| message.content.clone());

    ConversationLine {
        timestamp: message.timestamp,
        sender: message.sender.clone(),
        content,
        msg_type: message.msg_type,
    }
}
