//! Money transfer totals

use crate::types::{ParsedTranscript, PersonTransfers, TransferSummary};
use std::collections::BTreeMap;
use tracing::debug;

/// Summarize transfers, `None` when the transcript has none
///
/// Totals cover every transfer; per-person sums only attribute transfers
/// whose payer is known. Every participant is listed, zero when they never paid.
pub fn summarize_transfers(transcript: &ParsedTranscript) -> Option<TransferSummary> {
    if transcript.transfers.is_empty() {
        return None;
    }

    let mut per_person: BTreeMap<String, PersonTransfers> = transcript
        .persons
        .iter()
        .map(|p| (p.clone(), PersonTransfers::default()))
        .collect();
    let mut total_amount: u64 = 0;

    for transfer in &transcript.transfers {
        total_amount = total_amount.saturating_add(transfer.amount);
        if !transfer.has_known_payer() {
            continue;
        }
        let entry = per_person.entry(transfer.sender.clone()).or_default();
        entry.sent = entry.sent.saturating_add(transfer.amount);
        entry.count += 1;
    }

    let unattributed = transcript
        .transfers
        .iter()
        .filter(|t| !t.has_known_payer())
        .count();
    if unattributed > 0 {
        debug!(unattributed, "transfers without a known payer");
    }

    Some(TransferSummary {
        total_amount,
        total_count: transcript.transfers.len() as u32,
        per_person,
    })
}
