//! Report encoding
//!
//! Wraps an [`AnalysisReport`] in a versioned envelope carrying producer
//! metadata and the analyzed date range.

use crate::error::AnalysisError;
use crate::types::{AnalysisReport, DateRange, ParsedTranscript, Producer, ReportPayload};
use crate::{PRODUCER_NAME, PULSE_VERSION};
use chrono::Utc;
use uuid::Uuid;

/// Current report envelope version
pub const REPORT_VERSION: &str = "1.0.0";

/// Encoder for report payloads
#[derive(Debug, Clone)]
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Encode a report produced from `transcript`
    pub fn encode(
        &self,
        transcript: &ParsedTranscript,
        report: AnalysisReport,
    ) -> Result<ReportPayload, AnalysisError> {
        let producer = Producer {
            name: PRODUCER_NAME.to_string(),
            version: PULSE_VERSION.to_string(),
            instance_id: self.instance_id.clone(),
        };

        Ok(ReportPayload {
            report_version: REPORT_VERSION.to_string(),
            producer,
            computed_at_utc: Utc::now().to_rfc3339(),
            date_range: date_range(transcript),
            report,
        })
    }

    /// Encode to JSON string
    pub fn encode_to_json(
        &self,
        transcript: &ParsedTranscript,
        report: AnalysisReport,
    ) -> Result<String, AnalysisError> {
        let payload = self.encode(transcript, report)?;
        serde_json::to_string_pretty(&payload).map_err(AnalysisError::JsonError)
    }
}

fn date_range(transcript: &ParsedTranscript) -> DateRange {
    match transcript.date_range() {
        Some((start, end)) => DateRange {
            start: Some(start),
            end: Some(end),
            total_days: (end - start).num_days() + 1,
        },
        None => DateRange {
            start: None,
            end: None,
            total_days: 0,
        },
    }
}
