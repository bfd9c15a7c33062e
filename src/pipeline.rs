//! Pipeline orchestration
//!
//! This module provides the public API for ChatPulse.
//! It runs the full pipeline from transcript text to an encoded report.

use crate::config::AnalysisConfig;
use crate::encoder::ReportEncoder;
use crate::error::AnalysisError;
use crate::first_conversation::extract_first_conversation;
use crate::lull::LullDetector;
use crate::parser;
use crate::patterns::compute_time_patterns;
use crate::reply::ReplyAnalyzer;
use crate::transfers::summarize_transfers;
use crate::types::{AnalysisReport, ParsedTranscript};
use tracing::info;

/// Analyze a transcript with the default configuration.
///
/// # Returns
/// Report payload JSON
///
/// # Example
/// ```ignore
/// let json = analyze_transcript(&std::fs::read_to_string("chat.txt")?)?;
/// ```
pub fn analyze_transcript(text: &str) -> Result<String, AnalysisError> {
    ChatAnalyzer::new().analyze_to_json(text)
}

/// Parse a transcript and serialize the event model as JSON
pub fn parse_to_json(text: &str) -> Result<String, AnalysisError> {
    let transcript = parser::parse(text);
    serde_json::to_string(&transcript).map_err(AnalysisError::JsonError)
}

/// Reusable analyzer holding a validated configuration and an encoder.
pub struct ChatAnalyzer {
    config: AnalysisConfig,
    encoder: ReportEncoder,
}

impl Default for ChatAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatAnalyzer {
    /// Create an analyzer with default settings
    pub fn new() -> Self {
        Self {
            config: AnalysisConfig::default(),
            encoder: ReportEncoder::new(),
        }
    }

    /// Create an analyzer with a custom configuration
    pub fn with_config(config: AnalysisConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        Ok(Self {
            config,
            encoder: ReportEncoder::new(),
        })
    }

    /// Replace the encoder, e.g. to pin the instance ID
    pub fn with_encoder(mut self, encoder: ReportEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Parse and analyze a transcript.
    ///
    /// Pipeline stages:
    /// 1. Parser - Transcript text to messages, calls and transfers
    /// 2. LullDetector - Sustained low-activity runs
    /// 3. Reply analysis - Latency, streaks and left-on-read
    /// 4. Optional analyses - Time patterns, transfers, first conversation
    pub fn analyze(&self, text: &str) -> Result<AnalysisReport, AnalysisError> {
        let transcript = parser::parse(text);
        self.analyze_parsed(&transcript)
    }

    /// Analyze an already parsed transcript
    pub fn analyze_parsed(
        &self,
        transcript: &ParsedTranscript,
    ) -> Result<AnalysisReport, AnalysisError> {
        // Stage 1 policy: an empty transcript has nothing to report
        if transcript.is_empty() {
            return Err(AnalysisError::NoMessages);
        }

        // Stage 2: Lull detection
        let detector = LullDetector::new(self.config.lull);
        let cold_wars = detector.detect(transcript);

        // Stage 3: Reply behavior
        let reply_behavior = ReplyAnalyzer::analyze(transcript);

        // Stage 4: Optional analyses
        let time_patterns = self
            .config
            .time_patterns
            .then(|| compute_time_patterns(transcript));
        let transfer_analysis = summarize_transfers(transcript);
        let first_conversation = if self.config.first_conversation {
            extract_first_conversation(transcript)
        } else {
            None
        };

        info!(
            messages = transcript.messages.len(),
            persons = transcript.persons.len(),
            cold_wars = cold_wars.len(),
            min_lull_days = detector.config().min_days,
            "report produced"
        );

        Ok(AnalysisReport {
            persons: transcript.persons.clone(),
            reply_behavior,
            cold_wars,
            time_patterns,
            transfer_analysis,
            first_conversation,
        })
    }

    /// Analyze a transcript and encode the report envelope as JSON
    pub fn analyze_to_json(&self, text: &str) -> Result<String, AnalysisError> {
        let transcript = parser::parse(text);
        let report = self.analyze_parsed(&transcript)?;
        self.encoder.encode_to_json(&transcript, report)
    }
}
