//! ChatPulse - Relationship analytics over exported chat transcripts
//!
//! ChatPulse turns a plain-text chat export into a structured event model and
//! derives behavioral signals from it through a deterministic pipeline:
//! transcript parsing → lull detection → reply analysis → optional analyses
//! → report encoding.
//!
//! ## Modules
//!
//! - **Parser**: Line-oriented transcript grammar (messages, calls, transfers)
//! - **Lull detection**: Sustained drops in daily volume ("cold wars")
//! - **Reply analysis**: Latency, instant-reply rate, streaks, left-on-read

pub mod config;
pub mod encoder;
pub mod error;
pub mod first_conversation;
pub mod lull;
pub mod parser;
pub mod patterns;
pub mod pipeline;
pub mod reply;
pub mod transfers;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::{AnalysisConfig, LullConfig};
pub use error::AnalysisError;
pub use lull::{detect_lulls, LullDetector};
pub use parser::parse as parse_transcript;
pub use pipeline::{analyze_transcript, parse_to_json, ChatAnalyzer};
pub use reply::{analyze_replies, ReplyAnalyzer};

/// ChatPulse version embedded in all report payloads
pub const PULSE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for report payloads
pub const PRODUCER_NAME: &str = "chatpulse";
