// Alert model types for trigger configuration and classification results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity class assigned to an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Severity {
    #[default]
    None,
    Primary,
    Secondary,
}

impl Severity {
    pub fn is_alert(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Get the display name for this severity
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Primary => "Primary",
            Self::Secondary => "Secondary",
        }
    }
}

/// Sender numbers and trigger phrases, one pair of lists per severity class.
///
/// Lists keep their configured order; phrase matches are reported in this
/// order. Numbers compare exactly, phrases compare case-insensitively as
/// whole words.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerConfig {
    #[serde(default)]
    pub primary_numbers: Vec<String>,
    #[serde(default)]
    pub secondary_numbers: Vec<String>,
    #[serde(default)]
    pub primary_phrases: Vec<String>,
    #[serde(default)]
    pub secondary_phrases: Vec<String>,
}

/// Outcome of classifying one inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub severity: Severity,
    /// Configured phrases found in the body, in configuration order.
    /// Empty when the message matched by sender number only.
    pub matched_phrases: Vec<String>,
    pub sender: String,
    pub body: String,
}

impl ClassificationResult {
    pub fn is_alert(&self) -> bool {
        self.severity.is_alert()
    }

    /// Comma-joined trigger text, as shown in alert history.
    pub fn trigger_text(&self) -> String {
        self.matched_phrases.join(", ")
    }
}

/// A classification stamped with its receive time, handed to downstream
/// persistence and presentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRecord {
    pub received_at: DateTime<Utc>,
    pub result: ClassificationResult,
}
