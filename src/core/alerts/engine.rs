// Alert engine - runs classification against the current trigger config and
// keeps the latest primary alert for acknowledgment.

use chrono::{DateTime, Utc};

use super::classifier::classify;
use super::model::{AlertRecord, Severity, TriggerConfig};

/// Alert engine state
pub struct AlertEngine {
    /// Trigger configuration snapshot
    config: TriggerConfig,
    /// Most recent primary alert not yet acknowledged
    pending_primary: Option<AlertRecord>,
}

impl AlertEngine {
    pub fn new(config: TriggerConfig) -> Self {
        Self {
            config,
            pending_primary: None,
        }
    }

    /// Update the trigger configuration (hot-reload friendly)
    pub fn update_config(&mut self, config: TriggerConfig) {
        self.config = config;
    }

    /// Classify one inbound message and stamp it with its receive time.
    pub fn process(&mut self, sender: &str, body: &str, now: DateTime<Utc>) -> AlertRecord {
        let result = classify(sender, body, &self.config);
        match result.severity {
            Severity::None => log::debug!("Message from {} is not an alert", sender),
            severity => log::info!(
                "{} alert from {} (triggers: [{}])",
                severity.display_name(),
                sender,
                result.trigger_text()
            ),
        }

        let record = AlertRecord {
            received_at: now,
            result,
        };
        if record.result.severity == Severity::Primary {
            self.pending_primary = Some(record.clone());
        }
        record
    }

    pub fn pending_primary(&self) -> Option<&AlertRecord> {
        self.pending_primary.as_ref()
    }

    /// Mark the pending primary alert as handled.
    pub fn take_pending_primary(&mut self) -> Option<AlertRecord> {
        self.pending_primary.take()
    }
}
