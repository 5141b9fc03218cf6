//! In-memory operation log.
//!
//! Bounded ring of recent control operations, served back over
//! `/operations` for quick triage. Secrets are scrubbed at record time:
//! any object key containing `password` is replaced before the entry is
//! stored, so the log can never replay one.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

const REDACTED: &str = "***";

/// One recorded control operation.
#[derive(Debug, Clone, Serialize)]
pub struct OperationRecord {
    pub timestamp: DateTime<Utc>,
    /// Short machine-readable kind, e.g. `lxc.start` or `deploy`.
    pub kind: String,
    /// Request-identifying fields (vmid, host, ...), already redacted.
    pub metadata: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Fixed-capacity log; oldest entries fall off the front.
pub struct OperationLog {
    capacity: usize,
    entries: Mutex<VecDeque<OperationRecord>>,
}

impl OperationLog {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(VecDeque::new()),
        }
    }

    /// Append an entry, redacting password-like fields in both the
    /// metadata and the result.
    pub fn record(
        &self,
        kind: &str,
        mut metadata: Value,
        mut result: Option<Value>,
        error: Option<String>,
    ) {
        redact(&mut metadata);
        if let Some(value) = result.as_mut() {
            redact(value);
        }
        let entry = OperationRecord {
            timestamp: Utc::now(),
            kind: kind.to_string(),
            metadata,
            result,
            error,
        };
        let mut entries = self.lock();
        entries.push_back(entry);
        while entries.len() > self.capacity {
            entries.pop_front();
        }
    }

    /// Most recent entries first, at most `limit` of them.
    #[must_use]
    pub fn latest(&self, limit: usize) -> Vec<OperationRecord> {
        self.lock().iter().rev().take(limit).cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<OperationRecord>> {
        // A poisoned log is still a valid ring; keep serving it.
        self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Recursively replace the value of any object key containing `password`.
fn redact(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, entry) in map.iter_mut() {
                if key.to_ascii_lowercase().contains("password") {
                    *entry = Value::String(REDACTED.to_string());
                } else {
                    redact(entry);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                redact(item);
            }
        }
        _ => {}
    }
}
