//! Metadata posting
//!
//! Posting never fails loudly: transport and engine errors are logged and
//! reported as `false`, so metadata reporting cannot break the workflow it
//! is attached to.

use esmeta_core::{merge_fields, stamp_time_recorded, Record, INDEX_FIELD, TYPE_FIELD};
use serde_json::Value;
use tracing::{error, warn};

use crate::client::MetadataClient;
use crate::config::Transport;
use crate::engine::BulkAction;

/// Per-call posting options
#[derive(Debug, Clone, PartialEq)]
pub struct PostOptions {
    /// Stamp `time_recorded` with the current time
    pub stamp_time: bool,
    /// Fields merged into every record, overriding the record's own
    pub extra: Record,
}

impl Default for PostOptions {
    fn default() -> Self {
        Self {
            stamp_time: true,
            extra: Record::new(),
        }
    }
}

impl PostOptions {
    /// Defaults: stamp the time, no extra fields.
    pub fn new() -> Self {
        Self::default()
    }

    /// Do not stamp `time_recorded`.
    pub fn without_timestamp(mut self) -> Self {
        self.stamp_time = false;
        self
    }

    /// Add an extra field.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

impl MetadataClient {
    /// Post one record.
    ///
    /// A `_type` field in the record (or in the extra fields) overrides
    /// `record_type` and is not stored. An empty record is a successful
    /// no-op. Returns `false` if the transport reported an error.
    pub fn post(&self, record_type: &str, record: &Record, options: &PostOptions) -> bool {
        if record.is_empty() {
            return true;
        }

        let mut metadata = record.clone();
        merge_fields(&mut metadata, &options.extra);
        let doc_type = match metadata.remove(TYPE_FIELD) {
            Some(Value::String(t)) => t,
            Some(other) => other.to_string(),
            None => record_type.to_string(),
        };
        if options.stamp_time {
            stamp_time_recorded(&mut metadata, false);
        }

        let index = self.index();
        match self.config.transport {
            Transport::Http => match self.engine.index(index, &doc_type, &metadata) {
                Ok(()) => true,
                Err(e) => {
                    error!(
                        target: "esmeta::post",
                        index,
                        doc_type = %doc_type,
                        error = %e,
                        "Failed to post metadata"
                    );
                    false
                }
            },
            Transport::Udp => match self.udp.send(index, &doc_type, &metadata) {
                Ok(_) => true,
                Err(e) => {
                    warn!(
                        target: "esmeta::post",
                        host = %self.config.host,
                        port = self.config.udp_port,
                        error = %e,
                        "Failed to send metadata datagram"
                    );
                    false
                }
            },
        }
    }

    /// Post many records in one bulk request.
    ///
    /// `time_recorded` is stamped only on records that do not carry one.
    /// Every record is tagged with the client's index. An empty list is a
    /// successful no-op. Returns `false` if the bulk request failed.
    pub fn bulk_post(&self, records: &[Record], options: &PostOptions) -> bool {
        if records.is_empty() {
            return true;
        }

        let index = self.index();
        let actions: Vec<BulkAction> = records
            .iter()
            .map(|record| {
                let mut metadata = record.clone();
                merge_fields(&mut metadata, &options.extra);
                if options.stamp_time {
                    stamp_time_recorded(&mut metadata, true);
                }
                metadata.insert(INDEX_FIELD.to_string(), Value::from(index));
                BulkAction::from_record(metadata, index)
            })
            .collect();

        match self.engine.bulk(&actions) {
            Ok(()) => true,
            Err(e) => {
                error!(
                    target: "esmeta::post",
                    index,
                    count = actions.len(),
                    error = %e,
                    "Bulk post failed"
                );
                false
            }
        }
    }
}
