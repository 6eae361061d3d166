//! Persistence sinks for enrichment results.
//!
//! The orchestrator never writes directly: each record's final value goes
//! through an `ApplySink`, so the store-backed and row-backed modes share
//! one pipeline and differ only in this final assignment step.
use crate::record::Record;
use crate::store::StoreClient;
use serde_json::Value;

/// The pluggable apply-result step at the end of the pipeline.
pub trait ApplySink {
    /// Persist `value` as `field` for the given record. Returns true on
    /// confirmed success; must never panic or propagate an error.
    fn apply(&mut self, record: &mut Record, record_id: &str, field: &str, value: &str) -> bool;
}

/// Store-backed sink: per-record partial updates keyed by record id.
pub struct StoreSink<'a> {
    store: &'a dyn StoreClient,
    index: &'a str,
}

impl<'a> StoreSink<'a> {
    pub fn new(store: &'a dyn StoreClient, index: &'a str) -> Self {
        StoreSink { store, index }
    }
}

impl ApplySink for StoreSink<'_> {
    fn apply(&mut self, _record: &mut Record, record_id: &str, field: &str, value: &str) -> bool {
        let result = self.store.partial_update(
            self.index,
            record_id,
            field,
            &Value::String(value.to_string()),
        );
        match result {
            Ok(()) => true,
            Err(error) => {
                tracing::warn!(record_id, field, %error, "record update failed");
                false
            }
        }
    }
}

/// Row-backed sink: assigns onto the in-memory row. No external call, so
/// success is unconditional; the mutated rows are the batch product.
pub struct RowSink;

impl ApplySink for RowSink {
    fn apply(&mut self, record: &mut Record, _record_id: &str, field: &str, value: &str) -> bool {
        record.set(field, Value::String(value.to_string()));
        true
    }
}

/// Provision a field with one shared default across many records.
///
/// Distinct from the per-record enrichment path: one batch request, count
/// of submitted updates returned, zero on batch failure (best-effort).
pub fn provision_field(
    store: &dyn StoreClient,
    index: &str,
    records: &[Record],
    field: &str,
    default_value: &str,
) -> usize {
    let record_ids: Vec<String> = records
        .iter()
        .map(Record::id)
        .filter(|id| !id.is_empty())
        .collect();
    match store.partial_update_many(
        index,
        &record_ids,
        field,
        &Value::String(default_value.to_string()),
    ) {
        Ok(submitted) => submitted,
        Err(error) => {
            tracing::warn!(index, field, %error, "batch field provisioning failed");
            0
        }
    }
}
