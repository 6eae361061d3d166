//! End-to-end pipeline tests with scripted model and store doubles.
//!
//! These cover the full orchestrator path for both persistence modes:
//! store-backed per-record write-back and row-backed in-memory
//! assignment.

use anyhow::{anyhow, Result};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::BTreeMap;

use fieldsmith::model::{ChatMessage, ChatModel};
use fieldsmith::pipeline::{enrich_batch, BatchOutcome, EnrichmentRequest};
use fieldsmith::record::Record;
use fieldsmith::sink::{provision_field, RowSink, StoreSink};
use fieldsmith::store::StoreClient;

fn record(value: Value) -> Record {
    serde_json::from_value(value).expect("record from JSON object")
}

fn request(target_field: &str, prompt_template: &str) -> EnrichmentRequest {
    EnrichmentRequest {
        target_field: target_field.to_string(),
        prompt_template: prompt_template.to_string(),
        system_instruction: None,
        judge_instruction: None,
        model: "test-model".to_string(),
        reference_file: None,
    }
}

/// Model double that alternates generation/judgment responses per record.
struct ScriptedModel {
    generation: String,
    judgment: String,
    prompts: RefCell<Vec<String>>,
}

impl ScriptedModel {
    fn new(generation: &str, judgment: &str) -> Self {
        ScriptedModel {
            generation: generation.to_string(),
            judgment: judgment.to_string(),
            prompts: RefCell::new(Vec::new()),
        }
    }
}

impl ChatModel for ScriptedModel {
    fn complete(&self, _model: &str, messages: &[ChatMessage]) -> Result<String> {
        let mut prompts = self.prompts.borrow_mut();
        prompts.push(messages.last().expect("user message").content.clone());
        if prompts.len() % 2 == 1 {
            Ok(self.generation.clone())
        } else {
            Ok(self.judgment.clone())
        }
    }
}

/// Store double recording partial updates keyed by record id.
#[derive(Default)]
struct MemoryStore {
    updates: RefCell<Vec<(String, String, Value)>>,
    fail_updates: bool,
    batches: RefCell<Vec<(String, usize)>>,
}

impl StoreClient for MemoryStore {
    fn search_by_id(&self, _index: &str, _record_id: &str) -> Result<Option<Record>> {
        Ok(None)
    }

    fn search_by_facet(&self, _index: &str, _facet: &str, _value: &str) -> Result<Vec<Record>> {
        Ok(Vec::new())
    }

    fn facet_values(
        &self,
        _index: &str,
        _facet: &str,
        _parent: Option<(&str, &str)>,
    ) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn list_fields(&self, _index: &str) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn list_indexes(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn partial_update(
        &self,
        _index: &str,
        record_id: &str,
        field: &str,
        value: &Value,
    ) -> Result<()> {
        if self.fail_updates {
            return Err(anyhow!("store unavailable"));
        }
        self.updates
            .borrow_mut()
            .push((record_id.to_string(), field.to_string(), value.clone()));
        Ok(())
    }

    fn partial_update_many(
        &self,
        _index: &str,
        record_ids: &[String],
        field: &str,
        _default_value: &Value,
    ) -> Result<usize> {
        self.batches
            .borrow_mut()
            .push((field.to_string(), record_ids.len()));
        Ok(record_ids.len())
    }
}

#[test]
fn accepted_value_is_written_back_under_the_record_id() {
    let model = ScriptedModel::new("A compact widget.", "OK");
    let store = MemoryStore::default();
    let mut records = vec![record(
        json!({"id": "P1", "name": "Widget", "desc": "A small widget"}),
    )];

    let mut sink = StoreSink::new(&store, "products");
    let outcome = enrich_batch(
        &model,
        &request("summary", "Summarize @name and @desc"),
        &mut records,
        &mut sink,
        false,
    );

    assert_eq!(outcome, BatchOutcome { attempted: 1, succeeded: 1 });
    let updates = store.updates.borrow();
    assert_eq!(
        *updates,
        vec![(
            "P1".to_string(),
            "summary".to_string(),
            Value::String("A compact widget.".to_string())
        )]
    );
    // Resolved prompt reached the model with both fields substituted.
    assert_eq!(
        model.prompts.borrow()[0],
        "Summarize Widget and A small widget"
    );
}

#[test]
fn judge_rewrite_is_persisted_instead_of_the_generated_text() {
    let model = ScriptedModel::new("A compact widget.", "Widget: compact, durable.");
    let store = MemoryStore::default();
    let mut records = vec![record(json!({"id": "P1", "name": "Widget"}))];

    let mut sink = StoreSink::new(&store, "products");
    enrich_batch(
        &model,
        &request("summary", "Summarize @name"),
        &mut records,
        &mut sink,
        false,
    );

    let updates = store.updates.borrow();
    assert_eq!(updates[0].2, Value::String("Widget: compact, durable.".to_string()));
}

#[test]
fn store_failures_are_uncounted_but_the_batch_finishes() {
    let model = ScriptedModel::new("value", "OK");
    let store = MemoryStore {
        fail_updates: true,
        ..MemoryStore::default()
    };
    let mut records = vec![
        record(json!({"objectID": "A", "name": "a"})),
        record(json!({"objectID": "B", "name": "b"})),
    ];

    let mut sink = StoreSink::new(&store, "products");
    let outcome = enrich_batch(
        &model,
        &request("summary", "Describe @name"),
        &mut records,
        &mut sink,
        false,
    );

    assert_eq!(outcome, BatchOutcome { attempted: 2, succeeded: 0 });
}

#[test]
fn row_mode_mutates_rows_and_makes_no_store_calls() {
    let model = ScriptedModel::new("enriched", "OK");
    let mut records = vec![
        record(json!({"id": "1", "name": "a"})),
        record(json!({"id": "2", "name": "b"})),
        record(json!({"id": "3", "name": "c"})),
    ];

    let outcome = enrich_batch(
        &model,
        &request("summary", "Describe @name"),
        &mut records,
        &mut RowSink,
        false,
    );

    assert_eq!(outcome, BatchOutcome { attempted: 3, succeeded: 3 });
    for row in &records {
        assert_eq!(row.get("summary"), Some(&Value::String("enriched".to_string())));
    }
}

#[test]
fn provisioning_counts_submitted_records_and_skips_missing_ids() {
    let store = MemoryStore::default();
    let records = vec![
        record(json!({"objectID": "A"})),
        record(json!({"name": "no id"})),
        record(json!({"object_id": "B"})),
    ];

    let submitted = provision_field(&store, "products", &records, "reviewed", "no");

    assert_eq!(submitted, 2);
    assert_eq!(*store.batches.borrow(), vec![("reviewed".to_string(), 2)]);
}

#[test]
fn rows_survive_a_file_round_trip_after_enrichment() {
    let model = ScriptedModel::new("enriched", "OK");
    let mut records = vec![record(json!({"id": "1", "name": "a"}))];
    enrich_batch(
        &model,
        &request("summary", "Describe @name"),
        &mut records,
        &mut RowSink,
        false,
    );

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("enriched.json");
    fieldsmith::rows::write_rows(&path, &records).expect("write rows");
    let loaded = fieldsmith::rows::load_rows(&path).expect("load rows");
    assert_eq!(loaded, records);

    let mut expected = BTreeMap::new();
    expected.insert("id".to_string(), Value::String("1".to_string()));
    expected.insert("name".to_string(), Value::String("a".to_string()));
    expected.insert("summary".to_string(), Value::String("enriched".to_string()));
    assert_eq!(loaded[0], Record::new(expected));
}
