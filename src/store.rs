//! Record store client.
//!
//! The pipeline consumes the store through the `StoreClient` trait;
//! `HttpStoreClient` speaks the Algolia-style REST surface the catalog
//! lives behind. Query semantics are the store's business; this module is
//! transport glue plus a few category-path helpers.
use crate::config::StoreConfig;
use crate::record::Record;
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::time::Duration;
use ureq::Agent;

/// Hits requested for facet-filtered record fetches.
const FACET_PAGE_SIZE: u32 = 100;
/// Records sampled when enumerating available fields.
const FIELD_SAMPLE_SIZE: u32 = 20;
/// Maximum facet values returned per enumeration.
const MAX_FACET_VALUES: u32 = 100;
/// Polls against the store task endpoint before giving up the wait.
const TASK_WAIT_ATTEMPTS: u32 = 10;

/// Operations the enrichment workflow needs from the record store.
pub trait StoreClient {
    /// Fetch a single record by its identifier.
    fn search_by_id(&self, index: &str, record_id: &str) -> Result<Option<Record>>;

    /// Fetch records matching a facet filter, e.g. `categories.lvl1`.
    fn search_by_facet(&self, index: &str, facet: &str, value: &str) -> Result<Vec<Record>>;

    /// Enumerate values of a facet, optionally under a parent facet filter.
    fn facet_values(
        &self,
        index: &str,
        facet: &str,
        parent: Option<(&str, &str)>,
    ) -> Result<Vec<String>>;

    /// Enumerate field names by sampling records from the index.
    fn list_fields(&self, index: &str) -> Result<Vec<String>>;

    /// List available index names.
    fn list_indexes(&self) -> Result<Vec<String>>;

    /// Partial-update one field of one record.
    fn partial_update(&self, index: &str, record_id: &str, field: &str, value: &Value)
        -> Result<()>;

    /// Submit one batch that sets `field` to a shared default across many
    /// records, creating missing records. Returns the submitted count and
    /// waits best-effort for the store to apply the batch.
    fn partial_update_many(
        &self,
        index: &str,
        record_ids: &[String],
        field: &str,
        default_value: &Value,
    ) -> Result<usize>;
}

/// Display label for a hierarchical category path: the last `" > "` segment.
pub fn leaf_label(category: &str) -> &str {
    category.rsplit(" > ").next().unwrap_or(category)
}

/// Keep only categories that extend the given parent path.
pub fn filter_children<'a>(categories: &'a [String], parent: &str) -> Vec<&'a str> {
    categories
        .iter()
        .map(String::as_str)
        .filter(|category| category.starts_with(parent))
        .collect()
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<Record>,
    #[serde(default)]
    facets: serde_json::Map<String, Value>,
}

#[derive(Deserialize)]
struct TaskResponse {
    #[serde(rename = "taskID")]
    task_id: Option<u64>,
}

#[derive(Deserialize)]
struct TaskStatus {
    status: Option<String>,
}

#[derive(Deserialize)]
struct IndexListing {
    #[serde(default)]
    items: Vec<IndexEntry>,
}

#[derive(Deserialize)]
struct IndexEntry {
    name: String,
}

/// HTTP client for an Algolia-style record store REST API.
pub struct HttpStoreClient {
    agent: Agent,
    host: String,
    app_id: String,
    api_key: String,
}

impl HttpStoreClient {
    pub fn new(config: &StoreConfig) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(30)))
            .build()
            .into();
        HttpStoreClient {
            agent,
            host: config.host.trim_end_matches('/').to_string(),
            app_id: config.app_id.clone(),
            api_key: config.api_key.clone(),
        }
    }

    fn post_json(&self, url: &str, body: &Value) -> Result<Value> {
        let mut response = self
            .agent
            .post(url)
            .header("X-Algolia-Application-Id", &self.app_id)
            .header("X-Algolia-API-Key", &self.api_key)
            .send_json(body)
            .with_context(|| format!("store request to {url}"))?;
        response
            .body_mut()
            .read_json()
            .with_context(|| format!("parse store response from {url}"))
    }

    fn get_json(&self, url: &str) -> Result<Value> {
        let mut response = self
            .agent
            .get(url)
            .header("X-Algolia-Application-Id", &self.app_id)
            .header("X-Algolia-API-Key", &self.api_key)
            .call()
            .with_context(|| format!("store request to {url}"))?;
        response
            .body_mut()
            .read_json()
            .with_context(|| format!("parse store response from {url}"))
    }

    fn query(&self, index: &str, body: Value) -> Result<SearchResponse> {
        let url = format!("{}/1/indexes/{index}/query", self.host);
        let value = self.post_json(&url, &body)?;
        serde_json::from_value(value).context("parse search response")
    }

    /// Wait for an asynchronous store task to publish, best-effort: give
    /// up silently after a bounded number of polls.
    fn wait_task(&self, index: &str, task_id: u64) {
        let url = format!("{}/1/indexes/{index}/task/{task_id}", self.host);
        for _ in 0..TASK_WAIT_ATTEMPTS {
            match self.get_json(&url) {
                Ok(value) => {
                    let parsed: TaskStatus = match serde_json::from_value(value) {
                        Ok(parsed) => parsed,
                        Err(_) => return,
                    };
                    if parsed.status.as_deref() == Some("published") {
                        return;
                    }
                }
                Err(error) => {
                    tracing::debug!(task_id, %error, "task status poll failed");
                    return;
                }
            }
            std::thread::sleep(Duration::from_millis(200));
        }
        tracing::debug!(task_id, "gave up waiting for store task");
    }
}

fn quote_facet_value(value: &str) -> String {
    format!("\"{}\"", value.trim().replace('"', "\\\""))
}

impl StoreClient for HttpStoreClient {
    fn search_by_id(&self, index: &str, record_id: &str) -> Result<Option<Record>> {
        let response = self.query(
            index,
            json!({
                "query": "",
                "filters": format!("objectID:{record_id}"),
                "hitsPerPage": 1,
            }),
        )?;
        Ok(response.hits.into_iter().next())
    }

    fn search_by_facet(&self, index: &str, facet: &str, value: &str) -> Result<Vec<Record>> {
        let response = self.query(
            index,
            json!({
                "query": "",
                "filters": format!("{facet}:{}", quote_facet_value(value)),
                "hitsPerPage": FACET_PAGE_SIZE,
            }),
        )?;
        Ok(response.hits)
    }

    fn facet_values(
        &self,
        index: &str,
        facet: &str,
        parent: Option<(&str, &str)>,
    ) -> Result<Vec<String>> {
        let mut body = json!({
            "query": "",
            "facets": [facet],
            "maxValuesPerFacet": MAX_FACET_VALUES,
            "hitsPerPage": 0,
        });
        if let Some((parent_facet, parent_value)) = parent {
            body["filters"] =
                Value::String(format!("{parent_facet}:{}", quote_facet_value(parent_value)));
        }
        let response = self.query(index, body)?;
        let values = response
            .facets
            .get(facet)
            .and_then(Value::as_object)
            .map(|counts| counts.keys().cloned().collect())
            .unwrap_or_default();
        Ok(values)
    }

    fn list_fields(&self, index: &str) -> Result<Vec<String>> {
        let response = self.query(
            index,
            json!({
                "query": "",
                "hitsPerPage": FIELD_SAMPLE_SIZE,
                "attributesToRetrieve": ["*"],
            }),
        )?;
        let mut fields = BTreeSet::new();
        for record in &response.hits {
            fields.extend(record.fields.keys().cloned());
        }
        Ok(fields.into_iter().collect())
    }

    fn list_indexes(&self) -> Result<Vec<String>> {
        let url = format!("{}/1/indexes", self.host);
        let value = self.get_json(&url)?;
        let listing: IndexListing = serde_json::from_value(value).context("parse index listing")?;
        Ok(listing.items.into_iter().map(|entry| entry.name).collect())
    }

    fn partial_update(
        &self,
        index: &str,
        record_id: &str,
        field: &str,
        value: &Value,
    ) -> Result<()> {
        let url = format!("{}/1/indexes/{index}/{record_id}/partial", self.host);
        self.post_json(&url, &json!({ (field): value }))?;
        Ok(())
    }

    fn partial_update_many(
        &self,
        index: &str,
        record_ids: &[String],
        field: &str,
        default_value: &Value,
    ) -> Result<usize> {
        if record_ids.is_empty() {
            return Ok(0);
        }
        let requests: Vec<Value> = record_ids
            .iter()
            .map(|record_id| {
                json!({
                    "action": "partialUpdateObject",
                    "body": {
                        "objectID": record_id,
                        (field): default_value,
                    },
                })
            })
            .collect();
        let url = format!("{}/1/indexes/{index}/batch", self.host);
        let value = self.post_json(&url, &json!({ "requests": requests }))?;
        let submitted = record_ids.len();
        let task_id = serde_json::from_value::<TaskResponse>(value)
            .ok()
            .and_then(|task| task.task_id);
        if let Some(task_id) = task_id {
            self.wait_task(index, task_id);
        }
        tracing::info!(index, field, submitted, "batch field provisioning submitted");
        Ok(submitted)
    }
}

/// Surface a record-list acquisition failure as a single terminal error.
pub fn no_records_error(index: &str, selector: &str) -> anyhow::Error {
    anyhow!("no records found in index '{index}' for {selector}")
}
