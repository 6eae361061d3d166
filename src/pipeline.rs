//! Enrichment orchestrator.
//!
//! Drives the per-record pipeline sequentially over a batch: resolve the
//! prompt, generate, judge, apply through the sink. Per-record failures
//! fail open (empty generation, accepted-unjudged value, uncounted write)
//! and never abort the batch.
use crate::judge::judge_value;
use crate::model::{invoke, ChatModel};
use crate::record::Record;
use crate::sink::ApplySink;
use crate::template::{
    default_instruction, extract_source_fields, format_instruction, resolve, InstructionContext,
};
use crate::util::truncate_string;
use std::collections::BTreeSet;

/// One enrichment job: which field to synthesize, from what, with which
/// models and instructions.
#[derive(Debug, Clone)]
pub struct EnrichmentRequest {
    /// Field receiving the generated value.
    pub target_field: String,
    /// User template with `@field` references to source fields.
    pub prompt_template: String,
    /// Generation system instruction template; built-in default when
    /// absent.
    pub system_instruction: Option<String>,
    /// Judge system instruction; generic data-quality persona when
    /// absent.
    pub judge_instruction: Option<String>,
    /// Model identifier for both generation and judgment calls.
    pub model: String,
    /// Optional auxiliary-file note substituted into instructions.
    pub reference_file: Option<String>,
}

impl EnrichmentRequest {
    /// The distinct `@field` names referenced by the prompt template.
    pub fn source_fields(&self) -> BTreeSet<String> {
        extract_source_fields(&self.prompt_template)
    }

    /// Format the generation system instruction, once per batch.
    pub fn formatted_system_instruction(&self, source_fields: &BTreeSet<String>) -> String {
        let context = InstructionContext {
            field_to_enrich: &self.target_field,
            source_fields,
            reference_file: self.reference_file.as_deref(),
        };
        match &self.system_instruction {
            Some(template) => format_instruction(template, &context),
            None => default_instruction(&context),
        }
    }
}

/// Per-record result, folded into the batch counts after dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentResult {
    pub record_id: String,
    pub generated_value: String,
    pub judged_value: Option<String>,
    pub final_value: String,
    pub accepted: bool,
}

/// Aggregate outcome of one batch invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchOutcome {
    pub attempted: usize,
    pub succeeded: usize,
}

/// Enrich a batch of records sequentially, in input order.
///
/// Records are mutated only through the sink (the row-backed sink assigns
/// onto them; the store-backed sink leaves them untouched). Returns the
/// counts; the caller owns the rows for any later export.
pub fn enrich_batch(
    model: &dyn ChatModel,
    request: &EnrichmentRequest,
    records: &mut [Record],
    sink: &mut dyn ApplySink,
    verbose: bool,
) -> BatchOutcome {
    let source_fields = request.source_fields();
    let system_instruction = request.formatted_system_instruction(&source_fields);

    let mut outcome = BatchOutcome::default();
    for record in records.iter_mut() {
        outcome.attempted += 1;
        let result = enrich_record(model, request, &system_instruction, record);
        if verbose {
            eprintln!(
                "enrich: record {} -> {} ({})",
                if result.record_id.is_empty() {
                    "<missing id>"
                } else {
                    result.record_id.as_str()
                },
                truncate_string(&result.final_value, 120),
                if result.accepted { "accepted" } else { "rewritten" }
            );
        }
        if sink.apply(record, &result.record_id, &request.target_field, &result.final_value) {
            outcome.succeeded += 1;
        }
    }

    tracing::info!(
        target_field = %request.target_field,
        attempted = outcome.attempted,
        succeeded = outcome.succeeded,
        "enrichment batch complete"
    );
    outcome
}

/// Run the generate/judge stages for one record.
fn enrich_record(
    model: &dyn ChatModel,
    request: &EnrichmentRequest,
    system_instruction: &str,
    record: &Record,
) -> EnrichmentResult {
    let record_id = record.id();
    if record_id.is_empty() {
        tracing::warn!("record has no recognized identifier key; write target is degraded");
    }

    let prompt = resolve(&request.prompt_template, record);
    tracing::debug!(record_id = %record_id, prompt = %truncate_string(&prompt, 300), "resolved prompt");

    // Generation fails open to the empty string so one bad record never
    // blocks the rest of the batch.
    let generated_value = match invoke(model, &request.model, system_instruction, &prompt) {
        Ok(text) => text,
        Err(error) => {
            tracing::warn!(record_id = %record_id, %error, "generation failed; using empty value");
            String::new()
        }
    };

    let judgment = judge_value(
        model,
        &request.model,
        request.judge_instruction.as_deref(),
        record,
        &request.target_field,
        &request.prompt_template,
        &generated_value,
    );

    EnrichmentResult {
        record_id,
        generated_value,
        judged_value: judgment.judged_value,
        final_value: judgment.final_value,
        accepted: judgment.accepted,
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
