//! Prompt template resolution.
//!
//! User templates reference record fields with `@field` tokens. Source
//! fields are collected as a set (order- and duplicate-insensitive) and
//! substituted in a single pass, so inserted values are never re-scanned
//! and overlapping token names cannot corrupt each other.
use crate::record::Record;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Placeholders recognized in stored/system instruction templates.
/// Anything else in braces is left untouched.
pub const INSTRUCTION_PLACEHOLDERS: [&str; 3] =
    ["field_to_enrich", "source_fields", "reference_file"];

fn token_regex() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| Regex::new(r"@([A-Za-z0-9_]+)").expect("field token regex"))
}

/// Collect the distinct `@field` names referenced by a template.
pub fn extract_source_fields(template: &str) -> BTreeSet<String> {
    token_regex()
        .captures_iter(template)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Substitute every `@field` token with the record's display value for
/// that field (empty string when the field is absent).
pub fn resolve(template: &str, record: &Record) -> String {
    token_regex()
        .replace_all(template, |caps: &regex::Captures<'_>| {
            record.display_field(&caps[1])
        })
        .into_owned()
}

/// Fixed context values substituted into instruction templates.
pub struct InstructionContext<'a> {
    pub field_to_enrich: &'a str,
    pub source_fields: &'a BTreeSet<String>,
    pub reference_file: Option<&'a str>,
}

impl InstructionContext<'_> {
    fn source_fields_joined(&self) -> String {
        self.source_fields
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Format an instruction template against the closed placeholder set.
///
/// Done once per batch, not per record. Unrecognized `{...}` sequences
/// pass through unchanged rather than failing at format time.
pub fn format_instruction(template: &str, context: &InstructionContext<'_>) -> String {
    template
        .replace("{field_to_enrich}", context.field_to_enrich)
        .replace("{source_fields}", &context.source_fields_joined())
        .replace("{reference_file}", context.reference_file.unwrap_or(""))
}

/// Built-in generation instruction used when no template is supplied.
pub fn default_instruction(context: &InstructionContext<'_>) -> String {
    let mut text = format!(
        "You are a product data enrichment assistant. Generate a relevant value \
         for the field '{}' from the source fields: {}.",
        context.field_to_enrich,
        context.source_fields_joined()
    );
    if let Some(reference) = context.reference_file {
        text.push_str(&format!(
            " A reference file ({reference}) may help generate the value."
        ));
    }
    text
}

/// Built-in judge persona used when no judge instruction is supplied.
pub const DEFAULT_JUDGE_INSTRUCTION: &str =
    "You are an expert in data quality and product data enrichment.";
