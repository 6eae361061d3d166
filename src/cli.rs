//! CLI argument parsing for the enrichment workflow.
//!
//! The CLI is intentionally thin: it selects records and wires the
//! pipeline without embedding prompt or judgment policy, so the same core
//! logic can be reused elsewhere.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::DEFAULT_MODEL;

/// Root CLI entrypoint for the enrichment workflow.
#[derive(Parser, Debug)]
#[command(
    name = "fieldsmith",
    version,
    about = "LM-driven product catalog field enrichment",
    after_help = "Examples:\n  fieldsmith enrich --index products --facet categories.lvl1 --facet-value \"Packaging > Boxes\" \\\n      --field shortDescription --prompt \"Summarize @name and @longDescription\"\n  fieldsmith enrich --index products --record-id P1 --field summary --prompt \"Describe @name\" --verbose\n  fieldsmith enrich-rows --input rows.json --output enriched.json --field summary --prompt \"Describe @name\"\n  fieldsmith provision --index products --facet categories.lvl2 --facet-value \"Boxes > Cardboard\" \\\n      --field reviewed --default-value \"no\"\n  fieldsmith facets --index products --facet categories.lvl0\n  fieldsmith fields --index products\n  fieldsmith instruction set packaging --instruction \"Enrich {field_to_enrich} from {source_fields}.\"",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level workflow commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Enrich a field for store-backed records (per-record write-back)
    Enrich(EnrichArgs),
    /// Enrich a field for rows imported from a JSON file (bulk export)
    EnrichRows(EnrichRowsArgs),
    /// Add a field with a shared default value across selected records
    Provision(ProvisionArgs),
    /// List field names available in an index
    Fields(FieldsArgs),
    /// List values of a category facet
    Facets(FacetsArgs),
    /// List index names available on the store
    Indexes(IndexesArgs),
    /// Manage the named instruction library
    #[command(subcommand)]
    Instruction(InstructionCommand),
}

/// Prompt-related inputs shared by both enrichment modes.
#[derive(Parser, Debug)]
pub struct PromptArgs {
    /// Field to enrich
    #[arg(long, value_name = "FIELD")]
    pub field: String,

    /// Prompt template with @field references to source fields
    #[arg(long, value_name = "TEMPLATE")]
    pub prompt: String,

    /// Model identifier for generation and judgment calls
    #[arg(long, value_name = "MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Named instruction pair from the library
    #[arg(long, value_name = "NAME", conflicts_with = "system_instruction")]
    pub instruction: Option<String>,

    /// Inline generation system instruction template
    #[arg(long, value_name = "TEMPLATE")]
    pub system_instruction: Option<String>,

    /// Inline judge system instruction
    #[arg(long, value_name = "TEXT")]
    pub judge_instruction: Option<String>,

    /// Auxiliary reference-file note substituted into instructions
    #[arg(long, value_name = "NAME")]
    pub reference_file: Option<String>,

    /// Instruction library path (default: user data dir)
    #[arg(long, value_name = "PATH")]
    pub library: Option<PathBuf>,
}

/// Record selection against a store index.
#[derive(Parser, Debug)]
pub struct SelectionArgs {
    /// Store index holding the records
    #[arg(long, value_name = "INDEX")]
    pub index: String,

    /// Select a single record by identifier
    #[arg(long, value_name = "ID")]
    pub record_id: Option<String>,

    /// Facet to filter on, e.g. categories.lvl2
    #[arg(long, value_name = "FACET", requires = "facet_value")]
    pub facet: Option<String>,

    /// Facet value to match (full category path)
    #[arg(long, value_name = "VALUE", requires = "facet")]
    pub facet_value: Option<String>,
}

/// Store-backed enrichment inputs.
#[derive(Parser, Debug)]
#[command(about = "Enrich a field for records selected from the store")]
pub struct EnrichArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    #[command(flatten)]
    pub prompt: PromptArgs,

    /// Emit a per-record transcript of the batch
    #[arg(long)]
    pub verbose: bool,
}

/// Row-backed enrichment inputs.
#[derive(Parser, Debug)]
#[command(about = "Enrich a field for rows from a JSON file")]
pub struct EnrichRowsArgs {
    /// Input JSON array of row records
    #[arg(long, value_name = "PATH")]
    pub input: PathBuf,

    /// Output path for the enriched rows
    #[arg(long, value_name = "PATH")]
    pub output: PathBuf,

    #[command(flatten)]
    pub prompt: PromptArgs,

    /// Emit a per-record transcript of the batch
    #[arg(long)]
    pub verbose: bool,
}

/// Field provisioning inputs.
#[derive(Parser, Debug)]
#[command(about = "Create a field with a default value across records")]
pub struct ProvisionArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Field to create
    #[arg(long, value_name = "FIELD")]
    pub field: String,

    /// Shared default value for the new field
    #[arg(long, value_name = "VALUE", default_value = "")]
    pub default_value: String,
}

/// Field enumeration inputs.
#[derive(Parser, Debug)]
#[command(about = "List field names available in an index")]
pub struct FieldsArgs {
    /// Store index to sample
    #[arg(long, value_name = "INDEX")]
    pub index: String,
}

/// Facet enumeration inputs.
#[derive(Parser, Debug)]
#[command(about = "List values of a category facet")]
pub struct FacetsArgs {
    /// Store index to query
    #[arg(long, value_name = "INDEX")]
    pub index: String,

    /// Facet to enumerate, e.g. categories.lvl1
    #[arg(long, value_name = "FACET")]
    pub facet: String,

    /// Parent facet restricting the enumeration
    #[arg(long, value_name = "FACET", requires = "parent_value")]
    pub parent_facet: Option<String>,

    /// Parent facet value (full category path)
    #[arg(long, value_name = "VALUE", requires = "parent_facet")]
    pub parent_value: Option<String>,

    /// Show only the leaf label of each category path
    #[arg(long)]
    pub leaf: bool,
}

/// Index listing inputs.
#[derive(Parser, Debug)]
#[command(about = "List index names available on the store")]
pub struct IndexesArgs {}

/// Instruction library commands.
#[derive(Subcommand, Debug)]
pub enum InstructionCommand {
    /// List stored instruction names
    List(InstructionListArgs),
    /// Show a stored instruction pair
    Show(InstructionShowArgs),
    /// Create or update a stored instruction pair
    Set(InstructionSetArgs),
}

#[derive(Parser, Debug)]
pub struct InstructionListArgs {
    /// Instruction library path (default: user data dir)
    #[arg(long, value_name = "PATH")]
    pub library: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct InstructionShowArgs {
    /// Instruction name
    pub name: String,

    /// Instruction library path (default: user data dir)
    #[arg(long, value_name = "PATH")]
    pub library: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct InstructionSetArgs {
    /// Instruction name
    pub name: String,

    /// Generation system instruction template
    #[arg(long, value_name = "TEMPLATE")]
    pub instruction: Option<String>,

    /// Paired judge instruction
    #[arg(long, value_name = "TEXT")]
    pub judge_instruction: Option<String>,

    /// Instruction library path (default: user data dir)
    #[arg(long, value_name = "PATH")]
    pub library: Option<PathBuf>,
}
