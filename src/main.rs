use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use fieldsmith::cli::{
    Command, EnrichArgs, EnrichRowsArgs, FacetsArgs, FieldsArgs, InstructionCommand, PromptArgs,
    ProvisionArgs, RootArgs, SelectionArgs,
};
use fieldsmith::config::{resolve_library_path, ModelConfig, StoreConfig};
use fieldsmith::instructions::InstructionLibrary;
use fieldsmith::model::HttpChatModel;
use fieldsmith::pipeline::{enrich_batch, EnrichmentRequest};
use fieldsmith::record::Record;
use fieldsmith::rows;
use fieldsmith::sink::{provision_field, RowSink, StoreSink};
use fieldsmith::store::{self, leaf_label, HttpStoreClient, StoreClient};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = RootArgs::parse();
    match args.command {
        Command::Enrich(args) => run_enrich(&args),
        Command::EnrichRows(args) => run_enrich_rows(&args),
        Command::Provision(args) => run_provision(&args),
        Command::Fields(args) => run_fields(&args),
        Command::Facets(args) => run_facets(&args),
        Command::Indexes(_) => run_indexes(),
        Command::Instruction(command) => run_instruction(&command),
    }
}

/// Fetch the batch from the store per the selection. Acquisition failures
/// are the only hard stops in the workflow.
fn select_records(store: &dyn StoreClient, selection: &SelectionArgs) -> Result<Vec<Record>> {
    if let Some(record_id) = &selection.record_id {
        let record = store
            .search_by_id(&selection.index, record_id)
            .with_context(|| format!("fetch record {record_id}"))?;
        return match record {
            Some(record) => Ok(vec![record]),
            None => Err(store::no_records_error(
                &selection.index,
                &format!("record id '{record_id}'"),
            )),
        };
    }
    if let (Some(facet), Some(value)) = (&selection.facet, &selection.facet_value) {
        let records = store
            .search_by_facet(&selection.index, facet, value)
            .with_context(|| format!("fetch records for {facet}:{value}"))?;
        if records.is_empty() {
            return Err(store::no_records_error(
                &selection.index,
                &format!("{facet}:\"{value}\""),
            ));
        }
        return Ok(records);
    }
    Err(anyhow!("select records with --record-id or --facet/--facet-value"))
}

/// Build the enrichment request, pulling a named instruction pair from
/// the library when requested. Explicit inline instructions win.
fn build_request(prompt: &PromptArgs) -> Result<EnrichmentRequest> {
    let mut system_instruction = prompt.system_instruction.clone();
    let mut judge_instruction = prompt.judge_instruction.clone();
    if let Some(name) = &prompt.instruction {
        let path = resolve_library_path(prompt.library.clone())?;
        let library = InstructionLibrary::load(&path)?;
        let entry = library
            .get(name)
            .ok_or_else(|| anyhow!("no instruction named '{name}' in {}", path.display()))?;
        system_instruction = Some(entry.instruction.clone());
        if judge_instruction.is_none() {
            judge_instruction = entry.judge_instruction.clone();
        }
    }
    Ok(EnrichmentRequest {
        target_field: prompt.field.clone(),
        prompt_template: prompt.prompt.clone(),
        system_instruction,
        judge_instruction,
        model: prompt.model.clone(),
        reference_file: prompt.reference_file.clone(),
    })
}

fn run_enrich(args: &EnrichArgs) -> Result<()> {
    let request = build_request(&args.prompt)?;
    let store = HttpStoreClient::new(&StoreConfig::from_env()?);
    let model = HttpChatModel::new(&ModelConfig::from_env()?);

    let mut records = select_records(&store, &args.selection)?;
    if args.verbose {
        eprintln!(
            "enrich: {} record(s) from index '{}'",
            records.len(),
            args.selection.index
        );
    }

    let mut sink = StoreSink::new(&store, &args.selection.index);
    let outcome = enrich_batch(&model, &request, &mut records, &mut sink, args.verbose);

    println!(
        "enriched {}/{} record(s) for field '{}'",
        outcome.succeeded, outcome.attempted, request.target_field
    );
    Ok(())
}

fn run_enrich_rows(args: &EnrichRowsArgs) -> Result<()> {
    let request = build_request(&args.prompt)?;
    let model = HttpChatModel::new(&ModelConfig::from_env()?);

    let mut records = rows::load_rows(&args.input)?;
    if records.is_empty() {
        return Err(anyhow!("no rows in {}", args.input.display()));
    }
    if args.verbose {
        eprintln!(
            "enrich: {} row(s) from {}",
            records.len(),
            args.input.display()
        );
    }

    let outcome = enrich_batch(&model, &request, &mut records, &mut RowSink, args.verbose);
    rows::write_rows(&args.output, &records)?;

    println!(
        "enriched {}/{} row(s) for field '{}' -> {}",
        outcome.succeeded,
        outcome.attempted,
        request.target_field,
        args.output.display()
    );
    Ok(())
}

fn run_provision(args: &ProvisionArgs) -> Result<()> {
    let store = HttpStoreClient::new(&StoreConfig::from_env()?);
    let records = select_records(&store, &args.selection)?;
    let submitted = provision_field(
        &store,
        &args.selection.index,
        &records,
        &args.field,
        &args.default_value,
    );
    println!(
        "submitted field '{}' for {} record(s) with default '{}'",
        args.field, submitted, args.default_value
    );
    Ok(())
}

fn run_fields(args: &FieldsArgs) -> Result<()> {
    let store = HttpStoreClient::new(&StoreConfig::from_env()?);
    for field in store.list_fields(&args.index)? {
        println!("{field}");
    }
    Ok(())
}

fn run_facets(args: &FacetsArgs) -> Result<()> {
    let store = HttpStoreClient::new(&StoreConfig::from_env()?);
    let parent = match (&args.parent_facet, &args.parent_value) {
        (Some(facet), Some(value)) => Some((facet.as_str(), value.as_str())),
        _ => None,
    };
    let mut values = store.facet_values(&args.index, &args.facet, parent)?;
    if let Some((_, parent_value)) = parent {
        values = store::filter_children(&values, parent_value)
            .into_iter()
            .map(|value| value.to_string())
            .collect();
    }
    for value in &values {
        if args.leaf {
            println!("{}", leaf_label(value));
        } else {
            println!("{value}");
        }
    }
    Ok(())
}

fn run_indexes() -> Result<()> {
    let store = HttpStoreClient::new(&StoreConfig::from_env()?);
    for name in store.list_indexes()? {
        println!("{name}");
    }
    Ok(())
}

fn run_instruction(command: &InstructionCommand) -> Result<()> {
    match command {
        InstructionCommand::List(args) => {
            let path = resolve_library_path(args.library.clone())?;
            let library = InstructionLibrary::load(&path)?;
            for name in library.names() {
                println!("{name}");
            }
        }
        InstructionCommand::Show(args) => {
            let path = resolve_library_path(args.library.clone())?;
            let library = InstructionLibrary::load(&path)?;
            let entry = library
                .get(&args.name)
                .ok_or_else(|| anyhow!("no instruction named '{}'", args.name))?;
            println!("name: {}", entry.name);
            println!("instruction: {}", entry.instruction);
            if let Some(judge) = &entry.judge_instruction {
                println!("judge_instruction: {judge}");
            }
        }
        InstructionCommand::Set(args) => {
            let path = resolve_library_path(args.library.clone())?;
            let mut library = InstructionLibrary::load(&path)?;
            library.set(
                &args.name,
                args.instruction.as_deref(),
                args.judge_instruction.as_deref(),
            );
            library.save()?;
            println!("stored instruction '{}' in {}", args.name, path.display());
        }
    }
    Ok(())
}
