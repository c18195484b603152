//! The fill run: resolve inputs, check the credential, fill, emit.

use crate::cli::{Cli, CliFormat};
use crate::config::{Provider, RunConfig};
use crate::error::{CliError, Result};
use crate::output::{self, Formatter};
use docfill_domain::{CompletionEngine, DocumentHandle};
use docfill_extractor::{AggregateOutput, FillOrchestrator, SchemaDeriver, SchemaDocument, TargetShape};
use docfill_llm::{OllamaEngine, OpenAiEngine};
use docfill_source::{DocumentSet, FileSystemSource, SourceError};
use std::fmt::Display;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Everything a run needs, read from disk before any document is processed.
#[derive(Debug)]
pub struct RunInputs {
    /// Schema shared by every prompt
    pub schema: SchemaDocument,
    /// Documents in enumeration order
    pub documents: Vec<DocumentHandle>,
    /// Extra instructions (may be blank)
    pub instructions: String,
}

/// Load the shape and derive its schema.
pub fn load_schema(path: &Path) -> Result<SchemaDocument> {
    let text = fs::read_to_string(path).map_err(|e| {
        CliError::Config(format!("Failed to read JSON shape {}: {}", path.display(), e))
    })?;
    let shape = TargetShape::from_skeleton_str(&text).and_then(|s| SchemaDeriver::derive(&s));
    shape.map_err(|e| {
        CliError::Config(format!(
            "Invalid JSON shape in {}, please check the file: {}",
            path.display(),
            e
        ))
    })
}

/// List the documents named on the command line.
pub fn discover_documents(source: &FileSystemSource, cli: &Cli) -> Result<Vec<DocumentHandle>> {
    let set = match (&cli.dir, &cli.file) {
        (Some(dir), _) => DocumentSet::Directory(dir.clone()),
        (None, Some(file)) => DocumentSet::File(file.clone()),
        (None, None) => {
            return Err(CliError::Config(
                "either --dir or --file must be provided".into(),
            ))
        }
    };

    let documents = source.discover(&set).map_err(|e| match e {
        SourceError::NotFound(path) => {
            CliError::Config(format!("Document source not found: {}", path.display()))
        }
        other => CliError::Source(other),
    })?;

    if documents.is_empty() {
        return Err(CliError::Config(format!("No documents found in {}", set)));
    }

    Ok(documents)
}

/// Read the optional instructions file.
pub fn load_instructions(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!(
                "Failed to read instructions {}: {}",
                path.display(),
                e
            ))
        }),
        None => Ok(String::new()),
    }
}

/// Resolve all inputs of a run.
pub fn prepare(cli: &Cli, source: &FileSystemSource) -> Result<RunInputs> {
    let schema = load_schema(&cli.shape)?;
    let documents = discover_documents(source, cli)?;
    let instructions = load_instructions(cli.instructions.as_deref())?;

    Ok(RunInputs {
        schema,
        documents,
        instructions,
    })
}

/// Fill all documents with the given engine.
pub async fn fill<E>(
    engine: E,
    source: FileSystemSource,
    inputs: RunInputs,
    config: &RunConfig,
) -> Result<AggregateOutput>
where
    E: CompletionEngine + Send + Sync + 'static,
    E::Error: Display,
{
    let orchestrator = FillOrchestrator::new(source, engine, inputs.schema, config.fill.clone())?
        .with_instructions(inputs.instructions);
    Ok(orchestrator.run(inputs.documents).await)
}

/// Execute a complete run.
pub async fn execute(cli: Cli) -> Result<()> {
    let mut config = RunConfig::load(cli.config.as_deref())?;
    config.apply_overrides(&cli);
    config.validate()?;

    let source = FileSystemSource::new();
    let inputs = prepare(&cli, &source)?;

    // Read the environment once, before anything is dispatched
    let credential =
        config.require_credential(std::env::var(&config.engine.api_key_env).ok())?;
    let request_timeout = Duration::from_secs(config.engine.request_timeout_secs);

    info!(
        documents = inputs.documents.len(),
        provider = ?config.engine.provider,
        model = %config.engine.model(),
        "Filling documents"
    );

    let output = match config.engine.provider {
        Provider::OpenAi => {
            let api_key = credential.unwrap_or_default();
            let mut engine =
                OpenAiEngine::with_timeout(api_key, config.engine.model(), request_timeout)?;
            if let Some(endpoint) = &config.engine.endpoint {
                engine = engine.with_base_url(endpoint.clone());
            }
            fill(engine, source, inputs, &config).await?
        }
        Provider::Ollama => {
            let endpoint = config
                .engine
                .endpoint
                .clone()
                .unwrap_or_else(|| docfill_llm::ollama::DEFAULT_ENDPOINT.to_string());
            let engine =
                OllamaEngine::with_timeout(endpoint, config.engine.model(), request_timeout)?;
            fill(engine, source, inputs, &config).await?
        }
    };

    info!(
        duration_ms = output.metadata().duration_ms,
        "Total time taken"
    );

    emit(&cli, &output)
}

/// Write the output where the flags say.
pub fn emit(cli: &Cli, output: &AggregateOutput) -> Result<()> {
    let formatter = Formatter::new(cli.format, !cli.no_color);

    match (&cli.output, cli.format) {
        (Some(path), CliFormat::Json) => {
            output::write_json(output, path)?;
            eprintln!("{}", formatter.summary(output));
        }
        (Some(path), _) => {
            output::write_json(output, path)?;
            println!("{}", formatter.format_output(output)?);
        }
        (None, _) => println!("{}", formatter.format_output(output)?),
    }

    Ok(())
}
