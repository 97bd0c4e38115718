mod run;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use thiserror::Error;

use cdesynth_core::{
    Error as CoreError, GraphSummary, Template, normalize_frequencies, template_json_schema,
    validate_template, validate_template_json,
};
use cdesynth_eval::{EvalError, FieldSelector, count_csv, frequencies, render_markdown, render_report};
use cdesynth_generate::output::csv::write_dataset_csv;
use cdesynth_generate::output::default_output_path;
use cdesynth_generate::{
    GenerateOptions, GenerationEngine, GenerationError, builtin_registry, resolve_row_count,
};
use cdesynth_plan::{CallArgs, PlanError, load_relationship_specs};
use run::{RunError, RunManifest, ensure_parent, init_logging, write_json};

#[derive(Debug, Error)]
enum CliError {
    #[error("run error: {0}")]
    Run(#[from] RunError),
    #[error("template error: {0}")]
    Core(#[from] CoreError),
    #[error("relationship error: {0}")]
    Plan(#[from] PlanError),
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),
    #[error("evaluation error: {0}")]
    Eval(#[from] EvalError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Parser, Debug)]
#[command(name = "cdesynth", version, about = "Synthetic survey data generator")]
struct Cli {
    /// Append JSON log lines to this file.
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a synthetic dataset from a template.
    Generate(GenerateArgs),
    /// Print the relationship execution plan.
    Plan(PlanArgs),
    /// Report observed response frequencies of a generated CSV.
    Frequencies(FrequenciesArgs),
    /// Validate a template without generating data.
    Validate(ValidateArgs),
    /// Print the template JSON Schema.
    Schema(SchemaArgs),
    /// List registered UDFs and relationships.
    List,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Template YAML file.
    #[arg(short, long, value_name = "TEMPLATE")]
    template: PathBuf,
    /// Relationship configuration file(s). Defaults to the template's list.
    #[arg(short, long = "relationships", value_name = "REL", num_args = 1..)]
    relationships: Vec<PathBuf>,
    /// Number of records. Overrides the template's row_count.
    #[arg(short = 'n', long)]
    rows: Option<u64>,
    /// Output CSV path. Overrides the template's output_path.
    #[arg(short, long)]
    out: Option<PathBuf>,
    /// Seed for reproducible output. Overrides the template's seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Write a JSON run manifest with the generation report.
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct PlanArgs {
    /// Relationship configuration file(s).
    #[arg(short, long = "relationships", value_name = "REL", num_args = 1.., required = true)]
    relationships: Vec<PathBuf>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Args, Debug)]
struct FrequenciesArgs {
    /// Generated CSV file.
    file: PathBuf,
    /// Fields as VARIABLE or VARIABLE=VALUE.
    #[arg(short, long = "fields", value_name = "FIELD", num_args = 1.., required = true)]
    fields: Vec<String>,
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    format: ReportFormat,
}

#[derive(Args, Debug)]
struct ValidateArgs {
    /// Template YAML file.
    #[arg(short, long, value_name = "TEMPLATE")]
    template: PathBuf,
}

#[derive(Args, Debug)]
struct SchemaArgs {
    /// Write the schema here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ReportFormat {
    Text,
    Markdown,
    Json,
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref())?;

    match cli.command {
        Command::Generate(args) => run_generate(args),
        Command::Plan(args) => run_plan(args),
        Command::Frequencies(args) => run_frequencies(args),
        Command::Validate(args) => run_validate(args),
        Command::Schema(args) => run_schema(args),
        Command::List => run_list(),
    }
}

/// Parse a template, checking it against the template JSON Schema first.
fn load_template(path: &Path) -> Result<Template, CliError> {
    let contents = fs::read_to_string(path)?;
    let document: serde_json::Value = serde_yaml::from_str(&contents)?;
    let schema = serde_json::to_value(template_json_schema())?;

    let issues = validate_template_json(&document, &schema);
    if !issues.is_empty() {
        for issue in &issues {
            tracing::error!(template = %path.display(), error = %issue, "template schema violation");
        }
        return Err(CliError::InvalidConfig(format!(
            "{} violates the template schema ({} issue(s)): {}",
            path.display(),
            issues.len(),
            issues
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ")
        )));
    }

    Ok(serde_json::from_value(document)?)
}

fn run_generate(args: GenerateArgs) -> Result<(), CliError> {
    let started_at = chrono::Utc::now();
    let timer = Instant::now();

    let template = load_template(&args.template)?;
    let relationship_paths = if args.relationships.is_empty() {
        template
            .relationships
            .as_ref()
            .map(|files| files.paths())
            .unwrap_or_default()
    } else {
        args.relationships.clone()
    };
    let relationships = load_relationship_specs(&relationship_paths)?;
    let rows = resolve_row_count(args.rows, &template)?;

    tracing::info!(
        template = %args.template.display(),
        relationship_files = relationship_paths.len(),
        relationships = relationships.len(),
        rows,
        "run started"
    );

    let registry = builtin_registry();
    let engine = GenerationEngine::new(&registry, GenerateOptions { seed: args.seed });
    let dataset = engine.run(&template, &relationships, rows)?;

    let out_path = match args.out.clone().or_else(|| template.output_path.clone()) {
        Some(path) => path,
        None => default_output_path(Path::new("."), chrono::Local::now().date_naive()),
    };
    ensure_parent(&out_path)?;
    let bytes_written = write_dataset_csv(&out_path, &dataset.header, &dataset.rows)
        .map_err(GenerationError::from)?;
    tracing::info!(
        path = %out_path.display(),
        rows = dataset.len(),
        bytes_written,
        seed = dataset.report.seed,
        "dataset written"
    );

    if let Some(report_path) = &args.report {
        let manifest = RunManifest::new(
            started_at,
            &args.template,
            &relationship_paths,
            &out_path,
            bytes_written,
            dataset.report,
        );
        write_json(report_path, &manifest)?;
        tracing::info!(path = %report_path.display(), "report written");
    }

    tracing::info!(
        status = "success",
        duration_ms = timer.elapsed().as_millis() as u64,
        "run finished"
    );
    println!("{}", out_path.display());
    Ok(())
}

#[derive(Debug, Serialize)]
struct PlanStepView<'a> {
    name: &'a str,
    dependencies: Vec<&'a str>,
    modifies: Vec<&'a str>,
    #[serde(skip_serializing_if = "CallArgs::is_empty")]
    args: &'a CallArgs,
}

#[derive(Debug, Serialize)]
struct PlanView<'a> {
    steps: Vec<PlanStepView<'a>>,
    graph: GraphSummary,
}

fn run_plan(args: PlanArgs) -> Result<(), CliError> {
    let specs = load_relationship_specs(&args.relationships)?;
    let registry = builtin_registry();
    let plan = registry.plan(&specs)?;

    let view = PlanView {
        steps: plan
            .steps()
            .iter()
            .map(|step| PlanStepView {
                name: step.name(),
                dependencies: step.dependencies().iter().map(String::as_str).collect(),
                modifies: step.modifies().iter().map(String::as_str).collect(),
                args: &step.args,
            })
            .collect(),
        graph: plan.summary(),
    };

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view)?),
        OutputFormat::Text => {
            for (index, step) in view.steps.iter().enumerate() {
                println!(
                    "{:>3}. {} [{}] -> [{}]",
                    index + 1,
                    step.name,
                    step.dependencies.join(", "),
                    step.modifies.join(", ")
                );
            }
            println!(
                "{} step(s), {} variable(s), {} edge(s)",
                view.steps.len(),
                view.graph.nodes,
                view.graph.edges
            );
        }
    }
    Ok(())
}

fn run_frequencies(args: FrequenciesArgs) -> Result<(), CliError> {
    let selectors = args
        .fields
        .iter()
        .map(|field| field.parse::<FieldSelector>())
        .collect::<Result<Vec<_>, _>>()?;
    let counts = count_csv(&args.file)?;
    let report = frequencies(&counts, &selectors)?;

    match args.format {
        ReportFormat::Text => println!("{}", render_report(&report)),
        ReportFormat::Markdown => print!("{}", render_markdown(&report)),
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<(), CliError> {
    let mut template = load_template(&args.template)?;
    validate_template(&template)?;
    normalize_frequencies(&mut template)?;

    if let Some(files) = &template.relationships {
        let specs = load_relationship_specs(&files.paths())?;
        builtin_registry().plan(&specs)?;
    }

    println!(
        "{} is valid ({} variable(s))",
        args.template.display(),
        template.variables.len()
    );
    Ok(())
}

fn run_schema(args: SchemaArgs) -> Result<(), CliError> {
    let schema = template_json_schema();
    match args.out {
        Some(path) => {
            write_json(&path, &schema)?;
            tracing::info!(path = %path.display(), "schema written");
        }
        None => println!("{}", serde_json::to_string_pretty(&schema)?),
    }
    Ok(())
}

fn run_list() -> Result<(), CliError> {
    let registry = builtin_registry();

    println!("udfs:");
    for name in registry.udf_names() {
        println!("  {name}");
    }

    println!("relationships:");
    for name in registry.relationship_names() {
        let Some(relationship) = registry.relationship(&name) else {
            continue;
        };
        let dependencies: Vec<&str> = relationship
            .dependencies
            .iter()
            .map(String::as_str)
            .collect();
        println!(
            "  {name} [{}] -> {} variable(s)",
            dependencies.join(", "),
            relationship.modifies.len()
        );
    }
    Ok(())
}
