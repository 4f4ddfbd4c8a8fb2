//! SpatialIQ CLI - Command-line interface for SpatialIQ
//!
//! Commands:
//! - predict: Predict one student from a JSON object
//! - batch: Predict every row of a CSV file and write the annotated CSV
//! - validate: Check CSV rows against the field catalogue
//! - template: Write a CSV template with example rows
//! - schema: Print the field catalogue
//! - rules: Print score terms, cut points and recommendation rules

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use spatialiq::classifier::ClassifierConfig;
use spatialiq::encoder::{self, ReportEncoder};
use spatialiq::pipeline::SpatialPipeline;
use spatialiq::schema::{describe_fields, RawFieldsAdapter, FieldKind, FIELDS, SCHEMA_VERSION};
use spatialiq::tabular::{read_csv, write_batch_csv, write_template};
use spatialiq::types::RowFailure;
use spatialiq::{ComputeError, ValidationError, PRODUCER_NAME, SPATIALIQ_VERSION};

/// SpatialIQ - Spatial intelligence scoring for student records
#[derive(Parser)]
#[command(name = "spatialiq")]
#[command(version = SPATIALIQ_VERSION)]
#[command(about = "Score student records for spatial intelligence", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict one student from a JSON object
    Predict {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Classifier configuration (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "json")]
        format: OutputFormat,
    },

    /// Predict every row of a CSV file
    Batch {
        /// Input CSV path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output CSV path (use - for stdout)
        #[arg(short, long)]
        output: PathBuf,

        /// Write a JSON batch summary report to this path
        #[arg(long)]
        summary: Option<PathBuf>,

        /// Classifier configuration (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate CSV rows without predicting
    Validate {
        /// Input CSV path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a CSV template with example rows
    Template {
        /// Output CSV path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,
    },

    /// Print the input field catalogue
    Schema {
        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },

    /// Print score terms, cut points and recommendation rules
    Rules {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON report
    Json,
    /// Pretty-printed JSON report
    JsonPretty,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), SpatialCliError> {
    match cli.command {
        Commands::Predict {
            input,
            config,
            format,
        } => cmd_predict(&input, config.as_deref(), format),

        Commands::Batch {
            input,
            output,
            summary,
            config,
        } => cmd_batch(&input, &output, summary.as_deref(), config.as_deref()),

        Commands::Validate { input, json } => cmd_validate(&input, json),

        Commands::Template { output } => cmd_template(&output),

        Commands::Schema { json_schema } => cmd_schema(json_schema),

        Commands::Rules { json } => cmd_rules(json),
    }
}

fn cmd_predict(
    input: &Path,
    config: Option<&Path>,
    format: OutputFormat,
) -> Result<(), SpatialCliError> {
    let input_data = read_input(input)?;
    let raw = RawFieldsAdapter::parse_object(&input_data)?;

    let pipeline = load_pipeline(config)?;
    let prediction = pipeline.predict(&raw)?;

    let pretty = matches!(format, OutputFormat::JsonPretty);
    println!(
        "{}",
        ReportEncoder::new().prediction_to_json(&prediction, pretty)?
    );
    Ok(())
}

fn cmd_batch(
    input: &Path,
    output: &Path,
    summary: Option<&Path>,
    config: Option<&Path>,
) -> Result<(), SpatialCliError> {
    let input_data = read_input(input)?;
    let table = read_csv(input_data.as_bytes())?;
    if table.rows.is_empty() {
        return Err(SpatialCliError::NoRows);
    }

    let pipeline = load_pipeline(config)?;
    let batch = pipeline.run_batch(&table.raw_rows());

    if is_stdio(output) {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        write_batch_csv(&mut handle, &table, &batch)?;
        handle.flush()?;
    } else {
        write_batch_csv(fs::File::create(output)?, &table, &batch)?;
    }

    if let Some(summary_path) = summary {
        let report = ReportEncoder::new().wrap(&batch.summary);
        fs::write(summary_path, encoder::to_json(&report, true)?)?;
    }

    eprintln!(
        "Processed {} rows: {} succeeded, {} failed",
        batch.summary.total_rows, batch.summary.succeeded, batch.summary.failed
    );
    Ok(())
}

fn cmd_validate(input: &Path, json: bool) -> Result<(), SpatialCliError> {
    let input_data = read_input(input)?;
    let table = read_csv(input_data.as_bytes())?;

    let errors: Vec<RowFailure> = table
        .raw_rows()
        .iter()
        .enumerate()
        .filter_map(|(index, raw)| {
            spatialiq::normalize(raw).err().map(|e| RowFailure {
                index,
                field: e.field.clone(),
                reason: e.reason.label().to_string(),
                message: e.to_string(),
            })
        })
        .collect();

    let unknown_columns: Vec<String> = table
        .headers
        .iter()
        .filter(|h| spatialiq::schema::field(h).is_none())
        .cloned()
        .collect();

    let report = ValidationReport {
        schema_version: SCHEMA_VERSION.to_string(),
        total_rows: table.rows.len(),
        valid_rows: table.rows.len() - errors.len(),
        invalid_rows: errors.len(),
        unknown_columns,
        errors,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total rows:   {}", report.total_rows);
        println!("Valid rows:   {}", report.valid_rows);
        println!("Invalid rows: {}", report.invalid_rows);

        if !report.unknown_columns.is_empty() {
            println!("\nIgnored columns: {}", report.unknown_columns.join(", "));
        }

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!("  - Row {}: {}", err.index + 1, err.message);
            }
        }
    }

    if report.invalid_rows > 0 {
        Err(SpatialCliError::ValidationFailed(report.invalid_rows))
    } else {
        Ok(())
    }
}

fn cmd_template(output: &Path) -> Result<(), SpatialCliError> {
    if is_stdio(output) {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        write_template(&mut handle)?;
        handle.flush()?;
    } else {
        write_template(fs::File::create(output)?)?;
    }
    Ok(())
}

fn cmd_schema(json_schema: bool) -> Result<(), SpatialCliError> {
    if json_schema {
        println!("{}", serde_json::to_string_pretty(&input_json_schema())?);
        return Ok(());
    }

    println!("Input Schema: {}", SCHEMA_VERSION);
    println!();
    println!("{:<20} {:<9} {:<9} {:<16} DOMAIN", "FIELD", "TYPE", "REQUIRED", "DEFAULT");
    for field in describe_fields() {
        println!(
            "{:<20} {:<9} {:<9} {:<16} {}",
            field.name,
            field.type_name,
            if field.required { "yes" } else { "no" },
            field.default.unwrap_or("-"),
            field.domain
        );
    }
    println!();
    println!("Categorical values are matched case-insensitively; empty cells count as absent.");
    Ok(())
}

fn cmd_rules(json: bool) -> Result<(), SpatialCliError> {
    let pipeline = SpatialPipeline::default();
    let classifier = pipeline.classifier();

    let report = RulesReport {
        producer: PRODUCER_NAME.to_string(),
        version: SPATIALIQ_VERSION.to_string(),
        score_terms: classifier
            .terms()
            .iter()
            .map(|term| ScoreTermInfo {
                name: term.name.to_string(),
                weight: term.weight,
            })
            .collect(),
        cut_points: classifier.cut_points().to_vec(),
        kernel_width: classifier.kernel_width(),
        recommendation_rules: pipeline
            .engine()
            .rules()
            .iter()
            .map(|rule| RuleInfo {
                id: rule.id.to_string(),
                title: rule.title.to_string(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Score terms:");
        for term in &report.score_terms {
            println!("  {:<20} {:.2}", term.name, term.weight);
        }
        println!("\nCut points: {:?}", report.cut_points);
        println!("Kernel width: {}", report.kernel_width);
        println!("\nRecommendation rules:");
        for (idx, rule) in report.recommendation_rules.iter().enumerate() {
            println!("  {}. {} ({})", idx + 1, rule.title, rule.id);
        }
    }
    Ok(())
}

// Helper functions

fn is_stdio(path: &Path) -> bool {
    path.to_string_lossy() == "-"
}

fn read_input(input: &Path) -> Result<String, SpatialCliError> {
    if is_stdio(input) {
        if atty::is(atty::Stream::Stdin) {
            return Err(SpatialCliError::NoInput);
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn load_pipeline(config: Option<&Path>) -> Result<SpatialPipeline, SpatialCliError> {
    match config {
        Some(path) => {
            let config = ClassifierConfig::from_json(&fs::read_to_string(path)?)?;
            log::debug!("loaded classifier config from {}", path.display());
            Ok(SpatialPipeline::from_config(&config)?)
        }
        None => Ok(SpatialPipeline::default()),
    }
}

fn input_json_schema() -> serde_json::Value {
    let properties: serde_json::Map<String, serde_json::Value> = FIELDS
        .iter()
        .map(|spec| {
            let mut property = match spec.kind {
                FieldKind::Integer { min, max } => serde_json::json!({
                    "type": ["integer", "string"],
                    "minimum": min,
                    "maximum": max
                }),
                FieldKind::Real { min, max } => serde_json::json!({
                    "type": ["number", "string"],
                    "minimum": min,
                    "maximum": max
                }),
                FieldKind::Boolean => serde_json::json!({
                    "type": ["boolean", "integer", "string"]
                }),
                FieldKind::Category { labels } => serde_json::json!({
                    "type": "string",
                    "enum": labels()
                }),
            };
            property["description"] = spec.description.into();
            if let Some(default) = spec.default {
                property["default"] = default.into();
            }
            (spec.name.to_string(), property)
        })
        .collect();

    let required: Vec<&str> = FIELDS
        .iter()
        .filter(|spec| spec.required)
        .map(|spec| spec.name)
        .collect();

    serde_json::json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "title": "Student record",
        "type": "object",
        "required": required,
        "properties": properties
    })
}

// Error types

#[derive(Debug)]
enum SpatialCliError {
    Io(io::Error),
    Compute(ComputeError),
    Json(serde_json::Error),
    Validation(ValidationError),
    NoInput,
    NoRows,
    ValidationFailed(usize),
}

impl From<io::Error> for SpatialCliError {
    fn from(e: io::Error) -> Self {
        SpatialCliError::Io(e)
    }
}

impl From<ComputeError> for SpatialCliError {
    fn from(e: ComputeError) -> Self {
        match e {
            ComputeError::Validation(v) => SpatialCliError::Validation(v),
            other => SpatialCliError::Compute(other),
        }
    }
}

impl From<serde_json::Error> for SpatialCliError {
    fn from(e: serde_json::Error) -> Self {
        SpatialCliError::Json(e)
    }
}

impl From<ValidationError> for SpatialCliError {
    fn from(e: ValidationError) -> Self {
        SpatialCliError::Validation(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<SpatialCliError> for CliError {
    fn from(e: SpatialCliError) -> Self {
        match e {
            SpatialCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            SpatialCliError::Compute(e) => {
                let (code, hint) = match &e {
                    ComputeError::InvalidConfig(_) => {
                        ("INVALID_CONFIG", "Run 'spatialiq rules --json' to see valid term names")
                    }
                    ComputeError::CsvError(_) => ("CSV_ERROR", "Check the CSV header and quoting"),
                    ComputeError::JsonError(_) => ("JSON_ERROR", "Check JSON syntax"),
                    _ => ("PARSE_ERROR", "Ensure input is a JSON object of student fields"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            SpatialCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            SpatialCliError::Validation(e) => CliError {
                code: "VALIDATION_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'spatialiq schema' for field names and domains".to_string()),
            },
            SpatialCliError::NoInput => CliError {
                code: "NO_INPUT".to_string(),
                message: "Refusing to read from an interactive terminal".to_string(),
                hint: Some("Pipe data into stdin or pass a file with --input".to_string()),
            },
            SpatialCliError::NoRows => CliError {
                code: "NO_ROWS".to_string(),
                message: "No data rows found in input".to_string(),
                hint: Some("Run 'spatialiq template' for an example file".to_string()),
            },
            SpatialCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} rows failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    schema_version: String,
    total_rows: usize,
    valid_rows: usize,
    invalid_rows: usize,
    unknown_columns: Vec<String>,
    errors: Vec<RowFailure>,
}

#[derive(serde::Serialize)]
struct RulesReport {
    producer: String,
    version: String,
    score_terms: Vec<ScoreTermInfo>,
    cut_points: Vec<f64>,
    kernel_width: f64,
    recommendation_rules: Vec<RuleInfo>,
}

#[derive(serde::Serialize)]
struct ScoreTermInfo {
    name: String,
    weight: f64,
}

#[derive(serde::Serialize)]
struct RuleInfo {
    id: String,
    title: String,
}
