//! Stress CLI - Command-line interface for Synheart Stress
//!
//! Commands:
//! - predict: Assess stress for requests read from a file or stdin (batch mode)
//! - run: Assess stress for NDJSON requests streamed on stdin (streaming mode)
//! - doctor: Diagnose model artifact and configuration health
//! - schema: Print request/response schema information

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{fmt, EnvFilter};

use synheart_stress::sanitizer::NUMERIC_RANGES;
use synheart_stress::types::{FeatureVector, PredictionResult, StatusReport};
use synheart_stress::vocabulary::EncoderRegistry;
use synheart_stress::{
    StressError, StressPredictor, SynonymTable, DEFAULT_MODEL_PATH, PRODUCER_NAME, STRESS_VERSION,
};

/// Stress - Stress-level inference over behavioral and physiological signals
#[derive(Parser)]
#[command(name = "stress")]
#[command(author = "Synheart AI Inc")]
#[command(version = STRESS_VERSION)]
#[command(about = "Assess stress level from behavioral and physiological signals", long_about = None)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Model artifact path
    #[arg(long, global = true, env = "STRESS_MODEL_PATH", default_value = DEFAULT_MODEL_PATH)]
    model: PathBuf,

    /// Synonym table (JSON) replacing the one carried by the artifact
    #[arg(long, global = true)]
    synonyms: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assess stress for requests in a file (batch mode)
    Predict {
        /// Input file path (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Assess stress for NDJSON requests streamed on stdin (streaming mode)
    Run {
        /// Flush output after each record
        #[arg(long, default_value = "true")]
        flush: bool,
    },

    /// Diagnose model artifact and configuration health
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,

        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one request per line)
    Ndjson,
    /// A single JSON request object or an array of them
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one result per line)
    Ndjson,
    /// JSON array of results
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Request schema (feature vector)
    Input,
    /// Response schema (prediction result)
    Output,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), StressCliError> {
    match cli.command {
        Commands::Predict {
            input,
            output,
            input_format,
            output_format,
        } => {
            let predictor = load_predictor(&cli.model, cli.synonyms.as_deref())?;
            cmd_predict(&predictor, &input, &output, input_format, output_format)
        }

        Commands::Run { flush } => {
            let predictor = load_predictor(&cli.model, cli.synonyms.as_deref())?;
            cmd_run(&predictor, flush)
        }

        Commands::Doctor { json } => cmd_doctor(&cli.model, cli.synonyms.as_deref(), json),

        Commands::Schema {
            schema_type,
            json_schema,
        } => cmd_schema(schema_type, json_schema),
    }
}

fn load_synonyms(path: &Path) -> Result<SynonymTable, StressCliError> {
    let json = fs::read_to_string(path)?;
    Ok(SynonymTable::from_json(&json)?)
}

/// Load the predictor; a degraded predictor is an error for prediction commands
fn load_predictor(model: &Path, synonyms: Option<&Path>) -> Result<StressPredictor, StressCliError> {
    let synonyms = synonyms.map(load_synonyms).transpose()?;
    let predictor = StressPredictor::load_with_synonyms(model, synonyms);

    if !predictor.is_ready() {
        let reason = predictor
            .status()
            .load_error
            .unwrap_or_else(|| "model not loaded".to_string());
        return Err(StressCliError::Unavailable(reason));
    }

    Ok(predictor)
}

fn cmd_predict(
    predictor: &StressPredictor,
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
) -> Result<(), StressCliError> {
    // Read input
    let input_data = if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    let requests = parse_requests(&input_data, &input_format)?;
    if requests.is_empty() {
        return Err(StressCliError::NoRequests);
    }

    let mut results: Vec<PredictionResult> = Vec::with_capacity(requests.len());
    for request in &requests {
        results.push(predictor.predict(request)?);
    }

    let output_data = format_output(&results, &output_format)?;

    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_run(predictor: &StressPredictor, flush: bool) -> Result<(), StressCliError> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for (index, line) in stdin.lock().lines().enumerate() {
        let line = line?;
        let Some(record) = process_line(predictor, index, &line)? else {
            continue;
        };

        writeln!(stdout, "{}", record)?;
        if flush {
            stdout.flush()?;
        }
    }

    stdout.flush()?;
    Ok(())
}

fn cmd_doctor(model: &Path, synonyms: Option<&Path>, json: bool) -> Result<(), StressCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "stress_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Stress version {}", STRESS_VERSION),
    });

    // Check synonyms file if provided
    let synonym_table = match synonyms {
        Some(path) => match load_synonyms(path) {
            Ok(table) => {
                checks.push(DoctorCheck {
                    name: "synonyms".to_string(),
                    status: CheckStatus::Ok,
                    message: format!(
                        "Synonyms file valid ({} mood, {} face emotion entries)",
                        table.mood.len(),
                        table.face_emotion.len()
                    ),
                });
                Some(table)
            }
            Err(e) => {
                checks.push(DoctorCheck {
                    name: "synonyms".to_string(),
                    status: CheckStatus::Error,
                    message: format!("Cannot use synonyms file: {}", CliError::from(e).message),
                });
                None
            }
        },
        None => None,
    };

    let predictor = StressPredictor::load_with_synonyms(model, synonym_table);
    let status = predictor.status();

    if status.model_loaded {
        checks.push(DoctorCheck {
            name: "model".to_string(),
            status: CheckStatus::Ok,
            message: format!("Model and encoders loaded from {}", model.display()),
        });
        checks.push(DoctorCheck {
            name: "vocabularies".to_string(),
            status: CheckStatus::Ok,
            message: format!(
                "{} moods, {} face emotions",
                status.available_moods.len(),
                status.available_emotions.len()
            ),
        });
        if let (Some(registry), Some(table)) = (predictor.registry(), predictor.synonyms()) {
            checks.push(check_synonym_targets(registry, table));
        }
    } else {
        checks.push(DoctorCheck {
            name: "model".to_string(),
            status: CheckStatus::Error,
            message: status
                .load_error
                .clone()
                .unwrap_or_else(|| "Model not loaded".to_string()),
        });
    }

    // Check stdin is available (for streaming mode)
    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (streaming mode ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: STRESS_VERSION.to_string(),
        predictor: status,
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Stress Doctor Report");
        println!("====================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("Status:   {}", report.predictor.status);

        if report.predictor.model_loaded {
            println!("Moods:    {}", report.predictor.available_moods.join(", "));
            println!("Emotions: {}", report.predictor.available_emotions.join(", "));
        }

        println!("\nChecks:");
        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(StressCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn cmd_schema(schema_type: SchemaType, json_schema: bool) -> Result<(), StressCliError> {
    match schema_type {
        SchemaType::Input => {
            if json_schema {
                println!("{}", get_input_json_schema());
            } else {
                println!("Input Schema: stress.request.v1");
                println!();
                println!("All fields are required:");
                println!("- mood: string (categorical, unknown labels are remapped)");
                println!("- face_emotion: string (categorical, unknown labels are remapped)");
                for range in NUMERIC_RANGES {
                    println!(
                        "- {}: integer (clamped to {}..={})",
                        range.field, range.min, range.max
                    );
                }
            }
        }
        SchemaType::Output => {
            if json_schema {
                println!("{}", get_output_json_schema());
            } else {
                println!("Output Schema: stress.result.v1");
                println!();
                println!("- stress_level: one of low, medium, high");
                println!("- tips: ordered list of suggestions");
                println!("- input_mappings: null, or when a label was remapped:");
                println!("  {{ original_mood, mapped_mood, original_face_emotion, mapped_face_emotion }}");
            }
        }
    }

    Ok(())
}

// Helper functions

/// Turn one NDJSON input line into one output record. Blank lines yield
/// nothing; a malformed line yields a `LineError` record instead of failing
/// the stream.
fn process_line(
    predictor: &StressPredictor,
    index: usize,
    line: &str,
) -> Result<Option<String>, StressCliError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let record = match serde_json::from_str::<FeatureVector>(trimmed) {
        Ok(request) => serde_json::to_string(&predictor.predict(&request)?)?,
        Err(e) => serde_json::to_string(&LineError {
            line: index + 1,
            error: format!("Failed to parse request: {}", e),
        })?,
    };
    Ok(Some(record))
}

fn check_synonym_targets(registry: &EncoderRegistry, table: &SynonymTable) -> DoctorCheck {
    let dangling = table.dangling_targets(registry);
    if dangling.is_empty() {
        DoctorCheck {
            name: "synonym_targets".to_string(),
            status: CheckStatus::Ok,
            message: "All synonym targets are known labels".to_string(),
        }
    } else {
        let entries: Vec<String> = dangling
            .iter()
            .map(|(feature, from, to)| format!("{feature}: {from} -> {to}"))
            .collect();
        DoctorCheck {
            name: "synonym_targets".to_string(),
            status: CheckStatus::Warning,
            message: format!(
                "Synonyms with unknown targets will fall back to defaults: {}",
                entries.join(", ")
            ),
        }
    }
}

fn parse_requests(data: &str, format: &InputFormat) -> Result<Vec<FeatureVector>, StressCliError> {
    match format {
        InputFormat::Ndjson => data
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| serde_json::from_str(line).map_err(StressCliError::from))
            .collect(),
        InputFormat::Json => {
            let value: serde_json::Value = serde_json::from_str(data)?;
            if value.is_array() {
                Ok(serde_json::from_value(value)?)
            } else {
                Ok(vec![serde_json::from_value(value)?])
            }
        }
    }
}

fn format_output(
    results: &[PredictionResult],
    format: &OutputFormat,
) -> Result<String, StressCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for result in results {
                lines.push(serde_json::to_string(result)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(results)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(results)? + "\n"),
    }
}

fn get_input_json_schema() -> String {
    let mut properties = serde_json::Map::new();
    properties.insert("mood".to_string(), serde_json::json!({ "type": "string" }));
    properties.insert(
        "face_emotion".to_string(),
        serde_json::json!({ "type": "string" }),
    );
    for range in NUMERIC_RANGES {
        properties.insert(
            range.field.to_string(),
            serde_json::json!({
                "type": "integer",
                "description": format!("Clamped to [{}, {}]", range.min, range.max)
            }),
        );
    }

    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "https://synheart.ai/schemas/stress.request.v1.json",
        "title": "stress.request.v1",
        "description": "Synheart stress prediction request",
        "type": "object",
        "required": [
            "mood", "sleep_hours", "workload", "face_emotion",
            "blink_rate", "caffeine_intake", "exercise_hours", "screen_time"
        ],
        "properties": properties
    })
    .to_string()
}

fn get_output_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "https://synheart.ai/schemas/stress.result.v1.json",
        "title": "stress.result.v1",
        "description": "Synheart stress prediction result",
        "type": "object",
        "required": ["stress_level", "tips", "input_mappings"],
        "properties": {
            "stress_level": { "type": "string", "enum": ["low", "medium", "high"] },
            "tips": { "type": "array", "items": { "type": "string" } },
            "input_mappings": {
                "type": ["object", "null"],
                "properties": {
                    "original_mood": { "type": "string" },
                    "mapped_mood": { "type": "string" },
                    "original_face_emotion": { "type": "string" },
                    "mapped_face_emotion": { "type": "string" }
                }
            }
        }
    })
    .to_string()
}

// Error types

#[derive(Debug)]
enum StressCliError {
    Io(io::Error),
    Stress(StressError),
    Json(serde_json::Error),
    Unavailable(String),
    NoRequests,
    DoctorFailed,
}

impl From<io::Error> for StressCliError {
    fn from(e: io::Error) -> Self {
        StressCliError::Io(e)
    }
}

impl From<StressError> for StressCliError {
    fn from(e: StressError) -> Self {
        match e {
            StressError::ServiceUnavailable(reason) => StressCliError::Unavailable(reason),
            other => StressCliError::Stress(other),
        }
    }
}

impl From<serde_json::Error> for StressCliError {
    fn from(e: serde_json::Error) -> Self {
        StressCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<StressCliError> for CliError {
    fn from(e: StressCliError) -> Self {
        match e {
            StressCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            StressCliError::Stress(e) => CliError {
                code: "STRESS_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'stress doctor' for details".to_string()),
            },
            StressCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'stress schema input' for the request format".to_string()),
            },
            StressCliError::Unavailable(reason) => CliError {
                code: "SERVICE_UNAVAILABLE".to_string(),
                message: reason,
                hint: Some("Check --model or STRESS_MODEL_PATH and redeploy a valid artifact".to_string()),
            },
            StressCliError::NoRequests => CliError {
                code: "NO_REQUESTS".to_string(),
                message: "No requests found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            StressCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct LineError {
    line: usize,
    error: String,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    predictor: StatusReport,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
