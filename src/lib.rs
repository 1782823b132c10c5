//! Eventlabel: temporal event labels for video.
//!
//! Eventlabel models events in videos at two levels: per-frame detections
//! and time-spanning video events that hold event-level attributes,
//! temporal objects, per-frame detections and references to child labels.
//! Schemas describe which labels and attributes are allowed; they can be
//! inferred from data, validated against, merged and compared.
//!
//! # Modules
//!
//! - [`events`]: Detected and video events, their containers, schemas,
//!   frame renderers and the label graph
//! - [`objects`]: Detected and video objects that events contain
//! - [`attrs`]: Attributes and attribute schemas
//! - [`frames`]: Frame ranges (supports)
//! - [`geometry`]: Bounding boxes and masks
//! - [`labels`]: Capabilities shared by the label types
//! - [`validation`]: Batch validation and error reporting
//! - [`io_json`]: Reading and writing JSON files
//! - [`error`]: Error types for eventlabel operations

pub mod attrs;
pub mod error;
pub mod events;
pub mod frames;
pub mod geometry;
pub mod io_json;
pub mod labels;
pub mod objects;
pub mod validation;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

pub use error::{EventlabelError, PreconditionError, SchemaError, SerialError};
pub use events::{
    DetectedEvent, DetectedEventContainer, EventContainerSchema, EventSchema, LabelGraph,
    VideoEvent, VideoEventContainer,
};

use labels::FrameRenderer;

/// The eventlabel CLI application.
#[derive(Parser)]
#[command(name = "eventlabel")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Validate video events against an event schema.
    Validate(ValidateArgs),
    /// Print the active schema of a set of video events.
    Schema(SchemaArgs),
    /// Print the frame-level projection of a set of video events.
    Render(RenderArgs),
}

/// Arguments for the validate subcommand.
#[derive(clap::Args)]
struct ValidateArgs {
    /// Video events JSON file to validate.
    input: PathBuf,

    /// Event container schema JSON file.
    #[arg(long, env = "EVENTLABEL_SCHEMA")]
    schema: PathBuf,

    /// Treat warnings as errors (exit non-zero if any warnings).
    #[arg(long)]
    strict: bool,

    /// Output format for the report.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    output: ReportFormat,
}

/// Arguments for the schema subcommand.
#[derive(clap::Args)]
struct SchemaArgs {
    /// Video events JSON file.
    input: PathBuf,
}

/// Arguments for the render subcommand.
#[derive(clap::Args)]
struct RenderArgs {
    /// Video events JSON file.
    input: PathBuf,

    /// Render only this frame.
    #[arg(long)]
    frame: Option<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

/// Run the eventlabel CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), EventlabelError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Validate(args)) => run_validate(args),
        Some(Commands::Schema(args)) => run_schema(args),
        Some(Commands::Render(args)) => run_render(args),
        None => {
            println!("eventlabel {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Temporal event labels for video.");
            println!();
            println!("Run 'eventlabel --help' for usage information.");
            Ok(())
        }
    }
}

/// Execute the validate subcommand.
fn run_validate(args: ValidateArgs) -> Result<(), EventlabelError> {
    let events = io_json::read_events_json(&args.input)?;
    let schema = io_json::read_schema_json(&args.schema)?;
    let graph = LabelGraph::from_events(&events)?;

    let opts = validation::ValidateOptions {
        strict: args.strict,
    };
    let report = validation::validate_events(&events, &schema, &graph, &opts);

    match args.output {
        ReportFormat::Json => print_json(&report.to_json())?,
        ReportFormat::Text => print!("{}", report),
    }

    // Determine exit status
    let has_errors = report.error_count() > 0;
    let has_warnings = report.warning_count() > 0;

    if has_errors || (opts.strict && has_warnings) {
        Err(EventlabelError::ValidationFailed {
            error_count: report.error_count(),
            warning_count: report.warning_count(),
            report,
        })
    } else {
        Ok(())
    }
}

/// Execute the schema subcommand.
fn run_schema(args: SchemaArgs) -> Result<(), EventlabelError> {
    let events = io_json::read_events_json(&args.input)?;
    let schema = EventContainerSchema::build_active_schema(&events)?;
    tracing::info!(labels = schema.iter_event_labels().count(), "built active schema");
    print_json(&schema)
}

/// Execute the render subcommand.
fn run_render(args: RenderArgs) -> Result<(), EventlabelError> {
    let events = io_json::read_events_json(&args.input)?;
    let renderer = events::VideoEventContainerFrameRenderer::new(&events);

    match args.frame {
        Some(frame_number) => {
            let rendered = renderer.render_frame(frame_number).unwrap_or_default();
            print_json(&rendered)
        }
        None => print_json(&renderer.render_all_frames()),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), EventlabelError> {
    let json = serde_json::to_string_pretty(value).map_err(EventlabelError::JsonWrite)?;
    println!("{}", json);
    Ok(())
}
