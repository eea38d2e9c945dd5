//! CLI for reg-citations - Extract internal citations from regulation text.

use std::fmt;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reg_citations::{
    build_layer, link_citations, load_nodes, parse_nodes, Citation, InternalCitationParser,
    NodesError, SectionContext,
};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

/// Extract internal citations from regulation text
#[derive(Parser)]
#[command(name = "reg-citations")]
#[command(version)]
#[command(after_help = "\
Examples:
  reg-citations extract paragraph.txt --context 1005.6
  echo 'see paragraphs (b)(1) or (b)(2)' | reg-citations extract - -c 1005.6 --format html
  reg-citations layer nodes.jsonl -o layer.json")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract citations from a plain-text passage
    #[command(after_help = "\
Recognized phrases: paragraph (a)(1), paragraphs (c)(3), (d)(2), and (f),
§ 1005.10(a) and (d), §§ 1005.6(b)(3) and 1005.11(b)(1)(i)")]
    Extract {
        /// Input text file (use '-' for stdin)
        input: PathBuf,

        /// Part and section the passage belongs to, e.g. 1005.6
        #[arg(short, long)]
        context: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Json)]
        format: Format,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Build the citation layer for a file of regulation nodes
    #[command(after_help = "\
Each node is {\"label\": [\"1005\", \"6\", \"a\"], \"text\": \"...\"}, given as a JSON array
or as JSONL (one node per line).")]
    Layer {
        /// Nodes file (use '-' for stdin)
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Citation records as JSON
    Json,
    /// The passage with each citation wrapped in a link
    Html,
}

// ---------------------------------------------------------------------------
// AppError: semantic exit codes
// ---------------------------------------------------------------------------

enum AppError {
    /// Exit 10: input file not found / unreadable
    InputFile(String),
    /// Exit 11: section context malformed
    Context(String),
    /// Exit 12: nodes file invalid
    NodesFile(String),
    /// Exit 13: cannot write output file
    OutputFile(String),
}

impl AppError {
    fn exit_code(&self) -> i32 {
        match self {
            AppError::InputFile(_) => 10,
            AppError::Context(_) => 11,
            AppError::NodesFile(_) => 12,
            AppError::OutputFile(_) => 13,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InputFile(msg) => {
                write!(f, "{}\n  hint: verify the file path is correct", msg)
            }
            AppError::Context(msg) => {
                write!(
                    f,
                    "{}\n  hint: pass the part and section separated by '.' or '-', e.g. --context 1005.6",
                    msg
                )
            }
            AppError::NodesFile(msg) => {
                write!(
                    f,
                    "{}\n  hint: the file must be a JSON array of nodes, or JSONL (one node per line), each with a label of at least part and section",
                    msg
                )
            }
            AppError::OutputFile(msg) => {
                write!(
                    f,
                    "{}\n  hint: check that the output directory exists and is writable",
                    msg
                )
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reg_citations=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(e.exit_code());
    }
}

fn run() -> Result<(), AppError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            input,
            context,
            format,
            output,
        } => {
            extract_command(&input, &context, format, output.as_deref())?;
        }
        Commands::Layer { input, output } => {
            layer_command(&input, output.as_deref())?;
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Extract the citations of a single passage.
fn extract_command(
    input: &Path,
    context: &str,
    format: Format,
    output: Option<&Path>,
) -> Result<(), AppError> {
    let context: SectionContext = context
        .parse()
        .map_err(|e: reg_citations::ContextError| AppError::Context(e.to_string()))?;
    let text = read_input(input)?;

    let citations = InternalCitationParser::new().parse(&text, &context);

    let rendered = match format {
        Format::Json => to_json(&citations)?,
        Format::Html => link_citations(&text, &citations),
    };

    write_output(output, &rendered, &format!("{} citation(s)", citations.len()))
}

/// Build the citation layer of a nodes file.
fn layer_command(input: &Path, output: Option<&Path>) -> Result<(), AppError> {
    let nodes = if input == Path::new("-") {
        parse_nodes(&read_input(input)?)
    } else {
        load_nodes(input)
    }
    .map_err(|e| match e {
        NodesError::Io(_) => AppError::InputFile(format!("'{}': {}", input.display(), e)),
        _ => AppError::NodesFile(format!("'{}': {}", input.display(), e)),
    })?;

    let layer = build_layer(&nodes, &InternalCitationParser::new());
    let rendered = serde_json::to_string_pretty(&layer)
        .map_err(|e| AppError::OutputFile(format!("failed to serialize layer: {}", e)))?;

    write_output(
        output,
        &rendered,
        &format!("{} node(s), {} cited", nodes.len(), layer.len()),
    )
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Read a file, or stdin when the path is '-'.
fn read_input(input: &Path) -> Result<String, AppError> {
    if input == Path::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| AppError::InputFile(format!("failed to read from stdin: {}", e)))?;
        Ok(buf)
    } else {
        fs::read_to_string(input)
            .map_err(|e| AppError::InputFile(format!("'{}': {}", input.display(), e)))
    }
}

fn to_json(citations: &[Citation]) -> Result<String, AppError> {
    serde_json::to_string_pretty(citations)
        .map_err(|e| AppError::OutputFile(format!("failed to serialize citations: {}", e)))
}

/// Write to the output file, or stdout when none is given.
fn write_output(output: Option<&Path>, content: &str, summary: &str) -> Result<(), AppError> {
    if let Some(output_path) = output {
        fs::write(output_path, content).map_err(|e| {
            AppError::OutputFile(format!("'{}': {}", output_path.display(), e))
        })?;
        eprintln!("processed {}, wrote {}", summary, output_path.display());
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "{}", content)
            .map_err(|e| AppError::OutputFile(format!("stdout: {}", e)))?;
    }

    Ok(())
}
