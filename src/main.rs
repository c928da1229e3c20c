//! PDF Redaction CLI and server.
//!
//! `serve` runs the HTTP API; `redact` runs a single job locally through the
//! same validator and executor; `extract` dumps a PDF's text for checking
//! that redactions took.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pdfredact::domain::{RedactRequest, RequestValidator, StorageLayout};
use pdfredact::redaction::{MarkStyle, MupdfEngine, RedactionService};
use pdfredact::ServerConfig;

/// PDF Redaction Tool
///
/// Permanently remove keywords and rectangular regions from PDF documents.
#[derive(Parser)]
#[command(name = "pdfredact")]
#[command(version, about, long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, value_name = "FILE", global = true, env = "PDFREDACT_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API (upload, redact, download)
    Serve {
        /// Address to bind
        #[arg(long, env = "PDFREDACT_HOST")]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long, env = "PDFREDACT_PORT")]
        port: Option<u16>,

        /// Directory uploaded files are stored in
        #[arg(long, value_name = "DIR", env = "PDFREDACT_UPLOADS_DIR")]
        uploads_dir: Option<PathBuf>,

        /// Directory redacted files are written to
        #[arg(long, value_name = "DIR", env = "PDFREDACT_OUTPUTS_DIR")]
        outputs_dir: Option<PathBuf>,
    },

    /// Redact a local PDF
    Redact {
        /// Input PDF file path
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Directory for the redacted_<name> output (defaults to the configured outputs dir)
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Comma-separated keywords to redact
        #[arg(short, long, value_name = "KEYWORDS")]
        keywords: Option<String>,

        /// 1-indexed page range, e.g. "1-3,5" (default: all pages)
        #[arg(long, value_name = "RANGE")]
        pages: Option<String>,

        /// Remove every embedded image on processed pages
        #[arg(long)]
        remove_images: bool,

        /// Manual box as page,x0,y0,x1,y1 (zero-indexed page; repeatable)
        #[arg(long = "box", value_name = "BOX")]
        boxes: Vec<String>,
    },

    /// Extract text from a PDF (for debugging and verification)
    Extract {
        /// Input PDF file path
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Output text file (optional, defaults to stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "pdfredact=debug,tower_http=debug"
    } else {
        "pdfredact=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Parses a `page,x0,y0,x1,y1` box argument into its JSON request shape.
fn parse_box_arg(arg: &str) -> Result<Value> {
    let parts: Vec<&str> = arg.split(',').map(str::trim).collect();
    let [page, x0, y0, x1, y1] = parts.as_slice() else {
        anyhow::bail!("Box '{}' must have the form page,x0,y0,x1,y1", arg);
    };

    let page: u64 = page
        .parse()
        .with_context(|| format!("Invalid page in box '{}'", arg))?;
    let mut coords = [0.0f64; 4];
    for (slot, text) in coords.iter_mut().zip([x0, y0, x1, y1]) {
        *slot = text
            .parse()
            .with_context(|| format!("Invalid coordinate '{}' in box '{}'", text, arg))?;
    }

    Ok(json!({
        "page": page,
        "x0": coords[0],
        "y0": coords[1],
        "x1": coords[2],
        "y1": coords[3],
    }))
}

struct RedactArgs<'a> {
    input: &'a Path,
    output_dir: Option<&'a Path>,
    keywords: Option<&'a str>,
    pages: Option<&'a str>,
    remove_images: bool,
    boxes: &'a [String],
}

fn redact(config: &ServerConfig, args: RedactArgs<'_>, verbose: bool) -> Result<()> {
    let input = args.input;
    if !input.exists() {
        anyhow::bail!("Input file does not exist: {}", input.display());
    }

    let uploads = input
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let outputs = args.output_dir.unwrap_or(config.outputs_dir.as_path());
    let layout = StorageLayout::new(uploads, outputs);

    let request = RedactRequest {
        filename: input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        keywords: args.keywords.map(Value::from),
        page_range: args.pages.map(str::to_owned),
        remove_graphics: Some(args.remove_images),
        manual_boxes: Some(
            args.boxes
                .iter()
                .map(|b| parse_box_arg(b))
                .collect::<Result<Vec<_>>>()?,
        ),
    };

    let job = RequestValidator::new(&layout, &config.placeholder_label)
        .validate(&request)
        .with_context(|| "Invalid redaction request")?;

    if verbose {
        println!("Input:    {}", input.display());
        println!("Keywords: {}", job.keywords.len());
        println!("Boxes:    {}", job.manual_boxes.len());
        println!("Pages:    {}", if job.page_filter.is_all() {
            "all".to_string()
        } else {
            format!("{:?}", job.page_filter.to_vec())
        });
    }

    let engine = MupdfEngine::new().with_max_hits(config.max_hits);
    let style = MarkStyle::new(config.fill_color, config.placeholder_label.clone());
    let service = RedactionService::new(Box::new(engine), layout.outputs_dir(), style);
    let outcome = service.execute(job).with_context(|| "Redaction failed")?;
    let result = &outcome.result;

    if verbose {
        println!("\nRedaction Summary:");
        println!("  Pages processed:    {}", result.pages_processed);
        println!("  Pages modified:     {}", result.pages_modified);
        println!("  Pages failed:       {}", result.pages_failed);
        println!("  Instances redacted: {}", result.instances_redacted);
        println!("  Boxes skipped:      {}", result.boxes_skipped);
    }

    if result.has_changes() {
        println!(
            "✓ Successfully redacted {} instance(s) → {}",
            result.instances_redacted,
            outcome.output.display()
        );
    } else {
        println!(
            "⚠ No instances found to redact; copied → {}",
            outcome.output.display()
        );
    }

    Ok(())
}

fn extract(input: &Path, output: Option<&Path>) -> Result<()> {
    if !input.exists() {
        anyhow::bail!("Input file does not exist: {}", input.display());
    }

    let text =
        pdfredact::extract_text_from_pdf(input).with_context(|| "Text extraction failed")?;

    if let Some(output_path) = output {
        std::fs::write(output_path, &text)
            .with_context(|| format!("Failed to write to {}", output_path.display()))?;
        println!(
            "✓ Extracted {} characters → {}",
            text.len(),
            output_path.display()
        );
    } else {
        println!("{}", text);
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = ServerConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve {
            host,
            port,
            uploads_dir,
            outputs_dir,
        } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(dir) = uploads_dir {
                config.uploads_dir = dir;
            }
            if let Some(dir) = outputs_dir {
                config.outputs_dir = dir;
            }
            config.validate()?;

            tokio::runtime::Runtime::new()
                .context("Failed to start async runtime")?
                .block_on(pdfredact::api::serve(config))?;
        }
        Commands::Redact {
            input,
            output_dir,
            keywords,
            pages,
            remove_images,
            boxes,
        } => {
            config.validate()?;
            redact(
                &config,
                RedactArgs {
                    input: &input,
                    output_dir: output_dir.as_deref(),
                    keywords: keywords.as_deref(),
                    pages: pages.as_deref(),
                    remove_images,
                    boxes: &boxes,
                },
                cli.verbose,
            )?;
        }
        Commands::Extract { input, output } => {
            extract(&input, output.as_deref())?;
        }
    }

    Ok(())
}
