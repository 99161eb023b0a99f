//! xwrap CLI - Read XML documents through the surrogate-aware input formatter
//!
//! This binary provides command-line interfaces for:
//! - read: parse a document as a declared type and print it as JSON
//! - resolve: show the surrogate type substituted for a declared type
//! - negotiate: report whether a content type is accepted

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::error::Error;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use xwrap_format::match_media_type;
use xwrap_io::{
    FormatterConfig, FormatterOptions, FormatterOptionsBuilder, ReadMetrics, StreamRequest,
    TypeDesc, Value, XmlInputFormatter,
};

#[derive(Parser)]
#[command(name = "xwrap")]
#[command(about = "Surrogate-aware XML input formatter")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read a document as a declared type and print JSON
    ///
    /// Examples:
    ///   xwrap read groups.xml --type 'Sequence<Sequence<int>>'
    ///   xwrap read - --type 'List<string>' --content-type 'text/xml; charset=utf-16'
    Read {
        /// Input file ("-" for stdin)
        input: PathBuf,
        /// Declared type expression
        #[arg(long = "type", short = 't')]
        type_expr: String,
        /// Content type reported for the body
        #[arg(long, default_value = "application/xml")]
        content_type: String,
        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
        /// Print read metrics to stderr
        #[arg(long)]
        metrics: bool,
        #[command(flatten)]
        settings: SettingsArgs,
    },
    /// Print the type the serializer targets for a declared type
    Resolve {
        /// Declared type expression
        #[arg(long = "type", short = 't')]
        type_expr: String,
        #[command(flatten)]
        settings: SettingsArgs,
    },
    /// Report whether a content type is accepted
    Negotiate {
        /// Request content type
        content_type: String,
        #[command(flatten)]
        settings: SettingsArgs,
    },
}

/// Formatter settings shared by every subcommand
#[derive(Args, Debug)]
struct SettingsArgs {
    /// Formatter config file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Maximum element nesting depth
    #[arg(long)]
    max_depth: Option<usize>,
    /// Maximum characters in a text node or attribute value
    #[arg(long)]
    max_string_content_length: Option<usize>,
    /// Maximum child elements per collection
    #[arg(long)]
    max_array_length: Option<usize>,
    /// Maximum bytes in a single start tag
    #[arg(long)]
    max_bytes_per_read: Option<usize>,
    /// Maximum characters across distinct names
    #[arg(long)]
    max_name_table_char_count: Option<usize>,
}

#[derive(Serialize)]
struct ResolveSummary {
    declared: String,
    effective: String,
    element_name: String,
    wrapped: bool,
    readable: bool,
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    match cli.command {
        Commands::Read {
            input,
            type_expr,
            content_type,
            pretty,
            metrics,
            settings,
        } => {
            handle_read(&input, &type_expr, &content_type, pretty, metrics, &settings)?;
        }
        Commands::Resolve {
            type_expr,
            settings,
        } => {
            handle_resolve(&type_expr, &settings)?;
        }
        Commands::Negotiate {
            content_type,
            settings,
        } => {
            handle_negotiate(&content_type, &settings)?;
        }
    }

    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("XWRAP_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn build_options(settings: &SettingsArgs) -> Result<FormatterOptions, Box<dyn Error>> {
    let mut builder: FormatterOptionsBuilder = match &settings.config {
        Some(path) => FormatterConfig::load(path)?.into_builder(),
        None => FormatterOptions::builder(),
    };

    if let Some(value) = settings.max_depth {
        builder = builder.max_depth(value);
    }
    if let Some(value) = settings.max_string_content_length {
        builder = builder.max_string_content_length(value);
    }
    if let Some(value) = settings.max_array_length {
        builder = builder.max_array_length(value);
    }
    if let Some(value) = settings.max_bytes_per_read {
        builder = builder.max_bytes_per_read(value);
    }
    if let Some(value) = settings.max_name_table_char_count {
        builder = builder.max_name_table_char_count(value);
    }

    Ok(builder.build()?)
}

fn handle_read(
    input: &Path,
    type_expr: &str,
    content_type: &str,
    pretty: bool,
    show_metrics: bool,
    settings: &SettingsArgs,
) -> Result<(), Box<dyn Error>> {
    let declared = TypeDesc::parse(type_expr)?;
    let formatter = XmlInputFormatter::new(build_options(settings)?);

    let (value, metrics) = if input == Path::new("-") {
        let mut request = StreamRequest::new(Some(content_type), None, io::stdin());
        formatter.read_with_metrics(&mut request, &declared)?
    } else {
        let file = File::open(input)
            .map_err(|e| format!("failed to open {}: {}", input.display(), e))?;
        let length = file.metadata()?.len();
        let mut request = StreamRequest::new(Some(content_type), Some(length), file);
        formatter.read_with_metrics(&mut request, &declared)?
    };

    write_value(&value, pretty)?;
    if show_metrics {
        print_metrics(&metrics);
    }
    Ok(())
}

fn write_value(value: &Value, pretty: bool) -> Result<(), Box<dyn Error>> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if pretty {
        serde_json::to_writer_pretty(&mut out, value)?;
    } else {
        serde_json::to_writer(&mut out, value)?;
    }
    writeln!(out)?;
    Ok(())
}

fn print_metrics(metrics: &ReadMetrics) {
    eprintln!("Bytes read:  {}", metrics.bytes_read);
    eprintln!("Elements:    {}", metrics.elements);
    eprintln!("Max depth:   {}", metrics.max_depth);
    eprintln!("Wrapped:     {}", metrics.wrapped);
    eprintln!("Empty body:  {}", metrics.empty_body);
    eprintln!("Elapsed:     {:.2?}", metrics.duration);
}

fn handle_resolve(type_expr: &str, settings: &SettingsArgs) -> Result<(), Box<dyn Error>> {
    let declared = TypeDesc::parse(type_expr)?;
    let formatter = XmlInputFormatter::new(build_options(settings)?);

    let provider = formatter.resolve_provider(&declared)?;
    let effective = match &provider {
        Some(provider) => provider.wrapping_type().clone(),
        None => declared.clone(),
    };

    let summary = ResolveSummary {
        declared: declared.to_string(),
        element_name: effective.element_name(),
        effective: effective.to_string(),
        wrapped: provider.is_some(),
        readable: formatter.can_read_type(&declared),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn handle_negotiate(content_type: &str, settings: &SettingsArgs) -> Result<(), Box<dyn Error>> {
    let options = build_options(settings)?;
    match match_media_type(Some(content_type), options.supported_media_types()) {
        Some(media) => {
            println!("accepted: {}", media);
            Ok(())
        }
        None => Err(format!("content type '{}' is not accepted", content_type).into()),
    }
}
