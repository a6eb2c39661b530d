use std::path::PathBuf;
use std::process::ExitCode;

use bytes_counter::metrics;
use bytes_counter::Blob;
use bytes_counter::Composite;
use bytes_counter::CounterConfig;
use bytes_counter::Result;
use bytes_counter::SizeCoordinator;
use bytes_counter::SizeEvent;
use bytes_counter::Value;
use clap::ArgGroup;
use clap::Parser;
use tokio::io::AsyncReadExt;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "bytes-counter")]
#[command(version)]
#[command(about = "Counts the UTF-8 bytes a value occupies once serialized", long_about = None)]
#[command(group(ArgGroup::new("input").args(["text", "file", "form", "query"])))]
struct Args {
    /// Text to measure. Reads stdin when no input is given.
    text: Option<String>,

    /// Measure a file as a binary blob
    #[arg(long)]
    file: Option<PathBuf>,

    /// Multipart form field, repeatable
    #[arg(long, value_name = "NAME=VALUE", value_parser = parse_pair)]
    form: Vec<(String, String)>,

    /// Urlencoded query parameter, repeatable
    #[arg(long, value_name = "NAME=VALUE", value_parser = parse_pair)]
    query: Vec<(String, String)>,

    /// Print the metrics registry after the result
    #[arg(long, default_value_t = false)]
    metrics: bool,
}

fn parse_pair(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) => Ok((name.to_string(), value.to_string())),
        None => Err(format!("expected NAME=VALUE, got `{s}`")),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = CounterConfig::new()?.validate()?;
    debug!("loaded {:?}", config);

    let value = read_input(&args).await?;
    info!("measuring {:?} value", value.kind());

    let coordinator = SizeCoordinator::builder(config).build()?;
    let mut events = coordinator.subscribe();
    coordinator.set_value(value);

    let code = match events.recv().await {
        Some(SizeEvent::SizeChanged { value }) => {
            println!("{value}");
            ExitCode::SUCCESS
        }
        Some(SizeEvent::ComputationError { message }) => {
            error!("computation failed: {}", message);
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
        None => {
            error!("coordinator stopped before publishing a size");
            ExitCode::FAILURE
        }
    };

    if args.metrics {
        print!("{}", metrics::gather_metrics());
    }
    Ok(code)
}

async fn read_input(args: &Args) -> Result<Value> {
    if !args.form.is_empty() {
        let mut form = Composite::form();
        for (name, value) in &args.form {
            form.append(name.as_str(), value.as_str());
        }
        return Ok(form.into());
    }
    if !args.query.is_empty() {
        return Ok(Composite::query_from_pairs(args.query.iter().cloned()).into());
    }
    if let Some(path) = &args.file {
        return Ok(Blob::from_path(path)?.into());
    }
    if let Some(text) = &args.text {
        return Ok(text.as_str().into());
    }

    let mut input = String::new();
    tokio::io::stdin().read_to_string(&mut input).await?;
    Ok(input.into())
}
