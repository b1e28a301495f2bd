//! Sysprop client CLI

use clap::{Parser, Subcommand};
use miette::IntoDiagnostic;
use serde_json::{Map, Value};
use sysprop_client::{CallOutput, Client, DEFAULT_URL, RemoteTable};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sysprop-client")]
#[command(about = "Discover and call tools on a sysprop server")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Base URL of the server
    #[arg(long, short = 'u', default_value = DEFAULT_URL)]
    url: String,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List available operations
    List,
    /// Call an operation
    Call {
        operation: String,
        /// Arguments as key=value; values are read as JSON when possible
        args: Vec<String>,
    },
}

/// `key=value`, with the value parsed as JSON or else kept as text
fn parse_arg(arg: &str) -> miette::Result<(String, Value)> {
    let (key, raw) = arg
        .split_once('=')
        .ok_or_else(|| miette::miette!("argument '{arg}' is not key=value"))?;
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

fn print_table(table: &RemoteTable) {
    println!("{} [{}]", table.title, table.name);
    let cols: Vec<String> = table.cols.iter().map(ToString::to_string).collect();
    println!("{}\t{} : {}", table.rows_title, table.cols_title, cols.join("\t"));
    for (index, row) in table.rows.iter().enumerate() {
        let values: Vec<String> = table.row(index).map(ToString::to_string).collect();
        println!("{row}\t{}", values.join("\t"));
    }
    println!();
}

fn main() -> miette::Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .build(),
        )
    }))?;
    miette::set_panic_hook();

    let cli = Cli::parse();

    let default_filter = if cli.debug {
        "sysprop_client=debug"
    } else {
        "sysprop_client=warn"
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .into_diagnostic()?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(true)
        .with_line_number(true)
        .with_timer(tracing_subscriber::fmt::time::LocalTime::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let client = Client::connect(&cli.url)?;

    match cli.command {
        Commands::List => {
            for (name, info) in client.operations() {
                println!("{name}({})", info.params.join(", "));
                if !info.title.is_empty() {
                    println!("    {}", info.title);
                }
                if !info.doc.is_empty() {
                    println!("    {}", info.doc);
                }
            }
        }
        Commands::Call { operation, args } => {
            let args = args
                .iter()
                .map(|arg| parse_arg(arg))
                .collect::<miette::Result<Map<String, Value>>>()?;
            match client.call(&operation, args)? {
                CallOutput::Value(value) => {
                    println!("{}", serde_json::to_string_pretty(&value).into_diagnostic()?)
                }
                CallOutput::Tables(result) => result.iter().for_each(print_table),
            }
        }
    }

    Ok(())
}
