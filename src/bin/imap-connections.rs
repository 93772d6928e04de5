#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! CLI for checking configured IMAP connections

use clap::{Parser, Subcommand};
use imap_connections::{BatchReport, ConnectionRegistry, ConnectionValidator, Error, Settings};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "imap-connections")]
#[command(about = "Check that configured IMAP mailboxes can connect")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Settings file (default: $IMAP_CONFIG or imap.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Validate that mailboxes can connect. Exits 1 if any fails.
    Validate {
        /// Connections to check (default: all)
        connections: Vec<String>,

        /// Give up on a single connection after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// List configured connections without connecting
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let settings = match &args.config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::from_env()?,
    };
    let registry = ConnectionRegistry::from_settings(settings)?;

    match &args.command {
        Command::Validate {
            connections,
            timeout,
        } => cmd_validate(&registry, &args, connections, *timeout).await,
        Command::List => {
            cmd_list(&registry, &args)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn cmd_validate(
    registry: &ConnectionRegistry,
    args: &Args,
    names: &[String],
    timeout: Option<u64>,
) -> anyhow::Result<ExitCode> {
    let selected = match registry.resolve(names) {
        Ok(selected) => selected,
        Err(Error::UnknownConnection { names }) => {
            eprintln!(
                "One or more connections given are not available: {}",
                names.join(", ")
            );
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e.into()),
    };

    let mut validator = ConnectionValidator::new();
    if let Some(secs) = timeout {
        validator = validator.with_timeout(Duration::from_secs(secs));
    }

    let report = validator.run(&selected).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(if report.exit_code() == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn cmd_list(registry: &ConnectionRegistry, args: &Args) -> anyhow::Result<()> {
    if args.json {
        let entries: Vec<serde_json::Value> = registry
            .iter()
            .map(|c| {
                serde_json::json!({
                    "name": c.name(),
                    "address": c.address(),
                    "username": c.username(),
                    "enabled": c.is_enabled(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    let rows: Vec<[String; 4]> = registry
        .iter()
        .map(|c| {
            [
                c.name().to_string(),
                c.address().to_string(),
                c.username().to_string(),
                if c.is_enabled() { "yes" } else { "no" }.to_string(),
            ]
        })
        .collect();
    print_table(["Connection", "Address", "Username", "Enabled"], &rows);
    println!("\nTotal connections: {}", rows.len());
    Ok(())
}

fn print_report(report: &BatchReport) {
    let rows: Vec<[String; 4]> = report
        .results
        .iter()
        .map(|r| {
            [
                r.name.clone(),
                r.outcome.to_string(),
                r.address.clone(),
                r.username.clone(),
            ]
        })
        .collect();
    print_table(["Connection", "Result", "Address", "Username"], &rows);
    println!("\nTotal connections: {}", report.len());
}

fn print_table(header: [&str; 4], rows: &[[String; 4]]) {
    let mut widths = header.map(str::len);
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: [&str; 4]| {
        format!(
            "{:<w0$}  {:<w1$}  {:<w2$}  {}",
            cells[0],
            cells[1],
            cells[2],
            cells[3],
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2],
        )
    };

    println!("{}", line(header));
    println!("{}", "-".repeat(widths.iter().sum::<usize>() + 6));
    for row in rows {
        println!(
            "{}",
            line([
                row[0].as_str(),
                row[1].as_str(),
                row[2].as_str(),
                row[3].as_str()
            ])
        );
    }
}
