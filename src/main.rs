//! onvifscan - ONVIF camera discovery and RTSP inventory CLI.
//!
//! `scan` probes every local subnet and reconciles the full result set into
//! the inventory; `resolve` handles one device and upserts it.
#![forbid(unsafe_code)]

use std::io;
use std::time::{Duration, Instant};

use clap::{CommandFactory, Parser};

use onvifscan::cli::{Cli, Commands, CompletionsArgs, ResolveArgs, ScanArgs};
use onvifscan::error::{Result, ScanError};
use onvifscan::interfaces::SystemInterfaces;
use onvifscan::inventory::Inventory;
use onvifscan::logging::init_logging;
use onvifscan::reachability::RtspProbe;
use onvifscan::scan::{self, ScanOptions};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    // Explicit run-start timer, threaded to the reporting step
    let started = Instant::now();

    if let Err(e) = run(&cli, started) {
        output_error(&e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli, started: Instant) -> Result<()> {
    match &cli.command {
        Commands::Scan(args) => cmd_scan(args, started),
        Commands::Resolve(args) => cmd_resolve(args, started),
        Commands::Completions(args) => cmd_completions(args),
    }
}

/// Batch scan: probe all local subnets, reconcile with "last full scan wins".
fn cmd_scan(args: &ScanArgs, started: Instant) -> Result<()> {
    let opts = ScanOptions {
        username: args.username.clone(),
        password: args.password.clone(),
        port: args.port,
        discovery_timeout: Duration::from_secs(args.timeout),
        onvif_timeout: Duration::from_secs(args.timeout),
    };

    let probe = RtspProbe::new(Duration::from_secs(args.timeout));
    let records = scan::scan_all(&SystemInterfaces, &probe, &opts)?;

    let mut inventory = Inventory::load(&args.state_file);
    inventory.reconcile_full(records.clone());
    inventory.save(&args.state_file)?;

    println!("{}", serde_json::to_string_pretty(&records)?);
    print_elapsed(started);
    Ok(())
}

/// Single device: resolve, check, and upsert into the inventory.
fn cmd_resolve(args: &ResolveArgs, started: Instant) -> Result<()> {
    let opts = ScanOptions {
        username: args.username.clone(),
        password: args.password.clone(),
        port: args.port,
        discovery_timeout: Duration::from_secs(args.timeout),
        onvif_timeout: Duration::from_secs(args.timeout),
    };

    let probe = RtspProbe::new(Duration::from_secs(args.timeout));
    let record = scan::probe_device(&args.ip, &probe, &opts);

    println!("{}", serde_json::to_string_pretty(&record)?);

    let mut inventory = Inventory::load(&args.state_file);
    inventory.reconcile_one(record);
    inventory.save(&args.state_file)?;

    print_elapsed(started);
    Ok(())
}

fn cmd_completions(args: &CompletionsArgs) -> Result<()> {
    clap_complete::generate(
        args.shell,
        &mut Cli::command(),
        "onvifscan",
        &mut io::stdout(),
    );
    Ok(())
}

fn print_elapsed(started: Instant) {
    println!("--- {:.2} seconds ---", started.elapsed().as_secs_f64());
}

fn output_error(err: &ScanError) {
    eprintln!("Error: {err}");
    if let Some(hint) = err.suggestion() {
        eprintln!("Hint: {hint}");
    }
}
