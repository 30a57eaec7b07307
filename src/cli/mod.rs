//! CLI argument definitions.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// ONVIF camera scanner - discovers network video devices and resolves RTSP streams.
#[derive(Parser, Debug)]
#[command(name = "onvifscan", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbose output (-v debug, -vv trace)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan all local subnets for ONVIF devices and update the inventory
    Scan(ScanArgs),

    /// Resolve one device's RTSP stream by IP
    Resolve(ResolveArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the batch scan.
#[derive(clap::Args, Debug)]
pub struct ScanArgs {
    /// ONVIF username used for every device
    #[arg(long, short = 'u', default_value = "admin", env = "ONVIF_USERNAME")]
    pub username: String,

    /// ONVIF password used for every device
    #[arg(long, short = 'p', default_value = "", env = "ONVIF_PASSWORD")]
    pub password: String,

    /// ONVIF service port
    #[arg(long, default_value_t = 80)]
    pub port: u16,

    /// Discovery window per subnet and per-request ONVIF timeout, in seconds
    #[arg(long, short = 't', default_value_t = 5)]
    pub timeout: u64,

    /// Inventory state file
    #[arg(long, default_value = "onvif_devices.json", env = "ONVIF_STATE_FILE")]
    pub state_file: PathBuf,
}

/// Arguments for resolving a single device.
#[derive(clap::Args, Debug)]
pub struct ResolveArgs {
    /// IP address of the camera
    pub ip: String,

    /// Username for the camera
    pub username: String,

    /// Password for the camera
    pub password: String,

    /// ONVIF service port
    #[arg(long, default_value_t = 80)]
    pub port: u16,

    /// Per-request ONVIF timeout, in seconds
    #[arg(long, short = 't', default_value_t = 5)]
    pub timeout: u64,

    /// Inventory state file
    #[arg(long, default_value = "onvif_devices.json", env = "ONVIF_STATE_FILE")]
    pub state_file: PathBuf,
}

/// Arguments for completion generation.
#[derive(clap::Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
