//! Argument structures for CLI commands

use clap::Args;
use std::path::PathBuf;

/// Arguments for the `serve` command
#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Private key file (repeatable); replaces the keys from the config file
    #[arg(short = 'k', long = "key-file", value_name = "FILE")]
    pub key_files: Vec<PathBuf>,

    /// Comment announced for keys given with --key-file
    #[arg(short = 'C', long)]
    pub comment: Option<String>,

    /// Socket path; any existing file there is replaced
    ///
    /// Defaults to a random name under the temp directory, which is printed
    /// on stdout once the socket is ready.
    #[arg(short, long)]
    pub socket: Option<PathBuf>,
}

/// Arguments for the `keygen` command
#[derive(Args, Debug, Clone)]
pub struct KeygenArgs {
    /// Private key output file; the public key goes to FILE.pub
    #[arg(short, long, value_name = "FILE")]
    pub file: PathBuf,

    /// Comment for the public key line
    #[arg(short = 'C', long, default_value = "")]
    pub comment: String,

    /// Overwrite existing key files
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `list` command
#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Agent socket path [default: $SSH_AUTH_SOCK]
    #[arg(short, long)]
    pub socket: Option<PathBuf>,

    /// Maximum number of identities accepted from the agent
    #[arg(long, default_value = "100")]
    pub limit: usize,
}

/// Arguments for the `sign` command
#[derive(Args, Debug, Clone)]
pub struct SignArgs {
    /// Agent socket path [default: $SSH_AUTH_SOCK]
    #[arg(short, long)]
    pub socket: Option<PathBuf>,

    /// Public key file (`ssh-ed25519 AAAA... comment`) naming the signing key
    #[arg(short = 'k', long = "public-key", value_name = "FILE")]
    pub public_key: PathBuf,

    /// Flags passed in the sign request
    #[arg(long, default_value = "0")]
    pub flags: u32,

    /// File to sign; reads stdin when absent or "-"
    pub input: Option<PathBuf>,
}

/// Arguments for the `config` command
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Validate the configuration, including loading every key file
    #[arg(long)]
    pub validate: bool,

    /// Show the configuration file search paths
    #[arg(long)]
    pub paths: bool,

    /// Show an example configuration
    #[arg(long)]
    pub example: bool,

    /// Output format
    #[arg(short, long, default_value = "toml", value_parser = ["toml", "json"])]
    pub format: String,
}
