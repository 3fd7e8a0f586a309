//! Config command - show or validate configuration

use anyhow::{Context, Result, bail};
use std::path::PathBuf;

use crate::cli::args::ConfigArgs;
use crate::cli::commands::serve::build_registry;
use crate::config::{config_search_paths, load_config_from_path_or_default};

/// Example configuration content
fn example_config() -> &'static str {
    r#"# oracle-agent configuration file

# Agent socket path. Environment variables and ~ are expanded.
# Default: a random name under the temp directory, printed on startup
# socket = "$XDG_RUNTIME_DIR/oracle-agent/agent.sock"

# Private keys to serve: unencrypted OpenSSH Ed25519 key files
# (create one with `oracle-agent keygen -f <file>`)
[[keys]]
path = "~/.ssh/oracle_ed25519"
# comment = "oracle key"  # Optional: comment announced in identity listings

# [[keys]]
# path = "/etc/oracle-agent/witness.key"
# comment = "witness"
"#
}

fn print_toml_as(content: &str, format: &str) -> Result<()> {
    match format {
        "json" => {
            let value: toml::Value = toml::from_str(content).context("Failed to parse config")?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        _ => print!("{}", content),
    }
    Ok(())
}

/// Execute the config command
pub async fn execute(args: ConfigArgs, config_path: Option<PathBuf>) -> Result<()> {
    if args.paths {
        println!("Config search paths (in priority order):");
        for (i, cp) in config_search_paths().iter().enumerate() {
            let exists = if cp.path.exists() {
                "\x1b[32m[exists]\x1b[0m"
            } else {
                ""
            };
            println!("  {}. {} {}", i + 1, cp.description, exists);
            println!("     {}", cp.path.display());
        }
        return Ok(());
    }

    if args.example {
        return print_toml_as(example_config(), &args.format);
    }

    let config_file = load_config_from_path_or_default(config_path.as_deref())?;

    if args.validate {
        if config_file.path.as_os_str().is_empty() {
            eprintln!("No configuration file found.");
            eprintln!("Searched locations (use --paths for details):");
            for cp in config_search_paths() {
                eprintln!("  - {}", cp.path.display());
            }
            bail!("Nothing to validate");
        }

        let expanded = config_file.config.expand_paths()?;
        let registry = build_registry(&expanded.keys)
            .with_context(|| format!("Invalid configuration: {}", config_file.path.display()))?;
        println!(
            "Configuration file is valid: {} ({} key(s))",
            config_file.path.display(),
            registry.len()
        );
        return Ok(());
    }

    if config_file.path.as_os_str().is_empty() {
        println!("# No configuration file found");
        println!("# Use 'config --paths' to see search locations");
        println!();
        println!("# Example configuration (use --example for clean output):");
        println!();
        print!("{}", example_config());
        return Ok(());
    }

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&config_file.config)?),
        _ => {
            println!("# Configuration from: {}", config_file.path.display());
            println!();
            print!(
                "{}",
                toml::to_string_pretty(&config_file.config).context("Failed to render config")?
            );
        }
    }
    Ok(())
}
