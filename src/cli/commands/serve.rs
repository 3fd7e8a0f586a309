//! Serve command - run the agent in the foreground

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

use crate::agent::{Agent, DEFAULT_COMMENT, Identity, Registry, Server};
use crate::cli::args::ServeArgs;
use crate::config::{ExpandedKeyConfig, load_config_from_path_or_default};
use crate::key::read_private_key_file;
use crate::protocol::PublicIdentity;
use crate::signer::LocalSigner;
use crate::utils::socket::random_socket_path;

/// Keys given on the command line replace those from the config file
fn select_keys(args: &ServeArgs, from_config: Vec<ExpandedKeyConfig>) -> Vec<ExpandedKeyConfig> {
    if args.key_files.is_empty() {
        return from_config;
    }
    let comment = args.comment.as_deref().unwrap_or(DEFAULT_COMMENT);
    args.key_files
        .iter()
        .map(|path| ExpandedKeyConfig {
            path: path.clone(),
            comment: comment.to_string(),
        })
        .collect()
}

/// Load every key file into a registry of local signers
pub fn build_registry(keys: &[ExpandedKeyConfig]) -> Result<Registry> {
    let mut registry = Registry::new();
    for key in keys {
        let pair = read_private_key_file(&key.path)
            .with_context(|| format!("Failed to load private key {}", key.path.display()))?;
        let signer = LocalSigner::new(&pair)
            .with_context(|| format!("Unusable private key {}", key.path.display()))?;
        let key_blob = signer.public_key_blob();

        if let Some(fingerprint) = PublicIdentity::new(key_blob.clone(), "").fingerprint() {
            info!(
                path = %key.path.display(),
                fingerprint = %fingerprint,
                comment = %key.comment,
                "Loaded key"
            );
        }
        registry = registry.with_identity(Identity::new(
            key_blob,
            key.comment.clone(),
            Arc::new(signer),
        ));
    }
    Ok(registry)
}

/// Resolve once any of SIGINT, SIGTERM or SIGHUP arrives
async fn wait_for_shutdown() -> Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangup = signal(SignalKind::hangup()).context("Failed to listen for SIGHUP")?;
    let mut terminate = signal(SignalKind::terminate()).context("Failed to listen for SIGTERM")?;

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for shutdown signal")?;
        }
        _ = hangup.recv() => {}
        _ = terminate.recv() => {}
    }
    Ok(())
}

fn announce_socket(path: &Path) -> Result<()> {
    use std::io::Write;

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", path.display()).context("Failed to write socket path")?;
    stdout.flush().context("Failed to write socket path")?;
    Ok(())
}

/// Execute the serve command
pub async fn execute(args: ServeArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config_file = load_config_from_path_or_default(config_path.as_deref())?;
    let config = config_file.config.expand_paths()?;

    let keys = select_keys(&args, config.keys);
    if keys.is_empty() {
        bail!("No private key to serve. Use --key-file or add [[keys]] to the configuration");
    }
    let registry = build_registry(&keys)?;

    let (socket_path, random) = match args.socket.or(config.socket) {
        Some(path) => (path, false),
        None => (random_socket_path(), true),
    };

    let mut server = Server::new(&socket_path);
    server.bind()?;
    if random {
        announce_socket(&socket_path)?;
    }

    info!(
        socket = %socket_path.display(),
        keys = registry.len(),
        "Agent ready. Press Ctrl+C to stop."
    );

    let agent = Arc::new(Agent::new(registry).with_label(socket_path.display().to_string()));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let signals = tokio::spawn(async move {
        let result = wait_for_shutdown().await;
        info!("Received shutdown signal, stopping...");
        let _ = shutdown_tx.send(true);
        result
    });

    server.serve(agent, shutdown_rx).await?;
    drop(server);
    signals.await.context("Signal task failed")??;

    info!("Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{KeyPair, write_private_key_file};
    use tempfile::TempDir;

    fn serve_args(key_files: Vec<PathBuf>, comment: Option<&str>) -> ServeArgs {
        ServeArgs {
            key_files,
            comment: comment.map(str::to_string),
            socket: None,
        }
    }

    #[test]
    fn test_select_keys_prefers_command_line() {
        let from_config = vec![ExpandedKeyConfig {
            path: PathBuf::from("/config/key"),
            comment: "from config".to_string(),
        }];

        let args = serve_args(vec![PathBuf::from("/cli/key")], None);
        let keys = select_keys(&args, from_config.clone());
        assert_eq!(
            keys,
            vec![ExpandedKeyConfig {
                path: PathBuf::from("/cli/key"),
                comment: DEFAULT_COMMENT.to_string(),
            }]
        );

        let args = serve_args(vec![], Some("ignored"));
        assert_eq!(select_keys(&args, from_config.clone()), from_config);
    }

    #[test]
    fn test_select_keys_comment() {
        let args = serve_args(vec![PathBuf::from("/a"), PathBuf::from("/b")], Some("ci"));
        let keys = select_keys(&args, Vec::new());
        assert_eq!(keys.len(), 2);
        assert!(keys.iter().all(|k| k.comment == "ci"));
    }

    #[test]
    fn test_build_registry() {
        let dir = TempDir::new().unwrap();
        let first = KeyPair::from_seed(&[1u8; 32]);
        let second = KeyPair::from_seed(&[2u8; 32]);
        write_private_key_file(dir.path().join("first"), &first).unwrap();
        write_private_key_file(dir.path().join("second"), &second).unwrap();

        let registry = build_registry(&[
            ExpandedKeyConfig {
                path: dir.path().join("first"),
                comment: "one".to_string(),
            },
            ExpandedKeyConfig {
                path: dir.path().join("second"),
                comment: "two".to_string(),
            },
        ])
        .unwrap();

        assert_eq!(registry.len(), 2);
        let identity = registry.get(&second.public_key_blob()).unwrap();
        assert_eq!(identity.comment, "two");
    }

    #[test]
    fn test_build_registry_missing_file() {
        let err = build_registry(&[ExpandedKeyConfig {
            path: PathBuf::from("/nonexistent/oracle/key"),
            comment: DEFAULT_COMMENT.to_string(),
        }])
        .unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/oracle/key"));
    }
}
