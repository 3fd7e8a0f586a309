//! Sign command - have a running agent sign a file or stdin

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::sync::Mutex;

use crate::agent::{AgentClient, AgentSigner};
use crate::cli::args::SignArgs;
use crate::key::{ed25519, parse_public_key_line};
use crate::signer::{Signer, VerifyingSigner};

/// Read the key blob named by a `.pub` file
pub fn load_public_key_blob(path: &Path) -> Result<Bytes> {
    let line = std::fs::read(path)
        .with_context(|| format!("Failed to read public key {}", path.display()))?;
    let (public, _comment) = parse_public_key_line(&line)
        .with_context(|| format!("Invalid public key {}", path.display()))?;
    Ok(ed25519::serialize_public_key(&public))
}

async fn read_input(input: Option<&Path>) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    match input {
        Some(path) if path != Path::new("-") => {
            let mut file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open {}", path.display()))?;
            file.read_to_end(&mut data)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
        }
        _ => {
            tokio::io::stdin()
                .read_to_end(&mut data)
                .await
                .context("Failed to read stdin")?;
        }
    }
    Ok(data)
}

/// Execute the sign command
pub async fn execute(args: SignArgs) -> Result<()> {
    let key_blob = load_public_key_blob(&args.public_key)?;
    let data = read_input(args.input.as_deref()).await?;

    let client = match &args.socket {
        Some(socket) => AgentClient::connect(socket).await?,
        None => AgentClient::from_env().await?,
    };
    let signer = VerifyingSigner::new(
        AgentSigner::new(Arc::new(Mutex::new(client)), key_blob.clone(), args.flags),
        &key_blob,
    )?;

    let signature = signer
        .sign(&data)
        .await
        .context("Agent did not produce a valid signature")?;
    tracing::debug!(len = data.len(), "Signature verified");

    println!("{}", STANDARD.encode(&signature));
    Ok(())
}
