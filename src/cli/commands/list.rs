//! List command - print the identities held by a running agent

use anyhow::{Context, Result};

use crate::agent::AgentClient;
use crate::cli::args::ListArgs;
use crate::key::{ed25519, format_public_key_line};
use crate::protocol::PublicIdentity;

/// Render an identity as a public key line
///
/// Ed25519 keys use the local encoder; other key types go through
/// `ssh-key`. Returns `None` for blobs neither understands.
pub fn identity_line(identity: &PublicIdentity) -> Option<String> {
    if let Ok(public) = ed25519::parse_public_key(&identity.key_blob) {
        return Some(format_public_key_line(&public, &identity.comment));
    }
    let mut key = identity.public_key()?;
    key.set_comment(identity.comment.as_str());
    key.to_openssh().ok()
}

/// Execute the list command
pub async fn execute(args: ListArgs) -> Result<()> {
    let mut client = match &args.socket {
        Some(socket) => AgentClient::connect(socket).await?,
        None => AgentClient::from_env().await?,
    };
    let identities = client
        .request_identities(args.limit)
        .await
        .context("Failed to list identities")?;

    if identities.is_empty() {
        eprintln!("The agent has no identities.");
        return Ok(());
    }

    for identity in &identities {
        match identity_line(identity) {
            Some(line) => println!("{}", line),
            None => tracing::warn!(
                comment = %identity.comment,
                "Skipping identity with an unparseable key blob"
            ),
        }
    }
    Ok(())
}
