//! Keygen command - create a new Ed25519 key pair

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};

use crate::cli::args::KeygenArgs;
use crate::key::{KeyPair, format_public_key_line, write_private_key_file};
use crate::protocol::PublicIdentity;

/// `FILE` -> `FILE.pub`
pub fn public_key_path(private_path: &Path) -> PathBuf {
    let mut path = private_path.as_os_str().to_owned();
    path.push(".pub");
    PathBuf::from(path)
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
    }
}

/// Write a fresh key pair to `private_path` and its `.pub` sibling
pub fn generate(private_path: &Path, comment: &str, force: bool) -> Result<KeyPair> {
    let public_path = public_key_path(private_path);

    for path in [private_path, public_path.as_path()] {
        if force {
            remove_if_exists(path)?;
        } else if path.exists() {
            bail!("{} already exists (use --force to overwrite)", path.display());
        }
    }

    let pair = KeyPair::generate();
    write_private_key_file(private_path, &pair)?;

    let line = format_public_key_line(pair.public(), comment);
    std::fs::write(&public_path, format!("{}\n", line))
        .with_context(|| format!("Failed to write {}", public_path.display()))?;

    tracing::debug!(
        private = %private_path.display(),
        public = %public_path.display(),
        "Wrote key pair"
    );
    Ok(pair)
}

/// Execute the keygen command
pub async fn execute(args: KeygenArgs) -> Result<()> {
    let pair = generate(&args.file, &args.comment, args.force)?;

    println!(
        "Your identification has been saved in {}",
        args.file.display()
    );
    println!(
        "Your public key has been saved in {}",
        public_key_path(&args.file).display()
    );
    if let Some(fingerprint) = PublicIdentity::new(pair.public_key_blob(), "").fingerprint() {
        println!("The key fingerprint is:");
        println!("{}", fingerprint);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{parse_public_key_line, read_private_key_file};
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    #[test]
    fn test_public_key_path() {
        assert_eq!(
            public_key_path(Path::new("/keys/id_ed25519")),
            PathBuf::from("/keys/id_ed25519.pub")
        );
    }

    #[test]
    fn test_generate_writes_matching_pair() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("oracle");

        let pair = generate(&path, "release signer", false).unwrap();

        let loaded = read_private_key_file(&path).unwrap();
        assert_eq!(loaded.secret(), pair.secret());
        assert_eq!(loaded.public(), pair.public());

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        let line = std::fs::read(public_key_path(&path)).unwrap();
        let (public, comment) = parse_public_key_line(&line).unwrap();
        assert_eq!(&public, pair.public());
        assert_eq!(comment, "release signer");
    }

    #[test]
    fn test_generate_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("oracle");
        std::fs::write(public_key_path(&path), "keep me").unwrap();

        let err = generate(&path, "", false).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert!(!path.exists());
        assert_eq!(
            std::fs::read_to_string(public_key_path(&path)).unwrap(),
            "keep me"
        );
    }

    #[test]
    fn test_generate_force_replaces() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("oracle");

        let first = generate(&path, "", false).unwrap();
        let second = generate(&path, "", true).unwrap();
        assert_ne!(first.public(), second.public());

        let loaded = read_private_key_file(&path).unwrap();
        assert_eq!(loaded.public(), second.public());
    }
}
