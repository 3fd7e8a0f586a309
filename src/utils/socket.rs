//! Unix socket path handling
//!
//! Stale socket removal, parent directory creation, owner-only
//! permissions and random socket names under the temp directory.

use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Error type for socket path operations
#[derive(Debug, thiserror::Error)]
pub enum SocketError {
    #[error("Refusing to replace symlink at {}", path.display())]
    SymlinkDetected { path: PathBuf },

    #[error("Failed to check existing socket at {}: {source}", path.display())]
    Metadata { path: PathBuf, source: io::Error },

    #[error("Failed to remove existing file at {}: {source}", path.display())]
    Remove { path: PathBuf, source: io::Error },

    #[error("Failed to create directory {}: {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("Failed to set permissions on socket at {}: {source}", path.display())]
    Permission { path: PathBuf, source: io::Error },
}

/// Remove whatever is at `path`, unless it is a symlink
///
/// Uses `symlink_metadata` so a link planted at the socket path is never
/// followed. A missing file is not an error.
pub fn remove_existing_socket(path: &Path) -> Result<(), SocketError> {
    match fs::symlink_metadata(path) {
        Ok(metadata) => {
            if metadata.file_type().is_symlink() {
                return Err(SocketError::SymlinkDetected {
                    path: path.to_path_buf(),
                });
            }
            fs::remove_file(path).map_err(|source| SocketError::Remove {
                path: path.to_path_buf(),
                source,
            })
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(SocketError::Metadata {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Create the parent directory of `path` if missing
pub fn ensure_parent_dir(path: &Path) -> Result<(), SocketError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|source| SocketError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

/// Restrict the socket to its owner (0600)
pub fn set_socket_permissions(path: &Path) -> Result<(), SocketError> {
    fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|source| {
        SocketError::Permission {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Make `path` ready for binding: stale file removed, parent present
///
/// Call [`set_socket_permissions`] after binding.
pub fn prepare_socket_path(path: &Path) -> Result<(), SocketError> {
    remove_existing_socket(path)?;
    ensure_parent_dir(path)?;
    Ok(())
}

/// A fresh socket name `agent-sock-<16 hex digits>` in the temp directory
pub fn random_socket_path() -> PathBuf {
    let suffix: u64 = rand::random();
    std::env::temp_dir().join(format!("agent-sock-{:016x}", suffix))
}
