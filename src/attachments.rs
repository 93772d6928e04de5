//! Attachments directory provisioning
//!
//! Before a mailbox client is built, its attachments directory must
//! exist and be readable and writable by this process. Missing
//! directories are created on request.

use crate::config::PermissionBits;
use crate::error::{Error, Result};
use std::fs::{self, DirBuilder};
use std::io;
use std::path::Path;
use tracing::{debug, info};

/// Make sure `path` is a usable attachments directory.
///
/// - An empty path is a no-op.
/// - An existing non-directory fails with [`Error::NotADirectory`].
/// - An existing directory without read and write access fails with
///   [`Error::Permission`].
/// - A missing path is created (with any missing ancestors) when
///   `create_if_missing` is set, otherwise it fails with
///   [`Error::MissingDirectory`].
///
/// Created directories get exactly `permissions.mode()`, regardless of
/// the process umask. Losing a creation race to another process is not
/// an error.
///
/// # Errors
///
/// See above. Creation failures other than "already exists" are
/// reported as [`Error::CreateDirectory`].
pub fn ensure_dir(path: &Path, create_if_missing: bool, permissions: PermissionBits) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Ok(());
    }

    match fs::metadata(path) {
        Ok(meta) if !meta.is_dir() => Err(Error::NotADirectory {
            path: path.to_path_buf(),
        }),
        Ok(_) => check_access(path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            if create_if_missing {
                create(path, permissions)
            } else {
                Err(Error::MissingDirectory {
                    path: path.to_path_buf(),
                })
            }
        }
        Err(e) => Err(Error::Io(e)),
    }
}

fn create(path: &Path, permissions: PermissionBits) -> Result<()> {
    debug!(
        "Creating attachments directory {} with mode {}",
        path.display(),
        permissions
    );

    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(permissions.mode());
    }

    match builder.create(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => {
            debug!("{} was created concurrently", path.display());
            return check_access(path);
        }
        Err(source) => {
            return Err(Error::CreateDirectory {
                path: path.to_path_buf(),
                source,
            });
        }
    }

    // DirBuilder honours the umask; the configured bits must win.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(permissions.mode())).map_err(
            |source| Error::CreateDirectory {
                path: path.to_path_buf(),
                source,
            },
        )?;
    }

    info!("Created attachments directory {}", path.display());
    Ok(())
}

#[cfg(unix)]
fn check_access(path: &Path) -> Result<()> {
    use nix::unistd::{AccessFlags, access};

    access(path, AccessFlags::R_OK | AccessFlags::W_OK).map_err(|_| Error::Permission {
        path: path.to_path_buf(),
    })
}

#[cfg(not(unix))]
fn check_access(path: &Path) -> Result<()> {
    let readable = fs::read_dir(path).is_ok();
    let writable = fs::metadata(path).is_ok_and(|m| !m.permissions().readonly());
    if readable && writable {
        Ok(())
    } else {
        Err(Error::Permission {
            path: path.to_path_buf(),
        })
    }
}
