//! Writing rendered configuration to disk.
//!
//! All targets are rendered and staged as synced temporary files next to
//! their destinations before any of them is renamed into place. A failure
//! while staging leaves every target untouched, and a reader never observes
//! a half-written file.

use std::fs::Permissions;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::config::Paths;
use crate::context::Context;
use crate::error::Result;
use crate::render::Target;

/// Mode of written files; resolv.conf in particular must stay world-readable.
const FILE_MODE: u32 = 0o644;

/// Writes the three target files for a context.
///
/// # Permissions
///
/// The default targets live under `/etc`, so writing requires root. The
/// caller must handle elevation.
///
/// # Example
///
/// ```rust,ignore
/// use netcop_configurador::{ConfigWriter, Paths};
///
/// let writer = ConfigWriter::new(Paths::default());
/// let written = writer.write_all(&ctx)?;
/// ```
#[derive(Debug, Clone)]
pub struct ConfigWriter {
    paths: Paths,
}

impl ConfigWriter {
    #[must_use]
    pub const fn new(paths: Paths) -> Self {
        Self { paths }
    }

    /// Returns the target locations.
    #[must_use]
    pub const fn paths(&self) -> &Paths {
        &self.paths
    }

    /// Renders and stages every target, then renames them into place in
    /// [`Target::ALL`] order.
    ///
    /// Missing parent directories are created. Returns the written paths.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if a directory cannot be
    /// created or a file cannot be written. Staged temporaries are removed on
    /// failure.
    pub fn write_all(&self, ctx: &Context) -> Result<Vec<PathBuf>> {
        let mut staged = Vec::with_capacity(Target::ALL.len());
        for target in Target::ALL {
            let path = target.path(&self.paths);
            let content = target.render(ctx);
            let tmp = stage(path, content.as_bytes())?;
            staged.push((target, path, tmp, content.len()));
        }

        let mut written = Vec::with_capacity(staged.len());
        for (target, path, tmp, bytes) in staged {
            tmp.persist(path).map_err(|e| e.error)?;
            tracing::info!(
                file = ?target,
                path = %path.display(),
                bytes,
                "Wrote configuration file"
            );
            written.push(path.to_path_buf());
        }
        Ok(written)
    }
}

/// Writes `content` to a synced temporary file in the directory of `path`.
fn stage(path: &Path, content: &[u8]) -> Result<NamedTempFile> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    if !dir.exists() {
        std::fs::create_dir_all(dir)?;
    }

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.as_file().set_permissions(Permissions::from_mode(FILE_MODE))?;
    tmp.as_file().sync_all()?;
    Ok(tmp)
}
