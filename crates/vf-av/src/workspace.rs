//! Staging directories for tool outputs.
//!
//! A [`Workspace`] gives a tool a private temporary directory to write into
//! and, once the tool has succeeded, moves the finished artifact into its
//! destination directory. The destination only ever receives complete files.

use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn workspace_error(message: String) -> vf_core::Error {
    vf_core::Error::tool("workspace", message)
}

/// Temporary staging area bound to a destination directory.
///
/// # Example
///
/// ```no_run
/// use vf_av::Workspace;
///
/// let workspace = Workspace::new(std::path::Path::new("uploads/models/job-1")).unwrap();
/// let staged = workspace.temp_file("model.glb");
/// // ... run a tool that writes `staged` ...
/// let final_path = workspace.finalize("model.glb").unwrap();
/// ```
pub struct Workspace {
    temp_dir: TempDir,
    dest_dir: PathBuf,
}

impl Workspace {
    /// Create a staging directory for artifacts destined for `dest_dir`.
    pub fn new(dest_dir: &Path) -> vf_core::Result<Self> {
        let temp_dir = TempDir::new()
            .map_err(|e| workspace_error(format!("failed to create temp dir: {e}")))?;

        Ok(Self {
            temp_dir,
            dest_dir: dest_dir.to_path_buf(),
        })
    }

    /// Where finalized artifacts land.
    pub fn dest_dir(&self) -> &Path {
        &self.dest_dir
    }

    /// Path to the temporary directory.
    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a path for a named temporary file inside the workspace.
    pub fn temp_file(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Move the staged file `name` into the destination directory, creating
    /// it if needed, and return the final path. An existing file with the
    /// same name is replaced.
    ///
    /// # Errors
    ///
    /// Returns an error if the staged file does not exist or if it cannot be
    /// moved.
    pub fn finalize(self, name: &str) -> vf_core::Result<PathBuf> {
        let staged = self.temp_file(name);
        if !staged.exists() {
            return Err(workspace_error(format!(
                "staged file does not exist: {}",
                staged.display()
            )));
        }

        std::fs::create_dir_all(&self.dest_dir).map_err(|e| {
            workspace_error(format!(
                "failed to create {}: {e}",
                self.dest_dir.display()
            ))
        })?;

        let dest = self.dest_dir.join(name);

        // Try rename first (same filesystem), fall back to copy+remove.
        if std::fs::rename(&staged, &dest).is_err() {
            std::fs::copy(&staged, &dest).map_err(|e| {
                workspace_error(format!("failed to copy output to destination: {e}"))
            })?;
            let _ = std::fs::remove_file(&staged);
        }

        Ok(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn temp_file_inside_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(dir.path()).unwrap();
        let tf = ws.temp_file("convert.py");
        assert!(tf.starts_with(ws.temp_dir()));
        assert_eq!(tf.file_name().unwrap(), "convert.py");
        assert_eq!(ws.dest_dir(), dir.path());
    }

    #[test]
    fn finalize_creates_destination() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("models").join("job-1");

        let ws = Workspace::new(&dest).unwrap();
        fs::write(ws.temp_file("model.glb"), b"glTF").unwrap();

        let final_path = ws.finalize("model.glb").unwrap();
        assert_eq!(final_path, dest.join("model.glb"));
        assert_eq!(fs::read(&final_path).unwrap(), b"glTF");
    }

    #[test]
    fn finalize_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("model.glb"), b"old").unwrap();

        let ws = Workspace::new(dir.path()).unwrap();
        fs::write(ws.temp_file("model.glb"), b"new").unwrap();
        let final_path = ws.finalize("model.glb").unwrap();
        assert_eq!(fs::read_to_string(final_path).unwrap(), "new");
    }

    #[test]
    fn finalize_fails_when_output_missing() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(dir.path()).unwrap();
        let result = ws.finalize("model.glb");
        assert!(result.is_err());
        assert!(!dir.path().join("model.glb").exists());
    }
}
