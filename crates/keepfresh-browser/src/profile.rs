use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// The `--user-data-dir` handed to the browser for one run.
///
/// Unattended runs get an ephemeral directory that is removed when the
/// session is released; a rooted profile survives across runs so the
/// portal's cookies can shortcut repeated sign-ins.
pub struct ScratchProfile {
    path: PathBuf,
    ephemeral: bool,
}

impl ScratchProfile {
    pub fn ephemeral() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("keepfresh-profile-")
            .tempdir()
            .map_err(|e| Error::Io(e.into()))?;

        Ok(Self {
            path: dir.keep(),
            ephemeral: true,
        })
    }

    pub fn rooted(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            std::fs::create_dir_all(&path).map_err(Error::Io)?;
        }

        Ok(Self {
            path,
            ephemeral: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchProfile {
    fn drop(&mut self) {
        if self.ephemeral && self.path.exists() {
            let _ = std::fs::remove_dir_all(&self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ephemeral_profile_removed_on_drop() {
        let profile = ScratchProfile::ephemeral().unwrap();
        let path = profile.path().to_path_buf();

        assert!(path.is_dir());
        drop(profile);
        assert!(!path.exists());
    }

    #[test]
    fn test_rooted_profile_survives_drop() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("portal-profile");

        let profile = ScratchProfile::rooted(path.clone()).unwrap();
        assert!(path.is_dir());

        drop(profile);
        assert!(path.exists());
    }

    #[test]
    fn test_rooted_profile_creates_missing_directory() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("a").join("b");

        let profile = ScratchProfile::rooted(path.clone()).unwrap();
        assert!(profile.path().is_dir());
    }
}
