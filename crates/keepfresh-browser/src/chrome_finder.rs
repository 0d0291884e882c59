use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Locates a Chrome or Chromium binary on the system.
pub struct ChromeFinder {
    configured_path: Option<PathBuf>,
}

impl ChromeFinder {
    /// A finder that checks the configured path first, if any.
    pub fn new(configured_path: Option<PathBuf>) -> Self {
        Self { configured_path }
    }

    /// Resolve a usable browser binary.
    ///
    /// Order: configured path, then `$PATH` lookup over known binary
    /// names, then platform-specific install locations. The configured
    /// path is authoritative: if it is set and invalid, no scan happens.
    pub fn find(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.configured_path {
            return self.validate_binary(path);
        }

        for name in Self::binary_names() {
            if let Ok(path) = which::which(name) {
                if let Ok(valid) = self.validate_binary(&path) {
                    return Ok(valid);
                }
            }
        }

        for path in Self::install_paths() {
            if let Ok(valid) = self.validate_binary(&path) {
                return Ok(valid);
            }
        }

        Err(Error::Launch(format!(
            "No Chrome/Chromium binary found. Checked $PATH for {} and: {}. \
             Use --chrome-path to specify one.",
            Self::binary_names().join(", "),
            Self::install_paths()
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        )))
    }

    fn binary_names() -> Vec<&'static str> {
        vec![
            "google-chrome",
            "google-chrome-stable",
            "chromium",
            "chromium-browser",
        ]
    }

    fn install_paths() -> Vec<PathBuf> {
        #[cfg(target_os = "macos")]
        return vec![
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"),
            PathBuf::from("/Applications/Chromium.app/Contents/MacOS/Chromium"),
        ];

        #[cfg(target_os = "linux")]
        return vec![
            PathBuf::from("/usr/bin/google-chrome"),
            PathBuf::from("/usr/bin/google-chrome-stable"),
            PathBuf::from("/usr/bin/chromium"),
            PathBuf::from("/usr/bin/chromium-browser"),
            PathBuf::from("/snap/bin/chromium"),
        ];

        #[cfg(target_os = "windows")]
        return vec![
            PathBuf::from(r"C:\Program Files\Google\Chrome\Application\chrome.exe"),
            PathBuf::from(r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe"),
        ];

        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        return vec![];
    }

    fn validate_binary(&self, path: &Path) -> Result<PathBuf> {
        if !path.exists() {
            return Err(Error::Launch(format!(
                "Browser binary not found at: {}",
                path.display()
            )));
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let metadata = std::fs::metadata(path).map_err(Error::Io)?;
            if metadata.permissions().mode() & 0o111 == 0 {
                return Err(Error::Launch(format!(
                    "Browser binary not executable: {}",
                    path.display()
                )));
            }
        }

        Ok(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_finder_accepts_configured_path() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        let path = temp.path();

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        let finder = ChromeFinder::new(Some(path.to_path_buf()));
        assert_eq!(finder.find().unwrap(), path);
    }

    #[test]
    fn test_finder_rejects_missing_configured_path() {
        let finder = ChromeFinder::new(Some(PathBuf::from("/nonexistent/chrome")));
        let err = finder.find().unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[cfg(unix)]
    #[test]
    fn test_finder_rejects_non_executable_configured_path() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::set_permissions(temp.path(), std::fs::Permissions::from_mode(0o644)).unwrap();

        let finder = ChromeFinder::new(Some(temp.path().to_path_buf()));
        let err = finder.find().unwrap_err();
        assert!(err.to_string().contains("not executable"));
    }
}
