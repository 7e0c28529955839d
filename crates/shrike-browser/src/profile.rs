use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Manages Chrome profile directories.
///
/// A signed-in Google session lives in the profile, so reusing the same
/// per-account profile across runs means the login flow usually short-circuits
/// on the "already signed in" check.
pub struct ProfileManager {
    path: PathBuf,
    is_temporary: bool,
}

impl ProfileManager {
    /// Create a temporary profile that will be deleted on drop.
    pub fn temporary() -> Result<Self> {
        let temp_dir = tempfile::tempdir().map_err(Error::Io)?;

        let path = temp_dir.keep();

        Ok(Self {
            path,
            is_temporary: true,
        })
    }

    /// Create or reuse a persistent profile at the given path.
    pub fn persistent(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            std::fs::create_dir_all(&path).map_err(Error::Io)?;
        }

        Ok(Self {
            path,
            is_temporary: false,
        })
    }

    /// Create or reuse the persistent profile for a Google account, keyed by
    /// the sanitized account email under the platform data directory.
    pub fn for_account(account_email: &str) -> Result<Self> {
        let root = dirs::data_dir()
            .ok_or_else(|| Error::Browser("Could not determine data directory".to_string()))?;
        let path = root
            .join("shrike")
            .join("profiles")
            .join(sanitize_account(account_email));

        Self::persistent(path)
    }

    /// Get the profile directory path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if this is a temporary profile.
    pub fn is_temporary(&self) -> bool {
        self.is_temporary
    }
}

impl Drop for ProfileManager {
    fn drop(&mut self) {
        if self.is_temporary && self.path.exists() {
            let _ = std::fs::remove_dir_all(&self.path);
        }
    }
}

/// Reduce an account email to a filesystem-safe directory name.
fn sanitize_account(account_email: &str) -> String {
    account_email
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_profile_creates_and_cleans_up() {
        let profile = ProfileManager::temporary().unwrap();
        let path = profile.path().to_path_buf();

        assert!(path.exists());
        assert!(path.is_dir());
        assert!(profile.is_temporary());

        drop(profile);

        assert!(!path.exists());
    }

    #[test]
    fn test_persistent_profile_is_not_deleted() {
        let temp_dir = tempfile::tempdir().unwrap();
        let profile_path = temp_dir.path().join("account-profile");

        let profile = ProfileManager::persistent(profile_path.clone()).unwrap();
        assert!(profile_path.exists());

        drop(profile);

        assert!(profile_path.exists());
    }

    #[test]
    fn test_persistent_profile_creates_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let profile_path = temp_dir.path().join("new-profile");

        assert!(!profile_path.exists());

        let profile = ProfileManager::persistent(profile_path.clone()).unwrap();
        assert!(profile.path().is_dir());
    }

    #[test]
    fn test_sanitize_account() {
        assert_eq!(sanitize_account("jane.doe@example.com"), "jane.doe-example.com");
        assert_eq!(sanitize_account("a b/c"), "a-b-c");
    }
}
