use crate::{Error, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Google account credentials, read once at startup and immutable for the
/// lifetime of the run.
///
/// The config file is a flat JSON object with `EMAIL` and `PASSWORD` keys.
/// Unknown keys are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    #[serde(rename = "EMAIL")]
    pub email: String,
    #[serde(rename = "PASSWORD")]
    pub password: String,
}

impl Credentials {
    /// Read and validate credentials from a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        tracing::debug!("Reading config file from: {}", path.display());

        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let credentials: Credentials = serde_json::from_reader(reader)?;
        credentials.validate()?;

        tracing::info!("Loaded credentials for account {}", credentials.email);

        Ok(credentials)
    }

    /// Both fields must be non-empty before any browser work starts.
    fn validate(&self) -> Result<()> {
        if self.email.trim().is_empty() {
            return Err(Error::Config("EMAIL must not be empty".to_string()));
        }
        if self.password.is_empty() {
            return Err(Error::Config("PASSWORD must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_well_formed_config() {
        let file = write_config(r#"{"EMAIL": "jane@example.com", "PASSWORD": "hunter2"}"#);

        let credentials = Credentials::load(file.path()).unwrap();
        assert_eq!(credentials.email, "jane@example.com");
        assert_eq!(credentials.password, "hunter2");
    }

    #[test]
    fn test_load_ignores_unknown_keys() {
        let file = write_config(
            r#"{"EMAIL": "jane@example.com", "PASSWORD": "hunter2", "CAPTCHA_API_KEY": "unused"}"#,
        );

        let credentials = Credentials::load(file.path()).unwrap();
        assert_eq!(credentials.email, "jane@example.com");
    }

    #[test]
    fn test_load_missing_key_fails() {
        let file = write_config(r#"{"EMAIL": "jane@example.com"}"#);

        let result = Credentials::load(file.path());
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[test]
    fn test_load_invalid_json_fails() {
        let file = write_config("not json at all");

        let result = Credentials::load(file.path());
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[test]
    fn test_load_empty_field_fails() {
        let file = write_config(r#"{"EMAIL": "", "PASSWORD": "hunter2"}"#);

        let result = Credentials::load(file.path());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = Credentials::load(Path::new("/nonexistent/config.json"));
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
