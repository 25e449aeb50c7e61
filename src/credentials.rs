//! Basic-auth credentials for the feed endpoint.
//!
//! The password is read from a plaintext file on every run and kept in a
//! [`SecretString`], so `Debug` output and logs only ever show `[REDACTED]`.
use secrecy::{ExposeSecret, SecretString};
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Password files are one line; anything bigger is not a password file.
const MAX_PASSWORD_FILE_SIZE: u64 = 4096;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Failed to read password file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Password file '{}' is empty", .path.display())]
    Empty { path: PathBuf },

    #[error("Password file '{}' is larger than {limit} bytes", .path.display())]
    TooLarge { path: PathBuf, limit: u64 },
}

#[derive(Debug)]
pub struct Credentials {
    username: String,
    password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        let password: String = password.into();
        Self {
            username: username.into(),
            password: SecretString::from(password),
        }
    }

    /// Pair `username` with the password stored in `password_file`.
    ///
    /// Surrounding whitespace (including the trailing newline most editors
    /// add) is trimmed. A file that trims down to nothing is rejected.
    pub fn load(username: &str, password_file: &Path) -> Result<Self, CredentialError> {
        let read_err = |source| CredentialError::Read {
            path: password_file.to_path_buf(),
            source,
        };

        let file = std::fs::File::open(password_file).map_err(read_err)?;
        let mut raw = String::new();
        file.take(MAX_PASSWORD_FILE_SIZE + 1)
            .read_to_string(&mut raw)
            .map_err(read_err)?;
        if raw.len() as u64 > MAX_PASSWORD_FILE_SIZE {
            return Err(CredentialError::TooLarge {
                path: password_file.to_path_buf(),
                limit: MAX_PASSWORD_FILE_SIZE,
            });
        }

        let password = raw.trim();
        if password.is_empty() {
            return Err(CredentialError::Empty {
                path: password_file.to_path_buf(),
            });
        }

        tracing::debug!(path = %password_file.display(), "Loaded password file");
        Ok(Self::new(username, password))
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }
}
