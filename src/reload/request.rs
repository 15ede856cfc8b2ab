// src/reload/request.rs

use std::fmt;
use std::path::PathBuf;

/// Login for the running service. The password never shows up in `Debug`
/// output or logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// One reload instruction, built fresh for every cycle.
#[derive(Debug, Clone)]
pub struct ReloadRequest {
    pub plugin_name: String,
    pub artifact: PathBuf,
    /// Base URL of the service, e.g. `http://localhost:8090`.
    pub target_host: String,
    pub credentials: Credentials,
}
