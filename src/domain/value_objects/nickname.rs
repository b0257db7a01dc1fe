//! Chat display name.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::shared::error::LoadError;

/// Display name a simulated client announces with `PUT_NICKNAME`.
///
/// Never empty. Generated once per session and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Nickname(String);

impl Nickname {
    /// Wrap a generated name, rejecting empty or whitespace-only input.
    pub fn new(value: impl Into<String>) -> Result<Self, LoadError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(LoadError::InvalidNickname("nickname must not be empty".into()));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Nickname {
    type Error = LoadError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Nickname> for String {
    fn from(value: Nickname) -> Self {
        value.0
    }
}

impl fmt::Display for Nickname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
