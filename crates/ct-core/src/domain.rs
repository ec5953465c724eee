//! Operator-supplied public hostname

use std::fmt;

use crate::error::SetupError;

/// Fully-qualified domain the tunnel is routed to
///
/// Only non-emptiness is checked; the value is passed verbatim to the
/// tunnel agent, which performs the real validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain(String);

impl Domain {
    /// Parse operator input, trimming surrounding whitespace
    pub fn parse(input: &str) -> Result<Self, SetupError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(SetupError::DomainRequired);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The HTTPS URL the editor is reachable at
    pub fn public_url(&self) -> String {
        format!("https://{}", self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Domain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
