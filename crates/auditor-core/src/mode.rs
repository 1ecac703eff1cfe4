use std::str::FromStr;

use serde::Deserialize;

/// How the form input is turned into a completion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayMode {
    /// Send the input verbatim as the only user message
    #[default]
    Ask,
    /// Wrap the input in the security audit prompt
    Audit,
}

impl RelayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelayMode::Ask => "ask",
            RelayMode::Audit => "audit",
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            RelayMode::Ask => RelayMode::Audit,
            RelayMode::Audit => RelayMode::Ask,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            RelayMode::Ask => "Prompt",
            RelayMode::Audit => "Contract Audit",
        }
    }

    pub fn placeholder(&self) -> &'static str {
        match self {
            RelayMode::Ask => "Type a prompt for the model...",
            RelayMode::Audit => "Paste a Solidity contract to audit...",
        }
    }
}

impl FromStr for RelayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ask" => Ok(RelayMode::Ask),
            "audit" => Ok(RelayMode::Audit),
            other => Err(format!("unknown relay mode '{}'", other)),
        }
    }
}
