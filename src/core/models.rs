//! Core data models shared by the request pipeline, the credential store and
//! the formatting client.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DocstreamError;

// =============================================================================
// Credentials
// =============================================================================

/// Access/refresh token pair.
///
/// Tokens are opaque; nothing here inspects their contents.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPair {
    /// Short-lived token sent as a bearer credential.
    #[serde(rename = "access")]
    pub access_token: String,
    /// Longer-lived token exchanged for a new access token.
    #[serde(rename = "refresh")]
    pub refresh_token: String,
}

impl CredentialPair {
    #[must_use]
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }

    /// Copy of this pair with the access token replaced.
    #[must_use]
    pub fn with_access_token(&self, access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: self.refresh_token.clone(),
        }
    }
}

// Tokens must never end up in logs.
impl fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// Authenticated identity as returned by login and the profile endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Identity {
    pub id: Option<i64>,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub credits: Option<i64>,
    pub is_verified: bool,
}

impl Identity {
    /// Display name, falling back to the email address.
    #[must_use]
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.email.clone()
        } else {
            full.to_string()
        }
    }
}

/// Persisted session: the credential pair plus the cached identity.
///
/// On disk the tokens may be missing or partial (hand-edited file, older
/// writer). [`Session::credentials`] only yields a pair when both are present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<Identity>,
}

impl Session {
    #[must_use]
    pub fn from_pair(pair: &CredentialPair, user: Option<Identity>) -> Self {
        Self {
            access: Some(pair.access_token.clone()),
            refresh: Some(pair.refresh_token.clone()),
            user,
        }
    }

    /// Both tokens, or nothing.
    #[must_use]
    pub fn credentials(&self) -> Option<CredentialPair> {
        match (&self.access, &self.refresh) {
            (Some(access), Some(refresh)) if !access.is_empty() && !refresh.is_empty() => {
                Some(CredentialPair::new(access.clone(), refresh.clone()))
            }
            _ => None,
        }
    }

    /// True when exactly one of the two tokens is present.
    #[must_use]
    pub fn is_incomplete(&self) -> bool {
        self.credentials().is_none() && (self.access.is_some() || self.refresh.is_some())
    }
}

/// Successful login body.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    #[serde(default)]
    pub user: Option<Identity>,
}

// =============================================================================
// Formatting mode
// =============================================================================

/// Document type requested from the generation endpoint.
///
/// Passed through to the backend as-is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormattingMode {
    /// Academic paper.
    #[default]
    Paper,
    /// Project proposal.
    Proposal,
    /// Course report.
    Report,
}

impl FormattingMode {
    /// All modes, in display order.
    pub const ALL: &'static [Self] = &[Self::Paper, Self::Proposal, Self::Report];

    /// Wire value sent in the `mode` form field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Paper => "paper",
            Self::Proposal => "proposal",
            Self::Report => "report",
        }
    }
}

impl fmt::Display for FormattingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormattingMode {
    type Err = DocstreamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "paper" | "document" => Ok(Self::Paper),
            "proposal" => Ok(Self::Proposal),
            "report" => Ok(Self::Report),
            other => Err(DocstreamError::InvalidMode(other.to_string())),
        }
    }
}
