//! Session credential types.
//!
//! Every request to the storefront API identifies the shopper with exactly
//! one credential: a bearer token for a signed-in account, or a guest ID for
//! an anonymous session.

use core::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::email::Email;
use super::id::UserId;

/// Header carrying the guest session identifier.
pub const GUEST_ID_HEADER: &str = "x-guest-id";

/// Header carrying the bearer token.
pub const AUTHORIZATION_HEADER: &str = "authorization";

/// Anonymous shopping session identifier.
///
/// Scoped to one session handle and replaced, never reused, on logout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuestId(Uuid);

impl GuestId {
    /// Mint a fresh random guest ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for GuestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for GuestId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Opaque bearer token issued by `/auth/login` or `/auth/register`.
#[derive(Clone)]
pub struct BearerToken(SecretString);

impl BearerToken {
    /// Wrap a raw token string.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    /// Reveal the token for use in a request header or durable storage.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken([REDACTED])")
    }
}

impl PartialEq for BearerToken {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

/// Cached account profile returned alongside a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawUserProfile")]
pub struct UserProfile {
    /// Account identifier.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Account email.
    pub email: Email,
}

/// Wire shape of a profile; the API has used `name`, `fullName` and
/// `full_name` for the display name, sometimes several at once.
#[derive(Deserialize)]
struct RawUserProfile {
    id: UserId,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "fullName")]
    full_name_camel: Option<String>,
    #[serde(default)]
    full_name: Option<String>,
    email: Email,
}

impl From<RawUserProfile> for UserProfile {
    fn from(raw: RawUserProfile) -> Self {
        Self {
            id: raw.id,
            name: raw
                .name
                .or(raw.full_name_camel)
                .or(raw.full_name)
                .unwrap_or_default(),
            email: raw.email,
        }
    }
}

/// The credential attached to an outbound request.
#[derive(Debug, Clone, PartialEq)]
pub enum Credential {
    /// Signed-in account.
    Bearer(BearerToken),
    /// Anonymous session.
    Guest(GuestId),
}

impl Credential {
    /// The single header identifying this session.
    ///
    /// Returns `(name, value)`; callers attach exactly this one header.
    #[must_use]
    pub fn header(&self) -> (&'static str, String) {
        match self {
            Self::Bearer(token) => (AUTHORIZATION_HEADER, format!("Bearer {}", token.expose())),
            Self::Guest(id) => (GUEST_ID_HEADER, id.to_string()),
        }
    }

    /// Whether this credential belongs to a signed-in account.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Bearer(_))
    }
}
