//! Owner origins.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

/// Error returned when a string is not a usable owner origin.
#[derive(Debug, thiserror::Error)]
pub enum OriginError {
    #[error("invalid origin URL {input:?}: {source}")]
    InvalidUrl {
        input: String,
        #[source]
        source: url::ParseError,
    },
    #[error("origin must use https: {0}")]
    NotHttps(String),
    #[error("opaque origin: {0}")]
    Opaque(String),
}

/// Normalised `https` origin (`scheme://host[:port]`) owning interest groups.
///
/// Paths, queries and default ports are dropped when parsing, so
/// `https://a.test/x` and `https://a.test:443` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Origin(String);

impl Origin {
    pub fn parse(input: &str) -> Result<Self, OriginError> {
        let url = Url::parse(input).map_err(|source| OriginError::InvalidUrl {
            input: input.to_string(),
            source,
        })?;
        Self::from_url(&url)
    }

    /// Origin of an already-parsed URL.
    pub fn from_url(url: &Url) -> Result<Self, OriginError> {
        if url.scheme() != "https" {
            return Err(OriginError::NotHttps(url.to_string()));
        }
        let origin = url.origin();
        if !origin.is_tuple() {
            return Err(OriginError::Opaque(url.to_string()));
        }
        Ok(Self(origin.ascii_serialization()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if `url` has exactly this origin.
    pub fn is_same_origin(&self, url: &Url) -> bool {
        url.origin().ascii_serialization() == self.0
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Origin {
    type Err = OriginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Origin {
    type Error = OriginError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Origin> for String {
    fn from(o: Origin) -> Self {
        o.0
    }
}
