//! Channels: prioritized package sources
//!
//! A channel is either a well-known name (`conda-forge`, `defaults`) or a
//! full URL. URL channels can carry an authentication token in a `/t/...`
//! path segment; [`Channel::to_redacted_string`] masks it so channel lists
//! can be logged safely.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use url::Url;

use crate::error::ParseSpecError;

/// A package source, in priority order within a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Channel {
    /// A named channel resolved by the package manager (`conda-forge`)
    Name(String),
    /// An explicit channel URL
    Url(Url),
}

impl Channel {
    /// The channel text with any `/t/<token>` segment masked.
    pub fn to_redacted_string(&self) -> String {
        match self {
            Channel::Name(name) => name.clone(),
            Channel::Url(url) => {
                let mut out = String::new();
                let mut masking = false;
                for segment in url.as_str().split('/') {
                    if !out.is_empty() {
                        out.push('/');
                    }
                    if masking {
                        out.push_str("<token>");
                        masking = false;
                    } else {
                        out.push_str(segment);
                        masking = segment == "t";
                    }
                }
                out
            }
        }
    }
}

impl FromStr for Channel {
    type Err = ParseSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseSpecError::EmptyChannel);
        }
        if s.contains("://") {
            if let Ok(url) = Url::parse(s) {
                return Ok(Channel::Url(url));
            }
        }
        Ok(Channel::Name(s.to_string()))
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Name(name) => f.write_str(name),
            Channel::Url(url) => f.write_str(url.as_str()),
        }
    }
}

impl Serialize for Channel {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Channel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn named_channel() {
        let channel: Channel = "conda-forge".parse().unwrap();
        assert_eq!(channel, Channel::Name("conda-forge".to_string()));
        assert_eq!(channel.to_string(), "conda-forge");
    }

    #[test]
    fn url_channel() {
        let channel: Channel = "https://prefix.dev/my-channel".parse().unwrap();
        assert!(matches!(channel, Channel::Url(_)));
    }

    #[test]
    fn token_is_redacted() {
        let channel: Channel = "https://conda.anaconda.org/t/ab-123456789/private"
            .parse()
            .unwrap();
        assert_eq!(
            channel.to_redacted_string(),
            "https://conda.anaconda.org/t/<token>/private"
        );
        assert!(!channel.to_redacted_string().contains("123456789"));
    }

    #[test]
    fn empty_channel_is_rejected() {
        assert_eq!(
            "  ".parse::<Channel>().unwrap_err(),
            ParseSpecError::EmptyChannel
        );
    }
}
