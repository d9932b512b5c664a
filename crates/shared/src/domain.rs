use std::{fmt, path::PathBuf, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

id_newtype!(HistoryId);

/// Which way the stain translation model runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    /// Brightfield in, virtual H&E out.
    #[default]
    #[serde(rename = "AtoB")]
    Forward,
    /// H&E in, synthetic brightfield out.
    #[serde(rename = "BtoA")]
    Reverse,
}

impl Direction {
    pub fn wire_token(self) -> &'static str {
        match self {
            Self::Forward => "AtoB",
            Self::Reverse => "BtoA",
        }
    }

    pub fn model_label(self) -> &'static str {
        match self {
            Self::Forward => "Brightfield Model",
            Self::Reverse => "H&E Model",
        }
    }

    pub fn prompt(self) -> &'static str {
        match self {
            Self::Forward => "Generate H&E from Brightfield",
            Self::Reverse => "Generate Brightfield from H&E",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forward => f.write_str("forward"),
            Self::Reverse => f.write_str("reverse"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown direction '{0}', expected forward or reverse")]
pub struct UnknownDirection(pub String);

impl FromStr for Direction {
    type Err = UnknownDirection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forward" | "atob" => Ok(Self::Forward),
            "reverse" | "btoa" => Ok(Self::Reverse),
            _ => Err(UnknownDirection(s.to_string())),
        }
    }
}

/// Reference to an image the front end can display.
///
/// Fresh uploads preview from the local file before any network round-trip;
/// everything that came back from the service is an absolute URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImageRef {
    Local(PathBuf),
    Remote(Url),
}

impl ImageRef {
    pub fn as_url(&self) -> Option<&Url> {
        match self {
            Self::Remote(url) => Some(url),
            Self::Local(_) => None,
        }
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Remote(url) => f.write_str(url.as_str()),
        }
    }
}

/// One completed generation as recorded by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryItem {
    pub id: HistoryId,
    pub bf_url: Url,
    pub he_url: Url,
    pub timestamp: DateTime<Utc>,
}

impl HistoryItem {
    pub fn display_time(&self) -> String {
        self.timestamp.format("%H:%M").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_parses_user_words_and_wire_tokens() {
        assert_eq!("forward".parse::<Direction>(), Ok(Direction::Forward));
        assert_eq!(" Reverse ".parse::<Direction>(), Ok(Direction::Reverse));
        assert_eq!("AtoB".parse::<Direction>(), Ok(Direction::Forward));
        assert_eq!("BtoA".parse::<Direction>(), Ok(Direction::Reverse));
        assert!("sideways".parse::<Direction>().is_err());
    }

    #[test]
    fn direction_serializes_as_service_token() {
        assert_eq!(
            serde_json::to_string(&Direction::Reverse).expect("json"),
            "\"BtoA\""
        );
        assert_eq!(Direction::default().wire_token(), "AtoB");
    }

    #[test]
    fn history_item_formats_hours_and_minutes() {
        let item = HistoryItem {
            id: HistoryId::from("3"),
            bf_url: Url::parse("http://localhost:8000/data/bf.png").expect("url"),
            he_url: Url::parse("http://localhost:8000/data/he.png").expect("url"),
            timestamp: "2026-03-01T09:05:30Z".parse().expect("timestamp"),
        };
        assert_eq!(item.display_time(), "09:05");
    }
}
