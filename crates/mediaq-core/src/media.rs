//! Media kinds and the quality tiers each kind offers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::CoreError;

/// Kind of media a job produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
}

impl MediaKind {
    /// Wire representation (`media_type` field).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }

    /// Quality tiers offered for this kind, best first.
    pub fn qualities(&self) -> &'static [QualityTier] {
        match self {
            Self::Video => &[QualityTier::P1080, QualityTier::P720, QualityTier::P360],
            Self::Audio => &[
                QualityTier::Excellent,
                QualityTier::Good,
                QualityTier::Ok,
            ],
        }
    }

    /// Whether the playlist can render this kind.
    pub fn is_playable(&self) -> bool {
        matches!(self, Self::Audio | Self::Video)
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "audio" => Ok(Self::Audio),
            "video" => Ok(Self::Video),
            other => Err(CoreError::UnknownMediaKind(other.to_string())),
        }
    }
}

/// Output quality, scoped by [`MediaKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QualityTier {
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "360p")]
    P360,
    #[serde(rename = "excellent")]
    Excellent,
    #[serde(rename = "good")]
    Good,
    #[serde(rename = "ok")]
    Ok,
}

impl QualityTier {
    /// Parse a tier and check that it belongs to `kind`.
    pub fn parse(kind: MediaKind, s: &str) -> Result<Self, CoreError> {
        let wanted = s.trim().to_ascii_lowercase();
        kind.qualities()
            .iter()
            .copied()
            .find(|q| q.as_str() == wanted)
            .ok_or_else(|| CoreError::UnknownQuality {
                kind: kind.to_string(),
                quality: s.to_string(),
            })
    }

    /// Wire representation (`quality` field).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::P1080 => "1080p",
            Self::P720 => "720p",
            Self::P360 => "360p",
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Ok => "ok",
        }
    }

    /// Media kind this tier belongs to.
    pub fn media_kind(&self) -> MediaKind {
        match self {
            Self::P1080 | Self::P720 | Self::P360 => MediaKind::Video,
            Self::Excellent | Self::Good | Self::Ok => MediaKind::Audio,
        }
    }

    /// Human description shown next to the tier.
    pub fn description(&self) -> &'static str {
        match self {
            Self::P1080 => "1080p (Full HD) - 500MB+/hour",
            Self::P720 => "720p (HD) - 250MB/hour",
            Self::P360 => "360p (SD) - 100MB/hour",
            Self::Excellent => "Excellent (320kbps) - 1.5MB/min",
            Self::Good => "Good (192kbps) - 1MB/min",
            Self::Ok => "OK (128kbps) - 0.8MB/min",
        }
    }

    /// Default tier for a kind (the middle option).
    pub fn default_for(kind: MediaKind) -> Self {
        match kind {
            MediaKind::Video => Self::P720,
            MediaKind::Audio => Self::Good,
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
