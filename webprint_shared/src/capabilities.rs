//! Printer capability snapshot.

use serde::{Deserialize, Serialize};

/// What one printer advertises as supported.
///
/// Each list keeps the order the backend reported it in. Any list may be empty, which
/// means the printer does not expose that option at all. Lists never hold duplicates:
/// both [`PrinterCapabilities::new`] and deserialization drop repeats, keeping the first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawCapabilities")]
pub struct PrinterCapabilities {
    media: Vec<String>,
    color_modes: Vec<String>,
    qualities: Vec<String>,
}

#[derive(Deserialize)]
struct RawCapabilities {
    #[serde(default)]
    media: Vec<String>,
    #[serde(default)]
    color_modes: Vec<String>,
    #[serde(default)]
    qualities: Vec<String>,
}

impl From<RawCapabilities> for PrinterCapabilities {
    fn from(raw: RawCapabilities) -> Self {
        Self::new(raw.media, raw.color_modes, raw.qualities)
    }
}

impl PrinterCapabilities {
    pub fn new<M, C, Q>(media: M, color_modes: C, qualities: Q) -> Self
    where
        M: IntoIterator,
        M::Item: Into<String>,
        C: IntoIterator,
        C::Item: Into<String>,
        Q: IntoIterator,
        Q::Item: Into<String>,
    {
        Self {
            media: dedup(media),
            color_modes: dedup(color_modes),
            qualities: dedup(qualities),
        }
    }

    pub fn media(&self) -> &[String] {
        &self.media
    }

    pub fn color_modes(&self) -> &[String] {
        &self.color_modes
    }

    pub fn qualities(&self) -> &[String] {
        &self.qualities
    }

    pub fn supports_media(&self, media: &str) -> bool {
        self.media.iter().any(|m| m == media)
    }

    pub fn supports_color_mode(&self, mode: &str) -> bool {
        self.color_modes.iter().any(|m| m == mode)
    }

    pub fn supports_quality(&self, quality: &str) -> bool {
        self.qualities.iter().any(|q| q == quality)
    }
}

fn dedup<I>(items: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    let mut out: Vec<String> = Vec::new();
    for item in items {
        let item = item.into();
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}
