//! Capability fetch and parameter defaulting for the selected printer.

use serde::Serialize;
use webprint_shared::{PrintBackend, PrinterCapabilities};

use crate::config::DefaultsConfig;

/// Defaults derived from one capability snapshot. `None` means the option is
/// unsupported by the printer and its picker should be disabled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParameterDefaults {
    pub paper_size: Option<String>,
    pub color_mode: Option<String>,
    pub quality: Option<String>,
}

impl ParameterDefaults {
    /// Preferred value if the printer lists it anywhere, otherwise its first entry.
    pub fn derive(caps: &PrinterCapabilities, preferred: &DefaultsConfig) -> Self {
        Self {
            paper_size: pick(caps.media(), &preferred.media),
            color_mode: pick(caps.color_modes(), &preferred.color_mode),
            quality: pick(caps.qualities(), &preferred.quality),
        }
    }
}

fn pick(supported: &[String], preferred: &str) -> Option<String> {
    supported
        .iter()
        .find(|s| s.as_str() == preferred)
        .or_else(|| supported.first())
        .cloned()
}

/// Capabilities of the currently selected printer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilityState {
    Available {
        capabilities: PrinterCapabilities,
        defaults: ParameterDefaults,
    },
    /// The fetch failed. Selection still stands; every picker is disabled.
    Unavailable { reason: String },
}

impl CapabilityState {
    pub fn capabilities(&self) -> Option<&PrinterCapabilities> {
        match self {
            CapabilityState::Available { capabilities, .. } => Some(capabilities),
            CapabilityState::Unavailable { .. } => None,
        }
    }

    pub fn defaults(&self) -> ParameterDefaults {
        match self {
            CapabilityState::Available { defaults, .. } => defaults.clone(),
            CapabilityState::Unavailable { .. } => ParameterDefaults::default(),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, CapabilityState::Available { .. })
    }
}

/// Fetches a fresh snapshot for `printer_id`. Never fails; a backend error degrades to
/// [`CapabilityState::Unavailable`].
pub async fn fetch_capabilities(
    backend: &dyn PrintBackend,
    printer_id: &str,
    preferred: &DefaultsConfig,
) -> CapabilityState {
    match backend.get_capabilities(printer_id).await {
        Ok(capabilities) => {
            let defaults = ParameterDefaults::derive(&capabilities, preferred);
            tracing::debug!(
                printer = printer_id,
                media = capabilities.media().len(),
                color_modes = capabilities.color_modes().len(),
                qualities = capabilities.qualities().len(),
                "Fetched printer capabilities"
            );
            CapabilityState::Available {
                capabilities,
                defaults,
            }
        }
        Err(e) => {
            tracing::warn!(printer = printer_id, "Could not fetch printer capabilities: {}", e);
            CapabilityState::Unavailable {
                reason: e.to_string(),
            }
        }
    }
}
