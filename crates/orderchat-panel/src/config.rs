//! Panel configuration.

/// Settings supplied by whoever mounts the panel.
#[derive(Debug, Clone)]
pub struct PanelConfig {
    /// Classification tag stored with each outgoing message
    /// (e.g. `market-research`, `factory-contact`, `inspection`).
    pub service_type: Option<String>,

    /// After loading, ask for translations of rows that still lack one.
    pub translate_pending_on_load: bool,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            service_type: None,
            translate_pending_on_load: true,
        }
    }
}

impl PanelConfig {
    /// Tag outgoing messages with a service type.
    pub fn with_service_type(mut self, service_type: impl Into<String>) -> Self {
        self.service_type = Some(service_type.into());
        self
    }
}
