/// Builder for [`GatewayConfig`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct GatewayConfigBuilder {
    model: Option<String>,
    base_url: Option<String>,
}

impl GatewayConfigBuilder {
    /// Creates a builder with the default settings.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the model to request from the gateway.
    ///
    /// When unset, the gateway picks its default model.
    #[inline]
    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets a custom base URL.
    #[inline]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Builds the configuration.
    #[inline]
    pub fn build(self) -> GatewayConfig {
        GatewayConfig {
            model: self.model,
            base_url: self.base_url.unwrap_or_else(|| {
                "https://gateway.voltcart.app/v1".to_string()
            }),
        }
    }
}

/// Configuration for the hosted gateway provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GatewayConfig {
    pub(crate) model: Option<String>,
    pub(crate) base_url: String,
}
