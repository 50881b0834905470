use lm_core::EditorResult;
use lm_core::Theme;
use lm_history::HistoryConfig;
use lm_ipc::ChannelConfig;
use lm_ipc::EndpointRole;
use lm_layout::Viewport;
use lm_surface::SurfaceConfig;

const DEFAULT_MAX_MESSAGE_BYTES: usize = 256 * 1024;

/// Startup configuration for one editor instance.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorConfig {
    pub surface: SurfaceConfig,
    pub history: HistoryConfig,
    /// Frame limit for the host endpoint handed out by `connect_host`.
    pub max_message_bytes: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            surface: SurfaceConfig::default(),
            history: HistoryConfig::default(),
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
        }
    }
}

impl EditorConfig {
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.surface.theme = theme;
        self
    }

    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.surface.viewport = viewport;
        self
    }

    pub fn validate(&self) -> EditorResult<()> {
        self.surface.validate()?;
        self.history.validate()?;
        ChannelConfig {
            role: EndpointRole::Host,
            max_message_bytes: self.max_message_bytes,
        }
        .validate()
    }
}

#[cfg(test)]
mod tests {
    use super::EditorConfig;
    use lm_core::Theme;
    use lm_history::HistoryConfig;

    #[test]
    fn default_config_is_valid() {
        let config = EditorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.surface.theme, Theme::Light);
    }

    #[test]
    fn limits_are_checked_per_layer() {
        let config = EditorConfig {
            max_message_bytes: 0,
            ..EditorConfig::default()
        };
        assert!(config.validate().is_err_and(|error| error.code == "ipc.max_message_bytes_invalid"));

        let config = EditorConfig {
            history: HistoryConfig { max_entries: 1 },
            ..EditorConfig::default()
        };
        assert!(config.validate().is_err());

        let config = EditorConfig::default().with_theme(Theme::Dark);
        assert_eq!(config.surface.theme, Theme::Dark);
    }
}
