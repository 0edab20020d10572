//! Application shell for the embedding demo

mod app;

pub use app::{App, run};

/// Host window configuration
#[derive(Debug, Clone)]
pub struct ViewConfig {
    pub window_width: u32,
    pub window_height: u32,
    /// BGRA background color; zero alpha makes the view transparent and
    /// switches the quad draw to premultiplied-alpha blending.
    pub background_color: [u8; 4],
    /// Outline the most recent dirty rectangle each frame.
    pub show_update_rect: bool,
}

impl ViewConfig {
    pub fn is_transparent(&self) -> bool {
        self.background_color[3] == 0
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            window_width: 800,
            window_height: 600,
            background_color: [0xff, 0xff, 0xff, 0xff],
            show_update_rect: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_opaque() {
        let config = ViewConfig::default();
        assert_eq!(config.window_width, 800);
        assert_eq!(config.window_height, 600);
        assert!(!config.is_transparent());
    }

    #[test]
    fn zero_alpha_background_is_transparent() {
        let config = ViewConfig {
            background_color: [0, 0, 0, 0],
            ..Default::default()
        };
        assert!(config.is_transparent());
    }
}
