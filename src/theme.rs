use std::fs;
use std::path::Path;

use ratatui::style::Color;
use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct Theme {
    pub body_bg: Color,
    pub panel_bg: Color,
    pub input_bg: Color,
    pub status_bg: Color,
    pub text_fg: Color,
    pub muted_fg: Color,
    pub active_fg: Color,
    pub success_fg: Color,
    pub warning_fg: Color,
    pub error_fg: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            body_bg: Color::Rgb(24, 28, 38),
            panel_bg: Color::Rgb(32, 36, 47),
            input_bg: Color::Rgb(44, 49, 62),
            status_bg: Color::Rgb(19, 23, 32),
            text_fg: Color::Rgb(225, 225, 225),
            muted_fg: Color::Rgb(170, 175, 185),
            active_fg: Color::Rgb(255, 255, 255),
            success_fg: Color::Rgb(120, 200, 130),
            warning_fg: Color::Rgb(230, 200, 110),
            error_fg: Color::Rgb(235, 120, 120),
        }
    }
}

impl Theme {
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path_ref = path.as_ref();
        match fs::read_to_string(path_ref) {
            Ok(contents) => match Self::from_toml_str(&contents) {
                Ok(theme) => theme,
                Err(err) => {
                    eprintln!(
                        "Failed to parse theme file '{}': {err}. Using defaults.",
                        path_ref.display()
                    );
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        let cfg: ThemeToml = toml::from_str(s)?;
        Ok(Self {
            body_bg: cfg.colors.body_bg.to_color(),
            panel_bg: cfg.colors.panel_bg.to_color(),
            input_bg: cfg.colors.input_bg.to_color(),
            status_bg: cfg.colors.status_bg.to_color(),
            text_fg: cfg.colors.text_fg.to_color(),
            muted_fg: cfg.colors.muted_fg.to_color(),
            active_fg: cfg.colors.active_fg.to_color(),
            success_fg: cfg.colors.success_fg.to_color(),
            warning_fg: cfg.colors.warning_fg.to_color(),
            error_fg: cfg.colors.error_fg.to_color(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ThemeToml {
    colors: ThemeColorsToml,
}

#[derive(Debug, Deserialize)]
struct ThemeColorsToml {
    body_bg: RgbToml,
    panel_bg: RgbToml,
    input_bg: RgbToml,
    status_bg: RgbToml,
    text_fg: RgbToml,
    muted_fg: RgbToml,
    active_fg: RgbToml,
    success_fg: RgbToml,
    warning_fg: RgbToml,
    error_fg: RgbToml,
}

#[derive(Debug, Deserialize)]
struct RgbToml {
    r: u8,
    g: u8,
    b: u8,
}

impl RgbToml {
    fn to_color(&self) -> Color {
        Color::Rgb(self.r, self.g, self.b)
    }
}
