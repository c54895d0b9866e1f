use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::ConfigError;

/// Construction-time settings for the renderer and the viewer window.
///
/// Every field has a default, so a TOML file only needs the keys it wants to
/// change:
///
/// ```toml
/// title = "teapot"
/// width = 1024
/// height = 768
/// background = [0.1, 0.1, 0.15, 1.0]
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub background: [f32; 4],
    /// World-space direction towards the light.
    pub light_direction: [f32; 3],
    pub ambient: f32,
    /// World units per move command, before the zoom factor is applied.
    pub move_step: f32,
    /// Radians per rotate command.
    pub rotate_step: f32,
    /// Zoom factor per zoom command; zooming out divides by it.
    pub zoom_step: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            title: "Tessera".to_string(),
            width: 800,
            height: 600,
            fov_degrees: 60.0,
            near: 0.1,
            far: 100.0,
            background: [0.05, 0.05, 0.08, 1.0],
            light_direction: [0.4, 0.7, 1.0],
            ambient: 0.2,
            move_step: 0.1,
            rotate_step: 0.03,
            zoom_step: 1.05,
        }
    }
}

impl RenderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn fov(mut self, degrees: f32) -> Self {
        self.fov_degrees = degrees;
        self
    }

    pub fn clip(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    pub fn background(mut self, color: Color) -> Self {
        self.background = color.into();
        self
    }

    /// Reads a TOML file and validates it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &'static str, reason: &str| -> Result<(), ConfigError> {
            Err(ConfigError::Invalid {
                field,
                reason: reason.to_string(),
            })
        };
        if self.width == 0 || self.height == 0 {
            return invalid("width", "framebuffer must be at least 1x1");
        }
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return invalid("fov_degrees", "must be between 0 and 180");
        }
        if !(self.near > 0.0) {
            return invalid("near", "must be positive");
        }
        if !(self.far > self.near) || !self.far.is_finite() {
            return invalid("far", "must be finite and beyond the near plane");
        }
        if !(0.0..=1.0).contains(&self.ambient) {
            return invalid("ambient", "must be within [0, 1]");
        }
        if !(self.zoom_step > 0.0) {
            return invalid("zoom_step", "must be positive");
        }
        Ok(())
    }

    pub fn background_color(&self) -> Color {
        Color::from(self.background)
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}
