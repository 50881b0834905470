use lm_core::EditorError;
use lm_core::EditorResult;
use lm_layout::Size;
use serde::Deserialize;
use serde::Serialize;

/// Outer spacing around an object, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Margins {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: 6.0,
            right: 6.0,
            bottom: 0.0,
            left: 0.0,
        }
    }
}

/// Partial margin update; `None` keeps the current side.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarginUpdate {
    pub top: Option<f32>,
    pub right: Option<f32>,
    pub bottom: Option<f32>,
    pub left: Option<f32>,
}

/// Tunables shared by the object controllers.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectConfig {
    pub default_margins: Margins,
    /// z-index given to an object when it starts floating.
    pub base_z_index: i32,
    pub z_step: i32,
    pub z_floor: i32,
    /// Vertical travel before a non-floating drag reorders blocks.
    pub move_threshold_px: f32,
    pub min_size_px: f32,
    pub cell_padding_px: f32,
    pub handle_size_px: f32,
    pub default_image_size: Size,
    pub default_text_box_size: Size,
    pub shadow_css: String,
}

impl Default for ObjectConfig {
    fn default() -> Self {
        Self {
            default_margins: Margins::default(),
            base_z_index: 50,
            z_step: 10,
            z_floor: 10,
            move_threshold_px: 30.0,
            min_size_px: 20.0,
            cell_padding_px: 6.0,
            handle_size_px: 10.0,
            default_image_size: Size::new(200.0, 150.0),
            default_text_box_size: Size::new(200.0, 100.0),
            shadow_css: "0 2px 8px rgba(0, 0, 0, 0.3)".to_owned(),
        }
    }
}

impl ObjectConfig {
    pub fn validate(&self) -> EditorResult<()> {
        if self.z_step <= 0 || self.z_floor <= 0 {
            return Err(EditorError::invalid_argument(
                "objects.config.z_order",
                "z step and z floor must be positive",
            ));
        }
        if self.base_z_index < self.z_floor {
            return Err(EditorError::invalid_argument(
                "objects.config.z_order",
                "base z-index must not be below the z floor",
            ));
        }
        let positive = [
            self.min_size_px,
            self.handle_size_px,
            self.default_image_size.width,
            self.default_image_size.height,
            self.default_text_box_size.width,
            self.default_text_box_size.height,
        ];
        if positive.iter().any(|value| !(value.is_finite() && *value > 0.0)) {
            return Err(EditorError::invalid_argument(
                "objects.config.size",
                "object sizes and handle size must be positive",
            ));
        }
        if !(self.move_threshold_px >= 0.0 && self.cell_padding_px >= 0.0) {
            return Err(EditorError::invalid_argument(
                "objects.config.spacing",
                "move threshold and cell padding must not be negative",
            ));
        }
        Ok(())
    }
}
