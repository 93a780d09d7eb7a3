use crate::color::Color;
use serde::{Deserialize, Serialize};

/// How a text element may be broken into lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextWrapMode {
    /// Break at spaces when the line would overflow, and at explicit newlines.
    #[default]
    Words,
    /// Only break at explicit newlines.
    Newlines,
    /// Never break; the element is always one line.
    None,
}

/// Horizontal placement of each wrapped line inside the text element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextAlignment {
    #[default]
    Left,
    Center,
    Right,
}

/// Styling for a text run. The engine never interprets `font_id`; it is
/// forwarded to the measurer and to the emitted text command.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextConfig {
    pub color: Color,
    pub font_id: u16,
    pub font_size: u16,
    pub letter_spacing: u16,
    /// Line advance in pixels. Zero means "use the measured height".
    pub line_height: u16,
    pub wrap_mode: TextWrapMode,
    pub alignment: TextAlignment,
    pub user_data: u64,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            font_id: 0,
            font_size: 16,
            letter_spacing: 0,
            line_height: 0,
            wrap_mode: TextWrapMode::Words,
            alignment: TextAlignment::Left,
            user_data: 0,
        }
    }
}

impl TextConfig {
    /// Fields that influence measured size, for cache keys.
    pub fn measurement_key(&self) -> [u32; 3] {
        [
            u32::from(self.font_id),
            u32::from(self.font_size),
            u32::from(self.letter_spacing),
        ]
    }
}
