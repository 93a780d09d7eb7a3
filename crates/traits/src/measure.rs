//! The text measurement callback.
//!
//! Shaping and font metrics live outside the engine. A measurer is asked for
//! the size of a single run (a word, a space, or an unwrapped line) along
//! with the width its container offers. Wrapping against that width is done
//! by the engine from the per-run results.

use trellis_types::{Dimensions, TextConfig};

/// Measures a run of text.
///
/// Implementations must be deterministic for the duration of a frame: the
/// engine caches results keyed by text content and the size-relevant fields of
/// [`TextConfig`], and may reuse them on later frames and in other containers.
/// The natural size of the run is expected whatever the width offered.
pub trait TextMeasurer {
    /// `available_width` is the content width of the text's container as
    /// declared, or `f32::MAX` when nothing bounds it before layout.
    fn measure_text(&self, text: &str, config: &TextConfig, available_width: f32) -> Dimensions;
}

impl<F> TextMeasurer for F
where
    F: Fn(&str, &TextConfig, f32) -> Dimensions,
{
    fn measure_text(&self, text: &str, config: &TextConfig, available_width: f32) -> Dimensions {
        self(text, config, available_width)
    }
}

/// A fixed-advance measurer.
///
/// Every character is `font_size * char_width_ratio` wide plus the configured
/// letter spacing, and a run is `font_size * line_height_ratio` tall. Useful
/// for terminals, tests and headless tooling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceMeasurer {
    pub char_width_ratio: f32,
    pub line_height_ratio: f32,
}

impl Default for MonospaceMeasurer {
    fn default() -> Self {
        Self {
            char_width_ratio: 0.5,
            line_height_ratio: 1.0,
        }
    }
}

impl MonospaceMeasurer {
    pub fn new(char_width_ratio: f32, line_height_ratio: f32) -> Self {
        Self {
            char_width_ratio,
            line_height_ratio,
        }
    }
}

impl TextMeasurer for MonospaceMeasurer {
    fn measure_text(&self, text: &str, config: &TextConfig, _available_width: f32) -> Dimensions {
        let font_size = f32::from(config.font_size);
        let chars = text.chars().count() as f32;
        let advance = font_size * self.char_width_ratio + f32::from(config.letter_spacing);
        Dimensions::new(chars * advance, font_size * self.line_height_ratio)
    }
}
