pub mod color;
pub mod geometry;
pub mod ids;
pub mod text;

pub use color::{Color, CornerRadius};
pub use geometry::{Axis, BoundingBox, Dimensions, Vector2};
pub use ids::ElementId;
pub use text::{TextAlignment, TextConfig, TextWrapMode};
