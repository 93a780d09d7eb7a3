//! Immediate-mode layout over a fixed memory budget.
//!
//! A [`LayoutContext`] is declared into every frame with
//! `open_element`/`open_text_element`/`close_element` between
//! `begin_layout` and `end_layout`. `end_layout` sizes the tree in two
//! passes per axis, places it, and returns an ordered list of
//! [`RenderCommand`]s for any renderer.

pub mod arena;
pub mod config;
pub mod declaration;
pub mod perf;
pub mod render;
pub mod state;

mod builder;
mod context;
mod distribute;
mod measure;
mod memory;
mod position;
mod reporter;
mod text;
mod tree;

pub use self::arena::{Arena, ArenaError, ArenaStr};
pub use self::config::ContextConfig;
pub use self::context::{FrameStats, LayoutContext};
pub use self::declaration::{
    Alignment, AttachPoint, AttachPoints, BorderConfig, BorderWidth, ChildAlignment, ClipConfig,
    CustomConfig, ElementContent, ElementDeclaration, FloatingAttachTo, FloatingClipTo,
    FloatingConfig, ImageConfig, LayoutConfig, LayoutDirection, Padding, PointerCaptureMode,
    Sizing, SizingAxis,
};
pub use self::memory::minimum_memory_size;
pub use self::perf::{DebugProfiler, NoOpProfiler, Profiler};
pub use self::render::{
    BorderData, ClipData, CustomData, ImageData, RectangleData, RenderCommand, RenderCommands,
    RenderData, TextData,
};
pub use self::state::{PointerPhase, PointerState, ScrollContainerData};

// Shared vocabulary from the foundation crates
pub use trellis_traits::{
    CollectingErrorHandler, ErrorHandler, ErrorKind, LayoutError, LoggingErrorHandler,
    MonospaceMeasurer, TextMeasurer,
};
pub use trellis_types::{
    Axis, BoundingBox, Color, CornerRadius, Dimensions, ElementId, TextAlignment, TextConfig,
    TextWrapMode, Vector2,
};

#[cfg(test)]
mod distribute_test;
#[cfg(test)]
mod test_utils;
