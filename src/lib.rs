//! Immediate-mode UI layout with a fixed memory budget.
//!
//! The engine lives in `trellis-layout` and is re-exported here. This crate
//! adds a JSON document front end used by the `trellis` command-line tool.

pub mod document;
pub mod error;

pub use document::{
    DocumentNode, ElementNode, LayoutDocument, LayoutReport, MeasurerSettings, PointerInput,
    ReportedError, ScrollOffset, TextNode, layout_file,
};
pub use error::{DocumentError, PipelineError};
pub use trellis_layout::*;
