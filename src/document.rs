//! JSON layout documents.
//!
//! A document describes a viewport, an optional [`ContextConfig`] and a tree
//! of elements and text runs. Laying it out replays the tree through a fresh
//! [`LayoutContext`] and produces a [`LayoutReport`] holding the render
//! commands, the frame statistics and every error the engine reported.
//!
//! ```json
//! {
//!   "viewport": { "width": 800, "height": 600 },
//!   "children": [
//!     { "element": {
//!         "id": "sidebar",
//!         "layout": { "sizing": { "width": { "fixed": 200 }, "height": { "grow": {} } } },
//!         "backgroundColor": "#223344",
//!         "children": [ { "text": { "text": "Inbox", "fontSize": 20 } } ]
//!     } }
//!   ]
//! }
//! ```

use crate::error::{DocumentError, PipelineError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use trellis_layout::{
    Arena, CollectingErrorHandler, ContextConfig, Dimensions, ElementDeclaration, ElementId,
    FrameStats, LayoutContext, LayoutError, MonospaceMeasurer, TextConfig, Vector2,
    minimum_memory_size,
};

fn one_frame() -> u32 {
    1
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDocument {
    pub viewport: Dimensions,
    #[serde(default)]
    pub config: ContextConfig,
    #[serde(default)]
    pub measurer: MeasurerSettings,
    /// Frames to lay out. Scroll offsets and pointer input are applied after
    /// the first one.
    #[serde(default = "one_frame")]
    pub frames: u32,
    #[serde(default)]
    pub scroll: Vec<ScrollOffset>,
    #[serde(default)]
    pub pointer: Option<PointerInput>,
    #[serde(default)]
    pub children: Vec<DocumentNode>,
}

/// Ratios for the fixed-advance text measurer, relative to the font size.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MeasurerSettings {
    pub char_width_ratio: f32,
    pub line_height_ratio: f32,
}

impl Default for MeasurerSettings {
    fn default() -> Self {
        let defaults = MonospaceMeasurer::default();
        Self {
            char_width_ratio: defaults.char_width_ratio,
            line_height_ratio: defaults.line_height_ratio,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScrollOffset {
    pub id: ElementId,
    pub offset: Vector2,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerInput {
    pub position: Vector2,
    #[serde(default)]
    pub down: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentNode {
    Element(ElementNode),
    Text(TextNode),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ElementNode {
    /// Elements without an id get one derived from their position.
    #[serde(default)]
    pub id: Option<ElementId>,
    #[serde(flatten)]
    pub declaration: ElementDeclaration,
    #[serde(default)]
    pub children: Vec<DocumentNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextNode {
    pub text: String,
    #[serde(flatten)]
    pub config: TextConfig,
}

/// An engine error, flattened for output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportedError {
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
    pub message: String,
}

impl From<&LayoutError> for ReportedError {
    fn from(error: &LayoutError) -> Self {
        Self {
            kind: error.kind().as_str(),
            element: error.element().map(ToString::to_string),
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutReport {
    pub frames: u32,
    pub minimum_memory_size: usize,
    pub stats: FrameStats,
    pub errors: Vec<ReportedError>,
    /// Element ids under the pointer after the last frame.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pointer_over: Vec<u32>,
    /// Commands of the last frame.
    pub commands: serde_json::Value,
}

impl LayoutDocument {
    /// Parses and validates a document.
    pub fn from_json(json: &str) -> Result<Self, PipelineError> {
        let document: LayoutDocument = serde_json::from_str(json)?;
        document.validate()?;
        Ok(document)
    }

    pub fn validate(&self) -> Result<(), DocumentError> {
        let Dimensions { width, height } = self.viewport;
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(DocumentError::InvalidViewport { width, height });
        }
        if self.frames == 0 {
            return Err(DocumentError::NoFrames);
        }
        let MeasurerSettings {
            char_width_ratio,
            line_height_ratio,
        } = self.measurer;
        let positive = |ratio: f32| ratio.is_finite() && ratio > 0.0;
        if !positive(char_width_ratio) || !positive(line_height_ratio) {
            return Err(DocumentError::InvalidMeasurer {
                char_width_ratio,
                line_height_ratio,
            });
        }
        Ok(())
    }

    /// Lays the document out in a context sized exactly for its configuration.
    pub fn layout(&self) -> Result<LayoutReport, PipelineError> {
        self.validate()?;
        let memory = minimum_memory_size(&self.config);
        let collector = CollectingErrorHandler::new();
        let mut context = LayoutContext::with_config(
            self.config,
            Arena::with_capacity(memory),
            self.viewport,
            Box::new(collector.clone()),
        );
        context.set_text_measurer(MonospaceMeasurer::new(
            self.measurer.char_width_ratio,
            self.measurer.line_height_ratio,
        ));

        let mut commands = serde_json::Value::Null;
        for frame in 0..self.frames {
            if frame == 1 {
                self.apply_input(&mut context);
            }
            context.begin_layout();
            for node in &self.children {
                declare(&mut context, node);
            }
            let output = context.end_layout();
            commands = serde_json::to_value(output)?;
        }
        if self.frames == 1 && self.pointer.is_some() {
            self.apply_input(&mut context);
        }

        log::debug!(
            "laid out {} frame(s) in {} bytes of layout memory",
            self.frames,
            memory
        );
        Ok(LayoutReport {
            frames: self.frames,
            minimum_memory_size: memory,
            stats: context.frame_stats(),
            errors: collector.errors().iter().map(ReportedError::from).collect(),
            pointer_over: context.pointer_over_ids().to_vec(),
            commands,
        })
    }

    fn apply_input(&self, context: &mut LayoutContext) {
        if let Some(pointer) = self.pointer {
            context.set_pointer_state(pointer.position, pointer.down);
        }
        for scroll in &self.scroll {
            if !context.set_scroll_offset(&scroll.id, scroll.offset) {
                log::warn!("'{}' is not a scroll container, offset ignored", scroll.id);
            }
        }
    }
}

fn declare(context: &mut LayoutContext, node: &DocumentNode) {
    match node {
        DocumentNode::Text(text) => context.open_text_element(&text.text, &text.config),
        DocumentNode::Element(element) => {
            match &element.id {
                Some(id) => context.open_element(id, &element.declaration),
                None => context.open_anonymous(&element.declaration),
            }
            for child in &element.children {
                declare(context, child);
            }
            context.close_element();
        }
    }
}

/// Reads a document from `input`, lays it out and writes the report to
/// `output` as pretty-printed JSON.
pub fn layout_file(input: &Path, output: &Path) -> Result<LayoutReport, PipelineError> {
    let document = LayoutDocument::from_json(&fs::read_to_string(input)?)?;
    let report = document.layout()?;
    fs::write(output, serde_json::to_string_pretty(&report)?)?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_defaults() {
        let document = LayoutDocument::from_json(r#"{ "viewport": { "width": 10, "height": 10 } }"#).unwrap();
        assert_eq!(document.frames, 1);
        assert_eq!(document.config, ContextConfig::default());
        assert!(document.children.is_empty());
    }

    #[test]
    fn test_invalid_viewport_is_rejected() {
        let result = LayoutDocument::from_json(r#"{ "viewport": { "width": 0, "height": 10 } }"#);
        assert!(matches!(
            result,
            Err(PipelineError::Document(DocumentError::InvalidViewport { .. }))
        ));
    }

    #[test]
    fn test_nodes_deserialize_with_flattened_configs() {
        let json = r##"{
            "element": {
                "id": { "name": "row", "index": 2 },
                "layout": { "childGap": 4 },
                "backgroundColor": "#ff0000",
                "children": [ { "text": { "text": "hi", "fontSize": 10 } } ]
            }
        }"##;
        let node: DocumentNode = serde_json::from_str(json).unwrap();
        let DocumentNode::Element(element) = node else {
            panic!("expected an element");
        };
        assert_eq!(element.id, Some(ElementId::indexed("row", 2)));
        assert_eq!(element.declaration.layout.child_gap, 4);
        match &element.children[0] {
            DocumentNode::Text(text) => {
                assert_eq!(text.text, "hi");
                assert_eq!(text.config.font_size, 10);
            }
            other => panic!("expected text, got {:?}", other),
        }
    }
}
