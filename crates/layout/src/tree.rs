//! Per-frame element storage.
//!
//! Nodes live in a flat table in the order they were opened, so every child
//! has a larger index than its parent. Children are referenced by index
//! ranges into a second table; nothing holds a reference into another node.

use crate::arena::{Arena, ArenaStr, Pool};
use std::sync::Arc;
use crate::declaration::{
    AttachPoints, BorderConfig, ClipConfig, CustomConfig, FloatingClipTo, ImageConfig,
    LayoutConfig, PointerCaptureMode, SizingAxis,
};
use trellis_types::{
    Axis, BoundingBox, Color, CornerRadius, Dimensions, ElementId, TextConfig, Vector2,
};

/// Handle to a node in the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub(crate) struct NodeIndex(u32);

impl NodeIndex {
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ChildRange {
    pub start: u32,
    pub len: u32,
}

impl ChildRange {
    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn indices(&self) -> std::ops::Range<usize> {
        self.start as usize..(self.start + self.len) as usize
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) enum NodeContent {
    #[default]
    None,
    Text(usize),
    Image(ImageConfig),
    Custom(CustomConfig),
}

/// What a floating node is positioned against, resolved when it is opened.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Anchor {
    Node(NodeIndex),
    Viewport,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct FloatingNode {
    pub offset: Vector2,
    pub expand: Dimensions,
    pub z_index: i16,
    pub attach_points: AttachPoints,
    pub clip_to: FloatingClipTo,
    pub pointer_capture: PointerCaptureMode,
    /// `None` when the anchor could not be found; the subtree is then skipped.
    pub anchor: Option<Anchor>,
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct LayoutNode {
    pub id: u32,
    pub name: ArenaStr,
    pub layout: LayoutConfig,
    pub background: Color,
    pub corner_radius: CornerRadius,
    pub aspect_ratio: Option<f32>,
    pub content: NodeContent,
    pub floating: Option<FloatingNode>,
    pub clip: Option<ClipConfig>,
    pub border: Option<BorderConfig>,
    pub user_data: u64,
    /// Set while the node is open: flow children appended so far.
    pub pending_children: u32,
    /// Set while the node is open: floating children declared inside it.
    pub floating_children: u32,
    pub children: ChildRange,
    pub dimensions: Dimensions,
    pub min_dimensions: Dimensions,
    pub bounding_box: BoundingBox,
    /// Clip rectangle this node is drawn under.
    pub clip_rect: BoundingBox,
    /// Clip rectangle this node's children are drawn under.
    pub content_clip: BoundingBox,
    /// Size of the children's extent, for scroll containers.
    pub content_size: Dimensions,
    pub positioned: bool,
    /// Second element with an id already used this frame.
    pub duplicate: bool,
}

impl LayoutNode {
    pub(crate) fn clips(&self, axis: Axis) -> bool {
        self.clip.is_some_and(|clip| clip.along(axis))
    }

    /// Identity for error reports. Builds an owned name, so only call it on
    /// error paths.
    pub(crate) fn element_id(&self, arena: &Arena) -> ElementId {
        ElementId {
            id: self.id,
            offset: 0,
            base_id: self.id,
            name: Arc::from(arena.get_str(self.name)),
        }
    }

    pub(crate) fn is_text(&self) -> bool {
        matches!(self.content, NodeContent::Text(_))
    }

    /// Sizing on `axis` with the aspect ratio applied. An axis derived from
    /// the other one is reported as `Fixed`: the width when only the height
    /// is fixed, otherwise the height once the width is final.
    pub(crate) fn sizing(&self, axis: Axis) -> SizingAxis {
        let sizing = self.layout.sizing;
        let Some(ratio) = self.aspect_ratio else {
            return sizing.along(axis);
        };
        let width_from_height = sizing.height.is_fixed() && !sizing.width.is_fixed();
        match (axis, sizing.height) {
            (Axis::X, SizingAxis::Fixed(height)) if width_from_height => {
                SizingAxis::Fixed(height * ratio)
            }
            (Axis::Y, _) if !width_from_height => SizingAxis::Fixed(self.dimensions.width / ratio),
            _ => sizing.along(axis),
        }
    }
}

/// A text leaf. Wrapped lines are filled in after horizontal sizing.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct TextNode {
    pub node: NodeIndex,
    pub config: TextConfig,
    pub text: ArenaStr,
    /// Measurement cache key; zero when the text was measured uncached.
    pub measure_key: u32,
    pub unwrapped: Dimensions,
    pub min_width: f32,
    pub line_height: f32,
    pub lines: ChildRange,
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct WrappedLine {
    /// Byte range within the owning text node's string.
    pub start: u32,
    pub len: u32,
    pub width: f32,
}

/// Splits a wrapping container's children into lines along `axis`.
///
/// Each line takes at least one child; further children are added while the
/// line still fits in `available`. Yields ranges of slots into the
/// container's child list.
pub(crate) struct WrapLines<'a> {
    nodes: &'a [LayoutNode],
    children: &'a [NodeIndex],
    axis: Axis,
    available: f32,
    gap: f32,
    next: usize,
}

/// Slack allowed when deciding whether a child still fits on a line.
pub(crate) const LINE_EPSILON: f32 = 0.01;

impl<'a> WrapLines<'a> {
    pub(crate) fn new(
        nodes: &'a [LayoutNode],
        children: &'a [NodeIndex],
        axis: Axis,
        available: f32,
        gap: f32,
    ) -> Self {
        Self {
            nodes,
            children,
            axis,
            available,
            gap,
            next: 0,
        }
    }
}

impl Iterator for WrapLines<'_> {
    type Item = std::ops::Range<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.next;
        let first = self.children.get(start)?;
        let mut used = self.nodes[first.index()].dimensions.along(self.axis);
        let mut end = start + 1;
        while let Some(child) = self.children.get(end) {
            let size = self.nodes[child.index()].dimensions.along(self.axis);
            if used + self.gap + size > self.available + LINE_EPSILON {
                break;
            }
            used += self.gap + size;
            end += 1;
        }
        self.next = end;
        Some(start..end)
    }
}

/// The root of a separately positioned subtree: the main tree, or one
/// floating element.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TreeRoot {
    pub node: NodeIndex,
    pub z_index: i16,
}

/// All storage for one frame's tree, cleared by `begin_layout`.
#[derive(Debug, Default)]
pub(crate) struct Frame {
    pub nodes: Pool<LayoutNode>,
    pub children: Pool<NodeIndex>,
    pub child_buffer: Pool<NodeIndex>,
    pub open_stack: Pool<NodeIndex>,
    pub texts: Pool<TextNode>,
    pub lines: Pool<WrappedLine>,
    pub roots: Pool<TreeRoot>,
    /// Scratch list for breadth-first walks.
    pub queue: Pool<NodeIndex>,
    /// Scratch list for the children eligible in a distribution step.
    pub eligible: Pool<NodeIndex>,
    /// Scratch stack for depth-first walks; the flag marks a revisit.
    pub stack: Pool<(NodeIndex, bool)>,
    /// Tree roots in paint order, filled by the emitter.
    pub paint_order: Pool<TreeRoot>,
}

impl Frame {
    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.children.clear();
        self.child_buffer.clear();
        self.open_stack.clear();
        self.texts.clear();
        self.lines.clear();
        self.roots.clear();
        self.queue.clear();
        self.eligible.clear();
        self.stack.clear();
        self.paint_order.clear();
    }

    pub(crate) fn node(&self, index: NodeIndex) -> &LayoutNode {
        &self.nodes[index.index()]
    }

    pub(crate) fn node_mut(&mut self, index: NodeIndex) -> &mut LayoutNode {
        &mut self.nodes[index.index()]
    }

    pub(crate) fn child(&self, slot: usize) -> NodeIndex {
        self.children[slot]
    }

    pub(crate) fn child_slice(&self, range: ChildRange) -> &[NodeIndex] {
        &self.children.as_slice()[range.indices()]
    }

    /// The wrapped line of `range` that starts at child slot `from`, as
    /// absolute child slots.
    pub(crate) fn wrap_line(
        &self,
        range: ChildRange,
        from: usize,
        axis: Axis,
        available: f32,
        gap: f32,
    ) -> Option<std::ops::Range<usize>> {
        let end = range.indices().end;
        if from >= end {
            return None;
        }
        let slots = &self.children.as_slice()[from..end];
        WrapLines::new(self.nodes.as_slice(), slots, axis, available, gap)
            .next()
            .map(|line| from + line.start..from + line.end)
    }

    /// Sum of the children's sizes plus gaps, and the largest size on the
    /// other axis, over child slots `slots`.
    pub(crate) fn line_extent(
        &self,
        slots: std::ops::Range<usize>,
        axis: Axis,
        gap: f32,
    ) -> (f32, f32) {
        let gaps = gap * slots.len().saturating_sub(1) as f32;
        let mut along = 0.0;
        let mut across = 0.0_f32;
        for slot in slots {
            let size = self.node(self.children[slot]).dimensions;
            along += size.along(axis);
            across = across.max(size.along(axis.cross()));
        }
        (along + gaps, across)
    }

    /// The innermost open element, if any.
    pub(crate) fn open_parent(&self) -> Option<NodeIndex> {
        self.open_stack.last().copied()
    }
}
