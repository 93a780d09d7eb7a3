//! State that outlives a frame.
//!
//! The per-frame tree is discarded by `begin_layout`, but some things must be
//! remembered between frames: where each element ended up (for hit testing
//! and bounds queries), how far each scroll container is scrolled, and the
//! pointer. These live here, keyed by the numeric element id.

use crate::arena::{CapacityExceeded, FixedMap, Pool};
use crate::declaration::{ClipConfig, PointerCaptureMode};
use crate::tree::{Frame, NodeIndex};
use serde::Serialize;
use trellis_types::{Axis, BoundingBox, Dimensions, Vector2};

/// Per-frame decay applied to scroll momentum at 60 frames per second.
const MOMENTUM_DECAY: f32 = 0.95;

/// Momentum below this speed, in pixels per second, stops.
const MOMENTUM_EPSILON: f32 = 0.1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PointerPhase {
    PressedThisFrame,
    Pressed,
    ReleasedThisFrame,
    #[default]
    Released,
}

impl PointerPhase {
    fn advance(self, is_down: bool) -> Self {
        match (is_down, self) {
            (true, PointerPhase::PressedThisFrame | PointerPhase::Pressed) => PointerPhase::Pressed,
            (true, _) => PointerPhase::PressedThisFrame,
            (false, PointerPhase::ReleasedThisFrame | PointerPhase::Released) => {
                PointerPhase::Released
            }
            (false, _) => PointerPhase::ReleasedThisFrame,
        }
    }

    pub fn is_down(&self) -> bool {
        matches!(self, PointerPhase::PressedThisFrame | PointerPhase::Pressed)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PointerState {
    pub position: Vector2,
    pub phase: PointerPhase,
}

/// Snapshot of a scroll container, as of the last completed frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollContainerData {
    /// Distance the content is scrolled, positive towards the end.
    pub scroll_position: Vector2,
    pub container_dimensions: Dimensions,
    pub content_dimensions: Dimensions,
    pub horizontal: bool,
    pub vertical: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ElementRecord {
    pub node: NodeIndex,
    /// Frame in which the element was last opened.
    pub frame: u32,
    pub bounding_box: BoundingBox,
    pub positioned: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ScrollState {
    pub id: u32,
    pub node: NodeIndex,
    pub last_open_frame: u32,
    pub clip: ClipConfig,
    pub offset: Vector2,
    pub content_size: Dimensions,
    pub container_size: Dimensions,
    pub pointer_origin: Vector2,
    pub scroll_origin: Vector2,
    /// Pixels per second.
    pub momentum: Vector2,
    pub drag_active: bool,
}

impl ScrollState {
    fn max_offset(&self, axis: Axis) -> f32 {
        if !self.clip.along(axis) {
            return 0.0;
        }
        (self.content_size.along(axis) - self.container_size.along(axis)).max(0.0)
    }

    fn clamp_offset(&mut self) {
        for axis in [Axis::X, Axis::Y] {
            let max = self.max_offset(axis);
            let offset = self.offset.along_mut(axis);
            *offset = offset.clamp(0.0, max);
        }
    }

    fn data(&self) -> ScrollContainerData {
        ScrollContainerData {
            scroll_position: self.offset,
            container_dimensions: self.container_size,
            content_dimensions: self.content_size,
            horizontal: self.clip.horizontal,
            vertical: self.clip.vertical,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct PersistentState {
    pub elements: FixedMap<ElementRecord>,
    pub scroll: Pool<ScrollState>,
    pub pointer: PointerState,
    /// Ids under the pointer, outermost first within each tree root.
    pub pointer_over: Pool<u32>,
}

impl PersistentState {
    pub(crate) fn new(
        elements: FixedMap<ElementRecord>,
        scroll: Pool<ScrollState>,
        pointer_over: Pool<u32>,
    ) -> Self {
        Self {
            elements,
            scroll,
            pointer: PointerState::default(),
            pointer_over,
        }
    }

    /// Forgets elements and scroll containers that were not opened in the
    /// frame before `frame`.
    pub(crate) fn begin_frame(&mut self, frame: u32) {
        self.elements
            .retain(|_, record| frame.wrapping_sub(record.frame) <= 1);
        self.scroll
            .retain(|state| frame.wrapping_sub(state.last_open_frame) <= 1);
    }

    /// Links `id` to `node` for this frame. Returns `true` when the id was
    /// already opened this frame; the first element keeps the linkage.
    pub(crate) fn record_element(
        &mut self,
        id: u32,
        node: NodeIndex,
        frame: u32,
    ) -> Result<bool, CapacityExceeded> {
        if let Some(record) = self.elements.get_mut(&id) {
            if record.frame == frame {
                return Ok(true);
            }
            *record = ElementRecord {
                node,
                frame,
                ..ElementRecord::default()
            };
            return Ok(false);
        }
        self.elements.insert(
            id,
            ElementRecord {
                node,
                frame,
                ..ElementRecord::default()
            },
        )?;
        Ok(false)
    }

    /// The node `id` was opened as during `frame`, if any.
    pub(crate) fn node_for(&self, id: u32, frame: u32) -> Option<NodeIndex> {
        self.elements
            .get(&id)
            .filter(|record| record.frame == frame)
            .map(|record| record.node)
    }

    pub(crate) fn record_bounds(&mut self, id: u32, node: NodeIndex, bounding_box: BoundingBox) {
        if let Some(record) = self.elements.get_mut(&id) {
            if record.node == node {
                record.bounding_box = bounding_box;
                record.positioned = true;
            }
        }
    }

    /// Bounds from the latest layout that placed `id`, as long as it was
    /// opened during `frame` or the frame before.
    pub(crate) fn element_bounds(&self, id: u32, frame: u32) -> Option<BoundingBox> {
        self.elements
            .get(&id)
            .filter(|record| record.positioned && frame.wrapping_sub(record.frame) <= 1)
            .map(|record| record.bounding_box)
    }

    /// Marks the scroll container `id` as open this frame, creating its state
    /// on first sight.
    pub(crate) fn open_scroll_container(
        &mut self,
        id: u32,
        node: NodeIndex,
        clip: ClipConfig,
        frame: u32,
    ) -> Result<(), CapacityExceeded> {
        if let Some(state) = self.scroll.iter_mut().find(|state| state.id == id) {
            state.node = node;
            state.clip = clip;
            state.last_open_frame = frame;
            return Ok(());
        }
        self.scroll
            .push(ScrollState {
                id,
                node,
                last_open_frame: frame,
                clip,
                ..ScrollState::default()
            })
            .map(|_| ())
    }

    /// Stores this frame's container and content size for the scroll
    /// container laid out as `node` and returns its clamped offset.
    pub(crate) fn sync_scroll(
        &mut self,
        id: u32,
        node: NodeIndex,
        frame: u32,
        container_size: Dimensions,
        content_size: Dimensions,
    ) -> Vector2 {
        let Some(state) = self
            .scroll
            .iter_mut()
            .find(|state| state.id == id && state.node == node && state.last_open_frame == frame)
        else {
            return Vector2::zero();
        };
        state.container_size = container_size;
        state.content_size = content_size;
        state.clamp_offset();
        state.offset
    }

    pub(crate) fn scroll_container_data(&self, id: u32, frame: u32) -> Option<ScrollContainerData> {
        self.scroll
            .iter()
            .find(|state| state.id == id && state.last_open_frame == frame)
            .map(ScrollState::data)
    }

    /// Sets the offset of a scroll container and stops any momentum.
    pub(crate) fn set_scroll_offset(&mut self, id: u32, offset: Vector2) -> bool {
        let Some(state) = self.scroll.iter_mut().find(|state| state.id == id) else {
            return false;
        };
        state.offset = offset;
        state.momentum = Vector2::zero();
        state.clamp_offset();
        true
    }

    pub(crate) fn is_pointer_over(&self, id: u32) -> bool {
        self.pointer_over.iter().any(|over| *over == id)
    }

    /// Hit-tests the last completed frame and advances the pointer phase.
    ///
    /// Tree roots are tested topmost first. Within a root every node whose
    /// box and clip rectangle both contain the point is recorded, parents
    /// before children. A floating root that captures the pointer hides the
    /// roots beneath it once it is hit. Children are tested even when their
    /// parent is missed, since they may overflow it.
    pub(crate) fn set_pointer_state(&mut self, frame: &mut Frame, position: Vector2, is_down: bool) {
        self.pointer_over.clear();
        let Frame {
            nodes,
            children,
            paint_order,
            queue,
            ..
        } = frame;

        for root in paint_order.iter().rev() {
            let mut hit = false;
            queue.clear();
            if queue.push(root.node).is_err() {
                break;
            }
            while let Some(index) = queue.pop() {
                let node = &nodes[index.index()];
                if !node.positioned {
                    continue;
                }
                if node.bounding_box.contains(position) && node.clip_rect.contains(position) {
                    hit = true;
                    if !node.duplicate && !self.is_pointer_over(node.id) {
                        let _ = self.pointer_over.push(node.id);
                    }
                }
                for slot in node.children.indices().rev() {
                    if queue.push(children[slot]).is_err() {
                        break;
                    }
                }
            }
            let root_node = &nodes[root.node.index()];
            let captures = root_node
                .floating
                .is_some_and(|floating| floating.pointer_capture == PointerCaptureMode::Capture);
            if hit && captures {
                break;
            }
        }
        queue.clear();

        self.pointer = PointerState {
            position,
            phase: self.pointer.phase.advance(is_down),
        };
    }

    /// Applies wheel, drag and momentum scrolling.
    ///
    /// Containers that were not laid out in `frame` are dropped first. The
    /// wheel `delta` and drag gestures act on the innermost scroll container
    /// under the pointer; momentum carries on for every container.
    pub(crate) fn update_scroll_containers(
        &mut self,
        frame: u32,
        drag_enabled: bool,
        delta: Vector2,
        elapsed_seconds: f32,
    ) {
        self.scroll.retain(|state| state.last_open_frame == frame);

        let target = self
            .pointer_over
            .iter()
            .rev()
            .find_map(|id| self.scroll.iter().position(|state| state.id == *id));
        let pointer = self.pointer;
        let dragging = drag_enabled && pointer.phase.is_down();
        let elapsed = elapsed_seconds.max(0.0);
        let decay = MOMENTUM_DECAY.powf(elapsed * 60.0);

        for (index, state) in self.scroll.iter_mut().enumerate() {
            let is_target = target == Some(index);

            if is_target && dragging {
                if !state.drag_active || pointer.phase == PointerPhase::PressedThisFrame {
                    state.drag_active = true;
                    state.pointer_origin = pointer.position;
                    state.scroll_origin = state.offset;
                    state.momentum = Vector2::zero();
                } else {
                    let previous = state.offset;
                    state.offset = Vector2::new(
                        state.scroll_origin.x - (pointer.position.x - state.pointer_origin.x),
                        state.scroll_origin.y - (pointer.position.y - state.pointer_origin.y),
                    );
                    if elapsed > 0.0 {
                        state.momentum = Vector2::new(
                            (state.offset.x - previous.x) / elapsed,
                            (state.offset.y - previous.y) / elapsed,
                        );
                    }
                }
            } else {
                state.drag_active = false;
                state.offset.x += state.momentum.x * elapsed;
                state.offset.y += state.momentum.y * elapsed;
                state.momentum.x *= decay;
                state.momentum.y *= decay;
                if state.momentum.x.abs() < MOMENTUM_EPSILON {
                    state.momentum.x = 0.0;
                }
                if state.momentum.y.abs() < MOMENTUM_EPSILON {
                    state.momentum.y = 0.0;
                }
            }

            if is_target {
                if state.clip.horizontal {
                    state.offset.x -= delta.x;
                }
                if state.clip.vertical {
                    state.offset.y -= delta.y;
                }
            }
            state.clamp_offset();
        }
    }
}
