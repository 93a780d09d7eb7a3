//! Top-down placement.
//!
//! The main root is placed at the origin. Floating roots are placed once
//! their anchor has a final box, so a root anchored inside another floating
//! subtree waits for that subtree. Within a subtree, children are laid out
//! breadth-first from their parent's box, padding, alignment and scroll
//! offset.

use crate::arena::Arena;
use crate::declaration::FloatingClipTo;
use crate::reporter::ErrorReporter;
use crate::state::PersistentState;
use crate::tree::{Anchor, Frame, LayoutNode, NodeIndex};
use trellis_traits::LayoutError;
use trellis_types::{Axis, BoundingBox, Dimensions, Vector2};

pub(crate) struct Placement<'a> {
    pub state: &'a mut PersistentState,
    pub reporter: &'a mut ErrorReporter,
    pub arena: &'a Arena,
    pub frame_number: u32,
    pub viewport: BoundingBox,
}

pub(crate) fn position(frame: &mut Frame, cx: &mut Placement<'_>) {
    let Some(main) = frame.roots.first().map(|root| root.node) else {
        return;
    };
    {
        let node = frame.node_mut(main);
        node.bounding_box = BoundingBox::from_parts(Vector2::zero(), node.dimensions);
        node.clip_rect = cx.viewport;
        node.positioned = true;
    }
    place_subtree(frame, main, cx);

    // Floating roots may anchor to nodes inside other floating roots, so
    // keep placing until nothing changes.
    loop {
        let mut progress = false;
        for slot in 1..frame.roots.len() {
            let root = frame.roots[slot].node;
            if frame.node(root).positioned {
                continue;
            }
            if place_floating(frame, root, cx.viewport) {
                place_subtree(frame, root, cx);
                progress = true;
            }
        }
        if !progress {
            break;
        }
    }

    // Anchors that exist but were never placed sit in a skipped subtree.
    for slot in 1..frame.roots.len() {
        let root = frame.node(frame.roots[slot].node);
        if root.positioned {
            continue;
        }
        if let Some(Anchor::Node(anchor)) = root.floating.and_then(|floating| floating.anchor) {
            cx.reporter.report(LayoutError::FloatingAnchorNotFound {
                element: root.element_id(cx.arena),
                anchor: frame.node(anchor).element_id(cx.arena),
            });
        }
    }
}

/// Positions a floating root against its anchor's final box. Returns `false`
/// when the anchor is missing or not yet placed.
fn place_floating(frame: &mut Frame, root: NodeIndex, viewport: BoundingBox) -> bool {
    let Some(floating) = frame.node(root).floating else {
        return false;
    };
    let (anchor_box, anchor_clip) = match floating.anchor {
        None => return false,
        Some(Anchor::Viewport) => (viewport, viewport),
        Some(Anchor::Node(anchor)) => {
            let anchor = frame.node(anchor);
            if !anchor.positioned {
                return false;
            }
            (anchor.bounding_box, anchor.content_clip)
        }
    };

    let node = frame.node_mut(root);
    let size = node.dimensions;
    let (parent_x, parent_y) = floating.attach_points.parent.factors();
    let (element_x, element_y) = floating.attach_points.element.factors();
    let origin = Vector2::new(
        anchor_box.x + parent_x * anchor_box.width - element_x * size.width + floating.offset.x,
        anchor_box.y + parent_y * anchor_box.height - element_y * size.height + floating.offset.y,
    );
    node.bounding_box = BoundingBox::from_parts(origin, size);
    node.clip_rect = match floating.clip_to {
        FloatingClipTo::AttachedParent => anchor_clip,
        FloatingClipTo::None => viewport,
    };
    node.positioned = true;
    true
}

fn place_subtree(frame: &mut Frame, root: NodeIndex, cx: &mut Placement<'_>) {
    frame.queue.clear();
    if frame.queue.push(root).is_err() {
        return;
    }
    let mut head = 0;
    while head < frame.queue.len() {
        let index = frame.queue[head];
        head += 1;
        place_children(frame, index, cx);
        let range = frame.node(index).children;
        for slot in range.indices() {
            if frame.queue.push(frame.children[slot]).is_err() {
                break;
            }
        }
    }
    frame.queue.clear();

    // The expanded box is the floating element's own; its children were
    // placed from the declared one.
    let node = frame.node_mut(root);
    if let Some(floating) = node.floating {
        let expand = floating.expand;
        if expand.width != 0.0 || expand.height != 0.0 {
            let declared = node.bounding_box;
            node.bounding_box = BoundingBox::new(
                declared.x - expand.width,
                declared.y - expand.height,
                declared.width + expand.width * 2.0,
                declared.height + expand.height * 2.0,
            );
            if !node.duplicate {
                let (id, bounding_box) = (node.id, node.bounding_box);
                cx.state.record_bounds(id, root, bounding_box);
            }
        }
    }
}

/// Size of a node's children including padding, ignoring its own size.
fn content_size(frame: &Frame, node: &LayoutNode, inner: Dimensions) -> Dimensions {
    let main = node.layout.direction.main_axis();
    let padding = node.layout.padding;
    let gap = f32::from(node.layout.child_gap);
    let mut content = Dimensions::zero();
    if node.children.is_empty() {
        *content.along_mut(main) = padding.along(main);
        *content.along_mut(main.cross()) = padding.along(main.cross());
        return content;
    }

    let (along, across) = if node.layout.wrap {
        let mut widest = 0.0_f32;
        let mut stacked = 0.0;
        let mut lines = 0_usize;
        let mut from = node.children.start as usize;
        while let Some(line) = frame.wrap_line(node.children, from, main, inner.along(main), gap) {
            from = line.end;
            let (line_main, line_cross) = frame.line_extent(line, main, gap);
            widest = widest.max(line_main);
            stacked += line_cross;
            lines += 1;
        }
        (widest, stacked + gap * lines.saturating_sub(1) as f32)
    } else {
        frame.line_extent(node.children.indices(), main, gap)
    };
    *content.along_mut(main) = along + padding.along(main);
    *content.along_mut(main.cross()) = across + padding.along(main.cross());
    content
}

/// Places the children of an already placed node, and stores the node's
/// content clip, content size and scroll offset.
fn place_children(frame: &mut Frame, index: NodeIndex, cx: &mut Placement<'_>) {
    let node = *frame.node(index);
    let content_clip = if node.clip.is_some() {
        node.bounding_box.intersection(&node.clip_rect)
    } else {
        node.clip_rect
    };
    if !node.duplicate {
        cx.state.record_bounds(node.id, index, node.bounding_box);
    }

    let main = node.layout.direction.main_axis();
    let cross = main.cross();
    let padding = node.layout.padding;
    let gap = f32::from(node.layout.child_gap);
    let inner = Dimensions::new(
        (node.dimensions.width - padding.along(Axis::X)).max(0.0),
        (node.dimensions.height - padding.along(Axis::Y)).max(0.0),
    );
    let content = content_size(frame, &node, inner);

    let mut origin = node.bounding_box.origin();
    if let Some(clip) = node.clip {
        if !node.duplicate {
            let offset = cx
                .state
                .sync_scroll(node.id, index, cx.frame_number, node.dimensions, content);
            origin.x -= offset.x;
            origin.y -= offset.y;
        }
        origin.x += clip.child_offset.x;
        origin.y += clip.child_offset.y;
    }
    {
        let node = frame.node_mut(index);
        node.content_clip = content_clip;
        node.content_size = content;
    }
    if node.children.is_empty() {
        return;
    }

    let align_main = node.layout.child_alignment.along(main);
    let align_cross = node.layout.child_alignment.along(cross);
    let place = |frame: &mut Frame, slot: usize, main_offset: f32, cross_offset: f32| {
        let child = frame.node_mut(frame.children[slot]);
        let mut offset = Vector2::zero();
        *offset.along_mut(main) = main_offset;
        *offset.along_mut(cross) = cross_offset;
        child.bounding_box = BoundingBox::from_parts(
            Vector2::new(origin.x + offset.x, origin.y + offset.y),
            child.dimensions,
        );
        child.clip_rect = content_clip;
        child.positioned = true;
    };

    if node.layout.wrap {
        let mut line_offset = padding.start(cross);
        let mut from = node.children.start as usize;
        while let Some(line) = frame.wrap_line(node.children, from, main, inner.along(main), gap) {
            from = line.end;
            let (line_main, line_cross) = frame.line_extent(line.clone(), main, gap);
            let mut cursor = padding.start(main) + align_main.offset((inner.along(main) - line_main).max(0.0));
            for slot in line {
                let size = frame.node(frame.children[slot]).dimensions;
                let cross_offset = align_cross.offset((line_cross - size.along(cross)).max(0.0));
                place(frame, slot, cursor, line_offset + cross_offset);
                cursor += size.along(main) + gap;
            }
            line_offset += line_cross + gap;
        }
        return;
    }

    let (total_main, _) = frame.line_extent(node.children.indices(), main, gap);
    let mut cursor = padding.start(main) + align_main.offset((inner.along(main) - total_main).max(0.0));
    for slot in node.children.indices() {
        let size = frame.node(frame.children[slot]).dimensions;
        let cross_offset =
            padding.start(cross) + align_cross.offset((inner.along(cross) - size.along(cross)).max(0.0));
        place(frame, slot, cursor, cross_offset);
        cursor += size.along(main) + gap;
    }
}
