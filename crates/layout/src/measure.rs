//! Bottom-up sizing.
//!
//! Children always have larger indices than their parent, so walking the node
//! table backwards visits every child before its parent. Each visit computes
//! the node's fit size (content-driven preferred size) and min size (the floor
//! shrinking may not cross) along one axis.

use crate::declaration::SizingAxis;
use crate::tree::{Frame, NodeContent, NodeIndex, WrapLines};
use trellis_types::{Axis, Dimensions};

/// Computes fit and min sizes along `axis` for every node of the frame.
///
/// The horizontal pass runs first, on declared sizes alone. The vertical pass
/// runs once widths are final and text has been wrapped, so that wrapped
/// text, row-wrapping containers and aspect-ratio heights see real widths.
pub(crate) fn measure_axis(frame: &mut Frame, axis: Axis) {
    for index in (0..frame.nodes.len()).rev() {
        let (fit, min) = measure_node(frame, NodeIndex::new(index), axis);
        let node = &mut frame.nodes[index];
        *node.dimensions.along_mut(axis) = fit;
        *node.min_dimensions.along_mut(axis) = min;
    }
}

fn measure_node(frame: &Frame, index: NodeIndex, axis: Axis) -> (f32, f32) {
    let node = frame.node(index);

    if let NodeContent::Text(text) = node.content {
        // Width comes from measurement; height from wrapping.
        return match (axis, frame.texts.get(text)) {
            (Axis::X, Some(text)) => (text.unwrapped.width, text.min_width),
            _ => (node.dimensions.along(axis), node.min_dimensions.along(axis)),
        };
    }

    let padding = node.layout.padding.along(axis);
    let (mut fit, mut min) = content_size(frame, index, axis);
    fit += padding;
    min += padding;

    if let Some(intrinsic) = intrinsic_size(&node.content) {
        fit = fit.max(intrinsic.along(axis) + padding);
    }
    if node.clips(axis) {
        min = padding;
    }

    match node.sizing(axis) {
        SizingAxis::Fixed(size) => (size, size),
        SizingAxis::Fit { min: lower, max: upper } | SizingAxis::Grow { min: lower, max: upper, .. } => {
            let fit = fit.max(lower).min(upper);
            (fit, min.max(lower).min(fit))
        }
        SizingAxis::Percent(_) => (min, min),
    }
}

fn intrinsic_size(content: &NodeContent) -> Option<Dimensions> {
    match content {
        NodeContent::Image(image) => Some(image.source_dimensions),
        NodeContent::Custom(custom) => Some(custom.intrinsic_size),
        NodeContent::None | NodeContent::Text(_) => None,
    }
}

/// Fit and min size of the flow children along `axis`, without padding.
fn content_size(frame: &Frame, index: NodeIndex, axis: Axis) -> (f32, f32) {
    let node = frame.node(index);
    if node.children.is_empty() {
        return (0.0, 0.0);
    }
    let children = frame.child_slice(node.children);
    let gap = f32::from(node.layout.child_gap);
    let gaps = gap * (children.len() - 1) as f32;
    let main = node.layout.direction.main_axis();
    let size = |child: &NodeIndex| frame.node(*child).dimensions.along(axis);
    let min_size = |child: &NodeIndex| frame.node(*child).min_dimensions.along(axis);

    if node.layout.wrap && axis != main {
        // Lines can only be formed once the main axis is final, which is
        // the case when measuring height for a row.
        if axis == Axis::Y {
            let available = node.dimensions.along(main) - node.layout.padding.along(main);
            let mut total = 0.0;
            let mut lines = 0_usize;
            for line in WrapLines::new(frame.nodes.as_slice(), children, main, available, gap) {
                total += children[line].iter().map(size).fold(0.0, f32::max);
                lines += 1;
            }
            let total = total + gap * lines.saturating_sub(1) as f32;
            return (total, total);
        }
        let fit = children.iter().map(size).fold(0.0, f32::max);
        let min = children.iter().map(min_size).fold(0.0, f32::max);
        return (fit, min);
    }

    if axis == main {
        let fit = children.iter().map(size).sum::<f32>() + gaps;
        let min = if node.layout.wrap {
            children.iter().map(min_size).fold(0.0, f32::max)
        } else {
            children.iter().map(min_size).sum::<f32>() + gaps
        };
        (fit, min)
    } else {
        let fit = children.iter().map(size).fold(0.0, f32::max);
        let min = children.iter().map(min_size).fold(0.0, f32::max);
        (fit, min)
    }
}
