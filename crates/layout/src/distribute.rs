//! Top-down sizing.
//!
//! Every tree root is walked breadth-first. When a node is visited its own
//! size on the axis is final, and the space inside it is shared among its
//! flow children: percentages first, then grow or shrink on the main axis, and
//! stretch or clamp on the cross axis.

use crate::declaration::{Alignment, SizingAxis};
use crate::tree::{Anchor, Frame, LayoutNode, NodeIndex, WrapLines};
use trellis_types::Axis;

/// Slack smaller than this is treated as zero.
const SLACK_EPSILON: f32 = 0.01;

/// Resolves the size of every node along `axis`. Returns the number of
/// containers whose children could not be shrunk enough to fit.
pub(crate) fn distribute_axis(frame: &mut Frame, axis: Axis) -> usize {
    let mut overflowing = 0;
    for root in 0..frame.roots.len() {
        let root = frame.roots[root].node;
        if !size_root(frame, root, axis) {
            continue;
        }
        frame.queue.clear();
        if frame.queue.push(root).is_err() {
            continue;
        }
        let mut head = 0;
        while head < frame.queue.len() {
            let parent = frame.queue[head];
            head += 1;
            if size_children(frame, parent, axis) {
                overflowing += 1;
            }
            let range = frame.node(parent).children;
            for slot in range.indices() {
                let child = frame.child(slot);
                if frame.queue.push(child).is_err() {
                    break;
                }
            }
        }
    }
    frame.queue.clear();
    overflowing
}

/// Sizes a floating root against its anchor. The main root keeps its fixed
/// viewport size. Returns `false` for roots that will not be laid out.
fn size_root(frame: &mut Frame, root: NodeIndex, axis: Axis) -> bool {
    let Some(floating) = frame.node(root).floating else {
        return true;
    };
    let anchor_size = match floating.anchor {
        None => return false,
        Some(Anchor::Node(anchor)) => frame.node(anchor).dimensions.along(axis),
        Some(Anchor::Viewport) => frame.nodes[0].dimensions.along(axis),
    };
    let node = frame.node_mut(root);
    let size = match node.sizing(axis) {
        SizingAxis::Grow { min, max, .. } => anchor_size.max(min).min(max),
        SizingAxis::Percent(fraction) => anchor_size * fraction,
        SizingAxis::Fixed(_) | SizingAxis::Fit { .. } => return true,
    };
    *node.dimensions.along_mut(axis) = size;
    true
}

/// Returns `true` when the children overflow the parent on its main axis.
fn size_children(frame: &mut Frame, parent: NodeIndex, axis: Axis) -> bool {
    let node = *frame.node(parent);
    if node.children.is_empty() || node.is_text() {
        return false;
    }
    let inner = (node.dimensions.along(axis) - node.layout.padding.along(axis)).max(0.0);
    let gap = f32::from(node.layout.child_gap);
    let main = node.layout.direction.main_axis();

    if axis != main {
        size_cross(frame, &node, axis, inner);
        return false;
    }

    if !node.layout.wrap {
        let start = node.children.start as usize;
        return size_main(frame, start..start + node.children.len as usize, axis, inner, gap, node.clips(axis));
    }

    // Percentages are resolved before the children are broken into lines, when
    // the gaps on each line are not yet known, so they take a share of the
    // whole inner size.
    for slot in node.children.indices() {
        let child = frame.node_mut(frame.children[slot]);
        if let SizingAxis::Percent(fraction) = child.sizing(axis) {
            let size = inner * fraction;
            *child.dimensions.along_mut(axis) = size;
            *child.min_dimensions.along_mut(axis) = size;
        }
    }
    let mut line_start = node.children.start as usize;
    loop {
        let children = frame.child_slice(node.children);
        let offset = line_start - node.children.start as usize;
        let Some(line) = WrapLines::new(frame.nodes.as_slice(), &children[offset..], axis, inner, gap).next()
        else {
            break;
        };
        let line = line_start + line.start..line_start + line.end;
        line_start = line.end;
        grow_line(frame, line, axis, inner, gap);
    }
    false
}

/// Distributes a line of a wrapping container. Lines never shrink; a single
/// child wider than the container is clamped to it.
fn grow_line(frame: &mut Frame, line: std::ops::Range<usize>, axis: Axis, inner: f32, gap: f32) {
    if line.len() == 1 {
        let child = frame.node_mut(frame.children[line.start]);
        let size = child.dimensions.along(axis);
        let floor = child.min_dimensions.along(axis);
        if size > inner {
            *child.dimensions.along_mut(axis) = inner.max(floor);
        }
    }
    let used = used_space(frame, line.clone(), axis, gap);
    let slack = inner - used;
    if slack > SLACK_EPSILON {
        grow(frame, line, axis, slack);
    }
}

fn used_space(frame: &Frame, slots: std::ops::Range<usize>, axis: Axis, gap: f32) -> f32 {
    let gaps = gap * slots.len().saturating_sub(1) as f32;
    slots
        .map(|slot| frame.node(frame.children[slot]).dimensions.along(axis))
        .sum::<f32>()
        + gaps
}

/// Main axis of a non-wrapping container. Returns `true` on overflow.
fn size_main(
    frame: &mut Frame,
    slots: std::ops::Range<usize>,
    axis: Axis,
    inner: f32,
    gap: f32,
    parent_clips: bool,
) -> bool {
    let gaps = gap * slots.len().saturating_sub(1) as f32;
    let share = (inner - gaps).max(0.0);
    for slot in slots.clone() {
        let child = frame.node_mut(frame.children[slot]);
        if let SizingAxis::Percent(fraction) = child.sizing(axis) {
            let size = share * fraction;
            *child.dimensions.along_mut(axis) = size;
            *child.min_dimensions.along_mut(axis) = size;
        }
    }

    let slack = inner - used_space(frame, slots.clone(), axis, gap);
    if slack > SLACK_EPSILON {
        grow(frame, slots, axis, slack);
        false
    } else if slack < -SLACK_EPSILON && !parent_clips {
        let remaining = shrink(frame, slots, axis, slack);
        if remaining < -SLACK_EPSILON {
            log::debug!("children overflow their container by {:.2}px on {:?}", -remaining, axis);
            return true;
        }
        false
    } else {
        false
    }
}

fn grow_limit(node: &LayoutNode, axis: Axis) -> Option<(f32, f32)> {
    match node.sizing(axis) {
        SizingAxis::Grow { max, factor, .. } => Some((max, factor)),
        _ => None,
    }
}

/// Shares positive `slack` among the `Grow` children in proportion to their
/// factors. Children that reach their max are frozen there and the rest is
/// shared again. The last child still growing takes the exact remainder.
fn grow(frame: &mut Frame, slots: std::ops::Range<usize>, axis: Axis, mut slack: f32) {
    let Frame {
        nodes,
        children,
        eligible,
        ..
    } = frame;
    eligible.clear();
    for slot in slots {
        let child = children[slot];
        if let Some((max, _)) = grow_limit(&nodes[child.index()], axis) {
            if nodes[child.index()].dimensions.along(axis) < max && eligible.push(child).is_err() {
                break;
            }
        }
    }

    while slack > SLACK_EPSILON && !eligible.is_empty() {
        let total_factor: f32 = eligible
            .iter()
            .filter_map(|child| grow_limit(&nodes[child.index()], axis))
            .map(|(_, factor)| factor)
            .sum();
        if total_factor <= 0.0 {
            break;
        }

        let mut froze = false;
        let sweep = slack;
        for child in eligible.iter() {
            let node = &mut nodes[child.index()];
            let Some((max, factor)) = grow_limit(node, axis) else {
                continue;
            };
            let size = node.dimensions.along_mut(axis);
            if *size + sweep * factor / total_factor >= max {
                slack -= max - *size;
                *size = max;
                froze = true;
            }
        }
        if froze {
            eligible.retain(|child| {
                let node = &nodes[child.index()];
                grow_limit(node, axis).is_some_and(|(max, _)| node.dimensions.along(axis) < max)
            });
            continue;
        }

        let last = eligible.len() - 1;
        let mut remaining = slack;
        for (position, child) in eligible.iter().enumerate() {
            let node = &mut nodes[child.index()];
            let factor = grow_limit(node, axis).map_or(0.0, |(_, factor)| factor);
            let amount = if position == last {
                remaining
            } else {
                slack * factor / total_factor
            };
            *node.dimensions.along_mut(axis) += amount;
            remaining -= amount;
        }
        slack = 0.0;
    }
    eligible.clear();
}

/// Takes negative `slack` from every child that is neither fixed nor a
/// percentage, in proportion to its current size, never below its min size.
/// Returns the slack that could not be absorbed.
fn shrink(frame: &mut Frame, slots: std::ops::Range<usize>, axis: Axis, mut slack: f32) -> f32 {
    let Frame {
        nodes,
        children,
        eligible,
        ..
    } = frame;
    let shrinkable = |node: &LayoutNode| {
        !matches!(node.sizing(axis), SizingAxis::Fixed(_) | SizingAxis::Percent(_))
            && node.dimensions.along(axis) > node.min_dimensions.along(axis)
    };
    eligible.clear();
    for slot in slots {
        let child = children[slot];
        if shrinkable(&nodes[child.index()]) && eligible.push(child).is_err() {
            break;
        }
    }

    while slack < -SLACK_EPSILON && !eligible.is_empty() {
        let total: f32 = eligible
            .iter()
            .map(|child| nodes[child.index()].dimensions.along(axis))
            .sum();
        if total <= 0.0 {
            break;
        }

        let mut froze = false;
        let sweep = slack;
        for child in eligible.iter() {
            let node = &mut nodes[child.index()];
            let floor = node.min_dimensions.along(axis);
            let size = node.dimensions.along_mut(axis);
            if *size + sweep * *size / total <= floor {
                slack += *size - floor;
                *size = floor;
                froze = true;
            }
        }
        if froze {
            eligible.retain(|child| shrinkable(&nodes[child.index()]));
            continue;
        }

        let last = eligible.len() - 1;
        let mut remaining = slack;
        for (position, child) in eligible.iter().enumerate() {
            let size = nodes[child.index()].dimensions.along_mut(axis);
            let amount = if position == last {
                remaining
            } else {
                slack * *size / total
            };
            *size += amount;
            remaining -= amount;
        }
        slack = 0.0;
    }
    eligible.clear();
    slack
}

/// Cross axis: every child is sized independently against the inner size.
fn size_cross(frame: &mut Frame, parent: &LayoutNode, axis: Axis, inner: f32) {
    let stretch = parent.layout.child_alignment.along(axis) == Alignment::Stretch;
    let wrap = parent.layout.wrap;
    let parent_clips = parent.clips(axis);
    for slot in parent.children.indices() {
        let child = frame.node_mut(frame.children[slot]);
        let floor = child.min_dimensions.along(axis);
        let current = child.dimensions.along(axis);
        let size = match child.sizing(axis) {
            SizingAxis::Fixed(_) => continue,
            SizingAxis::Percent(fraction) => {
                let size = inner * fraction;
                *child.min_dimensions.along_mut(axis) = size;
                size
            }
            SizingAxis::Grow { min, max, .. } if !wrap => inner.max(min).min(max).max(floor),
            SizingAxis::Fit { max, .. } | SizingAxis::Grow { max, .. } => {
                if wrap {
                    continue;
                } else if stretch {
                    inner.min(max).max(floor)
                } else if parent_clips {
                    continue;
                } else {
                    current.min(inner).max(floor)
                }
            }
        };
        *child.dimensions.along_mut(axis) = size;
    }
}
