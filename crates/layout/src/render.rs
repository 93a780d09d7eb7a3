//! Render commands and the emitter that produces them.
//!
//! Tree roots are painted in ascending z-index, the main tree first among
//! equals. Each element emits, in order: a clip start when it clips, its
//! background, its border, its content, its children and finally the
//! matching clip end.

use crate::arena::{Arena, ArenaStr, Pool};
use crate::declaration::{BorderWidth, FloatingClipTo};
use crate::reporter::ErrorReporter;
use crate::tree::{Frame, LayoutNode, NodeContent, NodeIndex, TreeRoot};
use serde::{Serialize, Serializer};
use std::ops::Deref;
use trellis_traits::LayoutError;
use trellis_types::{
    Axis, BoundingBox, Color, CornerRadius, Dimensions, TextAlignment, TextConfig,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RectangleData {
    pub color: Color,
    pub corner_radius: CornerRadius,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BorderData {
    pub color: Color,
    pub corner_radius: CornerRadius,
    pub width: BorderWidth,
}

/// One wrapped line of a text element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextData {
    /// Resolve with [`RenderCommands::text`]; valid until the next
    /// `begin_layout`.
    #[serde(skip)]
    pub text: ArenaStr,
    pub color: Color,
    pub font_id: u16,
    pub font_size: u16,
    pub letter_spacing: u16,
    pub line_height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageData {
    pub background_color: Color,
    pub corner_radius: CornerRadius,
    pub image_id: u64,
    pub source_dimensions: Dimensions,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomData {
    pub background_color: Color,
    pub corner_radius: CornerRadius,
    pub data: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClipData {
    pub horizontal: bool,
    pub vertical: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RenderData {
    None,
    Rectangle(RectangleData),
    Border(BorderData),
    Text(TextData),
    Image(ImageData),
    /// Restrict following commands to the bounding box until the matching
    /// `ClipEnd`.
    ClipStart(ClipData),
    ClipEnd,
    Custom(CustomData),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderCommand {
    pub bounding_box: BoundingBox,
    pub id: u32,
    pub z_index: i16,
    pub user_data: u64,
    pub data: RenderData,
}

impl RenderCommand {
    pub fn is_clip_start(&self) -> bool {
        matches!(self.data, RenderData::ClipStart(_))
    }

    pub fn is_clip_end(&self) -> bool {
        matches!(self.data, RenderData::ClipEnd)
    }
}

/// The commands of one frame, borrowed from the context that produced them.
#[derive(Debug, Clone, Copy)]
pub struct RenderCommands<'a> {
    commands: &'a [RenderCommand],
    arena: &'a Arena,
}

impl<'a> RenderCommands<'a> {
    pub(crate) fn new(commands: &'a [RenderCommand], arena: &'a Arena) -> Self {
        Self { commands, arena }
    }

    pub fn as_slice(&self) -> &'a [RenderCommand] {
        self.commands
    }

    /// The string a text command draws.
    pub fn text(&self, command: &RenderCommand) -> Option<&'a str> {
        match command.data {
            RenderData::Text(text) => Some(self.arena.get_str(text.text)),
            _ => None,
        }
    }
}

impl Deref for RenderCommands<'_> {
    type Target = [RenderCommand];

    fn deref(&self) -> &[RenderCommand] {
        self.commands
    }
}

#[derive(Serialize)]
struct SerializedCommand<'a> {
    #[serde(flatten)]
    command: &'a RenderCommand,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
}

impl Serialize for RenderCommands<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.commands.iter().map(|command| SerializedCommand {
            command,
            text: self.text(command),
        }))
    }
}

/// Output table with a slot held back for every open clip, so a clip start
/// that was accepted can always be closed.
#[derive(Debug, Default)]
pub(crate) struct CommandBuffer {
    commands: Pool<RenderCommand>,
    open_clips: usize,
}

impl CommandBuffer {
    pub(crate) fn new(commands: Pool<RenderCommand>) -> Self {
        Self {
            commands,
            open_clips: 0,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.commands.clear();
        self.open_clips = 0;
    }

    pub(crate) fn as_slice(&self) -> &[RenderCommand] {
        self.commands.as_slice()
    }

    pub(crate) fn len(&self) -> usize {
        self.commands.len()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.commands.capacity()
    }

    fn has_room(&self, count: usize) -> bool {
        self.commands.len() + self.open_clips + count <= self.commands.capacity()
    }

    fn overflow(&self, reporter: &mut ErrorReporter) {
        reporter.report_once_per_frame(LayoutError::RenderCommandCapacityExceeded {
            capacity: self.commands.capacity(),
        });
    }

    fn push(&mut self, command: RenderCommand, reporter: &mut ErrorReporter) -> bool {
        if !self.has_room(1) || self.commands.push(command).is_err() {
            self.overflow(reporter);
            return false;
        }
        true
    }

    fn push_clip_start(&mut self, command: RenderCommand, reporter: &mut ErrorReporter) -> bool {
        if !self.has_room(2) || self.commands.push(command).is_err() {
            self.overflow(reporter);
            return false;
        }
        self.open_clips += 1;
        true
    }

    fn push_clip_end(&mut self, command: RenderCommand, reporter: &mut ErrorReporter) {
        self.open_clips = self.open_clips.saturating_sub(1);
        if self.commands.push(command).is_err() {
            reporter.report(LayoutError::InternalConsistency(
                "no slot left for a reserved clip end".to_string(),
            ));
        }
    }
}

pub(crate) struct Emission<'a> {
    pub reporter: &'a mut ErrorReporter,
    pub culling: bool,
}

/// Appends the commands for every placed tree root.
pub(crate) fn emit(frame: &mut Frame, commands: &mut CommandBuffer, cx: &mut Emission<'_>) {
    frame.paint_order.clear();
    for slot in 0..frame.roots.len() {
        let root = frame.roots[slot];
        if frame.node(root.node).positioned && frame.paint_order.push(root).is_err() {
            break;
        }
    }
    // The main tree paints first; floating roots follow it by z-index.
    if let Some(floating) = frame.paint_order.as_mut_slice().get_mut(1..) {
        sort_by_z_index(floating);
    }

    for slot in 0..frame.paint_order.len() {
        let root = frame.paint_order[slot];
        let node = frame.node(root.node);
        let clip_to_anchor = node
            .floating
            .is_some_and(|floating| floating.clip_to == FloatingClipTo::AttachedParent);
        if clip_to_anchor {
            let start = clip_command(node, node.clip_rect, root.z_index, true, true);
            if !commands.push_clip_start(start, cx.reporter) {
                continue;
            }
        }
        emit_tree(frame, root, commands, cx);
        if clip_to_anchor {
            let node = frame.node(root.node);
            let end = command(node, node.clip_rect, root.z_index, RenderData::ClipEnd);
            commands.push_clip_end(end, cx.reporter);
        }
    }
}

/// Stable insertion sort; the list is short and already ordered except for
/// raised or lowered floating roots.
fn sort_by_z_index(roots: &mut [TreeRoot]) {
    for i in 1..roots.len() {
        let mut j = i;
        while j > 0 && roots[j - 1].z_index > roots[j].z_index {
            roots.swap(j - 1, j);
            j -= 1;
        }
    }
}

fn command(node: &LayoutNode, bounding_box: BoundingBox, z_index: i16, data: RenderData) -> RenderCommand {
    RenderCommand {
        bounding_box,
        id: node.id,
        z_index,
        user_data: node.user_data,
        data,
    }
}

fn clip_command(
    node: &LayoutNode,
    bounding_box: BoundingBox,
    z_index: i16,
    horizontal: bool,
    vertical: bool,
) -> RenderCommand {
    command(
        node,
        bounding_box,
        z_index,
        RenderData::ClipStart(ClipData {
            horizontal,
            vertical,
        }),
    )
}

fn emit_tree(frame: &mut Frame, root: TreeRoot, commands: &mut CommandBuffer, cx: &mut Emission<'_>) {
    let z_index = root.z_index;
    frame.stack.clear();
    if frame.stack.push((root.node, false)).is_err() {
        return;
    }

    while let Some((index, revisit)) = frame.stack.pop() {
        let node = *frame.node(index);
        if revisit {
            let end = command(&node, node.content_clip, z_index, RenderData::ClipEnd);
            commands.push_clip_end(end, cx.reporter);
            continue;
        }

        let visible = !cx.culling || node.bounding_box.intersects(&node.clip_rect);
        if !visible {
            // Children of a clipping element cannot show outside it.
            if node.clip.is_none() {
                push_children(frame, &node);
            }
            continue;
        }

        if let Some(clip) = node.clip {
            let start = clip_command(&node, node.content_clip, z_index, clip.horizontal, clip.vertical);
            if !commands.push_clip_start(start, cx.reporter) {
                continue;
            }
            if frame.stack.push((index, true)).is_err() {
                let end = command(&node, node.content_clip, z_index, RenderData::ClipEnd);
                commands.push_clip_end(end, cx.reporter);
                continue;
            }
        }

        let draws_own_background = matches!(node.content, NodeContent::None | NodeContent::Text(_));
        if draws_own_background && node.background.is_visible() {
            let rectangle = RenderData::Rectangle(RectangleData {
                color: node.background,
                corner_radius: node.corner_radius,
            });
            commands.push(command(&node, node.bounding_box, z_index, rectangle), cx.reporter);
        }

        if let Some(border) = node.border {
            let width = border.width;
            if width.left > 0 || width.right > 0 || width.top > 0 || width.bottom > 0 {
                let data = RenderData::Border(BorderData {
                    color: border.color,
                    corner_radius: node.corner_radius,
                    width,
                });
                commands.push(command(&node, node.bounding_box, z_index, data), cx.reporter);
            }
            if width.between_children > 0 && !node.layout.wrap {
                emit_separators(frame, &node, border.color, f32::from(width.between_children), z_index, commands, cx);
            }
        }

        match node.content {
            NodeContent::Text(text) => emit_text(frame, &node, text, z_index, commands, cx),
            NodeContent::Image(image) => {
                let data = RenderData::Image(ImageData {
                    background_color: node.background,
                    corner_radius: node.corner_radius,
                    image_id: image.image_id,
                    source_dimensions: image.source_dimensions,
                });
                commands.push(command(&node, node.bounding_box, z_index, data), cx.reporter);
            }
            NodeContent::Custom(custom) => {
                let data = RenderData::Custom(CustomData {
                    background_color: node.background,
                    corner_radius: node.corner_radius,
                    data: custom.data,
                });
                commands.push(command(&node, node.bounding_box, z_index, data), cx.reporter);
            }
            NodeContent::None => {}
        }

        push_children(frame, &node);
    }
}

/// Pushes children so that the first child is popped first.
fn push_children(frame: &mut Frame, node: &LayoutNode) {
    for slot in node.children.indices().rev() {
        let child: NodeIndex = frame.children[slot];
        if frame.stack.push((child, false)).is_err() {
            break;
        }
    }
}

/// Rectangles centred in each gap between consecutive children, spanning the
/// parent across the main axis.
fn emit_separators(
    frame: &Frame,
    node: &LayoutNode,
    color: Color,
    width: f32,
    z_index: i16,
    commands: &mut CommandBuffer,
    cx: &mut Emission<'_>,
) {
    if node.children.len < 2 {
        return;
    }
    let main = node.layout.direction.main_axis();
    let slots = node.children.indices();
    for slot in slots.start..slots.end - 1 {
        let before = frame.node(frame.children[slot]).bounding_box;
        let after = frame.node(frame.children[slot + 1]).bounding_box;
        let before_end = match main {
            Axis::X => before.right(),
            Axis::Y => before.bottom(),
        };
        let after_start = after.origin().along(main);
        let center = (before_end + after_start) / 2.0;
        let outer = node.bounding_box;
        let bounding_box = match main {
            Axis::X => BoundingBox::new(center - width / 2.0, outer.y, width, outer.height),
            Axis::Y => BoundingBox::new(outer.x, center - width / 2.0, outer.width, width),
        };
        let data = RenderData::Rectangle(RectangleData {
            color,
            corner_radius: CornerRadius::default(),
        });
        commands.push(command(node, bounding_box, z_index, data), cx.reporter);
    }
}

fn emit_text(
    frame: &Frame,
    node: &LayoutNode,
    text: usize,
    z_index: i16,
    commands: &mut CommandBuffer,
    cx: &mut Emission<'_>,
) {
    let Some(text) = frame.texts.get(text) else {
        return;
    };
    let config: TextConfig = text.config;
    let outer = node.bounding_box;
    for (row, slot) in text.lines.indices().enumerate() {
        let line = frame.lines[slot];
        if line.len == 0 {
            continue;
        }
        let x = match config.alignment {
            TextAlignment::Left => outer.x,
            TextAlignment::Center => outer.x + (outer.width - line.width) / 2.0,
            TextAlignment::Right => outer.x + outer.width - line.width,
        };
        let bounding_box = BoundingBox::new(x, outer.y + row as f32 * text.line_height, line.width, text.line_height);
        if cx.culling && !bounding_box.intersects(&node.clip_rect) {
            continue;
        }
        let data = RenderData::Text(TextData {
            text: text.text.slice(line.start as usize, line.len as usize),
            color: config.color,
            font_id: config.font_id,
            font_size: config.font_size,
            letter_spacing: config.letter_spacing,
            line_height: text.line_height,
        });
        let mut line_command = command(node, bounding_box, z_index, data);
        line_command.user_data = config.user_data;
        commands.push(line_command, cx.reporter);
    }
}
