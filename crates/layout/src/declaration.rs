//! Declarative element configuration.
//!
//! An [`ElementDeclaration`] is supplied once, when an element is opened, and
//! is immutable for the rest of the frame.

use serde::{Deserialize, Serialize};
use trellis_types::{Axis, Color, CornerRadius, Dimensions, ElementId, Vector2};

fn unbounded() -> f32 {
    f32::MAX
}

fn one() -> f32 {
    1.0
}

/// How an element is sized along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SizingAxis {
    /// Wrap the content, clamped to `[min, max]`.
    Fit {
        #[serde(default)]
        min: f32,
        #[serde(default = "unbounded")]
        max: f32,
    },
    /// Start at the content size and take a `factor`-weighted share of the
    /// parent's free space, clamped to `[min, max]`.
    Grow {
        #[serde(default)]
        min: f32,
        #[serde(default = "unbounded")]
        max: f32,
        #[serde(default = "one")]
        factor: f32,
    },
    /// A fraction in `0.0..=1.0` of the parent's inner size.
    Percent(f32),
    /// An exact size.
    Fixed(f32),
}

impl Default for SizingAxis {
    fn default() -> Self {
        Self::fit()
    }
}

impl SizingAxis {
    pub fn fit() -> Self {
        SizingAxis::Fit {
            min: 0.0,
            max: f32::MAX,
        }
    }

    pub fn fit_between(min: f32, max: f32) -> Self {
        SizingAxis::Fit { min, max }
    }

    pub fn grow() -> Self {
        SizingAxis::Grow {
            min: 0.0,
            max: f32::MAX,
            factor: 1.0,
        }
    }

    pub fn grow_between(min: f32, max: f32) -> Self {
        SizingAxis::Grow {
            min,
            max,
            factor: 1.0,
        }
    }

    pub fn grow_weighted(factor: f32) -> Self {
        SizingAxis::Grow {
            min: 0.0,
            max: f32::MAX,
            factor,
        }
    }

    pub fn percent(fraction: f32) -> Self {
        SizingAxis::Percent(fraction)
    }

    pub fn fixed(size: f32) -> Self {
        SizingAxis::Fixed(size)
    }

    /// Lower clamp of the resolved size.
    pub fn min(&self) -> f32 {
        match *self {
            SizingAxis::Fit { min, .. } | SizingAxis::Grow { min, .. } => min,
            SizingAxis::Fixed(size) => size,
            SizingAxis::Percent(_) => 0.0,
        }
    }

    /// Upper clamp of the resolved size.
    pub fn max(&self) -> f32 {
        match *self {
            SizingAxis::Fit { max, .. } | SizingAxis::Grow { max, .. } => max,
            SizingAxis::Fixed(size) => size,
            SizingAxis::Percent(_) => f32::MAX,
        }
    }

    pub fn is_grow(&self) -> bool {
        matches!(self, SizingAxis::Grow { .. })
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self, SizingAxis::Fixed(_))
    }

    pub fn is_percent(&self) -> bool {
        matches!(self, SizingAxis::Percent(_))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Sizing {
    pub width: SizingAxis,
    pub height: SizingAxis,
}

impl Sizing {
    pub fn new(width: SizingAxis, height: SizingAxis) -> Self {
        Self { width, height }
    }

    pub fn along(&self, axis: Axis) -> SizingAxis {
        match axis {
            Axis::X => self.width,
            Axis::Y => self.height,
        }
    }

    pub fn along_mut(&mut self, axis: Axis) -> &mut SizingAxis {
        match axis {
            Axis::X => &mut self.width,
            Axis::Y => &mut self.height,
        }
    }
}

/// Space between an element's edge and its children, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Padding {
    pub left: u16,
    pub right: u16,
    pub top: u16,
    pub bottom: u16,
}

impl Padding {
    pub fn all(value: u16) -> Self {
        Self {
            left: value,
            right: value,
            top: value,
            bottom: value,
        }
    }

    pub fn xy(horizontal: u16, vertical: u16) -> Self {
        Self {
            left: horizontal,
            right: horizontal,
            top: vertical,
            bottom: vertical,
        }
    }

    /// Leading padding on `axis` (left or top).
    pub fn start(&self, axis: Axis) -> f32 {
        match axis {
            Axis::X => f32::from(self.left),
            Axis::Y => f32::from(self.top),
        }
    }

    /// Total padding on `axis`.
    pub fn along(&self, axis: Axis) -> f32 {
        match axis {
            Axis::X => f32::from(self.left) + f32::from(self.right),
            Axis::Y => f32::from(self.top) + f32::from(self.bottom),
        }
    }
}

/// Placement of children within leftover space on one axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Alignment {
    #[default]
    Start,
    Center,
    End,
    /// On the cross axis, `Fit` children are stretched to the parent's inner
    /// size. Behaves like `Start` on the main axis.
    Stretch,
}

impl Alignment {
    /// Offset of a box inside `free` leftover space.
    pub fn offset(&self, free: f32) -> f32 {
        match self {
            Alignment::Start | Alignment::Stretch => 0.0,
            Alignment::Center => free / 2.0,
            Alignment::End => free,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChildAlignment {
    pub x: Alignment,
    pub y: Alignment,
}

impl ChildAlignment {
    pub fn new(x: Alignment, y: Alignment) -> Self {
        Self { x, y }
    }

    pub fn along(&self, axis: Axis) -> Alignment {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LayoutDirection {
    /// Children are placed left to right.
    #[default]
    Row,
    /// Children are placed top to bottom.
    Column,
}

impl LayoutDirection {
    pub fn main_axis(&self) -> Axis {
        match self {
            LayoutDirection::Row => Axis::X,
            LayoutDirection::Column => Axis::Y,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    pub sizing: Sizing,
    pub padding: Padding,
    pub child_gap: u16,
    pub child_alignment: ChildAlignment,
    pub direction: LayoutDirection,
    /// Break children into several lines along the main axis when they do
    /// not fit.
    pub wrap: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageConfig {
    /// Opaque handle forwarded to the renderer.
    pub image_id: u64,
    /// Natural size of the image, used as the element's content size.
    pub source_dimensions: Dimensions,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CustomConfig {
    /// Opaque payload forwarded to the renderer.
    pub data: u64,
    /// Content size of the custom element.
    pub intrinsic_size: Dimensions,
}

/// Content drawn by the element itself, besides its background and border.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementContent {
    #[default]
    None,
    Image(ImageConfig),
    Custom(CustomConfig),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BorderWidth {
    pub left: u16,
    pub right: u16,
    pub top: u16,
    pub bottom: u16,
    /// Width of separators drawn in the gaps between children.
    pub between_children: u16,
}

impl BorderWidth {
    pub fn outside(width: u16) -> Self {
        Self {
            left: width,
            right: width,
            top: width,
            bottom: width,
            between_children: 0,
        }
    }

    pub fn all(width: u16) -> Self {
        Self {
            between_children: width,
            ..Self::outside(width)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.left == 0
            && self.right == 0
            && self.top == 0
            && self.bottom == 0
            && self.between_children == 0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BorderConfig {
    pub color: Color,
    pub width: BorderWidth,
}

/// Restricts descendants to the element's box, and makes the element a
/// scroll container on the clipped axes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClipConfig {
    pub horizontal: bool,
    pub vertical: bool,
    /// Extra offset applied to children on top of the scroll offset.
    pub child_offset: Vector2,
}

impl ClipConfig {
    pub fn both() -> Self {
        Self {
            horizontal: true,
            vertical: true,
            child_offset: Vector2::zero(),
        }
    }

    pub fn vertical() -> Self {
        Self {
            vertical: true,
            ..Self::default()
        }
    }

    pub fn horizontal() -> Self {
        Self {
            horizontal: true,
            ..Self::default()
        }
    }

    pub fn along(&self, axis: Axis) -> bool {
        match axis {
            Axis::X => self.horizontal,
            Axis::Y => self.vertical,
        }
    }
}

/// A point on a box, as a pair of horizontal and vertical positions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttachPoint {
    #[default]
    LeftTop,
    LeftCenter,
    LeftBottom,
    CenterTop,
    CenterCenter,
    CenterBottom,
    RightTop,
    RightCenter,
    RightBottom,
}

impl AttachPoint {
    /// Fractions of width and height locating the point on a box.
    pub fn factors(&self) -> (f32, f32) {
        match self {
            AttachPoint::LeftTop => (0.0, 0.0),
            AttachPoint::LeftCenter => (0.0, 0.5),
            AttachPoint::LeftBottom => (0.0, 1.0),
            AttachPoint::CenterTop => (0.5, 0.0),
            AttachPoint::CenterCenter => (0.5, 0.5),
            AttachPoint::CenterBottom => (0.5, 1.0),
            AttachPoint::RightTop => (1.0, 0.0),
            AttachPoint::RightCenter => (1.0, 0.5),
            AttachPoint::RightBottom => (1.0, 1.0),
        }
    }
}

/// Which point of the floating element meets which point of its anchor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AttachPoints {
    pub element: AttachPoint,
    pub parent: AttachPoint,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PointerCaptureMode {
    /// Elements underneath do not receive pointer-over state.
    #[default]
    Capture,
    Passthrough,
}

/// The anchor a floating element is positioned against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FloatingAttachTo {
    /// The element it was declared inside.
    #[default]
    Parent,
    /// Any element opened earlier in the same frame.
    Element(ElementId),
    /// The layout viewport.
    Root,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FloatingClipTo {
    #[default]
    None,
    /// Inherit the clip rectangle the anchor's children are drawn under.
    AttachedParent,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FloatingConfig {
    pub offset: Vector2,
    /// Grows the element's own box on each side without moving its children.
    pub expand: Dimensions,
    /// Paint order among floating elements, lowest first. Every floating
    /// element paints above the main tree, whatever its z-index.
    pub z_index: i16,
    pub attach_points: AttachPoints,
    pub attach_to: FloatingAttachTo,
    pub clip_to: FloatingClipTo,
    pub pointer_capture: PointerCaptureMode,
}

impl FloatingConfig {
    pub fn attached_to(anchor: impl Into<ElementId>) -> Self {
        Self {
            attach_to: FloatingAttachTo::Element(anchor.into()),
            ..Self::default()
        }
    }
}

/// Everything that can be declared about a container element.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ElementDeclaration {
    pub layout: LayoutConfig,
    pub background_color: Color,
    pub corner_radius: CornerRadius,
    /// Width divided by height. Once the width is known the height follows.
    pub aspect_ratio: Option<f32>,
    pub content: ElementContent,
    pub floating: Option<FloatingConfig>,
    pub clip: Option<ClipConfig>,
    pub border: Option<BorderConfig>,
    /// Copied into every command emitted for this element.
    pub user_data: u64,
}

impl ElementDeclaration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn width(mut self, width: SizingAxis) -> Self {
        self.layout.sizing.width = width;
        self
    }

    pub fn height(mut self, height: SizingAxis) -> Self {
        self.layout.sizing.height = height;
        self
    }

    pub fn sizing(mut self, width: SizingAxis, height: SizingAxis) -> Self {
        self.layout.sizing = Sizing::new(width, height);
        self
    }

    pub fn padding(mut self, padding: Padding) -> Self {
        self.layout.padding = padding;
        self
    }

    pub fn child_gap(mut self, gap: u16) -> Self {
        self.layout.child_gap = gap;
        self
    }

    pub fn direction(mut self, direction: LayoutDirection) -> Self {
        self.layout.direction = direction;
        self
    }

    pub fn align(mut self, x: Alignment, y: Alignment) -> Self {
        self.layout.child_alignment = ChildAlignment::new(x, y);
        self
    }

    pub fn wrap(mut self) -> Self {
        self.layout.wrap = true;
        self
    }

    pub fn background(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }

    pub fn corner_radius(mut self, radius: CornerRadius) -> Self {
        self.corner_radius = radius;
        self
    }

    pub fn aspect_ratio(mut self, ratio: f32) -> Self {
        self.aspect_ratio = Some(ratio);
        self
    }

    pub fn image(mut self, image: ImageConfig) -> Self {
        self.content = ElementContent::Image(image);
        self
    }

    pub fn custom(mut self, custom: CustomConfig) -> Self {
        self.content = ElementContent::Custom(custom);
        self
    }

    pub fn floating(mut self, floating: FloatingConfig) -> Self {
        self.floating = Some(floating);
        self
    }

    pub fn clip(mut self, clip: ClipConfig) -> Self {
        self.clip = Some(clip);
        self
    }

    pub fn border(mut self, color: Color, width: BorderWidth) -> Self {
        self.border = Some(BorderConfig { color, width });
        self
    }

    pub fn user_data(mut self, data: u64) -> Self {
        self.user_data = data;
        self
    }
}
