//! Declaring a frame's elements.
//!
//! Elements are appended to the node table in the order they are opened.
//! While an element is open its flow children collect at the end of a shared
//! buffer; closing it moves them into the permanent child table as one
//! contiguous range. Floating elements become tree roots instead of children.

use crate::context::LayoutContext;
use crate::declaration::{ElementContent, ElementDeclaration, FloatingAttachTo, SizingAxis};
use crate::tree::{
    Anchor, ChildRange, Frame, FloatingNode, LayoutNode, NodeContent, NodeIndex, TextNode, TreeRoot,
};
use trellis_traits::LayoutError;
use trellis_types::ids::{ROOT_CONTAINER_NAME, hash_child};
use trellis_types::{Axis, Dimensions, ElementId, TextConfig, TextWrapMode};

/// How an element being opened is named.
enum Identity<'a> {
    Named(&'a ElementId),
    /// The implicit container that wraps every frame.
    Root(u32),
    /// Derived from the parent id and the sibling position.
    Derived { parent: u32, sibling: u32 },
}

impl Identity<'_> {
    fn id(&self) -> u32 {
        match self {
            Identity::Named(id) => id.id,
            Identity::Root(id) => *id,
            Identity::Derived { parent, sibling } => hash_child(*sibling, *parent),
        }
    }

    /// Owned identity for error reports.
    fn element_id(&self) -> ElementId {
        match self {
            Identity::Named(id) => (*id).clone(),
            Identity::Root(_) => ElementId::root(),
            Identity::Derived { parent, sibling } => ElementId::child_of(*parent, *sibling),
        }
    }
}

impl LayoutContext {
    /// Opens an element with a caller-chosen identity as a child of the
    /// innermost open element.
    pub fn open_element(&mut self, id: &ElementId, declaration: &ElementDeclaration) {
        if !self.accepts_declarations("open_element") {
            return;
        }
        self.open_declared(Some(Identity::Named(id)), declaration);
    }

    /// Opens an element whose identity is derived from its parent and its
    /// position among its siblings.
    pub fn open_anonymous(&mut self, declaration: &ElementDeclaration) {
        if !self.accepts_declarations("open_anonymous") {
            return;
        }
        self.open_declared(None, declaration);
    }

    /// Closes the innermost open element.
    pub fn close_element(&mut self) {
        if !self.accepts_declarations("close_element") {
            return;
        }
        if self.build.dropped_depth > 0 {
            self.build.dropped_depth -= 1;
            return;
        }
        if self.frame.open_stack.len() <= 1 {
            self.reporter.report(LayoutError::UnbalancedOpenClose {
                message: "close_element called with no element open".to_string(),
            });
            self.build.aborted = true;
            return;
        }
        if let Some(index) = self.frame.open_stack.pop() {
            self.close_node(index);
        }
    }

    /// Adds a text leaf to the innermost open element. The text is copied
    /// into the frame's arena and measured (or fetched from the measurement
    /// cache) immediately.
    pub fn open_text_element(&mut self, text: &str, config: &TextConfig) {
        if !self.accepts_declarations("open_text_element") || self.build.dropped_depth > 0 {
            return;
        }
        let Some(parent) = self.frame.open_parent() else {
            return;
        };
        if self.frame.nodes.is_full() || self.frame.texts.is_full() {
            self.reporter
                .report_once_per_frame(LayoutError::ElementCapacityExceeded {
                    capacity: self.config.max_element_count,
                });
            return;
        }
        let stored = match self.arena.alloc_str(text) {
            Ok(stored) => stored,
            Err(err) => {
                self.reporter.report_once_per_frame(err.into());
                return;
            }
        };

        let identity = derived_identity(&self.frame, parent);
        let id = identity.id();
        let index = NodeIndex::new(self.frame.nodes.len());
        let duplicate = self.record_identity(&identity, index);

        let available_width = self.available_text_width(parent);
        let (measure_key, measured) = self.text_cache.measure(
            text,
            config,
            self.measurer.as_deref(),
            available_width,
            self.frame_number,
            &mut self.reporter,
            self.profiler.as_ref(),
        );
        let line_height = if config.line_height > 0 {
            f32::from(config.line_height)
        } else {
            measured.line_height
        };
        let width = measured.unwrapped_width;
        let min_width = match config.wrap_mode {
            TextWrapMode::Words => measured.min_width,
            TextWrapMode::Newlines | TextWrapMode::None => width,
        };

        let text_slot = self.frame.texts.len();
        let pushed = self.frame.texts.push(TextNode {
            node: index,
            config: *config,
            text: stored,
            measure_key,
            unwrapped: Dimensions::new(width, line_height),
            min_width,
            line_height,
            lines: ChildRange::default(),
        });
        if pushed.is_err() {
            return;
        }
        let node = LayoutNode {
            id,
            content: NodeContent::Text(text_slot),
            user_data: config.user_data,
            duplicate,
            dimensions: Dimensions::new(width, line_height),
            min_dimensions: Dimensions::new(min_width, line_height),
            ..LayoutNode::default()
        };
        if self.frame.nodes.push(node).is_err() {
            self.frame.texts.pop();
            return;
        }
        self.attach_flow_child(parent, index);
    }

    pub(crate) fn open_root(&mut self) {
        let declaration = ElementDeclaration::new().sizing(
            SizingAxis::Fixed(self.layout_dimensions.width),
            SizingAxis::Fixed(self.layout_dimensions.height),
        );
        self.open_declared(Some(Identity::Root(self.root_id)), &declaration);
    }

    pub(crate) fn close_element_at_root(&mut self) {
        if let Some(root) = self.frame.open_stack.pop() {
            self.close_node(root);
        }
    }

    fn accepts_declarations(&mut self, call: &str) -> bool {
        if self.build.in_frame {
            return !self.build.aborted;
        }
        self.reporter
            .report_once_per_frame(LayoutError::UnbalancedOpenClose {
                message: format!("{} called outside begin_layout/end_layout", call),
            });
        false
    }

    fn open_declared(&mut self, identity: Option<Identity<'_>>, declaration: &ElementDeclaration) {
        if self.build.dropped_depth > 0 {
            self.build.dropped_depth += 1;
            return;
        }
        if self.frame.nodes.is_full() || self.frame.open_stack.is_full() {
            self.reporter
                .report_once_per_frame(LayoutError::ElementCapacityExceeded {
                    capacity: self.config.max_element_count,
                });
            self.build.dropped_depth = 1;
            return;
        }

        let parent = self.frame.open_parent();
        let identity = match (identity, parent) {
            (Some(identity), _) => identity,
            (None, Some(parent)) => derived_identity(&self.frame, parent),
            (None, None) => Identity::Derived {
                parent: self.root_id,
                sibling: 0,
            },
        };
        let index = NodeIndex::new(self.frame.nodes.len());

        let name = match &identity {
            Identity::Named(id) => self.arena.alloc_str(&id.name),
            Identity::Root(_) => self.arena.alloc_str(ROOT_CONTAINER_NAME),
            Identity::Derived { .. } => Ok(Default::default()),
        };
        let name = name.unwrap_or_else(|err| {
            self.reporter.report_once_per_frame(err.into());
            Default::default()
        });

        let mut layout = declaration.layout;
        for axis in [Axis::X, Axis::Y] {
            let sizing = layout.sizing.along_mut(axis);
            *sizing = self.validated_sizing(*sizing, axis, &identity);
        }
        let aspect_ratio = declaration.aspect_ratio.filter(|ratio| {
            let valid = ratio.is_finite() && *ratio > 0.0;
            if !valid {
                self.reporter.report(LayoutError::InvalidSizing {
                    element: identity.element_id(),
                    message: format!("aspect ratio {} must be finite and positive", ratio),
                });
            }
            valid
        });

        let floating = match (&declaration.floating, parent) {
            (Some(floating), Some(parent)) => Some(FloatingNode {
                offset: floating.offset,
                expand: floating.expand,
                z_index: floating.z_index,
                attach_points: floating.attach_points,
                clip_to: floating.clip_to,
                pointer_capture: floating.pointer_capture,
                anchor: self.resolve_anchor(&floating.attach_to, parent, &identity),
            }),
            _ => None,
        };

        let duplicate = self.record_identity(&identity, index);
        let clip = declaration.clip.filter(|clip| clip.horizontal || clip.vertical);
        let node = LayoutNode {
            id: identity.id(),
            name,
            layout,
            background: declaration.background_color,
            corner_radius: declaration.corner_radius,
            aspect_ratio,
            content: match declaration.content {
                ElementContent::None => NodeContent::None,
                ElementContent::Image(image) => NodeContent::Image(image),
                ElementContent::Custom(custom) => NodeContent::Custom(custom),
            },
            floating,
            clip,
            border: declaration.border.filter(|border| !border.width.is_empty()),
            user_data: declaration.user_data,
            duplicate,
            ..LayoutNode::default()
        };
        if self.frame.nodes.push(node).is_err() {
            self.build.dropped_depth = 1;
            return;
        }

        match (parent, floating) {
            (None, _) => {
                let _ = self.frame.roots.push(TreeRoot {
                    node: index,
                    z_index: 0,
                });
            }
            (Some(parent), Some(floating)) => {
                if self
                    .frame
                    .roots
                    .push(TreeRoot {
                        node: index,
                        z_index: floating.z_index,
                    })
                    .is_err()
                {
                    self.reporter.report(LayoutError::InternalConsistency(
                        "no room for a floating root".to_string(),
                    ));
                }
                self.frame.node_mut(parent).floating_children += 1;
            }
            (Some(parent), None) => self.attach_flow_child(parent, index),
        }
        // Capacity was checked above.
        let _ = self.frame.open_stack.push(index);

        if let Some(clip) = clip {
            if !duplicate
                && self
                    .state
                    .open_scroll_container(identity.id(), index, clip, self.frame_number)
                    .is_err()
            {
                self.reporter
                    .report_once_per_frame(LayoutError::ScrollContainerCapacityExceeded {
                        capacity: self.state.scroll.capacity(),
                    });
            }
        }
    }

    /// Replaces an invalid sizing with a usable one, reporting what was wrong.
    fn validated_sizing(&mut self, sizing: SizingAxis, axis: Axis, identity: &Identity<'_>) -> SizingAxis {
        let dimension = match axis {
            Axis::X => "width",
            Axis::Y => "height",
        };
        let invalid = |reporter: &mut crate::reporter::ErrorReporter, message: String| {
            reporter.report(LayoutError::InvalidSizing {
                element: identity.element_id(),
                message,
            });
        };
        match sizing {
            SizingAxis::Percent(value) if !(0.0..=1.0).contains(&value) => {
                self.reporter.report(LayoutError::PercentageOutOfRange {
                    element: identity.element_id(),
                    value,
                });
                SizingAxis::fit()
            }
            SizingAxis::Fixed(size) if !size.is_finite() || size < 0.0 => {
                invalid(
                    &mut self.reporter,
                    format!("fixed {} {} must be finite and non-negative", dimension, size),
                );
                SizingAxis::fit()
            }
            SizingAxis::Fit { min, max } | SizingAxis::Grow { min, max, .. } => {
                let mut min = min;
                let mut max = max;
                if min.is_nan() || min < 0.0 {
                    invalid(&mut self.reporter, format!("min {} {} must be non-negative", dimension, min));
                    min = 0.0;
                }
                if max.is_nan() {
                    invalid(&mut self.reporter, format!("max {} must be a number", dimension));
                    max = f32::MAX;
                } else if max < min {
                    invalid(
                        &mut self.reporter,
                        format!("max {} {} is below min {}", dimension, max, min),
                    );
                    max = min;
                }
                match sizing {
                    SizingAxis::Grow { factor, .. } => {
                        let factor = if factor.is_finite() && factor > 0.0 {
                            factor
                        } else {
                            invalid(
                                &mut self.reporter,
                                format!("grow factor {} must be positive", factor),
                            );
                            1.0
                        };
                        SizingAxis::Grow { min, max, factor }
                    }
                    _ => SizingAxis::Fit { min, max },
                }
            }
            valid => valid,
        }
    }

    fn resolve_anchor(
        &mut self,
        attach_to: &FloatingAttachTo,
        parent: NodeIndex,
        identity: &Identity<'_>,
    ) -> Option<Anchor> {
        match attach_to {
            FloatingAttachTo::Parent => Some(Anchor::Node(parent)),
            FloatingAttachTo::Root => Some(Anchor::Viewport),
            FloatingAttachTo::Element(anchor) => {
                let found = self.state.node_for(anchor.id, self.frame_number);
                if found.is_none() {
                    self.reporter.report(LayoutError::FloatingAnchorNotFound {
                        element: identity.element_id(),
                        anchor: anchor.clone(),
                    });
                }
                found.map(Anchor::Node)
            }
        }
    }

    /// Content width a text child of `parent` may take, from the parent's
    /// declared sizing. Unbounded when only layout can tell.
    fn available_text_width(&self, parent: NodeIndex) -> f32 {
        let node = self.frame.node(parent);
        let bound = match node.sizing(Axis::X) {
            SizingAxis::Percent(_) => return f32::MAX,
            sizing => sizing.max(),
        };
        if bound >= f32::MAX {
            return f32::MAX;
        }
        (bound - node.layout.padding.along(Axis::X)).max(0.0)
    }

    /// Links the identity to `index` for this frame. Returns `true` for a
    /// second element with the same id, which is reported and keeps no
    /// persistent state.
    fn record_identity(&mut self, identity: &Identity<'_>, index: NodeIndex) -> bool {
        match self.state.record_element(identity.id(), index, self.frame_number) {
            Ok(true) => {
                self.reporter.report(LayoutError::DuplicateId {
                    id: identity.element_id(),
                });
                true
            }
            Ok(false) => false,
            Err(_) => {
                log::debug!("element table full; {} is not tracked", identity.id());
                false
            }
        }
    }

    fn attach_flow_child(&mut self, parent: NodeIndex, child: NodeIndex) {
        if self.frame.child_buffer.push(child).is_err() {
            self.reporter.report(LayoutError::InternalConsistency(
                "child buffer exhausted".to_string(),
            ));
            return;
        }
        self.frame.node_mut(parent).pending_children += 1;
    }

    /// Moves the node's pending children out of the shared buffer.
    fn close_node(&mut self, index: NodeIndex) {
        let Frame {
            nodes,
            children,
            child_buffer,
            ..
        } = &mut self.frame;
        let node = &mut nodes[index.index()];
        let pending = node.pending_children as usize;
        let end = child_buffer.len();
        let start = end.saturating_sub(pending);
        let first = children.len();
        if child_buffer.copy_range_to(start..end, children).is_err() {
            self.reporter.report(LayoutError::InternalConsistency(
                "child table exhausted".to_string(),
            ));
            node.children = ChildRange::default();
        } else {
            node.children = ChildRange {
                start: first as u32,
                len: (end - start) as u32,
            };
        }
        child_buffer.truncate(start);
    }
}

fn derived_identity(frame: &Frame, parent: NodeIndex) -> Identity<'static> {
    let parent = frame.node(parent);
    Identity::Derived {
        parent: parent.id,
        sibling: parent.pending_children + parent.floating_children,
    }
}
