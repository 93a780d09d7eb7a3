use crate::arena::Arena;
use crate::config::ContextConfig;
use crate::distribute::distribute_axis;
use crate::measure::measure_axis;
use crate::memory::{self, Tables};
use crate::perf::{
    PASS_DISTRIBUTE, PASS_EMIT, PASS_FRAME, PASS_MEASURE, PASS_POSITION, PASS_WRAP, PassTimer,
    Profiler, default_profiler,
};
use crate::position::{Placement, position};
use crate::render::{CommandBuffer, Emission, RenderCommands, emit};
use crate::reporter::ErrorReporter;
use crate::state::{PersistentState, PointerState, ScrollContainerData};
use crate::text::TextCache;
use crate::tree::Frame;
use serde::Serialize;
use trellis_traits::{ErrorHandler, LayoutError, TextMeasurer};
use trellis_types::ids::{DEFAULT_SEED, ROOT_CONTAINER_NAME, hash_text};
use trellis_types::{Axis, BoundingBox, Dimensions, ElementId, Vector2};

/// Counters for the most recent `end_layout`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameStats {
    pub element_count: usize,
    pub text_element_count: usize,
    pub render_command_count: usize,
    pub text_bytes_used: usize,
    /// Containers whose children still overflow after shrinking to their
    /// minimum sizes.
    pub overflowing_containers: usize,
    pub measure_cache_entries: usize,
}

/// Builder bookkeeping for the frame being declared.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct BuildState {
    /// Depth of open elements that were refused for lack of capacity.
    pub dropped_depth: u32,
    /// Set once the declaration sequence became unbalanced.
    pub aborted: bool,
    pub in_frame: bool,
}

/// One independent layout engine instance.
///
/// A context owns its memory block, the per-frame element tree, the text
/// measurement cache and the state remembered between frames. Each frame is
/// declared between [`begin_layout`](Self::begin_layout) and
/// [`end_layout`](Self::end_layout); the returned commands borrow the context
/// until the next frame begins.
pub struct LayoutContext {
    pub(crate) config: ContextConfig,
    pub(crate) arena: Arena,
    pub(crate) frame: Frame,
    pub(crate) text_cache: TextCache,
    pub(crate) state: PersistentState,
    pub(crate) commands: CommandBuffer,
    pub(crate) reporter: ErrorReporter,
    pub(crate) measurer: Option<Box<dyn TextMeasurer>>,
    pub(crate) profiler: Box<dyn Profiler>,
    pub(crate) layout_dimensions: Dimensions,
    pub(crate) culling_enabled: bool,
    pub(crate) frame_number: u32,
    pub(crate) root_id: u32,
    pub(crate) build: BuildState,
    pub(crate) stats: FrameStats,
}

impl std::fmt::Debug for LayoutContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutContext")
            .field("config", &self.config)
            .field("layout_dimensions", &self.layout_dimensions)
            .field("frame_number", &self.frame_number)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl LayoutContext {
    /// Creates a context with the default configuration over `arena`.
    pub fn initialize(arena: Arena, dimensions: Dimensions, handler: Box<dyn ErrorHandler>) -> Self {
        Self::with_config(ContextConfig::default(), arena, dimensions, handler)
    }

    /// Creates a context over `arena`. Tables that do not fit are reported
    /// through `handler` and left with no capacity.
    pub fn with_config(
        config: ContextConfig,
        mut arena: Arena,
        dimensions: Dimensions,
        handler: Box<dyn ErrorHandler>,
    ) -> Self {
        let mut reporter = ErrorReporter::new(handler);
        let Tables {
            frame,
            text_cache,
            state,
            commands,
        } = memory::carve(&mut arena, &config, &mut reporter);

        Self {
            culling_enabled: config.culling_enabled,
            config,
            arena,
            frame,
            text_cache,
            state,
            commands,
            reporter,
            measurer: None,
            profiler: default_profiler(),
            layout_dimensions: dimensions,
            frame_number: 0,
            root_id: hash_text(ROOT_CONTAINER_NAME, DEFAULT_SEED),
            build: BuildState::default(),
            stats: FrameStats::default(),
        }
    }

    /// Memory needed by a context with the default configuration.
    pub fn minimum_memory_size() -> usize {
        memory::minimum_memory_size(&ContextConfig::default())
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn set_text_measurer(&mut self, measurer: impl TextMeasurer + 'static) {
        self.measurer = Some(Box::new(measurer));
    }

    pub fn set_error_handler(&mut self, handler: Box<dyn ErrorHandler>) {
        self.reporter.set_handler(handler);
    }

    pub fn set_profiler(&mut self, profiler: Box<dyn Profiler>) {
        self.profiler = profiler;
    }

    pub fn profiler(&self) -> &dyn Profiler {
        self.profiler.as_ref()
    }

    pub fn layout_dimensions(&self) -> Dimensions {
        self.layout_dimensions
    }

    /// Takes effect at the next `begin_layout`.
    pub fn set_layout_dimensions(&mut self, dimensions: Dimensions) {
        self.layout_dimensions = dimensions;
    }

    pub fn set_culling_enabled(&mut self, enabled: bool) {
        self.culling_enabled = enabled;
    }

    /// Starts a new frame: reclaims the previous frame's tree and strings and
    /// opens the root container at the layout dimensions.
    pub fn begin_layout(&mut self) {
        if self.build.in_frame {
            self.reporter.report(LayoutError::UnbalancedOpenClose {
                message: "begin_layout called again before end_layout".to_string(),
            });
        }
        self.frame_number = self.frame_number.wrapping_add(1);
        self.reporter.begin_frame();
        self.arena.reset();
        self.frame.clear();
        self.commands.clear();
        self.state.begin_frame(self.frame_number);
        self.text_cache.evict_stale(self.frame_number);
        self.stats = FrameStats::default();
        self.build = BuildState {
            in_frame: true,
            ..BuildState::default()
        };
        self.open_root();
    }

    /// Finishes the frame, runs every pass and returns the render commands.
    ///
    /// An unbalanced declaration sequence is reported and produces no
    /// commands.
    pub fn end_layout(&mut self) -> RenderCommands<'_> {
        if !self.build.in_frame {
            self.reporter.report(LayoutError::UnbalancedOpenClose {
                message: "end_layout called without begin_layout".to_string(),
            });
            self.commands.clear();
            return RenderCommands::new(self.commands.as_slice(), &self.arena);
        }
        self.build.in_frame = false;

        let open = self.frame.open_stack.len();
        let balanced = !self.build.aborted && self.build.dropped_depth == 0 && open == 1;
        if !balanced {
            // A refused root was already reported as a capacity error.
            if !self.build.aborted && !self.frame.nodes.is_empty() {
                let unclosed = open + self.build.dropped_depth as usize - 1;
                self.reporter.report(LayoutError::UnbalancedOpenClose {
                    message: format!("{} element(s) still open at end_layout", unclosed),
                });
            }
            self.commands.clear();
            return RenderCommands::new(self.commands.as_slice(), &self.arena);
        }
        self.close_element_at_root();

        let frame_timer = PassTimer::start();
        self.run_passes();
        self.profiler.record(PASS_FRAME, frame_timer.elapsed());
        self.profiler.count_frame();

        log::debug!(
            "frame {}: {} elements ({} text), {} commands, {} text bytes, {} overflowing",
            self.frame_number,
            self.stats.element_count,
            self.stats.text_element_count,
            self.stats.render_command_count,
            self.stats.text_bytes_used,
            self.stats.overflowing_containers
        );
        RenderCommands::new(self.commands.as_slice(), &self.arena)
    }

    fn run_passes(&mut self) {
        let timer = PassTimer::start();
        measure_axis(&mut self.frame, Axis::X);
        self.profiler.record(PASS_MEASURE, timer.elapsed());

        let timer = PassTimer::start();
        let mut overflowing = distribute_axis(&mut self.frame, Axis::X);
        self.profiler.record(PASS_DISTRIBUTE, timer.elapsed());

        let timer = PassTimer::start();
        self.text_cache.wrap(&mut self.frame, &mut self.reporter);
        self.profiler.record(PASS_WRAP, timer.elapsed());

        let timer = PassTimer::start();
        measure_axis(&mut self.frame, Axis::Y);
        self.profiler.record(PASS_MEASURE, timer.elapsed());

        let timer = PassTimer::start();
        overflowing += distribute_axis(&mut self.frame, Axis::Y);
        self.profiler.record(PASS_DISTRIBUTE, timer.elapsed());

        let timer = PassTimer::start();
        let viewport = BoundingBox::from_parts(Vector2::zero(), self.layout_dimensions);
        let mut placement = Placement {
            state: &mut self.state,
            reporter: &mut self.reporter,
            arena: &self.arena,
            frame_number: self.frame_number,
            viewport,
        };
        position(&mut self.frame, &mut placement);
        self.profiler.record(PASS_POSITION, timer.elapsed());

        let timer = PassTimer::start();
        let mut emission = Emission {
            reporter: &mut self.reporter,
            culling: self.culling_enabled,
        };
        emit(&mut self.frame, &mut self.commands, &mut emission);
        self.profiler.record(PASS_EMIT, timer.elapsed());

        self.stats = FrameStats {
            element_count: self.frame.nodes.len(),
            text_element_count: self.frame.texts.len(),
            render_command_count: self.commands.len(),
            text_bytes_used: self.arena.frame_bytes(),
            overflowing_containers: overflowing,
            measure_cache_entries: self.text_cache.len(),
        };
    }

    pub fn frame_stats(&self) -> FrameStats {
        self.stats
    }

    /// Frames begun since the context was created.
    pub fn frame_number(&self) -> u32 {
        self.frame_number
    }

    /// Hit-tests the last completed frame at `position` and advances the
    /// pointer phase. Call between frames.
    pub fn set_pointer_state(&mut self, position: Vector2, is_down: bool) {
        self.state.set_pointer_state(&mut self.frame, position, is_down);
    }

    pub fn pointer_state(&self) -> PointerState {
        self.state.pointer
    }

    /// Applies wheel, drag and momentum scrolling. `scroll_delta` is the
    /// wheel movement since the last call, positive to reveal content above
    /// or to the left.
    pub fn update_scroll_containers(&mut self, drag_enabled: bool, scroll_delta: Vector2, elapsed_seconds: f32) {
        self.state
            .update_scroll_containers(self.frame_number, drag_enabled, scroll_delta, elapsed_seconds);
    }

    /// Whether `id` was under the pointer at the last `set_pointer_state`.
    pub fn pointer_over(&self, id: &ElementId) -> bool {
        self.state.is_pointer_over(id.id)
    }

    /// Ids under the pointer, outermost first.
    pub fn pointer_over_ids(&self) -> &[u32] {
        self.state.pointer_over.as_slice()
    }

    /// While declaring: whether the innermost open element is under the
    /// pointer.
    pub fn hovered(&self) -> bool {
        self.frame
            .open_parent()
            .is_some_and(|open| self.state.is_pointer_over(self.frame.node(open).id))
    }

    /// Final box of `id` from the latest layout that included it.
    pub fn element_bounds(&self, id: &ElementId) -> Option<BoundingBox> {
        self.state.element_bounds(id.id, self.frame_number)
    }

    pub fn scroll_container_data(&self, id: &ElementId) -> Option<ScrollContainerData> {
        self.state.scroll_container_data(id.id, self.frame_number)
    }

    /// Moves a scroll container. Returns `false` when `id` has no scroll
    /// state.
    pub fn set_scroll_offset(&mut self, id: &ElementId, offset: Vector2) -> bool {
        self.state.set_scroll_offset(id.id, offset)
    }
}
