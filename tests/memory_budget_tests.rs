//! The caller's block is the only memory a context uses: once the arena
//! exists, initialization and whole frames run without touching the heap.
//! The heap profiler is process-wide, so this file holds a single test.
// Profiling keeps per-pass timings in a heap-allocated table.
#![cfg(not(feature = "profiling"))]

mod common;

use common::{TestResult, small_config};
use trellis::{
    Arena, AttachPoint, AttachPoints, ClipConfig, CollectingErrorHandler, Color, Dimensions,
    ElementDeclaration, ElementId, ErrorHandler, FloatingConfig, LayoutContext, LayoutDirection,
    MonospaceMeasurer, Padding, SizingAxis, TextConfig, Vector2, minimum_memory_size,
};

#[global_allocator]
static ALLOCATOR: dhat::Alloc = dhat::Alloc;

/// Heap blocks allocated while `run` executes.
fn allocations_during(run: impl FnOnce()) -> u64 {
    let before = dhat::HeapStats::get().total_blocks;
    run();
    dhat::HeapStats::get().total_blocks - before
}

/// Ids and declarations for a frame, built up front so only the engine runs
/// inside the counted section.
struct Page {
    list: ElementId,
    rows: Vec<ElementId>,
    tooltip: ElementId,
    root: ElementDeclaration,
    list_declaration: ElementDeclaration,
    row: ElementDeclaration,
    tooltip_declaration: ElementDeclaration,
    body: TextConfig,
}

impl Page {
    fn new() -> Self {
        let list = ElementId::new("list");
        Self {
            rows: (0..12).map(|index| ElementId::indexed("row", index)).collect(),
            tooltip: ElementId::new("tooltip"),
            root: ElementDeclaration::new()
                .sizing(SizingAxis::grow(), SizingAxis::grow())
                .direction(LayoutDirection::Column)
                .padding(Padding::all(8))
                .child_gap(4),
            list_declaration: ElementDeclaration::new()
                .sizing(SizingAxis::Fixed(160.0), SizingAxis::Fixed(120.0))
                .direction(LayoutDirection::Column)
                .clip(ClipConfig::vertical()),
            row: ElementDeclaration::new()
                .width(SizingAxis::grow())
                .padding(Padding::xy(4, 2))
                .background(Color::gray(200)),
            tooltip_declaration: ElementDeclaration::new()
                .sizing(SizingAxis::fit(), SizingAxis::fit())
                .floating(FloatingConfig {
                    z_index: 2,
                    attach_points: AttachPoints {
                        element: AttachPoint::LeftTop,
                        parent: AttachPoint::RightTop,
                    },
                    ..FloatingConfig::attached_to(list.clone())
                }),
            list,
            body: TextConfig::default(),
        }
    }

    fn declare(&self, context: &mut LayoutContext) -> usize {
        context.begin_layout();
        context.open_anonymous(&self.root);
        context.open_text_element("a heading that wraps across lines", &self.body);
        context.open_element(&self.list, &self.list_declaration);
        for row in &self.rows {
            context.open_element(row, &self.row);
            context.open_text_element("the quick brown fox jumps", &self.body);
            context.close_element();
        }
        context.close_element();
        context.open_element(&self.tooltip, &self.tooltip_declaration);
        context.open_text_element("tip", &self.body);
        context.close_element();
        context.close_element();
        context.end_layout().len()
    }
}

#[test]
fn test_context_runs_inside_the_supplied_block() -> TestResult {
    let _profiler = dhat::Profiler::builder().testing().build();
    let config = small_config();
    let arena = Arena::with_capacity(minimum_memory_size(&config));
    let errors = CollectingErrorHandler::new();
    let handler: Box<dyn ErrorHandler> = Box::new(errors.clone());
    let dimensions = Dimensions::new(400.0, 300.0);

    let mut created = None;
    let allocations = allocations_during(|| {
        created = Some(LayoutContext::with_config(config, arena, dimensions, handler));
    });
    dhat::assert_eq!(allocations, 0);
    let mut context = created.ok_or("context was not created")?;

    context.set_text_measurer(MonospaceMeasurer::default());
    let page = Page::new();
    let mut commands = Vec::with_capacity(4);
    let mut hovered = false;
    let mut scrolled = false;
    let allocations = allocations_during(|| {
        commands.push(page.declare(&mut context));
        scrolled = context.set_scroll_offset(&page.list, Vector2::new(0.0, 40.0));
        context.set_pointer_state(Vector2::new(20.0, 60.0), false);
        commands.push(page.declare(&mut context));
        hovered = context.pointer_over(&page.list);
        commands.push(page.declare(&mut context));
    });

    dhat::assert_eq!(allocations, 0);
    assert!(errors.is_empty(), "unexpected errors: {:?}", errors.errors());
    assert!(scrolled);
    assert!(hovered);
    assert!(commands.iter().all(|count| *count > 0));
    assert_eq!(commands[1], commands[2]);
    Ok(())
}
