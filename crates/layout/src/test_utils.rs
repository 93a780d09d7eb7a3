use crate::{
    Arena, CollectingErrorHandler, ContextConfig, Dimensions, ElementDeclaration, LayoutContext,
    MonospaceMeasurer, RenderCommand, RenderData, SizingAxis, minimum_memory_size,
};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A configuration small enough that capacity limits are easy to reach.
pub fn test_config() -> ContextConfig {
    ContextConfig {
        max_element_count: 64,
        max_measure_text_cache_word_count: 256,
        max_text_bytes: 4096,
        max_scroll_container_count: 8,
        ..ContextConfig::default()
    }
}

/// A context sized exactly for `config`, measuring text at 8px per character
/// and 16px per line, with errors collected.
pub fn create_context_with(config: ContextConfig, width: f32, height: f32) -> (LayoutContext, CollectingErrorHandler) {
    init_logger();
    let collector = CollectingErrorHandler::new();
    let arena = Arena::with_capacity(minimum_memory_size(&config));
    let mut context = LayoutContext::with_config(
        config,
        arena,
        Dimensions::new(width, height),
        Box::new(collector.clone()),
    );
    context.set_text_measurer(MonospaceMeasurer::default());
    (context, collector)
}

pub fn create_test_context(width: f32, height: f32) -> (LayoutContext, CollectingErrorHandler) {
    create_context_with(test_config(), width, height)
}

pub fn fixed(width: f32, height: f32) -> ElementDeclaration {
    ElementDeclaration::new().sizing(SizingAxis::Fixed(width), SizingAxis::Fixed(height))
}

pub fn grow() -> ElementDeclaration {
    ElementDeclaration::new().sizing(SizingAxis::grow(), SizingAxis::grow())
}

/// Owned copy of a frame's commands, so the context can be queried again.
pub fn collect(commands: crate::RenderCommands<'_>) -> Vec<RenderCommand> {
    commands.to_vec()
}

pub fn rectangles(commands: &[RenderCommand]) -> Vec<&RenderCommand> {
    commands
        .iter()
        .filter(|command| matches!(command.data, RenderData::Rectangle(_)))
        .collect()
}

pub fn first_with_id(commands: &[RenderCommand], id: u32) -> Option<&RenderCommand> {
    commands.iter().find(|command| command.id == id)
}

/// Asserts clip starts and ends nest properly.
pub fn assert_clips_balanced(commands: &[RenderCommand]) {
    let mut depth = 0_i32;
    for command in commands {
        if command.is_clip_start() {
            depth += 1;
        } else if command.is_clip_end() {
            depth -= 1;
            assert!(depth >= 0, "clip end without a matching start");
        }
    }
    assert_eq!(depth, 0, "unclosed clip start");
}
