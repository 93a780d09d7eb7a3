#![allow(dead_code)]

pub mod fixtures;

use trellis::{
    Arena, BoundingBox, CollectingErrorHandler, ContextConfig, Dimensions, ElementDeclaration,
    ElementId, LayoutContext, MonospaceMeasurer, RenderCommand, SizingAxis, minimum_memory_size,
};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Small enough that capacity limits are reachable from a test.
pub fn small_config() -> ContextConfig {
    ContextConfig {
        max_element_count: 128,
        max_measure_text_cache_word_count: 512,
        max_text_bytes: 8192,
        max_scroll_container_count: 8,
        ..ContextConfig::default()
    }
}

/// A context over exactly `memory` bytes, measuring 8px per character and
/// 16px per line at the default font size.
pub fn context_with_memory(
    config: ContextConfig,
    memory: usize,
    width: f32,
    height: f32,
) -> (LayoutContext, CollectingErrorHandler) {
    init_logger();
    let errors = CollectingErrorHandler::new();
    let mut context = LayoutContext::with_config(
        config,
        Arena::with_capacity(memory),
        Dimensions::new(width, height),
        Box::new(errors.clone()),
    );
    context.set_text_measurer(MonospaceMeasurer::default());
    (context, errors)
}

pub fn context_with(config: ContextConfig, width: f32, height: f32) -> (LayoutContext, CollectingErrorHandler) {
    context_with_memory(config, minimum_memory_size(&config), width, height)
}

pub fn context(width: f32, height: f32) -> (LayoutContext, CollectingErrorHandler) {
    context_with(small_config(), width, height)
}

pub fn fixed(width: f32, height: f32) -> ElementDeclaration {
    ElementDeclaration::new().sizing(SizingAxis::Fixed(width), SizingAxis::Fixed(height))
}

pub fn bounds(context: &LayoutContext, id: &ElementId) -> Result<BoundingBox, String> {
    context
        .element_bounds(id)
        .ok_or_else(|| format!("no bounds recorded for '{}'", id))
}

/// Checks that clip starts and ends nest, returning the deepest nesting.
pub fn clip_depth(commands: &[RenderCommand]) -> Result<usize, String> {
    let mut depth = 0_usize;
    let mut deepest = 0;
    for (index, command) in commands.iter().enumerate() {
        if command.is_clip_start() {
            depth += 1;
            deepest = deepest.max(depth);
        } else if command.is_clip_end() {
            depth = depth
                .checked_sub(1)
                .ok_or_else(|| format!("clip end at {} has no matching start", index))?;
        }
    }
    if depth != 0 {
        return Err(format!("{} clip start(s) left open", depth));
    }
    Ok(deepest)
}
