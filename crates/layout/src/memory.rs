//! Splits a context's memory block into its fixed-capacity tables.
//!
//! The same carve drives both [`minimum_memory_size`] (replayed on a measuring
//! arena) and initialization, so a block of exactly the reported size always
//! fits.

use crate::arena::{Arena, FixedMap, Pool};
use crate::config::ContextConfig;
use crate::render::CommandBuffer;
use crate::reporter::ErrorReporter;
use crate::state::PersistentState;
use crate::text::TextCache;
use crate::tree::Frame;

/// Bytes a context needs for `config`: every table plus the per-frame text
/// region.
pub fn minimum_memory_size(config: &ContextConfig) -> usize {
    let mut arena = Arena::measuring();
    carve(&mut arena, config, &mut ErrorReporter::default());
    arena.used().saturating_add(config.max_text_bytes)
}

/// Every table of a context, carved from its arena.
#[derive(Debug, Default)]
pub(crate) struct Tables {
    pub frame: Frame,
    pub text_cache: TextCache,
    pub state: PersistentState,
    pub commands: CommandBuffer,
}

/// Hands out tables from an arena. A table that does not fit gets capacity
/// zero and the shortfall is reported; later tables are still attempted.
struct Carver<'a> {
    arena: &'a mut Arena,
    reporter: &'a mut ErrorReporter,
}

impl Carver<'_> {
    fn pool<T: Copy>(&mut self, table: &str, capacity: usize) -> Pool<T> {
        self.arena.alloc_pool(capacity).unwrap_or_else(|err| {
            log::debug!("no room for {} ({} slots)", table, capacity);
            self.reporter.report_once_per_frame(err.into());
            Pool::default()
        })
    }

    fn map<V: Copy>(&mut self, table: &str, capacity: usize) -> FixedMap<V> {
        self.arena.alloc_map(capacity).unwrap_or_else(|err| {
            log::debug!("no room for {} ({} entries)", table, capacity);
            self.reporter.report_once_per_frame(err.into());
            FixedMap::default()
        })
    }
}

/// Carves every table from `arena`. Persistent tables come first so they sit
/// below the reset point with the per-frame tables. The text region is
/// checked once without being kept.
pub(crate) fn carve(arena: &mut Arena, config: &ContextConfig, reporter: &mut ErrorReporter) -> Tables {
    let elements = config.max_element_count;
    let words = config.max_measure_text_cache_word_count;
    let mut carver = Carver {
        arena: &mut *arena,
        reporter: &mut *reporter,
    };

    // Ids from the previous frame are kept alongside the current ones.
    let state = PersistentState::new(
        carver.map("element records", elements.saturating_mul(2)),
        carver.pool("scroll states", config.max_scroll_container_count),
        carver.pool("pointer over", elements),
    );
    let text_cache = TextCache::new(
        carver.map("measure cache", words),
        carver.pool("measured words", words),
        carver.pool("free words", words),
    );
    let frame = Frame {
        nodes: carver.pool("nodes", elements),
        children: carver.pool("children", elements),
        child_buffer: carver.pool("child buffer", elements),
        open_stack: carver.pool("open stack", elements),
        texts: carver.pool("texts", elements),
        lines: carver.pool("lines", words),
        roots: carver.pool("roots", elements),
        queue: carver.pool("queue", elements),
        eligible: carver.pool("eligible", elements),
        stack: carver.pool("stack", elements.saturating_mul(2)),
        paint_order: carver.pool("paint order", elements),
    };
    let commands = CommandBuffer::new(carver.pool("render commands", config.render_command_capacity()));

    arena.mark_reset_point();
    if let Err(err) = arena.allocate(config.max_text_bytes, 1) {
        reporter.report_once_per_frame(err.into());
    }
    arena.reset();

    log::debug!(
        "arena carved: {} of {} bytes in tables, {} elements, {} commands",
        arena.used(),
        arena.capacity(),
        frame.nodes.capacity(),
        commands.capacity()
    );

    Tables {
        frame,
        text_cache,
        state,
        commands,
    }
}
