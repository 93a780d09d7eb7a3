use serde::Deserialize;

/// Capacities and switches fixed for the lifetime of a [`LayoutContext`].
///
/// Every capacity is charged against the context's arena at initialization;
/// [`minimum_memory_size`] reports the total for a given configuration.
///
/// [`LayoutContext`]: crate::LayoutContext
/// [`minimum_memory_size`]: crate::minimum_memory_size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContextConfig {
    /// The maximum number of elements (containers and text runs) in one frame,
    /// including the implicit root.
    ///
    /// Elements opened past this limit are dropped for the rest of the frame
    /// and an `ElementCapacityExceeded` error is reported once.
    ///
    /// Defaults to `8192`.
    pub max_element_count: usize,

    /// The number of measured words kept in the persistent text measurement
    /// cache. Also bounds the number of wrapped lines per frame.
    ///
    /// Defaults to `16384`.
    pub max_measure_text_cache_word_count: usize,

    /// Bytes available each frame for text content and element names.
    ///
    /// Defaults to `262144`.
    pub max_text_bytes: usize,

    /// The number of scroll containers whose offsets are remembered.
    ///
    /// Defaults to `256`.
    pub max_scroll_container_count: usize,

    /// Upper bound on emitted commands. `None` means four per element.
    pub max_render_command_count: Option<usize>,

    /// Skip commands for elements entirely outside the visible area.
    ///
    /// Defaults to `true`.
    pub culling_enabled: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_element_count: 8192,
            max_measure_text_cache_word_count: 16384,
            max_text_bytes: 256 * 1024,
            max_scroll_container_count: 256,
            max_render_command_count: None,
            culling_enabled: true,
        }
    }
}

impl ContextConfig {
    pub fn render_command_capacity(&self) -> usize {
        self.max_render_command_count
            .unwrap_or_else(|| self.max_element_count.saturating_mul(4))
    }
}
