use trellis_traits::{ErrorHandler, ErrorKind, LayoutError, LoggingErrorHandler};

const KIND_COUNT: usize = ErrorKind::InternalConsistency as usize + 1;

/// Delivers errors to the context's handler.
///
/// Every reported error is logged at `warn` and passed to the handler exactly
/// once. Budget errors that would otherwise repeat for every element after
/// the first overflow are limited to one report per frame.
pub struct ErrorReporter {
    handler: Box<dyn ErrorHandler>,
    reported_this_frame: [bool; KIND_COUNT],
    total: usize,
}

impl std::fmt::Debug for ErrorReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorReporter")
            .field("total", &self.total)
            .finish_non_exhaustive()
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new(Box::new(LoggingErrorHandler))
    }
}

impl ErrorReporter {
    pub fn new(handler: Box<dyn ErrorHandler>) -> Self {
        Self {
            handler,
            reported_this_frame: [false; KIND_COUNT],
            total: 0,
        }
    }

    pub fn set_handler(&mut self, handler: Box<dyn ErrorHandler>) {
        self.handler = handler;
    }

    pub fn report(&mut self, error: LayoutError) {
        log::warn!("layout error [{}]: {}", error.kind().as_str(), error);
        self.reported_this_frame[error.kind() as usize] = true;
        self.total += 1;
        self.handler.handle(&error);
    }

    /// Reports `error` unless an error of the same kind was already reported
    /// this frame.
    pub fn report_once_per_frame(&mut self, error: LayoutError) {
        if !self.reported_this_frame[error.kind() as usize] {
            self.report(error);
        }
    }

    pub fn begin_frame(&mut self) {
        self.reported_this_frame = [false; KIND_COUNT];
    }

    /// Errors reported over the lifetime of the context.
    #[cfg(test)]
    pub fn total(&self) -> usize {
        self.total
    }
}
