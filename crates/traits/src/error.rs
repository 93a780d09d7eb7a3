//! Structured layout errors and the callback that receives them.
//!
//! The engine never unwinds out of a frame. Every violation is turned into a
//! [`LayoutError`], handed to the context's [`ErrorHandler`] exactly once, and
//! the frame continues with a local fallback.

use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;
use trellis_types::ElementId;

/// A configuration, structural or capacity violation detected during a frame.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    #[error(
        "Arena capacity exceeded: requested {requested} bytes but only {remaining} of {capacity} remain"
    )]
    ArenaCapacityExceeded {
        requested: usize,
        remaining: usize,
        capacity: usize,
    },

    #[error("Element capacity of {capacity} exceeded; further elements are dropped this frame")]
    ElementCapacityExceeded { capacity: usize },

    #[error("Text measurement cache capacity of {capacity} words exceeded")]
    TextMeasurementCapacityExceeded { capacity: usize },

    #[error("Render command capacity of {capacity} exceeded; remaining commands are dropped")]
    RenderCommandCapacityExceeded { capacity: usize },

    #[error("Scroll container capacity of {capacity} exceeded; offsets are not remembered")]
    ScrollContainerCapacityExceeded { capacity: usize },

    #[error("A text element was declared but no text measurer has been provided")]
    TextMeasurementFunctionNotProvided,

    #[error("Duplicate element id '{id}': the first occurrence keeps its persistent state")]
    DuplicateId { id: ElementId },

    #[error("Unbalanced open/close: {message}")]
    UnbalancedOpenClose { message: String },

    #[error("Floating element '{element}' is attached to '{anchor}', which was not found this frame")]
    FloatingAnchorNotFound { element: ElementId, anchor: ElementId },

    #[error("Element '{element}' uses percentage sizing {value}, outside the range 0.0..=1.0")]
    PercentageOutOfRange { element: ElementId, value: f32 },

    #[error("Element '{element}' has invalid sizing: {message}")]
    InvalidSizing { element: ElementId, message: String },

    #[error("Internal consistency violation: {0}")]
    InternalConsistency(String),
}

/// Fieldless discriminant of [`LayoutError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ArenaCapacityExceeded,
    ElementCapacityExceeded,
    TextMeasurementCapacityExceeded,
    RenderCommandCapacityExceeded,
    ScrollContainerCapacityExceeded,
    TextMeasurementFunctionNotProvided,
    DuplicateId,
    UnbalancedOpenClose,
    FloatingAnchorNotFound,
    PercentageOutOfRange,
    InvalidSizing,
    InternalConsistency,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ArenaCapacityExceeded => "arena-capacity-exceeded",
            ErrorKind::ElementCapacityExceeded => "element-capacity-exceeded",
            ErrorKind::TextMeasurementCapacityExceeded => "text-measurement-capacity-exceeded",
            ErrorKind::RenderCommandCapacityExceeded => "render-command-capacity-exceeded",
            ErrorKind::ScrollContainerCapacityExceeded => "scroll-container-capacity-exceeded",
            ErrorKind::TextMeasurementFunctionNotProvided => "text-measurement-function-not-provided",
            ErrorKind::DuplicateId => "duplicate-element-id",
            ErrorKind::UnbalancedOpenClose => "unbalanced-open-close",
            ErrorKind::FloatingAnchorNotFound => "floating-anchor-not-found",
            ErrorKind::PercentageOutOfRange => "percentage-sizing-out-of-range",
            ErrorKind::InvalidSizing => "invalid-sizing",
            ErrorKind::InternalConsistency => "internal-consistency-violation",
        }
    }

    /// Capacity errors describe the context's budget rather than a single
    /// declaration.
    pub fn is_capacity(&self) -> bool {
        matches!(
            self,
            ErrorKind::ArenaCapacityExceeded
                | ErrorKind::ElementCapacityExceeded
                | ErrorKind::TextMeasurementCapacityExceeded
                | ErrorKind::RenderCommandCapacityExceeded
                | ErrorKind::ScrollContainerCapacityExceeded
        )
    }
}

impl LayoutError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LayoutError::ArenaCapacityExceeded { .. } => ErrorKind::ArenaCapacityExceeded,
            LayoutError::ElementCapacityExceeded { .. } => ErrorKind::ElementCapacityExceeded,
            LayoutError::TextMeasurementCapacityExceeded { .. } => {
                ErrorKind::TextMeasurementCapacityExceeded
            }
            LayoutError::RenderCommandCapacityExceeded { .. } => {
                ErrorKind::RenderCommandCapacityExceeded
            }
            LayoutError::ScrollContainerCapacityExceeded { .. } => {
                ErrorKind::ScrollContainerCapacityExceeded
            }
            LayoutError::TextMeasurementFunctionNotProvided => {
                ErrorKind::TextMeasurementFunctionNotProvided
            }
            LayoutError::DuplicateId { .. } => ErrorKind::DuplicateId,
            LayoutError::UnbalancedOpenClose { .. } => ErrorKind::UnbalancedOpenClose,
            LayoutError::FloatingAnchorNotFound { .. } => ErrorKind::FloatingAnchorNotFound,
            LayoutError::PercentageOutOfRange { .. } => ErrorKind::PercentageOutOfRange,
            LayoutError::InvalidSizing { .. } => ErrorKind::InvalidSizing,
            LayoutError::InternalConsistency(_) => ErrorKind::InternalConsistency,
        }
    }

    /// The element the error is about, when it concerns a single element.
    pub fn element(&self) -> Option<&ElementId> {
        match self {
            LayoutError::DuplicateId { id } => Some(id),
            LayoutError::FloatingAnchorNotFound { element, .. }
            | LayoutError::PercentageOutOfRange { element, .. }
            | LayoutError::InvalidSizing { element, .. } => Some(element),
            _ => None,
        }
    }
}

/// Receives every error reported by a layout context, synchronously.
///
/// Implementations must not call back into the context that reported the
/// error.
pub trait ErrorHandler {
    fn handle(&mut self, error: &LayoutError);
}

impl<F> ErrorHandler for F
where
    F: FnMut(&LayoutError),
{
    fn handle(&mut self, error: &LayoutError) {
        self(error)
    }
}

/// Forwards errors to the `log` facade at `error` level. This is the handler
/// a context uses when none is supplied.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingErrorHandler;

impl ErrorHandler for LoggingErrorHandler {
    fn handle(&mut self, error: &LayoutError) {
        log::error!("[{}] {}", error.kind().as_str(), error);
    }
}

/// Records every error into a shared list. Clones observe the same list, so a
/// test can keep one handle while the context owns the other.
#[derive(Debug, Default, Clone)]
pub struct CollectingErrorHandler {
    errors: Rc<RefCell<Vec<LayoutError>>>,
}

impl CollectingErrorHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far.
    pub fn errors(&self) -> Vec<LayoutError> {
        self.errors.borrow().clone()
    }

    pub fn kinds(&self) -> Vec<ErrorKind> {
        self.errors.borrow().iter().map(LayoutError::kind).collect()
    }

    pub fn count(&self, kind: ErrorKind) -> usize {
        self.errors.borrow().iter().filter(|e| e.kind() == kind).count()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.errors.borrow_mut().clear();
    }
}

impl ErrorHandler for CollectingErrorHandler {
    fn handle(&mut self, error: &LayoutError) {
        self.errors.borrow_mut().push(error.clone());
    }
}
