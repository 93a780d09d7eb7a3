pub mod error;
pub mod measure;

pub use error::{CollectingErrorHandler, ErrorHandler, ErrorKind, LayoutError, LoggingErrorHandler};
pub use measure::{MonospaceMeasurer, TextMeasurer};
