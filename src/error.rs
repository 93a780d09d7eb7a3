use thiserror::Error;

/// Failure of the document front end. The layout engine itself never fails;
/// its errors are collected into the report instead.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid layout document: {0}")]
    Document(#[from] DocumentError),
}

/// A layout document that parsed but cannot be laid out.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocumentError {
    #[error("viewport must be finite and positive, got {width}x{height}")]
    InvalidViewport { width: f32, height: f32 },

    #[error("frames must be at least 1")]
    NoFrames,

    #[error("measurer ratios must be finite and positive, got {char_width_ratio} and {line_height_ratio}")]
    InvalidMeasurer {
        char_width_ratio: f32,
        line_height_ratio: f32,
    },
}
