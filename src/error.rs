//! Central error handling for drape3d.
//!
//! Provides a unified DrapeError enum with consistent categorization;
//! everything propagates to main, which prints and exits nonzero.

/// Centralized error type for all pipeline operations
#[derive(thiserror::Error, Debug)]
pub enum DrapeError {
    #[error("Raster error: {0}")]
    Raster(String),

    #[error("Alignment error: {0}")]
    Align(String),

    #[error("Geometry error: {0}")]
    Geometry(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Readback error: {0}")]
    Readback(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("CLI error: {0}")]
    Cli(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DrapeError {
    /// Convenience constructors for common error categories
    pub fn raster<T: ToString>(msg: T) -> Self {
        DrapeError::Raster(msg.to_string())
    }

    pub fn align<T: ToString>(msg: T) -> Self {
        DrapeError::Align(msg.to_string())
    }

    pub fn geometry<T: ToString>(msg: T) -> Self {
        DrapeError::Geometry(msg.to_string())
    }

    pub fn render<T: ToString>(msg: T) -> Self {
        DrapeError::Render(msg.to_string())
    }

    pub fn readback<T: ToString>(msg: T) -> Self {
        DrapeError::Readback(msg.to_string())
    }

    pub fn export<T: ToString>(msg: T) -> Self {
        DrapeError::Export(msg.to_string())
    }

    pub fn cli<T: ToString>(msg: T) -> Self {
        DrapeError::Cli(msg.to_string())
    }
}

/// Result type alias for pipeline operations
pub type DrapeResult<T> = Result<T, DrapeError>;
