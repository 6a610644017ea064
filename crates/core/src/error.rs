/// Errors from grid construction, access and resampling.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("position ({x}, {y}) out of range for grid of size {width}x{height}")]
    OutOfRange {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },
}

impl GridError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}
