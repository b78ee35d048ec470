//! Error types for codec and echo canceller operations.

use thiserror::Error;

/// Native engine that produced a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    Opus,
    Speex,
    Echo,
}

impl std::fmt::Display for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Opus => write!(f, "opus"),
            Self::Speex => write!(f, "speex"),
            Self::Echo => write!(f, "speexdsp echo"),
        }
    }
}

/// Result codes originated by the binding itself.
///
/// Codes in `-1..=-7` share their meaning with libopus so that
/// [`crate::report::error_string`] can describe them.
pub mod code {
    pub const OK: i32 = 0;
    pub const BAD_ARG: i32 = -1;
    pub const BUFFER_TOO_SMALL: i32 = -2;
    pub const INVALID_STATE: i32 = -6;
    pub const ALLOC_FAIL: i32 = -7;
    pub const FRAME_SIZE_MISMATCH: i32 = -100;
    /// Reported as the native status when an engine returns no state.
    pub const CREATE_FAILED: i32 = -101;
}

/// Errors returned by the binding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A caller buffer could not be pinned.
    #[error("vocodec: buffer could not be pinned")]
    AllocationFailure,

    /// Missing or incompatible arguments, detected before any native call.
    #[error("vocodec: bad argument: {0}")]
    BadArgument(&'static str),

    /// The coded packet does not fit the caller's output capacity.
    #[error("vocodec: output buffer too small")]
    BufferTooSmall,

    /// Speech input length disagrees with the mode's fixed frame size.
    #[error("vocodec: frame size mismatch: expected {expected}, got {actual}")]
    FrameSizeMismatch { expected: usize, actual: usize },

    /// A registry handle that is stale, destroyed or was never issued.
    #[error("vocodec: invalid handle")]
    InvalidHandle,

    /// Status code passed through verbatim from a native engine.
    #[error("{engine}: native error {code}")]
    Native { engine: Engine, code: i32 },
}

impl Error {
    /// Returns the signed result code for this error. Always negative.
    pub fn code(&self) -> i32 {
        match self {
            Self::AllocationFailure => code::ALLOC_FAIL,
            Self::BadArgument(_) => code::BAD_ARG,
            Self::BufferTooSmall => code::BUFFER_TOO_SMALL,
            Self::FrameSizeMismatch { .. } => code::FRAME_SIZE_MISMATCH,
            Self::InvalidHandle => code::INVALID_STATE,
            Self::Native { code, .. } => *code,
        }
    }

    pub(crate) fn opus(code: i32) -> Self {
        Self::Native { engine: Engine::Opus, code }
    }

    pub(crate) fn speex(code: i32) -> Self {
        Self::Native { engine: Engine::Speex, code }
    }

    pub(crate) fn echo(code: i32) -> Self {
        Self::Native { engine: Engine::Echo, code }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Folds a count-or-error result into the signed result-code convention:
/// non-negative values carry a count, negative values an error kind.
pub fn to_code(result: Result<usize>) -> i32 {
    match result {
        Ok(n) => i32::try_from(n).unwrap_or(i32::MAX),
        Err(e) => e.code(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_negative() {
        let errs = [
            Error::AllocationFailure,
            Error::BadArgument("x"),
            Error::BufferTooSmall,
            Error::FrameSizeMismatch { expected: 160, actual: 320 },
            Error::InvalidHandle,
            Error::opus(-4),
        ];
        for e in errs {
            assert!(e.code() < 0, "{e} should map to a negative code");
        }
    }

    #[test]
    fn test_native_code_is_verbatim() {
        assert_eq!(Error::opus(-4).code(), -4);
        assert_eq!(Error::speex(-2).code(), -2);
    }

    #[test]
    fn test_to_code() {
        assert_eq!(to_code(Ok(160)), 160);
        assert_eq!(to_code(Err(Error::AllocationFailure)), code::ALLOC_FAIL);
        assert_eq!(
            to_code(Err(Error::FrameSizeMismatch { expected: 1, actual: 2 })),
            code::FRAME_SIZE_MISMATCH
        );
    }

    #[test]
    fn test_error_display() {
        let err = Error::FrameSizeMismatch { expected: 160, actual: 100 };
        assert!(err.to_string().contains("expected 160, got 100"));
        assert!(Error::opus(-3).to_string().starts_with("opus:"));
    }
}
