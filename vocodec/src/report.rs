//! Error descriptions and library version strings.

use crate::error::code;
use crate::opus;
use crate::speex;

/// Describes a result code.
///
/// Codes the binding originates outside the libopus range are described
/// here; everything else goes through `opus_strerror`, which covers both the
/// libopus statuses and the binding codes that share their values.
pub fn error_string(status: i32) -> String {
    match status {
        code::FRAME_SIZE_MISMATCH => "frame size mismatch".to_string(),
        code::CREATE_FAILED => "codec state could not be created".to_string(),
        _ => opus::ffi::error_string(status),
    }
}

/// Returns the libopus version string, e.g. `libopus 1.4`.
pub fn opus_version() -> String {
    opus::ffi::version_string()
}

/// Returns the libspeex version string, e.g. `1.2.1`.
pub fn speex_version() -> String {
    speex::ffi::version_string()
}

/// Returns both codec versions on one line.
pub fn version_string() -> String {
    format!("{}; speex {}", opus_version(), speex_version())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binding_codes_described_locally() {
        assert_eq!(error_string(code::FRAME_SIZE_MISMATCH), "frame size mismatch");
        assert!(error_string(code::CREATE_FAILED).contains("created"));
    }

    #[test]
    fn test_opus_codes_through_strerror() {
        assert_eq!(error_string(0), "success");
        assert_eq!(error_string(code::BAD_ARG), "invalid argument");
        assert_eq!(error_string(code::BUFFER_TOO_SMALL), "buffer too small");
        assert_eq!(error_string(-4), "corrupted stream");
        assert_eq!(error_string(-9999), "unknown error");
    }

    #[test]
    fn test_versions() {
        assert!(opus_version().contains("opus"));
        assert!(!speex_version().is_empty());
        let both = version_string();
        assert!(both.contains("opus") && both.contains("speex"));
    }
}
