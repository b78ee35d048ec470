//! Opus audio codec.
//!
//! Owned encoder and decoder contexts over libopus. Sample buffers reach the
//! native engine through [`crate::pin`] guards; nothing is copied on the
//! way in or out.
//!
//! # Example
//!
//! ```ignore
//! use giztoy_vocodec::opus::{Application, Decoder, Encoder};
//!
//! let mut encoder = Encoder::new(8000, 1, Application::VoIP)?;
//! let pcm = vec![0i16; 160]; // 20ms at 8kHz
//! let mut packet = vec![0u8; 1000];
//! let n = encoder.encode(&pcm[..], 160, &mut packet[..], 1000)?;
//!
//! let mut decoder = Decoder::new(8000, 1)?;
//! let mut out = vec![0i16; 160];
//! let samples = decoder.decode(Some(&packet[..]), n, &mut out[..], 160, false)?;
//! assert_eq!(samples, 160);
//! ```

pub mod ffi;
mod decoder;
mod encoder;

pub use decoder::*;
pub use encoder::*;

use std::os::raw::{c_float, c_int, c_uchar};

use crate::sample::Sample;

/// Largest packet libopus produces for a single frame.
pub const MAX_PACKET_SIZE: usize = 4000;

/// Largest frame, per channel: 120ms at 48kHz.
pub const MAX_FRAME_SIZE: usize = 5760;

/// Opus application type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Application {
    /// Best quality for voice signals.
    #[serde(alias = "voip")]
    VoIP,
    /// Best quality for non-voice signals.
    Audio,
    /// Minimum possible coding delay.
    RestrictedLowdelay,
}

impl Application {
    pub fn to_ffi(self) -> i32 {
        match self {
            Self::VoIP => ffi::OPUS_APPLICATION_VOIP,
            Self::Audio => ffi::OPUS_APPLICATION_AUDIO,
            Self::RestrictedLowdelay => ffi::OPUS_APPLICATION_RESTRICTED_LOWDELAY,
        }
    }

    /// Maps a raw application code back; `None` for unknown codes.
    pub fn from_ffi(code: i32) -> Option<Self> {
        match code {
            ffi::OPUS_APPLICATION_VOIP => Some(Self::VoIP),
            ffi::OPUS_APPLICATION_AUDIO => Some(Self::Audio),
            ffi::OPUS_APPLICATION_RESTRICTED_LOWDELAY => Some(Self::RestrictedLowdelay),
            _ => None,
        }
    }
}

/// Signal type hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Auto,
    Voice,
    Music,
}

impl Signal {
    pub fn to_ffi(self) -> i32 {
        match self {
            Self::Auto => ffi::OPUS_AUTO,
            Self::Voice => ffi::OPUS_SIGNAL_VOICE,
            Self::Music => ffi::OPUS_SIGNAL_MUSIC,
        }
    }
}

/// Frame durations libopus accepts for a single encode call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameDuration {
    Duration2500us,
    Duration5ms,
    Duration10ms,
    Duration20ms,
    Duration40ms,
    Duration60ms,
    Duration80ms,
    Duration100ms,
    Duration120ms,
}

impl FrameDuration {
    const ALL: [FrameDuration; 9] = [
        Self::Duration2500us,
        Self::Duration5ms,
        Self::Duration10ms,
        Self::Duration20ms,
        Self::Duration40ms,
        Self::Duration60ms,
        Self::Duration80ms,
        Self::Duration100ms,
        Self::Duration120ms,
    ];

    /// Returns the duration in tenths of a millisecond.
    fn tenth_millis(&self) -> usize {
        match self {
            Self::Duration2500us => 25,
            Self::Duration5ms => 50,
            Self::Duration10ms => 100,
            Self::Duration20ms => 200,
            Self::Duration40ms => 400,
            Self::Duration60ms => 600,
            Self::Duration80ms => 800,
            Self::Duration100ms => 1000,
            Self::Duration120ms => 1200,
        }
    }

    /// Samples per channel for this duration at `sample_rate`.
    pub fn samples(&self, sample_rate: i32) -> usize {
        sample_rate.max(0) as usize * self.tenth_millis() / 10_000
    }

    /// Finds the duration whose length at `sample_rate` is `frame_size`.
    pub fn from_samples(sample_rate: i32, frame_size: usize) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|fd| frame_size > 0 && fd.samples(sample_rate) == frame_size)
    }
}

impl std::fmt::Display for FrameDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Duration2500us => write!(f, "2.5ms"),
            other => write!(f, "{}ms", other.tenth_millis() / 10),
        }
    }
}

/// Sample types libopus encodes and decodes natively.
pub trait OpusSample: Sample {
    #[doc(hidden)]
    unsafe fn encode_raw(
        enc: *mut ffi::OpusEncoder,
        pcm: *const Self,
        frame_size: c_int,
        data: *mut c_uchar,
        max_data_bytes: i32,
    ) -> i32;

    #[doc(hidden)]
    unsafe fn decode_raw(
        dec: *mut ffi::OpusDecoder,
        data: *const c_uchar,
        len: i32,
        pcm: *mut Self,
        frame_size: c_int,
        decode_fec: c_int,
    ) -> i32;
}

impl OpusSample for i16 {
    unsafe fn encode_raw(
        enc: *mut ffi::OpusEncoder,
        pcm: *const i16,
        frame_size: c_int,
        data: *mut c_uchar,
        max_data_bytes: i32,
    ) -> i32 {
        unsafe { ffi::opus_encode(enc, pcm, frame_size, data, max_data_bytes) }
    }

    unsafe fn decode_raw(
        dec: *mut ffi::OpusDecoder,
        data: *const c_uchar,
        len: i32,
        pcm: *mut i16,
        frame_size: c_int,
        decode_fec: c_int,
    ) -> i32 {
        unsafe { ffi::opus_decode(dec, data, len, pcm, frame_size, decode_fec) }
    }
}

impl OpusSample for f32 {
    unsafe fn encode_raw(
        enc: *mut ffi::OpusEncoder,
        pcm: *const c_float,
        frame_size: c_int,
        data: *mut c_uchar,
        max_data_bytes: i32,
    ) -> i32 {
        unsafe { ffi::opus_encode_float(enc, pcm, frame_size, data, max_data_bytes) }
    }

    unsafe fn decode_raw(
        dec: *mut ffi::OpusDecoder,
        data: *const c_uchar,
        len: i32,
        pcm: *mut c_float,
        frame_size: c_int,
        decode_fec: c_int,
    ) -> i32 {
        unsafe { ffi::opus_decode_float(dec, data, len, pcm, frame_size, decode_fec) }
    }
}

/// Checks the GET/SET parity convention and refuses pointer requests that
/// do not fit a single `i32` slot.
fn check_request(request: i32, get: bool) -> crate::Result<()> {
    if matches!(request, ffi::CELT_GET_MODE_REQUEST | ffi::OPUS_SET_ENERGY_MASK_REQUEST) {
        return Err(crate::Error::BadArgument("opus request does not take an i32 slot"));
    }
    let is_get = request % 2 != 0;
    if get != is_get {
        return Err(crate::Error::BadArgument(if get {
            "opus GET requests use odd codes"
        } else {
            "opus SET requests use even codes"
        }));
    }
    Ok(())
}
