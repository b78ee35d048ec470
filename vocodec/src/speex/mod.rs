//! Speex speech codec.
//!
//! Narrowband, wideband and ultra-wideband encoder and decoder contexts.
//! Each context owns its native state and its own bit-accumulator; both are
//! freed together when the context is dropped. Frame sizes are fixed by the
//! mode and read back from the engine when the context is created.
//!
//! # Example
//!
//! ```ignore
//! use giztoy_vocodec::speex::{Decoder, Encoder, Mode};
//!
//! let mut encoder = Encoder::new(Mode::Narrowband)?;
//! let frame = vec![0i16; encoder.frame_size()];
//! let packet = encoder.encode_vec(&frame)?;
//!
//! let mut decoder = Decoder::new(Mode::Narrowband, true)?;
//! let pcm: Vec<i16> = decoder.decode_vec(&packet)?;
//! ```

pub mod ffi;
mod decoder;
mod encoder;

pub use decoder::*;
pub use encoder::*;

use std::os::raw::{c_int, c_void};

use crate::error::{Error, Result};
use crate::sample::{floats_to_i16, Sample};

/// Bandwidth class of a speex context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// 8 kHz.
    #[serde(alias = "nb")]
    Narrowband,
    /// 16 kHz.
    #[serde(alias = "wb")]
    Wideband,
    /// 32 kHz.
    #[serde(alias = "uwb")]
    UltraWideband,
}

impl Mode {
    /// Maps a native mode id. Ids outside NB/WB/UWB are rejected here, before
    /// any native call.
    pub fn from_id(id: i32) -> Result<Self> {
        match id {
            ffi::SPEEX_MODEID_NB => Ok(Self::Narrowband),
            ffi::SPEEX_MODEID_WB => Ok(Self::Wideband),
            ffi::SPEEX_MODEID_UWB => Ok(Self::UltraWideband),
            _ => Err(Error::BadArgument("unsupported speex mode")),
        }
    }

    pub fn id(self) -> i32 {
        match self {
            Self::Narrowband => ffi::SPEEX_MODEID_NB,
            Self::Wideband => ffi::SPEEX_MODEID_WB,
            Self::UltraWideband => ffi::SPEEX_MODEID_UWB,
        }
    }

    pub fn sample_rate(self) -> i32 {
        match self {
            Self::Narrowband => 8000,
            Self::Wideband => 16000,
            Self::UltraWideband => 32000,
        }
    }

    fn descriptor(self) -> Result<*const ffi::SpeexMode> {
        let mode = unsafe { ffi::speex_lib_get_mode(self.id()) };
        if mode.is_null() {
            return Err(Error::speex(crate::error::code::CREATE_FAILED));
        }
        Ok(mode)
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Narrowband => write!(f, "nb"),
            Self::Wideband => write!(f, "wb"),
            Self::UltraWideband => write!(f, "uwb"),
        }
    }
}

/// Bit-accumulator owned by one encoder or decoder.
struct Bits(ffi::SpeexBits);

impl Bits {
    fn new() -> Self {
        let mut bits = std::mem::MaybeUninit::<ffi::SpeexBits>::zeroed();
        unsafe {
            ffi::speex_bits_init(bits.as_mut_ptr());
            Self(bits.assume_init())
        }
    }

    fn as_mut_ptr(&mut self) -> *mut ffi::SpeexBits {
        &mut self.0
    }
}

impl Drop for Bits {
    fn drop(&mut self) {
        unsafe { ffi::speex_bits_destroy(&mut self.0) };
    }
}

/// Sample types the speex contexts accept.
///
/// Encoding always runs through the integer encoder: `i16` frames are copied
/// as-is, `f32` frames are converted with [`crate::sample::float_to_i16`].
pub trait SpeexSample: Sample {
    #[doc(hidden)]
    fn to_encoder_input(src: &[Self], dst: &mut [i16]);

    #[doc(hidden)]
    unsafe fn decode_raw(state: *mut c_void, bits: *mut ffi::SpeexBits, out: *mut Self) -> c_int;
}

impl SpeexSample for i16 {
    fn to_encoder_input(src: &[i16], dst: &mut [i16]) {
        dst.copy_from_slice(src);
    }

    unsafe fn decode_raw(state: *mut c_void, bits: *mut ffi::SpeexBits, out: *mut i16) -> c_int {
        unsafe { ffi::speex_decode_int(state, bits, out) }
    }
}

impl SpeexSample for f32 {
    fn to_encoder_input(src: &[f32], dst: &mut [i16]) {
        floats_to_i16(src, dst);
    }

    unsafe fn decode_raw(state: *mut c_void, bits: *mut ffi::SpeexBits, out: *mut f32) -> c_int {
        unsafe { ffi::speex_decode(state, bits, out) }
    }
}

/// Requests whose argument is a single `int` or `spx_int32_t`. Everything
/// else takes a float, an array, a callback or a buffer and is refused.
const INT_REQUESTS: [i32; 35] = [
    ffi::SPEEX_SET_ENH,
    ffi::SPEEX_GET_ENH,
    ffi::SPEEX_GET_FRAME_SIZE,
    ffi::SPEEX_SET_QUALITY,
    ffi::SPEEX_SET_MODE,
    ffi::SPEEX_GET_MODE,
    ffi::SPEEX_SET_LOW_MODE,
    ffi::SPEEX_GET_LOW_MODE,
    ffi::SPEEX_SET_HIGH_MODE,
    ffi::SPEEX_GET_HIGH_MODE,
    ffi::SPEEX_SET_VBR,
    ffi::SPEEX_GET_VBR,
    ffi::SPEEX_SET_COMPLEXITY,
    ffi::SPEEX_GET_COMPLEXITY,
    ffi::SPEEX_SET_BITRATE,
    ffi::SPEEX_GET_BITRATE,
    ffi::SPEEX_SET_SAMPLING_RATE,
    ffi::SPEEX_GET_SAMPLING_RATE,
    ffi::SPEEX_RESET_STATE,
    ffi::SPEEX_SET_VAD,
    ffi::SPEEX_GET_VAD,
    ffi::SPEEX_SET_ABR,
    ffi::SPEEX_GET_ABR,
    ffi::SPEEX_SET_DTX,
    ffi::SPEEX_GET_DTX,
    ffi::SPEEX_SET_SUBMODE_ENCODING,
    ffi::SPEEX_GET_SUBMODE_ENCODING,
    ffi::SPEEX_GET_LOOKAHEAD,
    ffi::SPEEX_SET_PLC_TUNING,
    ffi::SPEEX_GET_PLC_TUNING,
    ffi::SPEEX_SET_VBR_MAX_BITRATE,
    ffi::SPEEX_GET_VBR_MAX_BITRATE,
    ffi::SPEEX_SET_HIGHPASS,
    ffi::SPEEX_GET_HIGHPASS,
    ffi::SPEEX_GET_ACTIVITY,
];

fn check_request(request: i32) -> Result<()> {
    if !INT_REQUESTS.contains(&request) {
        return Err(Error::BadArgument("speex request does not take an i32 slot"));
    }
    Ok(())
}

type CtlFn = unsafe extern "C" fn(*mut c_void, c_int, *mut c_void) -> c_int;

/// Runs one control request with `slot` as the in/out parameter.
fn ctl_slot(ctl: CtlFn, state: *mut c_void, request: i32, slot: &mut i32) -> Result<()> {
    check_request(request)?;
    let ret = unsafe { ctl(state, request, slot as *mut i32 as *mut c_void) };
    if ret != 0 {
        return Err(Error::speex(ret));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_id() {
        assert_eq!(Mode::from_id(0).unwrap(), Mode::Narrowband);
        assert_eq!(Mode::from_id(1).unwrap(), Mode::Wideband);
        assert_eq!(Mode::from_id(2).unwrap(), Mode::UltraWideband);
        assert!(matches!(Mode::from_id(3), Err(Error::BadArgument(_))));
        assert!(matches!(Mode::from_id(-1), Err(Error::BadArgument(_))));
    }

    #[test]
    fn test_mode_ids_round_trip() {
        for mode in [Mode::Narrowband, Mode::Wideband, Mode::UltraWideband] {
            assert_eq!(Mode::from_id(mode.id()).unwrap(), mode);
        }
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(Mode::UltraWideband.to_string(), "uwb");
        assert_eq!(Mode::Wideband.sample_rate(), 16000);
    }

    #[test]
    fn test_non_int_requests_refused() {
        for request in [
            ffi::SPEEX_SET_HANDLER,
            ffi::SPEEX_SET_USER_HANDLER,
            ffi::SPEEX_GET_PI_GAIN,
            ffi::SPEEX_GET_EXC,
            ffi::SPEEX_SET_INNOVATION_SAVE,
            ffi::SPEEX_GET_STACK,
            ffi::SPEEX_SET_VBR_QUALITY,
            ffi::SPEEX_GET_VBR_QUALITY,
            ffi::SPEEX_GET_RELATIVE_QUALITY,
            2,
            -1,
            1000,
        ] {
            assert_eq!(
                check_request(request),
                Err(Error::BadArgument("speex request does not take an i32 slot")),
                "request {request}"
            );
        }
    }

    #[test]
    fn test_int_requests_allowed() {
        for request in INT_REQUESTS {
            assert!(check_request(request).is_ok(), "request {request}");
        }
        assert!(check_request(ffi::SPEEX_SET_QUALITY).is_ok());
    }

    #[test]
    fn test_bits_init_and_destroy() {
        let mut bits = Bits::new();
        unsafe {
            ffi::speex_bits_reset(bits.as_mut_ptr());
            assert_eq!(ffi::speex_bits_nbytes(bits.as_mut_ptr()), 0);
        }
    }
}
