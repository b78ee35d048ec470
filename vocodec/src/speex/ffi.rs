//! FFI bindings to libspeex.

use std::os::raw::{c_char, c_float, c_int, c_void};

/// Opaque mode descriptor (`SpeexMode`).
#[repr(C)]
pub struct SpeexMode {
    _private: [u8; 0],
}

/// Bit-packing state (from speex_bits.h).
#[repr(C)]
pub struct SpeexBits {
    pub chars: *mut c_char,
    pub nb_bits: c_int,
    pub char_ptr: c_int,
    pub bit_ptr: c_int,
    pub owner: c_int,
    pub overflow: c_int,
    pub buf_size: c_int,
    pub reserved1: c_int,
    pub reserved2: *mut c_void,
}

/// spx_int16_t type (from speex_types.h)
pub type SpxInt16 = i16;

// Mode ids
pub const SPEEX_MODEID_NB: c_int = 0;
pub const SPEEX_MODEID_WB: c_int = 1;
pub const SPEEX_MODEID_UWB: c_int = 2;

// Encoder/decoder requests
pub const SPEEX_SET_ENH: c_int = 0;
pub const SPEEX_GET_ENH: c_int = 1;
pub const SPEEX_GET_FRAME_SIZE: c_int = 3;
pub const SPEEX_SET_QUALITY: c_int = 4;
pub const SPEEX_SET_VBR: c_int = 12;
pub const SPEEX_GET_VBR: c_int = 13;
pub const SPEEX_SET_MODE: c_int = 6;
pub const SPEEX_GET_MODE: c_int = 7;
pub const SPEEX_SET_LOW_MODE: c_int = 8;
pub const SPEEX_GET_LOW_MODE: c_int = 9;
pub const SPEEX_SET_HIGH_MODE: c_int = 10;
pub const SPEEX_GET_HIGH_MODE: c_int = 11;
pub const SPEEX_SET_VBR_QUALITY: c_int = 14;
pub const SPEEX_GET_VBR_QUALITY: c_int = 15;
pub const SPEEX_SET_COMPLEXITY: c_int = 16;
pub const SPEEX_GET_COMPLEXITY: c_int = 17;
pub const SPEEX_SET_BITRATE: c_int = 18;
pub const SPEEX_GET_BITRATE: c_int = 19;
pub const SPEEX_SET_HANDLER: c_int = 20;
pub const SPEEX_SET_USER_HANDLER: c_int = 22;
pub const SPEEX_SET_SAMPLING_RATE: c_int = 24;
pub const SPEEX_GET_SAMPLING_RATE: c_int = 25;
pub const SPEEX_RESET_STATE: c_int = 26;
pub const SPEEX_GET_RELATIVE_QUALITY: c_int = 29;
pub const SPEEX_SET_VAD: c_int = 30;
pub const SPEEX_GET_VAD: c_int = 31;
pub const SPEEX_SET_ABR: c_int = 32;
pub const SPEEX_GET_ABR: c_int = 33;
pub const SPEEX_SET_DTX: c_int = 34;
pub const SPEEX_GET_DTX: c_int = 35;
pub const SPEEX_SET_SUBMODE_ENCODING: c_int = 36;
pub const SPEEX_GET_SUBMODE_ENCODING: c_int = 37;
pub const SPEEX_GET_LOOKAHEAD: c_int = 39;
pub const SPEEX_SET_PLC_TUNING: c_int = 40;
pub const SPEEX_GET_PLC_TUNING: c_int = 41;
pub const SPEEX_SET_VBR_MAX_BITRATE: c_int = 42;
pub const SPEEX_GET_VBR_MAX_BITRATE: c_int = 43;
pub const SPEEX_SET_HIGHPASS: c_int = 44;
pub const SPEEX_GET_HIGHPASS: c_int = 45;
pub const SPEEX_GET_ACTIVITY: c_int = 47;
pub const SPEEX_GET_PI_GAIN: c_int = 100;
pub const SPEEX_GET_EXC: c_int = 101;
pub const SPEEX_SET_INNOVATION_SAVE: c_int = 104;
pub const SPEEX_GET_STACK: c_int = 106;

// Library requests
pub const SPEEX_LIB_GET_VERSION_STRING: c_int = 9;

unsafe extern "C" {
    pub fn speex_lib_get_mode(mode: c_int) -> *const SpeexMode;
    pub fn speex_lib_ctl(request: c_int, ptr: *mut c_void) -> c_int;

    // Bits
    pub fn speex_bits_init(bits: *mut SpeexBits);
    pub fn speex_bits_destroy(bits: *mut SpeexBits);
    pub fn speex_bits_reset(bits: *mut SpeexBits);
    pub fn speex_bits_read_from(bits: *mut SpeexBits, bytes: *const c_char, len: c_int);
    pub fn speex_bits_write(bits: *mut SpeexBits, bytes: *mut c_char, max_len: c_int) -> c_int;
    pub fn speex_bits_nbytes(bits: *mut SpeexBits) -> c_int;

    // Encoder
    pub fn speex_encoder_init(mode: *const SpeexMode) -> *mut c_void;
    pub fn speex_encoder_destroy(state: *mut c_void);
    pub fn speex_encode_int(
        state: *mut c_void,
        input: *mut SpxInt16,
        bits: *mut SpeexBits,
    ) -> c_int;
    pub fn speex_encoder_ctl(state: *mut c_void, request: c_int, ptr: *mut c_void) -> c_int;

    // Decoder
    pub fn speex_decoder_init(mode: *const SpeexMode) -> *mut c_void;
    pub fn speex_decoder_destroy(state: *mut c_void);
    pub fn speex_decode(state: *mut c_void, bits: *mut SpeexBits, out: *mut c_float) -> c_int;
    pub fn speex_decode_int(state: *mut c_void, bits: *mut SpeexBits, out: *mut SpxInt16) -> c_int;
    pub fn speex_decoder_ctl(state: *mut c_void, request: c_int, ptr: *mut c_void) -> c_int;
}

/// Returns the libspeex version string.
pub fn version_string() -> String {
    let mut ptr: *const c_char = std::ptr::null();
    let ret = unsafe {
        speex_lib_ctl(
            SPEEX_LIB_GET_VERSION_STRING,
            &mut ptr as *mut *const c_char as *mut c_void,
        )
    };
    if ret != 0 || ptr.is_null() {
        return String::from("speex unknown");
    }
    unsafe { std::ffi::CStr::from_ptr(ptr) }
        .to_string_lossy()
        .into_owned()
}
