//! FFI bindings to the speexdsp echo canceller.

use std::os::raw::{c_int, c_void};

/// Opaque echo canceller state.
#[repr(C)]
pub struct SpeexEchoState {
    _private: [u8; 0],
}

pub type SpxInt16 = i16;

// Requests
pub const SPEEX_ECHO_GET_FRAME_SIZE: c_int = 3;
pub const SPEEX_ECHO_SET_SAMPLING_RATE: c_int = 24;
pub const SPEEX_ECHO_GET_SAMPLING_RATE: c_int = 25;
pub const SPEEX_ECHO_GET_IMPULSE_RESPONSE_SIZE: c_int = 27;

unsafe extern "C" {
    pub fn speex_echo_state_init(frame_size: c_int, filter_length: c_int) -> *mut SpeexEchoState;
    pub fn speex_echo_state_destroy(st: *mut SpeexEchoState);
    pub fn speex_echo_state_reset(st: *mut SpeexEchoState);
    pub fn speex_echo_cancellation(
        st: *mut SpeexEchoState,
        rec: *const SpxInt16,
        play: *const SpxInt16,
        out: *mut SpxInt16,
    );
    pub fn speex_echo_capture(st: *mut SpeexEchoState, rec: *const SpxInt16, out: *mut SpxInt16);
    pub fn speex_echo_playback(st: *mut SpeexEchoState, play: *const SpxInt16);
    pub fn speex_echo_ctl(st: *mut SpeexEchoState, request: c_int, ptr: *mut c_void) -> c_int;
}
