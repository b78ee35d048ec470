//! Speex decoder.

use std::os::raw::{c_char, c_void};
use std::ptr;

use tracing::{debug, trace, warn};

use super::ffi;
use super::{ctl_slot, Bits, Mode, SpeexSample};
use crate::ctl::Control;
use crate::error::{code, Error, Result};
use crate::pin::{self, PinSink, PinSource};

/// Speex decoder.
pub struct Decoder {
    mode: Mode,
    frame_size: usize,
    state: *mut c_void,
    bits: Bits,
}

// Safety: state and bits are owned exclusively and only used through &mut self.
unsafe impl Send for Decoder {}

impl Drop for Decoder {
    fn drop(&mut self) {
        if !self.state.is_null() {
            unsafe { ffi::speex_decoder_destroy(self.state) };
            self.state = ptr::null_mut();
            debug!(mode = %self.mode, "speex: decoder destroyed");
        }
    }
}

impl std::fmt::Debug for Decoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("speex::Decoder")
            .field("mode", &self.mode)
            .field("frame_size", &self.frame_size)
            .finish()
    }
}

impl Decoder {
    /// Creates a new decoder for `mode`, with the perceptual enhancer on or off.
    pub fn new(mode: Mode, enhance: bool) -> Result<Self> {
        let descriptor = mode.descriptor()?;
        let state = unsafe { ffi::speex_decoder_init(descriptor) };
        if state.is_null() {
            warn!(mode = %mode, "speex: decoder init returned no state");
            return Err(Error::speex(code::CREATE_FAILED));
        }

        let mut decoder = Self {
            mode,
            frame_size: 0,
            state,
            bits: Bits::new(),
        };
        decoder.set_enhancement(enhance)?;
        let frame_size = decoder.get(ffi::SPEEX_GET_FRAME_SIZE)?;
        if frame_size <= 0 {
            return Err(Error::speex(code::CREATE_FAILED));
        }
        decoder.frame_size = frame_size as usize;

        debug!(mode = %mode, frame_size, enhance, "speex: decoder created");
        Ok(decoder)
    }

    /// Creates a decoder from a raw mode id (0 NB, 1 WB, 2 UWB).
    pub fn from_mode_id(id: i32, enhance: bool) -> Result<Self> {
        Self::new(Mode::from_id(id)?, enhance)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Samples per frame, fixed by the mode.
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Decodes one frame into `output`.
    ///
    /// With `input` present, the first `in_len` bytes are loaded into the
    /// bit-accumulator and decoded. With `input` absent (or `in_len` zero)
    /// and `conceal` set, the engine synthesizes a frame from its history;
    /// absent input without `conceal` is a [`Error::BadArgument`].
    ///
    /// Float output uses the engine's native float scale, which spans the
    /// 16-bit integer range.
    ///
    /// Returns the number of samples written, always the mode frame size.
    pub fn decode<T, I, O>(
        &mut self,
        input: Option<&I>,
        in_len: usize,
        output: &mut O,
        frame_size: usize,
        conceal: bool,
    ) -> Result<usize>
    where
        T: SpeexSample,
        I: PinSource<u8> + ?Sized,
        O: PinSink<T> + ?Sized,
    {
        if frame_size != self.frame_size {
            return Err(Error::FrameSizeMismatch {
                expected: self.frame_size,
                actual: frame_size,
            });
        }
        if let Some(buf) = input {
            if in_len > buf.source_len() {
                return Err(Error::BadArgument("input length exceeds input buffer"));
            }
        }
        if output.sink_len() < frame_size {
            return Err(Error::BadArgument("output shorter than frame"));
        }
        let input = input.filter(|_| in_len > 0);
        if input.is_none() && !conceal {
            return Err(Error::BadArgument("input required when concealment is off"));
        }

        let data = pin::pin_optional(input)?;
        let mut pcm = pin::pin_mut(output)?;
        let ret = unsafe {
            if data.is_absent() {
                T::decode_raw(self.state, ptr::null_mut(), pcm.as_mut_ptr())
            } else {
                let bits = self.bits.as_mut_ptr();
                ffi::speex_bits_read_from(bits, data.as_ptr() as *const c_char, in_len as i32);
                T::decode_raw(self.state, bits, pcm.as_mut_ptr())
            }
        };

        if ret < 0 {
            return Err(Error::speex(ret));
        }
        trace!(frame_size, concealed = data.is_absent(), sample = T::NAME, "speex: decoded frame");
        Ok(self.frame_size)
    }

    /// Decodes a packet into a freshly allocated frame.
    pub fn decode_vec<T: SpeexSample>(&mut self, packet: &[u8]) -> Result<Vec<T>> {
        let mut buf = vec![T::default(); self.frame_size];
        self.decode(Some(packet), packet.len(), &mut buf[..], self.frame_size, false)?;
        Ok(buf)
    }

    /// Synthesizes one frame for a lost packet.
    pub fn conceal<T: SpeexSample>(&mut self) -> Result<Vec<T>> {
        let mut buf = vec![T::default(); self.frame_size];
        self.decode::<T, [u8], _>(None, 0, &mut buf[..], self.frame_size, true)?;
        Ok(buf)
    }

    /// Turns the perceptual enhancer on or off.
    pub fn set_enhancement(&mut self, enabled: bool) -> Result<()> {
        self.set(ffi::SPEEX_SET_ENH, enabled as i32)
    }

    pub fn enhancement(&mut self) -> Result<bool> {
        self.get(ffi::SPEEX_GET_ENH).map(|v| v != 0)
    }

    /// Returns the bitrate of the last decoded frame.
    pub fn bitrate(&mut self) -> Result<i32> {
        self.get(ffi::SPEEX_GET_BITRATE)
    }
}

impl Control for Decoder {
    fn get(&mut self, request: i32) -> Result<i32> {
        let mut slot = 0;
        ctl_slot(ffi::speex_decoder_ctl, self.state, request, &mut slot)?;
        Ok(slot)
    }

    fn set(&mut self, request: i32, value: i32) -> Result<()> {
        let mut slot = value;
        ctl_slot(ffi::speex_decoder_ctl, self.state, request, &mut slot)
    }
}
