//! Speex encoder.

use std::os::raw::{c_char, c_void};
use std::ptr;

use tracing::{debug, trace, warn};

use super::ffi;
use super::{ctl_slot, Bits, Mode, SpeexSample};
use crate::ctl::Control;
use crate::error::{code, Error, Result};
use crate::pin::{self, PinSink, PinSource};

/// Largest packet a single speex frame produces, at UWB quality 10.
pub const MAX_PACKET_SIZE: usize = 256;

/// Speex encoder.
pub struct Encoder {
    mode: Mode,
    frame_size: usize,
    state: *mut c_void,
    bits: Bits,
    // One frame of integer samples handed to the native encoder, which may
    // filter its input in place.
    scratch: Vec<i16>,
}

// Safety: state and bits are owned exclusively and only used through &mut self.
unsafe impl Send for Encoder {}

impl Drop for Encoder {
    fn drop(&mut self) {
        if !self.state.is_null() {
            unsafe { ffi::speex_encoder_destroy(self.state) };
            self.state = ptr::null_mut();
            debug!(mode = %self.mode, "speex: encoder destroyed");
        }
    }
}

impl std::fmt::Debug for Encoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("speex::Encoder")
            .field("mode", &self.mode)
            .field("frame_size", &self.frame_size)
            .finish()
    }
}

impl Encoder {
    /// Creates a new encoder for `mode`.
    pub fn new(mode: Mode) -> Result<Self> {
        let descriptor = mode.descriptor()?;
        let state = unsafe { ffi::speex_encoder_init(descriptor) };
        if state.is_null() {
            warn!(mode = %mode, "speex: encoder init returned no state");
            return Err(Error::speex(code::CREATE_FAILED));
        }

        let mut encoder = Self {
            mode,
            frame_size: 0,
            state,
            bits: Bits::new(),
            scratch: Vec::new(),
        };
        let frame_size = encoder.get(ffi::SPEEX_GET_FRAME_SIZE)?;
        if frame_size <= 0 {
            return Err(Error::speex(code::CREATE_FAILED));
        }
        encoder.frame_size = frame_size as usize;
        encoder.scratch = vec![0; encoder.frame_size];

        debug!(mode = %mode, frame_size, "speex: encoder created");
        Ok(encoder)
    }

    /// Creates an encoder from a raw mode id (0 NB, 1 WB, 2 UWB).
    pub fn from_mode_id(id: i32) -> Result<Self> {
        Self::new(Mode::from_id(id)?)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Samples per frame, fixed by the mode.
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Encodes one frame into `output`, writing at most `out_cap` bytes.
    ///
    /// `frame_size` must equal [`Encoder::frame_size`]; otherwise
    /// [`Error::FrameSizeMismatch`] is returned and the engine is not
    /// touched. A packet that does not fit `out_cap` is reported as
    /// [`Error::BufferTooSmall`] rather than truncated.
    pub fn encode<T, I, O>(
        &mut self,
        input: &I,
        frame_size: usize,
        output: &mut O,
        out_cap: usize,
    ) -> Result<usize>
    where
        T: SpeexSample,
        I: PinSource<T> + ?Sized,
        O: PinSink<u8> + ?Sized,
    {
        if frame_size != self.frame_size {
            return Err(Error::FrameSizeMismatch {
                expected: self.frame_size,
                actual: frame_size,
            });
        }
        if out_cap > output.sink_len() {
            return Err(Error::BadArgument("output capacity exceeds output buffer"));
        }
        if input.source_len() < frame_size {
            return Err(Error::BadArgument("input shorter than frame"));
        }

        let pcm = pin::pin(input)?;
        let mut data = pin::pin_mut(output)?;

        T::to_encoder_input(&pcm.as_slice()[..frame_size], &mut self.scratch);
        let bits = self.bits.as_mut_ptr();
        let n = unsafe {
            ffi::speex_bits_reset(bits);
            ffi::speex_encode_int(self.state, self.scratch.as_mut_ptr(), bits);
            let needed = ffi::speex_bits_nbytes(bits).max(0) as usize;
            if needed > out_cap {
                return Err(Error::BufferTooSmall);
            }
            ffi::speex_bits_write(bits, data.as_mut_ptr() as *mut c_char, needed as i32)
        };

        trace!(frame_size, bytes = n, sample = T::NAME, "speex: encoded frame");
        Ok(n.max(0) as usize)
    }

    /// Encodes one frame into a freshly allocated packet.
    pub fn encode_vec<T: SpeexSample>(&mut self, pcm: &[T]) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; MAX_PACKET_SIZE];
        let n = self.encode(pcm, pcm.len(), &mut buf[..], MAX_PACKET_SIZE)?;
        buf.truncate(n);
        Ok(buf)
    }

    /// Sets the quality (0-10).
    pub fn set_quality(&mut self, quality: i32) -> Result<()> {
        self.set(ffi::SPEEX_SET_QUALITY, quality)
    }

    /// Sets the complexity (1-10).
    pub fn set_complexity(&mut self, complexity: i32) -> Result<()> {
        self.set(ffi::SPEEX_SET_COMPLEXITY, complexity)
    }

    pub fn complexity(&mut self) -> Result<i32> {
        self.get(ffi::SPEEX_GET_COMPLEXITY)
    }

    /// Enables or disables variable bitrate.
    pub fn set_vbr(&mut self, enabled: bool) -> Result<()> {
        self.set(ffi::SPEEX_SET_VBR, enabled as i32)
    }

    /// Sets the VBR quality. The native request takes a float.
    pub fn set_vbr_quality(&mut self, quality: f32) -> Result<()> {
        let mut slot = quality;
        let ret = unsafe {
            ffi::speex_encoder_ctl(
                self.state,
                ffi::SPEEX_SET_VBR_QUALITY,
                &mut slot as *mut f32 as *mut c_void,
            )
        };
        if ret != 0 {
            return Err(Error::speex(ret));
        }
        Ok(())
    }

    /// Returns the current bitrate in bits per second.
    pub fn bitrate(&mut self) -> Result<i32> {
        self.get(ffi::SPEEX_GET_BITRATE)
    }

    /// Returns the encoder lookahead in samples.
    pub fn lookahead(&mut self) -> Result<i32> {
        self.get(ffi::SPEEX_GET_LOOKAHEAD)
    }
}

impl Control for Encoder {
    fn get(&mut self, request: i32) -> Result<i32> {
        let mut slot = 0;
        ctl_slot(ffi::speex_encoder_ctl, self.state, request, &mut slot)?;
        Ok(slot)
    }

    fn set(&mut self, request: i32, value: i32) -> Result<()> {
        let mut slot = value;
        ctl_slot(ffi::speex_encoder_ctl, self.state, request, &mut slot)
    }
}
