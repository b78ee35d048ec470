//! Opus encoder.

use std::ptr;

use tracing::{debug, trace, warn};

use super::ffi::{self, OpusEncoder as OpusEncoderHandle};
use super::{check_request, Application, FrameDuration, OpusSample, Signal, MAX_PACKET_SIZE};
use crate::ctl::Control;
use crate::error::{code, Error, Result};
use crate::pin::{self, PinSink, PinSource};

/// Opus encoder.
pub struct Encoder {
    sample_rate: i32,
    channels: i32,
    application: Application,
    handle: *mut OpusEncoderHandle,
}

// Safety: the handle is owned exclusively and only used through &mut self.
unsafe impl Send for Encoder {}

impl Drop for Encoder {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            unsafe { ffi::opus_encoder_destroy(self.handle) };
            self.handle = ptr::null_mut();
            debug!(
                sample_rate = self.sample_rate,
                channels = self.channels,
                "opus: encoder destroyed"
            );
        }
    }
}

impl std::fmt::Debug for Encoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("opus::Encoder")
            .field("sample_rate", &self.sample_rate)
            .field("channels", &self.channels)
            .field("application", &self.application)
            .finish()
    }
}

impl Encoder {
    /// Creates a new Opus encoder.
    ///
    /// # Parameters
    /// - `sample_rate`: Sample rate (8000, 12000, 16000, 24000, or 48000)
    /// - `channels`: Number of channels (1 or 2)
    /// - `application`: Intended application type
    ///
    /// On failure the libopus status code is returned verbatim in
    /// [`Error::Native`].
    pub fn new(sample_rate: i32, channels: i32, application: Application) -> Result<Self> {
        let mut error: i32 = 0;
        let handle = unsafe {
            ffi::opus_encoder_create(sample_rate, channels, application.to_ffi(), &mut error)
        };

        if handle.is_null() || error != ffi::OPUS_OK {
            if !handle.is_null() {
                unsafe { ffi::opus_encoder_destroy(handle) };
            }
            let status = if error != ffi::OPUS_OK { error } else { code::CREATE_FAILED };
            warn!(
                sample_rate,
                channels,
                status,
                "opus: encoder create failed: {}",
                ffi::error_string(status)
            );
            return Err(Error::opus(status));
        }

        debug!(sample_rate, channels, ?application, "opus: encoder created");
        Ok(Self {
            sample_rate,
            channels,
            application,
            handle,
        })
    }

    /// Creates a new VoIP encoder.
    pub fn new_voip(sample_rate: i32, channels: i32) -> Result<Self> {
        Self::new(sample_rate, channels, Application::VoIP)
    }

    /// Creates a new audio encoder.
    pub fn new_audio(sample_rate: i32, channels: i32) -> Result<Self> {
        Self::new(sample_rate, channels, Application::Audio)
    }

    /// Returns the sample rate.
    pub fn sample_rate(&self) -> i32 {
        self.sample_rate
    }

    /// Returns the number of channels.
    pub fn channels(&self) -> i32 {
        self.channels
    }

    /// Returns the application the encoder was created with.
    pub fn application(&self) -> Application {
        self.application
    }

    /// Encodes one frame into `output`, writing at most `out_cap` bytes.
    ///
    /// `frame_size` is in samples per channel and must be one of the
    /// [`FrameDuration`]s at the configured sample rate; `input` must hold
    /// `frame_size * channels` interleaved samples. Returns the packet
    /// length in bytes.
    pub fn encode<T, I, O>(
        &mut self,
        input: &I,
        frame_size: usize,
        output: &mut O,
        out_cap: usize,
    ) -> Result<usize>
    where
        T: OpusSample,
        I: PinSource<T> + ?Sized,
        O: PinSink<u8> + ?Sized,
    {
        if out_cap > output.sink_len() {
            return Err(Error::BadArgument("output capacity exceeds output buffer"));
        }
        if FrameDuration::from_samples(self.sample_rate, frame_size).is_none() {
            return Err(Error::BadArgument("frame size is not a valid opus frame duration"));
        }
        if frame_size * self.channels as usize > input.source_len() {
            return Err(Error::BadArgument("input shorter than frame"));
        }
        let max_bytes = i32::try_from(out_cap).unwrap_or(i32::MAX);

        let pcm = pin::pin(input)?;
        let mut data = pin::pin_mut(output)?;
        let n = unsafe {
            T::encode_raw(
                self.handle,
                pcm.as_ptr(),
                frame_size as i32,
                data.as_mut_ptr(),
                max_bytes,
            )
        };

        if n < 0 {
            return Err(Error::opus(n));
        }
        trace!(frame_size, bytes = n, sample = T::NAME, "opus: encoded frame");
        Ok(n as usize)
    }

    /// Encodes one frame into a freshly allocated packet.
    pub fn encode_vec<T: OpusSample>(&mut self, pcm: &[T], frame_size: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; MAX_PACKET_SIZE];
        let n = self.encode(pcm, frame_size, &mut buf[..], MAX_PACKET_SIZE)?;
        buf.truncate(n);
        Ok(buf)
    }

    /// Sets the target bitrate in bits per second.
    pub fn set_bitrate(&mut self, bitrate: i32) -> Result<()> {
        self.set(ffi::OPUS_SET_BITRATE_REQUEST, bitrate)
    }

    /// Returns the target bitrate in bits per second.
    pub fn bitrate(&mut self) -> Result<i32> {
        self.get(ffi::OPUS_GET_BITRATE_REQUEST)
    }

    /// Sets the encoder complexity (0-10).
    pub fn set_complexity(&mut self, complexity: i32) -> Result<()> {
        self.set(ffi::OPUS_SET_COMPLEXITY_REQUEST, complexity)
    }

    /// Returns the encoder complexity.
    pub fn complexity(&mut self) -> Result<i32> {
        self.get(ffi::OPUS_GET_COMPLEXITY_REQUEST)
    }

    /// Sets the signal type hint.
    pub fn set_signal(&mut self, signal: Signal) -> Result<()> {
        self.set(ffi::OPUS_SET_SIGNAL_REQUEST, signal.to_ffi())
    }

    /// Enables or disables in-band forward error correction.
    pub fn set_inband_fec(&mut self, enabled: bool) -> Result<()> {
        self.set(ffi::OPUS_SET_INBAND_FEC_REQUEST, enabled as i32)
    }

    /// Sets the expected packet loss percentage (0-100).
    pub fn set_packet_loss_perc(&mut self, perc: i32) -> Result<()> {
        self.set(ffi::OPUS_SET_PACKET_LOSS_PERC_REQUEST, perc)
    }

    /// Enables or disables discontinuous transmission.
    pub fn set_dtx(&mut self, enabled: bool) -> Result<()> {
        self.set(ffi::OPUS_SET_DTX_REQUEST, enabled as i32)
    }

    /// Returns the encoder lookahead in samples.
    pub fn lookahead(&mut self) -> Result<i32> {
        self.get(ffi::OPUS_GET_LOOKAHEAD_REQUEST)
    }

    /// Resets the codec state as if freshly created.
    pub fn reset(&mut self) -> Result<()> {
        self.set(ffi::OPUS_RESET_STATE, 0)
    }

    /// Returns the frame size for a given duration.
    pub fn frame_size_for_duration(&self, fd: FrameDuration) -> usize {
        fd.samples(self.sample_rate)
    }

    /// Returns the frame size for 20ms frames (recommended default).
    pub fn frame_size_20ms(&self) -> usize {
        self.frame_size_for_duration(FrameDuration::Duration20ms)
    }
}

impl Control for Encoder {
    fn get(&mut self, request: i32) -> Result<i32> {
        check_request(request, true)?;
        let mut slot: i32 = 0;
        let ret = unsafe { ffi::opus_encoder_ctl(self.handle, request, &mut slot as *mut i32) };
        if ret != ffi::OPUS_OK {
            return Err(Error::opus(ret));
        }
        Ok(slot)
    }

    fn set(&mut self, request: i32, value: i32) -> Result<()> {
        check_request(request, false)?;
        let ret = unsafe { ffi::opus_encoder_ctl(self.handle, request, value) };
        if ret != ffi::OPUS_OK {
            return Err(Error::opus(ret));
        }
        Ok(())
    }
}
