//! Acoustic echo cancellation over speexdsp.
//!
//! An [`EchoCanceller`] learns the path from the loudspeaker signal (the
//! reference, or far end) to the microphone signal (the near end) and
//! subtracts the estimated echo from each captured frame.
//!
//! Two ways to feed it:
//!
//! - [`EchoCanceller::cancellation`] with both frames at once, when the
//!   caller already has them aligned.
//! - [`EchoCanceller::playback`] as frames go out to the speaker and
//!   [`EchoCanceller::capture`] as frames come in from the microphone. The
//!   engine buffers the reference internally.
//!
//! All frames are `frame_size` 16-bit samples.

pub mod ffi;

use std::os::raw::c_void;
use std::ptr;

use tracing::{debug, trace, warn};

use crate::error::{code, Error, Result};
use crate::pin::{self, PinSink, PinSource};

/// Lifecycle of an echo canceller. Dropping it is the destroyed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Created or reset, no frame processed yet.
    Initialized,
    /// At least one frame has been processed.
    Active,
}

/// Speexdsp echo canceller.
pub struct EchoCanceller {
    state: *mut ffi::SpeexEchoState,
    frame_size: usize,
    filter_length: usize,
    phase: Phase,
    played: bool,
}

// Safety: the state is owned exclusively and only used through &mut self.
unsafe impl Send for EchoCanceller {}

impl Drop for EchoCanceller {
    fn drop(&mut self) {
        if !self.state.is_null() {
            unsafe { ffi::speex_echo_state_destroy(self.state) };
            self.state = ptr::null_mut();
            debug!(frame_size = self.frame_size, "echo: state destroyed");
        }
    }
}

impl std::fmt::Debug for EchoCanceller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EchoCanceller")
            .field("frame_size", &self.frame_size)
            .field("filter_length", &self.filter_length)
            .field("phase", &self.phase)
            .finish()
    }
}

impl EchoCanceller {
    /// Creates an echo canceller.
    ///
    /// `frame_size` is the number of samples per processed frame, typically
    /// 10-20ms of audio. `filter_length` is the echo tail in samples,
    /// typically 100-500ms of audio.
    pub fn new(frame_size: i32, filter_length: i32) -> Result<Self> {
        if frame_size <= 0 || filter_length <= 0 {
            return Err(Error::BadArgument("frame_size and filter_length must be positive"));
        }

        let state = unsafe { ffi::speex_echo_state_init(frame_size, filter_length) };
        if state.is_null() {
            warn!(frame_size, filter_length, "echo: state init returned no state");
            return Err(Error::echo(code::CREATE_FAILED));
        }

        debug!(frame_size, filter_length, "echo: state created");
        Ok(Self {
            state,
            frame_size: frame_size as usize,
            filter_length: filter_length as usize,
            phase: Phase::Initialized,
            played: false,
        })
    }

    /// Creates an echo canceller and sets its sampling rate.
    pub fn with_sampling_rate(
        frame_size: i32,
        filter_length: i32,
        sample_rate: i32,
    ) -> Result<Self> {
        let mut echo = Self::new(frame_size, filter_length)?;
        echo.set_sampling_rate(sample_rate)?;
        Ok(echo)
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn filter_length(&self) -> usize {
        self.filter_length
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Cancels the echo of `reference` from `recorded`, writing the result to
    /// `out`. All three buffers must hold at least `frame_size` samples.
    pub fn cancellation<R, P, O>(&mut self, recorded: &R, reference: &P, out: &mut O) -> Result<()>
    where
        R: PinSource<i16> + ?Sized,
        P: PinSource<i16> + ?Sized,
        O: PinSink<i16> + ?Sized,
    {
        self.check_source(recorded)?;
        self.check_source(reference)?;
        self.check_sink(out)?;

        let rec = pin::pin(recorded)?;
        let play = pin::pin(reference)?;
        let mut dst = pin::pin_mut(out)?;
        unsafe {
            ffi::speex_echo_cancellation(self.state, rec.as_ptr(), play.as_ptr(), dst.as_mut_ptr())
        };

        self.phase = Phase::Active;
        trace!(frame_size = self.frame_size, "echo: cancelled frame");
        Ok(())
    }

    /// Queues one frame sent to the loudspeaker.
    pub fn playback<P>(&mut self, reference: &P) -> Result<()>
    where
        P: PinSource<i16> + ?Sized,
    {
        self.check_source(reference)?;

        let play = pin::pin(reference)?;
        unsafe { ffi::speex_echo_playback(self.state, play.as_ptr()) };

        self.played = true;
        self.phase = Phase::Active;
        trace!(frame_size = self.frame_size, "echo: queued playback frame");
        Ok(())
    }

    /// Cancels echo from one microphone frame using the queued playback.
    ///
    /// Capturing before any playback is allowed; the engine then cancels
    /// against silence.
    pub fn capture<R, O>(&mut self, recorded: &R, out: &mut O) -> Result<()>
    where
        R: PinSource<i16> + ?Sized,
        O: PinSink<i16> + ?Sized,
    {
        self.check_source(recorded)?;
        self.check_sink(out)?;
        if !self.played {
            debug!("echo: capture before any playback frame");
        }

        let rec = pin::pin(recorded)?;
        let mut dst = pin::pin_mut(out)?;
        unsafe { ffi::speex_echo_capture(self.state, rec.as_ptr(), dst.as_mut_ptr()) };

        self.phase = Phase::Active;
        trace!(frame_size = self.frame_size, "echo: captured frame");
        Ok(())
    }

    /// Clears the learned echo path and any queued playback.
    pub fn reset(&mut self) {
        unsafe { ffi::speex_echo_state_reset(self.state) };
        self.phase = Phase::Initialized;
        self.played = false;
        debug!(frame_size = self.frame_size, "echo: state reset");
    }

    pub fn set_sampling_rate(&mut self, sample_rate: i32) -> Result<()> {
        if sample_rate <= 0 {
            return Err(Error::BadArgument("sample_rate must be positive"));
        }
        let mut slot = sample_rate;
        self.ctl_slot(ffi::SPEEX_ECHO_SET_SAMPLING_RATE, &mut slot)
    }

    pub fn sampling_rate(&mut self) -> Result<i32> {
        let mut slot = 0;
        self.ctl_slot(ffi::SPEEX_ECHO_GET_SAMPLING_RATE, &mut slot)?;
        Ok(slot)
    }

    /// Runs a raw control request against the native state.
    ///
    /// # Safety
    ///
    /// `ptr` must point to storage of the type `request` reads or writes,
    /// valid for the duration of the call.
    pub unsafe fn ctl_raw(&mut self, request: i32, ptr: *mut c_void) -> Result<()> {
        let ret = unsafe { ffi::speex_echo_ctl(self.state, request, ptr) };
        if ret != 0 {
            return Err(Error::echo(ret));
        }
        Ok(())
    }

    fn ctl_slot(&mut self, request: i32, slot: &mut i32) -> Result<()> {
        unsafe { self.ctl_raw(request, slot as *mut i32 as *mut c_void) }
    }

    fn check_source<B: PinSource<i16> + ?Sized>(&self, buf: &B) -> Result<()> {
        if buf.source_len() < self.frame_size {
            return Err(Error::BadArgument("echo frame shorter than frame_size"));
        }
        Ok(())
    }

    fn check_sink<B: PinSink<i16> + ?Sized>(&self, buf: &B) -> Result<()> {
        if buf.sink_len() < self.frame_size {
            return Err(Error::BadArgument("echo output shorter than frame_size"));
        }
        Ok(())
    }
}
