//! Integer-handle surface for hosts that cannot hold Rust values.
//!
//! A managed runtime keeps codec contexts as opaque 64-bit integers. The
//! [`Registry`] owns the contexts and hands out generational handles: the low
//! 32 bits hold the slot index plus one, the high 32 bits the slot's
//! generation. Destroying a context bumps the generation, so a stale copy of
//! the handle, a second destroy or a forged value is reported as
//! [`Error::InvalidHandle`] and never reaches freed native memory.
//!
//! Every operation returns the signed result-code convention of
//! [`crate::error::to_code`]: non-negative counts on success, negative error
//! kinds on failure. Rust callers that do not need integer handles should use
//! the owned contexts in [`crate::opus`], [`crate::speex`] and
//! [`crate::echo`] directly.
//!
//! The registry has no internal locking; it is a plain value that the host
//! adapter owns and serialises.

use std::os::raw::c_void;

use tracing::{debug, warn};

use crate::ctl::Control;
use crate::echo::EchoCanceller;
use crate::error::{code, to_code, Error, Result};
use crate::opus::{self, Application, OpusSample};
use crate::pin::{PinSink, PinSource};
use crate::speex::{self, SpeexSample};

macro_rules! handle_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(i64);

        impl $name {
            /// The value returned in place of a handle when creation fails.
            pub const NULL: Self = Self(0);

            /// Wraps a raw integer received from the host.
            pub fn from_raw(raw: i64) -> Self {
                Self(raw)
            }

            /// Returns the raw integer handed to the host.
            pub fn into_raw(self) -> i64 {
                self.0
            }

            pub fn is_null(self) -> bool {
                self.0 == 0
            }
        }
    };
}

handle_type!(
    /// Handle to an encoder context.
    EncoderHandle
);
handle_type!(
    /// Handle to a decoder context.
    DecoderHandle
);
handle_type!(
    /// Handle to an echo canceller.
    EchoHandle
);

fn pack(index: usize, generation: u32) -> i64 {
    ((generation as i64) << 32) | (index as i64 + 1)
}

fn unpack(raw: i64) -> Option<(usize, u32)> {
    let low = (raw & 0xffff_ffff) as usize;
    if low == 0 {
        return None;
    }
    Some((low - 1, (raw >> 32) as u32))
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Slots with generation counters and a free list.
struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<usize>,
    live: usize,
}

impl<T> Arena<T> {
    fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    fn insert(&mut self, value: T) -> i64 {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.value = Some(value);
            return pack(index, slot.generation);
        }
        self.slots.push(Slot {
            generation: 1,
            value: Some(value),
        });
        pack(self.slots.len() - 1, 1)
    }

    fn get_mut(&mut self, raw: i64) -> Result<&mut T> {
        let (index, generation) = unpack(raw).ok_or(Error::InvalidHandle)?;
        match self.slots.get_mut(index) {
            Some(slot) if slot.generation == generation => {
                slot.value.as_mut().ok_or(Error::InvalidHandle)
            }
            _ => Err(Error::InvalidHandle),
        }
    }

    fn remove(&mut self, raw: i64) -> Result<T> {
        let (index, generation) = unpack(raw).ok_or(Error::InvalidHandle)?;
        let slot = match self.slots.get_mut(index) {
            Some(slot) if slot.generation == generation => slot,
            _ => return Err(Error::InvalidHandle),
        };
        let value = slot.value.take().ok_or(Error::InvalidHandle)?;
        // Generation 0 is never issued, so wrap past it.
        slot.generation = slot.generation.wrapping_add(1).max(1);
        self.free.push(index);
        self.live -= 1;
        Ok(value)
    }

    fn len(&self) -> usize {
        self.live
    }
}

/// An encoder of either family.
#[derive(Debug)]
pub enum EncoderContext {
    Opus(opus::Encoder),
    Speex(speex::Encoder),
}

impl EncoderContext {
    /// Encodes one frame. See [`opus::Encoder::encode`] and
    /// [`speex::Encoder::encode`].
    pub fn encode<T, I, O>(
        &mut self,
        input: &I,
        frame_size: usize,
        output: &mut O,
        out_cap: usize,
    ) -> Result<usize>
    where
        T: OpusSample + SpeexSample,
        I: PinSource<T> + ?Sized,
        O: PinSink<u8> + ?Sized,
    {
        match self {
            Self::Opus(enc) => enc.encode::<T, I, O>(input, frame_size, output, out_cap),
            Self::Speex(enc) => enc.encode::<T, I, O>(input, frame_size, output, out_cap),
        }
    }
}

impl Control for EncoderContext {
    fn get(&mut self, request: i32) -> Result<i32> {
        match self {
            Self::Opus(enc) => enc.get(request),
            Self::Speex(enc) => enc.get(request),
        }
    }

    fn set(&mut self, request: i32, value: i32) -> Result<()> {
        match self {
            Self::Opus(enc) => enc.set(request, value),
            Self::Speex(enc) => enc.set(request, value),
        }
    }
}

/// A decoder of either family.
#[derive(Debug)]
pub enum DecoderContext {
    Opus(opus::Decoder),
    Speex(speex::Decoder),
}

impl DecoderContext {
    /// Decodes one frame. See [`opus::Decoder::decode`] and
    /// [`speex::Decoder::decode`]; `conceal` is the FEC flag for opus and
    /// enables packet-loss concealment for speex.
    pub fn decode<T, I, O>(
        &mut self,
        input: Option<&I>,
        in_len: usize,
        output: &mut O,
        frame_size: usize,
        conceal: bool,
    ) -> Result<usize>
    where
        T: OpusSample + SpeexSample,
        I: PinSource<u8> + ?Sized,
        O: PinSink<T> + ?Sized,
    {
        match self {
            Self::Opus(dec) => dec.decode::<T, I, O>(input, in_len, output, frame_size, conceal),
            Self::Speex(dec) => dec.decode::<T, I, O>(input, in_len, output, frame_size, conceal),
        }
    }
}

impl Control for DecoderContext {
    fn get(&mut self, request: i32) -> Result<i32> {
        match self {
            Self::Opus(dec) => dec.get(request),
            Self::Speex(dec) => dec.get(request),
        }
    }

    fn set(&mut self, request: i32, value: i32) -> Result<()> {
        match self {
            Self::Opus(dec) => dec.set(request, value),
            Self::Speex(dec) => dec.set(request, value),
        }
    }
}

fn status(result: Result<()>) -> i32 {
    match result {
        Ok(()) => code::OK,
        Err(e) => e.code(),
    }
}

/// Owner of every context created through the integer-handle surface.
pub struct Registry {
    encoders: Arena<EncoderContext>,
    decoders: Arena<DecoderContext>,
    echoes: Arena<EchoCanceller>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            encoders: Arena::new(),
            decoders: Arena::new(),
            echoes: Arena::new(),
        }
    }

    /// Number of live contexts of all kinds.
    pub fn len(&self) -> usize {
        self.encoders.len() + self.decoders.len() + self.echoes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ---- encoders ----

    /// Creates an opus encoder. `application` is the raw libopus application
    /// code. Returns the handle (null on failure) and the libopus status.
    pub fn encoder_create_opus(
        &mut self,
        sample_rate: i32,
        channels: i32,
        application: i32,
    ) -> (EncoderHandle, i32) {
        let Some(application) = Application::from_ffi(application) else {
            return (EncoderHandle::NULL, opus::ffi::OPUS_BAD_ARG);
        };
        self.add_encoder(
            opus::Encoder::new(sample_rate, channels, application).map(EncoderContext::Opus),
        )
    }

    /// Creates a speex encoder for mode id 0 (NB), 1 (WB) or 2 (UWB).
    pub fn encoder_create_speex(&mut self, mode_id: i32) -> (EncoderHandle, i32) {
        self.add_encoder(speex::Encoder::from_mode_id(mode_id).map(EncoderContext::Speex))
    }

    fn add_encoder(&mut self, created: Result<EncoderContext>) -> (EncoderHandle, i32) {
        match created {
            Ok(ctx) => {
                let handle = EncoderHandle(self.encoders.insert(ctx));
                debug!(handle = handle.0, "registry: encoder issued");
                (handle, code::OK)
            }
            Err(e) => (EncoderHandle::NULL, e.code()),
        }
    }

    /// Destroys an encoder, freeing its native state.
    pub fn encoder_destroy(&mut self, handle: EncoderHandle) -> i32 {
        match self.encoders.remove(handle.0) {
            Ok(ctx) => {
                drop(ctx);
                debug!(handle = handle.0, "registry: encoder released");
                code::OK
            }
            Err(e) => {
                warn!(handle = handle.0, "registry: destroy of unknown encoder");
                e.code()
            }
        }
    }

    /// Borrows the context behind an encoder handle.
    pub fn encoder(&mut self, handle: EncoderHandle) -> Result<&mut EncoderContext> {
        self.encoders.get_mut(handle.0).inspect_err(|_| {
            warn!(handle = handle.0, "registry: stale encoder handle");
        })
    }

    /// Encodes one frame. Returns the packet length or a negative code.
    pub fn encode<T, I, O>(
        &mut self,
        handle: EncoderHandle,
        input: &I,
        frame_size: usize,
        output: &mut O,
        out_cap: usize,
    ) -> i32
    where
        T: OpusSample + SpeexSample,
        I: PinSource<T> + ?Sized,
        O: PinSink<u8> + ?Sized,
    {
        to_code(
            self.encoder(handle)
                .and_then(|ctx| ctx.encode::<T, I, O>(input, frame_size, output, out_cap)),
        )
    }

    /// Reads an encoder parameter. Returns the value and a status.
    pub fn encoder_get_ctl(&mut self, handle: EncoderHandle, request: i32) -> (i32, i32) {
        match self.encoder(handle).and_then(|ctx| ctx.get(request)) {
            Ok(value) => (value, code::OK),
            Err(e) => (0, e.code()),
        }
    }

    /// Writes an encoder parameter. Returns a status.
    pub fn encoder_set_ctl(&mut self, handle: EncoderHandle, request: i32, value: i32) -> i32 {
        status(self.encoder(handle).and_then(|ctx| ctx.set(request, value)))
    }

    // ---- decoders ----

    /// Creates an opus decoder. Returns the handle and the libopus status.
    pub fn decoder_create_opus(&mut self, sample_rate: i32, channels: i32) -> (DecoderHandle, i32) {
        self.add_decoder(opus::Decoder::new(sample_rate, channels).map(DecoderContext::Opus))
    }

    /// Creates a speex decoder for mode id 0 (NB), 1 (WB) or 2 (UWB).
    pub fn decoder_create_speex(&mut self, mode_id: i32, enhance: bool) -> (DecoderHandle, i32) {
        self.add_decoder(speex::Decoder::from_mode_id(mode_id, enhance).map(DecoderContext::Speex))
    }

    fn add_decoder(&mut self, created: Result<DecoderContext>) -> (DecoderHandle, i32) {
        match created {
            Ok(ctx) => {
                let handle = DecoderHandle(self.decoders.insert(ctx));
                debug!(handle = handle.0, "registry: decoder issued");
                (handle, code::OK)
            }
            Err(e) => (DecoderHandle::NULL, e.code()),
        }
    }

    /// Destroys a decoder, freeing its native state.
    pub fn decoder_destroy(&mut self, handle: DecoderHandle) -> i32 {
        match self.decoders.remove(handle.0) {
            Ok(ctx) => {
                drop(ctx);
                debug!(handle = handle.0, "registry: decoder released");
                code::OK
            }
            Err(e) => {
                warn!(handle = handle.0, "registry: destroy of unknown decoder");
                e.code()
            }
        }
    }

    /// Borrows the context behind a decoder handle.
    pub fn decoder(&mut self, handle: DecoderHandle) -> Result<&mut DecoderContext> {
        self.decoders.get_mut(handle.0).inspect_err(|_| {
            warn!(handle = handle.0, "registry: stale decoder handle");
        })
    }

    /// Decodes one frame. Returns samples per channel or a negative code.
    pub fn decode<T, I, O>(
        &mut self,
        handle: DecoderHandle,
        input: Option<&I>,
        in_len: usize,
        output: &mut O,
        frame_size: usize,
        conceal: bool,
    ) -> i32
    where
        T: OpusSample + SpeexSample,
        I: PinSource<u8> + ?Sized,
        O: PinSink<T> + ?Sized,
    {
        to_code(
            self.decoder(handle)
                .and_then(|ctx| ctx.decode::<T, I, O>(input, in_len, output, frame_size, conceal)),
        )
    }

    /// Reads a decoder parameter. Returns the value and a status.
    pub fn decoder_get_ctl(&mut self, handle: DecoderHandle, request: i32) -> (i32, i32) {
        match self.decoder(handle).and_then(|ctx| ctx.get(request)) {
            Ok(value) => (value, code::OK),
            Err(e) => (0, e.code()),
        }
    }

    /// Writes a decoder parameter. Returns a status.
    pub fn decoder_set_ctl(&mut self, handle: DecoderHandle, request: i32, value: i32) -> i32 {
        status(self.decoder(handle).and_then(|ctx| ctx.set(request, value)))
    }

    // ---- echo cancellers ----

    /// Creates an echo canceller. Returns the handle (null on failure) and a
    /// status.
    pub fn echo_init(&mut self, frame_size: i32, filter_length: i32) -> (EchoHandle, i32) {
        match EchoCanceller::new(frame_size, filter_length) {
            Ok(echo) => {
                let handle = EchoHandle(self.echoes.insert(echo));
                debug!(handle = handle.0, "registry: echo canceller issued");
                (handle, code::OK)
            }
            Err(e) => (EchoHandle::NULL, e.code()),
        }
    }

    /// Destroys an echo canceller.
    pub fn echo_destroy(&mut self, handle: EchoHandle) -> i32 {
        match self.echoes.remove(handle.0) {
            Ok(echo) => {
                drop(echo);
                debug!(handle = handle.0, "registry: echo canceller released");
                code::OK
            }
            Err(e) => {
                warn!(handle = handle.0, "registry: destroy of unknown echo canceller");
                e.code()
            }
        }
    }

    /// Borrows the echo canceller behind a handle.
    pub fn echo(&mut self, handle: EchoHandle) -> Result<&mut EchoCanceller> {
        self.echoes.get_mut(handle.0).inspect_err(|_| {
            warn!(handle = handle.0, "registry: stale echo handle");
        })
    }

    pub fn echo_reset(&mut self, handle: EchoHandle) -> i32 {
        status(self.echo(handle).map(|echo| echo.reset()))
    }

    pub fn echo_playback<P>(&mut self, handle: EchoHandle, reference: &P) -> i32
    where
        P: PinSource<i16> + ?Sized,
    {
        status(self.echo(handle).and_then(|echo| echo.playback(reference)))
    }

    pub fn echo_capture<R, O>(&mut self, handle: EchoHandle, recorded: &R, out: &mut O) -> i32
    where
        R: PinSource<i16> + ?Sized,
        O: PinSink<i16> + ?Sized,
    {
        status(self.echo(handle).and_then(|echo| echo.capture(recorded, out)))
    }

    pub fn echo_cancellation<R, P, O>(
        &mut self,
        handle: EchoHandle,
        recorded: &R,
        reference: &P,
        out: &mut O,
    ) -> i32
    where
        R: PinSource<i16> + ?Sized,
        P: PinSource<i16> + ?Sized,
        O: PinSink<i16> + ?Sized,
    {
        status(self.echo(handle).and_then(|echo| echo.cancellation(recorded, reference, out)))
    }

    /// Runs a raw echo control request.
    ///
    /// # Safety
    ///
    /// Same contract as [`EchoCanceller::ctl_raw`].
    pub unsafe fn echo_ctl(&mut self, handle: EchoHandle, request: i32, ptr: *mut c_void) -> i32 {
        status(self.echo(handle).and_then(|echo| unsafe { echo.ctl_raw(request, ptr) }))
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("encoders", &self.encoders.len())
            .field("decoders", &self.decoders.len())
            .field("echoes", &self.echoes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opus::ffi::{
        OPUS_APPLICATION_VOIP, OPUS_GET_BITRATE_REQUEST, OPUS_GET_LAST_PACKET_DURATION_REQUEST,
        OPUS_SET_BITRATE_REQUEST,
    };

    #[test]
    fn test_pack_unpack() {
        let raw = pack(5, 7);
        assert_eq!(unpack(raw), Some((5, 7)));
        assert_eq!(unpack(0), None);
    }

    #[test]
    fn test_arena_reuses_slot_with_new_generation() {
        let mut arena = Arena::new();
        let a = arena.insert("a");
        assert_eq!(arena.remove(a).unwrap(), "a");
        let b = arena.insert("b");
        assert_ne!(a, b);
        assert_eq!(arena.get_mut(a).unwrap_err(), Error::InvalidHandle);
        assert_eq!(*arena.get_mut(b).unwrap(), "b");
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_create_and_destroy_opus() {
        let mut reg = Registry::new();
        let (enc, status) = reg.encoder_create_opus(8000, 1, OPUS_APPLICATION_VOIP);
        assert_eq!(status, 0);
        assert!(!enc.is_null());
        let (dec, status) = reg.decoder_create_opus(8000, 1);
        assert_eq!(status, 0);
        assert_eq!(reg.len(), 2);

        assert_eq!(reg.encoder_destroy(enc), 0);
        assert_eq!(reg.decoder_destroy(dec), 0);
        assert!(reg.is_empty());
    }

    #[test]
    fn test_create_failure_returns_null_handle() {
        let mut reg = Registry::new();
        let (enc, status) = reg.encoder_create_opus(44100, 1, OPUS_APPLICATION_VOIP);
        assert!(enc.is_null());
        assert_eq!(status, crate::opus::ffi::OPUS_BAD_ARG);

        let (enc, status) = reg.encoder_create_opus(8000, 1, 1234);
        assert!(enc.is_null());
        assert_eq!(status, crate::opus::ffi::OPUS_BAD_ARG);

        let (dec, status) = reg.decoder_create_speex(9, false);
        assert!(dec.is_null());
        assert_eq!(status, code::BAD_ARG);
        assert!(reg.is_empty());
    }

    #[test]
    fn test_double_destroy_is_invalid_handle() {
        let mut reg = Registry::new();
        let (enc, _) = reg.encoder_create_speex(0);
        assert_eq!(reg.encoder_destroy(enc), 0);
        assert_eq!(reg.encoder_destroy(enc), code::INVALID_STATE);
    }

    #[test]
    fn test_stale_handle_after_slot_reuse() {
        let mut reg = Registry::new();
        let (old, _) = reg.encoder_create_speex(0);
        reg.encoder_destroy(old);
        let (new, _) = reg.encoder_create_speex(1);

        let pcm = vec![0i16; 160];
        let mut out = vec![0u8; 200];
        assert_eq!(reg.encode(old, &pcm[..], 160, &mut out[..], 200), code::INVALID_STATE);
        let pcm = vec![0i16; 320];
        assert!(reg.encode(new, &pcm[..], 320, &mut out[..], 200) > 0);
    }

    #[test]
    fn test_forged_handles() {
        let mut reg = Registry::new();
        assert_eq!(reg.encoder_destroy(EncoderHandle::NULL), code::INVALID_STATE);
        assert_eq!(
            reg.decoder_destroy(DecoderHandle::from_raw(0x7fff_0000_0001)),
            code::INVALID_STATE
        );
        assert_eq!(reg.echo_reset(EchoHandle::from_raw(-1)), code::INVALID_STATE);
    }

    #[test]
    fn test_handle_spaces_are_separate() {
        let mut reg = Registry::new();
        let (enc, _) = reg.encoder_create_speex(0);
        // Same raw value, different kind: no decoder lives there.
        let as_decoder = DecoderHandle::from_raw(enc.into_raw());
        assert_eq!(reg.decoder_destroy(as_decoder), code::INVALID_STATE);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_ctl_through_registry() {
        let mut reg = Registry::new();
        let (enc, _) = reg.encoder_create_opus(16000, 1, OPUS_APPLICATION_VOIP);
        assert_eq!(reg.encoder_set_ctl(enc, OPUS_SET_BITRATE_REQUEST, 24000), 0);
        assert_eq!(reg.encoder_get_ctl(enc, OPUS_GET_BITRATE_REQUEST), (24000, 0));
        // A GET code used as a SET is refused.
        assert_eq!(reg.encoder_set_ctl(enc, OPUS_GET_BITRATE_REQUEST, 1), code::BAD_ARG);
    }

    #[test]
    fn test_decoder_ctl_through_registry() {
        let mut reg = Registry::new();

        let (dec, _) = reg.decoder_create_speex(0, true);
        assert_eq!(reg.decoder_get_ctl(dec, speex::ffi::SPEEX_GET_ENH), (1, code::OK));
        assert_eq!(reg.decoder_set_ctl(dec, speex::ffi::SPEEX_SET_ENH, 0), code::OK);
        assert_eq!(reg.decoder_get_ctl(dec, speex::ffi::SPEEX_GET_ENH), (0, code::OK));
        assert_eq!(reg.decoder_set_ctl(dec, speex::ffi::SPEEX_SET_ENH, 1), code::OK);
        assert_eq!(reg.decoder_get_ctl(dec, speex::ffi::SPEEX_GET_ENH), (1, code::OK));
        assert_eq!(
            reg.decoder_get_ctl(dec, speex::ffi::SPEEX_GET_STACK),
            (0, code::BAD_ARG)
        );

        let (enc, _) = reg.encoder_create_opus(8000, 1, OPUS_APPLICATION_VOIP);
        let pcm = vec![0i16; 160];
        let mut packet = vec![0u8; 1000];
        let n = reg.encode::<i16, _, _>(enc, &pcm[..], 160, &mut packet[..], 1000);
        assert!(n > 0);

        let (dec, _) = reg.decoder_create_opus(8000, 1);
        let mut out = vec![0i16; 160];
        let decoded =
            reg.decode::<i16, _, _>(dec, Some(&packet[..]), n as usize, &mut out[..], 160, false);
        assert_eq!(decoded, 160);
        assert_eq!(
            reg.decoder_get_ctl(dec, OPUS_GET_LAST_PACKET_DURATION_REQUEST),
            (160, code::OK)
        );
    }

    #[test]
    fn test_speex_decode_through_registry() {
        let mut reg = Registry::new();
        let (dec, _) = reg.decoder_create_speex(0, true);
        let mut out = vec![0i16; 160];
        assert_eq!(reg.decode::<i16, [u8], _>(dec, None, 0, &mut out[..], 160, true), 160);
        assert_eq!(
            reg.decode::<i16, [u8], _>(dec, None, 0, &mut out[..], 160, false),
            code::BAD_ARG
        );
        assert_eq!(
            reg.decode::<i16, [u8], _>(dec, None, 0, &mut out[..], 100, true),
            code::FRAME_SIZE_MISMATCH
        );
    }

    #[test]
    fn test_echo_through_registry() {
        let mut reg = Registry::new();
        let (echo, status) = reg.echo_init(160, 1024);
        assert_eq!(status, 0);
        let frame = vec![0i16; 160];
        let mut out = vec![0i16; 160];
        assert_eq!(reg.echo_capture(echo, &frame[..], &mut out[..]), 0);
        assert_eq!(reg.echo_playback(echo, &frame[..]), 0);
        assert_eq!(reg.echo_cancellation(echo, &frame[..], &frame[..], &mut out[..]), 0);
        assert_eq!(reg.echo_reset(echo), 0);

        let mut rate = 0i32;
        let status = unsafe {
            reg.echo_ctl(
                echo,
                crate::echo::ffi::SPEEX_ECHO_GET_SAMPLING_RATE,
                &mut rate as *mut i32 as *mut c_void,
            )
        };
        assert_eq!(status, 0);
        assert!(rate > 0);

        assert_eq!(reg.echo_destroy(echo), 0);
        assert_eq!(reg.echo_playback(echo, &frame[..]), code::INVALID_STATE);
        assert_eq!(reg.echo_init(0, 1024).1, code::BAD_ARG);
    }
}
