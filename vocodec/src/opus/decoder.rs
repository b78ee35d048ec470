//! Opus decoder.

use std::ptr;

use tracing::{debug, trace, warn};

use super::ffi::{self, OpusDecoder as OpusDecoderHandle};
use super::{check_request, OpusSample, MAX_FRAME_SIZE};
use crate::ctl::Control;
use crate::error::{code, Error, Result};
use crate::pin::{self, PinSink, PinSource};

/// Opus decoder.
pub struct Decoder {
    sample_rate: i32,
    channels: i32,
    handle: *mut OpusDecoderHandle,
}

// Safety: the handle is owned exclusively and only used through &mut self.
unsafe impl Send for Decoder {}

impl Drop for Decoder {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            unsafe { ffi::opus_decoder_destroy(self.handle) };
            self.handle = ptr::null_mut();
            debug!(
                sample_rate = self.sample_rate,
                channels = self.channels,
                "opus: decoder destroyed"
            );
        }
    }
}

impl std::fmt::Debug for Decoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("opus::Decoder")
            .field("sample_rate", &self.sample_rate)
            .field("channels", &self.channels)
            .finish()
    }
}

impl Decoder {
    /// Creates a new Opus decoder.
    ///
    /// # Parameters
    /// - `sample_rate`: Sample rate to decode at (8000, 12000, 16000, 24000, or 48000)
    /// - `channels`: Number of channels (1 or 2)
    pub fn new(sample_rate: i32, channels: i32) -> Result<Self> {
        let mut error: i32 = 0;
        let handle = unsafe { ffi::opus_decoder_create(sample_rate, channels, &mut error) };

        if handle.is_null() || error != ffi::OPUS_OK {
            if !handle.is_null() {
                unsafe { ffi::opus_decoder_destroy(handle) };
            }
            let status = if error != ffi::OPUS_OK { error } else { code::CREATE_FAILED };
            warn!(
                sample_rate,
                channels,
                status,
                "opus: decoder create failed: {}",
                ffi::error_string(status)
            );
            return Err(Error::opus(status));
        }

        debug!(sample_rate, channels, "opus: decoder created");
        Ok(Self {
            sample_rate,
            channels,
            handle,
        })
    }

    /// Returns the sample rate.
    pub fn sample_rate(&self) -> i32 {
        self.sample_rate
    }

    /// Returns the number of channels.
    pub fn channels(&self) -> i32 {
        self.channels
    }

    /// Decodes one packet into `output`.
    ///
    /// Only the first `in_len` bytes of `input` are read. An absent input, or
    /// an `in_len` of zero, performs packet-loss concealment: libopus is
    /// handed a null data pointer and synthesizes `frame_size` samples.
    /// `fec` requests in-band forward error correction data.
    ///
    /// Returns the number of decoded samples per channel.
    pub fn decode<T, I, O>(
        &mut self,
        input: Option<&I>,
        in_len: usize,
        output: &mut O,
        frame_size: usize,
        fec: bool,
    ) -> Result<usize>
    where
        T: OpusSample,
        I: PinSource<u8> + ?Sized,
        O: PinSink<T> + ?Sized,
    {
        if let Some(buf) = input {
            if in_len > buf.source_len() {
                return Err(Error::BadArgument("input length exceeds input buffer"));
            }
        }
        if self.frame_samples(frame_size)? > output.sink_len() {
            return Err(Error::BadArgument("output shorter than frame"));
        }
        let input = input.filter(|_| in_len > 0);
        let len = match input {
            Some(_) => i32::try_from(in_len)
                .map_err(|_| Error::BadArgument("input length exceeds i32 range"))?,
            None => 0,
        };

        let data = pin::pin_optional(input)?;
        let mut pcm = pin::pin_mut(output)?;
        let n = unsafe {
            T::decode_raw(
                self.handle,
                data.as_ptr(),
                len,
                pcm.as_mut_ptr(),
                frame_size as i32,
                fec as i32,
            )
        };

        if n < 0 {
            return Err(Error::opus(n));
        }
        trace!(
            frame_size,
            samples = n,
            concealed = data.is_absent(),
            sample = T::NAME,
            "opus: decoded frame"
        );
        Ok(n as usize)
    }

    /// Interleaved sample count of a `frame_size` frame. The size must be
    /// nonzero and fit the native `int`.
    fn frame_samples(&self, frame_size: usize) -> Result<usize> {
        if frame_size == 0 || frame_size > i32::MAX as usize {
            return Err(Error::BadArgument("frame size out of range"));
        }
        frame_size
            .checked_mul(self.channels as usize)
            .ok_or(Error::BadArgument("frame size out of range"))
    }

    /// Decodes a packet into a freshly allocated, interleaved sample buffer.
    pub fn decode_vec<T: OpusSample>(&mut self, packet: &[u8], fec: bool) -> Result<Vec<T>> {
        let mut buf = vec![T::default(); self.frame_samples(MAX_FRAME_SIZE)?];
        let n = self.decode(Some(packet), packet.len(), &mut buf[..], MAX_FRAME_SIZE, fec)?;
        buf.truncate(n * self.channels as usize);
        Ok(buf)
    }

    /// Performs packet loss concealment (PLC) to generate samples when a packet is lost.
    pub fn conceal<T: OpusSample>(&mut self, frame_size: usize) -> Result<Vec<T>> {
        let mut buf = vec![T::default(); self.frame_samples(frame_size)?];
        let n = self.decode::<T, [u8], _>(None, 0, &mut buf[..], frame_size, false)?;
        buf.truncate(n * self.channels as usize);
        Ok(buf)
    }

    /// Returns the duration in samples of the last decoded or concealed packet.
    pub fn last_packet_duration(&mut self) -> Result<i32> {
        self.get(ffi::OPUS_GET_LAST_PACKET_DURATION_REQUEST)
    }

    /// Returns the final state of the range coder, for conformance checks.
    pub fn final_range(&mut self) -> Result<u32> {
        self.get(ffi::OPUS_GET_FINAL_RANGE_REQUEST).map(|v| v as u32)
    }

    /// Resets the codec state as if freshly created.
    pub fn reset(&mut self) -> Result<()> {
        self.set(ffi::OPUS_RESET_STATE, 0)
    }
}

impl Control for Decoder {
    fn get(&mut self, request: i32) -> Result<i32> {
        check_request(request, true)?;
        let mut slot: i32 = 0;
        let ret = unsafe { ffi::opus_decoder_ctl(self.handle, request, &mut slot as *mut i32) };
        if ret != ffi::OPUS_OK {
            return Err(Error::opus(ret));
        }
        Ok(slot)
    }

    fn set(&mut self, request: i32, value: i32) -> Result<()> {
        check_request(request, false)?;
        let ret = unsafe { ffi::opus_decoder_ctl(self.handle, request, value) };
        if ret != ffi::OPUS_OK {
            return Err(Error::opus(ret));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::encoder::Encoder;
    use crate::pin::testing::HostArray;

    #[test]
    fn test_decoder_create() {
        let decoder = Decoder::new(16000, 1);
        assert!(decoder.is_ok());
        let dec = decoder.unwrap();
        assert_eq!(dec.sample_rate(), 16000);
        assert_eq!(dec.channels(), 1);
    }

    #[test]
    fn test_decoder_create_bad_channels() {
        let err = Decoder::new(16000, 3).unwrap_err();
        assert_eq!(err.code(), ffi::OPUS_BAD_ARG);
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let mut encoder = Encoder::new_voip(16000, 1).unwrap();
        let mut decoder = Decoder::new(16000, 1).unwrap();

        let pcm: Vec<i16> = (0..320).map(|i| (i * 100 % 32768) as i16).collect();
        let frame = encoder.encode_vec(&pcm, 320).unwrap();
        let decoded: Vec<i16> = decoder.decode_vec(&frame, false).unwrap();
        assert_eq!(decoded.len(), 320);
        assert_eq!(decoder.last_packet_duration().unwrap(), 320);
    }

    #[test]
    fn test_decode_float_roundtrip() {
        let mut encoder = Encoder::new_audio(48000, 2).unwrap();
        let mut decoder = Decoder::new(48000, 2).unwrap();
        let pcm = vec![0.0f32; 960 * 2];
        let frame = encoder.encode_vec(&pcm, 960).unwrap();
        let decoded: Vec<f32> = decoder.decode_vec(&frame, false).unwrap();
        assert_eq!(decoded.len(), 960 * 2);
    }

    #[test]
    fn test_conceal_without_input() {
        let mut decoder = Decoder::new(8000, 1).unwrap();
        let samples: Vec<i16> = decoder.conceal(160).unwrap();
        assert_eq!(samples.len(), 160);
    }

    #[test]
    fn test_zero_length_input_is_concealment() {
        let mut decoder = Decoder::new(8000, 1).unwrap();
        let host = HostArray::<u8>::refusing(vec![0; 10]);
        let mut out = vec![0i16; 160];
        let n = decoder.decode(Some(&host), 0, &mut out[..], 160, true).unwrap();
        assert_eq!(n, 160);
        assert_eq!(host.pins(), 0);
    }

    #[test]
    fn test_decode_rejects_len_beyond_buffer() {
        let mut decoder = Decoder::new(8000, 1).unwrap();
        let packet = vec![0u8; 4];
        let mut out = vec![0i16; 160];
        let err = decoder.decode(Some(&packet[..]), 10, &mut out[..], 160, false).unwrap_err();
        assert_eq!(err, Error::BadArgument("input length exceeds input buffer"));
    }

    #[test]
    fn test_decode_rejects_short_output() {
        let mut decoder = Decoder::new(8000, 2).unwrap();
        let mut out = vec![0i16; 160];
        let err = decoder.decode::<i16, [u8], _>(None, 0, &mut out[..], 160, false).unwrap_err();
        assert_eq!(err, Error::BadArgument("output shorter than frame"));
    }

    #[test]
    fn test_decode_rejects_wrapping_frame_size() {
        let mut decoder = Decoder::new(8000, 2).unwrap();
        // Doubled for stereo, this wraps to 160 on 64-bit targets.
        let frame_size = (usize::MAX / 2) + 81;
        let mut out = HostArray::new(vec![0i16; 160]);
        let err = decoder
            .decode::<i16, [u8], _>(None, 0, &mut out, frame_size, false)
            .unwrap_err();
        assert_eq!(err, Error::BadArgument("frame size out of range"));
        assert_eq!(out.pins(), 0);

        let err = decoder
            .decode::<i16, [u8], _>(None, 0, &mut out, i32::MAX as usize + 1, false)
            .unwrap_err();
        assert_eq!(err, Error::BadArgument("frame size out of range"));
    }

    #[test]
    fn test_conceal_rejects_oversized_frame() {
        let mut decoder = Decoder::new(8000, 2).unwrap();
        let err = decoder.conceal::<i16>(usize::MAX / 2 + 81).unwrap_err();
        assert_eq!(err, Error::BadArgument("frame size out of range"));
        let err = decoder.conceal::<f32>(0).unwrap_err();
        assert_eq!(err, Error::BadArgument("frame size out of range"));
    }

    #[test]
    fn test_decode_output_pin_failure_releases_input() {
        let mut encoder = Encoder::new_voip(8000, 1).unwrap();
        let packet = encoder.encode_vec(&vec![0i16; 160], 160).unwrap();
        let mut decoder = Decoder::new(8000, 1).unwrap();

        let input = HostArray::new(packet.clone());
        let mut output = HostArray::<i16>::refusing(vec![0; 160]);
        let err = decoder.decode(Some(&input), packet.len(), &mut output, 160, false).unwrap_err();
        assert_eq!(err, Error::AllocationFailure);
        assert_eq!(input.releases(), 1);
    }

    #[test]
    fn test_decode_garbage_is_native_error() {
        let mut decoder = Decoder::new(8000, 1).unwrap();
        // Code 3 packet claiming zero frames is invalid.
        let packet = [0x03u8, 0x00];
        let mut out = vec![0i16; 160];
        let err = decoder.decode(Some(&packet[..]), 2, &mut out[..], 160, false).unwrap_err();
        assert_eq!(err.code(), ffi::OPUS_INVALID_PACKET);
    }

    #[test]
    fn test_final_range_and_reset() {
        let mut decoder = Decoder::new(8000, 1).unwrap();
        let _ = decoder.final_range().unwrap();
        decoder.reset().unwrap();
    }
}
