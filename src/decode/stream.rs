// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Whole-file streaming decode.
//!
//! The codec is driven to the end of the stream. Stream info is handed to a
//! [`SampleWriter`] once, followed by decoded blocks in stream order. The writer
//! owns the storage and the write cursor; storage only leaves the writer once
//! every declared frame has been written.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::SampleFormat;
use symphonia::default::{get_codecs, get_probe};
use tracing::debug;

use super::error::DecodeError;
use crate::sample::{BitDepth, DecodedAudio, SampleStorage};

/// Format-native parameters reported before any audio.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamInfo {
    pub channels: usize,
    pub sample_rate: u32,
    pub bits_per_sample: u32,
    pub total_frames: u64,
}

/// Receives stream info and decoded blocks, writing them into storage allocated
/// once from the declared length.
#[derive(Debug, Default)]
pub struct SampleWriter {
    info: Option<StreamInfo>,
    storage: Option<SampleStorage>,
    cursor: usize,
    aborted: bool,
}

impl SampleWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the stream parameters and allocates every channel.
    pub fn begin(&mut self, info: StreamInfo) -> Result<(), DecodeError> {
        if self.info.is_some() {
            debug!("Ignoring repeated stream info");
            return Ok(());
        }

        let result = Self::allocate(&info);
        match result {
            Ok(storage) => {
                self.storage = Some(storage);
                self.info = Some(info);
                Ok(())
            }
            Err(e) => {
                self.aborted = true;
                Err(e)
            }
        }
    }

    fn allocate(info: &StreamInfo) -> Result<SampleStorage, DecodeError> {
        if !(1..=2).contains(&info.channels) {
            return Err(DecodeError::UnsupportedChannels(info.channels));
        }
        let bit_depth = BitDepth::for_source_bits(info.bits_per_sample)
            .ok_or(DecodeError::UnsupportedBitDepth(info.bits_per_sample))?;
        // Loop points are 32-bit frame indices, so longer streams are not
        // addressable.
        if info.total_frames == 0 || info.total_frames > u64::from(u32::MAX) {
            return Err(DecodeError::InvalidLength(info.total_frames));
        }
        let frames = usize::try_from(info.total_frames)
            .map_err(|_| DecodeError::InvalidLength(info.total_frames))?;

        SampleStorage::allocate(bit_depth, info.channels, frames)
            .map_err(|source| DecodeError::AllocationFailed { frames, source })
    }

    /// Writes one block of raw integer samples, one plane per channel, at the
    /// current cursor. Any failure aborts the writer and later blocks are
    /// refused.
    pub fn write_block(&mut self, planes: &[Vec<i32>], frames: usize) -> Result<(), DecodeError> {
        if self.aborted {
            return Err(DecodeError::Aborted);
        }
        let result = self.write_planes(planes, frames);
        if result.is_err() {
            self.aborted = true;
        }
        result
    }

    fn write_planes(&mut self, planes: &[Vec<i32>], frames: usize) -> Result<(), DecodeError> {
        let (Some(info), Some(storage)) = (self.info, self.storage.as_mut()) else {
            return Err(DecodeError::NotStarted);
        };
        if planes.len() != info.channels {
            return Err(DecodeError::UnsupportedChannels(planes.len()));
        }

        let length = storage.frames();
        let end = self.cursor + frames;
        if end > length || planes.iter().any(|plane| plane.len() < frames) {
            return Err(DecodeError::Overrun {
                cursor: self.cursor,
                frames,
                length,
            });
        }

        let bits = info.bits_per_sample;
        match storage {
            SampleStorage::I16(channels) => {
                for (dest, plane) in channels.iter_mut().zip(planes) {
                    for (d, &s) in dest[self.cursor..end].iter_mut().zip(plane) {
                        *d = to_i16(s, bits);
                    }
                }
            }
            SampleStorage::F32(channels) => {
                for (dest, plane) in channels.iter_mut().zip(planes) {
                    for (d, &s) in dest[self.cursor..end].iter_mut().zip(plane) {
                        *d = to_f32(s, bits);
                    }
                }
            }
        }
        self.cursor = end;

        Ok(())
    }

    /// Frames written so far.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Releases the storage once every declared frame has been written.
    pub fn finish(self) -> Result<DecodedAudio, DecodeError> {
        if self.aborted {
            return Err(DecodeError::Aborted);
        }
        let (Some(info), Some(storage)) = (self.info, self.storage) else {
            return Err(DecodeError::NotStarted);
        };
        if self.cursor != storage.frames() {
            return Err(DecodeError::LengthMismatch {
                declared: storage.frames(),
                decoded: self.cursor,
            });
        }

        Ok(DecodedAudio {
            sample_rate: info.sample_rate,
            storage,
        })
    }
}

/// Widens a raw sample of at most 16 bits to full 16-bit scale.
#[inline]
pub(crate) fn to_i16(raw: i32, bits_per_sample: u32) -> i16 {
    (raw << (16 - bits_per_sample)) as i16
}

/// Normalizes a raw 24 or 32 bit sample by 2^24 or 2^32.
#[inline]
pub(crate) fn to_f32(raw: i32, bits_per_sample: u32) -> f32 {
    if bits_per_sample == 24 {
        raw as f32 / (1i64 << 24) as f32
    } else {
        (f64::from(raw) / (1i64 << 32) as f64) as f32
    }
}

/// Decodes the whole file at `path`, feeding `writer`.
pub(crate) fn decode_stream(path: &Path, writer: &mut SampleWriter) -> Result<(), DecodeError> {
    let file = File::open(path).map_err(|source| DecodeError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(extension);
    }

    let probed = get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format_reader = probed.format;

    let track = format_reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(DecodeError::NoAudioTrack)?;
    let track_id = track.id;
    let params = track.codec_params.clone();

    if matches!(
        params.sample_format,
        Some(SampleFormat::F32) | Some(SampleFormat::F64)
    ) {
        return Err(DecodeError::UnsupportedFormat(
            "floating point sample data".to_string(),
        ));
    }

    let info = StreamInfo {
        channels: params
            .channels
            .map(|c| c.count())
            .ok_or(DecodeError::MissingStreamInfo("channel count"))?,
        sample_rate: params
            .sample_rate
            .ok_or(DecodeError::MissingStreamInfo("sample rate"))?,
        bits_per_sample: params
            .bits_per_sample
            .ok_or(DecodeError::MissingStreamInfo("bits per sample"))?,
        total_frames: params.n_frames.unwrap_or(0),
    };
    debug!(path = ?path, ?info, "Stream info");
    writer.begin(info)?;

    let mut decoder = get_codecs().make(&params, &DecoderOptions::default())?;
    let mut planes: Vec<Vec<i32>> = vec![Vec::new(); info.channels];

    loop {
        let packet = match format_reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => return Err(e.into()),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = decoder.decode(&packet)?;
        let frames = raw_planes(decoded, info.bits_per_sample, &mut planes)?;
        if frames > 0 {
            writer.write_block(&planes, frames)?;
        }
    }

    Ok(())
}

/// Copies a decoded buffer into signed integer planes at the source bit depth.
/// Returns the number of frames copied.
fn raw_planes(
    decoded: AudioBufferRef,
    bits_per_sample: u32,
    planes: &mut Vec<Vec<i32>>,
) -> Result<usize, DecodeError> {
    let frames = match decoded {
        AudioBufferRef::S8(buf) => copy_planes(&buf, 8, bits_per_sample, planes, i32::from),
        AudioBufferRef::S16(buf) => copy_planes(&buf, 16, bits_per_sample, planes, i32::from),
        AudioBufferRef::S24(buf) => copy_planes(&buf, 24, bits_per_sample, planes, |s| s.inner()),
        AudioBufferRef::S32(buf) => copy_planes(&buf, 32, bits_per_sample, planes, |s| s),
        AudioBufferRef::U8(buf) => {
            copy_planes(&buf, 8, bits_per_sample, planes, |s| i32::from(s) - 0x80)
        }
        AudioBufferRef::U16(buf) => {
            copy_planes(&buf, 16, bits_per_sample, planes, |s| i32::from(s) - 0x8000)
        }
        AudioBufferRef::U24(buf) => copy_planes(&buf, 24, bits_per_sample, planes, |s| {
            s.inner() as i32 - 0x80_0000
        }),
        AudioBufferRef::U32(buf) => copy_planes(&buf, 32, bits_per_sample, planes, |s| {
            (i64::from(s) - 0x8000_0000) as i32
        }),
        AudioBufferRef::F32(_) | AudioBufferRef::F64(_) => {
            return Err(DecodeError::UnsupportedFormat(
                "floating point sample data".to_string(),
            ))
        }
    };
    Ok(frames)
}

/// Decoded buffers are full scale for their sample type; shifting right by the
/// unused width recovers the raw value at the source bit depth.
fn copy_planes<T, F>(
    buf: &AudioBuffer<T>,
    width: u32,
    bits_per_sample: u32,
    planes: &mut Vec<Vec<i32>>,
    convert: F,
) -> usize
where
    T: symphonia::core::sample::Sample,
    F: Fn(T) -> i32,
{
    let shift = width.saturating_sub(bits_per_sample);
    let channels = buf.spec().channels.count();
    planes.resize_with(channels, Vec::new);
    for (ch, plane) in planes.iter_mut().enumerate() {
        plane.clear();
        plane.extend(buf.chan(ch).iter().map(|&s| convert(s) >> shift));
    }
    buf.frames()
}
