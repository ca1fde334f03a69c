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

//! The canonical in-memory sample representation.
//!
//! Every decoder converges on [`Sample`]. A sample either carries fully decoded
//! audio or is a placeholder for a file that could not be decoded; there is no
//! partially written state.

use std::collections::TryReserveError;
use std::fmt;
use std::path::{Path, PathBuf};

/// Identifies a sample within a store.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SampleId(String);

impl SampleId {
    pub fn new(id: impl Into<String>) -> SampleId {
        SampleId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SampleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SampleId {
    fn from(id: &str) -> Self {
        SampleId::new(id)
    }
}

/// The storage class selected from the source bit depth.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BitDepth {
    /// Sources of 16 bits or fewer.
    I16,
    /// 24 and 32 bit sources, normalized into floating range.
    F32,
}

impl BitDepth {
    /// Picks the storage class for a source bit depth, or `None` if the depth
    /// has no storage mapping.
    pub fn for_source_bits(bits_per_sample: u32) -> Option<BitDepth> {
        match bits_per_sample {
            1..=16 => Some(BitDepth::I16),
            24 | 32 => Some(BitDepth::F32),
            _ => None,
        }
    }
}

/// The container format a sample was decoded from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceFormat {
    Flac,
    Wav,
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFormat::Flac => write!(f, "FLAC"),
            SourceFormat::Wav => write!(f, "WAV"),
        }
    }
}

/// How the voice engine should traverse the sample.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlayMode {
    #[default]
    Forward,
    ForwardLoop,
    ForwardLoopBidirectional,
}

/// A sustain loop. `end` is exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoopMetadata {
    pub start: u32,
    pub end: u32,
    pub mode: PlayMode,
}

impl LoopMetadata {
    /// Builds a loop from an exclusive range, rejecting empty or inverted ranges.
    pub fn new(start: u32, end: u32, mode: PlayMode) -> Option<LoopMetadata> {
        (end > start).then_some(LoopMetadata { start, end, mode })
    }

    /// Frames covered by one pass of the loop.
    pub fn frames(&self) -> u32 {
        self.end - self.start
    }
}

/// Loop and tuning data carried by auxiliary chunks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SampleMetadata {
    pub loop_meta: Option<LoopMetadata>,
    pub root_key: Option<u8>,
}

/// Per-channel decoded audio. The variant is the bit depth class, so the
/// storage can never disagree with it.
#[derive(Clone, Debug, PartialEq)]
pub enum SampleStorage {
    I16(Vec<Vec<i16>>),
    F32(Vec<Vec<f32>>),
}

impl SampleStorage {
    /// Allocates zeroed storage for every channel, sized to `frames`. Fails
    /// instead of aborting when the allocator cannot satisfy the request.
    pub fn allocate(
        bit_depth: BitDepth,
        channels: usize,
        frames: usize,
    ) -> Result<SampleStorage, TryReserveError> {
        Ok(match bit_depth {
            BitDepth::I16 => SampleStorage::I16(zeroed_channels(channels, frames)?),
            BitDepth::F32 => SampleStorage::F32(zeroed_channels(channels, frames)?),
        })
    }

    pub fn bit_depth(&self) -> BitDepth {
        match self {
            SampleStorage::I16(_) => BitDepth::I16,
            SampleStorage::F32(_) => BitDepth::F32,
        }
    }

    pub fn channel_count(&self) -> usize {
        match self {
            SampleStorage::I16(channels) => channels.len(),
            SampleStorage::F32(channels) => channels.len(),
        }
    }

    /// Frames per channel.
    pub fn frames(&self) -> usize {
        match self {
            SampleStorage::I16(channels) => channels.first().map_or(0, Vec::len),
            SampleStorage::F32(channels) => channels.first().map_or(0, Vec::len),
        }
    }

    fn memory_size(&self) -> usize {
        let per_sample = match self {
            SampleStorage::I16(_) => std::mem::size_of::<i16>(),
            SampleStorage::F32(_) => std::mem::size_of::<f32>(),
        };
        self.frames() * self.channel_count() * per_sample
    }
}

fn zeroed_channels<T: Clone + Default>(
    channels: usize,
    frames: usize,
) -> Result<Vec<Vec<T>>, TryReserveError> {
    let mut planes = Vec::new();
    planes.try_reserve_exact(channels)?;
    for _ in 0..channels {
        let mut plane = Vec::new();
        plane.try_reserve_exact(frames)?;
        plane.resize(frames, T::default());
        planes.push(plane);
    }
    Ok(planes)
}

/// Decoded audio plus the stream parameters it was decoded with.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedAudio {
    pub sample_rate: u32,
    pub storage: SampleStorage,
}

/// A sample as held by the sample store.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    path: PathBuf,
    format: Option<SourceFormat>,
    instrument: u32,
    region: u32,
    audio: Option<DecodedAudio>,
    metadata: SampleMetadata,
}

impl Sample {
    /// Creates a decoded sample. Instrument and region are zeroed, matching a
    /// sample loaded straight from a file.
    pub fn decoded(
        path: &Path,
        format: SourceFormat,
        audio: DecodedAudio,
        metadata: SampleMetadata,
    ) -> Sample {
        Sample {
            path: path.to_path_buf(),
            format: Some(format),
            instrument: 0,
            region: 0,
            audio: Some(audio),
            metadata,
        }
    }

    /// Creates a placeholder for a file that is referenced but has no audio.
    pub fn missing_placeholder(path: &Path) -> Sample {
        Sample {
            path: path.to_path_buf(),
            format: None,
            instrument: 0,
            region: 0,
            audio: None,
            metadata: SampleMetadata::default(),
        }
    }

    pub fn is_missing_placeholder(&self) -> bool {
        self.audio.is_none()
    }

    /// The file this sample was (or should have been) decoded from.
    pub fn file_name(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> Option<SourceFormat> {
        self.format
    }

    pub fn instrument(&self) -> u32 {
        self.instrument
    }

    pub fn region(&self) -> u32 {
        self.region
    }

    /// Channel count, zero for placeholders.
    pub fn channels(&self) -> usize {
        self.audio.as_ref().map_or(0, |a| a.storage.channel_count())
    }

    /// Sample rate, zero for placeholders.
    pub fn sample_rate(&self) -> u32 {
        self.audio.as_ref().map_or(0, |a| a.sample_rate)
    }

    /// Frames per channel, zero for placeholders.
    pub fn sample_length(&self) -> usize {
        self.audio.as_ref().map_or(0, |a| a.storage.frames())
    }

    pub fn bit_depth(&self) -> Option<BitDepth> {
        self.audio.as_ref().map(|a| a.storage.bit_depth())
    }

    pub fn storage(&self) -> Option<&SampleStorage> {
        self.audio.as_ref().map(|a| &a.storage)
    }

    /// The 16-bit samples of a channel. `None` for placeholders, out of range
    /// channels, or float storage.
    pub fn channel_i16(&self, channel: usize) -> Option<&[i16]> {
        match self.storage()? {
            SampleStorage::I16(channels) => channels.get(channel).map(Vec::as_slice),
            SampleStorage::F32(_) => None,
        }
    }

    /// The float samples of a channel. `None` for placeholders, out of range
    /// channels, or 16-bit storage.
    pub fn channel_f32(&self, channel: usize) -> Option<&[f32]> {
        match self.storage()? {
            SampleStorage::F32(channels) => channels.get(channel).map(Vec::as_slice),
            SampleStorage::I16(_) => None,
        }
    }

    pub fn metadata(&self) -> &SampleMetadata {
        &self.metadata
    }

    pub fn loop_meta(&self) -> Option<LoopMetadata> {
        self.metadata.loop_meta
    }

    pub fn root_key(&self) -> Option<u8> {
        self.metadata.root_key
    }

    /// Returns the memory size of the decoded audio in bytes.
    pub fn memory_size(&self) -> usize {
        self.audio.as_ref().map_or(0, |a| a.storage.memory_size())
    }
}
