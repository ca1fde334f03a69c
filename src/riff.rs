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

//! Loop and tuning extraction from RIFF `smpl` chunks.
//!
//! The chunk can appear directly in a WAVE file or repackaged inside another
//! container (FLAC stores foreign RIFF chunks in APPLICATION blocks). Parsing is
//! field by field over little-endian bytes. Anything truncated or malformed
//! yields no metadata rather than an error, since auxiliary data must never
//! fail the audio decode.

use crate::sample::{LoopMetadata, PlayMode, SampleMetadata};

/// Tag of the sampler chunk.
pub const SMPL_TAG: [u8; 4] = *b"smpl";

/// Size of the fixed sampler record.
pub const SAMPLER_CHUNK_LEN: usize = 36;

/// Size of one loop record.
pub const SAMPLE_LOOP_LEN: usize = 24;

/// Loop type value for a ping-pong loop.
const LOOP_TYPE_BIDIRECTIONAL: u32 = 1;

/// Bounds checked little-endian reader over a byte slice.
pub(crate) struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub(crate) fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(len)?;
        let bytes = self.data.get(self.pos..end)?;
        self.pos = end;
        Some(bytes)
    }

    pub(crate) fn tag(&mut self) -> Option<[u8; 4]> {
        self.take(4)?.try_into().ok()
    }

    pub(crate) fn u32_le(&mut self) -> Option<u32> {
        Some(u32::from_le_bytes(self.tag()?))
    }

    /// Returns the unread remainder without advancing.
    pub(crate) fn rest(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }
}

/// The fixed part of a `smpl` chunk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SamplerChunk {
    pub manufacturer: u32,
    pub product: u32,
    pub sample_period: u32,
    pub midi_unity_note: u32,
    pub midi_pitch_fraction: u32,
    pub smpte_format: u32,
    pub smpte_offset: u32,
    pub sample_loops: u32,
    pub sampler_data: u32,
}

impl SamplerChunk {
    fn read(reader: &mut ByteReader<'_>) -> Option<SamplerChunk> {
        let mut record = ByteReader::new(reader.take(SAMPLER_CHUNK_LEN)?);
        Some(SamplerChunk {
            manufacturer: record.u32_le()?,
            product: record.u32_le()?,
            sample_period: record.u32_le()?,
            midi_unity_note: record.u32_le()?,
            midi_pitch_fraction: record.u32_le()?,
            smpte_format: record.u32_le()?,
            smpte_offset: record.u32_le()?,
            sample_loops: record.u32_le()?,
            sampler_data: record.u32_le()?,
        })
    }
}

/// One loop record following the sampler chunk. `end` is inclusive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SampleLoop {
    pub identifier: u32,
    pub loop_type: u32,
    pub start: u32,
    pub end: u32,
    pub fraction: u32,
    pub play_count: u32,
}

impl SampleLoop {
    fn read(reader: &mut ByteReader<'_>) -> Option<SampleLoop> {
        let mut record = ByteReader::new(reader.take(SAMPLE_LOOP_LEN)?);
        Some(SampleLoop {
            identifier: record.u32_le()?,
            loop_type: record.u32_le()?,
            start: record.u32_le()?,
            end: record.u32_le()?,
            fraction: record.u32_le()?,
            play_count: record.u32_le()?,
        })
    }

    /// Converts to the exclusive-end loop used by samples. Returns `None` when
    /// the record describes an empty or inverted range.
    fn to_loop_metadata(self) -> Option<LoopMetadata> {
        let mode = if self.loop_type == LOOP_TYPE_BIDIRECTIONAL {
            PlayMode::ForwardLoopBidirectional
        } else {
            PlayMode::ForwardLoop
        };
        LoopMetadata::new(self.start, self.end.checked_add(1)?, mode)
    }
}

/// Parses the body of a `smpl` chunk (the bytes after tag and size).
///
/// Only the first loop is used. A body too short for the records it declares
/// produces `None`.
pub fn parse_smpl(body: &[u8]) -> Option<SampleMetadata> {
    let mut reader = ByteReader::new(body);
    let sampler = SamplerChunk::read(&mut reader)?;

    let loop_meta = if sampler.sample_loops > 0 {
        SampleLoop::read(&mut reader)?.to_loop_metadata()
    } else {
        None
    };

    Some(SampleMetadata {
        loop_meta,
        root_key: Some((sampler.midi_unity_note & 0xFF) as u8),
    })
}

/// Parses a repackaged RIFF chunk: a 4 byte tag, a 4 byte little-endian size
/// and the chunk body. Chunks other than `smpl` are ignored.
///
/// The size field is not trusted; the body runs to the end of the region.
pub fn metadata_from_repackaged_chunk(region: &[u8]) -> Option<SampleMetadata> {
    let mut reader = ByteReader::new(region);
    if reader.tag()? != SMPL_TAG {
        return None;
    }
    reader.u32_le()?;
    parse_smpl(reader.rest())
}
