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

//! Sample ingestion for a sampler.
//!
//! This crate provides:
//! - Whole-file decoding of FLAC and WAV into per-channel sample storage
//! - Loop and root key extraction from embedded RIFF `smpl` chunks
//! - A sample store that keeps placeholders for files that failed to decode
//! - A scan that lists those placeholders for relinking

pub mod config;
pub mod decode;
pub mod missing;
pub mod riff;
pub mod sample;
pub mod store;

#[cfg(test)]
mod testutil;

pub use decode::{decode_file, DecodeError, DecodePool, FormatDecoder};
pub use missing::{collect_missing_resolution_work_items, MissingResolutionWorkItem};
pub use sample::{
    BitDepth, LoopMetadata, PlayMode, Sample, SampleId, SampleMetadata, SampleStorage, SourceFormat,
};
pub use store::{SampleStore, SharedSampleStore};
