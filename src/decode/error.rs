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
use std::path::PathBuf;

/// Error types for decode operations
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Unable to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Audio file error: {0}")]
    Audio(#[from] symphonia::core::errors::Error),

    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("No audio track found")]
    NoAudioTrack,

    #[error("Stream info is missing the {0}")]
    MissingStreamInfo(&'static str),

    #[error("Unsupported bit depth: {0}")]
    UnsupportedBitDepth(u32),

    #[error("Unsupported channel count: {0}")]
    UnsupportedChannels(usize),

    #[error("Declared length of {0} frames is invalid")]
    InvalidLength(u64),

    #[error("Unable to allocate {frames} frames: {source}")]
    AllocationFailed {
        frames: usize,
        #[source]
        source: std::collections::TryReserveError,
    },

    #[error("Block of {frames} frames at frame {cursor} overruns the declared length of {length}")]
    Overrun {
        cursor: usize,
        frames: usize,
        length: usize,
    },

    #[error("Stream declared {declared} frames but {decoded} were decoded")]
    LengthMismatch { declared: usize, decoded: usize },

    #[error("Audio block received before stream info")]
    NotStarted,

    #[error("Stream was aborted")]
    Aborted,
}
