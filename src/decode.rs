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

//! Format decoders and the table that dispatches files to them.
//!
//! Each decoder turns a path into a fully populated [`Sample`] or an error. A
//! decode runs to completion on the calling thread; separate files can be
//! decoded in parallel on a [`DecodePool`].

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::{debug, info};

use crate::sample::{Sample, SourceFormat};

pub mod error;
pub mod flac;
pub mod stream;
pub mod wav;


pub use error::DecodeError;
pub use flac::FlacDecoder;
pub use stream::{SampleWriter, StreamInfo};
pub use wav::WavDecoder;

/// Number of leading bytes read to recognize a file signature.
const SIGNATURE_LEN: usize = 12;

/// A decoder for one container format.
pub trait FormatDecoder: Send + Sync {
    /// The format tag recorded on decoded samples.
    fn format(&self) -> SourceFormat;

    /// Lowercase file extensions used when the signature is not recognized.
    fn extensions(&self) -> &'static [&'static str];

    /// Whether the leading bytes of a file belong to this format.
    fn matches_signature(&self, header: &[u8]) -> bool;

    /// Decodes the whole file.
    fn decode(&self, path: &Path) -> Result<Sample, DecodeError>;
}

/// Every supported format, in lookup order.
static DECODERS: &[&dyn FormatDecoder] = &[&FlacDecoder, &WavDecoder];

/// Selects a decoder for the file, first by signature and then by extension.
pub fn decoder_for_path(path: &Path) -> Result<&'static dyn FormatDecoder, DecodeError> {
    let mut header = Vec::with_capacity(SIGNATURE_LEN);
    File::open(path)
        .and_then(|file| file.take(SIGNATURE_LEN as u64).read_to_end(&mut header))
        .map_err(|source| DecodeError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    if let Some(decoder) = DECODERS.iter().find(|d| d.matches_signature(&header)) {
        return Ok(*decoder);
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    extension
        .as_deref()
        .and_then(|ext| {
            DECODERS
                .iter()
                .find(|d| d.extensions().contains(&ext))
                .copied()
        })
        .ok_or_else(|| DecodeError::UnsupportedFormat(path.display().to_string()))
}

/// Decodes a file with whichever decoder recognizes it.
pub fn decode_file(path: &Path) -> Result<Sample, DecodeError> {
    let decoder = decoder_for_path(path)?;
    debug!(path = ?path, format = %decoder.format(), "Decoding sample");

    let sample = decoder.decode(path)?;
    info!(
        path = ?path,
        format = %decoder.format(),
        channels = sample.channels(),
        sample_rate = sample.sample_rate(),
        frames = sample.sample_length(),
        bit_depth = ?sample.bit_depth(),
        loop_meta = ?sample.loop_meta(),
        root_key = ?sample.root_key(),
        "Sample decoded"
    );
    Ok(sample)
}

/// Thread pool for decoding several files at once. Each decode owns its file
/// handle and its buffer, so the decodes share nothing.
pub struct DecodePool {
    pool: rayon::ThreadPool,
}

impl DecodePool {
    /// Creates a new pool with the given number of worker threads.
    pub fn new(num_threads: usize) -> Result<Self, rayon::ThreadPoolBuildError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(num_threads.max(1))
            .thread_name(|i| format!("sample-decode-{i}"))
            .build()?;
        Ok(Self { pool })
    }

    /// Creates a pool sized to the machine.
    pub fn with_default_threads() -> Result<Self, rayon::ThreadPoolBuildError> {
        Self::new(num_cpus::get())
    }

    /// Decodes every path, returning results in input order.
    pub fn decode_all(&self, paths: &[PathBuf]) -> Vec<Result<Sample, DecodeError>> {
        self.pool
            .install(|| paths.par_iter().map(|path| decode_file(path)).collect())
    }
}

impl std::fmt::Debug for DecodePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodePool")
            .field("threads", &self.pool.current_num_threads())
            .finish()
    }
}
