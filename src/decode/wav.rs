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
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use tracing::debug;

use super::error::DecodeError;
use super::stream::{decode_stream, SampleWriter};
use super::FormatDecoder;
use crate::riff::{self, SMPL_TAG};
use crate::sample::{Sample, SampleMetadata, SourceFormat};

/// `smpl` chunks larger than this are not sampler data worth reading.
const MAX_SMPL_CHUNK_LEN: u32 = 64 * 1024;

/// Decodes RIFF/WAVE files. The sampler chunk sits directly at the top level.
pub struct WavDecoder;

impl FormatDecoder for WavDecoder {
    fn format(&self) -> SourceFormat {
        SourceFormat::Wav
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["wav", "wave"]
    }

    fn matches_signature(&self, header: &[u8]) -> bool {
        header.len() >= 12 && &header[0..4] == b"RIFF" && &header[8..12] == b"WAVE"
    }

    fn decode(&self, path: &Path) -> Result<Sample, DecodeError> {
        let mut writer = SampleWriter::new();
        decode_stream(path, &mut writer)?;
        let audio = writer.finish()?;

        let metadata = read_smpl_chunk(path);
        Ok(Sample::decoded(path, SourceFormat::Wav, audio, metadata))
    }
}

fn read_smpl_chunk(path: &Path) -> SampleMetadata {
    let mut metadata = SampleMetadata::default();
    let result =
        File::open(path).and_then(|file| walk_chunks(&mut BufReader::new(file), &mut metadata));
    if let Err(e) = result {
        debug!(path = ?path, err = %e, "Stopped reading WAV chunks");
    }
    metadata
}

/// Walks the top-level chunks of a WAVE form until the end of the file.
fn walk_chunks<R: Read + Seek>(
    reader: &mut R,
    metadata: &mut SampleMetadata,
) -> std::io::Result<()> {
    let mut header = [0u8; 12];
    reader.read_exact(&mut header)?;
    if !WavDecoder.matches_signature(&header) {
        return Ok(());
    }

    loop {
        let mut chunk_header = [0u8; 8];
        match reader.read_exact(&mut chunk_header) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(()),
            Err(e) => return Err(e),
        }
        let size = u32::from_le_bytes([
            chunk_header[4],
            chunk_header[5],
            chunk_header[6],
            chunk_header[7],
        ]);
        // Chunks are padded to an even length.
        let padded = i64::from(size) + i64::from(size & 1);

        if chunk_header[0..4] == SMPL_TAG && size <= MAX_SMPL_CHUNK_LEN {
            let mut body = vec![0u8; size as usize];
            reader.read_exact(&mut body)?;
            if let Some(found) = riff::parse_smpl(&body) {
                *metadata = found;
            }
            reader.seek(SeekFrom::Current(padded - i64::from(size)))?;
        } else {
            reader.seek(SeekFrom::Current(padded))?;
        }
    }
}
