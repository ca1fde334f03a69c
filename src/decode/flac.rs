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
use crate::riff;
use crate::sample::{Sample, SampleMetadata, SourceFormat};

/// Stream marker at the start of every FLAC file.
const FLAC_MARKER: [u8; 4] = *b"fLaC";

/// APPLICATION metadata block type.
const BLOCK_TYPE_APPLICATION: u8 = 2;

/// Block type 127 is invalid and marks a corrupt header.
const BLOCK_TYPE_INVALID: u8 = 127;

/// Application id used for foreign RIFF chunks.
const RIFF_APPLICATION_ID: [u8; 4] = *b"riff";

/// Decodes FLAC files, picking up loop and root key data from RIFF `smpl`
/// chunks carried in APPLICATION blocks.
pub struct FlacDecoder;

impl FormatDecoder for FlacDecoder {
    fn format(&self) -> SourceFormat {
        SourceFormat::Flac
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["flac"]
    }

    fn matches_signature(&self, header: &[u8]) -> bool {
        header.starts_with(&FLAC_MARKER)
    }

    fn decode(&self, path: &Path) -> Result<Sample, DecodeError> {
        let mut writer = SampleWriter::new();
        decode_stream(path, &mut writer)?;
        let audio = writer.finish()?;

        let metadata = read_embedded_metadata(path);
        Ok(Sample::decoded(path, SourceFormat::Flac, audio, metadata))
    }
}

/// Second, metadata-only pass over the file. Failures leave the metadata
/// absent; whatever was found before a failure is kept.
fn read_embedded_metadata(path: &Path) -> SampleMetadata {
    let mut metadata = SampleMetadata::default();
    let result = File::open(path)
        .and_then(|file| walk_metadata_blocks(&mut BufReader::new(file), &mut metadata));
    if let Err(e) = result {
        debug!(path = ?path, err = %e, "Stopped reading FLAC metadata blocks");
    }
    metadata
}

/// Walks the top-level metadata blocks, applying every embedded `smpl` chunk
/// in file order.
fn walk_metadata_blocks<R: Read + Seek>(
    reader: &mut R,
    metadata: &mut SampleMetadata,
) -> std::io::Result<()> {
    let mut marker = [0u8; 4];
    reader.read_exact(&mut marker)?;
    if marker.starts_with(b"ID3") {
        skip_id3v2(reader, &marker)?;
        reader.read_exact(&mut marker)?;
    }
    if marker != FLAC_MARKER {
        return Ok(());
    }

    loop {
        let mut header = [0u8; 4];
        reader.read_exact(&mut header)?;
        let is_last = header[0] & 0x80 != 0;
        let block_type = header[0] & 0x7F;
        let length = u32::from_be_bytes([0, header[1], header[2], header[3]]) as usize;

        match block_type {
            BLOCK_TYPE_INVALID => return Ok(()),
            BLOCK_TYPE_APPLICATION => {
                let mut block = vec![0u8; length];
                reader.read_exact(&mut block)?;
                if let Some(found) = application_block_metadata(&block) {
                    *metadata = found;
                }
            }
            _ => {
                reader.seek(SeekFrom::Current(length as i64))?;
            }
        }

        if is_last {
            return Ok(());
        }
    }
}

/// Extracts metadata from an APPLICATION block body (id + data).
fn application_block_metadata(block: &[u8]) -> Option<SampleMetadata> {
    let mut reader = riff::ByteReader::new(block);
    if reader.tag()? != RIFF_APPLICATION_ID {
        return None;
    }
    riff::metadata_from_repackaged_chunk(reader.rest())
}

/// Skips an ID3v2 tag whose first four bytes have already been read.
fn skip_id3v2<R: Read + Seek>(reader: &mut R, first: &[u8; 4]) -> std::io::Result<()> {
    // Remaining header: minor version, flags, 4 byte syncsafe size.
    let mut rest = [0u8; 6];
    reader.read_exact(&mut rest)?;
    let footer = if rest[1] & 0x10 != 0 { 10 } else { 0 };
    let size = rest[2..6]
        .iter()
        .fold(0i64, |acc, &b| (acc << 7) | i64::from(b & 0x7F));
    debug!(major = first[3], size, "Skipping ID3v2 tag");
    reader.seek(SeekFrom::Current(size + footer))?;
    Ok(())
}
