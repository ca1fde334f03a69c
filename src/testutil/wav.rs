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
use std::error::Error;
use std::fs::OpenOptions;
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};

/// Writes planar integer samples as an interleaved PCM WAV file.
pub fn write_wav_with_bits(
    path: &Path,
    planes: &[Vec<i32>],
    sample_rate: u32,
    bits_per_sample: u16,
) -> Result<(), Box<dyn Error>> {
    let mut writer = WavWriter::create(
        path,
        WavSpec {
            channels: planes.len() as u16,
            sample_rate,
            bits_per_sample,
            sample_format: SampleFormat::Int,
        },
    )?;

    let frames = planes.first().map_or(0, Vec::len);
    for frame in 0..frames {
        for plane in planes {
            writer.write_sample(plane[frame])?;
        }
    }
    writer.finalize()?;
    Ok(())
}

/// Writes a 32-bit float WAV file.
pub fn write_float_wav(
    path: &Path,
    samples: &[f32],
    sample_rate: u32,
) -> Result<(), Box<dyn Error>> {
    let mut writer = WavWriter::create(
        path,
        WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        },
    )?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Appends a top-level chunk to an existing RIFF file and fixes the RIFF size.
pub fn append_chunk(path: &Path, tag: &[u8; 4], body: &[u8]) -> Result<(), Box<dyn Error>> {
    let mut file = OpenOptions::new().read(true).write(true).open(path)?;
    file.seek(SeekFrom::End(0))?;
    file.write_all(tag)?;
    file.write_all(&(body.len() as u32).to_le_bytes())?;
    file.write_all(body)?;
    if body.len() % 2 == 1 {
        file.write_all(&[0])?;
    }

    let riff_size = file.metadata()?.len() - 8;
    file.seek(SeekFrom::Start(4))?;
    file.write_all(&(riff_size as u32).to_le_bytes())?;
    Ok(())
}
