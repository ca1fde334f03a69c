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

//! Minimal FLAC writer for fixtures: fixed block size, independent channels and
//! verbatim subframes only.

use std::error::Error;
use std::path::Path;

/// Frames per FLAC block.
pub const BLOCK_SIZE: usize = 256;

const BLOCK_TYPE_STREAMINFO: u8 = 0;
const BLOCK_TYPE_APPLICATION: u8 = 2;

/// Stream parameters for a fixture file.
#[derive(Clone, Copy, Debug)]
pub struct FlacSpec {
    pub channels: u32,
    pub sample_rate: u32,
    pub bits_per_sample: u32,
}

struct BitWriter {
    bytes: Vec<u8>,
    current: u8,
    filled: u32,
}

impl BitWriter {
    fn new() -> Self {
        Self {
            bytes: Vec::new(),
            current: 0,
            filled: 0,
        }
    }

    fn write(&mut self, value: u64, bits: u32) {
        for i in (0..bits).rev() {
            self.current = (self.current << 1) | ((value >> i) & 1) as u8;
            self.filled += 1;
            if self.filled == 8 {
                self.bytes.push(self.current);
                self.current = 0;
                self.filled = 0;
            }
        }
    }

    fn align(&mut self) {
        while self.filled != 0 {
            self.write(0, 1);
        }
    }
}

fn crc8(data: &[u8]) -> u8 {
    let mut crc = 0u8;
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ 0x07
            } else {
                crc << 1
            };
        }
    }
    crc
}

fn crc16(data: &[u8]) -> u16 {
    let mut crc = 0u16;
    for &byte in data {
        crc ^= u16::from(byte) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x8005
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// Serializes one metadata block with its header.
pub fn metadata_block(block_type: u8, is_last: bool, data: &[u8]) -> Vec<u8> {
    let len = data.len() as u32;
    let mut block = vec![
        block_type | if is_last { 0x80 } else { 0 },
        (len >> 16) as u8,
        (len >> 8) as u8,
        len as u8,
    ];
    block.extend_from_slice(data);
    block
}

/// Body of an APPLICATION block carrying a RIFF `smpl` chunk.
pub fn riff_smpl_application(smpl_body: &[u8]) -> Vec<u8> {
    let mut data = b"riffsmpl".to_vec();
    data.extend_from_slice(&(smpl_body.len() as u32).to_le_bytes());
    data.extend_from_slice(smpl_body);
    data
}

fn streaminfo(spec: &FlacSpec, declared_frames: u64) -> Vec<u8> {
    let mut w = BitWriter::new();
    w.write(BLOCK_SIZE as u64, 16);
    w.write(BLOCK_SIZE as u64, 16);
    w.write(0, 24);
    w.write(0, 24);
    w.write(u64::from(spec.sample_rate), 20);
    w.write(u64::from(spec.channels - 1), 3);
    w.write(u64::from(spec.bits_per_sample - 1), 5);
    w.write(declared_frames, 36);
    w.write(0, 64);
    w.write(0, 64);
    w.bytes
}

fn frame(
    spec: &FlacSpec,
    number: usize,
    planes: &[Vec<i32>],
    start: usize,
    len: usize,
) -> Vec<u8> {
    assert!(number < 128, "frame numbers above 127 need multi-byte coding");
    let mut w = BitWriter::new();
    w.write(0b11_1111_1111_1110, 14);
    w.write(0, 1); // reserved
    w.write(0, 1); // fixed block size
    w.write(0b0111, 4); // 16 bit block size after the header
    w.write(0b0000, 4); // sample rate from STREAMINFO
    w.write(u64::from(spec.channels - 1), 4); // independent channels
    w.write(0b000, 3); // bits per sample from STREAMINFO
    w.write(0, 1); // reserved
    w.write(number as u64, 8);
    w.write((len - 1) as u64, 16);
    let crc = crc8(&w.bytes);
    w.write(u64::from(crc), 8);

    let bits = spec.bits_per_sample;
    let mask = (1u64 << bits) - 1;
    for plane in planes {
        w.write(0b0000_0010, 8); // verbatim, no wasted bits
        for &sample in &plane[start..start + len] {
            w.write(i64::from(sample) as u64 & mask, bits);
        }
    }
    w.align();
    let crc = crc16(&w.bytes);
    w.write(u64::from(crc), 16);
    w.bytes
}

/// Encodes planar samples. `declared_frames` is written to STREAMINFO as is,
/// so fixtures can disagree with the audio that follows.
pub fn encode(
    spec: &FlacSpec,
    planes: &[Vec<i32>],
    declared_frames: u64,
    application_blocks: &[Vec<u8>],
) -> Vec<u8> {
    let mut bytes = b"fLaC".to_vec();
    bytes.extend(metadata_block(
        BLOCK_TYPE_STREAMINFO,
        application_blocks.is_empty(),
        &streaminfo(spec, declared_frames),
    ));
    for (i, data) in application_blocks.iter().enumerate() {
        let is_last = i + 1 == application_blocks.len();
        bytes.extend(metadata_block(BLOCK_TYPE_APPLICATION, is_last, data));
    }

    let frames = planes.first().map_or(0, Vec::len);
    for (number, start) in (0..frames).step_by(BLOCK_SIZE).enumerate() {
        let len = BLOCK_SIZE.min(frames - start);
        bytes.extend(frame(spec, number, planes, start, len));
    }
    bytes
}

/// Writes a FLAC file whose STREAMINFO matches the audio, with an optional
/// embedded `smpl` chunk body.
pub fn write_flac(
    path: &Path,
    spec: FlacSpec,
    planes: &[Vec<i32>],
    smpl_body: Option<&[u8]>,
) -> Result<(), Box<dyn Error>> {
    let frames = planes.first().map_or(0, Vec::len) as u64;
    let applications: Vec<Vec<u8>> = smpl_body.map(riff_smpl_application).into_iter().collect();
    std::fs::write(path, encode(&spec, planes, frames, &applications))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc_check_values() {
        // Standard check values for "123456789".
        assert_eq!(crc8(b"123456789"), 0xF4);
        assert_eq!(crc16(b"123456789"), 0xFEE8);
    }

    #[test]
    fn test_streaminfo_is_34_bytes() {
        let spec = FlacSpec {
            channels: 2,
            sample_rate: 44100,
            bits_per_sample: 16,
        };
        assert_eq!(streaminfo(&spec, 1000).len(), 34);
    }
}
