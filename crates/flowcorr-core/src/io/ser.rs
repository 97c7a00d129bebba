use std::fs::File;
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use memmap2::Mmap;
use ndarray::{s, Array4};

use crate::error::{FlowError, Result};
use crate::frame::{ImageStack, StackInfo};

pub const SER_HEADER_SIZE: usize = 178;
const SER_MAGIC: &[u8; 14] = b"LUCAM-RECORDER";

const COLOR_ID_RGB: i32 = 100;
const COLOR_ID_BGR: i32 = 101;

/// SER file header (178 bytes).
#[derive(Clone, Debug)]
pub struct SerHeader {
    pub color_id: i32,
    pub little_endian: bool,
    pub width: u32,
    pub height: u32,
    pub pixel_depth: u32,
    pub frame_count: u32,
}

impl SerHeader {
    /// Bytes per pixel plane (1 for 8-bit, 2 for 9-16 bit).
    pub fn bytes_per_pixel_plane(&self) -> usize {
        if self.pixel_depth <= 8 { 1 } else { 2 }
    }

    /// Number of planes per pixel (1 for mono/bayer, 3 for RGB/BGR).
    pub fn planes_per_pixel(&self) -> usize {
        match self.color_id {
            COLOR_ID_RGB | COLOR_ID_BGR => 3,
            _ => 1,
        }
    }

    /// Total bytes per frame, `None` on overflow.
    pub fn frame_byte_size(&self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)?
            .checked_mul(self.bytes_per_pixel_plane() * self.planes_per_pixel())
    }
}

/// Memory-mapped SER video reader.
pub struct SerReader {
    mmap: Mmap,
    frame_bytes: usize,
    pub header: SerHeader,
}

impl SerReader {
    /// Open a SER file and parse its header.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        // SAFETY: the mapping is read-only and lives as long as the reader.
        let mmap = unsafe { Mmap::map(&file)? };

        if mmap.len() < SER_HEADER_SIZE {
            return Err(FlowError::InvalidSer("File too small for SER header".into()));
        }
        if &mmap[0..14] != SER_MAGIC {
            return Err(FlowError::InvalidSer("Missing LUCAM-RECORDER magic".into()));
        }

        let header = parse_header(&mmap[..SER_HEADER_SIZE])?;
        let frame_bytes = header
            .frame_byte_size()
            .ok_or_else(|| FlowError::InvalidSer("Frame size overflows".into()))?;

        let expected = frame_bytes
            .checked_mul(header.frame_count as usize)
            .and_then(|n| n.checked_add(SER_HEADER_SIZE))
            .ok_or_else(|| FlowError::InvalidSer("Data size overflows".into()))?;
        if mmap.len() < expected {
            return Err(FlowError::InvalidSer(format!(
                "File truncated: expected at least {} bytes, got {}",
                expected,
                mmap.len()
            )));
        }

        Ok(Self {
            mmap,
            frame_bytes,
            header,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.header.frame_count as usize
    }

    /// Raw bytes of a single frame (zero-copy from mmap).
    pub fn frame_raw(&self, index: usize) -> Result<&[u8]> {
        let total = self.frame_count();
        if index >= total {
            return Err(FlowError::FrameIndexOutOfRange { index, total });
        }
        let offset = SER_HEADER_SIZE + index * self.frame_bytes;
        Ok(&self.mmap[offset..offset + self.frame_bytes])
    }

    /// Decode every frame into a stack scaled to `[0, 1]`.
    ///
    /// Mono and Bayer data become one channel (the raw mosaic); RGB and BGR
    /// become three channels in R, G, B order.
    pub fn read_stack(&self) -> Result<ImageStack> {
        let h = self.header.height as usize;
        let w = self.header.width as usize;
        let planes = self.header.planes_per_pixel();
        let mut data = Array4::<f32>::zeros((self.frame_count(), h, w, planes));

        for index in 0..self.frame_count() {
            let raw = self.frame_raw(index)?;
            for plane in 0..planes {
                let channel = if self.header.color_id == COLOR_ID_BGR {
                    planes - 1 - plane
                } else {
                    plane
                };
                let mut target = data.slice_mut(s![index, .., .., channel]);
                decode_plane(raw, &self.header, plane, |row, col, v| target[[row, col]] = v);
            }
        }

        ImageStack::new(data)
    }

    pub fn stack_info(&self, path: &Path) -> StackInfo {
        StackInfo {
            source: path.to_path_buf(),
            total_frames: self.frame_count(),
            width: self.header.width as usize,
            height: self.header.height as usize,
            channels: self.header.planes_per_pixel(),
            bit_depth: self.header.pixel_depth as u8,
        }
    }
}

fn parse_header(buf: &[u8]) -> Result<SerHeader> {
    let mut cursor = std::io::Cursor::new(&buf[14..]); // skip magic

    let _lu_id = cursor.read_i32::<LittleEndian>()?;
    let color_id = cursor.read_i32::<LittleEndian>()?;
    let le_flag = cursor.read_i32::<LittleEndian>()?;
    let width = cursor.read_i32::<LittleEndian>()?.max(0) as u32;
    let height = cursor.read_i32::<LittleEndian>()?.max(0) as u32;
    let pixel_depth = cursor.read_i32::<LittleEndian>()?.clamp(1, 16) as u32;
    let frame_count = cursor.read_i32::<LittleEndian>()?.max(0) as u32;

    if width == 0 || height == 0 {
        return Err(FlowError::InvalidDimensions { width, height });
    }

    // Most writers store 0 here for little-endian data; only 1 means big-endian.
    let little_endian = le_flag != 1;

    Ok(SerHeader {
        color_id,
        little_endian,
        width,
        height,
        pixel_depth,
        frame_count,
    })
}

/// Decode one interleaved plane, calling `put(row, col, value)` per pixel.
fn decode_plane(
    raw: &[u8],
    header: &SerHeader,
    plane: usize,
    mut put: impl FnMut(usize, usize, f32),
) {
    let h = header.height as usize;
    let w = header.width as usize;
    let bps = header.bytes_per_pixel_plane();
    let planes = header.planes_per_pixel();
    let max_val = ((1u32 << header.pixel_depth) - 1) as f32;

    for row in 0..h {
        for col in 0..w {
            let idx = ((row * w + col) * planes + plane) * bps;
            let val = if bps == 1 {
                raw[idx] as f32
            } else {
                let pair = [raw[idx], raw[idx + 1]];
                if header.little_endian {
                    u16::from_le_bytes(pair) as f32
                } else {
                    u16::from_be_bytes(pair) as f32
                }
            };
            put(row, col, val / max_val);
        }
    }
}
