use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use ndarray::{s, Array3, Array4};
use tiff::decoder::{Decoder, DecodingResult};
use tiff::ColorType;
use tracing::debug;

use crate::error::{FlowError, Result};
use crate::frame::{ImageStack, StackInfo};

/// Channels kept, samples stored per pixel and bits per sample of a page.
fn page_layout(color: ColorType) -> Option<(usize, usize, u8)> {
    match color {
        ColorType::Gray(bits) => Some((1, 1, bits)),
        ColorType::GrayA(bits) => Some((1, 2, bits)),
        ColorType::RGB(bits) => Some((3, 3, bits)),
        ColorType::RGBA(bits) => Some((3, 4, bits)),
        _ => None,
    }
}

/// Convert one decoded page buffer to `[0, 1]` samples.
fn page_samples(page: DecodingResult) -> Option<Vec<f32>> {
    Some(match page {
        DecodingResult::U8(v) => v.into_iter().map(|x| x as f32 / 255.0).collect(),
        DecodingResult::U16(v) => v.into_iter().map(|x| x as f32 / 65535.0).collect(),
        DecodingResult::U32(v) => v
            .into_iter()
            .map(|x| (x as f64 / u32::MAX as f64) as f32)
            .collect(),
        DecodingResult::F32(v) => v,
        DecodingResult::F64(v) => v.into_iter().map(|x| x as f32).collect(),
        _ => return None,
    })
}

/// Read every page of a TIFF file as one frame of a stack.
///
/// Single-sample pages give one channel, RGB pages give three; alpha is
/// dropped. Every page must share the first page's size and layout.
pub fn load_tiff_stack(path: &Path) -> Result<(ImageStack, StackInfo)> {
    let mut decoder = Decoder::new(BufReader::new(File::open(path)?))?;

    let (width, height) = decoder.dimensions()?;
    let first_color = decoder.colortype()?;
    let (channels, stride, bits) = page_layout(first_color).ok_or_else(|| {
        FlowError::UnsupportedInput(format!(
            "{}: unsupported TIFF colour type {:?}",
            path.display(),
            first_color
        ))
    })?;
    let (h, w) = (height as usize, width as usize);

    let mut pages: Vec<Array3<f32>> = Vec::new();
    loop {
        let dims = decoder.dimensions()?;
        if dims != (width, height) {
            return Err(FlowError::ShapeMismatch {
                expected: (h, w),
                found: (dims.1 as usize, dims.0 as usize),
            });
        }
        let color = decoder.colortype()?;
        if color != first_color {
            return Err(FlowError::UnsupportedInput(format!(
                "{}: page {} is {:?}, expected {:?}",
                path.display(),
                pages.len(),
                color,
                first_color
            )));
        }

        let samples = page_samples(decoder.read_image()?).ok_or_else(|| {
            FlowError::UnsupportedInput(format!(
                "{}: unsupported TIFF sample format",
                path.display()
            ))
        })?;
        if samples.len() < h * w * stride {
            return Err(FlowError::UnsupportedInput(format!(
                "{}: page {} holds {} samples, expected {}",
                path.display(),
                pages.len(),
                samples.len(),
                h * w * stride
            )));
        }
        pages.push(Array3::from_shape_fn((h, w, channels), |(row, col, ch)| {
            samples[(row * w + col) * stride + ch]
        }));

        if !decoder.more_images() {
            break;
        }
        decoder.next_image()?;
    }

    let mut data = Array4::<f32>::zeros((pages.len(), h, w, channels));
    for (i, page) in pages.iter().enumerate() {
        data.slice_mut(s![i, .., .., ..]).assign(page);
    }
    debug!(frames = pages.len(), width = w, height = h, channels, "Decoded TIFF pages");

    let stack = ImageStack::new(data)?;
    let info = StackInfo {
        source: path.to_path_buf(),
        total_frames: stack.frame_count(),
        width: stack.width(),
        height: stack.height(),
        channels: stack.channel_count(),
        bit_depth: bits,
    };
    Ok((stack, info))
}
