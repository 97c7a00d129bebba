use std::path::{Path, PathBuf};

use image::{ColorType, DynamicImage};
use ndarray::{s, Array3, Array4};
use tracing::debug;

use crate::error::{FlowError, Result};
use crate::frame::ImageStack;

/// Extensions accepted as single-frame images in a sequence.
pub const IMAGE_EXTENSIONS: &[&str] = &["tif", "tiff", "png", "jpg", "jpeg", "bmp"];

pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Load one image as `(height, width, channels)` scaled to `[0, 1]`.
///
/// Grayscale images give one channel, anything with colour gives three
/// (R, G, B); alpha is dropped.
pub fn load_frame(path: &Path) -> Result<Array3<f32>> {
    let img = image::open(path)?;
    Ok(frame_channels(&img))
}

fn frame_channels(img: &DynamicImage) -> Array3<f32> {
    let (w, h) = (img.width() as usize, img.height() as usize);
    let is_gray = matches!(
        img.color(),
        ColorType::L8 | ColorType::L16 | ColorType::La8 | ColorType::La16
    );

    if is_gray {
        let gray = img.to_luma16();
        Array3::from_shape_fn((h, w, 1), |(row, col, _)| {
            gray.get_pixel(col as u32, row as u32).0[0] as f32 / 65535.0
        })
    } else {
        let rgb = img.to_rgb16();
        Array3::from_shape_fn((h, w, 3), |(row, col, ch)| {
            rgb.get_pixel(col as u32, row as u32).0[ch] as f32 / 65535.0
        })
    }
}

/// Load image files as consecutive frames of one stack.
///
/// Every frame must share the first frame's size and channel count.
pub fn load_image_sequence(paths: &[PathBuf]) -> Result<ImageStack> {
    let first_path = paths.first().ok_or(FlowError::EmptySequence)?;
    let first = load_frame(first_path)?;
    let (h, w, channels) = first.dim();

    let mut data = Array4::<f32>::zeros((paths.len(), h, w, channels));
    data.slice_mut(s![0, .., .., ..]).assign(&first);

    for (i, path) in paths.iter().enumerate().skip(1) {
        let frame = load_frame(path)?;
        let (fh, fw, fc) = frame.dim();
        if (fh, fw) != (h, w) {
            return Err(FlowError::ShapeMismatch {
                expected: (h, w),
                found: (fh, fw),
            });
        }
        if fc != channels {
            return Err(FlowError::UnsupportedInput(format!(
                "{} has {} channel(s), expected {}",
                path.display(),
                fc,
                channels
            )));
        }
        data.slice_mut(s![i, .., .., ..]).assign(&frame);
    }

    debug!(frames = paths.len(), width = w, height = h, channels, "Loaded image sequence");
    ImageStack::new(data)
}

/// Image files directly inside `dir`, sorted by file name.
pub fn list_image_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_image_path(p))
        .filter(|p| {
            !p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("._"))
        })
        .collect();
    files.sort();
    Ok(files)
}
