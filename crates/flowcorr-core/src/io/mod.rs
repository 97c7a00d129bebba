pub mod image_io;
pub mod ser;
pub mod tiff_stack;

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{FlowError, Result};
use crate::frame::{ImageStack, StackInfo};

use image_io::{is_image_path, list_image_files, load_image_sequence};
use ser::SerReader;
use tiff_stack::load_tiff_stack;

/// Extensions of files that hold a whole stack on their own.
pub const STACK_EXTENSIONS: &[&str] = &["ser", "tif", "tiff"];

/// A decoded stack together with where it came from.
#[derive(Clone, Debug)]
pub struct LoadedStack {
    pub stack: ImageStack,
    pub info: StackInfo,
}

/// Load a stack from a SER video, a multi-page TIFF or a directory of image
/// frames.
///
/// Each TIFF page is one frame. Any other lone image file is rejected: a
/// flow analysis needs at least two frames.
pub fn load_stack(path: &Path) -> Result<LoadedStack> {
    if path.is_dir() {
        let files = list_image_files(path)?;
        if files.is_empty() {
            return Err(FlowError::UnsupportedInput(format!(
                "{} contains no image frames",
                path.display()
            )));
        }
        return load_sequence(path, &files);
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("ser") => {
            let reader = SerReader::open(path)?;
            let stack = reader.read_stack()?;
            info!(path = %path.display(), frames = stack.frame_count(), "Loaded SER stack");
            Ok(LoadedStack {
                info: reader.stack_info(path),
                stack,
            })
        }
        Some("tif" | "tiff") => {
            let (stack, info) = load_tiff_stack(path)?;
            info!(path = %path.display(), frames = stack.frame_count(), "Loaded TIFF stack");
            Ok(LoadedStack { stack, info })
        }
        _ if is_image_path(path) => Err(FlowError::UnsupportedInput(format!(
            "{} is a single image; pass a directory of frames or a SER video",
            path.display()
        ))),
        _ => Err(FlowError::UnsupportedInput(format!(
            "{}: expected a .ser or .tif file, or a directory of images",
            path.display()
        ))),
    }
}

/// Load an explicit list of image files as one stack, labelled `source`.
pub fn load_sequence(source: &Path, files: &[PathBuf]) -> Result<LoadedStack> {
    let stack = load_image_sequence(files)?;
    info!(path = %source.display(), frames = stack.frame_count(), "Loaded image sequence");
    let info = StackInfo {
        source: source.to_path_buf(),
        total_frames: stack.frame_count(),
        width: stack.width(),
        height: stack.height(),
        channels: stack.channel_count(),
        bit_depth: 16,
    };
    Ok(LoadedStack { stack, info })
}

fn has_stack_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| STACK_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn is_resource_fork(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with("._"))
}

/// Stack files (SER and TIFF) anywhere under `root`, sorted by path.
///
/// `._*` files, hidden directories and any directory listed in `exclude`
/// are skipped.
pub fn discover_stacks(root: &Path, exclude: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let exclude: Vec<PathBuf> = exclude
        .iter()
        .filter_map(|p| std::fs::canonicalize(p).ok())
        .collect();
    let is_excluded = |dir: &Path| {
        std::fs::canonicalize(dir).is_ok_and(|canon| exclude.contains(&canon))
    };

    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_dir() {
                let hidden = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with('.'));
                if !hidden && !is_excluded(&path) {
                    pending.push(path);
                }
            } else if has_stack_extension(&path) && !is_resource_fork(&path) {
                found.push(path);
            }
        }
    }
    found.sort();
    debug!(root = %root.display(), stacks = found.len(), "Discovered stack files");
    Ok(found)
}
