use std::path::PathBuf;

use approx::assert_abs_diff_eq;
use image::{GrayImage, Luma, Rgb, RgbImage};
use tiff::encoder::{colortype, TiffEncoder};

use flowcorr_core::error::FlowError;
use flowcorr_core::io::image_io::{list_image_files, load_image_sequence};
use flowcorr_core::io::{discover_stacks, load_stack};
use flowcorr_core::io::ser::SerReader;

mod common;
use common::{build_ser_header, write_temp};

// ---------------------------------------------------------------------------
// SER
// ---------------------------------------------------------------------------

#[test]
fn test_ser_mono_8bit() {
    let (w, h) = (4u32, 3u32);
    let mut data = build_ser_header(w, h, 8, 2, 0);
    data.extend((0..12).map(|i| i as u8 * 10));
    data.extend(std::iter::repeat(255u8).take(12));
    let file = write_temp(&data, ".ser");

    let reader = SerReader::open(file.path()).unwrap();
    assert_eq!(reader.frame_count(), 2);
    let stack = reader.read_stack().unwrap();
    assert_eq!(
        (stack.frame_count(), stack.height(), stack.width(), stack.channel_count()),
        (2, 3, 4, 1)
    );
    let first = stack.frame(0, 0).unwrap();
    assert_abs_diff_eq!(first[[1, 2]], 60.0 / 255.0, epsilon = 1e-6);
    assert_abs_diff_eq!(stack.frame(1, 0).unwrap()[[2, 3]], 1.0, epsilon = 1e-6);
}

#[test]
fn test_ser_mono_16bit_little_endian() {
    let mut data = build_ser_header(2, 1, 12, 1, 0);
    data.extend_from_slice(&4095u16.to_le_bytes());
    data.extend_from_slice(&0u16.to_le_bytes());
    let file = write_temp(&data, ".ser");

    let stack = SerReader::open(file.path()).unwrap().read_stack().unwrap();
    let frame = stack.frame(0, 0).unwrap();
    assert_abs_diff_eq!(frame[[0, 0]], 1.0, epsilon = 1e-6);
    assert_abs_diff_eq!(frame[[0, 1]], 0.0);
}

#[test]
fn test_ser_bgr_reordered_to_rgb() {
    let mut data = build_ser_header(1, 1, 8, 1, 101);
    data.extend_from_slice(&[255, 0, 51]); // B, G, R
    let file = write_temp(&data, ".ser");

    let stack = SerReader::open(file.path()).unwrap().read_stack().unwrap();
    assert_eq!(stack.channel_count(), 3);
    assert_abs_diff_eq!(stack.frame(0, 0).unwrap()[[0, 0]], 0.2, epsilon = 1e-6);
    assert_abs_diff_eq!(stack.frame(0, 2).unwrap()[[0, 0]], 1.0, epsilon = 1e-6);
}

#[test]
fn test_ser_truncated_rejected() {
    let mut data = build_ser_header(4, 4, 8, 2, 0);
    data.extend([0u8; 20]);
    let file = write_temp(&data, ".ser");
    assert!(matches!(SerReader::open(file.path()), Err(FlowError::InvalidSer(_))));
}

#[test]
fn test_ser_bad_magic_rejected() {
    let mut data = build_ser_header(1, 1, 8, 1, 0);
    data[0] = b'X';
    data.push(0);
    let file = write_temp(&data, ".ser");
    assert!(matches!(SerReader::open(file.path()), Err(FlowError::InvalidSer(_))));
}

#[test]
fn test_load_stack_dispatches_on_ser() {
    let mut data = build_ser_header(2, 2, 8, 3, 0);
    data.extend([128u8; 12]);
    let file = write_temp(&data, ".ser");

    let loaded = load_stack(file.path()).unwrap();
    assert_eq!(loaded.info.total_frames, 3);
    assert_eq!(loaded.info.bit_depth, 8);
    assert_eq!(loaded.stack.frame_count(), 3);
}

// ---------------------------------------------------------------------------
// Image sequences
// ---------------------------------------------------------------------------

fn write_gray_frames(dir: &std::path::Path, count: usize, w: u32, h: u32) -> Vec<PathBuf> {
    (0..count)
        .map(|k| {
            let path = dir.join(format!("frame_{k:03}.png"));
            GrayImage::from_fn(w, h, |x, _| Luma([(x as usize * 10 + k) as u8]))
                .save(&path)
                .unwrap();
            path
        })
        .collect()
}

#[test]
fn test_image_directory_loads_in_name_order() {
    let dir = tempfile::tempdir().unwrap();
    write_gray_frames(dir.path(), 3, 5, 4);
    std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
    std::fs::write(dir.path().join("._frame_000.png"), "resource fork").unwrap();

    let files = list_image_files(dir.path()).unwrap();
    assert_eq!(files.len(), 3);

    let loaded = load_stack(dir.path()).unwrap();
    let stack = loaded.stack;
    assert_eq!(
        (stack.frame_count(), stack.height(), stack.width(), stack.channel_count()),
        (3, 4, 5, 1)
    );
    assert_abs_diff_eq!(stack.frame(2, 0).unwrap()[[0, 1]], 12.0 / 255.0, epsilon = 1e-6);
    assert_eq!(loaded.info.total_frames, 3);
}

#[test]
fn test_rgb_frames_have_three_channels() {
    let dir = tempfile::tempdir().unwrap();
    let paths: Vec<PathBuf> = (0..2)
        .map(|k| {
            let path = dir.path().join(format!("{k}.png"));
            RgbImage::from_pixel(3, 3, Rgb([255, 0, 0])).save(&path).unwrap();
            path
        })
        .collect();
    let stack = load_image_sequence(&paths).unwrap();
    assert_eq!(stack.channel_count(), 3);
    assert_abs_diff_eq!(stack.frame(1, 0).unwrap()[[2, 2]], 1.0, epsilon = 1e-6);
    assert_eq!(stack.frame(1, 1).unwrap()[[2, 2]], 0.0);
}

#[test]
fn test_image_size_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let mut paths = write_gray_frames(dir.path(), 1, 4, 4);
    let odd = dir.path().join("odd.png");
    GrayImage::new(5, 4).save(&odd).unwrap();
    paths.push(odd);
    assert!(matches!(
        load_image_sequence(&paths),
        Err(FlowError::ShapeMismatch { .. })
    ));
}

#[test]
fn test_unsupported_inputs() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(load_stack(dir.path()), Err(FlowError::UnsupportedInput(_))));

    let single = write_gray_frames(dir.path(), 1, 2, 2);
    assert!(matches!(load_stack(&single[0]), Err(FlowError::UnsupportedInput(_))));

    let other = write_temp(b"hello", ".txt");
    assert!(matches!(load_stack(other.path()), Err(FlowError::UnsupportedInput(_))));

    assert!(matches!(load_image_sequence(&[]), Err(FlowError::EmptySequence)));
}

// ---------------------------------------------------------------------------
// TIFF stacks
// ---------------------------------------------------------------------------

fn write_gray16_tiff(path: &std::path::Path, pages: usize, w: u32, h: u32) {
    let file = std::fs::File::create(path).unwrap();
    let mut encoder = TiffEncoder::new(std::io::BufWriter::new(file)).unwrap();
    for k in 0..pages {
        let data: Vec<u16> = (0..w * h).map(|i| (i as u16) * 100 + k as u16).collect();
        encoder.write_image::<colortype::Gray16>(w, h, &data).unwrap();
    }
}

#[test]
fn test_multi_page_tiff_pages_become_frames() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("timelapse.tif");
    write_gray16_tiff(&path, 4, 6, 5);

    let loaded = load_stack(&path).unwrap();
    let stack = &loaded.stack;
    assert_eq!(
        (stack.frame_count(), stack.height(), stack.width(), stack.channel_count()),
        (4, 5, 6, 1)
    );
    // Page 3, row 1, col 2 holds sample index 8.
    assert_abs_diff_eq!(
        stack.frame(3, 0).unwrap()[[1, 2]],
        803.0 / 65535.0,
        epsilon = 1e-7
    );
    assert_eq!(loaded.info.total_frames, 4);
    assert_eq!(loaded.info.bit_depth, 16);
    assert_eq!(loaded.info.source, path);
}

#[test]
fn test_tiff_written_by_image_crate_loads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("timelapse.TIFF");
    GrayImage::from_fn(16, 16, |x, y| Luma([(x + y) as u8]))
        .save_with_format(&path, image::ImageFormat::Tiff)
        .unwrap();

    let loaded = load_stack(&path).unwrap();
    assert_eq!(loaded.stack.frame_count(), 1);
    assert_eq!(loaded.stack.channel_count(), 1);
    assert_eq!(loaded.info.bit_depth, 8);
    assert_abs_diff_eq!(
        loaded.stack.frame(0, 0).unwrap()[[3, 4]],
        7.0 / 255.0,
        epsilon = 1e-7
    );
}

#[test]
fn test_rgb_tiff_has_three_channels() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rgb.tif");
    let file = std::fs::File::create(&path).unwrap();
    let mut encoder = TiffEncoder::new(std::io::BufWriter::new(file)).unwrap();
    for _ in 0..2 {
        let data: Vec<u8> = [0u8, 255, 0].repeat(4);
        encoder.write_image::<colortype::RGB8>(2, 2, &data).unwrap();
    }
    drop(encoder);

    let stack = load_stack(&path).unwrap().stack;
    assert_eq!((stack.frame_count(), stack.channel_count()), (2, 3));
    assert_eq!(stack.frame(1, 0).unwrap()[[1, 1]], 0.0);
    assert_abs_diff_eq!(stack.frame(1, 1).unwrap()[[1, 1]], 1.0, epsilon = 1e-7);
}

#[test]
fn test_tiff_page_size_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mixed.tif");
    let file = std::fs::File::create(&path).unwrap();
    let mut encoder = TiffEncoder::new(std::io::BufWriter::new(file)).unwrap();
    encoder.write_image::<colortype::Gray8>(4, 4, &[0u8; 16]).unwrap();
    encoder.write_image::<colortype::Gray8>(5, 4, &[0u8; 20]).unwrap();
    drop(encoder);

    assert!(matches!(
        load_stack(&path),
        Err(FlowError::ShapeMismatch { expected: (4, 4), found: (4, 5) })
    ));
}

// ---------------------------------------------------------------------------
// Directory discovery
// ---------------------------------------------------------------------------

#[test]
fn test_discover_stacks_walks_tree() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let nested = root.join("plate1").join("well_a");
    let output = root.join("results");
    let hidden = root.join(".cache");
    for d in [&nested, &output, &hidden] {
        std::fs::create_dir_all(d).unwrap();
    }

    write_gray16_tiff(&root.join("b.tif"), 2, 3, 3);
    write_gray16_tiff(&nested.join("a.tiff"), 2, 3, 3);
    std::fs::write(nested.join("movie.SER"), b"not parsed here").unwrap();
    std::fs::write(root.join("._b.tif"), b"resource fork").unwrap();
    std::fs::write(root.join("notes.txt"), b"ignored").unwrap();
    write_gray_frames(root, 1, 2, 2);
    write_gray16_tiff(&output.join("old.tif"), 2, 3, 3);
    write_gray16_tiff(&hidden.join("tmp.tif"), 2, 3, 3);

    let found = discover_stacks(root, &[output.clone()]).unwrap();
    assert_eq!(
        found,
        vec![
            root.join("b.tif"),
            nested.join("a.tiff"),
            nested.join("movie.SER"),
        ]
    );

    let with_output = discover_stacks(root, &[]).unwrap();
    assert!(with_output.contains(&output.join("old.tif")));
    assert!(!with_output.contains(&hidden.join("tmp.tif")));
}

#[test]
fn test_discover_stacks_empty_for_frame_directory() {
    let dir = tempfile::tempdir().unwrap();
    write_gray_frames(dir.path(), 3, 4, 4);
    assert!(discover_stacks(dir.path(), &[]).unwrap().is_empty());
}
