use approx::assert_abs_diff_eq;
use ndarray::{array, Array2, Axis};

use flowcorr_core::error::FlowError;
use flowcorr_core::field::DisplacementField;
use flowcorr_core::flow::subpixel::refine_peak_paraboloid;
use flowcorr_core::flow::{divergence, gradient, BlockFlow, BlockFlowConfig, FlowEstimator};

mod common;
use common::lcg_texture;

/// `texture` moved by `(dy, dx)` pixels with wrap-around.
fn shifted(texture: &Array2<f32>, dy: usize, dx: usize) -> Array2<f32> {
    let (h, w) = texture.dim();
    Array2::from_shape_fn((h, w), |(r, c)| texture[[(r + h - dy) % h, (c + w - dx) % w]])
}

// ---------------------------------------------------------------------------
// Divergence
// ---------------------------------------------------------------------------

#[test]
fn test_gradient_central_and_edges() {
    let data = array![[0.0, 1.0, 4.0, 9.0]];
    let g = gradient(data.view(), Axis(1));
    assert_eq!(g, array![[1.0, 2.0, 4.0, 5.0]]);
}

#[test]
fn test_gradient_of_single_sample_is_zero() {
    let data = array![[3.0], [5.0]];
    assert_eq!(gradient(data.view(), Axis(1)), Array2::<f64>::zeros((2, 1)));
    assert_eq!(gradient(data.view(), Axis(0)), array![[2.0], [2.0]]);
}

#[test]
fn test_divergence_of_linear_field() {
    let shape = (6, 7);
    let field = DisplacementField::new(
        Array2::from_shape_fn(shape, |(_, c)| c as f64),
        Array2::from_shape_fn(shape, |(r, _)| 2.0 * r as f64),
    )
    .unwrap();
    for &d in divergence(&field).iter() {
        assert_abs_diff_eq!(d, 3.0, epsilon = 1e-12);
    }
}

#[test]
fn test_divergence_of_rotation_is_zero() {
    let shape = (8, 8);
    let field = DisplacementField::new(
        Array2::from_shape_fn(shape, |(r, _)| -(r as f64)),
        Array2::from_shape_fn(shape, |(_, c)| c as f64),
    )
    .unwrap();
    for &d in divergence(&field).iter() {
        assert_abs_diff_eq!(d, 0.0, epsilon = 1e-12);
    }
}

// ---------------------------------------------------------------------------
// Sub-pixel refinement
// ---------------------------------------------------------------------------

#[test]
fn test_symmetric_peak_has_no_offset() {
    let mut surface = Array2::<f64>::zeros((5, 5));
    surface[[2, 2]] = 1.0;
    surface[[1, 2]] = 0.5;
    surface[[3, 2]] = 0.5;
    let (dr, dc) = refine_peak_paraboloid(&surface, 2, 2);
    assert_abs_diff_eq!(dr, 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(dc, 0.0, epsilon = 1e-12);
}

#[test]
fn test_peak_leans_toward_larger_neighbour() {
    let mut surface = Array2::<f64>::zeros((5, 5));
    surface[[0, 0]] = 1.0;
    surface[[0, 1]] = 0.8;
    surface[[0, 4]] = 0.2; // wrapped left neighbour
    let (_, dc) = refine_peak_paraboloid(&surface, 0, 0);
    assert!(dc > 0.0 && dc <= 0.5, "dc={dc}");
}

// ---------------------------------------------------------------------------
// Block phase correlation
// ---------------------------------------------------------------------------

#[test]
fn test_block_flow_recovers_translation() {
    let texture = lcg_texture(64, 64, 3);
    let moved = shifted(&texture, 2, 3);
    let field = BlockFlow::default()
        .estimate(texture.view(), moved.view())
        .unwrap();

    assert_eq!(field.dim(), (64, 64));
    assert_abs_diff_eq!(field.dx[[32, 32]], 3.0, epsilon = 0.75);
    assert_abs_diff_eq!(field.dy[[32, 32]], 2.0, epsilon = 0.75);
    let (mx, my) = field.mean();
    assert_abs_diff_eq!(mx, 3.0, epsilon = 0.75);
    assert_abs_diff_eq!(my, 2.0, epsilon = 0.75);
}

#[test]
fn test_block_flow_identical_frames_are_still() {
    let texture = lcg_texture(48, 48, 9);
    let field = BlockFlow::default()
        .estimate(texture.view(), texture.view())
        .unwrap();
    for (&dx, &dy) in field.dx.iter().zip(field.dy.iter()) {
        assert_abs_diff_eq!(dx, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(dy, 0.0, epsilon = 1e-6);
    }
}

#[test]
fn test_block_flow_flat_frames_have_no_motion() {
    let a = Array2::from_elem((40, 40), 0.25f32);
    let b = Array2::from_elem((40, 40), 0.75f32);
    let field = BlockFlow::default().estimate(a.view(), b.view()).unwrap();
    assert_eq!(field.mean(), (0.0, 0.0));
}

#[test]
fn test_block_flow_small_frames_use_whole_frame() {
    let texture = lcg_texture(20, 24, 5);
    let moved = shifted(&texture, 0, 1);
    let field = BlockFlow::default()
        .estimate(texture.view(), moved.view())
        .unwrap();
    assert_eq!(field.dim(), (20, 24));
}

#[test]
fn test_block_flow_rejects_mismatched_frames() {
    let a = Array2::<f32>::zeros((16, 16));
    let b = Array2::<f32>::zeros((16, 17));
    let err = BlockFlow::default().estimate(a.view(), b.view()).unwrap_err();
    assert!(matches!(err, FlowError::ShapeMismatch { .. }));
}

#[test]
fn test_block_flow_rejects_tiny_blocks() {
    let estimator = BlockFlow::new(BlockFlowConfig {
        block_size: 1,
        ..BlockFlowConfig::default()
    });
    let a = Array2::<f32>::zeros((16, 16));
    let err = estimator.estimate(a.view(), a.view()).unwrap_err();
    assert!(matches!(err, FlowError::InvalidConfig(_)));
}
