/// Minimum pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Minimum frame-pair count to use pair-level Rayon parallelism.
pub const PARALLEL_PAIR_THRESHOLD: usize = 4;

/// Displacement magnitude below which a vector counts as "no motion".
pub const FLT_TOL: f64 = 1e-10;

/// Small epsilon to avoid division by zero in spectral normalization.
pub const EPSILON: f64 = 1e-12;

/// Microns per pixel of the reference microscope setup.
pub const DEFAULT_PIXEL_SIZE: f64 = 2.4859;

/// Physical width of one radial annulus, in microns.
pub const DEFAULT_BIN_WIDTH: f64 = 2.4859;

/// Physical radius at which correlators stop being evaluated, in microns.
pub const DEFAULT_MAX_LENGTH: f64 = 100.0;

/// Correlation lengths above this (microns) count toward organized motion.
pub const DEFAULT_MIN_CORR_LEN: f64 = 25.0;

/// Fraction of pairs that must exceed `DEFAULT_MIN_CORR_LEN` for a positive verdict.
pub const DEFAULT_MIN_FRACTION: f64 = 0.5;

/// Frames between the two members of a pair.
pub const DEFAULT_FRAME_STRIDE: usize = 1;

/// Subgrid step used before the correlation analysis.
pub const DEFAULT_DOWNSAMPLE: usize = 8;

/// Absolute tolerance for Brent's method.
pub const ROOT_XTOL: f64 = 2e-12;

/// Relative tolerance for Brent's method (4 ulp).
pub const ROOT_RTOL: f64 = 4.0 * f64::EPSILON;

/// Iteration cap for Brent's method.
pub const ROOT_MAX_ITER: usize = 100;

/// Default block edge (pixels) for block phase-correlation flow.
pub const DEFAULT_FLOW_BLOCK_SIZE: usize = 32;

/// Minimum peak-to-mean ratio for a block displacement to be trusted.
pub const DEFAULT_FLOW_MIN_CONFIDENCE: f64 = 5.0;

/// Reference blocks with intensity variance below this carry no texture.
pub const FLAT_BLOCK_VARIANCE: f64 = 1e-10;
