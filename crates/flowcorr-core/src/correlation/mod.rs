pub mod akima;
pub mod autocorrelation;
pub mod direction;
pub mod downsample;
pub mod length;
pub mod radial;
pub mod root;

pub use autocorrelation::{autocorrelation_surface, direction_autocorrelation};
pub use direction::{direction_field, normalize};
pub use downsample::{downsample, downsample_field, sample_indices};
pub use length::{decay_radius, solve_length, LengthOutcome};
pub use radial::{radial_profile, RadialProfile, RadiusGrid};
