use tracing::debug;

use crate::error::{FlowError, Result};

use super::akima::Akima;
use super::radial::RadialProfile;
use super::root::brent;

/// How a correlation length was obtained from a radial profile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LengthOutcome {
    /// The interpolant crosses the threshold at this radius (pixels).
    Crossing(f64),
    /// The profile never decays to the threshold; carries the largest
    /// sampled radius (pixels).
    Saturated(f64),
    /// No usable crossing: too few samples, non-finite values, or a profile
    /// that stays below the threshold.
    NotFound,
}

impl LengthOutcome {
    /// Radius in pixels, `0` for [`LengthOutcome::NotFound`].
    pub fn pixel_radius(&self) -> f64 {
        match *self {
            Self::Crossing(r) | Self::Saturated(r) => r,
            Self::NotFound => 0.0,
        }
    }

    /// Physical correlation length.
    pub fn physical_length(&self, pixel_size: f64) -> f64 {
        pixel_size * self.pixel_radius()
    }
}

/// Radius at which the Akima interpolant of the profile first falls to
/// `threshold`.
///
/// The first sample interval whose endpoints straddle the threshold is
/// refined with Brent's method. Errors when no such interval exists.
pub fn decay_radius(profile: &RadialProfile, threshold: f64) -> Result<f64> {
    let interp = Akima::new(&profile.radii, &profile.values)?;
    let (radii, values) = interp.knots();
    let excess = |v: f64| v - threshold;

    if values.iter().any(|v| !v.is_finite()) {
        let (lower, upper) = interp.bounds();
        return Err(FlowError::RootNotBracketed { lower, upper });
    }

    let bracket = (0..radii.len() - 1).find(|&i| {
        let (a, b) = (excess(values[i]), excess(values[i + 1]));
        a * b <= 0.0
    });

    match bracket {
        Some(i) => brent(|r| excess(interp.eval(r)), radii[i], radii[i + 1]),
        None => {
            let (lower, upper) = interp.bounds();
            Err(FlowError::RootNotBracketed { lower, upper })
        }
    }
}

/// Classify the decay of a radial profile against `threshold`.
///
/// Failures to find a crossing are not errors here: they become
/// [`LengthOutcome::NotFound`] (length `0`) unless every sample stays above
/// the threshold, which is [`LengthOutcome::Saturated`].
pub fn solve_length(profile: &RadialProfile, threshold: f64) -> LengthOutcome {
    match decay_radius(profile, threshold) {
        Ok(root) => LengthOutcome::Crossing(root),
        Err(err) => {
            let saturated = profile.len() >= 2
                && profile.values.iter().all(|&v| v.is_finite() && v > threshold);
            if saturated {
                let last = profile.radii[profile.len() - 1];
                debug!(radius = last, "Correlation never decays below threshold");
                LengthOutcome::Saturated(last)
            } else {
                debug!(error = %err, "No correlation length found");
                LengthOutcome::NotFound
            }
        }
    }
}
