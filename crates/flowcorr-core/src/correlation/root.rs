use tracing::debug;

use crate::consts::{ROOT_MAX_ITER, ROOT_RTOL, ROOT_XTOL};
use crate::error::{FlowError, Result};

/// Find a root of `f` in `[lower, upper]` with Brent's method.
///
/// `f(lower)` and `f(upper)` must have opposite signs (or one of them be
/// zero), otherwise [`FlowError::RootNotBracketed`] is returned. Combines
/// bisection, secant and inverse quadratic interpolation steps.
pub fn brent<F>(f: F, lower: f64, upper: f64) -> Result<f64>
where
    F: Fn(f64) -> f64,
{
    let mut xpre = lower;
    let mut xcur = upper;
    let mut fpre = f(xpre);
    let mut fcur = f(xcur);

    if !fpre.is_finite() || !fcur.is_finite() || fpre * fcur > 0.0 {
        return Err(FlowError::RootNotBracketed { lower, upper });
    }
    if fpre == 0.0 {
        return Ok(xpre);
    }
    if fcur == 0.0 {
        return Ok(xcur);
    }

    let (mut xblk, mut fblk) = (0.0, 0.0);
    let (mut spre, mut scur) = (0.0, 0.0);

    for _ in 0..ROOT_MAX_ITER {
        if fpre != 0.0 && fcur != 0.0 && fpre.is_sign_negative() != fcur.is_sign_negative() {
            xblk = xpre;
            fblk = fpre;
            spre = xcur - xpre;
            scur = spre;
        }
        if fblk.abs() < fcur.abs() {
            xpre = xcur;
            xcur = xblk;
            xblk = xpre;
            fpre = fcur;
            fcur = fblk;
            fblk = fpre;
        }

        let delta = (ROOT_XTOL + ROOT_RTOL * xcur.abs()) / 2.0;
        let sbis = (xblk - xcur) / 2.0;
        if fcur == 0.0 || sbis.abs() < delta {
            return Ok(xcur);
        }

        if spre.abs() > delta && fcur.abs() < fpre.abs() {
            let stry = if xpre == xblk {
                // secant
                -fcur * (xcur - xpre) / (fcur - fpre)
            } else {
                // inverse quadratic
                let dpre = (fpre - fcur) / (xpre - xcur);
                let dblk = (fblk - fcur) / (xblk - xcur);
                -fcur * (fblk * dblk - fpre * dpre) / (dblk * dpre * (fblk - fpre))
            };
            if 2.0 * stry.abs() < spre.abs().min(3.0 * sbis.abs() - delta) {
                spre = scur;
                scur = stry;
            } else {
                spre = sbis;
                scur = sbis;
            }
        } else {
            spre = sbis;
            scur = sbis;
        }

        xpre = xcur;
        fpre = fcur;
        if scur.abs() > delta {
            xcur += scur;
        } else {
            xcur += if sbis > 0.0 { delta } else { -delta };
        }
        fcur = f(xcur);
    }

    debug!(lower, upper, root = xcur, "Brent's method hit the iteration cap");
    Ok(xcur)
}
