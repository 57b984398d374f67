use crate::GreensFunctions::pair_gf_api::PairGFError;

/// Stopping criteria of Brent's method: the bracket is accepted when its half width falls below
/// `2 rel_tol |x| + abs_tol / 2`.
#[derive(Debug, Clone, Copy)]
pub struct BrentTolerance {
    pub abs_tol: f64,
    pub rel_tol: f64,
    pub max_iter: usize,
}

impl Default for BrentTolerance {
    fn default() -> Self {
        Self {
            abs_tol: 0.0,
            rel_tol: 4.0 * f64::EPSILON,
            max_iter: 200,
        }
    }
}

impl BrentTolerance {
    pub fn relative(rel_tol: f64) -> Self {
        Self {
            rel_tol,
            ..Self::default()
        }
    }
}

/// Brent's method (inverse quadratic interpolation with bisection fallback) on a bracket
/// [low, high] where f changes sign.
/// `f` may fail; its error is returned as is.
/// `what` names the quantity being solved for in the convergence error.
pub fn brent<F>(
    f: F,
    low: f64,
    high: f64,
    tol: BrentTolerance,
    what: &'static str,
) -> Result<f64, PairGFError>
where
    F: Fn(f64) -> Result<f64, PairGFError>,
{
    let (mut a, mut b) = (low, high);
    let mut fa = f(a)?;
    let mut fb = f(b)?;
    if fa == 0.0 {
        return Ok(a);
    }
    if fb == 0.0 {
        return Ok(b);
    }
    if !(fa * fb < 0.0) {
        return Err(PairGFError::RootNotBracketed {
            low,
            high,
            f_low: fa,
            f_high: fb,
        });
    }
    let mut c = a;
    let mut fc = fa;
    let mut d = b - a;
    let mut e = d;
    for _ in 0..tol.max_iter {
        if fb * fc > 0.0 {
            c = a;
            fc = fa;
            d = b - a;
            e = d;
        }
        if fc.abs() < fb.abs() {
            a = b;
            b = c;
            c = a;
            fa = fb;
            fb = fc;
            fc = fa;
        }
        let tol_x = 2.0 * tol.rel_tol * b.abs() + 0.5 * tol.abs_tol;
        let m = 0.5 * (c - b);
        if m.abs() <= tol_x || fb == 0.0 {
            return Ok(b);
        }
        if e.abs() >= tol_x && fa.abs() > fb.abs() {
            let s = fb / fa;
            let (mut p, mut q) = if a == c {
                // secant
                (2.0 * m * s, 1.0 - s)
            } else {
                // inverse quadratic interpolation
                let qa = fa / fc;
                let r = fb / fc;
                (
                    s * (2.0 * m * qa * (qa - r) - (b - a) * (r - 1.0)),
                    (qa - 1.0) * (r - 1.0) * (s - 1.0),
                )
            };
            if p > 0.0 {
                q = -q;
            } else {
                p = -p;
            }
            if 2.0 * p < (3.0 * m * q - (tol_x * q).abs()).min((e * q).abs()) {
                e = d;
                d = p / q;
            } else {
                d = m;
                e = m;
            }
        } else {
            d = m;
            e = m;
        }
        a = b;
        fa = fb;
        b += if d.abs() > tol_x {
            d
        } else if m > 0.0 {
            tol_x
        } else {
            -tol_x
        };
        fb = f(b)?;
    }
    Err(PairGFError::NoConvergence {
        what,
        iterations: tol.max_iter,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_brent_polynomial() {
        let root = brent(
            |x| Ok(x * x * x - 2.0 * x - 5.0),
            2.0,
            3.0,
            BrentTolerance::default(),
            "cubic",
        )
        .unwrap();
        assert_relative_eq!(root, 2.0945514815423265, epsilon = 1e-14);
    }

    #[test]
    fn test_brent_transcendental() {
        // cos x = x
        let root = brent(
            |x| Ok(x.cos() - x),
            0.0,
            1.0,
            BrentTolerance::default(),
            "fixed point",
        )
        .unwrap();
        assert_relative_eq!(root, 0.7390851332151607, epsilon = 1e-14);
    }

    #[test]
    fn test_brent_endpoint_root() {
        let root = brent(|x| Ok(x - 1.0), 1.0, 2.0, BrentTolerance::default(), "line").unwrap();
        assert_eq!(root, 1.0);
    }

    #[test]
    fn test_brent_not_bracketed() {
        let res = brent(|x| Ok(x * x + 1.0), -1.0, 1.0, BrentTolerance::default(), "parabola");
        assert!(matches!(res, Err(PairGFError::RootNotBracketed { .. })));
    }

    #[test]
    fn test_brent_propagates_error() {
        let res = brent(
            |x| {
                if x > 0.5 {
                    Err(PairGFError::InvalidTime(x))
                } else {
                    Ok(x - 0.25)
                }
            },
            0.0,
            1.0,
            BrentTolerance::default(),
            "failing",
        );
        assert_eq!(res, Err(PairGFError::InvalidTime(1.0)));
    }

    #[test]
    fn test_brent_iteration_limit() {
        let tol = BrentTolerance {
            abs_tol: 0.0,
            rel_tol: 0.0,
            max_iter: 3,
        };
        let res = brent(|x| Ok((x - 0.3).powi(3)), 0.0, 1.0, tol, "cube");
        assert_eq!(
            res,
            Err(PairGFError::NoConvergence {
                what: "cube",
                iterations: 3
            })
        );
    }
}
