//! # Diagnostics
//!
//! Smoke checks of a pair Green's function backend:
//! - **check_alpha_roots**: residual of the eigenvalue equation over the first roots
//! - **check_p_survival**: repeated survival evaluation, which must be bit-for-bit deterministic
//! - **check_draw_time**: a batch of first-passage times drawn from a random source
//!
//! A residual above tolerance is a soft failure: it is logged and recorded in the report, the
//! caller decides what to do with it. Every report can be printed as a table.
use crate::GreensFunctions::pair_gf_api::{PairGFError, PairGreensFunction, SurvivalRoots};
use crate::GreensFunctions::sampling::TimeSampler;
use log::{info, warn};
use prettytable::{Cell, Row, Table};
use rand::Rng;

/// Result of the root residual check
#[derive(Debug, Clone, PartialEq)]
pub struct RootCheck {
    pub a: f64,
    pub count: usize,
    pub tolerance: f64,
    pub max_residual: f64,
    /// index of the root with the largest residual
    pub worst_n: usize,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SurvivalCheck {
    pub a: f64,
    pub t: f64,
    pub r0: f64,
    pub repeats: usize,
    pub p_survival: f64,
    /// every repeat returned exactly the first value
    pub deterministic: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeSampleCheck {
    pub a: f64,
    pub r0: f64,
    pub samples: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// draw_time(0.5, r0)
    pub median_draw: f64,
}

/// Evaluates f_alpha_survival at the first `count` roots for outer radius a
pub fn check_alpha_roots<G: SurvivalRoots + ?Sized>(
    gf: &G,
    a: f64,
    count: usize,
    tolerance: f64,
) -> Result<RootCheck, PairGFError> {
    let mut max_residual: f64 = 0.0;
    let mut worst_n = 0;
    for n in 0..count {
        let alpha = gf.alpha_survival_n(a, n)?;
        let residual = gf.f_alpha_survival(alpha, a).abs();
        if residual > max_residual {
            max_residual = residual;
            worst_n = n;
        }
    }
    let passed = max_residual <= tolerance;
    if passed {
        info!(
            "alpha_survival_n: {} roots at a = {}, max residual {:e}",
            count, a, max_residual
        );
    } else {
        warn!(
            "failed: alpha_survival_n: maxerror = {:e} at n = {} (tolerance {:e})",
            max_residual, worst_n, tolerance
        );
    }
    Ok(RootCheck {
        a,
        count,
        tolerance,
        max_residual,
        worst_n,
        passed,
    })
}

/// Sets a and evaluates p_survival(t, r0) `repeats` times
pub fn check_p_survival<G: PairGreensFunction + ?Sized>(
    gf: &mut G,
    a: f64,
    t: f64,
    r0: f64,
    repeats: usize,
) -> Result<SurvivalCheck, PairGFError> {
    gf.set_a(a)?;
    let p_survival = gf.p_survival(t, r0)?;
    let mut deterministic = true;
    for _ in 1..repeats {
        if gf.p_survival(t, r0)? != p_survival {
            deterministic = false;
        }
    }
    if !deterministic {
        warn!("p_survival({}, {}) changed between repeated calls", t, r0);
    }
    info!("p_survival({}, {}) = {} at a = {}", t, r0, p_survival, a);
    Ok(SurvivalCheck {
        a,
        t,
        r0,
        repeats,
        p_survival,
        deterministic,
    })
}

/// Sets a and draws `samples` first-passage times from the sampler
pub fn check_draw_time<G: PairGreensFunction + ?Sized, R: Rng>(
    gf: &mut G,
    sampler: &mut TimeSampler<R>,
    a: f64,
    r0: f64,
    samples: usize,
) -> Result<TimeSampleCheck, PairGFError> {
    gf.set_a(a)?;
    let times = sampler.draw_times(&*gf, r0, samples)?;
    let min = times.iter().copied().fold(f64::INFINITY, f64::min);
    let max = times.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = if times.is_empty() {
        f64::NAN
    } else {
        times.iter().sum::<f64>() / times.len() as f64
    };
    let median_draw = gf.draw_time(0.5, r0)?;
    info!(
        "drawTime: {} samples at a = {}, r0 = {}, mean {:e}, drawTime(0.5) = {:e}",
        samples, a, r0, mean, median_draw
    );
    Ok(TimeSampleCheck {
        a,
        r0,
        samples,
        min,
        max,
        mean,
        median_draw,
    })
}

fn table_of(rows: &[(&str, String)]) -> Table {
    let mut table = Table::new();
    table.add_row(Row::new(vec![Cell::new("quantity"), Cell::new("value")]));
    for (name, value) in rows {
        table.add_row(Row::new(vec![Cell::new(name), Cell::new(value)]));
    }
    table
}

impl RootCheck {
    pub fn to_table(&self) -> Table {
        table_of(&[
            ("a", format!("{:e}", self.a)),
            ("roots", self.count.to_string()),
            ("max residual", format!("{:e}", self.max_residual)),
            ("worst n", self.worst_n.to_string()),
            ("tolerance", format!("{:e}", self.tolerance)),
            ("passed", self.passed.to_string()),
        ])
    }
}

impl SurvivalCheck {
    pub fn to_table(&self) -> Table {
        table_of(&[
            ("a", format!("{:e}", self.a)),
            ("t", format!("{:e}", self.t)),
            ("r0", format!("{:e}", self.r0)),
            ("repeats", self.repeats.to_string()),
            ("p_survival", self.p_survival.to_string()),
            ("deterministic", self.deterministic.to_string()),
        ])
    }
}

impl TimeSampleCheck {
    pub fn to_table(&self) -> Table {
        table_of(&[
            ("a", format!("{:e}", self.a)),
            ("r0", format!("{:e}", self.r0)),
            ("samples", self.samples.to_string()),
            ("min", format!("{:e}", self.min)),
            ("max", format!("{:e}", self.max)),
            ("mean", format!("{:e}", self.mean)),
            ("drawTime(0.5)", format!("{:e}", self.median_draw)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GreensFunctions::first_passage_pair::FirstPassagePairGF;
    use crate::GreensFunctions::pair_gf_api::{EventKind, check_random_number, check_time};
    use approx::assert_relative_eq;

    /// Backend with an analytic survival law exp(-k t) and eigenvalue equation sin(alpha a) = 0
    struct ExponentialSurvival {
        rate: f64,
        a: Option<f64>,
    }

    impl ExponentialSurvival {
        fn new(rate: f64) -> Self {
            Self { rate, a: None }
        }
    }

    impl SurvivalRoots for ExponentialSurvival {
        fn alpha_survival_n(&self, a: f64, n: usize) -> Result<f64, PairGFError> {
            Ok((n as f64 + 1.0) * std::f64::consts::PI / a)
        }
        fn f_alpha_survival(&self, alpha: f64, a: f64) -> f64 {
            (alpha * a).sin()
        }
    }

    impl PairGreensFunction for ExponentialSurvival {
        fn name(&self) -> &str {
            "ExponentialSurvival"
        }
        fn getD(&self) -> f64 {
            1.0
        }
        fn getkf(&self) -> f64 {
            self.rate
        }
        fn getSigma(&self) -> f64 {
            0.0
        }
        fn geta(&self) -> Option<f64> {
            self.a
        }
        fn set_a(&mut self, a: f64) -> Result<(), PairGFError> {
            self.a = Some(a);
            Ok(())
        }
        fn p_survival(&self, t: f64, _r0: f64) -> Result<f64, PairGFError> {
            check_time(t)?;
            Ok((-self.rate * t).exp())
        }
        fn draw_time(&self, rnd: f64, _r0: f64) -> Result<f64, PairGFError> {
            check_random_number(rnd)?;
            Ok(-(1.0 - rnd).ln() / self.rate)
        }
        fn p_int_r(&self, _r: f64, t: f64, r0: f64) -> Result<f64, PairGFError> {
            self.p_survival(t, r0)
        }
        fn flux_reaction(&self, t: f64, r0: f64) -> Result<f64, PairGFError> {
            Ok(self.rate * self.p_survival(t, r0)?)
        }
        fn flux_escape(&self, _t: f64, _r0: f64) -> Result<f64, PairGFError> {
            Ok(0.0)
        }
        fn draw_event_type(&self, _rnd: f64, _t: f64, _r0: f64) -> Result<EventKind, PairGFError> {
            Ok(EventKind::Reaction)
        }
        fn draw_r(&self, _rnd: f64, _t: f64, r0: f64) -> Result<f64, PairGFError> {
            Ok(r0)
        }
    }

    #[test]
    fn test_root_check_on_mock_backend() {
        let gf = ExponentialSurvival::new(2.0);
        let check = check_alpha_roots(&gf, 1.0, 50, 1e-8).unwrap();
        assert!(check.passed);
        assert_eq!(check.count, 50);
        assert!(check.max_residual < 1e-12);
    }

    #[test]
    fn test_root_check_soft_failure() {
        let gf = ExponentialSurvival::new(2.0);
        // sin(n pi) is of order 1e-15 n, above a zero tolerance
        let check = check_alpha_roots(&gf, 1.0, 10, 0.0).unwrap();
        assert!(!check.passed);
        assert!(check.worst_n < 10);
    }

    #[test]
    fn test_survival_and_time_checks_on_mock_backend() {
        let mut gf = ExponentialSurvival::new(2.0);
        let check = check_p_survival(&mut gf, 1.0, 0.5, 0.5, 10).unwrap();
        assert!(check.deterministic);
        assert_relative_eq!(check.p_survival, (-1.0f64).exp(), epsilon = 1e-15);
        assert_eq!(gf.geta(), Some(1.0));

        let mut sampler = TimeSampler::from_seed(11);
        let check = check_draw_time(&mut gf, &mut sampler, 1.0, 0.5, 5000).unwrap();
        assert_relative_eq!(check.median_draw, 2f64.ln() / 2.0, epsilon = 1e-15);
        // exponential law with rate 2 has mean 0.5
        assert_relative_eq!(check.mean, 0.5, max_relative = 0.1);
        assert!(check.min >= 0.0 && check.min <= check.max);
    }

    #[test]
    fn test_alpha_survival_script_check() {
        let gf = FirstPassagePairGF::new(1e-12, 1e-18, 1e-8).unwrap();
        let check = check_alpha_roots(&gf, 2e-6, 100, 1e-8).unwrap();
        assert!(check.passed, "max residual {}", check.max_residual);
    }

    #[test]
    fn test_p_survival_script_check() {
        let mut gf = FirstPassagePairGF::new(1e-12, 1e-18, 1e-8).unwrap();
        let check = check_p_survival(&mut gf, 6e-8, 1e-7, 5e-8, 1000).unwrap();
        assert!(check.deterministic);
        assert!((0.0..=1.0).contains(&check.p_survival));
        let table = check.to_table().to_string();
        assert!(table.contains("p_survival"));
    }

    #[test]
    fn test_draw_time_script_check() {
        let mut gf = FirstPassagePairGF::new(1e-12, 1e-18, 1e-8).unwrap();
        let mut sampler = TimeSampler::from_seed(5);
        let check = check_draw_time(&mut gf, &mut sampler, 6e-8, 5e-8, 200).unwrap();
        assert!(check.median_draw.is_finite() && check.median_draw >= 0.0);
        assert!(check.min >= 0.0 && check.max.is_finite());
        assert!(check.to_table().to_string().contains("drawTime(0.5)"));
    }
}
