//! # First-passage pair Green's function
//!
//! ## Purpose
//! Radial Green's function of two particles diffusing with relative diffusion coefficient D,
//! reacting with intrinsic rate kf at contact distance sigma and leaving the domain when their
//! separation reaches the outer radius a.
//!
//! ## Model
//! With u(r, t) = r p(r, t) the radial problem becomes u_t = D u_rr on [sigma, a] with
//! - u(a) = 0 (absorbing outer boundary)
//! - u'(sigma) = (1 + h sigma) / sigma u(sigma), h = kf / (4 pi sigma^2 D) (radiation boundary)
//!
//! The eigenfunctions are sin(alpha_n (a - r)), alpha_n being the roots of
//! f(alpha) = alpha sigma cos(alpha L) + (1 + h sigma) sin(alpha L), L = a - sigma.
//! Every root alpha_n lies in ((n + 1/2) pi / L, (n + 1) pi / L), where f changes sign, so each
//! one is found by Brent's method on its own bracket.
//!
//! Survival probability, cumulative radial distribution and boundary fluxes are series over the
//! roots with closed-form coefficients; time and radius are drawn by inverting these series.
//!
//! ## Series length
//! Terms with D alpha^2 t > 40 are dropped, so the number of roots needed grows like 1/sqrt(t).
//! A boundary further than sqrt(160 D t) from r0 is out of reach by time t. While one of the two
//! boundaries is out of reach, survival and fluxes come from the closed-form solution of the
//! other boundary alone:
//! - near sigma the radiation boundary of an isolated sphere (Collins-Kimball),
//! - near a the absorbing wall seen from inside (image solution).
//!
//! The series is only summed when both boundaries are within reach, which needs a few dozen
//! roots at most. The cumulative radial distribution keeps the series up to MAX_ALPHA_SEQ roots.
use crate::GreensFunctions::pair_gf_api::{
    EventKind, PairGFError, PairGreensFunction, SurvivalRoots, check_random_number, check_time,
};
use crate::GreensFunctions::root_finding::{BrentTolerance, brent};
use log::debug;
use statrs::function::erf::erfc;
use std::cell::RefCell;
use std::f64::consts::PI;

/// series terms with D alpha^2 t above this exponent are negligible (exp(-40) ~ 4e-18)
const EXP_CUTOFF: f64 = 40.0;
/// maximal number of eigenvalues in the series of the radial distribution
pub const MAX_ALPHA_SEQ: usize = 20_000;
const TIME_REL_TOL: f64 = 1e-14;
const RADIUS_REL_TOL: f64 = 1e-12;
/// each bracketing step of draw_time changes the time by a decade
const MAX_BRACKET_STEPS: usize = 100;

#[derive(Debug, Clone)]
#[allow(non_snake_case)]
pub struct FirstPassagePairGF {
    D: f64,
    kf: f64,
    sigma: f64,
    h: f64,
    hsigma_p_1: f64,
    a: Option<f64>,
    /// roots alpha_0, alpha_1, ... for the current a, grown on demand
    alpha_table: RefCell<Vec<f64>>,
}

#[allow(non_snake_case)]
impl FirstPassagePairGF {
    /// Creates the Green's function for diffusion coefficient D > 0, intrinsic rate kf >= 0
    /// and contact radius sigma > 0. The outer radius is set separately with `set_a`.
    pub fn new(D: f64, kf: f64, sigma: f64) -> Result<Self, PairGFError> {
        if !D.is_finite() || D <= 0.0 {
            return Err(PairGFError::InvalidParameter {
                name: "D",
                value: D,
            });
        }
        if !kf.is_finite() || kf < 0.0 {
            return Err(PairGFError::InvalidParameter {
                name: "kf",
                value: kf,
            });
        }
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(PairGFError::InvalidParameter {
                name: "sigma",
                value: sigma,
            });
        }
        let h = kf / (4.0 * PI * sigma * sigma * D);
        Ok(Self {
            D,
            kf,
            sigma,
            h,
            hsigma_p_1: 1.0 + h * sigma,
            a: None,
            alpha_table: RefCell::new(Vec::new()),
        })
    }

    /// Same as `new` followed by `set_a`
    pub fn with_outer_radius(D: f64, kf: f64, sigma: f64, a: f64) -> Result<Self, PairGFError> {
        let mut gf = Self::new(D, kf, sigma)?;
        gf.set_a(a)?;
        Ok(gf)
    }

    /// radiation boundary constant h = kf / (4 pi sigma^2 D)
    pub fn geth(&self) -> f64 {
        self.h
    }

    /// number of roots currently cached for the configured outer radius
    pub fn alpha_table_len(&self) -> usize {
        self.alpha_table.borrow().len()
    }

    fn check_a(&self, a: f64) -> Result<(), PairGFError> {
        if !a.is_finite() || a <= self.sigma {
            return Err(PairGFError::InvalidOuterRadius {
                a,
                sigma: self.sigma,
            });
        }
        Ok(())
    }

    fn current_a(&self) -> Result<f64, PairGFError> {
        self.a.ok_or(PairGFError::OuterRadiusNotSet)
    }

    fn check_r0(&self, r0: f64, a: f64) -> Result<(), PairGFError> {
        if !r0.is_finite() || r0 < self.sigma || r0 > a {
            return Err(PairGFError::InitialDistanceOutOfRange {
                r0,
                sigma: self.sigma,
                a,
            });
        }
        Ok(())
    }

    fn check_r(&self, r: f64, a: f64) -> Result<(), PairGFError> {
        if !r.is_finite() || r < self.sigma || r > a {
            return Err(PairGFError::RadiusOutOfRange {
                r,
                sigma: self.sigma,
                a,
            });
        }
        Ok(())
    }

    /// n-th root at outer radius a, bracketed by ((n + 1/2) pi / L, (n + 1) pi / L)
    fn find_alpha(&self, a: f64, n: usize) -> Result<f64, PairGFError> {
        let L = a - self.sigma;
        let low = (n as f64 + 0.5) * PI / L;
        let high = (n as f64 + 1.0) * PI / L;
        brent(
            |alpha| Ok(self.f_alpha_survival(alpha, a)),
            low,
            high,
            BrentTolerance::default(),
            "alpha_survival_n",
        )
    }

    /// Grows the root table for the current a to at least n entries and hands the first n to f
    fn with_alphas<T>(
        &self,
        a: f64,
        n: usize,
        f: impl FnOnce(&[f64]) -> T,
    ) -> Result<T, PairGFError> {
        {
            let mut table = self.alpha_table.borrow_mut();
            while table.len() < n {
                let alpha = self.find_alpha(a, table.len())?;
                table.push(alpha);
            }
        }
        let table = self.alpha_table.borrow();
        Ok(f(&table[..n]))
    }

    /// number of roots the series needs at time t, None above MAX_ALPHA_SEQ
    fn series_terms(&self, t: f64, a: f64) -> Option<usize> {
        let L = a - self.sigma;
        let needed = (L / PI * (EXP_CUTOFF / (self.D * t)).sqrt()).ceil() + 2.0;
        if needed <= MAX_ALPHA_SEQ as f64 {
            Some(needed as usize)
        } else {
            debug!("t = {} needs {} roots, above {}", t, needed, MAX_ALPHA_SEQ);
            None
        }
    }

    fn out_of_reach(&self, distance: f64, t: f64) -> bool {
        distance * distance / (4.0 * self.D * t) > EXP_CUTOFF
    }

    /// at least one of the boundaries cannot be reached from r0 by time t
    fn one_boundary_out_of_reach(&self, t: f64, r0: f64, a: f64) -> bool {
        self.out_of_reach(r0 - self.sigma, t) || self.out_of_reach(a - r0, t)
    }

    /// weight sigma kf / (r0 (kf + kD)) and rate (1 + h sigma) / sigma of the isolated
    /// radiation sphere, kD = 4 pi sigma D
    fn contact_constants(&self, r0: f64) -> (f64, f64) {
        let kD = 4.0 * PI * self.sigma * self.D;
        let weight = self.sigma * self.kf / (r0 * (self.kf + kD));
        (weight, self.hsigma_p_1 / self.sigma)
    }

    /// Probabilities of having reacted and of having escaped by time t, while at most one
    /// boundary is within reach
    fn short_time_losses(&self, t: f64, r0: f64, a: f64) -> (f64, f64) {
        let spread = (4.0 * self.D * t).sqrt();
        let mut reacted = 0.0;
        let mut escaped = 0.0;
        if self.kf > 0.0 && !self.out_of_reach(r0 - self.sigma, t) {
            let (weight, alpha) = self.contact_constants(r0);
            let x = (r0 - self.sigma) / spread;
            let y = alpha * (self.D * t).sqrt();
            reacted = weight * (erfc(x) - exp_erfc(x, y));
        }
        if !self.out_of_reach(a - r0, t) {
            escaped = a / r0 * erfc((a - r0) / spread);
        }
        (reacted, escaped)
    }

    /// Time derivatives of `short_time_losses`
    fn short_time_fluxes(&self, t: f64, r0: f64, a: f64) -> (f64, f64) {
        let spread = (4.0 * self.D * t).sqrt();
        let mut reaction = 0.0;
        let mut escape = 0.0;
        if self.kf > 0.0 && !self.out_of_reach(r0 - self.sigma, t) {
            let (weight, alpha) = self.contact_constants(r0);
            let x = (r0 - self.sigma) / spread;
            let y = alpha * (self.D * t).sqrt();
            let gauss = (-x * x).exp() / (PI * t).sqrt();
            reaction = weight
                * alpha
                * self.D.sqrt()
                * (gauss - alpha * self.D.sqrt() * exp_erfc(x, y));
        }
        if !self.out_of_reach(a - r0, t) {
            let z = (a - r0) / spread;
            escape = a / r0 * z * (-z * z).exp() / (t * PI.sqrt());
        }
        (reaction.max(0.0), escape)
    }

    /// sum_n exp(-D alpha_n^2 t) c_n(r0) term(alpha_n) over the first n roots
    fn series_sum<F>(&self, a: f64, t: f64, r0: f64, n: usize, term: F) -> Result<f64, PairGFError>
    where
        F: Fn(f64) -> f64,
    {
        let D = self.D;
        let sigma = self.sigma;
        self.with_alphas(a, n, |alphas| {
            alphas
                .iter()
                .map(|&alpha| {
                    (-D * alpha * alpha * t).exp()
                        * expansion_coefficient(alpha, a, sigma, r0)
                        * term(alpha)
                })
                .sum()
        })
    }

    fn survival_series(&self, a: f64, t: f64, r0: f64, n: usize) -> Result<f64, PairGFError> {
        let sigma = self.sigma;
        self.series_sum(a, t, r0, n, |alpha| radial_integral(alpha, a, sigma, a))
    }

    fn p_int_r_series(
        &self,
        r: f64,
        a: f64,
        t: f64,
        r0: f64,
        n: usize,
    ) -> Result<f64, PairGFError> {
        let sigma = self.sigma;
        self.series_sum(a, t, r0, n, |alpha| radial_integral(alpha, a, sigma, r))
    }
}

/// Coefficient sin(alpha (a - r0)) / (r0 N) of the survival expansion, N being the squared norm
/// of sin(alpha (a - r)) on [sigma, a]
fn expansion_coefficient(alpha: f64, a: f64, sigma: f64, r0: f64) -> f64 {
    let L = a - sigma;
    let norm = L / 2.0 - (2.0 * alpha * L).sin() / (4.0 * alpha);
    (alpha * (a - r0)).sin() / (r0 * norm)
}

/// Analytical integral of r sin(alpha (a - r)) dr from sigma to r.
/// With x = a - r the antiderivative is -(a - x) cos(alpha x) / alpha - sin(alpha x) / alpha^2
fn radial_integral(alpha: f64, a: f64, sigma: f64, r: f64) -> f64 {
    let antiderivative =
        |x: f64| -(a - x) * (alpha * x).cos() / alpha - (alpha * x).sin() / (alpha * alpha);
    antiderivative(a - sigma) - antiderivative(a - r)
}

/// exp(2 x y + y^2) erfc(x + y) for x, y >= 0. For large x + y it is written as
/// exp(-x^2) erfcx(x + y) with the asymptotic series of the scaled erfc.
fn exp_erfc(x: f64, y: f64) -> f64 {
    let z = x + y;
    if z <= 20.0 {
        return (2.0 * x * y + y * y).exp() * erfc(z);
    }
    let inv2 = 1.0 / (z * z);
    let series = 1.0
        - 0.5 * inv2
            * (1.0 - 1.5 * inv2 * (1.0 - 2.5 * inv2 * (1.0 - 3.5 * inv2 * (1.0 - 4.5 * inv2))));
    (-x * x).exp() * series / (z * PI.sqrt())
}

impl SurvivalRoots for FirstPassagePairGF {
    fn alpha_survival_n(&self, a: f64, n: usize) -> Result<f64, PairGFError> {
        self.check_a(a)?;
        if self.a == Some(a) {
            if let Some(&alpha) = self.alpha_table.borrow().get(n) {
                return Ok(alpha);
            }
        }
        self.find_alpha(a, n)
    }

    fn f_alpha_survival(&self, alpha: f64, a: f64) -> f64 {
        let angle = alpha * (a - self.sigma);
        let (sin_a, cos_a) = angle.sin_cos();
        alpha * self.sigma * cos_a + self.hsigma_p_1 * sin_a
    }
}

#[allow(non_snake_case)]
impl PairGreensFunction for FirstPassagePairGF {
    fn name(&self) -> &str {
        "FirstPassagePairGF"
    }

    fn getD(&self) -> f64 {
        self.D
    }

    fn getkf(&self) -> f64 {
        self.kf
    }

    fn getSigma(&self) -> f64 {
        self.sigma
    }

    fn geta(&self) -> Option<f64> {
        self.a
    }

    fn set_a(&mut self, a: f64) -> Result<(), PairGFError> {
        self.check_a(a)?;
        if self.a != Some(a) {
            debug!("{}: outer radius set to {}", self.name(), a);
            self.a = Some(a);
            self.alpha_table.get_mut().clear();
        }
        Ok(())
    }

    fn p_survival(&self, t: f64, r0: f64) -> Result<f64, PairGFError> {
        check_time(t)?;
        let a = self.current_a()?;
        self.check_r0(r0, a)?;
        if r0 == a {
            return Ok(0.0);
        }
        if t == 0.0 {
            return Ok(1.0);
        }
        if self.one_boundary_out_of_reach(t, r0, a) {
            let (reacted, escaped) = self.short_time_losses(t, r0, a);
            return Ok((1.0 - reacted - escaped).clamp(0.0, 1.0));
        }
        let n = self
            .series_terms(t, a)
            .ok_or(PairGFError::TimeBelowResolution(t))?;
        Ok(self.survival_series(a, t, r0, n)?.clamp(0.0, 1.0))
    }

    fn draw_time(&self, rnd: f64, r0: f64) -> Result<f64, PairGFError> {
        check_random_number(rnd)?;
        let a = self.current_a()?;
        self.check_r0(r0, a)?;
        if rnd == 0.0 || r0 == a {
            return Ok(0.0);
        }
        let target = 1.0 - rnd;
        if target == 1.0 {
            return Ok(0.0);
        }
        let f = |t: f64| -> Result<f64, PairGFError> { Ok(self.p_survival(t, r0)? - target) };

        let L = a - self.sigma;
        let t_guess = L * L / (6.0 * self.D);
        let mut high = t_guess;
        let mut steps = 0;
        while f(high)? > 0.0 {
            high *= 10.0;
            steps += 1;
            if steps > MAX_BRACKET_STEPS {
                return Err(PairGFError::NoConvergence {
                    what: "draw_time upper bracket",
                    iterations: MAX_BRACKET_STEPS,
                });
            }
        }
        let mut low = t_guess;
        steps = 0;
        while f(low)? < 0.0 {
            low /= 10.0;
            steps += 1;
            if steps > MAX_BRACKET_STEPS {
                return Err(PairGFError::NoConvergence {
                    what: "draw_time lower bracket",
                    iterations: MAX_BRACKET_STEPS,
                });
            }
        }
        brent(
            f,
            low,
            high,
            BrentTolerance::relative(TIME_REL_TOL),
            "draw_time",
        )
    }

    fn p_int_r(&self, r: f64, t: f64, r0: f64) -> Result<f64, PairGFError> {
        check_time(t)?;
        let a = self.current_a()?;
        self.check_r0(r0, a)?;
        self.check_r(r, a)?;
        if r0 == a {
            return Ok(0.0);
        }
        let step = if r >= r0 { 1.0 } else { 0.0 };
        if t == 0.0 {
            return Ok(step);
        }
        match self.series_terms(t, a) {
            Some(n) => Ok(self.p_int_r_series(r, a, t, r0, n)?.clamp(0.0, 1.0)),
            // r is out of reach as well: all or none of the surviving pairs lie below it
            None if self.out_of_reach(r - r0, t) => Ok(step * self.p_survival(t, r0)?),
            None => Err(PairGFError::TimeBelowResolution(t)),
        }
    }

    fn flux_reaction(&self, t: f64, r0: f64) -> Result<f64, PairGFError> {
        check_time(t)?;
        let a = self.current_a()?;
        self.check_r0(r0, a)?;
        if self.kf == 0.0 || t == 0.0 || r0 == a {
            return Ok(0.0);
        }
        if self.one_boundary_out_of_reach(t, r0, a) {
            return Ok(self.short_time_fluxes(t, r0, a).0);
        }
        let n = self
            .series_terms(t, a)
            .ok_or(PairGFError::TimeBelowResolution(t))?;
        let L = a - self.sigma;
        let sum = self.series_sum(a, t, r0, n, |alpha| (alpha * L).sin())?;
        Ok(self.kf / (4.0 * PI * self.sigma) * sum)
    }

    fn flux_escape(&self, t: f64, r0: f64) -> Result<f64, PairGFError> {
        check_time(t)?;
        let a = self.current_a()?;
        self.check_r0(r0, a)?;
        if t == 0.0 || r0 == a {
            return Ok(0.0);
        }
        if self.one_boundary_out_of_reach(t, r0, a) {
            return Ok(self.short_time_fluxes(t, r0, a).1);
        }
        let n = self
            .series_terms(t, a)
            .ok_or(PairGFError::TimeBelowResolution(t))?;
        let sum = self.series_sum(a, t, r0, n, |alpha| alpha)?;
        Ok(self.D * a * sum)
    }

    fn draw_event_type(&self, rnd: f64, t: f64, r0: f64) -> Result<EventKind, PairGFError> {
        check_random_number(rnd)?;
        check_time(t)?;
        let a = self.current_a()?;
        self.check_r0(r0, a)?;
        if self.kf == 0.0 || r0 == a {
            return Ok(EventKind::Escape);
        }
        let reaction = self.flux_reaction(t, r0)?.max(0.0);
        let escape = self.flux_escape(t, r0)?.max(0.0);
        let total = reaction + escape;
        if !(total > 0.0) || !total.is_finite() {
            // no resolvable flux: the nearer boundary is hit
            return Ok(if r0 - self.sigma < a - r0 {
                EventKind::Reaction
            } else {
                EventKind::Escape
            });
        }
        if rnd < reaction / total {
            Ok(EventKind::Reaction)
        } else {
            Ok(EventKind::Escape)
        }
    }

    fn draw_r(&self, rnd: f64, t: f64, r0: f64) -> Result<f64, PairGFError> {
        check_random_number(rnd)?;
        check_time(t)?;
        let a = self.current_a()?;
        self.check_r0(r0, a)?;
        if t == 0.0 {
            return Ok(r0);
        }
        if r0 == a {
            return Err(PairGFError::VanishingSurvival(t));
        }
        let n = self
            .series_terms(t, a)
            .ok_or(PairGFError::TimeBelowResolution(t))?;
        let survival = self.survival_series(a, t, r0, n)?;
        if !(survival > 0.0) {
            return Err(PairGFError::VanishingSurvival(t));
        }
        let target = rnd * survival;
        brent(
            |r| Ok(self.p_int_r_series(r, a, t, r0, n)? - target),
            self.sigma,
            a,
            BrentTolerance::relative(RADIUS_REL_TOL),
            "draw_r",
        )
    }
}
