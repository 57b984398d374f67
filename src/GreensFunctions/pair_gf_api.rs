//! # Pair Green's function API
//!
//! ## Purpose
//! Describes what calling code needs from a pair Green's function backend, independent of how
//! the backend computes it. Two surfaces are kept apart:
//! - **PairGreensFunction**: production queries (survival probability, first-passage time,
//!   event type, radial position) at the currently configured outer radius
//! - **SurvivalRoots**: eigenvalue roots of the survival problem and the residual used to verify them
//!
//! Sampling and diagnostics code is generic over these traits, so an alternative numerical
//! backend is plugged in by implementing them.
//!
//! ## Units
//! Any consistent unit system. The examples use SI: D in m^2/s, kf in m^3/s, radii in m, time in s.
use std::fmt;
use thiserror::Error;

/// error types shared by pair Green's function backends
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PairGFError {
    #[error("Invalid parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },
    #[error("Outer radius a = {a} must be finite and exceed sigma = {sigma}")]
    InvalidOuterRadius { a: f64, sigma: f64 },
    #[error("Outer radius a is not set, call set_a first")]
    OuterRadiusNotSet,
    #[error("Initial distance r0 = {r0} is outside [{sigma}, {a}]")]
    InitialDistanceOutOfRange { r0: f64, sigma: f64, a: f64 },
    #[error("Radius r = {r} is outside [{sigma}, {a}]")]
    RadiusOutOfRange { r: f64, sigma: f64, a: f64 },
    #[error("Invalid time: {0}")]
    InvalidTime(f64),
    #[error("Random number {0} is outside [0, 1)")]
    InvalidRandomNumber(f64),
    #[error("Root is not bracketed in [{low}, {high}]: f(low) = {f_low}, f(high) = {f_high}")]
    RootNotBracketed {
        low: f64,
        high: f64,
        f_low: f64,
        f_high: f64,
    },
    #[error("{what} did not converge after {iterations} iterations")]
    NoConvergence { what: &'static str, iterations: usize },
    #[error("Time {0} is below the resolution of the series expansion")]
    TimeBelowResolution(f64),
    #[error("Survival probability vanishes at t = {0}")]
    VanishingSurvival(f64),
}

/// How the first passage of the pair ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// the pair reacted at the contact radius sigma
    Reaction,
    /// the pair separated up to the outer radius a
    Escape,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Reaction => "reaction",
            EventKind::Escape => "escape",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Production surface of a pair Green's function.
///
/// All time-dependent queries refer to the outer radius set with [`PairGreensFunction::set_a`];
/// they return [`PairGFError::OuterRadiusNotSet`] before it has been set.
#[allow(non_snake_case)]
pub trait PairGreensFunction {
    fn name(&self) -> &str;
    /// diffusion coefficient of the relative motion
    fn getD(&self) -> f64;
    /// intrinsic reaction rate
    fn getkf(&self) -> f64;
    /// contact (reaction) radius
    fn getSigma(&self) -> f64;
    /// outer absorbing radius, if set
    fn geta(&self) -> Option<f64>;
    /// Sets the outer absorbing radius. Must exceed sigma.
    fn set_a(&mut self, a: f64) -> Result<(), PairGFError>;
    /// Probability that the pair has neither reacted nor reached a by time t.
    fn p_survival(&self, t: f64, r0: f64) -> Result<f64, PairGFError>;
    /// Inverts the survival probability: returns t with p_survival(t, r0) = 1 - rnd.
    fn draw_time(&self, rnd: f64, r0: f64) -> Result<f64, PairGFError>;
    /// Probability to have survived until t with separation not larger than r.
    fn p_int_r(&self, r: f64, t: f64, r0: f64) -> Result<f64, PairGFError>;
    /// probability flux through sigma (reaction)
    fn flux_reaction(&self, t: f64, r0: f64) -> Result<f64, PairGFError>;
    /// probability flux through a (escape)
    fn flux_escape(&self, t: f64, r0: f64) -> Result<f64, PairGFError>;
    /// Decides which boundary the pair hit, given that the first passage happened at t.
    fn draw_event_type(&self, rnd: f64, t: f64, r0: f64) -> Result<EventKind, PairGFError>;
    /// Samples the separation at time t, conditioned on survival.
    fn draw_r(&self, rnd: f64, t: f64, r0: f64) -> Result<f64, PairGFError>;
}

/// Diagnostic surface: roots of the survival eigenvalue equation at a given outer radius.
pub trait SurvivalRoots {
    /// n-th positive root (n = 0, 1, ...) of the survival eigenvalue equation
    fn alpha_survival_n(&self, a: f64, n: usize) -> Result<f64, PairGFError>;
    /// residual of the eigenvalue equation at alpha; zero at a root
    fn f_alpha_survival(&self, alpha: f64, a: f64) -> f64;
}

/// Checks that rnd is a valid uniform variate in [0, 1)
pub fn check_random_number(rnd: f64) -> Result<(), PairGFError> {
    if !(0.0..1.0).contains(&rnd) {
        return Err(PairGFError::InvalidRandomNumber(rnd));
    }
    Ok(())
}

/// Checks that t is a finite non-negative time
pub fn check_time(t: f64) -> Result<(), PairGFError> {
    if !t.is_finite() || t < 0.0 {
        return Err(PairGFError::InvalidTime(t));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_random_number() {
        assert!(check_random_number(0.0).is_ok());
        assert!(check_random_number(0.999999).is_ok());
        assert_eq!(
            check_random_number(1.0),
            Err(PairGFError::InvalidRandomNumber(1.0))
        );
        assert!(check_random_number(-1e-3).is_err());
        assert!(check_random_number(f64::NAN).is_err());
    }

    #[test]
    fn test_check_time() {
        assert!(check_time(0.0).is_ok());
        assert!(check_time(1e-7).is_ok());
        assert_eq!(check_time(-1.0), Err(PairGFError::InvalidTime(-1.0)));
        assert!(check_time(f64::INFINITY).is_err());
    }

    #[test]
    fn test_error_messages() {
        let err = PairGFError::InvalidOuterRadius {
            a: 1e-9,
            sigma: 1e-8,
        };
        assert_eq!(
            err.to_string(),
            "Outer radius a = 0.000000001 must be finite and exceed sigma = 0.00000001"
        );
        assert_eq!(EventKind::Reaction.to_string(), "reaction");
        assert_eq!(EventKind::Escape.as_str(), "escape");
    }
}
