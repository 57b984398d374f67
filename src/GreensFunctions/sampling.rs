//! Drawing first-passage times, event types and separations with an explicitly owned random
//! source. A seeded sampler reproduces the same sequence of draws.
use crate::GreensFunctions::pair_gf_api::{EventKind, PairGFError, PairGreensFunction};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Outcome of one first passage: when it happened and through which boundary
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FirstPassageEvent {
    pub time: f64,
    pub kind: EventKind,
}

pub struct TimeSampler<R: Rng> {
    rng: R,
}

impl TimeSampler<StdRng> {
    /// Sampler with a reproducible stream
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seeded if a seed is given, otherwise seeded from system entropy
    pub fn from_optional_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(s) => Self::from_seed(s),
            None => Self {
                rng: StdRng::from_entropy(),
            },
        }
    }
}

impl<R: Rng> TimeSampler<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// uniform variate in [0, 1)
    pub fn uniform(&mut self) -> f64 {
        self.rng.r#gen::<f64>()
    }

    pub fn draw_time<G: PairGreensFunction + ?Sized>(
        &mut self,
        gf: &G,
        r0: f64,
    ) -> Result<f64, PairGFError> {
        let rnd = self.uniform();
        gf.draw_time(rnd, r0)
    }

    pub fn draw_times<G: PairGreensFunction + ?Sized>(
        &mut self,
        gf: &G,
        r0: f64,
        count: usize,
    ) -> Result<Vec<f64>, PairGFError> {
        (0..count).map(|_| self.draw_time(gf, r0)).collect()
    }

    /// Draws the first-passage time and then the boundary through which it happened
    pub fn draw_event<G: PairGreensFunction + ?Sized>(
        &mut self,
        gf: &G,
        r0: f64,
    ) -> Result<FirstPassageEvent, PairGFError> {
        let time = self.draw_time(gf, r0)?;
        let rnd = self.uniform();
        let kind = gf.draw_event_type(rnd, time, r0)?;
        Ok(FirstPassageEvent { time, kind })
    }

    /// separation at time t given survival
    pub fn draw_r<G: PairGreensFunction + ?Sized>(
        &mut self,
        gf: &G,
        t: f64,
        r0: f64,
    ) -> Result<f64, PairGFError> {
        let rnd = self.uniform();
        gf.draw_r(rnd, t, r0)
    }
}
