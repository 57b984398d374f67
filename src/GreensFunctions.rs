/// Common interface of pair Green's functions: the production surface (survival probability,
/// first-passage time, event type and radial sampling) and the diagnostic surface (roots of the
/// survival eigenvalue equation). Also the error type shared by all backends.
pub mod pair_gf_api;
/// Bracketed root finding (Brent's method) used for eigenvalues and for inverse-CDF sampling
pub mod root_finding;
/// Green's function of a diffusing pair in 3D with a radiation boundary at the contact radius sigma
/// (intrinsic rate kf) and an absorbing boundary at the outer radius a.
/// The solution is an eigenfunction expansion
///     p(r, t | r0) = sum_n exp(-D alpha_n^2 t) sin(alpha_n (a - r0)) sin(alpha_n (a - r)) / (4 pi r r0 N_n)
/// where alpha_n are the positive roots of
///     alpha sigma cos(alpha (a - sigma)) + (1 + h sigma) sin(alpha (a - sigma)) = 0,  h = kf / (4 pi sigma^2 D)
/// # Examples
/// ```
/// use PairGreens::GreensFunctions::first_passage_pair::FirstPassagePairGF;
/// use PairGreens::GreensFunctions::pair_gf_api::PairGreensFunction;
/// let mut gf = FirstPassagePairGF::new(1e-12, 1e-18, 1e-8).unwrap();
/// gf.set_a(6e-8).unwrap();
/// let s = gf.p_survival(1e-5, 5e-8).unwrap();
/// assert!(s > 0.0 && s < 1.0);
/// let t = gf.draw_time(0.5, 5e-8).unwrap();
/// assert!((gf.p_survival(t, 5e-8).unwrap() - 0.5).abs() < 1e-8);
/// ```
pub mod first_passage_pair;
/// Seedable random source feeding the draw operations of a pair Green's function
pub mod sampling;
/// Smoke checks: root residuals, repeated survival evaluation, first-passage time sampling
pub mod diagnostics;
