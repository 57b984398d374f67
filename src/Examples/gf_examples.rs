use crate::GreensFunctions::diagnostics::{check_alpha_roots, check_draw_time, check_p_survival};
use crate::GreensFunctions::first_passage_pair::FirstPassagePairGF;
use crate::GreensFunctions::pair_gf_api::PairGFError;
use crate::GreensFunctions::sampling::TimeSampler;
use crate::settings::GFSettings;

/// Runs one of the smoke checks:
/// 0 - residuals of the first roots of the survival eigenvalue equation
/// 1 - repeated evaluation of the survival probability
/// 2 - drawing first-passage times
/// 3 - all of the above
pub fn gf_examples(gftask: usize, settings: &GFSettings) -> Result<(), PairGFError> {
    match gftask {
        0 => {
            let gf = FirstPassagePairGF::new(settings.D, settings.kf, settings.sigma)?;
            let check = check_alpha_roots(
                &gf,
                settings.a_roots,
                settings.root_count,
                settings.root_tolerance,
            )?;
            if !check.passed {
                println!("failed: alpha_survival_n: maxerror = {:e}", check.max_residual);
            }
            check.to_table().printstd();
        }
        1 => {
            let mut gf = FirstPassagePairGF::new(settings.D, settings.kf, settings.sigma)?;
            let check = check_p_survival(
                &mut gf,
                settings.a,
                settings.t,
                settings.r0,
                settings.survival_repeats,
            )?;
            println!("{}", check.p_survival);
            check.to_table().printstd();
        }
        2 => {
            let mut gf = FirstPassagePairGF::new(settings.D, settings.kf, settings.sigma)?;
            let mut sampler = TimeSampler::from_optional_seed(settings.seed);
            let check = check_draw_time(
                &mut gf,
                &mut sampler,
                settings.a,
                settings.r0,
                settings.time_samples,
            )?;
            println!("{}", check.median_draw);
            check.to_table().printstd();
        }
        3 => {
            for task in 0..3 {
                gf_examples(task, settings)?;
            }
        }
        _ => println!("no such task: {}", gftask),
    }
    Ok(())
}
