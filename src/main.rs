use PairGreens::Examples::gf_examples::gf_examples;
use PairGreens::settings::GFSettings;
use log::{LevelFilter, error};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

/// usage: pair_greens [task] [settings.json]
/// task: 0 - roots, 1 - survival probability, 2 - first-passage times (default), 3 - all
pub fn main() {
    if let Err(e) = TermLogger::init(
        LevelFilter::Info,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    ) {
        eprintln!("logger init failed: {}", e);
    }
    let mut args = std::env::args().skip(1);
    let task: usize = args.next().and_then(|s| s.parse().ok()).unwrap_or(2);
    let settings = match args.next() {
        Some(path) => GFSettings::with_settings_file(&path),
        None => GFSettings::default(),
    };
    if let Err(e) = gf_examples(task, &settings) {
        error!("{}", e);
        std::process::exit(1);
    }
}
