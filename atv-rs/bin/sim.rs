use std::{env, path::Path, process};

use atv::{io::Sites, prelude::*};
use log::{error, info, LevelFilter};
use rand::{rngs::SmallRng, SeedableRng};
use simple_logger::SimpleLogger;

const DEFAULT_CONFIG: &str = "sim.toml";

fn load_config() -> Result<SimConfig> {
    match env::args().nth(1) {
        Some(path) => SimConfig::load(path),
        None if Path::new(DEFAULT_CONFIG).exists() => SimConfig::load(DEFAULT_CONFIG),
        None => {
            info!("no {} found, using defaults", DEFAULT_CONFIG);
            Ok(SimConfig::default())
        }
    }
}

fn run() -> Result<()> {
    let cfg = load_config()?;
    if cfg.verbose {
        log::set_max_level(LevelFilter::Debug);
        println!("{:#?}", cfg);
    }

    let sites = Sites::load(&cfg.sites)?;
    let scenario = cfg.scenario(&sites)?;
    println!("{}", scenario.model().describe());

    let seeds = cfg.seeds();
    let output = if seeds.len() == 1 {
        let mut rng = SmallRng::seed_from_u64(seeds[0]);
        let mut reporter = LogReporter::new(10, scenario.model().compartment_labels());
        ChainBinomial.run_with(&scenario, &mut rng, &mut reporter)?
    } else {
        let outputs = run_ensemble(&ChainBinomial, &scenario, &seeds)?;
        if let Some(summary) = EnsembleSummary::summarize(&outputs) {
            println!("{}", summary);
        }
        match outputs.into_iter().next() {
            Some(out) => out,
            None => return Ok(()),
        }
    };

    output.save_csv(&cfg.output)?;
    info!("wrote {}", cfg.output.display());
    println!("{}", output.column_report());
    Ok(())
}

pub fn main() {
    // debug records are let through by the logger and gated by max_level
    if let Err(e) = SimpleLogger::new().with_level(LevelFilter::Debug).init() {
        eprintln!("could not start logger: {}", e);
    }
    log::set_max_level(LevelFilter::Info);
    if let Err(e) = run() {
        error!("{}", e);
        process::exit(1);
    }
}
