use std::{env, path::Path, process};

use atv::{
    incidence::{cumulative_by_region, cumulative_by_year, render_final_stats, save_points},
    io::load_swabs,
    prelude::*,
};
use log::{error, info, LevelFilter};
use simple_logger::SimpleLogger;

const DEFAULT_CONFIG: &str = "swabs.toml";

fn load_config() -> Result<SwabConfig> {
    match env::args().nth(1) {
        Some(path) => SwabConfig::load(path),
        None if Path::new(DEFAULT_CONFIG).exists() => SwabConfig::load(DEFAULT_CONFIG),
        None => Ok(SwabConfig::default()),
    }
}

fn run() -> Result<()> {
    let cfg = load_config()?;
    let records = load_swabs(&cfg.input)?;
    let points = if cfg.by_region {
        cumulative_by_region(&records, &cfg.incidence)
    } else {
        cumulative_by_year(&records, &cfg.incidence)
    };
    save_points(&points, &cfg.output)?;
    info!("wrote {} points to {}", points.len(), cfg.output.display());

    println!("Final statistics:");
    print!("{}", render_final_stats(&points));
    Ok(())
}

pub fn main() {
    if let Err(e) = SimpleLogger::new().with_level(LevelFilter::Info).init() {
        eprintln!("could not start logger: {}", e);
    }
    if let Err(e) = run() {
        error!("{}", e);
        process::exit(1);
    }
}
