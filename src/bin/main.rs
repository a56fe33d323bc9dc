mod opt;

use std::fs::File;
use std::io::{stdout, BufReader};

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::{debug, info};
use pfeval::{
    analysis::{Analysis, Input},
    config::Config,
    GIT_BRANCH, GIT_REV, VERSION,
};

use crate::opt::Opt;

fn main() -> Result<()> {
    let args = argfile::expand_args_from(
        std::env::args_os(),
        argfile::parse_fromfile,
        argfile::PREFIX,
    )
    .with_context(|| "Failed to read argument file")?;
    let opt = Opt::parse_from(args);

    let env = Env::default().filter_or("PFEVAL_LOG", &opt.loglevel);
    env_logger::init_from_env(env);

    if let (Some(rev), Some(branch)) = (GIT_REV, GIT_BRANCH) {
        info!("pfeval {VERSION} rev {rev} ({branch})");
    } else {
        info!("pfeval {VERSION}");
    }

    debug!("settings: {:#?}", opt);

    let mut config = if let Some(path) = &opt.config {
        let file = File::open(path)
            .with_context(|| format!("Failed to open {path:?}"))?;
        Config::from_reader(BufReader::new(file)).with_context(|| {
            format!("Failed to read configuration from {path:?}")
        })?
    } else {
        Config::default()
    };
    if let Some(categories) = opt.categories {
        config.ratio_categories = categories;
    }
    if opt.no_jet_calibration {
        config.calibrate_jets = false;
    }
    debug!("configuration: {:#?}", config);
    let analysis = Analysis::try_from(config)?;

    let infile = &opt.infile;
    info!("Reading {infile:?}");
    let file = File::open(infile)
        .with_context(|| format!("Failed to open {infile:?}"))?;
    let input: Input = serde_yaml::from_reader(BufReader::new(file))
        .with_context(|| {
            format!("Failed to read analysis input from {infile:?}")
        })?;
    info!(
        "Read {} objects and {} jets",
        input.objects.len(),
        input.jets.len()
    );

    let report = analysis.run(input)?;
    serde_yaml::to_writer(stdout().lock(), &report)
        .with_context(|| "Failed to write report")?;
    info!("done");
    Ok(())
}
