use std::path::PathBuf;

use clap::Parser;
use pfeval::pid::PidCategory;

#[derive(Debug, Parser)]
#[clap(about, author, version)]
pub(crate) struct Opt {
    /// Analysis configuration in YAML format.
    #[clap(long, short, value_parser)]
    pub(crate) config: Option<PathBuf>,

    /// Particle categories for efficiencies and fake rates.
    ///
    /// Overrides the categories from the configuration file.
    #[clap(
        long,
        value_delimiter = ',',
        help = "Particle categories for efficiencies and fake rates.
Possible values are 'all', 'photon', 'neutral_hadron', 'charged_hadron',
'lepton', 'neutral', 'charged'."
    )]
    pub(crate) categories: Option<Vec<PidCategory>>,

    /// Don't calibrate the jet transverse momentum.
    #[clap(long)]
    pub(crate) no_jet_calibration: bool,

    /// Verbosity level
    #[clap(
        short,
        long,
        default_value = "Info",
        help = "Verbosity level.
Possible values with increasing amount of output are
'off', 'error', 'warn', 'info', 'debug', 'trace'.\n"
    )]
    pub(crate) loglevel: String,

    /// Matched objects and jets in YAML format.
    #[clap(name = "INFILE", value_parser)]
    pub(crate) infile: PathBuf,
}
