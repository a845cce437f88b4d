use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;

#[derive(Debug, Subcommand, PartialEq)]
pub(crate) enum Command {
    /// Validate a bindings file.
    Check {
        /// The bindings file to check
        #[clap(short, long)]
        bindings: PathBuf,
    },
    /// Replay a recorded input trace through the driver.
    Replay {
        /// The bindings to run
        #[clap(short, long)]
        bindings: PathBuf,
        /// The recorded device frames
        #[clap(short, long)]
        trace: PathBuf,
        /// Control period used with --realtime
        #[clap(long, default_value_t = 20)]
        period_ms: u64,
        /// Pace cycles at the control period instead of running flat out
        #[clap(long)]
        realtime: bool,
    },
}

/// Resolves operator input and scripted macros into machine operations.
#[derive(Parser)]
#[command(version, about, long_about = None)]
pub(crate) struct Cli {
    /// Turn debugging information on
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// The command to run
    #[clap(subcommand)]
    pub command: Command,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_replay_arguments() {
        let cli = Cli::try_parse_from([
            "opshiftd",
            "-v",
            "replay",
            "--bindings",
            "bindings.yaml",
            "--trace",
            "match.yaml",
            "--realtime",
        ])
        .expect("arguments should parse");

        assert!(cli.verbose);
        assert_eq!(
            cli.command,
            Command::Replay {
                bindings: PathBuf::from("bindings.yaml"),
                trace: PathBuf::from("match.yaml"),
                period_ms: 20,
                realtime: true,
            }
        );
    }

    #[test]
    fn check_requires_bindings() {
        assert!(Cli::try_parse_from(["opshiftd", "check"]).is_err());
    }
}
