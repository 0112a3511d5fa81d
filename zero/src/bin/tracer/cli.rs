use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};
use evm_tracer::{ModuleKind, TracerConfig};

/// Replays a conflation of execution events and produces its trace columns
#[derive(Parser)]
#[command(version = zero_tracer::version(), propagate_version = true)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Command,

    /// Modules to trace, comma separated. Defaults to every module.
    #[arg(short, long, global = true, env = "TRACER_MODULES", value_delimiter = ',')]
    pub(crate) modules: Vec<ModuleKind>,

    /// Chain the replay-protected transactions must be signed for.
    #[arg(long, global = true, env = "TRACER_CHAIN_ID")]
    pub(crate) chain_id: Option<u64>,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Writes the trace of every module, and their line counts, to a
    /// directory.
    Trace {
        /// The JSON conflation dump.
        #[arg(short, long, env = "TRACER_INPUT", value_hint = ValueHint::FilePath)]
        input: PathBuf,
        #[arg(short, long, env = "TRACER_OUTPUT_DIR", value_hint = ValueHint::DirPath)]
        output_dir: PathBuf,
    },
    /// Prints the line count of every module, without emitting the traces.
    Count {
        /// The JSON conflation dump.
        #[arg(short, long, env = "TRACER_INPUT", value_hint = ValueHint::FilePath)]
        input: PathBuf,
    },
}

impl Cli {
    pub(crate) fn tracer_config(&self) -> TracerConfig {
        let modules = match self.modules.is_empty() {
            true => ModuleKind::ALL.to_vec(),
            false => self.modules.clone(),
        };
        TracerConfig {
            chain_id: self.chain_id,
            modules,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn modules_are_comma_separated() {
        let cli = Cli::parse_from([
            "tracer",
            "count",
            "--input",
            "conflation.json",
            "--modules",
            "txndata,rlptxn",
        ]);
        assert_eq!(
            cli.tracer_config().modules,
            vec![ModuleKind::TxnData, ModuleKind::RlpTxn]
        );
        assert!(matches!(cli.command, Command::Count { .. }));
    }
}
