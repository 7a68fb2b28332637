use clap::{Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;

pub const DEFAULT_STATE_FILE: &str = "applied-state.json";
pub const DEFAULT_ADDRESS: &str = "127.0.0.1";

#[derive(Parser, Debug)]
#[command(
    name = "gnbsim-operator",
    version,
    about = "Drive the gnbsim operator core against a local workload directory"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    pub json: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a snapshot and print the gnbsim config it renders to
    Render {
        #[arg(long, help = "Charm snapshot (YAML or JSON)")]
        snapshot: PathBuf,
    },
    /// Plan one pass without applying it
    Plan {
        #[arg(long, help = "Charm snapshot (YAML or JSON)")]
        snapshot: PathBuf,
        #[arg(long, help = "Observed workload status (YAML or JSON); all false when omitted")]
        workload: Option<PathBuf>,
        #[arg(long, help = "Applied-state record from a previous pass")]
        state: Option<PathBuf>,
    },
    /// Run one pass against a local workload directory
    Reconcile {
        #[command(flatten)]
        local: LocalArgs,
    },
    /// Run the simulator once the local workload is ready
    StartSimulation {
        #[command(flatten)]
        local: LocalArgs,
        #[arg(long, default_value_t = 300, allow_negative_numbers = true)]
        timeout: i64,
        #[arg(long, help = "Simulator executable standing in for /bin/gnbsim")]
        simulator: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug)]
pub struct LocalArgs {
    #[arg(long, help = "Charm snapshot (YAML or JSON)")]
    pub snapshot: PathBuf,
    #[arg(long, help = "Directory standing in for the workload filesystem")]
    pub root: PathBuf,
    #[arg(long, help = "Applied-state record; defaults to <root>/applied-state.json")]
    pub state: Option<PathBuf>,
    #[arg(long, default_value = DEFAULT_ADDRESS, help = "Address reported for the workload")]
    pub address: IpAddr,
}

impl LocalArgs {
    pub fn state_path(&self) -> PathBuf {
        self.state
            .clone()
            .unwrap_or_else(|| self.root.join(DEFAULT_STATE_FILE))
    }
}
