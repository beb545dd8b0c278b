use clap::{Parser, Subcommand};

fn get_version() -> &'static str {
    const BASE_VERSION: &str = env!("CARGO_PKG_VERSION");

    // Release builds carry the tag alone
    if let Some(tag) = option_env!("GOVM_GIT_TAG") {
        return tag;
    }

    let commit = option_env!("GOVM_GIT_COMMIT").unwrap_or("unknown");
    let branch = option_env!("GOVM_GIT_BRANCH").unwrap_or("unknown");

    // Built once per process
    let version = format!("v{}-{} ({})", BASE_VERSION, commit, branch);
    Box::leak(version.into_boxed_str())
}

#[derive(Parser)]
#[command(name = "govm")]
#[command(about = "A version manager for the Go toolchain")]
#[command(version = get_version())]
pub struct Cli {
    /// Mirror logs to stderr (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// List the Go versions available for this platform
    List,

    /// Install a Go version (e.g. 'go1.22.1')
    Install {
        version: String,
    },

    /// Switch the active Go toolchain to the given version
    Use {
        version: String,
    },

    /// Update the installed Go version
    #[command(after_help = "Strategies:\n  patch  newest release of the same major.minor\n  minor  newest release of the same major\n  major  newest release overall")]
    Update {
        /// One of patch, minor, major
        #[arg(short, long, default_value = "patch")]
        strategy: String,
    },

    /// Remove the active Go installation
    Uninstall {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}
