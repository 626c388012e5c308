//! Command-line surface of the `harrow` binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "harrow",
    version,
    about = "Moves finished files from source volumes onto destination disks"
)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Start discovery and the destination workers; runs until interrupted.
    Run(ConfigArgs),
    /// Validate the configuration and print the effective settings as JSON.
    Check(ConfigArgs),
    /// List matching files currently present on each source.
    Scan(ConfigArgs),
}

#[derive(Debug, Args)]
pub(crate) struct ConfigArgs {
    /// Configuration file; falls back to `HARROW_CONFIG`.
    #[arg(long, short)]
    pub(crate) config: Option<PathBuf>,
}

impl Command {
    pub(crate) const fn config_args(&self) -> &ConfigArgs {
        match self {
            Self::Run(args) | Self::Check(args) | Self::Scan(args) => args,
        }
    }

    pub(crate) const fn mode(&self) -> &'static str {
        match self {
            Self::Run(_) => "run",
            Self::Check(_) => "check",
            Self::Scan(_) => "scan",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_subcommands_with_config_path() -> Result<(), clap::Error> {
        let cli = Cli::try_parse_from(["harrow", "run", "--config", "/etc/harrow.yaml"])?;
        assert_eq!(cli.command.mode(), "run");
        assert_eq!(
            cli.command.config_args().config,
            Some(PathBuf::from("/etc/harrow.yaml"))
        );

        let cli = Cli::try_parse_from(["harrow", "check", "-c", "h.yaml"])?;
        assert_eq!(cli.command.mode(), "check");

        let cli = Cli::try_parse_from(["harrow", "scan"])?;
        assert!(cli.command.config_args().config.is_none());
        Ok(())
    }

    #[test]
    fn unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["harrow", "serve"]).is_err());
    }
}
