use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// multipip: detach several page videos into floating picture-in-picture
/// windows.
#[derive(Parser, Debug)]
#[command(name = "multipip", version, about)]
pub struct Args {
    /// Settings file path override.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Load a document snapshot and answer JSON requests read from stdin,
    /// one per line.
    Bridge {
        /// JSON document snapshot to host.
        #[arg(long)]
        document: PathBuf,
    },
    /// Inspect the settings file.
    Config {
        /// Print the effective settings as JSON.
        #[arg(long)]
        print: bool,
    },
}

pub fn parse() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bridge_requires_document() {
        assert!(Args::try_parse_from(["multipip", "bridge"]).is_err());

        let args = Args::try_parse_from(["multipip", "bridge", "--document", "page.json"]).unwrap();
        assert_eq!(
            args.command,
            Command::Bridge {
                document: PathBuf::from("page.json")
            }
        );
        assert!(args.config.is_none());
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let args = Args::try_parse_from([
            "multipip",
            "config",
            "--print",
            "--config",
            "/tmp/settings.toml",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(args.command, Command::Config { print: true });
        assert_eq!(args.config, Some(PathBuf::from("/tmp/settings.toml")));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Args::try_parse_from(["multipip"]).is_err());
    }
}
