use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(version, about = "Generate Clash configuration files", long_about = None)]
pub struct Args {
    #[arg(
        short,
        long,
        global = true,
        help = "Settings file, accept file path or URL"
    )]
    pub config: Option<String>,

    #[arg(short, long, global = true, help = "Emit debug log")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Overlay DNS, proxy groups, rule providers and rules onto an existing config
    Rebuild {
        #[arg(help = "Config to rebuild, file path or URL [default: settings `source`]")]
        input: Option<String>,

        #[arg(help = "Output path [default: settings `output`]")]
        output: Option<String>,
    },

    /// Convert vmess:// links and merge them into a config
    Import {
        #[arg(help = "File containing links [default: standard input]")]
        input: Option<String>,

        #[arg(help = "Output path [default: settings `output`]")]
        output: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rebuild_with_paths() {
        let args = Args::try_parse_from(["clashforge", "rebuild", "in.yaml", "out.yaml"]).unwrap();
        assert!(!args.verbose);
        assert!(args.config.is_none());
        match args.command {
            Command::Rebuild { input, output } => {
                assert_eq!(input.as_deref(), Some("in.yaml"));
                assert_eq!(output.as_deref(), Some("out.yaml"));
            }
            Command::Import { .. } => panic!("Expected rebuild"),
        }
    }

    #[test]
    fn test_parse_import_global_flags_after_subcommand() {
        let args =
            Args::try_parse_from(["clashforge", "import", "-v", "-c", "settings.toml"]).unwrap();
        assert!(args.verbose);
        assert_eq!(args.config.as_deref(), Some("settings.toml"));
        match args.command {
            Command::Import { input, output } => {
                assert!(input.is_none());
                assert!(output.is_none());
            }
            Command::Rebuild { .. } => panic!("Expected import"),
        }
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Args::try_parse_from(["clashforge"]).is_err());
    }
}
