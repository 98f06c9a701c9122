//! Quire CLI
//!
//! Static blog generator with a LaTeX CV build tool.
//!
//! This is the binary entry point. The library functionality is in `lib.rs`.

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::Result;
use quire::cmd::{self, build::BuildArgs, cv::CvStatus};

/// Command-line interface for Quire.
#[derive(Parser)]
#[command(
    name = "quire",
    version,
    about = "A static blog generator with a LaTeX CV build tool"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "quire.toml")]
    config: PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(clap::Subcommand)]
enum Commands {
    /// Build the site
    Build {
        /// Fail if any document was skipped or any template warned
        #[arg(long)]
        strict: bool,
        /// Include draft documents
        #[arg(long)]
        drafts: bool,
        /// Output directory (overrides build.output_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Remove the output directory
    Clean,
    /// Build, then serve the output and rebuild on change
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = 3000)]
        port: u16,
        /// Include draft documents
        #[arg(long)]
        drafts: bool,
    },
    /// Typeset and check the LaTeX CV
    Cv {
        #[command(subcommand)]
        action: CvCommand,
    },
}

/// CV subcommands.
#[derive(clap::Subcommand)]
enum CvCommand {
    /// Typeset the PDF and run the quality checker
    Build {
        /// Source directory (overrides typeset.source_dir)
        #[arg(short, long)]
        source: Option<PathBuf>,
    },
    /// Remove typesetting artifacts
    Clean {
        /// Source directory (overrides typeset.source_dir)
        #[arg(short, long)]
        source: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    quire::init_tracing(cli.verbose);

    match cli.command {
        Commands::Build {
            strict,
            drafts,
            output,
        } => {
            let args = BuildArgs {
                strict,
                drafts,
                output,
            };
            cmd::build::run(&cli.config, &args)?;
        }
        Commands::Clean => {
            cmd::clean::run(&cli.config)?;
        }
        Commands::Serve { port, drafts } => {
            let args = BuildArgs {
                drafts,
                ..BuildArgs::default()
            };
            cmd::serve::run(&cli.config, port, args).await?;
        }
        Commands::Cv { action } => match action {
            CvCommand::Build { source } => {
                if let CvStatus::EngineFailed(code) =
                    cmd::cv::build(&cli.config, source.as_deref())?
                {
                    std::process::exit(code);
                }
            }
            CvCommand::Clean { source } => {
                cmd::cv::clean(&cli.config, source.as_deref())?;
            }
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn test_cli_build_command_parsing() {
        let args = ["quire", "build", "--output", "dist"];
        let cli = Cli::parse_from(args);

        assert_eq!(cli.config, PathBuf::from("quire.toml"));
        assert_eq!(cli.verbose, 0);

        match cli.command {
            Commands::Build {
                strict,
                drafts,
                output,
            } => {
                assert_eq!(output, Some(PathBuf::from("dist")));
                assert!(!strict);
                assert!(!drafts);
            }
            _ => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_cli_build_strict_and_drafts() {
        let args = ["quire", "build", "--strict", "--drafts"];
        let cli = Cli::parse_from(args);

        match cli.command {
            Commands::Build {
                strict,
                drafts,
                output,
            } => {
                assert!(strict);
                assert!(drafts);
                assert!(output.is_none());
            }
            _ => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_cli_clean_command_parsing() {
        let cli = Cli::parse_from(["quire", "clean"]);
        assert!(matches!(cli.command, Commands::Clean));
    }

    #[test]
    fn test_cli_serve_command_parsing() {
        let args = ["quire", "serve", "--port", "8080"];
        let cli = Cli::parse_from(args);

        match cli.command {
            Commands::Serve { port, drafts } => {
                assert_eq!(port, 8080);
                assert!(!drafts);
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_cli_cv_command_parsing() {
        let cli = Cli::parse_from(["quire", "cv", "build", "--source", "resume"]);
        match cli.command {
            Commands::Cv {
                action: CvCommand::Build { source },
            } => assert_eq!(source, Some(PathBuf::from("resume"))),
            _ => panic!("Expected cv build command"),
        }

        let cli = Cli::parse_from(["quire", "cv", "clean"]);
        assert!(matches!(
            cli.command,
            Commands::Cv {
                action: CvCommand::Clean { source: None }
            }
        ));
    }

    #[test]
    fn test_cli_verbosity_flags() {
        let args = ["quire", "-vvv", "build"];
        let cli = Cli::parse_from(args);
        assert_eq!(cli.verbose, 3);
    }

    #[test]
    fn test_cli_custom_config_path() {
        let args = ["quire", "--config", "site.toml", "build"];
        let cli = Cli::parse_from(args);
        assert_eq!(cli.config, PathBuf::from("site.toml"));
    }
}
