use std::{path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use colored::Colorize;
use log::LevelFilter;

use changtian::{
    config::ToolConfig,
    convert::{Input, example},
    ctx::AppContext,
};

/// 长天快速世界书: world book converter and Android build helper
#[derive(Parser, Debug)]
#[command(name = "changtian")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Project root
    #[arg(short, long, global = true, default_value = ".")]
    project: PathBuf,

    /// Configuration file [default: <project>/.changtian.toml]
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert a pseudo-XML world book to Tavo JSON
    Convert {
        /// Input file, `-` or nothing for stdin
        input: Option<PathBuf>,

        /// Output file [default: stdout]
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Single-line JSON
        #[arg(long)]
        compact: bool,
    },

    /// Print a sample world book entry
    Example,

    /// Inspect and edit buildozer.spec
    Spec {
        #[command(subcommand)]
        command: SpecCommands,
    },

    /// Android build environment
    Env {
        #[command(subcommand)]
        command: EnvCommands,
    },

    /// Tool configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum SpecCommands {
    /// Lint the spec file; fails on errors
    Check { file: Option<PathBuf> },

    /// Print the recognised keys
    Show {
        file: Option<PathBuf>,

        /// Print JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Print one raw value
    Get {
        section: String,
        key: String,
        file: Option<PathBuf>,
    },

    /// Set one value, keeping the rest of the file intact
    Set {
        section: String,
        key: String,
        value: String,
        file: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum EnvCommands {
    /// Check the SDK, fix aidl and link the SDK for Buildozer
    #[command(alias = "setup-environment")]
    Setup,

    /// Clean and build a debug APK
    #[command(alias = "run-build")]
    Build,

    /// Look for built APKs and analyse the build log
    #[command(alias = "check-result")]
    Check,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Print the JSON schema of .changtian.toml
    Schema,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{}", format!("Error: {e:#}").red());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let Cli {
        project,
        config,
        command,
        ..
    } = cli;

    match command {
        Commands::Example => {
            println!("{}", example());
            Ok(true)
        }
        Commands::Config {
            command: ConfigCommands::Schema,
        } => {
            println!("{}", ToolConfig::schema_json()?);
            Ok(true)
        }
        Commands::Convert {
            input,
            output,
            compact,
        } => {
            let ctx = AppContext::new(project, config).await?;
            ctx.convert(Input::from_arg(input.as_deref()), output.as_deref(), compact)
                .await?;
            Ok(true)
        }
        Commands::Spec { command } => {
            let ctx = AppContext::new(project, config).await?;
            match command {
                SpecCommands::Check { file } => ctx.spec_check(file.as_deref()),
                SpecCommands::Show { file, json } => {
                    ctx.spec_show(file.as_deref(), json)?;
                    Ok(true)
                }
                SpecCommands::Get { section, key, file } => {
                    ctx.spec_get(&section, &key, file.as_deref())?;
                    Ok(true)
                }
                SpecCommands::Set {
                    section,
                    key,
                    value,
                    file,
                } => {
                    ctx.spec_set(&section, &key, &value, file.as_deref())?;
                    Ok(true)
                }
            }
        }
        Commands::Env { command } => {
            let ctx = AppContext::new(project, config).await?;
            match command {
                EnvCommands::Setup => {
                    ctx.setup_environment().await?;
                    Ok(true)
                }
                EnvCommands::Build => ctx.run_build().await,
                EnvCommands::Check => ctx.check_result(),
            }
        }
    }
}
