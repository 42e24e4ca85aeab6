//! The `config` command: inspect the active configuration.

use clap::{Args, Subcommand};

use faceclear_core::Config;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Print the active configuration as TOML
    Show,

    /// Print the config file path
    Path,
}

/// Execute the config command.
pub fn execute(args: ConfigArgs, config: Config) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_path().display());
            Ok(())
        }
    }
}
