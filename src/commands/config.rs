use anyhow::Result;
use colored::Colorize;

use crate::{
    cli::ConfigCmd,
    types::{CONFIG_KEYS, Config},
};

pub async fn handle(cmd: ConfigCmd) -> Result<()> {
    let mut cfg = Config::load()?;

    match cmd {
        ConfigCmd::List => {
            println!("{}", "Config:".cyan().bold());
            for key in CONFIG_KEYS {
                match cfg.get(key) {
                    Some(val) => println!("  {} = {}", key.green(), val),
                    None => println!("  {} = {}", key.green(), "(unset)".dimmed()),
                }
            }
        }

        ConfigCmd::Get { key } => match cfg.get(&key) {
            Some(val) => println!("{}", val),
            None => println!(
                "{} key `{}` not set",
                "warning:".yellow().bold(),
                key
            ),
        },

        ConfigCmd::Set { key, val } => match cfg.set(&key, &val) {
            Ok(()) => {
                cfg.save()?;
                println!(
                    "{} set `{}` = `{}`",
                    "info:".blue().bold(),
                    key.green(),
                    val
                );
            }
            Err(e) => println!("{} {}", "warning:".yellow().bold(), e),
        },

        ConfigCmd::Unset { key } => match cfg.unset(&key) {
            Ok(true) => {
                cfg.save()?;
                println!("{} removed `{}`", "info:".blue().bold(), key.green());
            }
            Ok(false) => println!(
                "{} key `{}` was not set",
                "warning:".yellow().bold(),
                key
            ),
            Err(e) => println!("{} {}", "warning:".yellow().bold(), e),
        },
    }

    Ok(())
}
