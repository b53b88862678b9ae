//! Config commands

use anyhow::anyhow;

use crate::config::Config;
use crate::ConfigCommands;

pub fn handle(action: ConfigCommands, profile: Option<&str>) -> anyhow::Result<()> {
    match action {
        ConfigCommands::Init => {
            let path = Config::default().save(profile).map_err(|e| anyhow!(e))?;
            println!("Configuration initialized at {}", path.display());
        }
        ConfigCommands::Set { key, value } => {
            let mut config = Config::load(profile).unwrap_or_default();
            config.set(&key, value).map_err(|e| anyhow!(e))?;
            config.save(profile).map_err(|e| anyhow!(e))?;
            println!("Set {} successfully", key);
        }
        ConfigCommands::Get { key } => {
            let config = Config::load(profile).unwrap_or_default();
            let value = config.get(&key).map_err(|e| anyhow!(e))?;
            println!("{}: {}", key, value.unwrap_or("(not set)"));
        }
        ConfigCommands::List => {
            let config = Config::load(profile).unwrap_or_default();
            for key in Config::KEYS {
                let value = config.get(key).map_err(|e| anyhow!(e))?;
                println!("{}: {}", key, value.unwrap_or("(not set)"));
            }
        }
    }
    Ok(())
}
