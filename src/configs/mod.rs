/*
This code is part of the shape2svg vector rendering tool.
Created: 28/05/2024
Last Modified: 28/05/2024
License: MIT
*/
use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::File;
use std::io::prelude::*;
use std::io::{Error, ErrorKind};
use std::path;

/// A structure to hold environment settings. Backed by a settings.json
/// file in the working directory.
#[derive(Serialize, Deserialize, Debug)]
pub struct Configs {
    pub verbose_mode: bool,
    pub working_directory: String,
}

impl Configs {
    pub fn new() -> Configs {
        Configs {
            verbose_mode: false,
            working_directory: String::new(),
        }
    }
}

fn config_file_path() -> Result<String, Error> {
    let dir = std::env::current_dir()?;
    Ok(format!(
        "{}{}settings.json",
        dir.display(),
        path::MAIN_SEPARATOR
    ))
}

/// Loads the settings, falling back to defaults when no settings.json
/// exists yet.
pub fn get_configs() -> Result<Configs, Error> {
    let config_file = config_file_path()?;
    let configs = match fs::read_to_string(config_file) {
        Ok(contents) => serde_json::from_str(&contents).map_err(|e| {
            Error::new(
                ErrorKind::InvalidData,
                format!("Failed to parse settings.json file: {}", e),
            )
        })?,
        Err(_) => Configs::new(),
    };
    Ok(configs)
}

pub fn save_configs(configs: &Configs) -> Result<(), Error> {
    let configs_json = serde_json::to_string_pretty(&configs)?;
    let mut file = File::create(config_file_path()?)?;
    file.write_all(configs_json.as_bytes())?;
    Ok(())
}
