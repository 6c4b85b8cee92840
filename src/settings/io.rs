// src/settings/io.rs
use bevy::log::{debug, error, info};
use directories_next::ProjectDirs;
use std::fs;
use std::io::{self, BufReader, BufWriter, ErrorKind};
use std::path::{Path, PathBuf};

const QUALIFIER: &str = "com";
const ORGANIZATION: &str = "Gridwind";
const APPLICATION: &str = "Gridwind";
const CONFIG_FILE: &str = "grid_settings.json";

fn get_config_path() -> io::Result<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION) {
        let config_dir = proj_dirs.config_dir();
        fs::create_dir_all(config_dir)?;
        Ok(config_dir.join(CONFIG_FILE))
    } else {
        Err(io::Error::new(
            ErrorKind::NotFound,
            "Could not determine project directories for grid settings.",
        ))
    }
}

pub fn load_settings_from_file<T>() -> io::Result<T>
where
    T: for<'de> serde::de::Deserialize<'de> + Default,
{
    load_settings_from_path(&get_config_path()?)
}

pub fn load_settings_from_path<T: for<'de> serde::de::Deserialize<'de> + Default>(
    config_file: &Path,
) -> io::Result<T> {
    info!("GridSettings: Attempting to load settings from {:?}", config_file);
    match fs::File::open(config_file) {
        Ok(file) => {
            let reader = BufReader::new(file);
            match serde_json::from_reader(reader) {
                Ok(settings) => {
                    info!("GridSettings: Successfully deserialized settings.");
                    Ok(settings)
                }
                Err(e) => {
                    error!("GridSettings: Failed to parse settings file {:?}: {}", config_file, e);
                    Err(io::Error::new(
                        ErrorKind::InvalidData,
                        format!("Failed to parse settings file: {}", e),
                    ))
                }
            }
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!("GridSettings: Settings file not found at {:?}. Returning default.", config_file);
            Ok(Default::default())
        }
        Err(e) => {
            error!("GridSettings: Failed to open settings file {:?}: {}", config_file, e);
            Err(e)
        }
    }
}

pub fn save_settings_to_file<T: serde::Serialize>(settings: &T) -> io::Result<()> {
    save_settings_to_path(settings, &get_config_path()?)
}

pub fn save_settings_to_path<T: serde::Serialize>(
    settings: &T,
    config_file: &Path,
) -> io::Result<()> {
    info!("GridSettings: Saving settings to {:?}", config_file);
    let file = fs::File::create(config_file)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, settings).map_err(|e| {
        error!("GridSettings: Failed to serialize settings to {:?}: {}", config_file, e);
        io::Error::other(e)
    })?;
    debug!("GridSettings: settings written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::GridSettings;

    fn scratch_file() -> PathBuf {
        std::env::temp_dir().join(format!("gridwind-settings-{}.json", uuid::Uuid::new_v4()))
    }

    #[test]
    fn missing_file_yields_defaults() {
        let settings: GridSettings = load_settings_from_path(&scratch_file()).unwrap();
        assert_eq!(settings, GridSettings::default());
    }

    #[test]
    fn saved_settings_load_back_and_missing_keys_default() {
        let path = scratch_file();
        let custom = GridSettings {
            page_size: 25,
            ..GridSettings::default()
        };
        save_settings_to_path(&custom, &path).unwrap();
        let loaded: GridSettings = load_settings_from_path(&path).unwrap();
        assert_eq!(loaded.page_size, 25);

        fs::write(&path, r#"{ "overscan": 2 }"#).unwrap();
        let partial: GridSettings = load_settings_from_path(&path).unwrap();
        assert_eq!(partial.overscan, 2);
        assert_eq!(partial.page_size, GridSettings::default().page_size);
        let _ = fs::remove_file(path);
    }
}
