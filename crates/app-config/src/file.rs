use std::{
    fs,
    io::prelude::*,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, bail};
use serde::{Deserialize, Serialize};

use crate::{
    common::{AppOptions, IconOptions, NetworkOptions},
    Config, Options,
};

#[derive(Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct FileConfiguration {
    pub app: Option<AppOptions>,

    pub network: Option<NetworkOptions>,

    pub icons: Option<IconOptions>,
}

impl FileConfiguration {
    /// Loads `config_path`, or the default config file (created on first use)
    /// when no path is given.
    pub(crate) fn new(config_path: Option<&Path>) -> anyhow::Result<(Self, PathBuf)> {
        let config_path = match config_path {
            Some(config_path) if !config_path.as_os_str().is_empty() => config_path.to_path_buf(),
            _ => Self::create_default_config_file()?,
        };

        let config = Self::load_from_file(&config_path)?;

        Ok((config, config_path))
    }

    pub(crate) fn merge_into_options(&self, options: &mut Options) {
        if let Some(app) = &self.app {
            options.app.merge(app);
        }

        if let Some(network) = &self.network {
            options.network.merge(network);
        }

        if let Some(icons) = &self.icons {
            options.icons.merge(icons);
        }
    }

    pub(crate) fn load_from_file<P>(path: P) -> anyhow::Result<Self>
    where
        P: AsRef<Path>,
    {
        let p = path.as_ref();

        if !p.is_file() {
            bail!("Config file {:?} does not exist or is not a file", &p);
        }

        let config_file = fs::read_to_string(p)
            .map_err(|e| anyhow!("Failed to read config file {:?}: {e}", &p))?;

        toml::from_str::<Self>(&config_file)
            .map_err(|e| anyhow!("Error parsing config file {:?}: {e}", &p))
    }

    fn create_default_config_file() -> anyhow::Result<PathBuf> {
        let file = Self::default_config_path().ok_or_else(|| {
            anyhow!(
                "Failed to get config directory. Please pass a config file with --config-path \
                 or the AUDIO_DOWNLOADER_CONFIG environment variable"
            )
        })?;

        let config_dir: PathBuf = file
            .parent()
            .ok_or_else(|| {
                anyhow!(
                    "Failed to get parent directory of config file. Is the config file in root?"
                )
            })?
            .into();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)?;
        }

        if !file.exists() {
            eprintln!("Config file not found. Creating one at {file:?}");
            let mut f = fs::File::create(&file)?;
            f.write_all(DEFAULT_CONFIG)
                .map_err(|e| anyhow!("Failed to create config file: {e}"))?;
        }

        Ok(file)
    }

    fn default_config_path() -> Option<PathBuf> {
        Config::get_config_dir().map(|x| x.join("config.toml"))
    }
}

pub(crate) const DEFAULT_CONFIG: &[u8] = include_bytes!("./config.toml");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_parses_to_nothing_set() {
        let text = std::str::from_utf8(DEFAULT_CONFIG).unwrap();

        let config: FileConfiguration = toml::from_str(text).unwrap();

        assert_eq!(config.app, Some(AppOptions::default()));
        assert_eq!(config.network, Some(NetworkOptions::default()));
        assert_eq!(config.icons, Some(IconOptions::default()));
    }

    #[test]
    fn loads_values_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(
            &path,
            "[app]\nlanguage = \"ja\"\nuse_temp_files = true\n\n[icons]\nmax_icon_size = 32\n",
        )
        .unwrap();

        let config = FileConfiguration::load_from_file(&path).unwrap();

        let app = config.app.unwrap();
        assert_eq!(app.language.as_deref(), Some("ja"));
        assert_eq!(app.use_temp_files, Some(true));
        assert_eq!(config.icons.unwrap().max_icon_size, Some(32));
        assert_eq!(config.network, None);
    }

    #[test]
    fn missing_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();

        assert!(FileConfiguration::load_from_file(tmp.path().join("nope.toml")).is_err());
    }

    #[test]
    fn broken_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[app\nlanguage = ").unwrap();

        let err = FileConfiguration::load_from_file(&path).unwrap_err();

        assert!(err.to_string().contains("Error parsing config file"));
    }
}
