use std::{env, path::PathBuf};

use anyhow::anyhow;
use clap::Parser;
use directories::ProjectDirs;
use resolve_path::PathResolveExt;
use serde::{Deserialize, Serialize};

pub use crate::{
    cli::{CliArgs, DumpType, RunArgs},
    common::{AppOptions, IconOptions, NetworkOptions},
};
use crate::file::FileConfiguration;

mod cli;
mod common;
mod file;

pub static APPLICATION_NAME: &str = "audio-downloader";
pub static ORGANIZATION_NAME: &str = "allypost";
pub static ORGANIZATION_QUALIFIER: &str = "net";

pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MAX_ICON_SIZE: u32 = 20;

/// Fully resolved configuration: defaults, then the config file, then CLI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,

    pub network: NetworkConfig,

    pub icons: IconConfig,

    #[serde(skip)]
    pub run: RunConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub language: String,
    pub media_directory: PathBuf,
    pub use_temp_files: bool,
    #[serde(skip)]
    pub config_path: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// `None` keeps the downloaders' browser-like default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IconConfig {
    pub fetch_icons: bool,
    pub max_icon_size: u32,
}

#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    pub word: Option<String>,
    /// Written form and reading, when the word was split.
    pub split: Option<(String, String)>,
    pub all: bool,
    pub verbosity: u8,
    pub dump_config: Option<DumpType>,
}

/// Unresolved options, merged layer by layer.
#[derive(Debug, Clone, Default)]
pub(crate) struct Options {
    pub(crate) app: AppOptions,
    pub(crate) network: NetworkOptions,
    pub(crate) icons: IconOptions,
}

impl Config {
    /// Parses the process arguments and loads the matching config file.
    pub fn load() -> anyhow::Result<Self> {
        let args = CliArgs::parse();

        Self::from_args(&args)
    }

    pub fn from_args(args: &CliArgs) -> anyhow::Result<Self> {
        let (file_config, config_path) = FileConfiguration::new(args.run.config_path.as_deref())?;

        Self::from_parts(args, &file_config, config_path)
    }

    pub(crate) fn from_parts(
        args: &CliArgs,
        file_config: &FileConfiguration,
        config_path: PathBuf,
    ) -> anyhow::Result<Self> {
        let mut options = Options::default();
        file_config.merge_into_options(&mut options);
        args.merge_into_options(&mut options);

        let media_directory = match options.app.media_directory {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Self::default_media_dir(),
        };
        let media_directory: PathBuf = media_directory
            .try_resolve()
            .map_err(|e| anyhow!("Failed to resolve media directory {media_directory:?}: {e}"))?
            .into();

        let language = options
            .app
            .language
            .filter(|x| !x.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

        let split = match (&args.run.base, &args.run.ruby) {
            (Some(base), Some(ruby)) => Some((base.clone(), ruby.clone())),
            _ => None,
        };

        Ok(Self {
            app: AppConfig {
                language,
                media_directory,
                use_temp_files: options.app.use_temp_files.unwrap_or(false),
                config_path,
            },
            network: NetworkConfig {
                user_agent: options.network.user_agent.filter(|x| !x.trim().is_empty()),
                timeout_secs: options
                    .network
                    .timeout_secs
                    .filter(|x| *x > 0)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            },
            icons: IconConfig {
                fetch_icons: options.icons.fetch_icons.unwrap_or(false),
                max_icon_size: options
                    .icons
                    .max_icon_size
                    .filter(|x| *x > 0)
                    .unwrap_or(DEFAULT_MAX_ICON_SIZE),
            },
            run: RunConfig {
                word: args.run.word.clone(),
                split,
                all: args.run.all,
                verbosity: args.run.verbose,
                dump_config: args
                    .run
                    .dump_config
                    .map(|x| x.unwrap_or(DumpType::Toml)),
            },
        })
    }

    /// Renders the configuration in `format`.
    pub fn dump(&self, format: DumpType) -> anyhow::Result<String> {
        let out = match format {
            DumpType::Toml => toml::to_string_pretty(self)?,
            DumpType::Json => serde_json::to_string_pretty(self)?,
        };

        Ok(out)
    }

    #[must_use]
    pub fn get_config_dir() -> Option<PathBuf> {
        Self::get_project_dir().map(|x| x.config_dir().into())
    }

    #[must_use]
    pub fn default_media_dir() -> PathBuf {
        Self::get_project_dir().map_or_else(
            || env::temp_dir().join(APPLICATION_NAME).join("media"),
            |x| x.data_dir().join("media"),
        )
    }

    fn get_project_dir() -> Option<ProjectDirs> {
        ProjectDirs::from(ORGANIZATION_QUALIFIER, ORGANIZATION_NAME, APPLICATION_NAME)
    }
}
