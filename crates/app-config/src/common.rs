use std::path::PathBuf;

use clap::{Args, ValueHint};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Args)]
pub struct AppOptions {
    #[arg(short = 'l', long, default_value = None, env = "AUDIO_DOWNLOADER_LANGUAGE")]
    /// Language tag of the word, e.g. `en`, `ja` or `de-AT`.
    ///
    /// Sources that don't speak the language are skipped.
    pub language: Option<String>,

    #[arg(short = 'd', long, default_value = None, env = "AUDIO_DOWNLOADER_MEDIA_DIR", value_hint = ValueHint::DirPath)]
    /// The directory to save pronunciations to.
    ///
    /// If not provided, the `media' folder in the application data directory is used
    pub media_directory: Option<PathBuf>,

    #[arg(short = 't', long = "temp-files", num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    /// Save into fresh files in the system temp directory instead of the media directory.
    pub use_temp_files: Option<bool>,
}
impl AppOptions {
    pub(crate) fn merge(&mut self, config: &Self) -> &Self {
        if let Some(language) = config.language.as_ref() {
            self.language = Some(language.clone());
        }

        if let Some(media_directory) = config.media_directory.as_ref() {
            self.media_directory = Some(media_directory.clone());
        }

        if let Some(use_temp_files) = config.use_temp_files {
            self.use_temp_files = Some(use_temp_files);
        }

        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Args)]
pub struct NetworkOptions {
    #[arg(long, default_value = None, env = "AUDIO_DOWNLOADER_USER_AGENT")]
    /// User agent sent with every request.
    pub user_agent: Option<String>,

    #[arg(long = "timeout", default_value = None, value_name = "SECONDS", env = "AUDIO_DOWNLOADER_TIMEOUT")]
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
}
impl NetworkOptions {
    pub(crate) fn merge(&mut self, config: &Self) -> &Self {
        if let Some(user_agent) = config.user_agent.as_ref() {
            self.user_agent = Some(user_agent.clone());
        }

        if let Some(timeout_secs) = config.timeout_secs {
            self.timeout_secs = Some(timeout_secs);
        }

        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Args)]
pub struct IconOptions {
    #[arg(long = "icons", num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    /// Also fetch the icon of every source that found something.
    pub fetch_icons: Option<bool>,

    #[arg(long, default_value = None, value_name = "PIXELS")]
    /// Icons with an edge longer than this are scaled down.
    pub max_icon_size: Option<u32>,
}
impl IconOptions {
    pub(crate) fn merge(&mut self, config: &Self) -> &Self {
        if let Some(fetch_icons) = config.fetch_icons {
            self.fetch_icons = Some(fetch_icons);
        }

        if let Some(max_icon_size) = config.max_icon_size {
            self.max_icon_size = Some(max_icon_size);
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_only_overrides_set_values() {
        let mut base = AppOptions {
            language: Some("en".to_string()),
            media_directory: Some("/media".into()),
            use_temp_files: Some(false),
        };

        base.merge(&AppOptions {
            language: Some("ja".to_string()),
            ..Default::default()
        });

        assert_eq!(base.language.as_deref(), Some("ja"));
        assert_eq!(base.media_directory, Some(PathBuf::from("/media")));
        assert_eq!(base.use_temp_files, Some(false));
    }

    #[test]
    fn merge_network_and_icons() {
        let mut net = NetworkOptions::default();
        net.merge(&NetworkOptions {
            user_agent: None,
            timeout_secs: Some(3),
        });
        assert_eq!(net.timeout_secs, Some(3));
        assert_eq!(net.user_agent, None);

        let mut icons = IconOptions {
            fetch_icons: Some(true),
            max_icon_size: Some(16),
        };
        icons.merge(&IconOptions {
            fetch_icons: Some(false),
            max_icon_size: None,
        });
        assert_eq!(icons.fetch_icons, Some(false));
        assert_eq!(icons.max_icon_size, Some(16));
    }
}
