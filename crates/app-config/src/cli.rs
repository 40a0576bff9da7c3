use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, ValueEnum, ValueHint};
use serde::{Deserialize, Serialize};

use crate::{
    common::{AppOptions, IconOptions, NetworkOptions},
    Options,
};

#[derive(Debug, Clone, Parser)]
#[command(name = "audio-downloader", version, about)]
pub struct CliArgs {
    #[command(flatten)]
    pub run: RunArgs,

    #[command(flatten)]
    pub app: AppOptions,

    #[command(flatten, next_help_heading = Some("Network"))]
    pub network: NetworkOptions,

    #[command(flatten, next_help_heading = Some("Site icons"))]
    pub icons: IconOptions,
}

impl CliArgs {
    pub(crate) fn merge_into_options(&self, options: &mut Options) {
        options.app.merge(&self.app);
        options.network.merge(&self.network);
        options.icons.merge(&self.icons);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum DumpType {
    Toml,
    Json,
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    #[arg(default_value = None, value_hint = ValueHint::Other)]
    /// The word or phrase to get a pronunciation for.
    pub word: Option<String>,

    #[arg(long, requires = "ruby", value_name = "KANJI")]
    /// Written form of the word, for languages with a separate reading (e.g. Japanese).
    ///
    /// Setting this splits the word into base and reading.
    pub base: Option<String>,

    #[arg(long, requires = "base", value_name = "KANA")]
    /// Reading of `--base`.
    pub ruby: Option<String>,

    #[arg(short, long)]
    /// Ask every source instead of stopping at the first one that has the word.
    pub all: bool,

    #[arg(short, long, action = ArgAction::Count)]
    /// Log more. Can be repeated.
    pub verbose: u8,

    #[arg(short = 'c', long, default_value = None, env = "AUDIO_DOWNLOADER_CONFIG", value_hint = ValueHint::FilePath)]
    /// Location of the configuration file.
    ///
    /// By default should be in the os-appropriate config directory
    /// under the name `audio-downloader/config.toml`
    pub config_path: Option<PathBuf>,

    #[arg(long, ignore_case = true, value_name = "FORMAT")]
    /// Dump the configuration to stdout and exit.
    ///
    /// When dumped with the `toml` format, can be used as a config file.
    #[allow(clippy::option_option)]
    pub dump_config: Option<Option<DumpType>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_split_word() {
        let args = CliArgs::try_parse_from([
            "audio-downloader",
            "猫",
            "--base",
            "猫",
            "--ruby",
            "ねこ",
            "-l",
            "ja",
            "--temp-files",
            "-vv",
        ])
        .unwrap();

        assert_eq!(args.run.word.as_deref(), Some("猫"));
        assert_eq!(args.run.ruby.as_deref(), Some("ねこ"));
        assert_eq!(args.app.language.as_deref(), Some("ja"));
        assert_eq!(args.app.use_temp_files, Some(true));
        assert_eq!(args.run.verbose, 2);
    }

    #[test]
    fn base_requires_ruby() {
        assert!(CliArgs::try_parse_from(["audio-downloader", "x", "--base", "x"]).is_err());
    }

    #[test]
    fn flags_accept_explicit_values() {
        let args =
            CliArgs::try_parse_from(["audio-downloader", "x", "--temp-files=false", "--icons"])
                .unwrap();

        assert_eq!(args.app.use_temp_files, Some(false));
        assert_eq!(args.icons.fetch_icons, Some(true));
    }

    #[test]
    fn dump_config_defaults_format() {
        let args = CliArgs::try_parse_from(["audio-downloader", "--dump-config"]).unwrap();

        assert_eq!(args.run.dump_config, Some(None));
        assert_eq!(args.run.word, None);
    }
}
