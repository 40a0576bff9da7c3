use std::{process::exit, time::Duration};

use app_config::{Config, APPLICATION_NAME};
use app_downloader::{
    AudioDownloader, ChainEntry, ChainMode, DownloadRequest, DownloaderChain, DownloaderSettings, HttpFetcher,
    OutputTarget,
};
use app_logger::{debug, error, info, trace, LevelFilter, LoggerConfig};

fn main() {
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {e:?}");
        exit(1);
    });

    if let Some(format) = config.run.dump_config {
        match config.dump(format) {
            Ok(dump) => println!("{dump}"),
            Err(e) => {
                eprintln!("Failed to dump configuration: {e:?}");
                exit(1);
            }
        }
        return;
    }

    let word = get_word(&config).unwrap_or_else(|e| {
        eprintln!("Failed to get the word to look up: {e}");
        exit(1);
    });
    let word = word.trim().to_string();

    if word.is_empty() {
        eprintln!("No word provided. Please provide one.");
        exit(1);
    }

    if app_logger::init(
        LoggerConfig::builder()
            .program_name(APPLICATION_NAME)
            .name_suffix(&word)
            .file_log_level(LevelFilter::Debug)
            .console_log_level(console_log_level(config.run.verbosity)),
    )
    .is_err()
    {
        eprintln!("Failed to initialize logger.");
        exit(1);
    }

    trace!("Config: {:?}", &config);

    let mut chain = match build_chain(&config) {
        Ok(chain) => chain,
        Err(e) => {
            error!("Error setting up downloaders: {e:?}");
            exit(1);
        }
    };
    debug!("Trying sources in order: {:?}", chain.names());

    let request = build_request(&config, &word);
    let mode = if config.run.all {
        ChainMode::All
    } else {
        ChainMode::FirstHit
    };

    let found = chain.download(&request, mode);

    if found.is_empty() {
        error!("No pronunciation found for {:?}", &word);
        exit(1);
    }

    for entry in &found {
        println!("{}", format_entry(entry));
    }

    if config.icons.fetch_icons {
        report_icons(&mut chain, &found);
    }
}

fn build_chain(config: &Config) -> anyhow::Result<DownloaderChain> {
    let output = if config.app.use_temp_files {
        OutputTarget::TempFiles
    } else {
        let dir = app_helpers::dirs::ensure_dir(&config.app.media_directory)?;
        info!("Saving into {:?}", &dir);
        OutputTarget::media_directory(dir)
    };

    let fetcher = HttpFetcher::shared(Duration::from_secs(config.network.timeout_secs))?;

    let mut settings = DownloaderSettings::new(fetcher, output)
        .fetch_icons(config.icons.fetch_icons)
        .max_icon_size(config.icons.max_icon_size);

    if let Some(user_agent) = &config.network.user_agent {
        settings = settings.user_agent(user_agent.as_str());
    }

    Ok(DownloaderChain::with_defaults(&settings))
}

fn build_request(config: &Config, word: &str) -> DownloadRequest {
    let request = DownloadRequest::new(word, config.app.language.as_str());

    match &config.run.split {
        Some((base, ruby)) => request.with_split(base.as_str(), ruby.as_str()),
        None => request,
    }
}

/// `path<TAB>source<TAB>display text<TAB>key=value;...`, plus a trailing
/// `blacklistable` column for sources that may return placeholders.
fn format_entry(found: &ChainEntry) -> String {
    let extras = found
        .entry
        .extras
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(";");

    let mut line = format!(
        "{}\t{}\t{}\t{}",
        found.entry.path.display(),
        found.source,
        found.display_text,
        extras
    );

    if found.may_blacklist {
        line.push_str("\tblacklistable");
    }

    line
}

fn report_icons(chain: &mut DownloaderChain, found: &[ChainEntry]) {
    for downloader in chain.downloaders_mut() {
        let name = downloader.name();
        if !found.iter().any(|x| x.source == name) {
            continue;
        }

        let size = downloader
            .site_icon()
            .map(|icon| (icon.width(), icon.height()));
        println!("{}", format_icon(name, size));
    }
}

/// `icon<TAB>source<TAB>WxH`, or `none` as size when the site has no icon.
fn format_icon(source: &str, size: Option<(u32, u32)>) -> String {
    match size {
        Some((w, h)) => format!("icon\t{source}\t{w}x{h}"),
        None => format!("icon\t{source}\tnone"),
    }
}

const fn console_log_level(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn get_word(config: &Config) -> anyhow::Result<String> {
    let word = config.run.word.as_ref();

    if cfg!(feature = "ask-for-word") {
        use std::{io, io::prelude::*};

        if let Some(word) = word {
            return Ok(word.to_string());
        }

        #[cfg(feature = "ask-for-word")]
        if atty::isnt(atty::Stream::Stdin) {
            anyhow::bail!("No word provided. Please provide one.");
        }

        eprint!("Word: ");
        io::stderr().flush()?;

        let res = io::stdin()
            .lock()
            .lines()
            .next()
            .unwrap_or_else(|| Ok(String::new()))?;

        Ok(res)
    } else {
        word.ok_or_else(|| anyhow::anyhow!("No word provided. Please provide one."))
            .map(std::string::ToString::to_string)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use app_downloader::{DownloadEntry, Extras};

    use super::*;

    #[test]
    fn entry_line_lists_extras() {
        let found = ChainEntry {
            source: "Wiktionary",
            display_text: "dog".to_string(),
            may_blacklist: false,
            entry: DownloadEntry {
                path: PathBuf::from("/media/dog.ogg"),
                base_name: "dog".to_string(),
                extras: Extras::from([
                    ("Source".to_string(), "Wiktionary".to_string()),
                    ("Variant".to_string(), "2".to_string()),
                ]),
            },
        };

        assert_eq!(
            format_entry(&found),
            "/media/dog.ogg\tWiktionary\tdog\tSource=Wiktionary;Variant=2"
        );
    }

    #[test]
    fn blacklistable_entries_are_marked() {
        let found = ChainEntry {
            source: "JapanesePod",
            display_text: "猫 (ねこ)".to_string(),
            may_blacklist: true,
            entry: DownloadEntry {
                path: PathBuf::from("/tmp/a.mp3"),
                base_name: "猫_ねこ".to_string(),
                extras: Extras::new(),
            },
        };

        assert!(format_entry(&found).ends_with("\tblacklistable"));
    }

    #[test]
    fn icon_lines() {
        assert_eq!(format_icon("HowJSay", Some((16, 20))), "icon\tHowJSay\t16x20");
        assert_eq!(format_icon("GoogleTTS", None), "icon\tGoogleTTS\tnone");
    }

    #[test]
    fn verbosity_levels() {
        assert_eq!(console_log_level(0), LevelFilter::Warn);
        assert_eq!(console_log_level(2), LevelFilter::Debug);
        assert_eq!(console_log_level(9), LevelFilter::Trace);
    }
}
