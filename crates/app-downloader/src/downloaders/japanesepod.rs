use app_logger::{debug, info};
use url::Url;

use super::{
    common::language_matches, AudioDownloader, DownloadRequest, DownloaderCore, DownloaderReturn,
    DownloaderSettings, Extras, Names,
};
use crate::error::DownloadError;

const NAME: &str = "JapanesePod";
const URL: &str = "https://assets.languagepod101.com/dictionary/japanese/audiomp3.php";
const ICON_URL: &str = "https://www.japanesepod101.com/";
const LANGUAGE: &str = "ja";

/// Size of the "the audio for this clip is currently not available" clip the
/// site answers with instead of a 404.
pub const NOT_AVAILABLE_SIZE: usize = 52_288;

/// Japanese words from JapanesePod101, looked up by kanji and kana.
pub struct JapanesepodDownloader {
    core: DownloaderCore,
    may_blacklist: bool,
}

impl JapanesepodDownloader {
    #[must_use]
    pub fn new(settings: &DownloaderSettings) -> Self {
        Self {
            core: DownloaderCore::new(NAME, URL, ICON_URL, ".mp3", settings),
            may_blacklist: false,
        }
    }

    fn query_url(&self, kanji: &str, kana: &str) -> Result<Url, DownloadError> {
        let mut params = vec![("kanji", kanji)];
        if !kana.is_empty() {
            params.push(("kana", kana));
        }

        Url::parse_with_params(self.core.url(), params)
            .map_err(|e| DownloadError::invalid_url(self.core.url(), e))
    }
}

impl AudioDownloader for JapanesepodDownloader {
    fn core(&self) -> &DownloaderCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut DownloaderCore {
        &mut self.core
    }

    fn download_files(&mut self, request: &DownloadRequest) -> DownloaderReturn {
        self.may_blacklist = false;

        if !language_matches(&request.language, LANGUAGE) {
            return Ok(());
        }

        let (kanji, kana) = if request.split && !request.base.is_empty() {
            (request.base.trim(), request.ruby.trim())
        } else {
            (request.text.trim(), "")
        };

        if kanji.is_empty() {
            return Ok(());
        }

        let names = self.format_names(&request.text, kanji, kana);
        self.core.set_names(&names);

        let url = self.query_url(kanji, kana)?;
        let data = self.core.get_data_from_url(url.as_str())?;

        if data.is_empty() || data.len() == NOT_AVAILABLE_SIZE {
            debug!("JapanesePod has no audio for {kanji:?} ({kana:?})");
            return Ok(());
        }

        let extras = Extras::from([("Source".to_string(), NAME.to_string())]);
        let entry = self.core.save(&data, &names.base_name, None, extras)?;
        info!("Saved JapanesePod audio to {:?}", &entry.path);

        self.may_blacklist = true;

        Ok(())
    }

    /// `base (ruby)` for display and `base_ruby` as file name when a reading
    /// is given that differs from the base.
    fn format_names(&self, text: &str, base: &str, ruby: &str) -> Names {
        if base.is_empty() {
            return Names::plain(text);
        }

        if ruby.is_empty() || ruby == base {
            return Names::plain(base);
        }

        Names {
            display_text: format!("{base} ({ruby})"),
            base_name: format!("{base}_{ruby}"),
        }
    }

    fn show_blacklist_marker(&self) -> bool {
        self.may_blacklist
    }
}
