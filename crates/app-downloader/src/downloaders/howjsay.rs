use app_logger::{debug, info};
use url::Url;

use super::{
    common::language_matches, AudioDownloader, DownloadRequest, DownloaderCore, DownloaderReturn,
    DownloaderSettings, Extras,
};
use crate::error::DownloadError;

const NAME: &str = "HowJSay";
const URL: &str = "https://howjsay.com/mp3/";
const ICON_URL: &str = "https://howjsay.com/";
const LANGUAGE: &str = "en";

/// English words from howjsay.com.
pub struct HowJSayDownloader {
    core: DownloaderCore,
}

impl HowJSayDownloader {
    #[must_use]
    pub fn new(settings: &DownloaderSettings) -> Self {
        Self {
            core: DownloaderCore::new(NAME, URL, ICON_URL, ".mp3", settings),
        }
    }

    fn word_url(&self, word: &str) -> Result<Url, DownloadError> {
        let mut url =
            Url::parse(self.core.url()).map_err(|e| DownloadError::invalid_url(self.core.url(), e))?;

        url.path_segments_mut()
            .map_err(|()| DownloadError::invalid_url(self.core.url(), "cannot be a base"))?
            .pop_if_empty()
            .push(&format!("{word}{}", self.core.file_extension()));

        Ok(url)
    }
}

impl AudioDownloader for HowJSayDownloader {
    fn core(&self) -> &DownloaderCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut DownloaderCore {
        &mut self.core
    }

    fn download_files(&mut self, request: &DownloadRequest) -> DownloaderReturn {
        if !language_matches(&request.language, LANGUAGE) {
            return Ok(());
        }

        let word = request.text.trim().to_lowercase();
        if word.is_empty() {
            return Ok(());
        }

        let names = self.format_names(request.text.trim(), "", "");
        self.core.set_names(&names);

        let url = self.word_url(&word)?;
        let data = self.core.get_data_from_url(url.as_str())?;

        if data.is_empty() {
            debug!("HowJSay sent an empty file for {word:?}");
            return Ok(());
        }

        let extras = Extras::from([("Source".to_string(), NAME.to_string())]);
        let entry = self.core.save(&data, &names.base_name, None, extras)?;
        info!("Saved HowJSay audio to {:?}", &entry.path);

        Ok(())
    }
}
