use app_logger::{debug, info};
use url::Url;

use super::{
    common::primary_language, AudioDownloader, DownloadRequest, DownloaderCore, DownloaderReturn,
    DownloaderSettings, Extras,
};
use crate::error::DownloadError;

const NAME: &str = "GoogleTTS";
const URL: &str = "https://translate.google.com/translate_tts";
const ICON_URL: &str = "https://translate.google.com/";

/// Longest text the TTS endpoint accepts.
pub const MAX_TEXT_LENGTH: usize = 100;

/// Synthesized speech from Google Translate, for any language it knows.
pub struct GoogleTtsDownloader {
    core: DownloaderCore,
}

impl GoogleTtsDownloader {
    #[must_use]
    pub fn new(settings: &DownloaderSettings) -> Self {
        Self {
            core: DownloaderCore::new(NAME, URL, ICON_URL, ".mp3", settings),
        }
    }

    fn tts_url(&self, language: &str, text: &str) -> Result<Url, DownloadError> {
        Url::parse_with_params(
            self.core.url(),
            [
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", language),
                ("q", text),
            ],
        )
        .map_err(|e| DownloadError::invalid_url(self.core.url(), e))
    }
}

impl AudioDownloader for GoogleTtsDownloader {
    fn core(&self) -> &DownloaderCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut DownloaderCore {
        &mut self.core
    }

    fn download_files(&mut self, request: &DownloadRequest) -> DownloaderReturn {
        let language = request.language.trim();
        if primary_language(language).is_empty() {
            return Ok(());
        }

        let text = request.text.trim();
        if text.is_empty() {
            return Ok(());
        }
        if text.chars().count() > MAX_TEXT_LENGTH {
            debug!("Text too long for Google TTS ({} chars)", text.chars().count());
            return Ok(());
        }

        let names = self.format_names(text, "", "");
        self.core.set_names(&names);

        let url = self.tts_url(language, text)?;
        let data = self.core.get_data_from_url(url.as_str())?;

        let extras = Extras::from([("Source".to_string(), NAME.to_string())]);
        let entry = self.core.save(&data, &names.base_name, None, extras)?;
        info!("Saved Google TTS audio to {:?}", &entry.path);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::{
        downloaders::common::{file_name::OutputTarget, request::FetchResponse},
        test_support::{as_shared, FakeFetcher},
    };

    fn downloader(fetcher: &std::sync::Arc<FakeFetcher>) -> GoogleTtsDownloader {
        GoogleTtsDownloader::new(
            &DownloaderSettings::new(as_shared(fetcher), OutputTarget::TempFiles)
                .user_agent("Mozilla/5.0"),
        )
    }

    #[test]
    fn synthesizes_text() {
        let url = "https://translate.google.com/translate_tts?ie=UTF-8&client=tw-ob&tl=fr&q=bonjour+le+monde";
        let fetcher = FakeFetcher::new().route(url, FetchResponse::ok("ID3")).shared();
        let mut d = downloader(&fetcher);

        let res = d
            .download(&DownloadRequest::new("bonjour le monde", "fr"))
            .unwrap()
            .to_vec();

        assert_eq!(res.len(), 1);
        assert_eq!(res[0].extras.get("Source").map(String::as_str), Some("GoogleTTS"));
        assert_eq!(fetcher.user_agents(), vec!["Mozilla/5.0".to_string()]);

        let _ = fs::remove_file(&res[0].path);
    }

    #[test]
    fn too_long_text_gives_nothing() {
        let fetcher = FakeFetcher::new().shared();
        let mut d = downloader(&fetcher);

        let res = d
            .download(&DownloadRequest::new("a".repeat(MAX_TEXT_LENGTH + 1), "en"))
            .unwrap();

        assert!(res.is_empty());
        assert!(fetcher.requests().is_empty());
    }

    #[test]
    fn needs_a_language() {
        let fetcher = FakeFetcher::new().shared();
        let mut d = downloader(&fetcher);

        assert!(d.download(&DownloadRequest::new("hello", " ")).unwrap().is_empty());
    }

    #[test]
    fn rejection_is_an_error() {
        let fetcher = FakeFetcher::new().shared();
        let mut d = downloader(&fetcher);

        let err = d.download(&DownloadRequest::new("hello", "en")).unwrap_err();

        assert_eq!(err.status(), Some(404));
    }
}
