use app_helpers::list::{uniqify, uniqify_by_key};
use app_logger::{debug, info, trace, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use super::{
    common::{
        page::{resolve_url, tag_attribute},
        primary_language,
    },
    AudioDownloader, DownloadRequest, DownloaderCore, DownloaderReturn, DownloaderSettings, Extras,
};
use crate::error::DownloadError;

const NAME: &str = "Wiktionary";
const URL: &str = "https://{lang}.wiktionary.org/wiki/";
const ICON_URL: &str = "https://en.wiktionary.org/";

pub static AUDIO_URL_MATCH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^https?://upload\.wikimedia\.org/.+\.(?P<ext>ogg|oga|mp3|wav|flac)$")
        .expect("Invalid regex")
});

static LANGUAGE_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z]{2,3}$").expect("Invalid regex"));

/// Recordings linked from the Wiktionary entry of a word.
///
/// The Wiktionary of the requested language is used, so any language with a
/// Wiktionary edition works.
pub struct WiktionaryDownloader {
    core: DownloaderCore,
}

impl WiktionaryDownloader {
    #[must_use]
    pub fn new(settings: &DownloaderSettings) -> Self {
        Self {
            core: DownloaderCore::new(NAME, URL, ICON_URL, ".ogg", settings),
        }
    }

    fn page_url(&self, language: &str, word: &str) -> Result<Url, DownloadError> {
        let base = self.core.url().replace("{lang}", language);
        let mut url = Url::parse(&base).map_err(|e| DownloadError::invalid_url(&base, e))?;

        url.path_segments_mut()
            .map_err(|()| DownloadError::invalid_url(&base, "cannot be a base"))?
            .pop_if_empty()
            .push(&word.replace(' ', "_"));

        Ok(url)
    }

    fn audio_urls(&self, page_url: &str) -> Result<Vec<Url>, DownloadError> {
        let page = self.core.get_page_from_url(page_url)?;

        let mut candidates = page.attribute_values("source", "src", |_| true)?;
        candidates.extend(page.attribute_values("audio", "src", |_| true)?);
        candidates.extend(page.attribute_values("a", "href", |tag| {
            tag_attribute(tag, "href").is_some_and(|x| x.contains("upload.wikimedia.org"))
        })?);
        trace!("Audio candidates on {page_url:?}: {candidates:?}");

        let urls = uniqify(candidates)
            .into_iter()
            .filter_map(|x| resolve_url(page.url(), &x).ok())
            .filter(|x| AUDIO_URL_MATCH.is_match(x.as_str()))
            .collect::<Vec<_>>();

        Ok(uniqify_by_key(urls, recording_key))
    }
}

/// Identifies the recording behind an upload URL, so transcoded copies
/// (`.../transcoded/a/ab/Foo.ogg/Foo.ogg.mp3`) count as the original.
fn recording_key(url: &Url) -> String {
    let segments = url
        .path_segments()
        .map(|x| x.collect::<Vec<_>>())
        .unwrap_or_default();

    let key = match segments.iter().position(|x| *x == "transcoded") {
        Some(idx) if segments.len() >= 2 && idx < segments.len() - 2 => {
            segments[segments.len() - 2]
        }
        _ => segments.last().copied().unwrap_or_default(),
    };

    key.to_lowercase()
}

impl AudioDownloader for WiktionaryDownloader {
    fn core(&self) -> &DownloaderCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut DownloaderCore {
        &mut self.core
    }

    fn download_files(&mut self, request: &DownloadRequest) -> DownloaderReturn {
        let language = primary_language(&request.language);
        if !LANGUAGE_CODE.is_match(&language) {
            debug!("No Wiktionary for language {:?}", &request.language);
            return Ok(());
        }

        let word = request.text.trim();
        if word.is_empty() {
            return Ok(());
        }

        let names = self.format_names(word, "", "");
        self.core.set_names(&names);

        let page_url = self.page_url(&language, word)?;
        let audio_urls = self.audio_urls(page_url.as_str())?;
        debug!("Found {} recording(s) for {word:?}", audio_urls.len());

        let many = audio_urls.len() > 1;
        let mut failure = None;
        for (i, audio_url) in audio_urls.iter().enumerate() {
            let data = match self.core.get_data_from_url(audio_url.as_str()) {
                Ok(data) => data,
                Err(e) => {
                    warn!("Skipping Wiktionary recording {:?}: {e}", audio_url.as_str());
                    failure.get_or_insert(e);
                    continue;
                }
            };

            let extension = AUDIO_URL_MATCH
                .captures(audio_url.as_str())
                .and_then(|x| x.name("ext"))
                .map(|x| format!(".{}", x.as_str().to_lowercase()));

            let mut extras = Extras::from([("Source".to_string(), NAME.to_string())]);
            if many {
                extras.insert("Variant".to_string(), (i + 1).to_string());
            }

            let entry = self
                .core
                .save(&data, &names.base_name, extension.as_deref(), extras)?;
            info!("Saved Wiktionary audio to {:?}", &entry.path);
        }

        match failure {
            Some(e) if self.core.downloads().is_empty() => Err(e),
            _ => Ok(()),
        }
    }
}
