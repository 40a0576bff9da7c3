use app_logger::{debug, info, warn};

use crate::downloaders::{
    default_downloaders, AudioDownloader, DownloadEntry, DownloadRequest, DownloaderSettings,
};

/// When to stop walking the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChainMode {
    /// Stop at the first source that produced a file.
    #[default]
    FirstHit,
    /// Ask every source.
    All,
}

/// A download together with the source that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainEntry {
    pub source: &'static str,
    pub display_text: String,
    pub may_blacklist: bool,
    pub entry: DownloadEntry,
}

/// Downloaders tried in priority order.
///
/// A source that fails or finds nothing is skipped and the next one is asked.
pub struct DownloaderChain {
    downloaders: Vec<Box<dyn AudioDownloader>>,
}

impl DownloaderChain {
    #[must_use]
    pub fn new(downloaders: Vec<Box<dyn AudioDownloader>>) -> Self {
        Self { downloaders }
    }

    #[must_use]
    pub fn with_defaults(settings: &DownloaderSettings) -> Self {
        Self::new(default_downloaders(settings))
    }

    pub fn downloaders_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn AudioDownloader>> {
        self.downloaders.iter_mut()
    }

    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.downloaders.iter().map(|x| x.name()).collect()
    }

    pub fn download(&mut self, request: &DownloadRequest, mode: ChainMode) -> Vec<ChainEntry> {
        let mut found = Vec::new();

        for downloader in &mut self.downloaders {
            let source = downloader.name();

            let entries = match downloader.download(request) {
                Ok(entries) => entries.to_vec(),
                Err(e) => {
                    warn!("{source} failed for {:?}: {e}", &request.text);
                    continue;
                }
            };

            if entries.is_empty() {
                debug!("{source} had nothing for {:?}", &request.text);
                continue;
            }

            info!("{source} found {} file(s)", entries.len());

            let display_text = downloader.display_text().to_string();
            let may_blacklist = downloader.show_blacklist_marker();
            found.extend(entries.into_iter().map(|entry| ChainEntry {
                source,
                display_text: display_text.clone(),
                may_blacklist,
                entry,
            }));

            if mode == ChainMode::FirstHit {
                break;
            }
        }

        found
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, sync::Arc};

    use super::*;
    use crate::{
        downloaders::common::{file_name::OutputTarget, request::FetchResponse},
        test_support::{as_shared, FakeFetcher},
    };

    fn chain(fetcher: &Arc<FakeFetcher>) -> DownloaderChain {
        DownloaderChain::with_defaults(&DownloaderSettings::new(
            as_shared(fetcher),
            OutputTarget::TempFiles,
        ))
    }

    fn cleanup(entries: &[ChainEntry]) {
        for e in entries {
            let _ = fs::remove_file(&e.entry.path);
        }
    }

    #[test]
    fn falls_through_failing_sources() {
        let fetcher = FakeFetcher::new()
            .route(
                "https://translate.google.com/translate_tts?ie=UTF-8&client=tw-ob&tl=en&q=dog",
                FetchResponse::ok("ID3"),
            )
            .shared();
        let mut chain = chain(&fetcher);

        let res = chain.download(&DownloadRequest::new("dog", "en"), ChainMode::FirstHit);

        assert_eq!(res.len(), 1);
        assert_eq!(res[0].source, "GoogleTTS");
        assert_eq!(res[0].display_text, "dog");
        // HowJSay and Wiktionary answered 404; JapanesePod skipped English.
        assert_eq!(fetcher.requests().len(), 3);

        cleanup(&res);
    }

    #[test]
    fn first_hit_stops_early() {
        let fetcher = FakeFetcher::new()
            .route("https://howjsay.com/mp3/dog.mp3", FetchResponse::ok("ID3"))
            .shared();
        let mut chain = chain(&fetcher);

        let res = chain.download(&DownloadRequest::new("dog", "en"), ChainMode::FirstHit);

        assert_eq!(res.len(), 1);
        assert_eq!(res[0].source, "HowJSay");
        assert_eq!(fetcher.requests(), vec!["https://howjsay.com/mp3/dog.mp3"]);

        cleanup(&res);
    }

    #[test]
    fn all_collects_every_source() {
        let fetcher = FakeFetcher::new()
            .route("https://howjsay.com/mp3/dog.mp3", FetchResponse::ok("ID3"))
            .route(
                "https://translate.google.com/translate_tts?ie=UTF-8&client=tw-ob&tl=en&q=dog",
                FetchResponse::ok("ID3"),
            )
            .shared();
        let mut chain = chain(&fetcher);

        let res = chain.download(&DownloadRequest::new("dog", "en"), ChainMode::All);

        let sources: Vec<_> = res.iter().map(|x| x.source).collect();
        assert_eq!(sources, vec!["HowJSay", "GoogleTTS"]);

        cleanup(&res);
    }

    #[test]
    fn nothing_found_is_empty() {
        let fetcher = FakeFetcher::new().shared();
        let mut chain = chain(&fetcher);

        assert!(chain
            .download(&DownloadRequest::new("dog", "en"), ChainMode::All)
            .is_empty());
    }
}
