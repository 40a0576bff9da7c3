use std::{collections::BTreeMap, fs, path::PathBuf, result::Result};

use app_logger::{debug, trace, warn};
use image::DynamicImage;

use self::common::{
    file_name::OutputTarget,
    icon::{fetch_site_icon, SiteIcon, DEFAULT_MAX_ICON_SIZE},
    page::HtmlPage,
    request::{get_data, SharedFetcher},
};
use crate::error::DownloadError;

pub mod common;
pub mod google_tts;
pub mod howjsay;
pub mod japanesepod;
pub mod wiktionary;

/// Some TTS services refuse to answer anything that doesn't look like a browser.
pub static USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
                               Chrome/88.0.4324.182 Safari/537.36";

type DownloaderReturn = Result<(), DownloadError>;

/// Free-form information about a download, like the source or speaker.
pub type Extras = BTreeMap<String, String>;

/// One downloaded pronunciation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadEntry {
    /// Where the audio was written.
    pub path: PathBuf,
    /// Base of the final file name the host should use.
    pub base_name: String,
    pub extras: Extras,
}

/// What to look up.
///
/// `base` and `ruby` carry the literal form and its reading for languages
/// written in two scripts; they are only honored when `split` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadRequest {
    pub text: String,
    pub base: String,
    pub ruby: String,
    pub split: bool,
    pub language: String,
}

impl DownloadRequest {
    #[must_use]
    pub fn new<T: Into<String>, L: Into<String>>(text: T, language: L) -> Self {
        Self {
            text: text.into(),
            language: language.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_split<B: Into<String>, R: Into<String>>(mut self, base: B, ruby: R) -> Self {
        self.base = base.into();
        self.ruby = ruby.into();
        self.split = true;
        self
    }
}

/// Text shown as the source of a download, and the file name base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Names {
    pub display_text: String,
    pub base_name: String,
}

impl Names {
    #[must_use]
    pub fn plain(text: &str) -> Self {
        Self {
            display_text: text.to_string(),
            base_name: text.to_string(),
        }
    }
}

/// Per-instance configuration shared by every downloader of a chain.
#[derive(Clone)]
pub struct DownloaderSettings {
    pub fetcher: SharedFetcher,
    pub output: OutputTarget,
    pub user_agent: String,
    /// Without this, site icons are never fetched.
    pub fetch_icons: bool,
    pub max_icon_size: u32,
}

impl DownloaderSettings {
    #[must_use]
    pub fn new(fetcher: SharedFetcher, output: OutputTarget) -> Self {
        Self {
            fetcher,
            output,
            user_agent: USER_AGENT.to_string(),
            fetch_icons: false,
            max_icon_size: DEFAULT_MAX_ICON_SIZE,
        }
    }

    #[must_use]
    pub fn user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    #[must_use]
    pub const fn fetch_icons(mut self, fetch_icons: bool) -> Self {
        self.fetch_icons = fetch_icons;
        self
    }

    #[must_use]
    pub const fn max_icon_size(mut self, max_icon_size: u32) -> Self {
        self.max_icon_size = max_icon_size;
        self
    }
}

/// State and helpers every downloader has.
pub struct DownloaderCore {
    name: &'static str,
    url: String,
    icon_url: String,
    file_extension: &'static str,
    user_agent: String,
    fetcher: SharedFetcher,
    output: OutputTarget,
    icon: SiteIcon,
    display_text: String,
    downloads: Vec<DownloadEntry>,
}

impl DownloaderCore {
    #[must_use]
    pub fn new(
        name: &'static str,
        url: &str,
        icon_url: &str,
        file_extension: &'static str,
        settings: &DownloaderSettings,
    ) -> Self {
        Self {
            name,
            url: url.to_string(),
            icon_url: icon_url.to_string(),
            file_extension,
            user_agent: settings.user_agent.clone(),
            fetcher: settings.fetcher.clone(),
            output: settings.output.clone(),
            icon: SiteIcon::new(settings.fetch_icons, settings.max_icon_size),
            display_text: String::new(),
            downloads: Vec::new(),
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Base URL of the first download step.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub const fn file_extension(&self) -> &'static str {
        self.file_extension
    }

    #[must_use]
    pub fn display_text(&self) -> &str {
        &self.display_text
    }

    #[must_use]
    pub fn downloads(&self) -> &[DownloadEntry] {
        &self.downloads
    }

    pub(crate) fn reset(&mut self) {
        self.downloads.clear();
        self.display_text.clear();
    }

    /// Deletes the files of the current results and forgets them.
    pub(crate) fn discard_downloads(&mut self) {
        for entry in self.downloads.drain(..) {
            if let Err(e) = fs::remove_file(&entry.path) {
                warn!("Failed to remove {:?}: {e}", &entry.path);
            }
        }
    }

    pub(crate) fn set_names(&mut self, names: &Names) {
        self.display_text.clone_from(&names.display_text);
    }

    /// Raw body of `url`; anything but `200 OK` is an error.
    pub fn get_data_from_url(&self, url: &str) -> Result<Vec<u8>, DownloadError> {
        get_data(self.fetcher.as_ref(), url, &self.user_agent)
    }

    pub fn get_page_from_url(&self, url: &str) -> Result<HtmlPage, DownloadError> {
        let body = self.get_data_from_url(url)?;

        Ok(HtmlPage::new(url, &body))
    }

    /// Writes `data` to a freshly allocated file and records the download.
    ///
    /// `extension` overrides the downloader's default audio extension.
    pub fn save(
        &mut self,
        data: &[u8],
        base_name: &str,
        extension: Option<&str>,
        extras: Extras,
    ) -> Result<&DownloadEntry, DownloadError> {
        let extension = extension.unwrap_or(self.file_extension);
        let path = self.output.allocate(base_name, extension)?;

        debug!("Writing {} bytes to {:?}", data.len(), &path);
        if let Err(e) = fs::write(&path, data) {
            let _ = fs::remove_file(&path);
            return Err(DownloadError::io(path, e));
        }

        self.downloads.push(DownloadEntry {
            path,
            base_name: base_name.to_string(),
            extras,
        });

        Ok(&self.downloads[self.downloads.len() - 1])
    }

    /// The site icon, fetched on first use.
    pub fn maybe_get_icon(&mut self) -> Option<&DynamicImage> {
        let Self {
            fetcher,
            user_agent,
            url,
            icon_url,
            icon,
            name,
            ..
        } = self;

        icon.get_or_fetch(|| {
            trace!("Fetching site icon for {name}");
            fetch_site_icon(fetcher.as_ref(), user_agent, url, icon_url)
        })
    }
}

/// A source of pronunciations.
///
/// Implementors provide [`download_files`](Self::download_files); hosts call
/// [`download`](Self::download), which clears the previous results first.
pub trait AudioDownloader {
    fn core(&self) -> &DownloaderCore;

    fn core_mut(&mut self) -> &mut DownloaderCore;

    /// Fetches audio for `request` and stores each file through
    /// [`DownloaderCore::save`]. Finding nothing is not an error.
    fn download_files(&mut self, request: &DownloadRequest) -> DownloaderReturn;

    /// Display text and file base name for the looked up word.
    fn format_names(&self, text: &str, _base: &str, _ruby: &str) -> Names {
        Names::plain(text)
    }

    fn name(&self) -> &'static str {
        self.core().name()
    }

    /// Files written before a failure are deleted, so an error never leaves
    /// anything behind.
    fn download(&mut self, request: &DownloadRequest) -> Result<&[DownloadEntry], DownloadError> {
        self.core_mut().reset();

        debug!(
            "Looking up {:?} ({:?}) with {}",
            &request.text,
            &request.language,
            self.name()
        );
        if let Err(e) = self.download_files(request) {
            self.core_mut().discard_downloads();
            return Err(e);
        }
        debug!("{} produced {} file(s)", self.name(), self.downloads().len());

        Ok(self.core().downloads())
    }

    /// Results of the most recent [`download`](Self::download).
    fn downloads(&self) -> &[DownloadEntry] {
        self.core().downloads()
    }

    fn display_text(&self) -> &str {
        self.core().display_text()
    }

    fn site_icon(&mut self) -> Option<&DynamicImage> {
        self.core_mut().maybe_get_icon()
    }

    /// Whether the last results may be a placeholder the user should be
    /// offered to blacklist.
    fn show_blacklist_marker(&self) -> bool {
        false
    }
}

/// All known downloaders, in the order they should be tried.
#[must_use]
pub fn default_downloaders(settings: &DownloaderSettings) -> Vec<Box<dyn AudioDownloader>> {
    vec![
        Box::new(japanesepod::JapanesepodDownloader::new(settings)),
        Box::new(howjsay::HowJSayDownloader::new(settings)),
        Box::new(wiktionary::WiktionaryDownloader::new(settings)),
        Box::new(google_tts::GoogleTtsDownloader::new(settings)),
    ]
}
