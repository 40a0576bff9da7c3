pub use crate::{
    chain::{ChainEntry, ChainMode, DownloaderChain},
    downloaders::{
        common::{
            file_name::{MediaDirectory, MediaNamer, OutputTarget},
            icon::{SiteIcon, DEFAULT_MAX_ICON_SIZE},
            page::{resolve_url, HtmlPage},
            request::{FetchResponse, Fetcher, HttpFetcher, SharedFetcher, DEFAULT_TIMEOUT},
        },
        default_downloaders, AudioDownloader, DownloadEntry, DownloadRequest, DownloaderCore,
        DownloaderSettings, Extras, Names, USER_AGENT,
    },
    error::DownloadError,
};

mod chain;
pub mod downloaders;
mod error;
#[cfg(test)]
mod test_support;
