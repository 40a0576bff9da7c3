use app_logger::{debug, trace};
use image::{imageops::FilterType, DynamicImage, GenericImageView};

use super::{
    page::{resolve_url, HtmlPage},
    request::{get_data, Fetcher},
};
use crate::error::DownloadError;

/// Largest edge an icon is scaled down to unless configured otherwise.
pub const DEFAULT_MAX_ICON_SIZE: u32 = 20;

#[derive(Debug, Clone, Default)]
enum IconState {
    #[default]
    Unfetched,
    Cached(Option<DynamicImage>),
}

/// Memoized site icon.
///
/// The first lookup decides the outcome for the lifetime of the value; a
/// failed lookup is cached as "no icon" and never retried.
#[derive(Debug, Clone)]
pub struct SiteIcon {
    enabled: bool,
    max_size: u32,
    state: IconState,
}

impl SiteIcon {
    #[must_use]
    pub fn new(enabled: bool, max_size: u32) -> Self {
        Self {
            enabled,
            max_size: max_size.max(1),
            state: IconState::Unfetched,
        }
    }

    #[must_use]
    pub const fn is_fetched(&self) -> bool {
        matches!(self.state, IconState::Cached(_))
    }

    /// Returns the cached icon, running `fetch` on the first call only.
    ///
    /// With icons disabled this never calls `fetch` and the icon stays unset.
    pub fn get_or_fetch<F>(&mut self, fetch: F) -> Option<&DynamicImage>
    where
        F: FnOnce() -> Option<DynamicImage>,
    {
        if !self.enabled {
            return None;
        }

        if matches!(self.state, IconState::Unfetched) {
            let icon = fetch().map(|icon| shrink_to_fit(icon, self.max_size));
            if icon.is_none() {
                debug!("No site icon available");
            }
            self.state = IconState::Cached(icon);
        }

        match &self.state {
            IconState::Cached(icon) => icon.as_ref(),
            IconState::Unfetched => None,
        }
    }
}

/// Scales `icon` down to fit a `max_size` square, keeping the aspect ratio.
/// Icons that already fit are returned untouched.
#[must_use]
pub fn shrink_to_fit(icon: DynamicImage, max_size: u32) -> DynamicImage {
    let (w, h) = icon.dimensions();

    if w <= max_size && h <= max_size {
        return icon;
    }

    trace!("Scaling icon from {w}x{h} to fit {max_size}x{max_size}");

    icon.resize(max_size, max_size, FilterType::Lanczos3)
}

/// Looks up the icon of the site at `icon_url`.
///
/// Prefers a `<link rel="icon">` declared on the page, resolved against
/// `base_url`, and falls back to `/favicon.ico` on the icon host when the page
/// can't be loaded or declares none. Every failure ends up as `None`.
pub fn fetch_site_icon(
    fetcher: &dyn Fetcher,
    user_agent: &str,
    base_url: &str,
    icon_url: &str,
) -> Option<DynamicImage> {
    let page = match get_data(fetcher, icon_url, user_agent) {
        Ok(body) => HtmlPage::new(icon_url, &body),
        Err(e) => {
            debug!("Failed to load icon page {icon_url:?}: {e}");
            return get_favicon(fetcher, user_agent, icon_url);
        }
    };

    let href = match page.icon_link() {
        Ok(Some(href)) => href,
        Ok(None) => {
            trace!("No icon link on {icon_url:?}");
            return get_favicon(fetcher, user_agent, icon_url);
        }
        Err(e) => {
            debug!("Failed to parse icon page: {e}");
            return get_favicon(fetcher, user_agent, icon_url);
        }
    };

    let url = match resolve_url(base_url, &href) {
        Ok(url) => url,
        Err(e) => {
            debug!("Bad icon link: {e}");
            return None;
        }
    };

    load_icon(fetcher, user_agent, url.as_str())
        .map_err(|e| debug!("Failed to load icon: {e}"))
        .ok()
}

fn get_favicon(fetcher: &dyn Fetcher, user_agent: &str, icon_url: &str) -> Option<DynamicImage> {
    let url = resolve_url(icon_url, "/favicon.ico")
        .map_err(|e| debug!("Can't build favicon URL: {e}"))
        .ok()?;

    load_icon(fetcher, user_agent, url.as_str())
        .map_err(|e| debug!("Failed to load favicon: {e}"))
        .ok()
}

fn load_icon(fetcher: &dyn Fetcher, user_agent: &str, url: &str) -> Result<DynamicImage, DownloadError> {
    let data = get_data(fetcher, url, user_agent)?;

    image::load_from_memory(&data).map_err(|source| DownloadError::Image {
        url: url.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::{
        downloaders::common::request::FetchResponse,
        test_support::{png_bytes, FakeFetcher},
    };

    #[test]
    fn large_icons_are_scaled_keeping_aspect_ratio() {
        let icon = shrink_to_fit(DynamicImage::new_rgba8(64, 32), 20);

        assert_eq!(icon.dimensions(), (20, 10));
    }

    #[test]
    fn small_icons_are_untouched() {
        let icon = shrink_to_fit(DynamicImage::new_rgba8(16, 16), 20);

        assert_eq!(icon.dimensions(), (16, 16));
    }

    #[test]
    fn fetches_only_once() {
        let calls = Cell::new(0);
        let mut icon = SiteIcon::new(true, 20);

        for _ in 0..3 {
            let got = icon.get_or_fetch(|| {
                calls.set(calls.get() + 1);
                Some(DynamicImage::new_rgba8(8, 8))
            });
            assert!(got.is_some());
        }

        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn failure_is_cached_too() {
        let calls = Cell::new(0);
        let mut icon = SiteIcon::new(true, 20);

        for _ in 0..2 {
            let got = icon.get_or_fetch(|| {
                calls.set(calls.get() + 1);
                None
            });
            assert!(got.is_none());
        }

        assert_eq!(calls.get(), 1);
        assert!(icon.is_fetched());
    }

    #[test]
    fn disabled_never_fetches() {
        let mut icon = SiteIcon::new(false, 20);

        let got = icon.get_or_fetch(|| panic!("must not fetch"));

        assert!(got.is_none());
        assert!(!icon.is_fetched());
    }

    #[test]
    fn uses_declared_icon_link() {
        let fetcher = FakeFetcher::new()
            .route(
                "https://example.com/",
                FetchResponse::ok(r#"<html><head><link rel="icon" href="/icons/a.png"></head></html>"#),
            )
            .route("https://example.com/icons/a.png", FetchResponse::ok(png_bytes(64, 32)));

        let icon = fetch_site_icon(&fetcher, "UA", "https://example.com/page", "https://example.com/").unwrap();

        assert_eq!(icon.dimensions(), (64, 32));
        assert_eq!(
            fetcher.requests(),
            vec!["https://example.com/", "https://example.com/icons/a.png"]
        );
    }

    #[test]
    fn falls_back_to_favicon_without_link() {
        let fetcher = FakeFetcher::new()
            .route("https://example.com/start", FetchResponse::ok("<html><head></head></html>"))
            .route("https://example.com/favicon.ico", FetchResponse::ok(png_bytes(16, 16)));

        let icon = fetch_site_icon(&fetcher, "UA", "https://example.com/", "https://example.com/start");

        assert!(icon.is_some());
        assert_eq!(fetcher.requests().last().unwrap(), "https://example.com/favicon.ico");
    }

    #[test]
    fn falls_back_to_favicon_when_page_fails() {
        let fetcher = FakeFetcher::new()
            .route("https://example.com/favicon.ico", FetchResponse::ok(png_bytes(16, 16)));

        let icon = fetch_site_icon(&fetcher, "UA", "https://example.com/", "https://example.com/start");

        assert!(icon.is_some());
    }

    #[test]
    fn missing_icon_gives_none() {
        let fetcher = FakeFetcher::new().route(
            "https://example.com/",
            FetchResponse::ok(r#"<link rel="icon" href="/gone.png">"#),
        );

        let icon = fetch_site_icon(&fetcher, "UA", "https://example.com/", "https://example.com/");

        assert!(icon.is_none());
    }

    #[test]
    fn undecodable_icon_gives_none() {
        let fetcher = FakeFetcher::new()
            .route("https://example.com/favicon.ico", FetchResponse::ok("not an image"));

        let icon = fetch_site_icon(&fetcher, "UA", "https://example.com/", "https://example.com/");

        assert!(icon.is_none());
    }
}
