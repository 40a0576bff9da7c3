use std::{
    collections::HashMap,
    io::Cursor,
    sync::{Arc, Mutex},
};

use image::{DynamicImage, ImageOutputFormat};

use crate::{
    downloaders::common::request::{FetchResponse, Fetcher, SharedFetcher},
    error::DownloadError,
};

/// In-memory [`Fetcher`]. Unknown URLs answer `404 Not Found`.
#[derive(Debug, Default)]
pub struct FakeFetcher {
    routes: HashMap<String, FetchResponse>,
    log: Mutex<Vec<(String, String)>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, url: &str, response: FetchResponse) -> Self {
        self.routes.insert(url.to_string(), response);
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn requests(&self) -> Vec<String> {
        self.log.lock().unwrap().iter().map(|x| x.0.clone()).collect()
    }

    pub fn user_agents(&self) -> Vec<String> {
        self.log.lock().unwrap().iter().map(|x| x.1.clone()).collect()
    }
}

impl Fetcher for FakeFetcher {
    fn get(&self, url: &str, user_agent: &str) -> Result<FetchResponse, DownloadError> {
        self.log
            .lock()
            .unwrap()
            .push((url.to_string(), user_agent.to_string()));

        Ok(self.routes.get(url).cloned().unwrap_or_else(|| FetchResponse {
            status: 404,
            reason: "Not Found".to_string(),
            body: b"not found".to_vec(),
        }))
    }
}

pub fn as_shared(fetcher: &Arc<FakeFetcher>) -> SharedFetcher {
    fetcher.clone()
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    DynamicImage::new_rgba8(width, height)
        .write_to(&mut out, ImageOutputFormat::Png)
        .unwrap();

    out.into_inner()
}
