use std::{sync::Arc, time::Duration};

use reqwest::{
    blocking::{Client as ReqwestClient, ClientBuilder as ReqwestClientBuilder},
    header,
};

use super::super::USER_AGENT;
use crate::error::DownloadError;

/// Raw answer to a GET request, whatever the status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub reason: String,
    pub body: Vec<u8>,
}

impl FetchResponse {
    #[must_use]
    pub fn ok<B: Into<Vec<u8>>>(body: B) -> Self {
        Self {
            status: 200,
            reason: "OK".to_string(),
            body: body.into(),
        }
    }
}

/// Transport used by the downloaders.
///
/// Implementations must not treat non-200 statuses as errors; that check is
/// done by the callers so the status and reason end up in the error.
pub trait Fetcher {
    fn get(&self, url: &str, user_agent: &str) -> Result<FetchResponse, DownloadError>;
}

pub type SharedFetcher = Arc<dyn Fetcher + Send + Sync>;

pub struct Client;

impl Client {
    pub fn with_timeout(timeout: Duration) -> Result<ReqwestClient, DownloadError> {
        Self::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| DownloadError::Network {
                url: String::new(),
                source,
            })
    }

    pub fn builder() -> ReqwestClientBuilder {
        ReqwestClient::builder()
            .user_agent(USER_AGENT)
            .timeout(DEFAULT_TIMEOUT)
    }
}

/// Body of a `200 OK` answer to a GET of `url`.
///
/// Any other status becomes [`DownloadError::HttpStatus`].
pub fn get_data(fetcher: &dyn Fetcher, url: &str, user_agent: &str) -> Result<Vec<u8>, DownloadError> {
    let res = fetcher.get(url, user_agent)?;

    if res.status != 200 {
        return Err(DownloadError::HttpStatus {
            url: url.to_string(),
            status: res.status,
            reason: res.reason,
        });
    }

    Ok(res.body)
}

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// [`Fetcher`] backed by a blocking reqwest client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: ReqwestClient,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, DownloadError> {
        Ok(Self {
            client: Client::with_timeout(timeout)?,
        })
    }

    pub fn shared(timeout: Duration) -> Result<SharedFetcher, DownloadError> {
        Ok(Arc::new(Self::new(timeout)?))
    }
}

impl Fetcher for HttpFetcher {
    fn get(&self, url: &str, user_agent: &str) -> Result<FetchResponse, DownloadError> {
        app_logger::trace!("GET {url:?}");

        let network_err = |source| DownloadError::Network {
            url: url.to_string(),
            source,
        };

        let res = self
            .client
            .get(url)
            .header(header::USER_AGENT, user_agent)
            .send()
            .map_err(network_err)?;

        let status = res.status();
        app_logger::trace!("Got {status} from {url:?}");

        let body = res.bytes().map_err(network_err)?.to_vec();

        Ok(FetchResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }
}
