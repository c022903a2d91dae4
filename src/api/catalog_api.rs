use crate::config::Config;
use crate::error::{CatalogError, IsRetryable};
use crate::types::catalog::{Envelope, MakeAttributes, ModelAttributes, RemoteMake, RemoteModel};
use backon::{ExponentialBuilder, Retryable};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Read access to the remote make/model catalog.
pub trait CatalogSource {
    fn list_makes(&self) -> impl Future<Output = Result<Vec<RemoteMake>, CatalogError>> + Send;

    /// Models whose make matches `make_name` case-insensitively.
    fn list_models(
        &self,
        make_name: &str,
    ) -> impl Future<Output = Result<Vec<RemoteModel>, CatalogError>> + Send;
}

/// HTTP client for the Strapi-style catalog API.
///
/// Each listing asks for one page capped at `page_limit` records; further
/// pages are never requested. Transient failures (connect, timeout, 5xx, 429)
/// are retried up to `max_retries` times with backoff, so a call issues
/// exactly one GET only when `max_retries` is 0.
pub struct CatalogApi {
    client: reqwest::Client,
    makes_url: Url,
    models_url: Url,
    page_limit: u32,
    max_retries: usize,
}

impl CatalogApi {
    pub fn new(cfg: &Config) -> Result<Self, CatalogError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("cardle-sync/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))
            .timeout(Duration::from_secs(cfg.request_timeout_secs));
        if let Some(proxy_url) = cfg.proxy.as_ref() {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url.as_str())?);
        }
        let client = builder.build()?;
        Ok(Self::with_client(
            client,
            cfg.makes_url.clone(),
            cfg.models_url.clone(),
            cfg.page_limit,
            cfg.max_retries,
        ))
    }

    pub fn with_client(
        client: reqwest::Client,
        makes_url: Url,
        models_url: Url,
        page_limit: u32,
        max_retries: usize,
    ) -> Self {
        Self {
            client,
            makes_url,
            models_url,
            page_limit,
            max_retries,
        }
    }

    fn retry_policy(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(500))
            .with_max_delay(Duration::from_secs(3))
            .with_max_times(self.max_retries)
            .with_jitter()
    }

    pub fn makes_request_url(&self) -> Url {
        let mut url = self.makes_url.clone();
        url.query_pairs_mut()
            .append_pair("fields[0]", "id")
            .append_pair("fields[1]", "make")
            .append_pair("sort[1]", "make")
            .append_pair("pagination[limit]", &self.page_limit.to_string());
        url
    }

    pub fn models_request_url(&self, make_name: &str) -> Url {
        let mut url = self.models_url.clone();
        url.query_pairs_mut()
            .append_pair("fields[0]", "model")
            .append_pair("filters[make][make][$eqi]", make_name)
            .append_pair("sort[0]", "model")
            .append_pair("pagination[limit]", &self.page_limit.to_string());
        url
    }

    /// GET `url` and decode the JSON body, retrying transient failures.
    async fn get_json<T>(&self, url: Url) -> Result<T, CatalogError>
    where
        T: DeserializeOwned,
    {
        (|| async {
            let resp = self.client.get(url.clone()).send().await?;
            let status = resp.status();
            if !status.is_success() {
                return Err(CatalogError::UpstreamStatus(status));
            }
            let body = resp.bytes().await?;
            Ok(serde_json::from_slice::<T>(&body)?)
        })
        .retry(self.retry_policy())
        .when(|e: &CatalogError| e.is_retryable())
        .notify(|err, dur: Duration| {
            warn!("catalog request retrying after error {}, sleeping {:?}", err, dur);
        })
        .await
    }

    fn warn_if_truncated(&self, what: &str, count: usize) {
        if count >= self.page_limit as usize {
            warn!(
                what,
                count,
                page_limit = self.page_limit,
                "response filled the whole page; results may be truncated"
            );
        }
    }
}

impl CatalogSource for CatalogApi {
    async fn list_makes(&self) -> Result<Vec<RemoteMake>, CatalogError> {
        let env: Envelope<MakeAttributes> = self.get_json(self.makes_request_url()).await?;
        let makes = env.into_makes();
        debug!(count = makes.len(), "fetched makes");
        self.warn_if_truncated("makes", makes.len());
        Ok(makes)
    }

    async fn list_models(&self, make_name: &str) -> Result<Vec<RemoteModel>, CatalogError> {
        let env: Envelope<ModelAttributes> =
            self.get_json(self.models_request_url(make_name)).await?;
        let models = env.into_models();
        debug!(make = %make_name, count = models.len(), "fetched models");
        self.warn_if_truncated(make_name, models.len());
        Ok(models)
    }
}
