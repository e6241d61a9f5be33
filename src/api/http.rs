use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use super::{ApiResult, PaydaBackend};
use crate::config::ClientConfig;
use crate::errors::ClientError;
use crate::models::{
    AssignCouponRequest, Coupon, CouponQuery, CreatedNeed, Donation, Need, NeedStatus, NewNeed,
    OperationStatus, ShowcaseItem, UseCouponRequest,
};

/// JSON-over-HTTP client for the PAYDA backend.
#[derive(Clone, Debug)]
pub struct HttpBackend {
    client: Client,
    base: Url,
    display_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let display_url = base_url.trim().trim_end_matches('/').to_string();
        // Url::join drops the last path segment unless the base ends with '/'
        let base = Url::parse(&format!("{}/", display_url))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base,
            display_url,
        })
    }

    pub fn from_config(config: &ClientConfig) -> ApiResult<Self> {
        Self::new(&config.api_base_url, config.request_timeout())
    }

    fn request(&self, method: Method, path: &str) -> ApiResult<RequestBuilder> {
        let url = self.base.join(path)?;
        Ok(self.client.request(method, url))
    }

    fn map_send_error(&self, err: reqwest::Error) -> ClientError {
        if err.is_connect() || err.is_timeout() {
            ClientError::Unreachable {
                base_url: self.display_url.clone(),
            }
        } else {
            ClientError::Transport(err.to_string())
        }
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let response = request
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !status.is_success() {
            debug!(%status, "backend rejected request");
            return Err(ClientError::from_error_body(status, &body));
        }

        serde_json::from_slice(&body).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> ApiResult<T> {
        let request = self.request(Method::GET, path)?.query(query);
        self.execute(request).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let request = self.request(Method::POST, path)?.json(body);
        self.execute(request).await
    }
}

#[async_trait]
impl PaydaBackend for HttpBackend {
    #[instrument(skip(self))]
    async fn list_items(&self) -> ApiResult<Vec<ShowcaseItem>> {
        self.get_json("items", &[]).await
    }

    #[instrument(skip(self))]
    async fn list_needs(&self, status: Option<NeedStatus>) -> ApiResult<Vec<Need>> {
        let query: Vec<(&'static str, String)> = status
            .map(|s| vec![("status", s.as_str().to_string())])
            .unwrap_or_default();
        self.get_json("needs", &query).await
    }

    #[instrument(skip(self))]
    async fn get_need(&self, need_id: i64) -> ApiResult<Need> {
        self.get_json(&format!("needs/{}", need_id), &[]).await
    }

    #[instrument(skip(self))]
    async fn list_coupons(&self, query: &CouponQuery) -> ApiResult<Vec<Coupon>> {
        self.get_json("coupons", &query.to_pairs()).await
    }

    #[instrument(skip(self))]
    async fn assign_coupon(&self, request: &AssignCouponRequest) -> ApiResult<OperationStatus> {
        self.post_json("coupons/assign", request).await
    }

    #[instrument(skip(self))]
    async fn use_coupon(&self, request: &UseCouponRequest) -> ApiResult<OperationStatus> {
        self.post_json("coupons/use", request).await
    }

    #[instrument(skip(self))]
    async fn list_donations(&self) -> ApiResult<Vec<Donation>> {
        self.get_json("donations", &[]).await
    }

    #[instrument(skip(self, need), fields(title = %need.title))]
    async fn create_need(&self, need: &NewNeed) -> ApiResult<CreatedNeed> {
        self.post_json("needs", need).await
    }

    fn base_url(&self) -> &str {
        &self.display_url
    }
}
