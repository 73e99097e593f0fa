//! HTTP/JSON gateway to the dashboard backend.

use super::{
    CustomerGateway, CustomerIdRequest, CustomerIdsRequest, PredictionResult, RemovalProof,
    RemovalProofEnvelope, ResetAck, UnlearnAck, UnlearnBatchAck,
};
use crate::{
    config::DashConfig,
    customer::{json_kind, Customer, CustomerSchema, Transaction},
    error::{GatewayError, GatewayResult},
    types::CustomerId,
};
use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub struct HttpGateway {
    base_url: String,
    schema: CustomerSchema,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpGateway {
    pub fn new(base_url: &str, schema: CustomerSchema, timeout: Duration) -> GatewayResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Transport(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            schema,
            timeout,
            client,
        })
    }

    pub fn from_config(config: &DashConfig) -> GatewayResult<Self> {
        Self::new(
            &config.base_url,
            config.schema,
            Duration::from_millis(config.request_timeout_ms),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// `/customers/{id}[/{tail}]` with `id` escaped as a single path segment,
    /// so ids containing `/`, `?` or `#` cannot reach another endpoint.
    fn customer_url(&self, id: &str, tail: Option<&str>) -> GatewayResult<Url> {
        let mut url = Url::parse(&self.url("/customers"))
            .map_err(|e| GatewayError::Transport(format!("invalid base url {}: {e}", self.base_url)))?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                GatewayError::Transport(format!("base url {} cannot carry a path", self.base_url))
            })?;
            segments.push(id);
            if let Some(tail) = tail {
                segments.push(tail);
            }
        }
        Ok(url)
    }

    fn transport_error(&self, err: reqwest::Error) -> GatewayError {
        if err.is_timeout() {
            GatewayError::Timeout {
                ms: self.timeout.as_millis() as u64,
            }
        } else if err.is_decode() {
            GatewayError::Schema(format!("response body is not valid JSON: {err}"))
        } else {
            GatewayError::Transport(err.to_string())
        }
    }

    /// Send a request and return its JSON body.
    /// A 404 becomes `NotFound` only when `missing_id` names what was asked for.
    async fn send(
        &self,
        request: RequestBuilder,
        missing_id: Option<&str>,
    ) -> GatewayResult<serde_json::Value> {
        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            if let Some(id) = missing_id {
                return Err(GatewayError::NotFound { id: id.to_string() });
            }
        }
        if !status.is_success() {
            let url = response.url().to_string();
            return Err(GatewayError::Transport(format!("HTTP {status} from {url}")));
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| self.transport_error(e))
    }

    async fn get_json(&self, path: &str) -> GatewayResult<serde_json::Value> {
        log::debug!("gateway=http GET {path}");
        self.send(self.client.get(self.url(path)), None).await
    }

    async fn post_json<B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> GatewayResult<serde_json::Value> {
        log::debug!("gateway=http POST {path}");
        self.send(self.client.post(self.url(path)).json(body), None).await
    }
}

fn decode<T: DeserializeOwned>(what: &str, value: serde_json::Value) -> GatewayResult<T> {
    let kind = json_kind(&value);
    serde_json::from_value(value)
        .map_err(|e| GatewayError::Schema(format!("{what}: {e} (got {kind})")))
}

#[async_trait]
impl CustomerGateway for HttpGateway {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch_customers(&self) -> GatewayResult<Vec<Customer>> {
        let body = self.get_json("/customers").await?;
        let customers = self.schema.decode_list(body)?;
        log::info!("gateway=http fetched {} customers", customers.len());
        Ok(customers)
    }

    async fn fetch_customer_by_id(&self, id: &str) -> GatewayResult<Customer> {
        let url = self.customer_url(id, None)?;
        log::debug!("gateway=http GET {}", url.path());
        let body = self.send(self.client.get(url), Some(id)).await?;
        self.schema.decode(body)
    }

    async fn fetch_transactions(&self, customer_id: &str) -> GatewayResult<Vec<Transaction>> {
        let url = self.customer_url(customer_id, Some("transactions"))?;
        log::debug!("gateway=http GET {}", url.path());
        let body = self.send(self.client.get(url), Some(customer_id)).await?;
        if !body.is_array() {
            return Err(GatewayError::Schema(format!(
                "expected an array of transactions, got {}",
                json_kind(&body)
            )));
        }
        decode("transactions", body)
    }

    async fn trigger_unlearn(&self, customer_id: &str) -> GatewayResult<UnlearnAck> {
        let request = CustomerIdRequest {
            customer_id: customer_id.to_string(),
        };
        let ack: UnlearnAck = decode("unlearn ack", self.post_json("/unlearn_trigger", &request).await?)?;
        log::info!(
            "gateway=http unlearn customer={customer_id} shard={}",
            ack.retrained_shard
        );
        Ok(ack)
    }

    async fn unlearn_batch(&self, customer_ids: &[CustomerId]) -> GatewayResult<UnlearnBatchAck> {
        let request = CustomerIdsRequest {
            customer_ids: customer_ids.to_vec(),
        };
        decode("unlearn batch ack", self.post_json("/unlearn_batch", &request).await?)
    }

    async fn predict(&self, customer_id: &str) -> GatewayResult<PredictionResult> {
        let request = CustomerIdRequest {
            customer_id: customer_id.to_string(),
        };
        decode("prediction", self.post_json("/predict", &request).await?)
    }

    async fn removal_proof(&self, customer_id: &str) -> GatewayResult<RemovalProof> {
        let request = self
            .client
            .get(self.url("/metrics"))
            .query(&[("customer_id", customer_id)]);
        let body = self.send(request, None).await?;
        let envelope: RemovalProofEnvelope = decode("removal proof", body)?;
        Ok(envelope.result)
    }

    async fn reset(&self) -> GatewayResult<ResetAck> {
        let body = self.send(self.client.post(self.url("/reset")), None).await?;
        let ack: ResetAck = decode("reset ack", body)?;
        log::warn!("gateway=http backend reset: {}", ack.message);
        Ok(ack)
    }

    async fn health(&self) -> GatewayResult<bool> {
        let body = self.get_json("/health").await?;
        Ok(body.get("status").and_then(|s| s.as_str()) == Some("ok"))
    }
}
