use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{RemoteError, RemoteStore};
use crate::auth::Credential;
use crate::plans::{GenerationRequest, Plan, PlanDraft, PlanId};

/// RemoteStore over the diet service's REST API.
#[derive(Clone)]
pub struct HttpRemoteStore {
    client: Client,
    base_url: String,
}

impl HttpRemoteStore {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("build remote store http client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send(&self, req: RequestBuilder, credential: &Credential) -> Result<Response, RemoteError> {
        let response = req
            .bearer_auth(credential.token())
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "remote store request failed");
                RemoteError::Unavailable(format!("request failed: {e}"))
            })?;

        let status = response.status();
        debug!(%status, url = %response.url(), "remote store response");
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(classify(status, &body))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
        credential: &Credential,
    ) -> Result<T, RemoteError> {
        self.send(req, credential)
            .await?
            .json::<T>()
            .await
            .map_err(|e| RemoteError::Unavailable(format!("undecodable response: {e}")))
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

fn classify(status: StatusCode, body: &str) -> RemoteError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemoteError::Unauthorized,
        StatusCode::NOT_FOUND => RemoteError::NotFound,
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => RemoteError::Validation(message),
        _ => {
            warn!(%status, body_length = body.len(), "remote store error response");
            RemoteError::Unavailable(format!("status {}: {message}", status.as_u16()))
        }
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn fetch_plans(&self, credential: &Credential) -> Result<Vec<Plan>, RemoteError> {
        self.send_json(self.client.get(self.url("/diets")), credential)
            .await
    }

    async fn generate_plan(
        &self,
        credential: &Credential,
        request: &GenerationRequest,
    ) -> Result<Plan, RemoteError> {
        let req = self.client.post(self.url("/diets/generate")).json(request);
        self.send_json(req, credential).await
    }

    async fn create_plan(
        &self,
        credential: &Credential,
        draft: &PlanDraft,
    ) -> Result<Plan, RemoteError> {
        let req = self.client.post(self.url("/diets")).json(draft);
        self.send_json(req, credential).await
    }

    async fn delete_plan(&self, credential: &Credential, id: &PlanId) -> Result<(), RemoteError> {
        let req = self.client.delete(self.url(&format!("/diets/{id}")));
        self.send(req, credential).await.map(|_| ())
    }

    async fn replace_plan(
        &self,
        credential: &Credential,
        id: &PlanId,
        plan: &Plan,
    ) -> Result<Plan, RemoteError> {
        let req = self.client.put(self.url(&format!("/diets/{id}"))).json(plan);
        self.send_json(req, credential).await
    }
}
