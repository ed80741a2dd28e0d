//! Planning service client.
//!
//! [`PlanClient`] is the seam between the engine and the remote trading
//! service. [`HttpPlanClient`] talks JSON over HTTP; tests substitute a
//! scripted implementation.

use async_trait::async_trait;
use log::debug;
use reqwest::{Response, StatusCode, Url};

use crate::{
    error::{PlanError, Result},
    models::{PlanRequest, PlanResponse, StepProofUpdate},
};

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Remote planning service operations used by the engine.
#[async_trait]
pub trait PlanClient: Send + Sync {
    /// Creates a plan from an accepted quote.
    async fn create_plan(&self, request: &PlanRequest) -> Result<PlanResponse>;

    /// Fetches the latest state of a plan.
    async fn get_plan(&self, plan_id: &str) -> Result<PlanResponse>;

    /// Re-quotes an existing plan from its current step onward.
    async fn refresh_plan(&self, plan_id: &str) -> Result<PlanResponse>;

    /// Reports the proof of a submitted or signed step.
    async fn update_plan(&self, plan_id: &str, update: &StepProofUpdate) -> Result<PlanResponse>;
}

/// JSON-over-HTTP implementation of [`PlanClient`].
#[derive(Debug, Clone)]
pub struct HttpPlanClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpPlanClient {
    /// Creates a client for the service rooted at `base_url`.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self::with_http_client(reqwest::Client::new(), base_url, api_key)
    }

    /// Creates a client reusing an existing `reqwest::Client`.
    pub fn with_http_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            api_key,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Joins path segments onto the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| PlanError::Configuration {
            message: format!("Invalid service URL '{}': {e}", self.base_url),
        })?;
        url.path_segments_mut()
            .map_err(|()| PlanError::Configuration {
                message: format!("Service URL '{}' cannot take a path", self.base_url),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.header(API_KEY_HEADER, key),
            None => request,
        }
    }

    async fn send(&self, plan_id: &str, request: reqwest::RequestBuilder) -> Result<PlanResponse> {
        let response = self.authorize(request).send().await?;
        extract_plan_response(plan_id, response).await
    }
}

#[async_trait]
impl PlanClient for HttpPlanClient {
    async fn create_plan(&self, request: &PlanRequest) -> Result<PlanResponse> {
        debug!("create_plan for swapper {}", request.swapper);
        let url = self.endpoint(&["plan"])?;
        self.send("<new>", self.http.post(url).json(request)).await
    }

    async fn get_plan(&self, plan_id: &str) -> Result<PlanResponse> {
        debug!("get_plan: {plan_id}");
        let url = self.endpoint(&["plan", plan_id])?;
        self.send(plan_id, self.http.get(url)).await
    }

    async fn refresh_plan(&self, plan_id: &str) -> Result<PlanResponse> {
        debug!("refresh_plan: {plan_id}");
        let url = self.endpoint(&["plan", plan_id, "refresh"])?;
        self.send(plan_id, self.http.post(url)).await
    }

    async fn update_plan(&self, plan_id: &str, update: &StepProofUpdate) -> Result<PlanResponse> {
        debug!("update_plan: {plan_id} step {}", update.step_index);
        let body = serde_json::json!({ "steps": [update] });
        let url = self.endpoint(&["plan", plan_id])?;
        self.send(plan_id, self.http.patch(url).json(&body)).await
    }
}

/// Turns an HTTP response into a plan, attaching the plan id to failures.
///
/// # Errors
///
/// Returns `PlanError::PlanFetch` for non-success statuses and bodies that do
/// not parse as a plan, and `PlanError::Transport` when the body cannot be
/// read.
pub async fn extract_plan_response(plan_id: &str, response: Response) -> Result<PlanResponse> {
    let status = response.status();
    let body = response.text().await?;
    parse_plan_body(plan_id, status, &body)
}

fn parse_plan_body(plan_id: &str, status: StatusCode, body: &str) -> Result<PlanResponse> {
    if !status.is_success() {
        return Err(PlanError::PlanFetch {
            plan_id: plan_id.to_string(),
            message: format!("HTTP {status}: {}", truncate(body, 200)),
        });
    }
    serde_json::from_str(body).map_err(|e| PlanError::PlanFetch {
        plan_id: plan_id.to_string(),
        message: format!("unparseable response: {e}"),
    })
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
