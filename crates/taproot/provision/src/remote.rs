//! Remote workspace provisioning over HTTP.
//!
//! Stacks that declare a remote backend are provisioned by a workspace
//! service instead of a local engine process. Plans become server-side
//! runs; apply streams the run log back; destroy is queued as a
//! destroy run since nothing persists on this side between phases.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use taproot_types::{OutputMap, PlanArtifact, RemoteBackend, Stack};
use tracing::{debug, info};

use crate::client::{normalize_outputs, ChunkSink, Provisioner};
use crate::error::{ProvisionError, ProvisionResult};

/// Environment variable holding the workspace service API token.
pub const TOKEN_ENV: &str = "TAPROOT_TOKEN";

/// How long the workspace probe waits before the caller falls back to
/// local provisioning.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct CreateRunRequest<'a> {
    configuration: &'a str,
    destroy: bool,
}

#[derive(Debug, Deserialize)]
struct RunCreated {
    id: String,
    summary: String,
}

// ── Remote Provisioner ─────────────────────────────────────────────────

/// One-phase client talking to a remote workspace service.
pub struct RemoteProvisioner {
    http: Client,
    base_url: String,
    token: Option<String>,
    backend: RemoteBackend,
    stack_name: String,
    configuration: String,
}

impl RemoteProvisioner {
    pub fn new(http: Client, token: Option<String>, backend: RemoteBackend, stack: &Stack) -> Self {
        let base_url = format!("https://{}", backend.host.trim_end_matches('/'));
        Self {
            http,
            base_url,
            token,
            backend,
            stack_name: stack.name.clone(),
            configuration: stack.content.clone(),
        }
    }

    /// Whether the configured workspace exists on the service. `Ok`
    /// is an authoritative answer either way; `Err` means the service
    /// could not be reached at all.
    pub async fn workspace_exists(&self) -> ProvisionResult<bool> {
        let url = self.workspace_path();
        let response = self.request(self.http.get(&url)).send().await?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(ProvisionError::engine_failed(
                    "probe",
                    format!("{status}: {body}"),
                ))
            }
        }
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn workspace_path(&self) -> String {
        format!(
            "{}/api/v1/workspaces/{}/{}",
            self.base_url, self.backend.organization, self.backend.workspace
        )
    }

    async fn fail_on_error(
        &self,
        phase: &str,
        response: reqwest::Response,
    ) -> ProvisionResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ProvisionError::engine_failed(
            phase,
            format!("{status}: {body}"),
        ))
    }

    async fn stream_run_log(
        &self,
        phase: &str,
        url: String,
        on_chunk: ChunkSink<'_>,
    ) -> ProvisionResult<()> {
        let response = self
            .request(self.http.post(&url))
            .send()
            .await?;
        let response = self.fail_on_error(phase, response).await?;

        let mut stream = response.bytes_stream();
        let mut pending = String::new();
        while let Some(bytes) = stream.next().await {
            let bytes = bytes?;
            pending.push_str(&String::from_utf8_lossy(&bytes));
            // Forward whole lines; a trailing partial line waits for
            // the next chunk.
            while let Some(newline) = pending.find('\n') {
                let line: String = pending.drain(..=newline).collect();
                on_chunk(line.trim_end_matches('\n'));
            }
        }
        if !pending.is_empty() {
            on_chunk(&pending);
        }
        Ok(())
    }
}

#[async_trait]
impl Provisioner for RemoteProvisioner {
    async fn init(&self) -> ProvisionResult<()> {
        // The workspace owns engine state; nothing to prepare here.
        debug!(stack = %self.stack_name, workspace = %self.backend.workspace, "remote init is a no-op");
        Ok(())
    }

    async fn plan(&self, destroy: bool) -> ProvisionResult<PlanArtifact> {
        let url = format!("{}/runs", self.workspace_path());
        let body = CreateRunRequest {
            configuration: &self.configuration,
            destroy,
        };
        let response = self.request(self.http.post(&url).json(&body)).send().await?;
        let response = self.fail_on_error("plan", response).await?;
        let run: RunCreated = response.json().await?;

        info!(stack = %self.stack_name, run = %run.id, destroy, "remote run planned");
        Ok(PlanArtifact::remote(
            self.stack_name.clone(),
            run.summary,
            run.id,
            destroy,
        ))
    }

    async fn apply(&self, plan: &PlanArtifact, on_chunk: ChunkSink<'_>) -> ProvisionResult<()> {
        let run_id =
            plan.remote_run
                .as_ref()
                .ok_or_else(|| ProvisionError::MissingPlanHandle {
                    phase: "apply".into(),
                })?;
        let url = format!("{}/api/v1/runs/{}/apply", self.base_url, run_id);
        self.stream_run_log("apply", url, on_chunk).await
    }

    async fn destroy(&self, on_chunk: ChunkSink<'_>) -> ProvisionResult<()> {
        let url = format!("{}/destroy", self.workspace_path());
        self.stream_run_log("destroy", url, on_chunk).await
    }

    async fn output(&self) -> ProvisionResult<OutputMap> {
        let url = format!("{}/outputs", self.workspace_path());
        let response = self.request(self.http.get(&url)).send().await?;
        let response = self.fail_on_error("output", response).await?;
        let raw: serde_json::Value = response.json().await?;
        normalize_outputs(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> RemoteBackend {
        RemoteBackend {
            host: "app.example.io".into(),
            organization: "acme".into(),
            workspace: "prod-network".into(),
        }
    }

    fn client() -> RemoteProvisioner {
        let stack = Stack::new("net", r#"{"resource": {}}"#, "/tmp/net");
        RemoteProvisioner::new(Client::new(), Some("tok".into()), backend(), &stack)
    }

    #[test]
    fn workspace_urls_carry_org_and_workspace() {
        let client = client();
        assert_eq!(
            client.workspace_path(),
            "https://app.example.io/api/v1/workspaces/acme/prod-network"
        );
    }

    #[tokio::test]
    async fn apply_rejects_artifacts_without_a_run_handle() {
        let plan = PlanArtifact::local("net", "", "/tmp/plan.out", false);
        let mut sink = |_: &str| {};
        let err = client().apply(&plan, &mut sink).await.unwrap_err();
        assert!(matches!(err, ProvisionError::MissingPlanHandle { .. }));
    }
}
