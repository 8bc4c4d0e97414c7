//! Backend selection: remote workspace when declared and reachable,
//! local engine otherwise.

use async_trait::async_trait;
use reqwest::Client;
use taproot_types::Stack;
use tracing::{debug, warn};

use crate::client::{Provisioner, ProvisionerFactory};
use crate::error::ProvisionResult;
use crate::local::LocalProvisioner;
use crate::remote::{RemoteProvisioner, PROBE_TIMEOUT, TOKEN_ENV};

/// Factory resolving one provisioner per lifecycle phase.
///
/// A stack whose document declares a complete remote backend is probed
/// against the workspace service. Only a confirmed workspace selects
/// the remote client; an absent workspace, an unreachable service, or
/// a probe timeout all fall back to the local engine. The probe runs
/// again on every call, so a service that comes up mid-lifecycle is
/// picked up by the next phase.
pub struct BackendStrategy {
    engine: String,
    token: Option<String>,
    http: Client,
}

impl BackendStrategy {
    pub fn new(engine: impl Into<String>) -> Self {
        Self {
            engine: engine.into(),
            token: std::env::var(TOKEN_ENV).ok(),
            http: Client::new(),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

#[async_trait]
impl ProvisionerFactory for BackendStrategy {
    async fn provisioner(&self, stack: &Stack) -> ProvisionResult<Box<dyn Provisioner>> {
        let document = stack.document()?;

        let Some(backend) = document.remote_backend() else {
            debug!(stack = %stack.name, "no remote backend declared, provisioning locally");
            return Ok(Box::new(LocalProvisioner::new(&self.engine, stack)));
        };

        let candidate =
            RemoteProvisioner::new(self.http.clone(), self.token.clone(), backend, stack);

        let probe = tokio::time::timeout(PROBE_TIMEOUT, candidate.workspace_exists()).await;
        match probe {
            Ok(Ok(true)) => {
                debug!(stack = %stack.name, "workspace confirmed, provisioning remotely");
                Ok(Box::new(candidate))
            }
            Ok(Ok(false)) => {
                warn!(stack = %stack.name, "declared workspace does not exist, falling back to local engine");
                Ok(Box::new(LocalProvisioner::new(&self.engine, stack)))
            }
            Ok(Err(error)) => {
                warn!(stack = %stack.name, %error, "workspace probe failed, falling back to local engine");
                Ok(Box::new(LocalProvisioner::new(&self.engine, stack)))
            }
            Err(_) => {
                warn!(stack = %stack.name, "workspace probe timed out, falling back to local engine");
                Ok(Box::new(LocalProvisioner::new(&self.engine, stack)))
            }
        }
    }
}
