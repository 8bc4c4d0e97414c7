//! The provisioning client seam: capability trait, selection factory
//! trait, and simulated implementations.
//!
//! One capability set covers both client variants. Clients are cheap,
//! single-phase objects: the execution machine asks the factory for a
//! fresh one per phase, so nothing here carries connection state
//! between phases.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use taproot_types::{OutputMap, PlanArtifact, Stack};

use crate::error::{ProvisionError, ProvisionResult};

/// Streaming sink for engine output during apply/destroy. Calls must
/// not block; the machine forwards chunks onto an unbounded channel.
pub type ChunkSink<'a> = &'a mut (dyn FnMut(&str) + Send);

// ── Provisioner Trait ──────────────────────────────────────────────────

/// Capabilities every provisioning backend exposes.
///
/// `init` runs only ahead of `plan`. `apply` consumes the reviewed
/// [`PlanArtifact`] so the mutation matches what was approved; `destroy`
/// re-confirms destruction on its own, which is why it takes no
/// artifact. `output` returns whatever the engine reports, normalized
/// to a name-to-value map.
#[async_trait]
pub trait Provisioner: Send + Sync {
    /// Prepare the backend (providers, state access) ahead of planning.
    async fn init(&self) -> ProvisionResult<()>;

    /// Compute a change plan. `destroy` plans removal instead of
    /// convergence.
    async fn plan(&self, destroy: bool) -> ProvisionResult<PlanArtifact>;

    /// Execute a previously computed plan, streaming engine output.
    async fn apply(&self, plan: &PlanArtifact, on_chunk: ChunkSink<'_>) -> ProvisionResult<()>;

    /// Tear down the stack's infrastructure, streaming engine output.
    async fn destroy(&self, on_chunk: ChunkSink<'_>) -> ProvisionResult<()>;

    /// Collect the stack's declared outputs.
    async fn output(&self) -> ProvisionResult<OutputMap>;
}

// ── Provisioner Factory ────────────────────────────────────────────────

/// Selects and constructs the client for one phase against one stack.
#[async_trait]
pub trait ProvisionerFactory: Send + Sync {
    async fn provisioner(&self, stack: &Stack) -> ProvisionResult<Box<dyn Provisioner>>;
}

// ── Output Normalization ───────────────────────────────────────────────

/// Normalize an engine's output report into an [`OutputMap`].
///
/// Accepts both `{"name": {"value": v, ...}}` wrappers and bare
/// `{"name": v}` entries, since the two client variants report
/// differently.
pub fn normalize_outputs(raw: serde_json::Value) -> ProvisionResult<OutputMap> {
    let object = match raw {
        serde_json::Value::Object(object) => object,
        other => return Err(ProvisionError::MalformedOutput(other.to_string())),
    };

    let mut outputs = OutputMap::new();
    for (name, entry) in object {
        let value = match entry {
            serde_json::Value::Object(mut wrapper) => match wrapper.remove("value") {
                Some(inner) => inner,
                None => serde_json::Value::Object(wrapper),
            },
            other => other,
        };
        outputs.insert(name, value);
    }
    Ok(outputs)
}

// ── Simulated Provisioner ──────────────────────────────────────────────

/// Scripted behavior shared by every simulated client a factory hands
/// out, so a test configures one outcome and observes the whole run.
#[derive(Debug, Clone, Default)]
struct SimulatedBehavior {
    plan_summary: String,
    plan_error: Option<String>,
    apply_error: Option<String>,
    destroy_error: Option<String>,
    output_error: Option<String>,
    outputs: OutputMap,
    chunks: Vec<String>,
}

/// A deterministic provisioning client for tests.
///
/// Records every phase invocation so tests can assert what the machine
/// did and did not call.
pub struct SimulatedProvisioner {
    stack_name: String,
    behavior: Arc<SimulatedBehavior>,
    log: Arc<Mutex<Vec<String>>>,
}

impl SimulatedProvisioner {
    fn record(&self, phase: &str) {
        if let Ok(mut log) = self.log.lock() {
            log.push(format!("{}:{}", phase, self.stack_name));
        }
    }
}

#[async_trait]
impl Provisioner for SimulatedProvisioner {
    async fn init(&self) -> ProvisionResult<()> {
        self.record("init");
        Ok(())
    }

    async fn plan(&self, destroy: bool) -> ProvisionResult<PlanArtifact> {
        self.record("plan");
        match &self.behavior.plan_error {
            Some(diagnostic) => Err(ProvisionError::engine_failed("plan", diagnostic.clone())),
            None => Ok(PlanArtifact::local(
                self.stack_name.clone(),
                self.behavior.plan_summary.clone(),
                format!("/tmp/taproot-test/{}/plan.out", self.stack_name),
                destroy,
            )),
        }
    }

    async fn apply(&self, _plan: &PlanArtifact, on_chunk: ChunkSink<'_>) -> ProvisionResult<()> {
        self.record("apply");
        if let Some(diagnostic) = &self.behavior.apply_error {
            return Err(ProvisionError::engine_failed("apply", diagnostic.clone()));
        }
        for chunk in &self.behavior.chunks {
            on_chunk(chunk);
        }
        Ok(())
    }

    async fn destroy(&self, on_chunk: ChunkSink<'_>) -> ProvisionResult<()> {
        self.record("destroy");
        if let Some(diagnostic) = &self.behavior.destroy_error {
            return Err(ProvisionError::engine_failed("destroy", diagnostic.clone()));
        }
        for chunk in &self.behavior.chunks {
            on_chunk(chunk);
        }
        Ok(())
    }

    async fn output(&self) -> ProvisionResult<OutputMap> {
        self.record("output");
        match &self.behavior.output_error {
            Some(diagnostic) => Err(ProvisionError::engine_failed("output", diagnostic.clone())),
            None => Ok(self.behavior.outputs.clone()),
        }
    }
}

/// Factory handing out [`SimulatedProvisioner`]s that share one
/// behavior script and one invocation log.
#[derive(Default)]
pub struct SimulatedProvisionerFactory {
    behavior: Arc<SimulatedBehavior>,
    log: Arc<Mutex<Vec<String>>>,
}

impl SimulatedProvisionerFactory {
    /// Every phase succeeds; plan summary and outputs are empty.
    pub fn healthy() -> Self {
        Self::default()
    }

    /// Every phase succeeds and output collection yields `outputs`.
    pub fn with_outputs(outputs: OutputMap) -> Self {
        Self::scripted(SimulatedBehavior {
            outputs,
            ..SimulatedBehavior::default()
        })
    }

    /// Planning fails with the given engine diagnostic.
    pub fn failing_plan(diagnostic: impl Into<String>) -> Self {
        Self::scripted(SimulatedBehavior {
            plan_error: Some(diagnostic.into()),
            ..SimulatedBehavior::default()
        })
    }

    /// Apply fails with the given engine diagnostic.
    pub fn failing_apply(diagnostic: impl Into<String>) -> Self {
        Self::scripted(SimulatedBehavior {
            apply_error: Some(diagnostic.into()),
            ..SimulatedBehavior::default()
        })
    }

    /// Destroy fails with the given engine diagnostic.
    pub fn failing_destroy(diagnostic: impl Into<String>) -> Self {
        Self::scripted(SimulatedBehavior {
            destroy_error: Some(diagnostic.into()),
            ..SimulatedBehavior::default()
        })
    }

    /// Apply/destroy stream these chunks before succeeding.
    pub fn with_chunks(mut self, chunks: Vec<String>) -> Self {
        let mut behavior = (*self.behavior).clone();
        behavior.chunks = chunks;
        self.behavior = Arc::new(behavior);
        self
    }

    /// Plan produces this human-readable summary.
    pub fn with_plan_summary(mut self, summary: impl Into<String>) -> Self {
        let mut behavior = (*self.behavior).clone();
        behavior.plan_summary = summary.into();
        self.behavior = Arc::new(behavior);
        self
    }

    /// Every phase invocation so far, as `phase:stack` strings in call
    /// order.
    pub fn invocations(&self) -> Vec<String> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    fn scripted(behavior: SimulatedBehavior) -> Self {
        Self {
            behavior: Arc::new(behavior),
            log: Arc::default(),
        }
    }
}

#[async_trait]
impl ProvisionerFactory for SimulatedProvisionerFactory {
    async fn provisioner(&self, stack: &Stack) -> ProvisionResult<Box<dyn Provisioner>> {
        Ok(Box::new(SimulatedProvisioner {
            stack_name: stack.name.clone(),
            behavior: Arc::clone(&self.behavior),
            log: Arc::clone(&self.log),
        }))
    }
}
