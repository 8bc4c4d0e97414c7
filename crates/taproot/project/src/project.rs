//! The caller-facing orchestrator.
//!
//! [`Project`] turns one imperative request into one execution run,
//! absorbs the machine's signals on the requesting task, and projects
//! them into the [`ProjectUpdate`] vocabulary plus a handful of
//! observable fields. Every update is delivered before the request's
//! future resolves.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use taproot_exec::{
    ApprovalDecision, ContextSnapshot, ExecutionContext, ExecutionMachine, ExecutionSignal,
    ExecutionState, OutputPhase,
};
use taproot_provision::{BackendStrategy, ProvisionerFactory, DEFAULT_ENGINE};
use taproot_synth::{CommandSynthesizer, Synthesizer};
use taproot_types::{LifecycleAction, PlanArtifact, Stack};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::error::{ProjectResult, RunError};
use crate::status::Status;
use crate::update::ProjectUpdate;

/// Callback invoked once per progress event, in emission order. Keep
/// it fast; it runs on the requesting task.
pub type UpdateCallback = Box<dyn Fn(ProjectUpdate) + Send + Sync>;

// ── Options ────────────────────────────────────────────────────────────

/// Construction-time settings for a [`Project`].
pub struct ProjectOptions {
    pub synth_command: String,
    pub target_dir: PathBuf,
    pub output_dir: Option<PathBuf>,
    pub engine: String,
    pub auto_approve: bool,
    pub on_update: Option<UpdateCallback>,
}

impl ProjectOptions {
    pub fn new(synth_command: impl Into<String>, target_dir: impl Into<PathBuf>) -> Self {
        Self {
            synth_command: synth_command.into(),
            target_dir: target_dir.into(),
            output_dir: None,
            engine: DEFAULT_ENGINE.into(),
            auto_approve: false,
            on_update: None,
        }
    }

    /// Where the synth command writes stacks, if not the default.
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Which engine binary local provisioning runs.
    pub fn engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = engine.into();
        self
    }

    /// Skip the approval gate after planning.
    pub fn auto_approve(mut self, auto_approve: bool) -> Self {
        self.auto_approve = auto_approve;
        self
    }

    /// Receive every progress event.
    pub fn on_update(mut self, callback: impl Fn(ProjectUpdate) + Send + Sync + 'static) -> Self {
        self.on_update = Some(Box::new(callback));
        self
    }
}

// ── Observable state ───────────────────────────────────────────────────

#[derive(Default)]
struct Observed {
    status: Status,
    plan: Option<PlanArtifact>,
    stack_name: Option<String>,
    stacks: Vec<Stack>,
}

// ── Project ────────────────────────────────────────────────────────────

/// Drives complete lifecycle runs.
///
/// Precondition: at most one request (`synth`/`diff`/`deploy`/
/// `destroy`) may be outstanding per instance. Issuing a second before
/// the first completes is a caller error this type does not guard
/// against. Sequential reuse is fine; each request starts a fresh run.
pub struct Project {
    synthesizer: Arc<dyn Synthesizer>,
    clients: Arc<dyn ProvisionerFactory>,
    auto_approve: bool,
    on_update: Option<UpdateCallback>,
    observed: Mutex<Observed>,
    approval: Mutex<Option<oneshot::Sender<ApprovalDecision>>>,
}

impl Project {
    pub fn new(options: ProjectOptions) -> Self {
        let mut synthesizer = CommandSynthesizer::new(&options.synth_command, &options.target_dir);
        if let Some(dir) = &options.output_dir {
            synthesizer = synthesizer.with_output_dir(dir.clone());
        }
        Self {
            synthesizer: Arc::new(synthesizer),
            clients: Arc::new(BackendStrategy::new(&options.engine)),
            auto_approve: options.auto_approve,
            on_update: options.on_update,
            observed: Mutex::new(Observed::default()),
            approval: Mutex::new(None),
        }
    }

    /// Swap the synthesizer, keeping everything else.
    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn Synthesizer>) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    /// Swap the provisioning backend selection, keeping everything else.
    pub fn with_provisioner_factory(mut self, clients: Arc<dyn ProvisionerFactory>) -> Self {
        self.clients = clients;
        self
    }

    // ── Requests ───────────────────────────────────────────────────

    /// Synthesize only.
    pub async fn synth(&self) -> ProjectResult<()> {
        self.run(LifecycleAction::Synth, None).await
    }

    /// Synthesize and plan, stopping after the plan is reported.
    pub async fn diff(&self, stack_name: Option<&str>) -> ProjectResult<()> {
        self.run(LifecycleAction::Diff, stack_name.map(String::from))
            .await
    }

    /// Full constructive lifecycle against one stack.
    pub async fn deploy(&self, stack_name: &str) -> ProjectResult<()> {
        self.run(LifecycleAction::Deploy, Some(stack_name.to_string()))
            .await
    }

    /// Full destructive lifecycle against one stack.
    pub async fn destroy(&self, stack_name: &str) -> ProjectResult<()> {
        self.run(LifecycleAction::Destroy, Some(stack_name.to_string()))
            .await
    }

    // ── Approval ───────────────────────────────────────────────────

    /// Release a run waiting at the approval gate. The decision is
    /// buffered, so calling this before the run reaches the gate also
    /// works. A no-op when no run is active.
    pub fn approve(&self) {
        self.decide(ApprovalDecision::Approved);
    }

    /// Stop a waiting run; it completes without error.
    pub fn abort(&self) {
        self.decide(ApprovalDecision::Aborted);
    }

    fn decide(&self, decision: ApprovalDecision) {
        if let Ok(mut approval) = self.approval.lock() {
            if let Some(sender) = approval.take() {
                let _ = sender.send(decision);
            }
        }
    }

    // ── Observable fields ──────────────────────────────────────────

    pub fn status(&self) -> Status {
        self.observed
            .lock()
            .map(|o| o.status)
            .unwrap_or(Status::Starting)
    }

    pub fn plan(&self) -> Option<PlanArtifact> {
        self.observed.lock().ok().and_then(|o| o.plan.clone())
    }

    pub fn stack_name(&self) -> Option<String> {
        self.observed.lock().ok().and_then(|o| o.stack_name.clone())
    }

    pub fn stacks(&self) -> Vec<Stack> {
        self.observed
            .lock()
            .map(|o| o.stacks.clone())
            .unwrap_or_default()
    }

    // ── Run plumbing ───────────────────────────────────────────────

    async fn run(&self, action: LifecycleAction, target_stack: Option<String>) -> ProjectResult<()> {
        let (signal_tx, mut signal_rx) = mpsc::unbounded_channel();
        let (decision_tx, decision_rx) = oneshot::channel();
        if let Ok(mut approval) = self.approval.lock() {
            *approval = Some(decision_tx);
        }
        if let Ok(mut observed) = self.observed.lock() {
            *observed = Observed::default();
        }

        let context = ExecutionContext::new(action, target_stack, self.auto_approve);
        let machine = ExecutionMachine::new(
            context,
            Arc::clone(&self.synthesizer),
            Arc::clone(&self.clients),
            signal_tx,
        )
        .with_approval(decision_rx);
        let run = tokio::spawn(machine.run());

        // The channel closes when the machine finishes, so this loop
        // absorbs the complete signal stream before completion is
        // reported.
        let mut failure = None;
        while let Some(signal) = signal_rx.recv().await {
            self.absorb(signal, &mut failure);
        }
        run.await
            .map_err(|e| RunError::new(format!("execution task failed: {e}")))?;

        if let Ok(mut approval) = self.approval.lock() {
            approval.take();
        }
        match failure {
            None => Ok(()),
            Some(message) => Err(RunError::new(message)),
        }
    }

    fn absorb(&self, signal: ExecutionSignal, failure: &mut Option<String>) {
        match signal {
            ExecutionSignal::StackResolved { stack_name } => {
                if let Ok(mut observed) = self.observed.lock() {
                    observed.stack_name = Some(stack_name.clone());
                }
                self.emit(ProjectUpdate::Diffing { stack_name });
            }
            ExecutionSignal::PhaseOutput {
                stack_name,
                phase,
                chunk,
            } => {
                let update = match phase {
                    OutputPhase::Deploy => ProjectUpdate::DeployUpdate {
                        stack_name,
                        deploy_output: chunk,
                    },
                    OutputPhase::Destroy => ProjectUpdate::DestroyUpdate {
                        stack_name,
                        destroy_output: chunk,
                    },
                };
                self.emit(update);
            }
            ExecutionSignal::Transition { from, to, snapshot } => {
                self.leave(from, to, &snapshot);
                self.enter(to, &snapshot, failure);
            }
        }
    }

    /// Project what the departing phase produced.
    fn leave(&self, from: ExecutionState, to: ExecutionState, snapshot: &ContextSnapshot) {
        match from {
            ExecutionState::Synth => {
                if to == ExecutionState::Error {
                    self.emit(ProjectUpdate::Synthed {
                        stacks: Vec::new(),
                        error_message: snapshot.message.clone(),
                    });
                } else {
                    self.set_status(Status::Synthesized);
                    if let Ok(mut observed) = self.observed.lock() {
                        observed.stacks = snapshot.stacks.clone();
                    }
                    self.emit(ProjectUpdate::Synthed {
                        stacks: snapshot.stacks.clone(),
                        error_message: None,
                    });
                }
            }
            ExecutionState::Diff if to != ExecutionState::Error => {
                self.set_status(Status::Planned);
                if let Ok(mut observed) = self.observed.lock() {
                    observed.plan = snapshot.plan.clone();
                }
                if let (Some(stack_name), Some(plan)) =
                    (snapshot.stack_name.clone(), snapshot.plan.clone())
                {
                    self.emit(ProjectUpdate::Diffed { stack_name, plan });
                }
            }
            ExecutionState::GatherOutput if to == ExecutionState::Done => {
                if let Some(stack_name) = snapshot.stack_name.clone() {
                    if snapshot.action == LifecycleAction::Destroy {
                        self.emit(ProjectUpdate::Destroyed { stack_name });
                    } else {
                        self.set_status(Status::OutputFetched);
                        self.emit(ProjectUpdate::Deployed {
                            stack_name,
                            outputs: snapshot.outputs.clone(),
                            outputs_by_construct_id: snapshot.outputs_by_construct.clone(),
                        });
                    }
                }
            }
            _ => {}
        }
    }

    /// Project what the arriving phase means.
    fn enter(&self, to: ExecutionState, snapshot: &ContextSnapshot, failure: &mut Option<String>) {
        match to {
            ExecutionState::Synth => {
                self.set_status(Status::Synthesizing);
                self.emit(ProjectUpdate::Synthing);
            }
            ExecutionState::Diff => self.set_status(Status::Planning),
            ExecutionState::Deploy => {
                self.set_status(Status::Deploying);
                if let Some(stack_name) = snapshot.stack_name.clone() {
                    self.emit(ProjectUpdate::Deploying { stack_name });
                }
            }
            ExecutionState::Destroy => {
                self.set_status(Status::Destroying);
                if let Some(stack_name) = snapshot.stack_name.clone() {
                    self.emit(ProjectUpdate::Destroying { stack_name });
                }
            }
            ExecutionState::Done => self.set_status(Status::Done),
            ExecutionState::Error => {
                *failure = Some(
                    snapshot
                        .message
                        .clone()
                        .unwrap_or_else(|| "execution failed".to_string()),
                );
            }
            _ => {}
        }
    }

    fn emit(&self, update: ProjectUpdate) {
        debug!(event = update.kind(), "progress");
        if let Some(on_update) = &self.on_update {
            on_update(update);
        }
    }

    fn set_status(&self, status: Status) {
        if let Ok(mut observed) = self.observed.lock() {
            observed.status = status;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taproot_provision::SimulatedProvisionerFactory;
    use taproot_synth::SimulatedSynthesizer;
    use taproot_types::OutputMap;

    fn collecting_project(
        factory: Arc<SimulatedProvisionerFactory>,
        synthesizer: SimulatedSynthesizer,
        auto_approve: bool,
    ) -> (Arc<Project>, mpsc::UnboundedReceiver<ProjectUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let options = ProjectOptions::new("npx app synth", "/tmp/app")
            .auto_approve(auto_approve)
            .on_update(move |update| {
                let _ = tx.send(update);
            });
        let project = Project::new(options)
            .with_synthesizer(Arc::new(synthesizer))
            .with_provisioner_factory(factory);
        (Arc::new(project), rx)
    }

    fn drain(updates: &mut mpsc::UnboundedReceiver<ProjectUpdate>) -> Vec<ProjectUpdate> {
        let mut all = Vec::new();
        while let Ok(update) = updates.try_recv() {
            all.push(update);
        }
        all
    }

    fn kinds(updates: &[ProjectUpdate]) -> Vec<&'static str> {
        updates.iter().map(ProjectUpdate::kind).collect()
    }

    #[tokio::test]
    async fn synth_run_reports_exactly_synthing_then_synthed() {
        let factory = Arc::new(SimulatedProvisionerFactory::healthy());
        let (project, mut updates) = collecting_project(
            factory,
            SimulatedSynthesizer::with_stack_names(&["test"]),
            false,
        );

        project.synth().await.unwrap();

        let all = drain(&mut updates);
        assert_eq!(kinds(&all), vec!["synthing", "synthed"]);
        match &all[1] {
            ProjectUpdate::Synthed {
                stacks,
                error_message,
            } => {
                assert_eq!(stacks.len(), 1);
                assert_eq!(stacks[0].name, "test");
                assert!(error_message.is_none());
            }
            other => panic!("unexpected update: {other:?}"),
        }
        assert_eq!(project.status(), Status::Done);
        assert_eq!(project.stacks().len(), 1);
    }

    #[tokio::test]
    async fn deploy_run_emits_the_full_sequence() {
        let mut outputs = OutputMap::new();
        outputs.insert("url".into(), serde_json::json!("http://x"));
        let factory = Arc::new(SimulatedProvisionerFactory::with_outputs(outputs));
        let (project, mut updates) = collecting_project(
            factory,
            SimulatedSynthesizer::with_stack_names(&["web"]),
            true,
        );

        project.deploy("web").await.unwrap();

        let all = drain(&mut updates);
        assert_eq!(
            kinds(&all),
            vec![
                "synthing",
                "synthed",
                "diffing",
                "diffed",
                "deploying",
                "deployed"
            ]
        );
        match all.last().unwrap() {
            ProjectUpdate::Deployed {
                stack_name,
                outputs,
                ..
            } => {
                assert_eq!(stack_name, "web");
                assert_eq!(outputs["url"], serde_json::json!("http://x"));
            }
            other => panic!("unexpected final update: {other:?}"),
        }
        assert_eq!(project.status(), Status::Done);
        assert_eq!(project.stack_name().as_deref(), Some("web"));
        assert!(project.plan().is_some());
    }

    #[tokio::test]
    async fn failed_plan_rejects_after_diffing() {
        let factory = Arc::new(SimulatedProvisionerFactory::failing_plan("no credentials"));
        let (project, mut updates) = collecting_project(
            factory,
            SimulatedSynthesizer::with_stack_names(&["web"]),
            true,
        );

        let err = project.deploy("web").await.unwrap_err();
        assert!(err.message.contains("no credentials"));

        let all = drain(&mut updates);
        assert_eq!(kinds(&all), vec!["synthing", "synthed", "diffing"]);
    }

    #[tokio::test]
    async fn synth_failure_carries_the_error_message() {
        let factory = Arc::new(SimulatedProvisionerFactory::healthy());
        let (project, mut updates) =
            collecting_project(factory, SimulatedSynthesizer::failing("bad app"), false);

        let err = project.synth().await.unwrap_err();
        assert!(err.message.contains("bad app"));

        let all = drain(&mut updates);
        assert_eq!(kinds(&all), vec!["synthing", "synthed"]);
        match &all[1] {
            ProjectUpdate::Synthed {
                stacks,
                error_message,
            } => {
                assert!(stacks.is_empty());
                assert!(error_message.as_deref().unwrap().contains("bad app"));
            }
            other => panic!("unexpected update: {other:?}"),
        }
    }

    #[tokio::test]
    async fn destroy_run_mirrors_the_deploy_vocabulary() {
        let factory = Arc::new(
            SimulatedProvisionerFactory::healthy().with_chunks(vec!["removing instance".into()]),
        );
        let (project, mut updates) = collecting_project(
            Arc::clone(&factory),
            SimulatedSynthesizer::with_stack_names(&["web"]),
            true,
        );

        project.destroy("web").await.unwrap();

        let all = drain(&mut updates);
        assert_eq!(
            kinds(&all),
            vec![
                "synthing",
                "synthed",
                "diffing",
                "diffed",
                "destroying",
                "destroy update",
                "destroyed"
            ]
        );
        assert!(matches!(
            all.last().unwrap(),
            ProjectUpdate::Destroyed { stack_name } if stack_name == "web"
        ));
        assert!(!factory
            .invocations()
            .iter()
            .any(|i| i.starts_with("output")));
    }

    #[tokio::test]
    async fn deploy_updates_stream_between_deploying_and_deployed() {
        let factory = Arc::new(
            SimulatedProvisionerFactory::healthy()
                .with_chunks(vec!["creating".into(), "created".into()]),
        );
        let (project, mut updates) = collecting_project(
            factory,
            SimulatedSynthesizer::with_stack_names(&["web"]),
            true,
        );

        project.deploy("web").await.unwrap();

        let all = drain(&mut updates);
        assert_eq!(
            kinds(&all),
            vec![
                "synthing",
                "synthed",
                "diffing",
                "diffed",
                "deploying",
                "deploy update",
                "deploy update",
                "deployed"
            ]
        );
        match &all[5] {
            ProjectUpdate::DeployUpdate { deploy_output, .. } => {
                assert_eq!(deploy_output, "creating");
            }
            other => panic!("unexpected update: {other:?}"),
        }
    }

    #[tokio::test]
    async fn abort_at_the_gate_resolves_cleanly() {
        let factory = Arc::new(SimulatedProvisionerFactory::healthy());
        let (project, mut updates) = collecting_project(
            Arc::clone(&factory),
            SimulatedSynthesizer::with_stack_names(&["web"]),
            false,
        );

        let runner = Arc::clone(&project);
        let run = tokio::spawn(async move { runner.deploy("web").await });

        // Wait until the plan is reported; the run is then parked at
        // the gate (or about to be, the decision channel buffers).
        let mut seen = Vec::new();
        while let Some(update) = updates.recv().await {
            let kind = update.kind();
            seen.push(update);
            if kind == "diffed" {
                break;
            }
        }
        project.abort();
        run.await.unwrap().unwrap();

        seen.extend(drain(&mut updates));
        assert_eq!(kinds(&seen), vec!["synthing", "synthed", "diffing", "diffed"]);
        assert!(!factory.invocations().iter().any(|i| i.starts_with("apply")));
        assert_eq!(project.status(), Status::Done);
    }

    #[tokio::test]
    async fn approval_releases_the_gate() {
        let factory = Arc::new(SimulatedProvisionerFactory::healthy());
        let (project, mut updates) = collecting_project(
            Arc::clone(&factory),
            SimulatedSynthesizer::with_stack_names(&["web"]),
            false,
        );

        let runner = Arc::clone(&project);
        let run = tokio::spawn(async move { runner.deploy("web").await });

        while let Some(update) = updates.recv().await {
            if update.kind() == "diffed" {
                break;
            }
        }
        project.approve();
        run.await.unwrap().unwrap();

        assert!(factory.invocations().contains(&"apply:web".to_string()));
        assert_eq!(project.status(), Status::Done);
    }

    #[tokio::test]
    async fn sequential_requests_reuse_the_instance() {
        let factory = Arc::new(SimulatedProvisionerFactory::healthy());
        let (project, mut updates) = collecting_project(
            factory,
            SimulatedSynthesizer::with_stack_names(&["web"]),
            true,
        );

        project.synth().await.unwrap();
        let first = drain(&mut updates);
        assert_eq!(kinds(&first), vec!["synthing", "synthed"]);

        project.deploy("web").await.unwrap();
        let second = drain(&mut updates);
        assert_eq!(
            kinds(&second),
            vec![
                "synthing",
                "synthed",
                "diffing",
                "diffed",
                "deploying",
                "deployed"
            ]
        );
        assert_eq!(project.status(), Status::Done);
    }
}
