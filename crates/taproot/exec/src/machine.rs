//! The lifecycle dispatcher.
//!
//! One [`ExecutionMachine`] owns one run. It walks the states in
//! sequence, invoking the synthesizer and per-phase provisioning
//! clients, and reports every transition and every streamed engine
//! line on a single signal channel so observers see them in the order
//! they happened.
//!
//! Failure in any phase records the message and moves to the terminal
//! error state. Nothing is retried.

use std::sync::Arc;

use taproot_provision::ProvisionerFactory;
use taproot_synth::Synthesizer;
use taproot_types::{outputs_by_construct_id, resolve_stack, LifecycleAction, Stack};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use crate::context::ExecutionContext;
use crate::error::{ExecError, ExecResult};
use crate::signal::{ApprovalDecision, ExecutionSignal, OutputPhase};
use crate::state::ExecutionState;

// ── Execution Machine ──────────────────────────────────────────────────

pub struct ExecutionMachine {
    context: ExecutionContext,
    synthesizer: Arc<dyn Synthesizer>,
    clients: Arc<dyn ProvisionerFactory>,
    approval: Option<oneshot::Receiver<ApprovalDecision>>,
    signals: mpsc::UnboundedSender<ExecutionSignal>,
}

impl ExecutionMachine {
    pub fn new(
        context: ExecutionContext,
        synthesizer: Arc<dyn Synthesizer>,
        clients: Arc<dyn ProvisionerFactory>,
        signals: mpsc::UnboundedSender<ExecutionSignal>,
    ) -> Self {
        Self {
            context,
            synthesizer,
            clients,
            approval: None,
            signals,
        }
    }

    /// Connect the approval gate. A run that plans without
    /// auto-approve fails at the gate if nobody is connected.
    pub fn with_approval(mut self, decision: oneshot::Receiver<ApprovalDecision>) -> Self {
        self.approval = Some(decision);
        self
    }

    /// Drive the run to a terminal state. Consumes the machine; the
    /// signal channel closes when this returns.
    pub async fn run(mut self) {
        info!(run = %self.context.run_id, action = %self.context.action, "run started");
        let mut state = ExecutionState::Idle;
        loop {
            let next = match state {
                ExecutionState::Idle => ExecutionState::Synth,
                ExecutionState::Synth => self.run_synth().await,
                ExecutionState::Diff => self.run_diff().await,
                ExecutionState::WaitingForApproval => self.await_decision().await,
                ExecutionState::Approved => self.route_action(),
                ExecutionState::Deploy => self.run_deploy().await,
                ExecutionState::Destroy => self.run_destroy().await,
                ExecutionState::GatherOutput => self.run_gather_output().await,
                ExecutionState::Done | ExecutionState::Error => break,
            };
            self.transition(state, next);
            state = next;
        }
        info!(run = %self.context.run_id, terminal = %state, "run finished");
    }

    /// Publish a transition. The snapshot is taken after the departing
    /// phase finished mutating the context, so observers of `from = X`
    /// see everything phase X produced.
    fn transition(&mut self, from: ExecutionState, to: ExecutionState) {
        debug!(run = %self.context.run_id, %from, %to, "transition");
        let _ = self.signals.send(ExecutionSignal::Transition {
            from,
            to,
            snapshot: self.context.snapshot(),
        });
    }

    fn fail(&mut self, error: ExecError) -> ExecutionState {
        error!(run = %self.context.run_id, kind = %error.kind(), %error, "phase failed");
        self.context.message = Some(error.to_string());
        ExecutionState::Error
    }

    fn resolved_stack(&self) -> ExecResult<Stack> {
        self.context.stack.clone().ok_or(ExecError::StackUnresolved)
    }

    /// Forward engine lines onto the signal channel. The send never
    /// blocks, so streaming cannot stall the awaited phase.
    fn phase_sink(&self, stack_name: String, phase: OutputPhase) -> impl FnMut(&str) + Send {
        let signals = self.signals.clone();
        move |chunk: &str| {
            let _ = signals.send(ExecutionSignal::PhaseOutput {
                stack_name: stack_name.clone(),
                phase,
                chunk: chunk.to_string(),
            });
        }
    }

    async fn run_synth(&mut self) -> ExecutionState {
        match self.synthesizer.synth().await {
            Ok(stacks) => {
                debug!(run = %self.context.run_id, count = stacks.len(), "synthesis complete");
                self.context.stacks = Some(stacks);
                if self.context.on_target_action(LifecycleAction::Synth) {
                    ExecutionState::Done
                } else {
                    ExecutionState::Diff
                }
            }
            Err(error) => self.fail(error.into()),
        }
    }

    async fn run_diff(&mut self) -> ExecutionState {
        let stack = match resolve_stack(
            self.context.stacks.as_deref(),
            self.context.target_stack.as_deref(),
        ) {
            Ok(stack) => stack.clone(),
            Err(error) => return self.fail(error.into()),
        };
        self.context.stack = Some(stack.clone());
        let _ = self.signals.send(ExecutionSignal::StackResolved {
            stack_name: stack.name.clone(),
        });

        let client = match self.clients.provisioner(&stack).await {
            Ok(client) => client,
            Err(error) => return self.fail(error.into()),
        };
        if let Err(error) = client.init().await {
            return self.fail(error.into());
        }

        let destroy = self.context.on_target_action(LifecycleAction::Destroy);
        match client.plan(destroy).await {
            Ok(plan) => {
                self.context.plan = Some(plan);
                if self.context.on_target_action(LifecycleAction::Diff) {
                    ExecutionState::Done
                } else if self.context.auto_approve() {
                    ExecutionState::Approved
                } else {
                    ExecutionState::WaitingForApproval
                }
            }
            Err(error) => self.fail(error.into()),
        }
    }

    async fn await_decision(&mut self) -> ExecutionState {
        let Some(decision) = self.approval.take() else {
            return self.fail(ExecError::ApprovalChannelMissing);
        };
        match decision.await {
            Ok(ApprovalDecision::Approved) => ExecutionState::Approved,
            // A dropped sender reads as an abort: the caller went away.
            Ok(ApprovalDecision::Aborted) | Err(_) => {
                info!(run = %self.context.run_id, "run aborted at the approval gate");
                ExecutionState::Done
            }
        }
    }

    fn route_action(&self) -> ExecutionState {
        if self.context.on_target_action(LifecycleAction::Destroy) {
            ExecutionState::Destroy
        } else {
            ExecutionState::Deploy
        }
    }

    async fn run_deploy(&mut self) -> ExecutionState {
        let stack = match self.resolved_stack() {
            Ok(stack) => stack,
            Err(error) => return self.fail(error),
        };
        let Some(plan) = self.context.plan.clone() else {
            return self.fail(ExecError::PlanUnavailable);
        };
        let client = match self.clients.provisioner(&stack).await {
            Ok(client) => client,
            Err(error) => return self.fail(error.into()),
        };

        let mut sink = self.phase_sink(stack.name.clone(), OutputPhase::Deploy);
        match client.apply(&plan, &mut sink).await {
            Ok(()) => ExecutionState::GatherOutput,
            Err(error) => self.fail(error.into()),
        }
    }

    async fn run_destroy(&mut self) -> ExecutionState {
        let stack = match self.resolved_stack() {
            Ok(stack) => stack,
            Err(error) => return self.fail(error),
        };
        // The engine's destroy takes no plan file, but it must still
        // have been preceded by a reviewed destroy-plan.
        if self.context.plan.is_none() {
            return self.fail(ExecError::PlanUnavailable);
        }
        let client = match self.clients.provisioner(&stack).await {
            Ok(client) => client,
            Err(error) => return self.fail(error.into()),
        };

        let mut sink = self.phase_sink(stack.name.clone(), OutputPhase::Destroy);
        match client.destroy(&mut sink).await {
            Ok(()) => ExecutionState::GatherOutput,
            Err(error) => self.fail(error.into()),
        }
    }

    async fn run_gather_output(&mut self) -> ExecutionState {
        // Destroyed stacks have no outputs left to read.
        if self.context.on_target_action(LifecycleAction::Destroy) {
            return ExecutionState::Done;
        }

        let stack = match self.resolved_stack() {
            Ok(stack) => stack,
            Err(error) => return self.fail(error),
        };
        let client = match self.clients.provisioner(&stack).await {
            Ok(client) => client,
            Err(error) => return self.fail(error.into()),
        };
        match client.output().await {
            Ok(outputs) => {
                match stack.document() {
                    Ok(document) => {
                        self.context.outputs_by_construct =
                            outputs_by_construct_id(&document, &outputs);
                    }
                    Err(error) => return self.fail(error.into()),
                }
                self.context.outputs = outputs;
                ExecutionState::Done
            }
            Err(error) => self.fail(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taproot_provision::SimulatedProvisionerFactory;
    use taproot_synth::SimulatedSynthesizer;
    use taproot_types::OutputMap;

    async fn drive(
        action: LifecycleAction,
        target: Option<&str>,
        auto_approve: bool,
        synthesizer: SimulatedSynthesizer,
        factory: &Arc<SimulatedProvisionerFactory>,
    ) -> Vec<ExecutionSignal> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let context = ExecutionContext::new(action, target.map(String::from), auto_approve);
        let machine =
            ExecutionMachine::new(context, Arc::new(synthesizer), factory.clone(), tx);
        machine.run().await;

        let mut signals = Vec::new();
        while let Ok(signal) = rx.try_recv() {
            signals.push(signal);
        }
        signals
    }

    fn path(signals: &[ExecutionSignal]) -> Vec<(ExecutionState, ExecutionState)> {
        signals
            .iter()
            .filter_map(|signal| match signal {
                ExecutionSignal::Transition { from, to, .. } => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }

    fn terminal(signals: &[ExecutionSignal]) -> crate::context::ContextSnapshot {
        signals
            .iter()
            .rev()
            .find_map(|signal| match signal {
                ExecutionSignal::Transition { snapshot, .. } => Some(snapshot.clone()),
                _ => None,
            })
            .unwrap()
    }

    #[tokio::test]
    async fn synth_run_stops_after_synthesis() {
        let factory = Arc::new(SimulatedProvisionerFactory::healthy());
        let synthesizer = SimulatedSynthesizer::with_stack_names(&["test"]);
        let signals = drive(LifecycleAction::Synth, None, false, synthesizer, &factory).await;

        assert_eq!(
            path(&signals),
            vec![
                (ExecutionState::Idle, ExecutionState::Synth),
                (ExecutionState::Synth, ExecutionState::Done),
            ]
        );
        assert!(factory.invocations().is_empty());
        assert_eq!(terminal(&signals).stacks.len(), 1);
    }

    #[tokio::test]
    async fn deploy_run_walks_the_full_chain() {
        let mut outputs = OutputMap::new();
        outputs.insert("url".into(), serde_json::json!("http://x"));
        let factory = Arc::new(SimulatedProvisionerFactory::with_outputs(outputs));
        let synthesizer = SimulatedSynthesizer::with_stack_names(&["net"]);
        let signals = drive(
            LifecycleAction::Deploy,
            Some("net"),
            true,
            synthesizer,
            &factory,
        )
        .await;

        assert_eq!(
            path(&signals),
            vec![
                (ExecutionState::Idle, ExecutionState::Synth),
                (ExecutionState::Synth, ExecutionState::Diff),
                (ExecutionState::Diff, ExecutionState::Approved),
                (ExecutionState::Approved, ExecutionState::Deploy),
                (ExecutionState::Deploy, ExecutionState::GatherOutput),
                (ExecutionState::GatherOutput, ExecutionState::Done),
            ]
        );
        assert_eq!(
            factory.invocations(),
            vec!["init:net", "plan:net", "apply:net", "output:net"]
        );
        let snapshot = terminal(&signals);
        assert_eq!(snapshot.outputs["url"], serde_json::json!("http://x"));
        assert_eq!(snapshot.stack_name.as_deref(), Some("net"));
    }

    #[tokio::test]
    async fn diff_run_never_reaches_mutating_phases() {
        let factory = Arc::new(SimulatedProvisionerFactory::healthy());
        let synthesizer = SimulatedSynthesizer::with_stack_names(&["net"]);
        let signals = drive(LifecycleAction::Diff, None, false, synthesizer, &factory).await;

        let transitions = path(&signals);
        assert_eq!(
            transitions.last(),
            Some(&(ExecutionState::Diff, ExecutionState::Done))
        );
        assert_eq!(factory.invocations(), vec!["init:net", "plan:net"]);

        // Resolution is announced inside the diff phase, before its
        // exit transition.
        let resolved = signals
            .iter()
            .position(|s| matches!(s, ExecutionSignal::StackResolved { stack_name } if stack_name == "net"))
            .unwrap();
        let diff_exit = signals
            .iter()
            .position(|s| {
                matches!(
                    s,
                    ExecutionSignal::Transition {
                        from: ExecutionState::Diff,
                        ..
                    }
                )
            })
            .unwrap();
        assert!(resolved < diff_exit);
    }

    #[tokio::test]
    async fn failed_plan_leaves_apply_uninvoked() {
        let factory = Arc::new(SimulatedProvisionerFactory::failing_plan("no credentials"));
        let synthesizer = SimulatedSynthesizer::with_stack_names(&["net"]);
        let signals = drive(
            LifecycleAction::Deploy,
            Some("net"),
            true,
            synthesizer,
            &factory,
        )
        .await;

        let transitions = path(&signals);
        assert_eq!(
            transitions.last(),
            Some(&(ExecutionState::Diff, ExecutionState::Error))
        );
        let message = terminal(&signals).message.unwrap();
        assert!(message.starts_with("plan errored with: \n"));
        assert!(message.contains("no credentials"));
        assert!(!factory.invocations().iter().any(|i| i.starts_with("apply")));
    }

    #[tokio::test]
    async fn synth_failure_records_the_diagnostic() {
        let factory = Arc::new(SimulatedProvisionerFactory::healthy());
        let synthesizer = SimulatedSynthesizer::failing("main.ts: unexpected token");
        let signals = drive(LifecycleAction::Deploy, None, true, synthesizer, &factory).await;

        assert_eq!(
            path(&signals),
            vec![
                (ExecutionState::Idle, ExecutionState::Synth),
                (ExecutionState::Synth, ExecutionState::Error),
            ]
        );
        let snapshot = terminal(&signals);
        assert!(snapshot.stacks.is_empty());
        assert!(snapshot.message.unwrap().contains("unexpected token"));
    }

    #[tokio::test]
    async fn abort_resolves_without_error() {
        let factory = Arc::new(SimulatedProvisionerFactory::healthy());
        let synthesizer = SimulatedSynthesizer::with_stack_names(&["net"]);

        let (signal_tx, mut signal_rx) = mpsc::unbounded_channel();
        let (decision_tx, decision_rx) = oneshot::channel();
        drop(decision_tx);

        let context = ExecutionContext::new(LifecycleAction::Deploy, None, false);
        let machine = ExecutionMachine::new(
            context,
            Arc::new(synthesizer),
            Arc::clone(&factory),
            signal_tx,
        )
        .with_approval(decision_rx);
        machine.run().await;

        let mut signals = Vec::new();
        while let Ok(signal) = signal_rx.try_recv() {
            signals.push(signal);
        }
        let transitions = path(&signals);
        assert_eq!(
            transitions.last(),
            Some(&(ExecutionState::WaitingForApproval, ExecutionState::Done))
        );
        assert!(terminal(&signals).message.is_none());
        assert!(!factory.invocations().iter().any(|i| i.starts_with("apply")));
    }

    #[tokio::test]
    async fn explicit_approval_unblocks_deploy() {
        let factory = Arc::new(SimulatedProvisionerFactory::healthy());
        let synthesizer = SimulatedSynthesizer::with_stack_names(&["net"]);

        let (signal_tx, mut signal_rx) = mpsc::unbounded_channel();
        let (decision_tx, decision_rx) = oneshot::channel();

        let context = ExecutionContext::new(LifecycleAction::Deploy, None, false);
        let machine = ExecutionMachine::new(
            context,
            Arc::new(synthesizer),
            Arc::clone(&factory),
            signal_tx,
        )
        .with_approval(decision_rx);
        let run = tokio::spawn(machine.run());

        decision_tx.send(ApprovalDecision::Approved).unwrap();
        run.await.unwrap();

        let mut signals = Vec::new();
        while let Ok(signal) = signal_rx.try_recv() {
            signals.push(signal);
        }
        let transitions = path(&signals);
        assert!(transitions
            .contains(&(ExecutionState::WaitingForApproval, ExecutionState::Approved)));
        assert!(transitions.contains(&(ExecutionState::Approved, ExecutionState::Deploy)));
        assert!(factory.invocations().contains(&"apply:net".to_string()));
    }

    #[tokio::test]
    async fn destroy_run_skips_output_collection() {
        let factory = Arc::new(SimulatedProvisionerFactory::healthy());
        let synthesizer = SimulatedSynthesizer::with_stack_names(&["net"]);
        let signals = drive(
            LifecycleAction::Destroy,
            Some("net"),
            true,
            synthesizer,
            &factory,
        )
        .await;

        let transitions = path(&signals);
        assert!(transitions.contains(&(ExecutionState::Approved, ExecutionState::Destroy)));
        assert_eq!(
            transitions.last(),
            Some(&(ExecutionState::GatherOutput, ExecutionState::Done))
        );
        assert_eq!(
            factory.invocations(),
            vec!["init:net", "plan:net", "destroy:net"]
        );
        let snapshot = terminal(&signals);
        assert!(snapshot.outputs.is_empty());
        assert!(snapshot.plan.unwrap().destroy);
    }

    #[tokio::test]
    async fn streamed_chunks_arrive_inside_the_deploy_phase() {
        let factory = Arc::new(
            SimulatedProvisionerFactory::healthy()
                .with_chunks(vec!["creating".into(), "created".into()]),
        );
        let synthesizer = SimulatedSynthesizer::with_stack_names(&["net"]);
        let signals = drive(LifecycleAction::Deploy, None, true, synthesizer, &factory).await;

        let entry = signals
            .iter()
            .position(|s| {
                matches!(
                    s,
                    ExecutionSignal::Transition {
                        to: ExecutionState::Deploy,
                        ..
                    }
                )
            })
            .unwrap();
        let exit = signals
            .iter()
            .position(|s| {
                matches!(
                    s,
                    ExecutionSignal::Transition {
                        from: ExecutionState::Deploy,
                        ..
                    }
                )
            })
            .unwrap();

        let chunks: Vec<(usize, String)> = signals
            .iter()
            .enumerate()
            .filter_map(|(i, s)| match s {
                ExecutionSignal::PhaseOutput { phase, chunk, .. } => {
                    assert_eq!(*phase, OutputPhase::Deploy);
                    Some((i, chunk.clone()))
                }
                _ => None,
            })
            .collect();

        assert_eq!(chunks.len(), 2);
        for (index, _) in &chunks {
            assert!(*index > entry && *index < exit);
        }
        assert_eq!(chunks[0].1, "creating");
        assert_eq!(chunks[1].1, "created");
    }

    #[tokio::test]
    async fn unknown_target_stack_is_a_usage_error() {
        let factory = Arc::new(SimulatedProvisionerFactory::healthy());
        let synthesizer = SimulatedSynthesizer::with_stack_names(&["net"]);
        let signals = drive(
            LifecycleAction::Deploy,
            Some("missing"),
            true,
            synthesizer,
            &factory,
        )
        .await;

        let transitions = path(&signals);
        assert_eq!(
            transitions.last(),
            Some(&(ExecutionState::Diff, ExecutionState::Error))
        );
        assert_eq!(
            terminal(&signals).message.as_deref(),
            Some("Unknown stack: missing")
        );
    }

    #[tokio::test]
    async fn ambiguous_selection_requires_a_name() {
        let factory = Arc::new(SimulatedProvisionerFactory::healthy());
        let synthesizer = SimulatedSynthesizer::with_stack_names(&["net", "web"]);
        let signals = drive(LifecycleAction::Diff, None, false, synthesizer, &factory).await;

        assert_eq!(
            terminal(&signals).message.as_deref(),
            Some("Please select a stack to use")
        );
    }

    #[tokio::test]
    async fn failing_apply_is_terminal() {
        let factory = Arc::new(SimulatedProvisionerFactory::failing_apply("quota exceeded"));
        let synthesizer = SimulatedSynthesizer::with_stack_names(&["net"]);
        let signals = drive(LifecycleAction::Deploy, None, true, synthesizer, &factory).await;

        let transitions = path(&signals);
        assert_eq!(
            transitions.last(),
            Some(&(ExecutionState::Deploy, ExecutionState::Error))
        );
        assert!(terminal(&signals)
            .message
            .unwrap()
            .contains("quota exceeded"));
        assert!(!factory.invocations().iter().any(|i| i.starts_with("output")));
    }
}
