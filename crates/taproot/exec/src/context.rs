//! Per-run execution context.

use taproot_types::{LifecycleAction, OutputMap, PlanArtifact, Stack};
use uuid::Uuid;

/// Everything one run accumulates. Owned exclusively by the execution
/// machine; nothing else mutates it.
#[derive(Debug)]
pub struct ExecutionContext {
    /// Identifies the run in logs.
    pub run_id: Uuid,
    /// What the caller asked for.
    pub action: LifecycleAction,
    /// Stack name requested by the caller, if any.
    pub target_stack: Option<String>,
    /// Skip the approval gate after planning.
    pub auto_approve: bool,
    /// Set once synthesis succeeds.
    pub stacks: Option<Vec<Stack>>,
    /// The stack the plan phase resolved; later phases reuse it.
    pub stack: Option<Stack>,
    /// Set once planning succeeds.
    pub plan: Option<PlanArtifact>,
    /// Set once output gathering succeeds.
    pub outputs: OutputMap,
    /// Outputs keyed by the construct that declared them.
    pub outputs_by_construct: OutputMap,
    /// Set on the way into the terminal error state.
    pub message: Option<String>,
}

impl ExecutionContext {
    pub fn new(action: LifecycleAction, target_stack: Option<String>, auto_approve: bool) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            action,
            target_stack,
            auto_approve,
            stacks: None,
            stack: None,
            plan: None,
            outputs: OutputMap::new(),
            outputs_by_construct: OutputMap::new(),
            message: None,
        }
    }

    /// Guard: does the run's action match `action`?
    pub fn on_target_action(&self, action: LifecycleAction) -> bool {
        self.action == action
    }

    /// Guard: was the approval gate waived up front?
    pub fn auto_approve(&self) -> bool {
        self.auto_approve
    }

    /// A cheap copy of the observable parts, taken at every transition.
    pub fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            action: self.action,
            stack_name: self.stack.as_ref().map(|s| s.name.clone()),
            stacks: self.stacks.clone().unwrap_or_default(),
            plan: self.plan.clone(),
            outputs: self.outputs.clone(),
            outputs_by_construct: self.outputs_by_construct.clone(),
            message: self.message.clone(),
        }
    }
}

/// The context as observers see it. Travels with every transition
/// signal so consumers never reach into the live context.
#[derive(Debug, Clone)]
pub struct ContextSnapshot {
    pub action: LifecycleAction,
    pub stack_name: Option<String>,
    pub stacks: Vec<Stack>,
    pub plan: Option<PlanArtifact>,
    pub outputs: OutputMap,
    pub outputs_by_construct: OutputMap,
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guards_are_pure_reads() {
        let context = ExecutionContext::new(LifecycleAction::Deploy, Some("net".into()), true);
        assert!(context.on_target_action(LifecycleAction::Deploy));
        assert!(!context.on_target_action(LifecycleAction::Destroy));
        assert!(context.auto_approve());
    }

    #[test]
    fn snapshot_defaults_to_no_stacks() {
        let context = ExecutionContext::new(LifecycleAction::Synth, None, false);
        let snapshot = context.snapshot();
        assert!(snapshot.stacks.is_empty());
        assert!(snapshot.stack_name.is_none());
        assert!(snapshot.message.is_none());
    }
}
