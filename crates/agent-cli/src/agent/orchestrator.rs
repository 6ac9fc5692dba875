//! The per-session driver

use llm_core::Gateway;
use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::action::{Action, ActionSpec};
use crate::backup::SharedBackups;
use crate::error::AgentError;
use crate::executor::Executor;
use crate::input::Prompter;
use crate::memory::Memory;
use crate::planner::{self, ExecutionPlan, IntentPlanner, MultiStepPlanner};
use crate::progress::Indicator;
use crate::tools::ToolContext;
use crate::ui;
use crate::workspace::WorkspaceProbe;

/// How an instruction ended. Errors never escape [`Orchestrator::handle`];
/// they end up here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstructionOutcome {
    /// Ran to the end; planned runs may have skipped past failed steps
    Completed { failed_steps: usize },
    /// The user declined the plan before anything ran
    Cancelled,
    /// The user stopped a plan after the given step failed
    Aborted { step: u32 },
    /// The single action could not be planned or executed
    Failed(String),
}

impl InstructionOutcome {
    pub fn is_failure(&self) -> bool {
        match self {
            InstructionOutcome::Completed { failed_steps } => *failed_steps > 0,
            InstructionOutcome::Cancelled => false,
            InstructionOutcome::Aborted { .. } | InstructionOutcome::Failed(_) => true,
        }
    }
}

/// Owns the planners, executor and memory for one session
pub struct Orchestrator {
    memory: Memory,
    intent: IntentPlanner,
    planner: MultiStepPlanner,
    executor: Executor,
}

impl Orchestrator {
    pub fn new(gateway: Arc<dyn Gateway>, backups: SharedBackups, ctx: ToolContext) -> Self {
        let probe = Arc::new(WorkspaceProbe::new(ctx.working_dir.clone()));
        Self {
            memory: Memory::new(),
            intent: IntentPlanner::new(gateway.clone(), probe.clone()),
            planner: MultiStepPlanner::new(gateway.clone(), probe),
            executor: Executor::new(gateway, backups, ctx),
        }
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    pub fn backups(&self) -> &SharedBackups {
        self.executor.backups()
    }

    /// Carry out one instruction
    #[instrument(skip(self, prompter))]
    pub async fn handle(
        &mut self,
        instruction: &str,
        prompter: &mut dyn Prompter,
    ) -> InstructionOutcome {
        let context = self.memory.context();

        if planner::needs_planning(instruction) {
            ui::info("Complex task detected, creating an execution plan");
            self.run_plan(instruction, &context, prompter).await
        } else {
            self.run_single(instruction, &context, prompter).await
        }
    }

    async fn run_single(
        &mut self,
        instruction: &str,
        context: &str,
        prompter: &mut dyn Prompter,
    ) -> InstructionOutcome {
        let indicator = Indicator::thinking("Planning...");
        let planned = self.intent.plan(instruction, context).await;
        indicator.finish();

        let spec = match planned {
            Ok(spec) => spec,
            Err(e) => return self.fail(instruction, None, e),
        };

        if let Some(kind) = spec.parsed_kind() {
            let subject = spec.target.as_deref().or(spec.command.as_deref()).unwrap_or("");
            ui::planned(kind, subject, spec.reasoning.as_deref());
        }

        let result = match Action::from_spec(&spec, instruction) {
            Ok(action) => self.executor.execute(&action, context, prompter).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(text) => {
                self.memory.add(instruction, Some(spec), text);
                InstructionOutcome::Completed { failed_steps: 0 }
            }
            Err(e) => self.fail(instruction, Some(spec), e),
        }
    }

    async fn run_plan(
        &mut self,
        instruction: &str,
        context: &str,
        prompter: &mut dyn Prompter,
    ) -> InstructionOutcome {
        let plan = match self.planner.create_plan(instruction, context).await {
            Ok(plan) => plan,
            Err(e) => return self.fail(instruction, None, e),
        };

        if !planner::confirm_plan(&plan, prompter) {
            ui::warning("Plan cancelled");
            return InstructionOutcome::Cancelled;
        }

        self.execute_plan(&plan, prompter).await
    }

    /// Run steps strictly in index order. Dependencies are not consulted.
    async fn execute_plan(
        &mut self,
        plan: &ExecutionPlan,
        prompter: &mut dyn Prompter,
    ) -> InstructionOutcome {
        let total = plan.steps.len();
        let mut failed_steps = 0;

        for (pos, step) in plan.steps.iter().enumerate() {
            println!();
            ui::processing(format!("Step {}/{}: {}", pos + 1, total, step.description));

            // each step sees the outcomes of the steps before it
            let context = self.memory.context();
            let result = match Action::from_spec(&step.action, &step.description) {
                Ok(action) => self.executor.execute(&action, &context, prompter).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(text) => {
                    info!(step = step.index, "Step completed");
                    ui::success(format!("Step {} completed", step.index));
                    self.memory.add(step.label(), Some(step.action.clone()), text);
                }
                Err(e) => {
                    failed_steps += 1;
                    error!(step = step.index, error = %e, "Step failed");
                    ui::error(format!("Step {} failed: {}", step.index, e));
                    show_output(&e);
                    self.memory
                        .add(step.label(), Some(step.action.clone()), format!("Error: {}", e));

                    let remaining = pos + 1 < total;
                    if remaining && !prompter.confirm("Step failed. Continue with remaining steps?") {
                        ui::warning("Plan aborted");
                        return InstructionOutcome::Aborted { step: step.index };
                    }
                }
            }
        }

        if failed_steps == 0 {
            ui::success("Plan completed");
        } else {
            ui::warning(format!("Plan finished with {} failed step(s)", failed_steps));
        }
        InstructionOutcome::Completed { failed_steps }
    }

    /// Log, remember and report a failed instruction
    fn fail(
        &mut self,
        instruction: &str,
        action: Option<ActionSpec>,
        err: AgentError,
    ) -> InstructionOutcome {
        error!(error = %err, "Instruction failed");
        ui::error(format!("Error: {}", err));
        show_output(&err);

        let message = err.to_string();
        self.memory
            .add(instruction, action, format!("Error: {}", message));
        InstructionOutcome::Failed(message)
    }
}

fn show_output(err: &AgentError) {
    if let Some(output) = err.output().filter(|o| !o.trim().is_empty()) {
        ui::dim(output);
    }
}
