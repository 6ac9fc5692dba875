//! Multi-step planning
//!
//! The model returns a whole plan as JSON. A plan is accepted only if it has
//! a goal and at least one well-numbered step; otherwise the instruction
//! becomes a one-step chat plan. Step dependencies are kept for display and
//! never change execution order.

use llm_core::{ChatMessage, Gateway};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::action::ActionSpec;
use crate::error::{AgentError, ParseFailure};
use crate::input::Prompter;
use crate::planner::reply::parse_object;
use crate::progress::Indicator;
use crate::ui::{self, BOLD, CYAN, DIM, RESET};
use crate::workspace::WorkspaceProbe;

const PLAN_SCHEMA: &str = r#"{
  "goal": "what the whole plan achieves",
  "complexity": "simple|moderate|complex",
  "estimatedTime": "rough duration, e.g. 5 minutes",
  "steps": [
    {
      "step": 1,
      "description": "what this step does",
      "action": {
        "type": "read|write|run|rollback|chat",
        "target": "file path for read/write",
        "content": "full file content for write",
        "command": "shell command for run",
        "message": "text for chat",
        "reasoning": "why this action"
      },
      "dependencies": [],
      "reasoning": "why this step is needed"
    }
  ]
}"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Complexity {
    Simple,
    Moderate,
    Complex,
}

impl Complexity {
    /// Parse a label; anything unrecognised is moderate
    pub fn from_label(label: Option<&str>) -> Self {
        match label.map(|l| l.trim().to_ascii_lowercase()).as_deref() {
            Some("simple") => Complexity::Simple,
            Some("complex") => Complexity::Complex,
            _ => Complexity::Moderate,
        }
    }
}

impl std::fmt::Display for Complexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Complexity::Simple => write!(f, "simple"),
            Complexity::Moderate => write!(f, "moderate"),
            Complexity::Complex => write!(f, "complex"),
        }
    }
}

/// One step of a plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// 1-based position, unique within the plan
    pub index: u32,
    pub description: String,
    pub action: ActionSpec,
    /// Advisory only
    pub dependencies: Vec<u32>,
    pub reasoning: String,
}

impl Step {
    /// Label under which the step's outcome is remembered
    pub fn label(&self) -> String {
        format!("Step {}: {}", self.index, self.description)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    pub goal: String,
    /// Sorted by index
    pub steps: Vec<Step>,
    pub estimated_time: String,
    pub complexity: Complexity,
}

impl ExecutionPlan {
    /// One chat step answering `instruction` directly
    pub fn fallback(instruction: &str) -> Self {
        Self {
            goal: instruction.to_string(),
            steps: vec![Step {
                index: 1,
                description: instruction.to_string(),
                action: ActionSpec::chat(instruction, "Fallback to chat due to planning error"),
                dependencies: Vec::new(),
                reasoning: "Single step execution due to planning complexity".to_string(),
            }],
            estimated_time: "1-2 minutes".to_string(),
            complexity: Complexity::Simple,
        }
    }

    /// Parse and validate a plan reply
    pub fn from_reply(reply: &str) -> Result<Self, ParseFailure> {
        let value = parse_object(reply)?;

        let goal = value
            .get("goal")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .ok_or_else(|| ParseFailure::Invalid("plan has no goal".to_string()))?
            .to_string();

        let raw_steps = value
            .get("steps")
            .and_then(Value::as_array)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ParseFailure::Invalid("plan has no steps".to_string()))?;

        let mut steps = raw_steps
            .iter()
            .map(parse_step)
            .collect::<Result<Vec<_>, _>>()?;

        let mut seen = HashSet::new();
        if let Some(dup) = steps.iter().find(|s| !seen.insert(s.index)) {
            return Err(ParseFailure::Invalid(format!(
                "step {} appears more than once",
                dup.index
            )));
        }
        steps.sort_by_key(|s| s.index);

        Ok(Self {
            goal,
            steps,
            estimated_time: value
                .get("estimatedTime")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string(),
            complexity: Complexity::from_label(value.get("complexity").and_then(Value::as_str)),
        })
    }
}

fn parse_step(value: &Value) -> Result<Step, ParseFailure> {
    let index = value
        .get("step")
        .and_then(step_index)
        .filter(|i| *i >= 1)
        .ok_or_else(|| ParseFailure::Invalid("step without a positive index".to_string()))?;

    let action = value
        .get("action")
        .and_then(ActionSpec::from_json)
        .ok_or_else(|| ParseFailure::Invalid(format!("step {} has no action", index)))?;

    let text = |key: &str| {
        value
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    let dependencies = value
        .get("dependencies")
        .and_then(Value::as_array)
        .map(|deps| {
            deps.iter()
                .filter_map(step_index)
                .collect()
        })
        .unwrap_or_default();

    let mut description = text("description");
    if description.trim().is_empty() {
        description = action.summary();
    }

    Ok(Step {
        index,
        description,
        action,
        dependencies,
        reasoning: text("reasoning"),
    })
}

/// A step number given as an integer or a numeric string
fn step_index(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|i| u32::try_from(i).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Asks the model for an ordered plan
pub struct MultiStepPlanner {
    gateway: Arc<dyn Gateway>,
    probe: Arc<WorkspaceProbe>,
}

impl MultiStepPlanner {
    pub fn new(gateway: Arc<dyn Gateway>, probe: Arc<WorkspaceProbe>) -> Self {
        Self { gateway, probe }
    }

    /// Plan `instruction`. An unusable reply yields [`ExecutionPlan::fallback`];
    /// only a failed model call is an error.
    #[instrument(skip(self, context))]
    pub async fn create_plan(
        &self,
        instruction: &str,
        context: &str,
    ) -> Result<ExecutionPlan, AgentError> {
        let environment = self.probe.describe().await;
        let messages = [
            ChatMessage::system(system_prompt(environment, context)),
            ChatMessage::user(instruction),
        ];

        let indicator = Indicator::thinking("Creating execution plan...");
        let reply = self.gateway.chat(&messages, None).await;
        indicator.finish();
        let reply = reply.map_err(AgentError::gateway)?;

        match ExecutionPlan::from_reply(&reply) {
            Ok(plan) => {
                debug!(steps = plan.steps.len(), complexity = %plan.complexity, "Plan created");
                Ok(plan)
            }
            Err(cause) => {
                warn!(%cause, "Unusable plan reply, falling back to a single chat step");
                Ok(ExecutionPlan::fallback(instruction))
            }
        }
    }
}

fn system_prompt(environment: &str, context: &str) -> String {
    format!(
        "You are a coding agent that plans work before doing it. Break the user's \
         instruction into an ordered list of steps.\n\n\
         Respond with a JSON object in exactly this format:\n{schema}\n\n\
         {environment}\n\n\
         Context from recent actions:\n{context}\n\n\
         Rules:\n\
         - Each step performs one action and is small and focused\n\
         - Number steps from 1 in the order they should run\n\
         - List the earlier steps each step depends on in \"dependencies\"\n\
         - A simple task gets a single step; complex tasks get 3-7 steps\n\
         - Every step and action needs reasoning\n\
         - Respond ONLY with valid JSON",
        schema = PLAN_SCHEMA,
        environment = environment,
        context = context,
    )
}

/// Human-readable plan summary
pub fn render_plan(plan: &ExecutionPlan) -> String {
    let mut out = Vec::new();
    out.push(format!("{}Goal:{} {}", BOLD, RESET, plan.goal));
    out.push(format!("{}Estimated time:{} {}", BOLD, RESET, plan.estimated_time));
    out.push(format!("{}Complexity:{} {}", BOLD, RESET, plan.complexity));
    out.push(format!("{}Steps:{} {}", BOLD, RESET, plan.steps.len()));
    out.push(String::new());

    for (pos, step) in plan.steps.iter().enumerate() {
        let glyph = step
            .action
            .parsed_kind()
            .map(ui::glyph)
            .unwrap_or("?");
        out.push(format!(
            "{}{}.{} {} {}",
            CYAN, step.index, RESET, glyph, step.description
        ));
        if !step.reasoning.is_empty() {
            out.push(format!("   {}{}{}", DIM, step.reasoning, RESET));
        }
        if !step.dependencies.is_empty() {
            let deps: Vec<String> = step.dependencies.iter().map(u32::to_string).collect();
            out.push(format!("   {}Depends on: Step {}{}", DIM, deps.join(", "), RESET));
        }
        if pos + 1 < plan.steps.len() {
            out.push(format!("   {}↓{}", DIM, RESET));
        }
    }
    out.join("\n")
}

/// Show the plan and ask whether to run it
pub fn confirm_plan(plan: &ExecutionPlan, prompter: &mut dyn Prompter) -> bool {
    println!();
    ui::header(&format!("Plan: {}", plan.goal));
    println!("{}", render_plan(plan));
    println!();
    prompter.confirm("Proceed with this plan?")
}
