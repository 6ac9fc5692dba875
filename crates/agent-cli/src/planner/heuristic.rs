//! Lexical gate for multi-step planning

const TASK_KEYWORDS: &[&str] = &[
    "create",
    "build",
    "implement",
    "develop",
    "setup",
    "configure",
    "refactor",
    "optimize",
    "fix bug",
    "add feature",
    "integrate",
    "deploy",
    "test",
    "debug",
    "migrate",
    "update",
];

const CONNECTORS: &[&str] = &[
    "and",
    "then",
    "also",
    "additionally",
    "furthermore",
    "multiple",
    "several",
    "various",
    "different",
];

/// Instructions longer than this count as complex on their own
const LONG_INSTRUCTION_CHARS: usize = 50;

/// Whether `instruction` should go through the multi-step planner.
///
/// True when it names a task keyword and either joins several clauses or is
/// long. Plain substring matching; a wrong guess only changes how the work
/// is presented.
pub fn needs_planning(instruction: &str) -> bool {
    let lowered = instruction.to_lowercase();

    let has_task = TASK_KEYWORDS.iter().any(|k| lowered.contains(k));
    if !has_task {
        return false;
    }

    CONNECTORS.iter().any(|c| lowered.contains(c))
        || instruction.chars().count() > LONG_INSTRUCTION_CHARS
}
