// --- Environment ---

pub const ENV_BASE_URL: &str = "SITEPATCH_BASE_URL";
pub const ENV_MODEL: &str = "SITEPATCH_MODEL";
pub const ENV_API_KEY: &str = "SITEPATCH_API_KEY";
pub const ENV_TIMEOUT_SECS: &str = "SITEPATCH_TIMEOUT_SECS";
pub const ENV_FORCE_TTY: &str = "SITEPATCH_FORCE_TTY";

pub const DEFAULT_BASE_URL: &str = "http://localhost:1234/v1";
pub const DEFAULT_MODEL: &str = "local-model";

// --- Version control ---

pub const DEFAULT_REMOTE: &str = "origin";

// --- Rewrite Prompts ---

pub const DEFAULT_REWRITE_SYSTEM_PROMPT: &str = "You are a careful code editor. You receive one source file and an instruction. Apply the instruction to the file and return the COMPLETE updated file. Output ONLY the file contents: no commentary, no explanations, no Markdown fences. Preserve everything the instruction does not ask you to change, including formatting and whitespace.";

// --- Response validation ---

/// Originals shorter than this are never rejected for shrinking.
pub const MIN_LINES_FOR_SHRINK_CHECK: usize = 20;

/// A rewrite keeping fewer than this share of the original lines is treated as truncated.
pub const MIN_RETAINED_LINE_RATIO: f64 = 0.25;
