use crate::console::is_stdin_terminal;
use crate::consts::DEFAULT_REWRITE_SYSTEM_PROMPT;
use crate::diffing::generate_diff;
use crate::exceptions::PatchError;
use crate::fs::atomic_write_text;
use crate::llm::client::{LlmClient, LlmConfig, build_rewrite_messages};
use crate::llm::validate::validate_replacement;
use crate::models::RewriteOutcome;
use crate::patcher::Document;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

#[derive(Debug, Clone, Default)]
pub struct RewriteOptions {
    pub system_prompt: Option<String>,
    pub dry_run: bool,
    pub force: bool,
    pub json: bool,
}

/// Asks the model for a new version of `path` and writes it once it validates.
///
/// The file on disk is untouched until the response passes validation.
#[instrument(skip_all, fields(path = %path.display()))]
pub async fn rewrite_file(
    client: &LlmClient,
    path: &Path,
    instruction: &str,
    opts: &RewriteOptions,
) -> Result<RewriteOutcome, PatchError> {
    let original = Document::load(path)?;
    let display_path = path.to_string_lossy().replace('\\', "/");

    let system_prompt = opts
        .system_prompt
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(DEFAULT_REWRITE_SYSTEM_PROMPT);
    let messages =
        build_rewrite_messages(system_prompt, instruction, &display_path, original.as_str());

    let response = client.complete(messages).await?;
    let replacement = validate_replacement(original.as_str(), &response, opts.force)?;

    let diff = generate_diff(&display_path, original.as_str(), &replacement);
    let changed = !diff.is_empty();
    let written = changed && !opts.dry_run;
    if written {
        atomic_write_text(path, &replacement)?;
        info!("file rewritten");
    }

    Ok(RewriteOutcome {
        path: display_path,
        changed,
        written,
        diff,
    })
}

fn resolve_instruction(instruction: Option<String>) -> Result<String, PatchError> {
    let piped = if is_stdin_terminal() {
        None
    } else {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Some(buffer).filter(|b| !b.trim().is_empty())
    };

    match (instruction, piped) {
        (Some(i), Some(p)) => Ok(format!("{}\n\n{}", i.trim(), p.trim())),
        (Some(i), None) => Ok(i),
        (None, Some(p)) => Ok(p),
        (None, None) => Err(PatchError::InvalidInput("An instruction is required.".into())),
    }
}

pub async fn run(
    file: PathBuf,
    instruction: Option<String>,
    config: LlmConfig,
    opts: RewriteOptions,
) -> Result<(), PatchError> {
    let instruction = resolve_instruction(instruction)?;
    if instruction.trim().is_empty() {
        return Err(PatchError::InvalidInput("Instruction cannot be empty.".into()));
    }

    let client = LlmClient::new(config)?;
    let outcome = rewrite_file(&client, &file, &instruction, &opts).await?;

    if opts.json {
        crate::console::print_json(&outcome)?;
    } else {
        crate::console::print_rewrite_outcome(&outcome, opts.dry_run);
    }
    Ok(())
}
