use crate::consts::DEFAULT_REMOTE;
use crate::diffing::generate_diff;
use crate::exceptions::PatchError;
use crate::fs::{atomic_write_text, resolve_within_root};
use crate::models::{FileOutcome, PatchSet, ShipReport};
use crate::patcher::{Document, apply_in_place};
use crate::recipe::{CommitSection, Recipe};
use crate::vcs::{Git, ShipPlan, StageSpec, VersionControl, ship};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyOptions {
    pub dry_run: bool,
    pub show_diff: bool,
    pub json: bool,
    pub no_commit: bool,
}

#[derive(Debug, Serialize)]
struct ApplyRun<'a> {
    files: &'a [FileOutcome],
    #[serde(skip_serializing_if = "Option::is_none")]
    ship: Option<&'a ShipReport>,
}

/// Reads one file, runs its patch set, and writes it back if anything applied.
#[instrument(skip_all, fields(path = %rel.display()))]
pub fn patch_file(
    root: &Path,
    rel: &Path,
    rules: &PatchSet,
    dry_run: bool,
) -> Result<FileOutcome, PatchError> {
    let (target, rel_str) = resolve_within_root(root, rel)?;
    let original = Document::load(&target)?;

    let mut document = original.clone();
    let report = apply_in_place(&mut document, &rules.rules);

    let diff = generate_diff(&rel_str, original.as_str(), document.as_str());
    let written = report.changed() && !dry_run;
    if written {
        atomic_write_text(&target, document.as_str())?;
        info!(applied = report.count(crate::models::RuleOutcome::Applied), "file written");
    }

    Ok(FileOutcome {
        path: rel_str,
        report,
        written,
        diff,
    })
}

/// Patches every recipe target in order, stopping at the first fatal error.
///
/// Files handled before the failing one keep their new contents.
pub fn apply_recipe(
    root: &Path,
    recipe: &Recipe,
    dry_run: bool,
) -> Result<Vec<FileOutcome>, PatchError> {
    recipe
        .files
        .iter()
        .map(|target| patch_file(root, &target.path, &target.rules, dry_run))
        .collect()
}

pub fn ship_plan(commit: &CommitSection) -> ShipPlan {
    let push = commit.push.then(|| {
        (
            commit
                .remote
                .clone()
                .unwrap_or_else(|| DEFAULT_REMOTE.to_string()),
            commit.branch.clone().unwrap_or_else(|| "HEAD".to_string()),
        )
    });
    ShipPlan {
        stage: StageSpec::from_paths(commit.paths.clone()),
        message: commit.message.clone(),
        push,
    }
}

/// Commits the recipe's changes when it asks for it and something was written.
pub fn ship_recipe(
    vcs: &dyn VersionControl,
    recipe: &Recipe,
    outcomes: &[FileOutcome],
) -> Result<Option<ShipReport>, PatchError> {
    let Some(commit) = &recipe.commit else {
        return Ok(None);
    };
    if !outcomes.iter().any(|f| f.written) {
        info!("no files were written, skipping commit");
        return Ok(None);
    }
    ship(vcs, &ship_plan(commit)).map(Some)
}

pub fn run(recipe_path: PathBuf, root: PathBuf, opts: ApplyOptions) -> Result<(), PatchError> {
    let recipe = Recipe::load(&recipe_path)?;
    let outcomes = apply_recipe(&root, &recipe, opts.dry_run)?;

    let ship_report = if opts.dry_run || opts.no_commit {
        None
    } else {
        ship_recipe(&Git::new(&root), &recipe, &outcomes)?
    };

    if opts.json {
        crate::console::print_json(&ApplyRun {
            files: &outcomes,
            ship: ship_report.as_ref(),
        })?;
    } else {
        crate::console::print_apply_report(&outcomes, opts.dry_run, opts.show_diff);
        if let Some(report) = &ship_report {
            println!("{}", crate::console::format_ship_report(report));
        }
    }

    match ship_report {
        Some(report) if !report.succeeded() => Err(PatchError::Vcs(format!(
            "Files were patched but shipping failed ({}).",
            crate::console::format_ship_report(&report)
        ))),
        _ => Ok(()),
    }
}
