use crate::consts::ENV_FORCE_TTY;
use crate::diffing::diff_stat;
use crate::models::{FileOutcome, RewriteOutcome, RuleOutcome, ShipReport};
use comfy_table::presets::NOTHING;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use crossterm::style::Stylize;
use std::io::IsTerminal;

pub fn is_stdout_terminal() -> bool {
    if std::env::var(ENV_FORCE_TTY).is_ok() {
        return true;
    }
    std::io::stdout().is_terminal()
}

pub fn is_stdin_terminal() -> bool {
    std::io::stdin().is_terminal()
}

fn outcome_color(outcome: RuleOutcome) -> Color {
    match outcome {
        RuleOutcome::Applied => Color::Green,
        RuleOutcome::SkippedAlreadyApplied => Color::Grey,
        RuleOutcome::SkippedNotFound => Color::Yellow,
    }
}

/// Per-rule table across all files of a run.
pub fn render_report_table(outcomes: &[FileOutcome]) -> String {
    let mut table = Table::new();
    table
        .load_preset(NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("File").add_attribute(Attribute::Bold),
        Cell::new("#")
            .add_attribute(Attribute::Bold)
            .set_alignment(CellAlignment::Right),
        Cell::new("Rule").add_attribute(Attribute::Bold),
        Cell::new("Outcome").add_attribute(Attribute::Bold),
    ]);

    for file in outcomes {
        for (i, rule) in file.report.rules.iter().enumerate() {
            let path_cell = if i == 0 { file.path.as_str() } else { "" };
            table.add_row(vec![
                Cell::new(path_cell),
                Cell::new(i).set_alignment(CellAlignment::Right),
                Cell::new(&rule.rule),
                Cell::new(rule.outcome).fg(outcome_color(rule.outcome)),
            ]);
        }
    }

    table.to_string()
}

/// One `path: rule: outcome` line per rule, for pipes and logs.
pub fn render_report_plain(outcomes: &[FileOutcome]) -> String {
    let mut out = String::new();
    for file in outcomes {
        for rule in &file.report.rules {
            out.push_str(&format!("{}: {}: {}\n", file.path, rule.rule, rule.outcome));
        }
    }
    out
}

pub fn render_summary(outcomes: &[FileOutcome], dry_run: bool) -> String {
    let count = |o: RuleOutcome| -> usize { outcomes.iter().map(|f| f.report.count(o)).sum() };
    let files_changed = outcomes.iter().filter(|f| f.report.changed()).count();
    let verb = if dry_run { "would change" } else { "changed" };
    format!(
        "{} applied, {} already applied, {} anchor not found; {} of {} file(s) {}.",
        count(RuleOutcome::Applied),
        count(RuleOutcome::SkippedAlreadyApplied),
        count(RuleOutcome::SkippedNotFound),
        files_changed,
        outcomes.len(),
        verb
    )
}

pub fn print_apply_report(outcomes: &[FileOutcome], dry_run: bool, show_diff: bool) {
    let tty = is_stdout_terminal();
    if tty {
        println!("{}", render_report_table(outcomes));
    } else {
        print!("{}", render_report_plain(outcomes));
    }

    if show_diff {
        for file in outcomes.iter().filter(|f| !f.diff.is_empty()) {
            print_diff(&file.diff, tty);
        }
    }

    let summary = render_summary(outcomes, dry_run);
    if tty {
        println!("{}", summary.dim());
    } else {
        println!("{}", summary);
    }
}

pub fn print_diff(diff: &str, colored: bool) {
    if !colored {
        print!("{}", diff);
        return;
    }
    for line in diff.lines() {
        if line.starts_with("+++") || line.starts_with("---") {
            println!("{}", line.bold());
        } else if line.starts_with('+') {
            println!("{}", line.green());
        } else if line.starts_with('-') {
            println!("{}", line.red());
        } else if line.starts_with("@@") {
            println!("{}", line.cyan());
        } else {
            println!("{}", line);
        }
    }
}

pub fn print_rewrite_outcome(outcome: &RewriteOutcome, dry_run: bool) {
    if !outcome.changed {
        println!("No changes for {}.", outcome.path);
        return;
    }
    let tty = is_stdout_terminal();
    print_diff(&outcome.diff, tty);
    let (added, removed) = diff_stat(&outcome.diff);
    let verb = if outcome.written {
        "Rewrote"
    } else if dry_run {
        "Would rewrite"
    } else {
        "Did not write"
    };
    println!("{} {} (+{} -{}).", verb, outcome.path, added, removed);
}

pub fn format_ship_report(report: &ShipReport) -> String {
    let step = |r: Option<bool>| match r {
        Some(true) => "ok",
        Some(false) => "failed",
        None => "skipped",
    };
    format!(
        "stage: {}, commit: {}, push: {}",
        step(Some(report.staged)),
        step(report.committed),
        step(report.pushed)
    )
}

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<(), crate::exceptions::PatchError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
