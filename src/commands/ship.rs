use crate::consts::DEFAULT_REMOTE;
use crate::exceptions::PatchError;
use crate::vcs::{Git, ShipPlan, StageSpec, ship};
use std::path::PathBuf;

#[derive(Debug, Clone, Default)]
pub struct ShipArgs {
    pub message: String,
    pub paths: Vec<PathBuf>,
    pub push: bool,
    pub remote: Option<String>,
    pub branch: Option<String>,
    pub json: bool,
}

pub fn run(root: PathBuf, args: ShipArgs) -> Result<(), PatchError> {
    if args.message.trim().is_empty() {
        return Err(PatchError::InvalidInput(
            "Commit message must not be empty.".into(),
        ));
    }

    let plan = ShipPlan {
        stage: StageSpec::from_paths(args.paths),
        message: args.message,
        push: args.push.then(|| {
            (
                args.remote.unwrap_or_else(|| DEFAULT_REMOTE.to_string()),
                args.branch.unwrap_or_else(|| "HEAD".to_string()),
            )
        }),
    };

    let report = ship(&Git::new(root), &plan)?;

    if args.json {
        crate::console::print_json(&report)?;
    } else {
        println!("{}", crate::console::format_ship_report(&report));
    }

    if !report.succeeded() {
        return Err(PatchError::Vcs(format!(
            "Shipping did not complete ({}).",
            crate::console::format_ship_report(&report)
        )));
    }
    Ok(())
}
