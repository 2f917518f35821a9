use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Writes `files` under `root` and a recipe JSON next to them.
#[allow(dead_code)]
pub fn write_project(root: &Path, files: &[(&str, &str)], recipe: &serde_json::Value) -> PathBuf {
    for (rel, content) in files {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
    let recipe_path = root.join("recipe.json");
    fs::write(&recipe_path, serde_json::to_string_pretty(recipe).unwrap()).unwrap();
    recipe_path
}

/// Initializes a git repository with a local identity and one commit.
#[allow(dead_code)]
pub fn init_git_repo(root: &Path) {
    git(root, &["init", "-q"]);
    git(root, &["config", "user.email", "dev@example.com"]);
    git(root, &["config", "user.name", "Dev"]);
    git(root, &["config", "commit.gpgsign", "false"]);
    fs::write(root.join("README.md"), "# site\n").unwrap();
    git(root, &["add", "-A"]);
    git(root, &["commit", "-q", "-m", "initial"]);
}

#[allow(dead_code)]
pub fn git(root: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(root)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).unwrap()
}
