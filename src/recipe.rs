use crate::exceptions::PatchError;
use crate::models::{Action, PatchSet};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A file target and the patch set to run against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileTarget {
    pub path: PathBuf,
    pub rules: PatchSet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommitSection {
    pub message: String,
    /// Paths to stage; empty stages everything.
    #[serde(default)]
    pub paths: Vec<PathBuf>,
    #[serde(default)]
    pub push: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Recipe {
    pub files: Vec<FileTarget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<CommitSection>,
}

impl Recipe {
    pub fn load(path: &Path) -> Result<Self, PatchError> {
        let recipe: Recipe = crate::fs::read_json(path)?;
        recipe.validate()?;
        Ok(recipe)
    }

    pub fn from_json(json: &str) -> Result<Self, PatchError> {
        let recipe: Recipe = serde_json::from_str(json)?;
        recipe.validate()?;
        Ok(recipe)
    }

    /// Structural checks serde cannot express.
    pub fn validate(&self) -> Result<(), PatchError> {
        if self.files.is_empty() {
            return Err(PatchError::InvalidInput(
                "Recipe contains no file targets.".into(),
            ));
        }

        for target in &self.files {
            let path_display = target.path.display();
            if target.path.as_os_str().is_empty() {
                return Err(PatchError::InvalidInput(
                    "Recipe file target has an empty path.".into(),
                ));
            }
            if target.path.is_absolute() {
                return Err(PatchError::InvalidInput(format!(
                    "Recipe path '{}' must be relative to the project root.",
                    path_display
                )));
            }

            for (i, rule) in target.rules.rules.iter().enumerate() {
                if rule.anchor.is_empty() {
                    return Err(PatchError::InvalidInput(format!(
                        "Rule {} for '{}' has an empty anchor.",
                        i, path_display
                    )));
                }
                if rule.action != Action::Replace && rule.anchor.contains('\n') {
                    return Err(PatchError::InvalidInput(format!(
                        "Rule {} for '{}': line anchors cannot span lines.",
                        i, path_display
                    )));
                }
                if rule.guard.as_ref().is_some_and(|g| g.marker.is_empty()) {
                    return Err(PatchError::InvalidInput(format!(
                        "Rule {} for '{}' has an empty guard marker.",
                        i, path_display
                    )));
                }
            }
        }

        if let Some(commit) = &self.commit
            && commit.message.trim().is_empty()
        {
            return Err(PatchError::InvalidInput(
                "Commit message must not be empty.".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GuardScope;

    #[test]
    fn test_parses_all_actions_and_guards() {
        let json = r#"{
            "files": [{
                "path": "src/hooks/useRealtime.ts",
                "rules": [
                    { "action": "replace", "anchor": "a", "payload": "b" },
                    { "name": "tools", "action": "insert_line_after", "anchor": "x",
                      "payload": "tools: TOOLS,", "guard": { "marker": "tools:" } },
                    { "action": "insert_block_before", "anchor": "y", "payload": "z\n",
                      "guard": { "marker": "z", "scope": "document" } }
                ]
            }],
            "commit": { "message": "Update hook", "push": true }
        }"#;

        let recipe = Recipe::from_json(json).unwrap();
        let rules = &recipe.files[0].rules.rules;
        assert_eq!(rules.len(), 3);
        assert_eq!(rules[0].action, Action::Replace);
        assert_eq!(rules[1].name.as_deref(), Some("tools"));
        assert_eq!(rules[1].guard_marker(), "tools:");
        assert_eq!(rules[1].guard_scope(), GuardScope::Adjacent);
        assert_eq!(rules[2].guard_scope(), GuardScope::Document);

        let commit = recipe.commit.unwrap();
        assert!(commit.push);
        assert!(commit.paths.is_empty());
        assert!(commit.remote.is_none());
    }

    #[test]
    fn test_rejects_unknown_action() {
        let json = r#"{"files":[{"path":"a","rules":[{"action":"delete","anchor":"a","payload":""}]}]}"#;
        assert!(matches!(
            Recipe::from_json(json),
            Err(PatchError::Serialization(_))
        ));
    }

    #[test]
    fn test_rejects_unknown_fields() {
        let json = r#"{"files":[{"path":"a","rules":[],"fuzzy":true}]}"#;
        assert!(matches!(
            Recipe::from_json(json),
            Err(PatchError::Serialization(_))
        ));
    }

    #[test]
    fn test_rejects_empty_anchor() {
        let json = r#"{"files":[{"path":"a","rules":[{"action":"replace","anchor":"","payload":"x"}]}]}"#;
        let err = Recipe::from_json(json).unwrap_err();
        assert!(err.to_string().contains("empty anchor"));
    }

    #[test]
    fn test_rejects_multiline_line_anchor() {
        let json = r#"{"files":[{"path":"a","rules":[{"action":"insert_line_after","anchor":"a\nb","payload":"x"}]}]}"#;
        let err = Recipe::from_json(json).unwrap_err();
        assert!(err.to_string().contains("cannot span lines"));
    }

    #[test]
    fn test_rejects_empty_guard_marker() {
        let json = r#"{"files":[{"path":"a","rules":[{"action":"replace","anchor":"a","payload":"b","guard":{"marker":""}}]}]}"#;
        let err = Recipe::from_json(json).unwrap_err();
        assert!(err.to_string().contains("empty guard marker"));
    }

    #[test]
    fn test_rejects_blank_commit_message() {
        let json = r#"{"files":[{"path":"a","rules":[]}],"commit":{"message":"  "}}"#;
        assert!(matches!(
            Recipe::from_json(json),
            Err(PatchError::InvalidInput(_))
        ));
    }
}
