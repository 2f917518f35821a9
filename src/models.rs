use serde::{Deserialize, Serialize};

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Replace,
    InsertLineAfter,
    InsertBlockBefore,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Replace => write!(f, "replace"),
            Action::InsertLineAfter => write!(f, "insert_line_after"),
            Action::InsertBlockBefore => write!(f, "insert_block_before"),
        }
    }
}

/// Where a guard marker is looked for when deciding if a rule already ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuardScope {
    /// The line(s) next to the anchor line: the following line for
    /// `insert_line_after`, the preceding block for `insert_block_before`.
    Adjacent,
    /// Anywhere in the document.
    Document,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleOutcome {
    Applied,
    SkippedNotFound,
    SkippedAlreadyApplied,
}

impl std::fmt::Display for RuleOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleOutcome::Applied => write!(f, "applied"),
            RuleOutcome::SkippedNotFound => write!(f, "anchor not found"),
            RuleOutcome::SkippedAlreadyApplied => write!(f, "already applied"),
        }
    }
}

// --- Patch Rules ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Guard {
    pub marker: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<GuardScope>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatchRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub action: Action,
    pub anchor: String,
    pub payload: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guard: Option<Guard>,
}

impl PatchRule {
    fn new(action: Action, anchor: &str, payload: &str) -> Self {
        Self {
            name: None,
            action,
            anchor: anchor.to_string(),
            payload: payload.to_string(),
            guard: None,
        }
    }

    pub fn replace(anchor: &str, payload: &str) -> Self {
        Self::new(Action::Replace, anchor, payload)
    }

    pub fn insert_line_after(anchor: &str, payload: &str) -> Self {
        Self::new(Action::InsertLineAfter, anchor, payload)
    }

    pub fn insert_block_before(anchor: &str, payload: &str) -> Self {
        Self::new(Action::InsertBlockBefore, anchor, payload)
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_guard(mut self, marker: &str) -> Self {
        self.guard = Some(Guard {
            marker: marker.to_string(),
            scope: None,
        });
        self
    }

    pub fn with_scoped_guard(mut self, marker: &str, scope: GuardScope) -> Self {
        self.guard = Some(Guard {
            marker: marker.to_string(),
            scope: Some(scope),
        });
        self
    }

    /// The text whose presence means this rule has already run.
    pub fn guard_marker(&self) -> &str {
        if let Some(guard) = &self.guard {
            return &guard.marker;
        }
        match self.action {
            Action::Replace => &self.payload,
            Action::InsertLineAfter | Action::InsertBlockBefore => self
                .payload
                .lines()
                .map(str::trim)
                .find(|l| !l.is_empty())
                .unwrap_or(""),
        }
    }

    /// Explicit scope, else `document` for replace and `adjacent` for inserts.
    ///
    /// A block that contains its own anchor becomes the first anchor match
    /// once inserted, so it is guarded document-wide instead.
    pub fn guard_scope(&self) -> GuardScope {
        if let Some(scope) = self.guard.as_ref().and_then(|g| g.scope) {
            return scope;
        }
        match self.action {
            Action::Replace => GuardScope::Document,
            Action::InsertBlockBefore if self.payload.contains(self.anchor.as_str()) => {
                GuardScope::Document
            }
            Action::InsertLineAfter | Action::InsertBlockBefore => GuardScope::Adjacent,
        }
    }

    /// Human readable identifier used in reports.
    pub fn label(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        let first_line = self.anchor.lines().next().unwrap_or("").trim();
        let snippet: String = first_line.chars().take(40).collect();
        let ellipsis = if snippet.len() < first_line.len() {
            "…"
        } else {
            ""
        };
        format!("{} `{}{}`", self.action, snippet, ellipsis)
    }
}

/// Ordered rules applied to one document in a single pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatchSet {
    pub rules: Vec<PatchRule>,
}

impl PatchSet {
    pub fn new(rules: Vec<PatchRule>) -> Self {
        Self { rules }
    }
}

impl From<Vec<PatchRule>> for PatchSet {
    fn from(rules: Vec<PatchRule>) -> Self {
        Self::new(rules)
    }
}

// --- Reports ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleReport {
    pub rule: String,
    pub outcome: RuleOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PatchReport {
    pub rules: Vec<RuleReport>,
}

impl PatchReport {
    pub fn push(&mut self, rule: String, outcome: RuleOutcome) {
        self.rules.push(RuleReport { rule, outcome });
    }

    pub fn outcomes(&self) -> Vec<RuleOutcome> {
        self.rules.iter().map(|r| r.outcome).collect()
    }

    pub fn count(&self, outcome: RuleOutcome) -> usize {
        self.rules.iter().filter(|r| r.outcome == outcome).count()
    }

    /// True if at least one rule mutated the document.
    pub fn changed(&self) -> bool {
        self.count(RuleOutcome::Applied) > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    pub path: String,
    pub report: PatchReport,
    /// True if the patched document was persisted.
    pub written: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub diff: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShipReport {
    pub staged: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub committed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pushed: Option<bool>,
}

impl ShipReport {
    /// False if any step that ran reported failure.
    pub fn succeeded(&self) -> bool {
        self.staged && self.committed != Some(false) && self.pushed != Some(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewriteOutcome {
    pub path: String,
    pub changed: bool,
    pub written: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub diff: String,
}
