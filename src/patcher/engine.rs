use crate::models::{Action, GuardScope, PatchReport, PatchRule, RuleOutcome};
use crate::patcher::document::{Document, leading_whitespace, line_ending};
use tracing::debug;

/// Applies `rules` in order and returns the patched document with a per-rule report.
pub fn apply(mut document: Document, rules: &[PatchRule]) -> (Document, PatchReport) {
    let report = apply_in_place(&mut document, rules);
    (document, report)
}

pub fn apply_in_place(document: &mut Document, rules: &[PatchRule]) -> PatchReport {
    let mut report = PatchReport::default();

    for rule in rules {
        let outcome = match rule.action {
            Action::Replace => apply_replace(document, rule),
            Action::InsertLineAfter => apply_insert_line_after(document, rule),
            Action::InsertBlockBefore => apply_insert_block_before(document, rule),
        };
        let label = rule.label();
        debug!(rule = %label, %outcome, "rule evaluated");
        report.push(label, outcome);
    }

    report
}

/// Empty markers match blank text only, so a blank payload still has a signature.
fn marker_present(text: &str, marker: &str) -> bool {
    if marker.is_empty() {
        text.lines().any(|l| l.trim().is_empty())
    } else {
        text.contains(marker)
    }
}

fn apply_replace(document: &mut Document, rule: &PatchRule) -> RuleOutcome {
    let anchor = rule.anchor.as_str();
    let payload = rule.payload.as_str();
    if !document.contains(anchor) {
        return RuleOutcome::SkippedNotFound;
    }

    let marker = rule.guard_marker();
    if !marker.is_empty() {
        // A marker inside the anchor only counts where the anchor itself isn't
        let already_applied = if anchor.contains(marker) && !payload.contains(anchor) {
            document.as_str().replace(anchor, "\0").contains(marker)
        } else {
            document.contains(marker)
        };
        if already_applied {
            return RuleOutcome::SkippedAlreadyApplied;
        }
    }

    document.replace_all(anchor, payload);
    if payload.len() < anchor.len() {
        // Shrinking replacements can splice a new anchor together; each round is shorter
        while document.contains(anchor) {
            document.replace_all(anchor, payload);
        }
    }
    RuleOutcome::Applied
}

/// Payload lines for `insert_line_after`, without surrounding blank lines or terminators.
fn payload_lines(payload: &str) -> Vec<&str> {
    payload
        .trim_matches(['\n', '\r'])
        .split('\n')
        .map(|l| l.trim_end_matches('\r'))
        .collect()
}

fn apply_insert_line_after(document: &mut Document, rule: &PatchRule) -> RuleOutcome {
    let Some(idx) = document.find_line(&rule.anchor) else {
        return RuleOutcome::SkippedNotFound;
    };

    let patched = {
        let lines = document.lines();
        let body = payload_lines(&rule.payload);

        let marker = rule.guard_marker();
        let already_applied = match rule.guard_scope() {
            GuardScope::Adjacent => {
                let end = (idx + 1 + body.len()).min(lines.len());
                marker_present(&lines[idx + 1..end].concat(), marker)
            }
            GuardScope::Document => marker_present(document.as_str(), marker),
        };
        if already_applied {
            return RuleOutcome::SkippedAlreadyApplied;
        }

        let anchor_line = lines[idx];
        let indent = leading_whitespace(anchor_line);
        let base = leading_whitespace(body[0]);
        let inserted: Vec<String> = body
            .iter()
            .map(|line| {
                let rest = line.strip_prefix(base).unwrap_or_else(|| line.trim_start());
                format!("{}{}", indent, rest)
            })
            .collect();

        let mut out = String::with_capacity(document.as_str().len() + rule.payload.len() + 8);
        for line in &lines[..=idx] {
            out.push_str(line);
        }
        match line_ending(anchor_line) {
            Some(eol) => {
                for line in &inserted {
                    out.push_str(line);
                    out.push_str(eol);
                }
            }
            None => {
                // Anchor was the unterminated last line; keep the file's missing final newline
                out.push('\n');
                out.push_str(&inserted.join("\n"));
                if inserted.last().is_some_and(|l| l.is_empty()) {
                    // An empty unterminated line would vanish
                    out.push('\n');
                }
            }
        }
        for line in &lines[idx + 1..] {
            out.push_str(line);
        }
        out
    };

    document.set_text(patched);
    RuleOutcome::Applied
}

fn apply_insert_block_before(document: &mut Document, rule: &PatchRule) -> RuleOutcome {
    let Some(idx) = document.find_line(&rule.anchor) else {
        return RuleOutcome::SkippedNotFound;
    };

    let patched = {
        let lines = document.lines();

        let marker = rule.guard_marker();
        let already_applied = match rule.guard_scope() {
            GuardScope::Adjacent => {
                let block_len = rule.payload.split_inclusive('\n').count().max(1);
                let preceding = lines[idx.saturating_sub(block_len)..idx].concat();
                marker_present(&preceding, marker)
            }
            GuardScope::Document => marker_present(document.as_str(), marker),
        };
        if already_applied {
            return RuleOutcome::SkippedAlreadyApplied;
        }

        let eol = line_ending(lines[idx]).unwrap_or("\n");
        let mut out = String::with_capacity(document.as_str().len() + rule.payload.len() + 2);
        for line in &lines[..idx] {
            out.push_str(line);
        }
        out.push_str(&rule.payload);
        if !rule.payload.ends_with('\n') {
            out.push_str(eol);
        }
        for line in &lines[idx..] {
            out.push_str(line);
        }
        out
    };

    document.set_text(patched);
    RuleOutcome::Applied
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_rule_list_is_a_no_op() {
        let (doc, report) = apply(Document::new("abc\n"), &[]);
        assert_eq!(doc.as_str(), "abc\n");
        assert!(report.rules.is_empty());
        assert!(!report.changed());
    }

    #[test]
    fn test_insert_line_after_last_line_without_newline() {
        let rule = PatchRule::insert_line_after("end", "tail");
        let (doc, report) = apply(Document::new("start\n  end"), &[rule.clone()]);
        assert_eq!(doc.as_str(), "start\n  end\n  tail");
        assert_eq!(report.outcomes(), vec![RuleOutcome::Applied]);

        let (again, report) = apply(doc.clone(), &[rule]);
        assert_eq!(again, doc);
        assert_eq!(report.outcomes(), vec![RuleOutcome::SkippedAlreadyApplied]);
    }

    #[test]
    fn test_insert_line_after_keeps_crlf_terminators() {
        let rule = PatchRule::insert_line_after("a", "b");
        let (doc, _) = apply(Document::new("a\r\nc\r\n"), &[rule]);
        assert_eq!(doc.as_str(), "a\r\nb\r\nc\r\n");
    }

    #[test]
    fn test_insert_block_before_terminates_unterminated_block() {
        let rule = PatchRule::insert_block_before("// tail", "one\ntwo");
        let (doc, _) = apply(Document::new("head\n// tail\n"), &[rule]);
        assert_eq!(doc.as_str(), "head\none\ntwo\n// tail\n");
    }

    #[test]
    fn test_replace_with_payload_containing_anchor_does_not_grow() {
        let rule = PatchRule::replace("<Footer />", "<Footer />\n<Banner />");
        let (doc, _) = apply(Document::new("<Footer />\n"), &[rule.clone()]);
        assert_eq!(doc.as_str(), "<Footer />\n<Banner />\n");

        let (again, report) = apply(doc.clone(), &[rule]);
        assert_eq!(again, doc);
        assert_eq!(report.outcomes(), vec![RuleOutcome::SkippedAlreadyApplied]);
    }

    #[test]
    fn test_replace_without_anchor_is_not_found_even_if_payload_is_there() {
        let rule = PatchRule::replace("old", "new");
        let (doc, report) = apply(Document::new("renewal plan\n"), &[rule]);
        assert_eq!(doc.as_str(), "renewal plan\n");
        assert_eq!(report.outcomes(), vec![RuleOutcome::SkippedNotFound]);
    }

    #[test]
    fn test_replace_skips_when_payload_already_present() {
        let rule = PatchRule::replace("Sign in", "Request access");
        let text = "<a>Sign in</a>\n<b>Request access</b>\n";
        let (doc, report) = apply(Document::new(text), &[rule]);
        assert_eq!(doc.as_str(), text);
        assert_eq!(report.outcomes(), vec![RuleOutcome::SkippedAlreadyApplied]);
    }

    #[test]
    fn test_replace_repeats_until_spliced_anchor_is_gone() {
        let rule = PatchRule::replace("ab", "b");
        let (doc, report) = apply(Document::new("aab\n"), &[rule.clone()]);
        assert_eq!(doc.as_str(), "b\n");
        assert_eq!(report.outcomes(), vec![RuleOutcome::Applied]);

        let (again, report) = apply(doc.clone(), &[rule]);
        assert_eq!(again, doc);
        assert_eq!(report.outcomes(), vec![RuleOutcome::SkippedNotFound]);
    }

    #[test]
    fn test_replace_with_payload_inside_anchor_still_applies() {
        let rule = PatchRule::replace("foo.bar", "foo");
        let (doc, report) = apply(Document::new("x = foo.bar;\n"), &[rule]);
        assert_eq!(doc.as_str(), "x = foo;\n");
        assert_eq!(report.outcomes(), vec![RuleOutcome::Applied]);
    }

    #[test]
    fn test_replace_with_empty_payload_deletes_every_occurrence() {
        let rule = PatchRule::replace("ab", "");
        let (doc, _) = apply(Document::new("aabb|ab\n"), &[rule]);
        assert_eq!(doc.as_str(), "|\n");
    }

    #[test]
    fn test_block_containing_its_anchor_is_inserted_once() {
        let rule =
            PatchRule::insert_block_before("import ", "import { TOOLS } from \"@/lib/tools\";\n");
        let text = "// header\nimport React from 'react';\n";

        let (once, report) = apply(Document::new(text), &[rule.clone()]);
        assert_eq!(
            once.as_str(),
            "// header\nimport { TOOLS } from \"@/lib/tools\";\nimport React from 'react';\n"
        );
        assert_eq!(report.outcomes(), vec![RuleOutcome::Applied]);

        let (twice, report) = apply(once.clone(), &[rule]);
        assert_eq!(twice, once);
        assert_eq!(report.outcomes(), vec![RuleOutcome::SkippedAlreadyApplied]);
    }

    #[test]
    fn test_multi_line_payload_is_indented_and_terminated_per_line() {
        let rule = PatchRule::insert_line_after("a", "x\n  y\n");
        let (doc, _) = apply(Document::new("  a\r\nc\r\n"), &[rule.clone()]);
        assert_eq!(doc.as_str(), "  a\r\n  x\r\n    y\r\nc\r\n");

        let (again, report) = apply(doc.clone(), &[rule]);
        assert_eq!(again, doc);
        assert_eq!(report.outcomes(), vec![RuleOutcome::SkippedAlreadyApplied]);
    }

    #[test]
    fn test_blank_line_after_unterminated_anchor_survives() {
        let rule = PatchRule::insert_line_after("a", "");
        let (doc, _) = apply(Document::new("a"), &[rule.clone()]);
        assert_eq!(doc.as_str(), "a\n\n");
        let (again, _) = apply(doc.clone(), &[rule]);
        assert_eq!(again, doc);
    }

    #[test]
    fn test_document_scoped_guard_checks_whole_file() {
        let rule = PatchRule::insert_block_before("anchor", "async function helper() {}\n")
            .with_scoped_guard("async function helper", GuardScope::Document);
        let text = "async function helper() {}\nother\nanchor\n";
        let (doc, report) = apply(Document::new(text), &[rule]);
        assert_eq!(doc.as_str(), text);
        assert_eq!(report.outcomes(), vec![RuleOutcome::SkippedAlreadyApplied]);
    }

    #[test]
    fn test_blank_payload_line_is_inserted_once() {
        let rule = PatchRule::insert_line_after("a", "");
        let (doc, _) = apply(Document::new("a\nb\n"), &[rule.clone()]);
        assert_eq!(doc.as_str(), "a\n\nb\n");
        let (again, _) = apply(doc.clone(), &[rule]);
        assert_eq!(again, doc);
    }
}
