use similar::TextDiff;
use std::borrow::Cow;

/// Unified diff between two versions of the same file, empty when they match.
pub fn generate_diff(filename: &str, old_content: &str, new_content: &str) -> String {
    if old_content == new_content {
        return String::new();
    }

    let from_header = quote_filename(&format!("a/{}", filename)).into_owned();
    let to_header = quote_filename(&format!("b/{}", filename)).into_owned();

    TextDiff::from_lines(old_content, new_content)
        .unified_diff()
        .header(&from_header, &to_header)
        .missing_newline_hint(true)
        .to_string()
}

/// Number of added and removed lines in a unified diff.
pub fn diff_stat(diff: &str) -> (usize, usize) {
    diff.lines()
        .filter(|l| !l.starts_with("+++") && !l.starts_with("---"))
        .fold((0, 0), |(added, removed), line| {
            if line.starts_with('+') {
                (added + 1, removed)
            } else if line.starts_with('-') {
                (added, removed + 1)
            } else {
                (added, removed)
            }
        })
}

fn quote_filename(filename: &str) -> Cow<'_, str> {
    if filename.contains(' ') {
        format!("\"{}\"", filename).into()
    } else {
        filename.into()
    }
}
