//! Line-level edits to the document text.
//!
//! Only the lines that change are touched; comments, quoting and flow style
//! everywhere else survive byte for byte. Each function returns `None` when
//! the layout is not one it can edit safely, and the caller falls back to a
//! full rewrite.

/// Indentation of a line, or `None` for blank and comment-only lines.
fn indent_of(line: &str) -> Option<usize> {
    let body = line.trim_end_matches(['\r', '\n']);
    let trimmed = body.trim_start_matches(' ');
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    Some(body.len() - trimmed.len())
}

/// Text after `key:` when the line is that mapping key.
fn key_value<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let rest = line.trim_start_matches(' ').strip_prefix(key)?.strip_prefix(':')?;
    if rest.is_empty() || rest.starts_with([' ', '\t', '\r', '\n']) {
        Some(rest)
    } else {
        None
    }
}

/// Scalar value with any trailing comment removed.
fn inline_value(rest: &str) -> &str {
    let body = rest.trim_end_matches(['\r', '\n']);
    let body = match body.find(" #") {
        Some(idx) => &body[..idx],
        None => body,
    };
    body.trim()
}

/// Line holding `key` among the direct children of `lines[start..end]`.
fn find_child(lines: &[&str], start: usize, end: usize, key: &str) -> Option<usize> {
    let child_indent = lines[start..end].iter().find_map(|l| indent_of(l))?;
    (start..end).find(|&i| indent_of(lines[i]) == Some(child_indent) && key_value(lines[i], key).is_some())
}

/// End (exclusive) of the mapping nested under the key on line `at`.
fn block_end(lines: &[&str], at: usize) -> usize {
    let parent = indent_of(lines[at]).unwrap_or(0);
    (at + 1..lines.len())
        .find(|&i| matches!(indent_of(lines[i]), Some(indent) if indent <= parent))
        .unwrap_or(lines.len())
}

/// End (exclusive) of a block sequence under the key on line `at`.
///
/// Sequence items may sit at the key's own indentation.
fn sequence_end(lines: &[&str], at: usize) -> usize {
    let parent = indent_of(lines[at]).unwrap_or(0);
    (at + 1..lines.len())
        .find(|&i| match indent_of(lines[i]) {
            Some(indent) if indent < parent => true,
            Some(indent) if indent == parent => {
                let item = lines[i].trim_start_matches(' ');
                !(item.starts_with("- ") || item.trim_end() == "-")
            }
            _ => false,
        })
        .unwrap_or(lines.len())
}

fn newline_of(line: &str) -> &'static str {
    if line.ends_with("\r\n") {
        "\r\n"
    } else {
        "\n"
    }
}

fn indent_block(block: &str, indent: usize) -> String {
    let pad = " ".repeat(indent);
    block
        .lines()
        .map(|line| {
            if line.is_empty() {
                "\n".to_string()
            } else {
                format!("{}{}\n", pad, line)
            }
        })
        .collect()
}

/// Rewrite the scalar at `project.versioning.current`, keeping its quotes
/// and any trailing comment.
pub(crate) fn replace_current_version(text: &str, version: &str) -> Option<String> {
    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    let project = find_child(&lines, 0, lines.len(), "project")?;
    let versioning = find_child(&lines, project + 1, block_end(&lines, project), "versioning")?;
    let current = find_child(&lines, versioning + 1, block_end(&lines, versioning), "current")?;

    let line = lines[current];
    let rest = key_value(line, "current")?;
    let after_colon = line.len() - rest.len();
    let value = rest.trim_start_matches([' ', '\t']);
    let value_start = after_colon + (rest.len() - value.len());

    let (start, end) = match value.chars().next()? {
        quote @ ('"' | '\'') => {
            let close = value[1..].find(quote)?;
            (value_start + 1, value_start + 1 + close)
        }
        _ => {
            let len = value
                .find([' ', '\t', '#', '\r', '\n'])
                .unwrap_or(value.len());
            if len == 0 {
                return None;
            }
            (value_start, value_start + len)
        }
    };

    let mut out = String::with_capacity(text.len() + version.len());
    for (idx, l) in lines.iter().enumerate() {
        if idx == current {
            out.push_str(&l[..start]);
            out.push_str(version);
            out.push_str(&l[end..]);
        } else {
            out.push_str(l);
        }
    }
    Some(out)
}

/// Append already serialized ledger items (a YAML block sequence at column
/// zero) to the top-level `history` sequence.
pub(crate) fn append_history(text: &str, items: &str) -> Option<String> {
    let lines: Vec<&str> = text.split_inclusive('\n').collect();

    let at = match find_child(&lines, 0, lines.len(), "history") {
        Some(at) => at,
        None => {
            let mut out = text.to_string();
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str("history:\n");
            out.push_str(&indent_block(items, 2));
            return Some(out);
        }
    };

    let parent = indent_of(lines[at])?;
    let value = inline_value(key_value(lines[at], "history")?);
    let (header, item_indent, insert_at) = match value {
        "" => {
            let end = sequence_end(&lines, at);
            let first = (at + 1..end).find_map(|i| indent_of(lines[i]));
            let last = (at + 1..end).rev().find(|&i| indent_of(lines[i]).is_some());
            match (first, last) {
                (Some(first), Some(last)) => (None, first, last + 1),
                _ => (None, parent + 2, at + 1),
            }
        }
        "[]" => (
            Some(format!("{}history:{}", " ".repeat(parent), newline_of(lines[at]))),
            parent + 2,
            at + 1,
        ),
        _ => return None,
    };

    let mut out = String::with_capacity(text.len() + items.len() * 2);
    for (idx, line) in lines[..insert_at].iter().enumerate() {
        match (&header, idx == at) {
            (Some(header), true) => out.push_str(header),
            _ => out.push_str(line),
        }
    }
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&indent_block(items, item_indent));
    for line in &lines[insert_at..] {
        out.push_str(line);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "# header\nproject:\n  id: app # the id\n  versioning:\n    strategy: semver\n    current: \"1.2.3\" # keep me\ndomain:\n  tags: [a, b]\nhistory:\n  - version: 1.2.3\n    changes: []\n\n# footer\n";

    #[test]
    fn test_replace_quoted_version_keeps_comment() {
        let out = replace_current_version(DOC, "1.3.0").unwrap();
        assert_eq!(out, DOC.replace("\"1.2.3\" # keep me", "\"1.3.0\" # keep me"));
    }

    #[test]
    fn test_replace_plain_and_single_quoted() {
        let plain = "project:\n  versioning:\n    current: 0.1.0\n";
        assert_eq!(
            replace_current_version(plain, "0.2.0").unwrap(),
            "project:\n  versioning:\n    current: 0.2.0\n"
        );

        let single = "project:\n    versioning:\n        current: '0.1.0'";
        assert_eq!(
            replace_current_version(single, "1.0.0").unwrap(),
            "project:\n    versioning:\n        current: '1.0.0'"
        );
    }

    #[test]
    fn test_replace_ignores_lookalike_keys() {
        let doc = "other:\n  versioning:\n    current: \"9.9.9\"\nproject:\n  versioning:\n    current: \"1.0.0\"\n";
        let out = replace_current_version(doc, "1.0.1").unwrap();
        assert!(out.contains("current: \"9.9.9\""));
        assert!(out.contains("current: \"1.0.1\""));
    }

    #[test]
    fn test_replace_gives_up_on_flow_mapping() {
        assert!(replace_current_version("project: {versioning: {current: 1.0.0}}\n", "1.0.1").is_none());
        assert!(replace_current_version("spec: x\n", "1.0.1").is_none());
    }

    #[test]
    fn test_append_after_last_item_before_trailing_comment() {
        let out = append_history(DOC, "- version: 1.3.0\n  changes: []\n").unwrap();
        assert_eq!(
            out,
            DOC.replace(
                "    changes: []\n\n# footer",
                "    changes: []\n  - version: 1.3.0\n    changes: []\n\n# footer"
            )
        );
    }

    #[test]
    fn test_append_to_unindented_sequence() {
        let doc = "history:\n- version: 1.0.0\nnext: 1\n";
        let out = append_history(doc, "- version: 1.1.0\n").unwrap();
        assert_eq!(out, "history:\n- version: 1.0.0\n- version: 1.1.0\nnext: 1\n");
    }

    #[test]
    fn test_append_to_empty_flow_sequence() {
        let doc = "spec: x\nhistory: [] # none yet\nafter: 1\n";
        let out = append_history(doc, "- version: 1.0.0\n").unwrap();
        assert_eq!(out, "spec: x\nhistory:\n  - version: 1.0.0\nafter: 1\n");
    }

    #[test]
    fn test_append_creates_missing_ledger() {
        let out = append_history("spec: x", "- version: 1.0.0\n").unwrap();
        assert_eq!(out, "spec: x\nhistory:\n  - version: 1.0.0\n");
    }

    #[test]
    fn test_append_gives_up_on_populated_flow_sequence() {
        assert!(append_history("history: [{version: 1.0.0}]\n", "- version: 1.1.0\n").is_none());
    }
}
