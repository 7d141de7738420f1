//! GEDCOM line parser
//!
//! Builds a level-nested tree from lines of the form
//! `LEVEL [@XREF@] TAG [value]`. CONT/CONC continuation lines are folded
//! into their parent's value during parsing, so consumers never see them.

use tracing::warn;

/// One node of the parsed tree
#[derive(Debug, Clone, Default)]
pub struct GedNode {
    pub xref: Option<String>,
    pub tag: String,
    pub value: String,
    pub children: Vec<GedNode>,
}

impl GedNode {
    /// First child with the given tag
    pub fn child(&self, tag: &str) -> Option<&GedNode> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// Value of the first child with the given tag, or ""
    pub fn child_value(&self, tag: &str) -> &str {
        self.child(tag).map(|c| c.value.as_str()).unwrap_or("")
    }

    /// All children with the given tag
    pub fn children_with_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a GedNode> {
        self.children.iter().filter(move |c| c.tag == tag)
    }
}

/// Parse GEDCOM text into a forest of level-0 records
///
/// Lenient: a line that does not fit the grammar, or whose level skips
/// ahead, is dropped with a warning.
pub fn parse_gedcom(text: &str) -> Vec<GedNode> {
    let mut roots: Vec<GedNode> = Vec::new();
    // Path of (level, node) from the current root down.
    let mut stack: Vec<(u32, GedNode)> = Vec::new();

    for (lineno, raw) in text.lines().enumerate() {
        let line = raw.trim_start_matches('\u{feff}').trim();
        if line.is_empty() {
            continue;
        }
        let Some((level, xref, tag, value)) = split_line(line) else {
            warn!(line = lineno + 1, "skipping malformed GEDCOM line");
            continue;
        };

        // Close nodes at or below the new level.
        while let Some(&(top_level, _)) = stack.last() {
            if top_level < level {
                break;
            }
            close_top(&mut stack, &mut roots);
        }
        if level > 0 && stack.is_empty() {
            warn!(line = lineno + 1, level, "skipping orphan GEDCOM line");
            continue;
        }
        if level > 0 {
            let parent_level = stack.last().map(|&(l, _)| l).unwrap_or(0);
            if level != parent_level + 1 {
                warn!(line = lineno + 1, level, "skipping level-skipping GEDCOM line");
                continue;
            }
        }

        // Continuations extend the parent's value instead of nesting.
        if tag == "CONT" || tag == "CONC" {
            if let Some((_, parent)) = stack.last_mut() {
                if tag == "CONT" {
                    parent.value.push('\n');
                }
                parent.value.push_str(value);
            }
            continue;
        }

        stack.push((
            level,
            GedNode {
                xref: xref.map(str::to_string),
                tag: tag.to_string(),
                value: value.to_string(),
                children: Vec::new(),
            },
        ));
    }
    while !stack.is_empty() {
        close_top(&mut stack, &mut roots);
    }
    roots
}

fn close_top(stack: &mut Vec<(u32, GedNode)>, roots: &mut Vec<GedNode>) {
    let (_, node) = stack.pop().expect("close_top on empty stack");
    match stack.last_mut() {
        Some((_, parent)) => parent.children.push(node),
        None => roots.push(node),
    }
}

/// Split `LEVEL [@XREF@] TAG [value]`
fn split_line(line: &str) -> Option<(u32, Option<&str>, &str, &str)> {
    let mut rest = line.splitn(2, ' ');
    let level: u32 = rest.next()?.parse().ok()?;
    let rest = rest.next()?.trim_start();

    let (xref, rest) = if let Some(stripped) = rest.strip_prefix('@') {
        let end = stripped.find('@')?;
        (Some(&stripped[..end]), stripped[end + 1..].trim_start())
    } else {
        (None, rest)
    };

    let mut parts = rest.splitn(2, ' ');
    let tag = parts.next()?;
    if tag.is_empty() {
        return None;
    }
    let value = parts.next().unwrap_or("");
    Some((level, xref, tag, value))
}
