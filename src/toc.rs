//! Table of contents extraction for markdown documents.
//!
//! Headings are found with ATX syntax (`#` through `######`, a space, then
//! text) scanned line by line over the whole document. Lines inside fenced
//! code blocks are not headings. Sidebar grouping is
//! flat: each level-1 heading owns every following heading until the next
//! level-1 heading, whatever their depth.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use anyhow::Context as _;
use regex::Regex;

use crate::cli::TocArgs;
use crate::formats::{Heading, HeadingGroup};
use crate::library::print_json;

static ATX_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})[ \t]+(.+)$").expect("valid heading regex"));
static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("valid bold regex"));
static ITALIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*(.*?)\*").expect("valid italic regex"));
static UNDERSCORE_BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b__(.+?)__\b").expect("valid bold regex"));
static UNDERSCORE_ITALIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b_(.+?)_\b").expect("valid italic regex"));
static CLOSING_HASHES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+#+[ \t]*$").expect("valid closing sequence regex"));
static FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ {0,3}(`{3,}|~{3,})").expect("valid fence regex"));
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(.*?)\]\(.*?\)").expect("valid link regex"));
static NON_SLUG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s-]").expect("valid slug filter regex"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));
static HYPHENS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").expect("valid hyphen regex"));

pub fn run(args: TocArgs) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.input)
        .with_context(|| format!("read markdown: {}", args.input))?;
    let headings = extract_headings(&text);
    tracing::debug!(count = headings.len(), input = %args.input, "extracted headings");

    if args.json {
        return print_json(&headings);
    }

    let expanded = initially_expanded(&headings);
    for group in group_headings(&headings) {
        let marker = if expanded.contains(&group.heading.id) { "-" } else { "+" };
        println!("{marker} {} #{}", group.heading.title, group.heading.id);
        for child in &group.children {
            let indent = "  ".repeat(usize::from(child.level.saturating_sub(1)));
            println!("{indent}- {} #{}", child.title, child.id);
        }
    }
    Ok(())
}

pub fn extract_headings(text: &str) -> Vec<Heading> {
    let mut slugger = Slugger::default();
    let mut headings = Vec::new();

    let mut fence: Option<&str> = None;

    for line in text.lines() {
        if let Some(marker) = FENCE.captures(line).and_then(|c| c.get(1)) {
            let marker = marker.as_str();
            match fence {
                None => fence = Some(marker),
                Some(open) if closes_fence(open, marker, line) => fence = None,
                Some(_) => {}
            }
            continue;
        }
        if fence.is_some() {
            continue;
        }

        let Some(captures) = ATX_HEADING.captures(line) else {
            continue;
        };
        let level = captures[1].len() as u8;
        let raw = CLOSING_HASHES.replace(captures[2].trim_end(), "");
        let title = strip_inline_markup(&raw);
        let id = slugger.slug(&title);
        headings.push(Heading { id, title, level });
    }

    headings
}

/// A closing fence repeats the opening character at least as many times and
/// carries nothing else.
fn closes_fence(open: &str, marker: &str, line: &str) -> bool {
    open.as_bytes()[0] == marker.as_bytes()[0]
        && marker.len() >= open.len()
        && line.trim() == marker
}

/// Reduces bold, italic and link syntax to their inner text.
pub fn strip_inline_markup(raw: &str) -> String {
    let text = BOLD.replace_all(raw, "$1");
    let text = UNDERSCORE_BOLD.replace_all(&text, "$1");
    let text = ITALIC.replace_all(&text, "$1");
    let text = UNDERSCORE_ITALIC.replace_all(&text, "$1");
    LINK.replace_all(&text, "$1").into_owned()
}

pub fn slugify(title: &str) -> String {
    let lower = title.to_lowercase();
    let kept = NON_SLUG.replace_all(&lower, "");
    let hyphenated = WHITESPACE.replace_all(&kept, "-");
    HYPHENS.replace_all(&hyphenated, "-").into_owned()
}

/// Hands out unique slugs: repeats get `-1`, `-2`, ... in encounter order.
#[derive(Debug, Clone, Default)]
pub struct Slugger {
    seen: HashMap<String, usize>,
}

impl Slugger {
    pub fn slug(&mut self, title: &str) -> String {
        let base = slugify(title);
        let mut candidate = base.clone();
        while let Some(count) = self.seen.get_mut(&candidate) {
            *count += 1;
            candidate = format!("{base}-{count}");
        }
        self.seen.insert(candidate.clone(), 0);
        candidate
    }
}

/// Headings that precede the first level-1 heading belong to no group.
pub fn group_headings(headings: &[Heading]) -> Vec<HeadingGroup> {
    let mut groups: Vec<HeadingGroup> = Vec::new();

    for heading in headings {
        if heading.level == 1 {
            groups.push(HeadingGroup {
                heading: heading.clone(),
                children: Vec::new(),
            });
        } else if let Some(current) = groups.last_mut() {
            current.children.push(heading.clone());
        }
    }

    groups
}

/// Sidebar sections open on first render.
pub fn initially_expanded(headings: &[Heading]) -> HashSet<String> {
    headings
        .iter()
        .filter(|h| h.level <= 2)
        .map(|h| h.id.clone())
        .collect()
}
