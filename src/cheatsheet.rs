use std::path::Path;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::cli::{CheatsheetShowArgs, CheatsheetsListArgs};
use crate::formats::{DEFAULT_CATEGORY, HeadingGroup};
use crate::library::print_json;
use crate::query::compare_titles;
use crate::toc::{extract_headings, group_headings};

/// Listed ahead of the alphabetical categories.
pub const PRIORITY_CATEGORIES: [&str; 3] = ["Programming", "Python", "Database"];

pub fn list(args: CheatsheetsListArgs) -> anyhow::Result<()> {
    let sheets = load_dir(Path::new(&args.dir))?;
    let matched = filter(&sheets, args.search.as_deref(), args.category.as_deref());
    tracing::debug!(total = sheets.len(), matched = matched.len(), "cheat sheets");
    print_json(&matched)
}

pub fn show(args: CheatsheetShowArgs) -> anyhow::Result<()> {
    let Some(sheet) = load_one(Path::new(&args.dir), &args.id)? else {
        anyhow::bail!("cheat sheet not found: {}", args.id);
    };
    print_json(&sheet.detail())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheatSheetMeta {
    pub id: String,
    pub title: String,
    pub intro: String,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
}

impl CheatSheetMeta {
    pub fn primary_category(&self) -> &str {
        self.categories
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_CATEGORY)
    }

    fn matches_search(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.title.to_lowercase().contains(&term)
            || self.intro.to_lowercase().contains(&term)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&term))
            || self
                .categories
                .iter()
                .any(|c| c.to_lowercase().contains(&term))
    }
}

#[derive(Debug, Clone)]
pub struct CheatSheet {
    pub meta: CheatSheetMeta,
    pub body: String,
}

impl CheatSheet {
    pub fn detail(&self) -> CheatSheetDetail<'_> {
        CheatSheetDetail {
            meta: &self.meta,
            sections: split_sections(&self.body),
            toc: group_headings(&extract_headings(&self.body)),
        }
    }
}

/// A cheat sheet as shown on its own page.
#[derive(Debug, Clone, Serialize)]
pub struct CheatSheetDetail<'a> {
    #[serde(flatten)]
    pub meta: &'a CheatSheetMeta,
    pub sections: Vec<Section>,
    pub toc: Vec<HeadingGroup>,
}

#[derive(Debug, Default, Deserialize)]
struct RawFrontMatter {
    title: Option<String>,
    intro: Option<String>,
    tags: Option<OneOrMany>,
    categories: Option<OneOrMany>,
    background: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        let items = match self {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        };
        items
            .into_iter()
            .map(|item| item.trim().to_owned())
            .filter(|item| !item.is_empty())
            .collect()
    }
}

/// Splits a leading `---` YAML block from the body.
pub fn split_front_matter(contents: &str) -> (Option<&str>, &str) {
    let Some(first_end) = contents.find('\n') else {
        return (None, contents);
    };
    if contents[..first_end].trim_end() != "---" {
        return (None, contents);
    }

    let mut offset = first_end + 1;
    for line in contents[offset..].split_inclusive('\n') {
        if line.trim_end() == "---" {
            let yaml = &contents[first_end + 1..offset];
            return (Some(yaml), &contents[offset + line.len()..]);
        }
        offset += line.len();
    }

    (None, contents)
}

pub fn parse_cheatsheet(id: &str, contents: &str) -> CheatSheet {
    let (yaml, body) = split_front_matter(contents);
    let front = yaml
        .and_then(|yaml| match serde_yaml::from_str::<RawFrontMatter>(yaml) {
            Ok(front) => Some(front),
            Err(err) => {
                tracing::debug!(id, ?err, "front matter did not parse; using defaults");
                None
            }
        })
        .unwrap_or_default();

    let title = front
        .title
        .map(|t| t.trim().to_owned())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| id.replace('-', " "));
    let mut categories = front.categories.map(OneOrMany::into_vec).unwrap_or_default();
    if categories.is_empty() {
        categories.push(DEFAULT_CATEGORY.to_owned());
    }

    CheatSheet {
        meta: CheatSheetMeta {
            id: id.to_owned(),
            title,
            intro: front.intro.unwrap_or_default().trim().to_owned(),
            tags: front.tags.map(OneOrMany::into_vec).unwrap_or_default(),
            categories,
            background: front.background,
        },
        body: body.to_owned(),
    }
}

/// Loads every `*.md` file in `dir`, ordered by primary category then title.
pub fn load_dir(dir: &Path) -> anyhow::Result<Vec<CheatSheet>> {
    let mut sheets = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("read cheat sheet dir: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("md") {
            continue;
        }
        let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("read cheat sheet: {}", path.display()))?;
        sheets.push(parse_cheatsheet(id, &contents));
    }

    sheets.sort_by(|a, b| {
        compare_titles(a.meta.primary_category(), b.meta.primary_category())
            .then_with(|| compare_titles(&a.meta.title, &b.meta.title))
    });
    Ok(sheets)
}

pub fn load_one(dir: &Path, id: &str) -> anyhow::Result<Option<CheatSheet>> {
    if id.is_empty() || id.contains(['/', '\\']) || id.starts_with('.') {
        anyhow::bail!("invalid cheat sheet id: {id}");
    }
    let path = dir.join(format!("{id}.md"));
    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err).with_context(|| format!("read cheat sheet: {}", path.display()));
        }
    };
    Ok(Some(parse_cheatsheet(id, &contents)))
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryGroup<'a> {
    pub category: String,
    pub sheets: Vec<&'a CheatSheetMeta>,
}

/// Priority categories first, the rest alphabetically.
pub fn group_by_category(sheets: &[CheatSheet]) -> Vec<CategoryGroup<'_>> {
    let mut groups: Vec<CategoryGroup<'_>> = Vec::new();
    for sheet in sheets {
        let category = sheet.meta.primary_category();
        match groups.iter_mut().find(|g| g.category == category) {
            Some(group) => group.sheets.push(&sheet.meta),
            None => groups.push(CategoryGroup {
                category: category.to_owned(),
                sheets: vec![&sheet.meta],
            }),
        }
    }

    groups.sort_by(|a, b| {
        let rank = |category: &str| {
            PRIORITY_CATEGORIES
                .iter()
                .position(|p| *p == category)
                .unwrap_or(PRIORITY_CATEGORIES.len())
        };
        rank(&a.category)
            .cmp(&rank(&b.category))
            .then_with(|| a.category.cmp(&b.category))
    });
    groups
}

/// `category` of `None` means all categories.
pub fn filter<'a>(
    sheets: &'a [CheatSheet],
    search: Option<&str>,
    category: Option<&str>,
) -> Vec<&'a CheatSheetMeta> {
    let search = search.filter(|s| !s.is_empty());
    sheets
        .iter()
        .map(|sheet| &sheet.meta)
        .filter(|meta| category.is_none_or(|c| meta.categories.iter().any(|mc| mc == c)))
        .filter(|meta| search.is_none_or(|term| meta.matches_search(term)))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub title: String,
    pub subsections: Vec<Subsection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subsection {
    pub title: String,
    pub content: String,
}

/// `## ` starts a section and `### ` a subsection; loose text outside a
/// subsection is dropped.
pub fn split_sections(body: &str) -> Vec<Section> {
    let mut sections: Vec<Section> = Vec::new();

    for line in body.split_inclusive('\n') {
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if let Some(title) = trimmed.strip_prefix("## ") {
            sections.push(Section {
                title: title.trim().to_owned(),
                subsections: Vec::new(),
            });
            continue;
        }
        let Some(section) = sections.last_mut() else {
            continue;
        };
        if let Some(title) = trimmed.strip_prefix("### ") {
            section.subsections.push(Subsection {
                title: title.trim().to_owned(),
                content: String::new(),
            });
            continue;
        }
        if let Some(subsection) = section.subsections.last_mut() {
            subsection.content.push_str(line);
        }
    }

    sections
}
