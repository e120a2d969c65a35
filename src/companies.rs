use std::path::Path;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::cli::{CompaniesListArgs, CompanyQuestionsArgs};
use crate::library::print_json;
use crate::query::{compare_titles, paginate};

pub const COMPANIES_PER_PAGE: usize = 9;
pub const QUESTIONS_PER_PAGE: usize = 10;

pub fn list(args: CompaniesListArgs) -> anyhow::Result<()> {
    let companies = load_companies(Path::new(&args.data))?;
    let matched = filter_companies(&companies, args.search.as_deref())
        .into_iter()
        .map(CompanySummary::from)
        .collect::<Vec<_>>();
    print_json(&paginate(&matched, args.page, COMPANIES_PER_PAGE))
}

pub fn questions(args: CompanyQuestionsArgs) -> anyhow::Result<()> {
    let companies = load_companies(Path::new(&args.data))?;
    let Some(company) = find_company(&companies, &args.company) else {
        anyhow::bail!("company not found: {}", args.company);
    };
    let matched = filter_questions(&company.questions, args.search.as_deref())
        .into_iter()
        .map(QuestionView::from)
        .collect::<Vec<_>>();
    print_json(&paginate(&matched, args.page, QUESTIONS_PER_PAGE))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Difficulty", default)]
    pub difficulty: String,
    #[serde(rename = "Frequency %", default)]
    pub frequency: String,
    #[serde(rename = "Acceptance %", default)]
    pub acceptance: String,
    #[serde(rename = "URL", default)]
    pub url: String,
}

impl Question {
    /// `"87.5%"` parses as `87.5`; anything unparseable as `0`.
    pub fn frequency_percent(&self) -> f64 {
        self.frequency
            .trim()
            .trim_end_matches('%')
            .trim()
            .parse()
            .unwrap_or(0.0)
    }

    pub fn frequency_band(&self) -> FrequencyBand {
        FrequencyBand::from_percent(self.frequency_percent())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyBand {
    VeryHigh,
    High,
    Medium,
    Low,
}

impl FrequencyBand {
    pub fn from_percent(percent: f64) -> Self {
        if percent >= 75.0 {
            Self::VeryHigh
        } else if percent >= 50.0 {
            Self::High
        } else if percent >= 25.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    #[serde(rename = "company")]
    pub name: String,
    #[serde(rename = "leetcode data", default)]
    pub questions: Vec<Question>,
}

/// Parses the company list and sorts it by name.
pub fn parse_companies(json: &str) -> anyhow::Result<Vec<Company>> {
    let mut companies: Vec<Company> =
        serde_json::from_str(json).context("parse company questions")?;
    companies.sort_by(|a, b| compare_titles(&a.name, &b.name));
    Ok(companies)
}

pub fn load_companies(path: &Path) -> anyhow::Result<Vec<Company>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("read company questions: {}", path.display()))?;
    parse_companies(&json).with_context(|| format!("load {}", path.display()))
}

pub fn find_company<'a>(companies: &'a [Company], name: &str) -> Option<&'a Company> {
    companies
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(name))
}

pub fn filter_companies<'a>(companies: &'a [Company], search: Option<&str>) -> Vec<&'a Company> {
    let Some(term) = search.filter(|s| !s.is_empty()) else {
        return companies.iter().collect();
    };
    let term = term.to_lowercase();
    companies
        .iter()
        .filter(|c| c.name.to_lowercase().contains(&term))
        .collect()
}

/// Matches the search term against title or difficulty.
pub fn filter_questions<'a>(questions: &'a [Question], search: Option<&str>) -> Vec<&'a Question> {
    let Some(term) = search.filter(|s| !s.is_empty()) else {
        return questions.iter().collect();
    };
    let term = term.to_lowercase();
    questions
        .iter()
        .filter(|q| {
            q.title.to_lowercase().contains(&term) || q.difficulty.to_lowercase().contains(&term)
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct CompanySummary<'a> {
    pub name: &'a str,
    pub question_count: usize,
}

impl<'a> From<&'a Company> for CompanySummary<'a> {
    fn from(company: &'a Company) -> Self {
        Self {
            name: &company.name,
            question_count: company.questions.len(),
        }
    }
}

/// A question with its frequency band resolved.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionView<'a> {
    #[serde(flatten)]
    pub question: &'a Question,
    pub frequency_band: FrequencyBand,
}

impl<'a> From<&'a Question> for QuestionView<'a> {
    fn from(question: &'a Question) -> Self {
        Self {
            question,
            frequency_band: question.frequency_band(),
        }
    }
}
