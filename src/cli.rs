use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Library {
        #[command(subcommand)]
        command: LibraryCommand,
    },
    Catalog {
        #[command(subcommand)]
        command: CatalogCommand,
    },
    Toc(TocArgs),
    Render(RenderArgs),
    Cheatsheets {
        #[command(subcommand)]
        command: CheatsheetsCommand,
    },
    Companies {
        #[command(subcommand)]
        command: CompaniesCommand,
    },
    Serve(ServeArgs),
}

#[derive(Debug, Subcommand)]
pub enum LibraryCommand {
    /// List one page of resources matching the filters.
    List(LibraryListArgs),
    /// Re-run the listing saved in a session file.
    Resume(LibraryResumeArgs),
    /// List distinct category/subcategory pairs.
    Categories(LibraryCategoriesArgs),
}

#[derive(Debug, Args)]
pub struct LibraryListArgs {
    /// Catalog JSON file; overrides the hosted backend.
    #[arg(long)]
    pub catalog: Option<String>,

    /// Case-insensitive substring matched against resource names.
    #[arg(long)]
    pub search: Option<String>,

    /// Category name, or `all`.
    #[arg(long, default_value = "all")]
    pub category: String,

    /// Subcategory name, or `all`.
    #[arg(long, default_value = "all")]
    pub subcategory: String,

    /// `newest` or `title`; other values leave source order.
    #[arg(long, default_value = "newest")]
    pub sort: String,

    /// 1-indexed page number.
    #[arg(long, default_value_t = 1)]
    pub page: usize,

    /// Save the listing to this session file.
    #[arg(long)]
    pub session: Option<String>,
}

#[derive(Debug, Args)]
pub struct LibraryResumeArgs {
    /// Session file written by `library list --session`.
    #[arg(long)]
    pub session: String,

    /// Catalog JSON file; overrides the hosted backend.
    #[arg(long)]
    pub catalog: Option<String>,
}

#[derive(Debug, Args)]
pub struct LibraryCategoriesArgs {
    /// Catalog JSON file; overrides the hosted backend.
    #[arg(long)]
    pub catalog: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum CatalogCommand {
    Import(CatalogImportArgs),
    Add(CatalogAddArgs),
    Remove(CatalogRemoveArgs),
    Stats(CatalogStatsArgs),
}

#[derive(Debug, Args)]
pub struct CatalogImportArgs {
    /// JSON array of `{category, subcategory, resources}` groups.
    #[arg(long)]
    pub groups: String,

    /// Catalog file to create or update.
    #[arg(long)]
    pub catalog: String,
}

#[derive(Debug, Args)]
pub struct CatalogAddArgs {
    #[arg(long)]
    pub catalog: String,

    #[arg(long)]
    pub name: String,

    /// Link to the study material (for example a Google Drive file).
    #[arg(long)]
    pub file_link: String,

    #[arg(long, default_value = "General")]
    pub category: String,

    #[arg(long, default_value = "General")]
    pub subcategory: String,

    /// Thumbnail URL; derived from Drive links when omitted.
    #[arg(long)]
    pub thumbnail: Option<String>,
}

#[derive(Debug, Args)]
pub struct CatalogRemoveArgs {
    #[arg(long)]
    pub catalog: String,

    /// Resource id to remove.
    #[arg(long)]
    pub id: String,
}

#[derive(Debug, Args)]
pub struct CatalogStatsArgs {
    #[arg(long)]
    pub catalog: String,
}

#[derive(Debug, Args)]
pub struct TocArgs {
    /// Markdown document.
    #[arg(long)]
    pub input: String,

    /// Print the flat heading list as JSON instead of an outline.
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Markdown document.
    #[arg(long)]
    pub input: String,

    /// Number of chunks to render; defaults to the initial window.
    #[arg(long)]
    pub loaded: Option<usize>,

    /// Write HTML here instead of stdout.
    #[arg(long)]
    pub out: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum CheatsheetsCommand {
    List(CheatsheetsListArgs),
    Show(CheatsheetShowArgs),
}

#[derive(Debug, Args)]
pub struct CheatsheetsListArgs {
    /// Directory of `*.md` cheat sheets.
    #[arg(long)]
    pub dir: String,

    #[arg(long)]
    pub search: Option<String>,

    #[arg(long)]
    pub category: Option<String>,
}

#[derive(Debug, Args)]
pub struct CheatsheetShowArgs {
    /// Directory of `*.md` cheat sheets.
    #[arg(long)]
    pub dir: String,

    /// File stem of the cheat sheet.
    #[arg(long)]
    pub id: String,
}

#[derive(Debug, Subcommand)]
pub enum CompaniesCommand {
    List(CompaniesListArgs),
    Questions(CompanyQuestionsArgs),
}

#[derive(Debug, Args)]
pub struct CompaniesListArgs {
    /// Company question data (JSON).
    #[arg(long)]
    pub data: String,

    #[arg(long)]
    pub search: Option<String>,

    #[arg(long, default_value_t = 1)]
    pub page: usize,
}

#[derive(Debug, Args)]
pub struct CompanyQuestionsArgs {
    /// Company question data (JSON).
    #[arg(long)]
    pub data: String,

    #[arg(long)]
    pub company: String,

    /// Matched against question title or difficulty.
    #[arg(long)]
    pub search: Option<String>,

    #[arg(long, default_value_t = 1)]
    pub page: usize,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Listen address.
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub addr: String,

    /// Catalog JSON file; overrides the hosted backend.
    #[arg(long)]
    pub catalog: Option<String>,

    /// Directory of `*.md` cheat sheets.
    #[arg(long)]
    pub cheatsheets: Option<String>,

    /// Company question data (JSON).
    #[arg(long)]
    pub companies: Option<String>,
}
