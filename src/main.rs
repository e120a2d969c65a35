use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

use studyshelf::cli::{
    CatalogCommand, CheatsheetsCommand, Cli, Command, CompaniesCommand, LibraryCommand,
};

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    studyshelf::logging::init().context("init logging")?;

    let cli = Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        Command::Library { command } => match command {
            LibraryCommand::List(args) => {
                studyshelf::library::list(args).await.context("library list")?;
            }
            LibraryCommand::Resume(args) => {
                studyshelf::library::resume(args)
                    .await
                    .context("library resume")?;
            }
            LibraryCommand::Categories(args) => {
                studyshelf::library::categories(args)
                    .await
                    .context("library categories")?;
            }
        },
        Command::Catalog { command } => match command {
            CatalogCommand::Import(args) => {
                studyshelf::catalog::import(args).context("catalog import")?;
            }
            CatalogCommand::Add(args) => {
                studyshelf::catalog::add(args).context("catalog add")?;
            }
            CatalogCommand::Remove(args) => {
                studyshelf::catalog::remove(args).context("catalog remove")?;
            }
            CatalogCommand::Stats(args) => {
                studyshelf::catalog::stats(args).context("catalog stats")?;
            }
        },
        Command::Toc(args) => {
            studyshelf::toc::run(args).context("toc")?;
        }
        Command::Render(args) => {
            studyshelf::render::run(args).context("render")?;
        }
        Command::Cheatsheets { command } => match command {
            CheatsheetsCommand::List(args) => {
                studyshelf::cheatsheet::list(args).context("cheatsheets list")?;
            }
            CheatsheetsCommand::Show(args) => {
                studyshelf::cheatsheet::show(args).context("cheatsheets show")?;
            }
        },
        Command::Companies { command } => match command {
            CompaniesCommand::List(args) => {
                studyshelf::companies::list(args).context("companies list")?;
            }
            CompaniesCommand::Questions(args) => {
                studyshelf::companies::questions(args).context("companies questions")?;
            }
        },
        Command::Serve(args) => {
            studyshelf::serve::run(args).await.context("serve")?;
        }
    }

    Ok(())
}
