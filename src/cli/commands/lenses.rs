//! Lenses command - show the code lenses of a file

use super::{absolute, print_json};
use crate::cli::args::{FileArgs, OutputFormat};
use crate::error::LensResult;
use crate::ui::{self, UiContext};
use crate::views::CodeLens;
use crate::workspace::Workspace;
use console::style;

pub async fn execute(args: FileArgs, workspace: &Workspace) -> LensResult<()> {
    let file = absolute(&args.file)?;
    let lenses = workspace.lenses(&file).await;

    match args.format {
        OutputFormat::Json => print_json(&lenses)?,
        OutputFormat::Plain => print_plain(&lenses),
        OutputFormat::Table if lenses.is_empty() => {
            ui::step_info(&UiContext::detect(), "No lenses");
        }
        OutputFormat::Table => print_table(&lenses),
    }

    Ok(())
}

fn print_table(lenses: &[CodeLens]) {
    println!(
        "{:<6} {:<24} {:<20} {}",
        style("LINE").bold(),
        style("TITLE").bold(),
        style("COMMAND").bold(),
        style("ARGUMENTS").bold()
    );
    println!("{}", "-".repeat(72));

    for lens in lenses {
        let arguments = serde_json::Value::from(lens.action.arguments.clone());
        println!(
            "{:<6} {:<24} {:<20} {}",
            lens.line + 1,
            lens.action.title,
            style(&lens.action.command).dim(),
            arguments
        );
    }
}

fn print_plain(lenses: &[CodeLens]) {
    for lens in lenses {
        println!("{}\t{}", lens.line + 1, lens.action.title);
    }
}
