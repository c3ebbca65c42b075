//! Targets command - list the targets of a file's package

use super::{absolute, print_json};
use crate::cache::package_key;
use crate::cli::args::{FileArgs, OutputFormat};
use crate::error::{LensError, LensResult};
use crate::tool::Target;
use crate::ui::{self, UiContext};
use crate::workspace::Workspace;
use console::style;
use std::path::Path;

pub async fn execute(args: FileArgs, workspace: &Workspace) -> LensResult<()> {
    let file = absolute(&args.file)?;
    let packages = workspace.packages();

    let root = packages.workspace_root().await.map_err(LensError::Shared)?;
    let key = package_key(&root, &file).ok_or_else(|| LensError::OutsideWorkspace(file.clone()))?;
    let targets = packages.fetch(&key).await.map_err(LensError::Shared)?;

    match args.format {
        OutputFormat::Json => print_json(targets.as_slice())?,
        OutputFormat::Plain => {
            for target in targets.iter() {
                println!("{}", target.addr);
            }
        }
        OutputFormat::Table if targets.is_empty() => {
            ui::step_info(&UiContext::detect(), &format!("No targets in //{}", key));
        }
        OutputFormat::Table => print_table(&targets, &file),
    }

    Ok(())
}

fn print_table(targets: &[Target], file: &Path) {
    println!(
        "{:<40} {:<8} {}",
        style("ADDR").bold(),
        style("PRIVATE").bold(),
        style("LINE").bold()
    );
    println!("{}", "-".repeat(56));

    for target in targets {
        let private = if target.private {
            style("yes").yellow()
        } else {
            style("no").dim()
        };
        let line = target
            .position_in(file)
            .map(|pos| pos.line.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{:<40} {:<8} {}", target.addr, private, line);
    }

    println!();
    println!("{} target(s)", targets.len());
}
