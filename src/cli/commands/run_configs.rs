//! Run-configs command - show run and launch configurations for a file

use super::{absolute, print_json};
use crate::cli::args::{FileArgs, OutputFormat};
use crate::error::LensResult;
use crate::ui::{self, UiContext};
use crate::workspace::Workspace;
use console::style;

pub async fn execute(args: FileArgs, workspace: &Workspace) -> LensResult<()> {
    let file = absolute(&args.file)?;
    let editor = workspace.editor();
    editor.set_focus(&file);
    let configs = editor.reconcile().await;

    match args.format {
        OutputFormat::Json => print_json(&configs)?,
        OutputFormat::Plain => {
            for config in &configs {
                println!("{}", config.title);
            }
        }
        OutputFormat::Table => {
            let ctx = UiContext::detect();
            if configs.is_empty() {
                ui::step_info(&ctx, "No run configurations");
                return Ok(());
            }
            ui::section(&ctx, &file.display().to_string());
            for config in &configs {
                println!("  {:<32} {}", config.title, style(&config.command).dim());
                if let Some(ref tooltip) = config.tooltip {
                    for line in tooltip.lines() {
                        println!("      {}", style(line).dim());
                    }
                }
            }
        }
    }

    Ok(())
}
