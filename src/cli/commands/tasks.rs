//! Tasks command - list runnable tasks

use super::print_json;
use crate::cli::args::{ListArgs, OutputFormat};
use crate::error::LensResult;
use crate::ui::{self, UiContext};
use crate::views::Task;
use crate::workspace::Workspace;
use console::style;

pub async fn execute(args: ListArgs, workspace: &Workspace) -> LensResult<()> {
    let tasks = workspace.tasks().provide_tasks().await;

    match args.format {
        OutputFormat::Json => print_json(&tasks)?,
        OutputFormat::Plain => {
            for task in &tasks {
                println!("{}", task.name);
            }
        }
        OutputFormat::Table if tasks.is_empty() => {
            ui::step_info(&UiContext::detect(), "No tasks");
        }
        OutputFormat::Table => print_table(&tasks),
    }

    Ok(())
}

fn print_table(tasks: &[Task]) {
    println!("{:<40} {}", style("TASK").bold(), style("COMMAND").bold());
    println!("{}", "-".repeat(72));

    for task in tasks {
        println!(
            "{:<40} {}",
            task.name,
            style(format!("{} {}", task.program, task.args.join(" "))).dim()
        );
    }

    println!();
    println!("{} task(s)", tasks.len());
}
