use std::io::Write;

use chrono::{Local, Utc};
use color_eyre::Result;
use today_core::tasks::{filter_visible, Task, ValidationError};
use today_task::TaskListView;

use crate::{cli::TaskCommand, dates, locale::Locale};

/// Execute a scripted task subcommand against the mounted view.
pub fn handle(
    cmd: TaskCommand,
    view: &mut TaskListView,
    locale: Locale,
    out: &mut impl Write,
) -> Result<()> {
    match cmd {
        TaskCommand::List { pending, all } => {
            let show_completed = if pending {
                false
            } else {
                all || view.show_completed()
            };
            let tasks = filter_visible(&view.state().tasks, show_completed);
            if tasks.is_empty() {
                writeln!(out, "{}", locale.empty_list())?;
                return Ok(());
            }
            for task in &tasks {
                writeln!(out, "{}", task_line(task, locale))?;
            }
        }
        TaskCommand::Add { description, date } => {
            let estimated_at = match date {
                Some(raw) => dates::parse_estimate(&raw).ok_or_else(|| {
                    color_eyre::eyre::eyre!("{}: {}", locale.invalid_data(), locale.invalid_date())
                })?,
                None => Utc::now(),
            };
            match view.add_task(&description.join(" "), estimated_at) {
                Ok(id) => writeln!(out, "Created task {id}")?,
                Err(ValidationError::MissingDescription) => color_eyre::eyre::bail!(
                    "{}: {}",
                    locale.invalid_data(),
                    locale.missing_description()
                ),
            }
        }
        TaskCommand::Toggle { id } => {
            view.toggle_task(id);
            match view.state().task(id) {
                Some(task) if task.is_done() => writeln!(out, "Marked done: {}", task.description)?,
                Some(task) => writeln!(out, "Marked pending: {}", task.description)?,
                None => writeln!(out, "No task with id {id}")?,
            }
        }
        TaskCommand::Delete { id } => {
            let description = view.state().task(id).map(|t| t.description.clone());
            view.delete_task(id);
            match description {
                Some(description) => writeln!(out, "Deleted: {description}")?,
                None => writeln!(out, "No task with id {id}")?,
            }
        }
        TaskCommand::Filter => {
            view.toggle_filter();
            if view.show_completed() {
                writeln!(out, "Showing completed tasks")?;
            } else {
                writeln!(out, "Hiding completed tasks")?;
            }
        }
    }

    Ok(())
}

fn task_line(task: &Task, locale: Locale) -> String {
    let mark = if task.is_done() { "[x]" } else { "[ ]" };
    let estimate = locale.short_date(&task.estimated_at.with_timezone(&Local));
    let mut line = format!("{mark} {} {} ({estimate})", task.id, task.description);
    if let Some(done) = task.completed_at {
        let done = locale.short_date(&done.with_timezone(&Local));
        line.push_str(&format!(" done {done}"));
    }
    line
}
