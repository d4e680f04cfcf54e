use anyhow::{Context, Result};
use colored::{ColoredString, Colorize};
use std::io::Write;
use tabwriter::TabWriter;

use crate::model::{DayPlan, Priority, Task};
use crate::theme::Theme;

const PLAN_WIDTH: usize = 78;

fn heading(text: &str, theme: Theme) -> ColoredString {
    match theme {
        Theme::Dark => text.bright_cyan().bold(),
        Theme::Light => text.blue().bold(),
    }
}

fn muted(text: &str, theme: Theme) -> ColoredString {
    match theme {
        Theme::Dark => text.dimmed(),
        Theme::Light => text.bright_black(),
    }
}

fn priority_color(line: &str, priority: Priority) -> ColoredString {
    match priority {
        Priority::High => line.red(),
        Priority::Medium => line.yellow(),
        Priority::Low => line.green(),
    }
}

/// Model text may carry line breaks; one task must stay one table row
fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn minutes(value: Option<u32>) -> String {
    value.map(|m| format!("{m}m")).unwrap_or_else(|| "-".to_string())
}

/// Numbered, aligned task table; numbers are what `/done` and `/delete` take
pub fn render_task_list(tasks: &[Task], theme: Theme) -> Result<String> {
    if tasks.is_empty() {
        return Ok(format!(
            "{}\n",
            muted("No tasks yet. Type something to get started.", theme)
        ));
    }

    // align plain text first, color whole lines afterwards
    let mut tw = TabWriter::new(Vec::new());
    writeln!(tw, "#\tdone\tpriority\tcategory\test\tdeadline\tadded\ttitle")
        .context("Failed to write header")?;
    for (index, task) in tasks.iter().enumerate() {
        writeln!(
            tw,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            index + 1,
            if task.completed { "[x]" } else { "[ ]" },
            task.priority,
            task.category,
            minutes(task.estimated_minutes),
            task.deadline
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string()),
            task.created_at
                .with_timezone(&chrono::Local)
                .format("%m-%d %H:%M"),
            match &task.description {
                Some(description) => format!(
                    "{} ({})",
                    single_line(&task.title),
                    single_line(description)
                ),
                None => single_line(&task.title),
            }
        )
        .context("Failed to write row")?;
    }
    let table = tw
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush table output: {e}"))?;
    let table = String::from_utf8(table).context("Table output is not UTF-8")?;

    let mut out = String::new();
    for (index, line) in table.lines().enumerate() {
        let styled = match index.checked_sub(1).and_then(|i| tasks.get(i)) {
            None => heading(line, theme),
            Some(task) if task.completed => muted(line, theme).strikethrough(),
            Some(task) => priority_color(line, task.priority),
        };
        out.push_str(&format!("{styled}\n"));
    }

    let active = tasks.iter().filter(|t| !t.completed).count();
    out.push_str(&format!(
        "{}\n",
        muted(
            &format!("{active} active, {} completed", tasks.len() - active),
            theme
        )
    ));
    Ok(out)
}

/// Focus line plus the schedule; entries that resolve to a task say so
pub fn render_plan(plan: &DayPlan, tasks: &[Task], theme: Theme) -> String {
    let mut out = String::new();
    let generated = plan.date.with_timezone(&chrono::Local);

    out.push_str(&format!(
        "{} {}\n",
        heading("Day Plan", theme),
        muted(&format!("(generated {})", generated.format("%Y-%m-%d %H:%M")), theme)
    ));
    out.push_str(&format!(
        "{} {}\n\n",
        "Focus of the Day:".bold(),
        plan.focus_of_the_day
    ));

    if plan.schedule.is_empty() {
        out.push_str(&format!("{}\n", muted("The schedule is empty.", theme)));
        return out;
    }

    let time_width = plan
        .schedule
        .iter()
        .map(|item| item.time.chars().count())
        .max()
        .unwrap_or(0);

    for item in &plan.schedule {
        let prefix = format!(
            "{:<time_width$}  {:>4}m  ",
            item.time, item.duration_minutes
        );
        let indent = " ".repeat(prefix.chars().count());
        let options = textwrap::Options::new(PLAN_WIDTH)
            .initial_indent(&prefix)
            .subsequent_indent(&indent);

        let mut entry = textwrap::fill(&item.activity, &options);
        if let Some(task) = DayPlan::linked_task(item, tasks) {
            let badge = format!("Task linked: {}", task.title);
            entry.push_str(&format!("\n{indent}{}", priority_color(&badge, task.priority)));
        }
        out.push_str(&entry);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ScheduleItem, sample_tasks};
    use chrono::Utc;

    fn item(time: &str, activity: &str, task_id: Option<&str>, minutes: u32) -> ScheduleItem {
        ScheduleItem {
            time: time.to_string(),
            activity: activity.to_string(),
            task_id: task_id.map(str::to_string),
            duration_minutes: minutes,
        }
    }

    #[test]
    fn test_task_list_numbers_rows() {
        let tasks = sample_tasks(Utc::now());
        let out = render_task_list(&tasks, Theme::Dark).unwrap();

        assert!(out.contains("Review quarterly budget"));
        assert!(out.contains("Grocery shopping"));
        assert!(out.contains("[x]"));
        assert!(out.contains("2 active, 1 completed"));
        assert_eq!(out.lines().count(), 5);
    }

    #[test]
    fn test_multiline_text_keeps_row_styling_aligned() {
        colored::control::set_override(true);
        let mut tasks = sample_tasks(Utc::now());
        tasks[0].title = "Review\nquarterly budget".to_string();
        tasks[0].description = Some("line one\r\nline two".to_string());

        let out = render_task_list(&tasks, Theme::Dark).unwrap();
        colored::control::unset_override();

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[1].contains("Review quarterly budget (line one line two)"));
        assert!(lines[2].contains("Grocery shopping"));
        assert!(lines[3].contains("Client meeting preparation"));
        assert!(lines[1].starts_with("\u{1b}[31m"));
        assert!(lines[2].starts_with("\u{1b}[33m"));
        assert!(!lines[3].starts_with("\u{1b}[31m"));
    }

    #[test]
    fn test_rows_show_when_added() {
        let now = Utc::now();
        let out = render_task_list(&sample_tasks(now), Theme::Light).unwrap();
        let added = now.with_timezone(&chrono::Local).format("%m-%d %H:%M").to_string();
        assert!(out.lines().next().unwrap().contains("added"));
        assert_eq!(out.matches(added.as_str()).count(), 3);
    }

    #[test]
    fn test_empty_task_list() {
        let out = render_task_list(&[], Theme::Light).unwrap();
        assert!(out.contains("No tasks yet"));
    }

    #[test]
    fn test_plan_marks_linked_tasks() {
        let tasks = sample_tasks(Utc::now());
        let plan = DayPlan {
            date: Utc::now(),
            focus_of_the_day: "Budget first".to_string(),
            schedule: vec![
                item("09:00 AM", "Budget review", Some("review QUARTERLY budget"), 45),
                item("09:45 AM", "Coffee break", None, 15),
                item("10:00 AM", "Something else", Some("Not a task"), 30),
            ],
        };

        let out = render_plan(&plan, &tasks, Theme::Dark);

        assert!(out.contains("Budget first"));
        assert!(out.contains("Coffee break"));
        assert_eq!(out.matches("Task linked").count(), 1);
        assert!(out.contains("Task linked: Review quarterly budget"));
    }

    #[test]
    fn test_long_activity_wraps() {
        let plan = DayPlan {
            date: Utc::now(),
            focus_of_the_day: "x".to_string(),
            schedule: vec![item("09:00", &"word ".repeat(40), None, 30)],
        };
        let out = render_plan(&plan, &[], Theme::Light);
        let schedule_lines: Vec<&str> = out.lines().skip(3).collect();
        assert!(schedule_lines.len() > 1);
        assert!(schedule_lines.iter().all(|l| l.chars().count() <= PLAN_WIDTH));
    }
}
