//! Interactive menu: the same store operations as the subcommands, driven
//! by prompts. A rejected answer re-renders the same prompt; Ctrl-C or
//! Ctrl-D at any prompt goes back to the main menu.

use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType, disable_raw_mode, enable_raw_mode};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::cli::output::{format_listing, format_month_entries};
use crate::model::month::Month;
use crate::model::tracker::Tracker;
use crate::ops::month_ops::{self, AddMonth};
use crate::ops::navigate::{self, Listing};
use crate::ops::validate::validate;
use crate::ops::{StoreError, entry_ops, task_ops, year_ops};

type MenuResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuChoice {
    CreateYear,
    CreateTask,
    CreateMonth,
    AddEntry,
    View,
    Delete,
    Exit,
}

impl MenuChoice {
    const ALL: [(MenuChoice, &'static str); 7] = [
        (MenuChoice::CreateYear, "Create year"),
        (MenuChoice::CreateTask, "Create task"),
        (MenuChoice::CreateMonth, "Create month"),
        (MenuChoice::AddEntry, "Add entry"),
        (MenuChoice::View, "View data"),
        (MenuChoice::Delete, "Delete data"),
        (MenuChoice::Exit, "Exit"),
    ];

    fn parse(input: &str) -> Result<MenuChoice, StoreError> {
        let n: usize = input
            .trim()
            .parse()
            .map_err(|_| StoreError::InvalidFormat(format!("\"{}\" is not a menu number", input.trim())))?;
        n.checked_sub(1)
            .and_then(|i| MenuChoice::ALL.get(i))
            .map(|(c, _)| *c)
            .ok_or_else(|| StoreError::OutOfRange(format!("choose 1 to {}", MenuChoice::ALL.len())))
    }
}

/// Delete targets, in hierarchy order
const DELETE_LEVELS: [&str; 4] = ["year", "task", "month", "entry"];

/// Pick a label from a listing by 1-based number or by the label itself.
fn choose_label(labels: &[String], input: &str) -> Result<String, StoreError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(StoreError::EmptyInput("choice".to_string()));
    }
    if let Ok(n) = input.parse::<usize>()
        && let Some(label) = n.checked_sub(1).and_then(|i| labels.get(i))
    {
        return Ok(label.clone());
    }
    labels
        .iter()
        .find(|l| l.eq_ignore_ascii_case(input))
        .cloned()
        .ok_or_else(|| StoreError::NotFound(format!("\"{}\" in the list", input)))
}

/// Settle the outcome of one menu action. Store errors, including lock
/// timeouts and partial writes, are shown and the menu carries on. Terminal
/// and line editor failures end the menu.
fn recover(outcome: MenuResult<()>) -> MenuResult<()> {
    let Err(e) = outcome else {
        return Ok(());
    };
    match e.downcast::<StoreError>() {
        Ok(err) => {
            if !err.is_rejection() {
                tracing::warn!(error = %err, "menu action failed");
            }
            eprintln!("error: {}", err);
            Ok(())
        }
        Err(other) => Err(other),
    }
}

pub fn run(tracker: &Tracker) -> MenuResult<()> {
    let mut menu = Menu {
        tracker,
        editor: DefaultEditor::new()?,
    };
    menu.run()
}

struct Menu<'a> {
    tracker: &'a Tracker,
    editor: DefaultEditor,
}

impl Menu<'_> {
    fn run(&mut self) -> MenuResult<()> {
        loop {
            clear_screen()?;
            println!("tally - {}\n", self.tracker.root.display());
            for (i, (_, label)) in MenuChoice::ALL.iter().enumerate() {
                println!("  {}. {}", i + 1, label);
            }
            println!();

            let Some(choice) = self.ask("> ", MenuChoice::parse)? else {
                return Ok(());
            };
            let outcome = match choice {
                MenuChoice::CreateYear => self.create_year(),
                MenuChoice::CreateTask => self.create_task(),
                MenuChoice::CreateMonth => self.create_month(),
                MenuChoice::AddEntry => self.add_entry(),
                MenuChoice::View => self.view(),
                MenuChoice::Delete => self.delete(),
                MenuChoice::Exit => return Ok(()),
            };
            recover(outcome)?;
            pause()?;
        }
    }

    /// Read one line. `None` when the user backs out with Ctrl-C or Ctrl-D.
    fn read(&mut self, prompt: &str) -> MenuResult<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if let Err(e) = self.editor.add_history_entry(line.as_str()) {
                    tracing::debug!(error = %e, "could not record history entry");
                }
                Ok(Some(line))
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Prompt until `f` accepts the answer. Rejections are shown and the
    /// same prompt is asked again; other errors end the action.
    fn ask<T>(
        &mut self,
        prompt: &str,
        mut f: impl FnMut(&str) -> Result<T, StoreError>,
    ) -> MenuResult<Option<T>> {
        loop {
            let Some(line) = self.read(prompt)? else {
                return Ok(None);
            };
            match f(&line) {
                Ok(v) => return Ok(Some(v)),
                Err(e) if e.is_rejection() => eprintln!("error: {}", e),
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Show a numbered listing and let the user pick one label. Blank input
    /// picks `default` when there is one.
    fn pick(&mut self, what: &str, listing: Listing, default: Option<&str>) -> MenuResult<Option<String>> {
        if listing.labels.is_empty() {
            return Err(StoreError::NotFound(format!("any {}", what)).into());
        }
        for line in format_listing(&listing) {
            println!("  {}", line);
        }
        let prompt = match default {
            Some(d) => format!("{} [{}]: ", what, d),
            None => format!("{}: ", what),
        };
        let labels = listing.labels;
        self.ask(&prompt, |input| match default {
            Some(d) if input.trim().is_empty() => Ok(d.to_string()),
            _ => choose_label(&labels, input),
        })
    }

    fn pick_year(&mut self) -> MenuResult<Option<String>> {
        let latest = year_ops::latest_year(self.tracker)?;
        let listing = navigate::year_view(self.tracker)?;
        self.pick("year", listing, latest.as_deref())
    }

    fn pick_task(&mut self, year: &str) -> MenuResult<Option<String>> {
        let listing = navigate::task_view(self.tracker, year)?;
        self.pick("task", listing, None)
    }

    fn pick_month(&mut self, year: &str, task: &str) -> MenuResult<Option<Month>> {
        let latest = month_ops::latest_month(self.tracker, year, task)?;
        let listing = navigate::month_view(self.tracker, year, task)?;
        let picked = self.pick("month", listing, latest.map(Month::as_str))?;
        Ok(picked.and_then(|label| Month::parse_label(&label)))
    }

    fn pick_year_task(&mut self) -> MenuResult<Option<(String, String)>> {
        let Some(year) = self.pick_year()? else {
            return Ok(None);
        };
        let Some(task) = self.pick_task(&year)? else {
            return Ok(None);
        };
        Ok(Some((year, task)))
    }

    // -----------------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------------

    fn create_year(&mut self) -> MenuResult<()> {
        let tracker = self.tracker;
        let suggested = year_ops::suggested_year(tracker)?.to_string();
        let prompt = format!("New year [{}]: ", suggested);
        if let Some(year) = self.ask(&prompt, |input| {
            let input = if input.trim().is_empty() { suggested.as_str() } else { input };
            year_ops::add_year(tracker, input)
        })? {
            println!("created year {}", year);
        }
        Ok(())
    }

    fn create_task(&mut self) -> MenuResult<()> {
        let tracker = self.tracker;
        let Some(year) = self.pick_year()? else {
            return Ok(());
        };
        if let Some(task) = self.ask("New task name: ", |input| task_ops::add_task(tracker, &year, input))? {
            println!("created task \"{}\" in {}", task, year);
        }
        Ok(())
    }

    fn create_month(&mut self) -> MenuResult<()> {
        let tracker = self.tracker;
        let Some((year, task)) = self.pick_year_task()? else {
            return Ok(());
        };
        let prompt = format!("Month ({}): ", Month::prompt_list());
        let Some(mut result) = self.ask(&prompt, |input| month_ops::add_month(tracker, &year, &task, input, None))? else {
            return Ok(());
        };

        if let AddMonth::NeedsHeader { month } = result {
            println!("{} is the first month of \"{}\". Name its columns as name[:kind],", month, task);
            println!("kinds: int, time, label, text (default). e.g. pages:int, hours:time, note");
            let Some(created) = self.ask("Columns: ", |input| {
                month_ops::add_month(tracker, &year, &task, month.as_str(), Some(input))
            })?
            else {
                return Ok(());
            };
            result = created;
        }

        if let AddMonth::Created { month, columns, .. } = result {
            let cols: Vec<String> = columns.iter().map(|c| format!("{}:{}", c.name, c.kind)).collect();
            println!("created {} with columns {}", month, cols.join(", "));
        }
        Ok(())
    }

    fn add_entry(&mut self) -> MenuResult<()> {
        let tracker = self.tracker;
        let Some((year, task)) = self.pick_year_task()? else {
            return Ok(());
        };
        let Some(month) = self.pick_month(&year, &task)? else {
            return Ok(());
        };

        let columns = month_ops::month_columns(tracker, &year, &task, month)?;
        let mut values = Vec::with_capacity(columns.len());
        for column in &columns {
            let prompt = format!("{} ({}): ", column.name, column.kind);
            let Some(value) = self.ask(&prompt, |input| {
                let input = input.trim();
                validate(input, column.kind)
                    .map(|()| input.to_string())
                    .map_err(StoreError::from)
            })?
            else {
                return Ok(());
            };
            values.push(value);
        }

        let added = entry_ops::add_entry(tracker, &year, &task, Some(month), values.as_slice())?;
        println!("added row {} to {}/{}/{}", added.row, year, task, added.month);
        Ok(())
    }

    fn view(&mut self) -> MenuResult<()> {
        let tracker = self.tracker;
        let Some((year, task)) = self.pick_year_task()? else {
            return Ok(());
        };
        let listing = navigate::month_view(tracker, &year, &task)?;
        if listing.labels.is_empty() {
            return Err(StoreError::NotFound(format!("any month in task \"{}\" ({})", task, year)).into());
        }
        for line in format_listing(&listing) {
            println!("  {}", line);
        }
        let labels = listing.labels;
        let Some(choice) = self.ask("month [all]: ", |input| {
            if input.trim().is_empty() {
                Ok(None)
            } else {
                choose_label(&labels, input).map(Some)
            }
        })?
        else {
            return Ok(());
        };

        println!();
        match choice.as_deref().and_then(Month::parse_label) {
            Some(month) => {
                let view = navigate::entries_view(tracker, &year, &task, month)?;
                for line in format_month_entries(&view) {
                    println!("{}", line);
                }
            }
            None => {
                let overview = navigate::task_overview(tracker, &year, &task)?;
                for view in &overview.months {
                    for line in format_month_entries(view) {
                        println!("{}", line);
                    }
                    println!();
                }
            }
        }
        Ok(())
    }

    fn delete(&mut self) -> MenuResult<()> {
        let tracker = self.tracker;
        let levels: Vec<String> = DELETE_LEVELS.iter().map(|s| s.to_string()).collect();
        let listing = Listing {
            scope: String::new(),
            labels: levels,
        };
        let Some(level) = self.pick("delete", listing, None)? else {
            return Ok(());
        };

        let Some(year) = self.pick_year()? else {
            return Ok(());
        };
        if level == "year" {
            if self.confirm(&format!("Delete year {} and everything under it?", year))? {
                year_ops::delete_year(tracker, &year)?;
                println!("deleted year {}", year);
            }
            return Ok(());
        }

        let Some(task) = self.pick_task(&year)? else {
            return Ok(());
        };
        if level == "task" {
            if self.confirm(&format!("Delete task \"{}\" and all of its months?", task))? {
                task_ops::delete_task(tracker, &year, &task)?;
                println!("deleted task \"{}\"", task);
            }
            return Ok(());
        }

        let Some(month) = self.pick_month(&year, &task)? else {
            return Ok(());
        };
        if level == "month" {
            if self.confirm(&format!("Delete {} and its entries?", month))? {
                month_ops::delete_month(tracker, &year, &task, month)?;
                println!("deleted {}", month);
            }
            return Ok(());
        }

        let view = navigate::entries_view(tracker, &year, &task, month)?;
        if view.table.is_empty() {
            return Err(StoreError::OutOfRange(format!("{} has no entries", month)).into());
        }
        for line in format_month_entries(&view) {
            println!("{}", line);
        }
        let Some(removed) = self.ask("row: ", |input| {
            let row: usize = input
                .trim()
                .parse()
                .map_err(|_| StoreError::InvalidFormat(format!("\"{}\" is not a row number", input.trim())))?;
            entry_ops::delete_month_row(tracker, &year, &task, month, row)
        })?
        else {
            return Ok(());
        };
        println!("deleted: {}", removed.join(", "));
        Ok(())
    }

    fn confirm(&mut self, prompt: &str) -> MenuResult<bool> {
        let answer = self.read(&format!("{} [y/n] ", prompt))?;
        Ok(answer.is_some_and(|a| a.trim().eq_ignore_ascii_case("y")))
    }
}

fn clear_screen() -> io::Result<()> {
    execute!(io::stdout(), Clear(ClearType::All), MoveTo(0, 0))
}

/// Wait for a single key press.
fn pause() -> io::Result<()> {
    print!("\nPress any key to continue...");
    io::stdout().flush()?;
    enable_raw_mode()?;
    let result = loop {
        match event::read() {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => break Ok(()),
            Ok(_) => {}
            Err(e) => break Err(e),
        }
    };
    disable_raw_mode()?;
    println!();
    result
}
