use std::io::Write;
use std::path::Path;

use regex::Regex;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::tracker_io::open_tracker;
use crate::model::tracker::Tracker;
use crate::ops::month_ops::{self, AddMonth, parse_month};
use crate::ops::{StoreError, check, entry_ops, navigate, search, task_ops, year_ops};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;
    let tracker = load_tracker(cli.base_dir.as_deref())?;

    match cli.command {
        None => crate::cli::menu::run(&tracker),
        Some(cmd) => match cmd {
            Commands::Year(args) => cmd_year(&tracker, args, json),
            Commands::Task(args) => cmd_task(&tracker, args, json),
            Commands::Month(args) => cmd_month(&tracker, args, json),
            Commands::Entry(args) => cmd_entry(&tracker, args, json),
            Commands::Check => cmd_check(&tracker, json),
            Commands::Search(args) => cmd_search(&tracker, args, json),
        },
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Read the config file, apply a `-C` override, and bootstrap the base
/// directory. Failure here is fatal.
pub fn load_tracker(base_dir: Option<&str>) -> Result<Tracker, Box<dyn std::error::Error>> {
    let config = config_io::read_config()?;
    let tracker = open_tracker(config, base_dir.map(Path::new))?;
    Ok(tracker)
}

/// The year a scoped command acts in: the one given, or the most recently
/// registered year.
pub fn resolve_year(tracker: &Tracker, scope: &YearScope) -> Result<String, StoreError> {
    match scope.year.as_deref().map(str::trim) {
        Some(year) if !year.is_empty() => Ok(year.to_string()),
        _ => year_ops::latest_year(tracker)?.ok_or_else(|| {
            StoreError::NotFound("any year (create one with `tally year new`)".to_string())
        }),
    }
}

fn confirm(prompt: &str, yes: bool) -> Result<bool, std::io::Error> {
    if yes {
        return Ok(true);
    }
    eprint!("{} [y/n] ", prompt);
    std::io::stderr().flush()?;
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

fn print_json<T: serde::Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}

// ---------------------------------------------------------------------------
// Years
// ---------------------------------------------------------------------------

fn cmd_year(tracker: &Tracker, args: YearCmd, json: bool) -> CmdResult {
    match args.action {
        YearAction::New(args) => {
            let label = match args.year {
                Some(y) => y,
                None => year_ops::suggested_year(tracker)?.to_string(),
            };
            let year = year_ops::add_year(tracker, &label)?;
            if json {
                print_json(&CreatedJson {
                    created: &year,
                    path: tracker.layout().year_dir(&year).display().to_string(),
                })
            } else {
                println!("created year {}", year);
                Ok(())
            }
        }
        YearAction::List => {
            let view = navigate::year_view(tracker)?;
            if json {
                return print_json(&view);
            }
            if view.labels.is_empty() {
                eprintln!("no years yet (create one with `tally year new`)");
            }
            print_lines(format_listing(&view));
            Ok(())
        }
        YearAction::Rm(args) => {
            if !confirm(
                &format!("Delete year {} and everything under it?", args.year),
                args.yes,
            )? {
                println!("cancelled");
                return Ok(());
            }
            year_ops::delete_year(tracker, &args.year)?;
            if json {
                print_json(&DeletedJson {
                    deleted: args.year.trim(),
                    values: None,
                })
            } else {
                println!("deleted year {}", args.year.trim());
                Ok(())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

fn cmd_task(tracker: &Tracker, args: TaskCmd, json: bool) -> CmdResult {
    match args.action {
        TaskAction::New(args) => {
            let year = resolve_year(tracker, &args.scope)?;
            let task = task_ops::add_task(tracker, &year, &args.name)?;
            if json {
                print_json(&CreatedJson {
                    created: &task,
                    path: tracker.layout().task_dir(&year, &task).display().to_string(),
                })
            } else {
                println!("created task \"{}\" in {}", task, year);
                Ok(())
            }
        }
        TaskAction::List(scope) => {
            let year = resolve_year(tracker, &scope)?;
            let view = navigate::task_view(tracker, &year)?;
            if json {
                return print_json(&view);
            }
            println!("{}", year);
            print_lines(format_listing(&view));
            Ok(())
        }
        TaskAction::Rm(args) => {
            let year = resolve_year(tracker, &args.scope)?;
            if !confirm(
                &format!("Delete task \"{}\" ({}) and all of its months?", args.name, year),
                args.yes,
            )? {
                println!("cancelled");
                return Ok(());
            }
            let task = task_ops::delete_task(tracker, &year, &args.name)?;
            if json {
                print_json(&DeletedJson {
                    deleted: &task,
                    values: None,
                })
            } else {
                println!("deleted task \"{}\" from {}", task, year);
                Ok(())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Months
// ---------------------------------------------------------------------------

fn cmd_month(tracker: &Tracker, args: MonthCmd, json: bool) -> CmdResult {
    match args.action {
        MonthAction::New(args) => {
            let year = resolve_year(tracker, &args.scope)?;
            let task = args.task.trim().to_lowercase();
            let result =
                month_ops::add_month(tracker, &year, &task, &args.month, args.header.as_deref())?;
            if json {
                return print_json(&result);
            }
            match result {
                AddMonth::Created {
                    month,
                    columns,
                    inherited_from,
                    ignored_header,
                } => {
                    if ignored_header && let Some(source) = inherited_from {
                        eprintln!("note: --header ignored; columns copied from {}", source);
                    }
                    let cols = columns
                        .iter()
                        .map(|c| format!("{}:{}", c.name, c.kind))
                        .collect::<Vec<_>>()
                        .join(", ");
                    println!("created {} for \"{}\" ({}) with columns {}", month, task, year, cols);
                    Ok(())
                }
                AddMonth::NeedsHeader { month } => Err(format!(
                    "{} is the first month of \"{}\"; give its columns with --header, e.g. --header \"pages:int, hours:time, note\"",
                    month, task
                )
                .into()),
            }
        }
        MonthAction::List(args) => {
            let year = resolve_year(tracker, &args.scope)?;
            let view = navigate::month_view(tracker, &year, &args.task.trim().to_lowercase())?;
            if json {
                return print_json(&view);
            }
            println!("{}", view.scope);
            print_lines(format_listing(&view));
            Ok(())
        }
        MonthAction::Rm(args) => {
            let year = resolve_year(tracker, &args.scope)?;
            let task = args.task.trim().to_lowercase();
            let month = parse_month(&args.month)?;
            if !confirm(
                &format!("Delete {} of \"{}\" ({}) and its entries?", month, task, year),
                args.yes,
            )? {
                println!("cancelled");
                return Ok(());
            }
            month_ops::delete_month(tracker, &year, &task, month)?;
            if json {
                print_json(&DeletedJson {
                    deleted: month.as_str(),
                    values: None,
                })
            } else {
                println!("deleted {} from \"{}\" ({})", month, task, year);
                Ok(())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

fn cmd_entry(tracker: &Tracker, args: EntryCmd, json: bool) -> CmdResult {
    match args.action {
        EntryAction::Add(args) => {
            let year = resolve_year(tracker, &args.scope)?;
            let task = args.task.trim().to_lowercase();
            let month = args.month.as_deref().map(parse_month).transpose()?;
            let added = entry_ops::add_entry(tracker, &year, &task, month, args.values.as_slice())?;
            if json {
                print_json(&added)
            } else {
                println!("added row {} to {}/{}/{}", added.row, year, task, added.month);
                Ok(())
            }
        }
        EntryAction::List(args) => {
            let year = resolve_year(tracker, &args.scope)?;
            let task = args.task.trim().to_lowercase();
            match args.month.as_deref().map(parse_month).transpose()? {
                Some(month) => {
                    let view = navigate::entries_view(tracker, &year, &task, month)?;
                    if json {
                        return print_json(&view);
                    }
                    print_lines(format_month_entries(&view));
                }
                None => {
                    let overview = navigate::task_overview(tracker, &year, &task)?;
                    if json {
                        return print_json(&overview);
                    }
                    for (i, view) in overview.months.iter().enumerate() {
                        if i > 0 {
                            println!();
                        }
                        print_lines(format_month_entries(view));
                    }
                }
            }
            Ok(())
        }
        EntryAction::Rm(args) => {
            let year = resolve_year(tracker, &args.scope)?;
            let task = args.task.trim().to_lowercase();
            let month = parse_month(&args.month)?;
            if !confirm(
                &format!("Delete row {} of {}/{}/{}?", args.row, year, task, month),
                args.yes,
            )? {
                println!("cancelled");
                return Ok(());
            }
            let removed = entry_ops::delete_month_row(tracker, &year, &task, month, args.row)?;
            if json {
                let deleted = args.row.to_string();
                print_json(&DeletedJson {
                    deleted: &deleted,
                    values: Some(removed),
                })
            } else {
                println!(
                    "deleted row {} from {}/{}/{}: {}",
                    args.row,
                    year,
                    task,
                    month,
                    removed.join(", ")
                );
                Ok(())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Check and search
// ---------------------------------------------------------------------------

fn cmd_check(tracker: &Tracker, json: bool) -> CmdResult {
    let result = check::check_tracker(tracker);
    if json {
        print_json(&result)?;
    } else {
        print_lines(format_check(&result));
    }
    if !result.valid {
        return Err(format!("check found {} error(s)", result.errors.len()).into());
    }
    Ok(())
}

fn cmd_search(tracker: &Tracker, args: SearchArgs, json: bool) -> CmdResult {
    let re = Regex::new(&args.pattern)?;
    let hits = search::search_entries(tracker, &re, args.year.as_deref())?;
    if json {
        let hits: Vec<SearchHitJson> = hits.iter().map(hit_to_json).collect();
        return print_json(&hits);
    }
    for hit in &hits {
        println!("{}", format_hit(hit));
    }
    Ok(())
}
