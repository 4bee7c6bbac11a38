use anyhow::{Context, anyhow};
use tracing::{debug, info, instrument, warn};

use crate::cli::Invocation;
use crate::config::Config;
use crate::filter::{ItemFilter, View};
use crate::item::Item;
use crate::render::{ListRow, Renderer, items_left, plural};
use crate::session::Session;
use crate::storage::Storage;

pub fn known_command_names() -> Vec<&'static str> {
    vec![
        "add",
        "show",
        "toggle",
        "edit",
        "delete",
        "clear",
        "empty",
        "complete",
        "copy",
        "lists",
        "_commands",
        "_show",
        "help",
        "version",
    ]
}

const LIST_SUBCOMMANDS: &[&str] = &["create", "rename", "delete"];

pub fn expand_command_abbrev<'a>(token: &'a str, known: &[&'a str]) -> Option<&'a str> {
    if known.contains(&token) {
        return Some(token);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

#[instrument(skip(session, cfg, renderer, inv))]
pub fn dispatch<S: Storage + Clone>(
    session: &mut Session<S>,
    cfg: &Config,
    renderer: &mut Renderer,
    inv: Invocation,
) -> anyhow::Result<()> {
    let list = inv.list.as_str();
    let args = inv.command_args.as_slice();

    debug!(command = %inv.command, list, ?args, "dispatching command");

    match inv.command.as_str() {
        "add" => cmd_add(session, list, args),
        "show" => cmd_show(session, renderer, list, args),
        "toggle" => cmd_toggle(session, list, args),
        "edit" => cmd_edit(session, list, args),
        "delete" => cmd_delete(session, list, args),
        "clear" => cmd_clear(session, list),
        "empty" => cmd_empty(session, list),
        "complete" => cmd_complete(session, list),
        "copy" => cmd_copy(session, list, args),
        "lists" => cmd_lists(session, renderer, list, args),
        "_commands" => {
            for name in known_command_names() {
                println!("{name}");
            }
            Ok(())
        }
        "_show" => cmd_show_config(cfg),
        "help" => cmd_help(),
        "version" => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => Err(anyhow!("unknown command: {other}")),
    }
}

/// Name words plus an optional `category:` / `cat:` modifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemWords {
    pub name: String,
    /// `None` when no modifier was given; `Some("")` clears the category.
    pub category: Option<String>,
}

pub fn parse_item_words(words: &[String]) -> ItemWords {
    let mut name_parts = Vec::with_capacity(words.len());
    let mut category = None;

    for word in words {
        let modifier = word
            .strip_prefix("category:")
            .or_else(|| word.strip_prefix("cat:"));
        match modifier {
            Some(value) => category = Some(value.trim().to_string()),
            None => name_parts.push(word.as_str()),
        }
    }

    ItemWords {
        name: name_parts.join(" ").trim().to_string(),
        category,
    }
}

/// Finds an item of `list` by 1-based position or by unique id prefix.
pub fn resolve_item<S: Storage + Clone>(
    session: &Session<S>,
    list: &str,
    reference: &str,
) -> anyhow::Result<Item> {
    let items = session.store().items_for(list);
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(anyhow!("expected an item position or id"));
    }

    if let Ok(position) = reference.parse::<usize>()
        && (1..=items.len()).contains(&position)
    {
        return Ok(items[position - 1].clone());
    }

    let mut matches = items.iter().filter(|item| item.id.starts_with(reference));
    match (matches.next(), matches.next()) {
        (Some(item), None) => Ok(item.clone()),
        (Some(_), Some(_)) => Err(anyhow!("item reference {reference} is ambiguous in list {list}")),
        (None, _) => Err(anyhow!("no item matches {reference} in list {list}")),
    }
}

fn require_known_list<S: Storage + Clone>(session: &Session<S>, list: &str) -> anyhow::Result<()> {
    if session.is_known_list(list) {
        return Ok(());
    }
    Err(anyhow!(
        "no list named {list}; create it with `pantry lists create {list}`"
    ))
}

#[instrument(skip(session, args))]
fn cmd_add<S: Storage + Clone>(session: &mut Session<S>, list: &str, args: &[String]) -> anyhow::Result<()> {
    require_known_list(session, list)?;
    let words = parse_item_words(args);
    if words.name.is_empty() {
        return Err(anyhow!("nothing to add: item name is empty"));
    }

    session
        .store_mut()
        .add(list, &words.name, words.category.as_deref());
    info!(list, name = %words.name, "added item");
    println!("Added \"{}\" to {list}.", words.name);
    Ok(())
}

#[instrument(skip(session, renderer, args))]
fn cmd_show<S: Storage + Clone>(
    session: &Session<S>,
    renderer: &mut Renderer,
    list: &str,
    args: &[String],
) -> anyhow::Result<()> {
    if !session.is_known_list(list) {
        warn!(list, "showing a list that is not registered");
    }

    let filter = ItemFilter::parse(args);
    let rows: Vec<(usize, Item)> = session
        .store()
        .items_for(list)
        .into_iter()
        .enumerate()
        .filter(|(_, item)| filter.matches(item))
        .map(|(idx, item)| (idx + 1, item))
        .collect();

    let summary = session.store().summary(list);
    if rows.is_empty() {
        println!("{}", empty_message(summary.total, &filter));
    } else {
        renderer.print_item_table(&rows)?;
    }

    if summary.total > 0 {
        println!();
        println!("{}", items_left(&summary));
    }
    Ok(())
}

fn empty_message(total: usize, filter: &ItemFilter) -> String {
    if total == 0 {
        return "Your shopping list is empty. Add some items!".to_string();
    }
    if let Some(query) = filter.query() {
        return format!("No items match \"{query}\".");
    }
    match filter.view {
        View::Completed => "No completed items yet.".to_string(),
        View::Active => "No active items. Everything's done!".to_string(),
        View::All => "Your shopping list is empty. Add some items!".to_string(),
    }
}

fn single_reference<'a>(command: &str, args: &'a [String]) -> anyhow::Result<&'a str> {
    match args {
        [reference] => Ok(reference.as_str()),
        _ => Err(anyhow!("usage: pantry {command} <position|id>")),
    }
}

#[instrument(skip(session, args))]
fn cmd_toggle<S: Storage + Clone>(session: &mut Session<S>, list: &str, args: &[String]) -> anyhow::Result<()> {
    let item = resolve_item(session, list, single_reference("toggle", args)?)?;
    session.store_mut().toggle(&item.id);

    let state = if item.completed { "not done" } else { "done" };
    println!("Marked \"{}\" as {state}.", item.name);
    Ok(())
}

#[instrument(skip(session, args))]
fn cmd_edit<S: Storage + Clone>(session: &mut Session<S>, list: &str, args: &[String]) -> anyhow::Result<()> {
    let (reference, rest) = args
        .split_first()
        .ok_or_else(|| anyhow!("usage: pantry edit <position|id> <name> [category:X]"))?;
    let item = resolve_item(session, list, reference)?;

    let words = parse_item_words(rest);
    let name = if words.name.is_empty() {
        item.name.clone()
    } else {
        words.name
    };
    let category = match words.category {
        Some(category) => Some(category),
        None => item.category.clone(),
    };

    session
        .store_mut()
        .edit(&item.id, &name, category.as_deref());
    println!("Updated \"{name}\".");
    Ok(())
}

#[instrument(skip(session, args))]
fn cmd_delete<S: Storage + Clone>(session: &mut Session<S>, list: &str, args: &[String]) -> anyhow::Result<()> {
    let item = resolve_item(session, list, single_reference("delete", args)?)?;
    session.store_mut().delete(&item.id);
    println!("{} has been removed from your list.", item.name);
    Ok(())
}

#[instrument(skip(session))]
fn cmd_clear<S: Storage + Clone>(session: &mut Session<S>, list: &str) -> anyhow::Result<()> {
    let completed = session.store().summary(list).completed;
    if completed == 0 {
        println!("No completed items to remove.");
        return Ok(());
    }

    session.store_mut().clear_completed(list);
    println!("Removed {completed} completed {}.", plural(completed));
    Ok(())
}

#[instrument(skip(session))]
fn cmd_empty<S: Storage + Clone>(session: &mut Session<S>, list: &str) -> anyhow::Result<()> {
    let total = session.store().summary(list).total;
    session.store_mut().clear_list(list);
    println!("Removed {total} {} from {list}.", plural(total));
    Ok(())
}

#[instrument(skip(session))]
fn cmd_complete<S: Storage + Clone>(session: &mut Session<S>, list: &str) -> anyhow::Result<()> {
    let remaining = session.store().summary(list).remaining;
    if remaining == 0 {
        println!("Nothing left to complete.");
        return Ok(());
    }

    session.store_mut().complete_all(list);
    println!("Marked {remaining} {} as complete.", plural(remaining));
    Ok(())
}

#[instrument(skip(session, args))]
fn cmd_copy<S: Storage + Clone>(session: &mut Session<S>, list: &str, args: &[String]) -> anyhow::Result<()> {
    let target = args.join(" ");
    let target = target.trim();
    if target.is_empty() {
        return Err(anyhow!("usage: pantry copy <target list>"));
    }
    if target == list {
        return Err(anyhow!("cannot copy {list} onto itself"));
    }
    require_known_list(session, target)?;

    let count = session.store().summary(list).total;
    session.store_mut().copy(list, target);
    println!("Copied {count} {} from {list} to {target}.", plural(count));
    Ok(())
}

#[instrument(skip(session, renderer, args))]
fn cmd_lists<S: Storage + Clone>(
    session: &mut Session<S>,
    renderer: &mut Renderer,
    active: &str,
    args: &[String],
) -> anyhow::Result<()> {
    let Some((sub, rest)) = args.split_first() else {
        return print_lists(session, renderer, active);
    };

    let sub = expand_command_abbrev(sub, LIST_SUBCOMMANDS)
        .ok_or_else(|| anyhow!("unknown lists subcommand: {sub}"))?;

    match sub {
        "create" => {
            let name = session
                .create_list(&rest.join(" "))
                .context("could not create list")?;
            println!("List \"{name}\" created.");
        }
        "rename" => {
            let [old, new] = rest else {
                return Err(anyhow!("usage: pantry lists rename <old> <new>"));
            };
            let name = session
                .rename_list(old, new)
                .context("could not rename list")?;
            println!("List renamed to \"{name}\".");
            if let Some(note) = rename_note(session, old, &name) {
                println!("{note}");
            }
        }
        "delete" => {
            let name = rest.join(" ");
            let name = name.trim();
            if !session.delete_list(name) {
                return Err(anyhow!("no list named {name}"));
            }
            println!("List \"{name}\" deleted.");

            let left_behind = session.store().summary(name).total;
            if left_behind > 0 {
                println!(
                    "Note: {left_behind} {} remain filed under \"{name}\"; \
                     run `pantry -l \"{name}\" empty` to remove them.",
                    plural(left_behind)
                );
            }
        }
        other => return Err(anyhow!("unknown lists subcommand: {other}")),
    }

    Ok(())
}

/// Items keep their list id across a rename, so they stay under `old`.
fn rename_note<S: Storage + Clone>(session: &Session<S>, old: &str, new: &str) -> Option<String> {
    if old == new {
        return None;
    }
    let left_behind = session.store().summary(old).total;
    (left_behind > 0).then(|| {
        format!(
            "Note: {left_behind} {} remain filed under \"{old}\".",
            plural(left_behind)
        )
    })
}

fn print_lists<S: Storage + Clone>(
    session: &Session<S>,
    renderer: &mut Renderer,
    active: &str,
) -> anyhow::Result<()> {
    let rows: Vec<ListRow> = session
        .list_ids()
        .into_iter()
        .map(|name| ListRow {
            active: name == active,
            summary: session.store().summary(&name),
            name,
        })
        .collect();
    renderer.print_list_table(&rows)?;

    let orphans = session.orphaned_list_ids();
    if !orphans.is_empty() {
        println!();
        println!("Unlisted item groups: {}", orphans.join(", "));
    }
    Ok(())
}

fn cmd_show_config(cfg: &Config) -> anyhow::Result<()> {
    for (key, value) in cfg.iter() {
        println!("{key}={value}");
    }
    for file in &cfg.loaded_files {
        println!("# loaded {}", file.display());
    }
    Ok(())
}

fn cmd_help() -> anyhow::Result<()> {
    println!(
        "usage: pantry [-v|-q] [--data DIR] [--pantryrc FILE] [--rc KEY=VALUE] [-l LIST] <command> [args]

commands:
  add <name> [category:X]          add an item to the list
  show [all|active|completed] [q]  show the list, optionally filtered
  toggle <ref>                     flip an item between open and done
  edit <ref> [name] [category:X]   rename an item or change its category
  delete <ref>                     remove an item
  clear                            remove completed items
  empty                            remove every item of the list
  complete                         mark every item done
  copy <list>                      copy every item into another list
  lists [create|rename|delete]     show or manage lists

<ref> is a position from `show` or a prefix of the item id."
    );
    Ok(())
}
