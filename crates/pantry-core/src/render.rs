use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::item::Item;
use crate::store::ListSummary;

/// One row of the list overview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRow {
    pub name: String,
    pub active: bool,
    pub summary: ListSummary,
}

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self {
            color: color && io::stdout().is_terminal(),
        })
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    /// `rows` pairs each item with its 1-based position in the unfiltered list.
    #[tracing::instrument(skip(self, rows))]
    pub fn print_item_table(&mut self, rows: &[(usize, Item)]) -> anyhow::Result<()> {
        self.write_item_table(io::stdout().lock(), rows)
    }

    #[tracing::instrument(skip(self, rows))]
    pub fn print_list_table(&mut self, rows: &[ListRow]) -> anyhow::Result<()> {
        self.write_list_table(io::stdout().lock(), rows)
    }

    pub fn write_item_table<W: Write>(&self, out: W, rows: &[(usize, Item)]) -> anyhow::Result<()> {
        let headers = vec![
            "#".to_string(),
            "ID".to_string(),
            "Done".to_string(),
            "Name".to_string(),
            "Category".to_string(),
        ];

        let table_rows = rows
            .iter()
            .map(|(position, item)| {
                let done = if item.completed { "[x]" } else { "[ ]" };
                let name = if item.completed {
                    self.paint(&item.name, "9")
                } else {
                    item.name.clone()
                };
                vec![
                    self.paint(&position.to_string(), "33"),
                    item.short_id().to_string(),
                    done.to_string(),
                    name,
                    item.category.clone().unwrap_or_default(),
                ]
            })
            .collect();

        write_table(out, headers, table_rows)
    }

    pub fn write_list_table<W: Write>(&self, out: W, rows: &[ListRow]) -> anyhow::Result<()> {
        let headers = vec![
            "".to_string(),
            "List".to_string(),
            "Items".to_string(),
            "Left".to_string(),
        ];

        let table_rows = rows
            .iter()
            .map(|row| {
                let marker = if row.active { self.paint("*", "32") } else { String::new() };
                vec![
                    marker,
                    row.name.clone(),
                    row.summary.total.to_string(),
                    row.summary.remaining.to_string(),
                ]
            })
            .collect();

        write_table(out, headers, table_rows)
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

pub fn items_left(summary: &ListSummary) -> String {
    format!("{} {} left", summary.remaining, plural(summary.remaining))
}

pub fn plural(count: usize) -> &'static str {
    if count == 1 { "item" } else { "items" }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for width in &widths {
        write!(writer, "{:-<width$} ", "", width = *width)?;
    }
    writeln!(writer)?;

    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::DEFAULT_LIST;

    #[test]
    fn item_table_aligns_wide_names() {
        let mut tea = Item::new("Matcha 抹茶", Some("drinks".to_string()), DEFAULT_LIST);
        tea.completed = true;
        let bread = Item::new("Bread", None, DEFAULT_LIST);

        let mut out = Vec::new();
        Renderer::plain()
            .write_item_table(&mut out, &[(1, tea.clone()), (2, bread.clone())])
            .expect("render");
        let text = String::from_utf8(out).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("# ID"));
        assert!(lines[2].contains("[x]  Matcha 抹茶 drinks"));
        assert!(lines[3].contains(&format!("2 {} [ ]  Bread", bread.short_id())));
    }

    #[test]
    fn painted_cells_do_not_skew_columns() {
        let colored = Renderer { color: true };
        let rows = vec![
            ListRow {
                name: "default".to_string(),
                active: true,
                summary: ListSummary {
                    total: 3,
                    remaining: 1,
                    completed: 2,
                },
            },
            ListRow {
                name: "Party".to_string(),
                active: false,
                summary: ListSummary::default(),
            },
        ];

        let mut out = Vec::new();
        colored.write_list_table(&mut out, &rows).expect("render");
        let text = String::from_utf8(out).expect("utf8");
        let lines: Vec<String> = text.lines().map(strip_ansi).collect();

        assert_eq!(lines[2], "* default 3     1    ");
        assert_eq!(lines[3], "  Party   0     0    ");
    }

    #[test]
    fn items_left_pluralizes() {
        let one = ListSummary {
            total: 2,
            remaining: 1,
            completed: 1,
        };
        assert_eq!(items_left(&one), "1 item left");
        assert_eq!(items_left(&ListSummary::default()), "0 items left");
    }
}
