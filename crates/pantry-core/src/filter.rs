use std::str::FromStr;

use anyhow::anyhow;

use crate::item::Item;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum View {
  #[default]
  All,
  Active,
  Completed
}

impl View {
  pub fn admits(
    self,
    item: &Item
  ) -> bool {
    match self {
      | View::All => true,
      | View::Active => !item.completed,
      | View::Completed => item.completed
    }
  }
}

impl FromStr for View {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    match s
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "all" => Ok(View::All),
      | "active" | "pending" => {
        Ok(View::Active)
      }
      | "completed" | "done" => {
        Ok(View::Completed)
      }
      | other => Err(anyhow!(
        "unknown view: {other}"
      ))
    }
  }
}

/// Narrows a list to one view and an optional search text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFilter {
  pub view:  View,
  query:     Option<String>
}

impl ItemFilter {
  pub fn new(view: View) -> Self {
    Self {
      view,
      query: None
    }
  }

  /// Blank text clears the search.
  pub fn with_query(
    mut self,
    text: &str
  ) -> Self {
    let text = text.trim();
    self.query = if text.is_empty() {
      None
    } else {
      Some(text.to_lowercase())
    };
    self
  }

  pub fn query(&self) -> Option<&str> {
    self.query.as_deref()
  }

  /// Parses front-end terms: an optional leading view word, then search words.
  pub fn parse(
    terms: &[String]
  ) -> Self {
    let mut rest = terms;
    let mut view = View::All;
    if let Some(first) = terms.first()
      && let Ok(parsed) =
        first.parse::<View>()
    {
      view = parsed;
      rest = &terms[1..];
    }

    Self::new(view)
      .with_query(&rest.join(" "))
  }

  pub fn matches(
    &self,
    item: &Item
  ) -> bool {
    if !self.view.admits(item) {
      return false;
    }

    let Some(query) = self.query.as_deref()
    else {
      return true;
    };

    item.name.to_lowercase().contains(query)
      || item
        .category
        .as_deref()
        .map(|category| {
          category
            .to_lowercase()
            .contains(query)
        })
        .unwrap_or(false)
  }
}

#[cfg(test)]
mod tests {
  use super::{
    ItemFilter,
    View
  };
  use crate::item::{
    DEFAULT_LIST,
    Item
  };

  fn item(
    name: &str,
    category: Option<&str>,
    completed: bool
  ) -> Item {
    let mut item = Item::new(
      name,
      category.map(str::to_string),
      DEFAULT_LIST
    );
    item.completed = completed;
    item
  }

  #[test]
  fn views_split_on_completion() {
    let open = item("Milk", None, false);
    let done = item("Eggs", None, true);

    assert!(View::All.admits(&open));
    assert!(View::All.admits(&done));
    assert!(View::Active.admits(&open));
    assert!(!View::Active.admits(&done));
    assert!(View::Completed.admits(&done));
    assert!(!View::Completed.admits(&open));
  }

  #[test]
  fn search_is_case_insensitive_over_name_and_category()
   {
    let cheese =
      item("Cheddar", Some("Dairy"), false);
    let filter =
      ItemFilter::new(View::All)
        .with_query("dair");
    assert!(filter.matches(&cheese));

    let filter =
      ItemFilter::new(View::All)
        .with_query("CHED");
    assert!(filter.matches(&cheese));

    let filter =
      ItemFilter::new(View::Completed)
        .with_query("ched");
    assert!(!filter.matches(&cheese));
  }

  #[test]
  fn parse_takes_optional_leading_view() {
    let terms = vec![
      "done".to_string(),
      "green".to_string(),
      "tea".to_string(),
    ];
    let filter = ItemFilter::parse(&terms);
    assert_eq!(filter.view, View::Completed);
    assert_eq!(filter.query(), Some("green tea"));

    let terms = vec!["Apples".to_string()];
    let filter = ItemFilter::parse(&terms);
    assert_eq!(filter.view, View::All);
    assert_eq!(filter.query(), Some("apples"));

    assert_eq!(
      ItemFilter::parse(&[]),
      ItemFilter::default()
    );
  }
}
