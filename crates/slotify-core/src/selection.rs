//! Required/optional participant classification.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Selection errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectionError {
    /// The name is not part of the loaded participant list.
    #[error("unknown participant: {name}")]
    UnknownParticipant { name: String },
}

/// How a participant takes part in the meeting being planned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Unselected,
    /// Must be free for a slot to be offered.
    Required,
    /// Availability is reported per slot but not enforced.
    Optional,
}

impl Category {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unselected => "unselected",
            Self::Required => "required",
            Self::Optional => "optional",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-participant category over a fixed roster.
///
/// Each name maps to a single [`Category`], so a participant can never be
/// both required and optional: assigning one replaces the other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParticipantSelectionSet {
    roster: Vec<String>,
    categories: BTreeMap<String, Category>,
}

impl ParticipantSelectionSet {
    /// Creates an empty selection over the given participants.
    pub fn new(roster: Vec<String>) -> Self {
        Self {
            roster,
            categories: BTreeMap::new(),
        }
    }

    pub fn roster(&self) -> &[String] {
        &self.roster
    }

    pub fn category(&self, name: &str) -> Category {
        self.categories.get(name).copied().unwrap_or_default()
    }

    /// Checks or unchecks `category` for `name`.
    ///
    /// Checking replaces whatever category the participant had. Unchecking
    /// the participant's current category clears it; unchecking a category
    /// the participant does not hold changes nothing.
    pub fn set(
        &mut self,
        name: &str,
        category: Category,
        checked: bool,
    ) -> Result<Category, SelectionError> {
        self.ensure_known(name)?;

        let next = match (checked, category) {
            (true, Category::Required | Category::Optional) => category,
            (false, current) if current == self.category(name) => Category::Unselected,
            _ => self.category(name),
        };

        if next == Category::Unselected {
            self.categories.remove(name);
        } else {
            self.categories.insert(name.to_string(), next);
        }
        Ok(next)
    }

    /// Flips `category` for `name`: assigns it if not held, clears it if held.
    pub fn toggle(&mut self, name: &str, category: Category) -> Result<Category, SelectionError> {
        let checked = self.category(name) != category;
        self.set(name, category, checked)
    }

    /// Required participants in roster order.
    pub fn required_names(&self) -> Vec<&str> {
        self.names_in(Category::Required)
    }

    /// Optional participants in roster order.
    pub fn optional_names(&self) -> Vec<&str> {
        self.names_in(Category::Optional)
    }

    /// Clears every category, keeping the roster.
    pub fn clear(&mut self) {
        self.categories.clear();
    }

    fn names_in(&self, category: Category) -> Vec<&str> {
        self.roster
            .iter()
            .filter(|name| self.category(name) == category)
            .map(String::as_str)
            .collect()
    }

    fn ensure_known(&self, name: &str) -> Result<(), SelectionError> {
        if self.roster.iter().any(|known| known == name) {
            Ok(())
        } else {
            Err(SelectionError::UnknownParticipant {
                name: name.to_string(),
            })
        }
    }
}
