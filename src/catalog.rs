//! # Catalog Module
//!
//! Read-only tables exported from the venue spreadsheet: languages, action
//! buttons, menu categories, dishes and bot prompts. The conversation
//! controller routes purely on literal label equality against these tables,
//! so loading validates that every label is unambiguous.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::errors::{BotError, BotResult};

/// Literal keyboard label of the back control
pub const BACK_CONTROL: &str = "↩";

/// Semantic purpose of an action button, independent of its localized label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionKind {
    Menu,
    ComplaintsAndSuggestions,
    /// Any other action; shown on the keyboard but never routed
    Other,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Menu => "menu",
            ActionKind::ComplaintsAndSuggestions => "complaints_and_suggestions",
            ActionKind::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "menu" => ActionKind::Menu,
            "complaints_and_suggestions" => ActionKind::ComplaintsAndSuggestions,
            _ => ActionKind::Other,
        }
    }
}

impl From<String> for ActionKind {
    fn from(value: String) -> Self {
        ActionKind::parse(&value)
    }
}

impl From<ActionKind> for String {
    fn from(kind: ActionKind) -> Self {
        kind.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub code: String,
    /// Label shown on the language picker
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionButton {
    pub label: String,
    pub action: ActionKind,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DishEntry {
    pub title: String,
    pub category: String,
    pub language: String,
    /// HTML-formatted description sent to the user
    pub text: String,
    /// Image store reference, if the dish has a photo
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEntry {
    pub key: String,
    pub language: String,
    pub text: String,
}

/// Raw tables as exported from the spreadsheet
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogTables {
    #[serde(default)]
    pub languages: Vec<Language>,
    #[serde(default)]
    pub action_buttons: Vec<ActionButton>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub dishes: Vec<DishEntry>,
    #[serde(default)]
    pub messages: Vec<MessageEntry>,
}

/// Validated, immutable catalog
#[derive(Debug, Clone)]
pub struct Catalog {
    tables: CatalogTables,
}

impl Catalog {
    /// Validate tables and build the catalog
    pub fn new(tables: CatalogTables) -> BotResult<Self> {
        validate(&tables)?;
        Ok(Self { tables })
    }

    /// Parse and validate a JSON export
    pub fn from_json(content: &str) -> BotResult<Self> {
        let tables: CatalogTables = serde_json::from_str(content)
            .map_err(|e| BotError::Catalog(format!("Invalid catalog JSON: {e}")))?;
        Self::new(tables)
    }

    /// Load the catalog export from disk
    pub fn load(path: impl AsRef<Path>) -> BotResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            BotError::Catalog(format!("Failed to read catalog {}: {e}", path.display()))
        })?;
        let catalog = Self::from_json(&content)?;
        info!(
            path = %path.display(),
            languages = catalog.tables.languages.len(),
            buttons = catalog.tables.action_buttons.len(),
            categories = catalog.tables.categories.len(),
            dishes = catalog.tables.dishes.len(),
            "Catalog loaded"
        );
        Ok(catalog)
    }

    /// Language picker labels, in catalog order
    pub fn languages(&self) -> Vec<&str> {
        self.tables.languages.iter().map(|l| l.name.as_str()).collect()
    }

    pub fn language_by_label(&self, label: &str) -> Option<&Language> {
        self.tables.languages.iter().find(|l| l.name == label)
    }

    pub fn language(&self, code: &str) -> Option<&Language> {
        self.tables.languages.iter().find(|l| l.code == code)
    }

    pub fn action_buttons_for(&self, language: &str) -> Vec<&ActionButton> {
        self.tables
            .action_buttons
            .iter()
            .filter(|b| b.language == language)
            .collect()
    }

    pub fn action_buttons_by_kind(&self, kind: ActionKind) -> Vec<&ActionButton> {
        self.tables
            .action_buttons
            .iter()
            .filter(|b| b.action == kind)
            .collect()
    }

    pub fn resolve_action_kind(&self, label: &str) -> Option<ActionKind> {
        self.tables
            .action_buttons
            .iter()
            .find(|b| b.label == label)
            .map(|b| b.action)
    }

    /// Label of the button with the given kind in the given language
    pub fn button_label_for(&self, kind: ActionKind, language: &str) -> Option<&str> {
        self.tables
            .action_buttons
            .iter()
            .find(|b| b.action == kind && b.language == language)
            .map(|b| b.label.as_str())
    }

    pub fn is_category(&self, label: &str) -> bool {
        self.tables.categories.iter().any(|c| c.name == label)
    }

    pub fn categories_for(&self, language: &str) -> Vec<&str> {
        self.tables
            .categories
            .iter()
            .filter(|c| c.language == language)
            .map(|c| c.name.as_str())
            .collect()
    }

    pub fn is_dish_title(&self, label: &str) -> bool {
        self.tables.dishes.iter().any(|d| d.title == label)
    }

    pub fn dish_titles_for(&self, category: &str, language: &str) -> Vec<&str> {
        self.tables
            .dishes
            .iter()
            .filter(|d| d.category == category && d.language == language)
            .map(|d| d.title.as_str())
            .collect()
    }

    pub fn dish_for(&self, title: &str, language: &str) -> Option<&DishEntry> {
        self.tables
            .dishes
            .iter()
            .find(|d| d.title == title && d.language == language)
    }

    /// Bot prompt text; a miss is a catalog defect
    pub fn message_for(&self, key: &str, language: &str) -> BotResult<&str> {
        self.tables
            .messages
            .iter()
            .find(|m| m.key == key && m.language == language)
            .map(|m| m.text.as_str())
            .ok_or_else(|| BotError::MissingMessage {
                key: key.to_string(),
                language: language.to_string(),
            })
    }
}

fn validate(tables: &CatalogTables) -> BotResult<()> {
    let codes: HashSet<&str> = tables.languages.iter().map(|l| l.code.as_str()).collect();
    if codes.len() != tables.languages.len() {
        return Err(BotError::Catalog("Duplicate language code".to_string()));
    }

    let check_language = |language: &str, what: &str| {
        if codes.contains(language) {
            Ok(())
        } else {
            Err(BotError::Catalog(format!(
                "{what} references unknown language '{language}'"
            )))
        }
    };

    let mut owners = LabelOwners::default();

    let mut language_labels = HashSet::new();
    for language in &tables.languages {
        if !language_labels.insert(language.name.as_str()) {
            return Err(BotError::Catalog(format!(
                "Duplicate language label '{}'",
                language.name
            )));
        }
        owners.claim(&language.name, "language")?;
    }

    let mut button_kinds: HashMap<&str, ActionKind> = HashMap::new();
    let mut buttons = HashSet::new();
    for button in &tables.action_buttons {
        check_language(&button.language, "Action button")?;
        if !buttons.insert((button.language.as_str(), button.label.as_str())) {
            return Err(BotError::Catalog(format!(
                "Duplicate action button '{}' for language '{}'",
                button.label, button.language
            )));
        }
        if let Some(kind) = button_kinds.insert(button.label.as_str(), button.action) {
            if kind != button.action {
                return Err(BotError::Catalog(format!(
                    "Action button '{}' maps to both {} and {}",
                    button.label,
                    kind.as_str(),
                    button.action.as_str()
                )));
            }
        }
        owners.claim(&button.label, "action button")?;
    }

    let mut categories = HashSet::new();
    for category in &tables.categories {
        check_language(&category.language, "Category")?;
        if !categories.insert((category.language.as_str(), category.name.as_str())) {
            return Err(BotError::Catalog(format!(
                "Duplicate category '{}' for language '{}'",
                category.name, category.language
            )));
        }
        owners.claim(&category.name, "category")?;
    }

    let mut dishes = HashSet::new();
    for dish in &tables.dishes {
        check_language(&dish.language, "Dish")?;
        if !categories.contains(&(dish.language.as_str(), dish.category.as_str())) {
            return Err(BotError::Catalog(format!(
                "Dish '{}' references unknown category '{}' for language '{}'",
                dish.title, dish.category, dish.language
            )));
        }
        if !dishes.insert((dish.language.as_str(), dish.title.as_str())) {
            return Err(BotError::Catalog(format!(
                "Duplicate dish title '{}' for language '{}'",
                dish.title, dish.language
            )));
        }
        owners.claim(&dish.title, "dish")?;
    }

    let mut messages = HashSet::new();
    for message in &tables.messages {
        check_language(&message.language, "Message")?;
        if !messages.insert((message.key.as_str(), message.language.as_str())) {
            return Err(BotError::Catalog(format!(
                "Duplicate message '{}' for language '{}'",
                message.key, message.language
            )));
        }
    }

    Ok(())
}

/// Which catalog each label routes to
#[derive(Default)]
struct LabelOwners<'a> {
    owners: HashMap<&'a str, &'static str>,
}

impl<'a> LabelOwners<'a> {
    fn claim(&mut self, label: &'a str, owner: &'static str) -> BotResult<()> {
        if label == BACK_CONTROL {
            return Err(BotError::Catalog(format!(
                "{owner} label '{label}' collides with the back control"
            )));
        }
        match self.owners.insert(label, owner) {
            Some(existing) if existing != owner => Err(BotError::Catalog(format!(
                "Label '{label}' is used as both {existing} and {owner}"
            ))),
            _ => Ok(()),
        }
    }
}
