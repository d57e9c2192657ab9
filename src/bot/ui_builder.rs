//! UI Builder module for creating reply keyboards

use teloxide::types::{KeyboardButton, KeyboardMarkup};

use crate::catalog::{Catalog, BACK_CONTROL};

/// Reply keyboard with one button per row
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Keyboard {
    pub rows: Vec<Vec<String>>,
}

impl Keyboard {
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rows: labels.into_iter().map(|label| vec![label.into()]).collect(),
        }
    }

    pub fn with_back(mut self) -> Self {
        self.rows.push(vec![BACK_CONTROL.to_string()]);
        self
    }

    /// All labels, top to bottom
    pub fn labels(&self) -> Vec<&str> {
        self.rows.iter().flatten().map(String::as_str).collect()
    }

    pub fn to_markup(&self) -> KeyboardMarkup {
        let rows: Vec<Vec<KeyboardButton>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(KeyboardButton::new).collect())
            .collect();
        KeyboardMarkup::new(rows).resize_keyboard()
    }
}

/// Top-level language picker; the only keyboard without a back control
pub fn language_keyboard(catalog: &Catalog) -> Keyboard {
    Keyboard::from_labels(catalog.languages())
}

pub fn action_keyboard(catalog: &Catalog, language: &str) -> Keyboard {
    Keyboard::from_labels(
        catalog
            .action_buttons_for(language)
            .into_iter()
            .map(|button| button.label.as_str()),
    )
    .with_back()
}

pub fn category_keyboard(catalog: &Catalog, language: &str) -> Keyboard {
    Keyboard::from_labels(catalog.categories_for(language)).with_back()
}

pub fn dish_keyboard(catalog: &Catalog, category: &str, language: &str) -> Keyboard {
    Keyboard::from_labels(catalog.dish_titles_for(category, language)).with_back()
}

pub fn complaints_keyboard() -> Keyboard {
    Keyboard::default().with_back()
}
