use anyhow::Result;
use std::io::Write;
use tempfile::NamedTempFile;

use bar_bot::catalog::{ActionKind, Catalog};
use bar_bot::errors::BotError;

const FIXTURE: &str = include_str!("fixtures/catalog.json");

fn catalog() -> Catalog {
    Catalog::from_json(FIXTURE).expect("fixture catalog is valid")
}

#[test]
fn test_load_from_file() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    file.write_all(FIXTURE.as_bytes())?;

    let catalog = Catalog::load(file.path())?;
    assert_eq!(catalog.languages(), vec!["EN", "RU"]);

    Ok(())
}

#[test]
fn test_load_missing_file() {
    let result = Catalog::load("/nonexistent/catalog.json");
    assert!(matches!(result, Err(BotError::Catalog(_))));
}

#[test]
fn test_language_lookups() {
    let catalog = catalog();

    let language = catalog.language_by_label("RU").unwrap();
    assert_eq!(language.code, "ru");
    assert_eq!(catalog.language("en").unwrap().name, "EN");
    assert!(catalog.language_by_label("ru").is_none());
}

#[test]
fn test_action_button_lookups() {
    let catalog = catalog();

    let labels: Vec<&str> = catalog
        .action_buttons_for("en")
        .iter()
        .map(|b| b.label.as_str())
        .collect();
    assert_eq!(labels, vec!["Menu", "Complaints"]);

    let menu_labels: Vec<&str> = catalog
        .action_buttons_by_kind(ActionKind::Menu)
        .iter()
        .map(|b| b.label.as_str())
        .collect();
    assert_eq!(menu_labels, vec!["Menu", "Меню"]);

    assert_eq!(
        catalog.resolve_action_kind("Жалобы"),
        Some(ActionKind::ComplaintsAndSuggestions)
    );
    assert_eq!(catalog.resolve_action_kind("Drinks"), None);
    assert_eq!(catalog.button_label_for(ActionKind::Menu, "ru"), Some("Меню"));
    assert_eq!(catalog.button_label_for(ActionKind::Other, "ru"), None);
}

#[test]
fn test_menu_lookups() {
    let catalog = catalog();

    assert_eq!(catalog.categories_for("en"), vec!["Drinks", "Food"]);
    assert_eq!(catalog.dish_titles_for("Food", "en"), vec!["Burger"]);
    assert!(catalog.dish_titles_for("Food", "ru").is_empty());

    let dish = catalog.dish_for("Lemonade", "en").unwrap();
    assert_eq!(dish.image.as_deref(), Some("lemonade.jpg"));
    assert!(catalog.dish_for("Espresso", "en").unwrap().image.is_none());
    assert!(catalog.dish_for("Lemonade", "ru").is_none());

    assert!(catalog.is_category("Еда"));
    assert!(catalog.is_dish_title("Бургер"));
    assert!(!catalog.is_dish_title("Pizza"));
}

#[test]
fn test_message_lookup() {
    let catalog = catalog();

    assert_eq!(
        catalog.message_for("choose_dish", "ru").unwrap(),
        "Выберите блюдо"
    );
    assert!(matches!(
        catalog.message_for("welcome", "en"),
        Err(BotError::MissingMessage { .. })
    ));
}

#[test]
fn test_shipped_catalog_is_valid() {
    assert!(Catalog::load("data/catalog.json").is_ok());
}
