use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{Cents, CatalogError};

/// A dish on the menu with its unit price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub name: String,
    pub price_cents: Cents,
}

impl MenuItem {
    pub fn new(name: impl Into<String>, price_cents: Cents) -> Self {
        Self {
            name: name.into(),
            price_cents,
        }
    }
}

/// The immutable menu: dish name -> unit price, in menu order.
///
/// A catalog is built once at startup and never mutated. Every name is
/// non-blank and unique, and every price is strictly positive.
#[derive(Debug, Clone)]
pub struct Catalog {
    items: Vec<MenuItem>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog, validating the menu invariants.
    /// Names are trimmed before they are checked and stored.
    pub fn new(items: Vec<MenuItem>) -> Result<Self, CatalogError> {
        if items.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut validated = Vec::with_capacity(items.len());
        let mut index = HashMap::with_capacity(items.len());

        for (position, item) in items.into_iter().enumerate() {
            let name = item.name.trim().to_string();
            if name.is_empty() {
                return Err(CatalogError::BlankName {
                    position: position + 1,
                });
            }
            if item.price_cents <= 0 {
                return Err(CatalogError::NonPositivePrice {
                    name,
                    price_cents: item.price_cents,
                });
            }
            if index.contains_key(&name) {
                return Err(CatalogError::DuplicateItem(name));
            }
            index.insert(name.clone(), validated.len());
            validated.push(MenuItem::new(name, item.price_cents));
        }

        Ok(Self {
            items: validated,
            index,
        })
    }

    /// The menu used when no menu file is given.
    pub fn default_menu() -> Self {
        let items = vec![
            MenuItem::new("braised pork", 2800),
            MenuItem::new("steamed fish", 3200),
            MenuItem::new("kung pao chicken", 4500),
            MenuItem::new("rice", 200),
            MenuItem::new("salad", 500),
            MenuItem::new("soup", 1500),
            MenuItem::new("seafood platter", 8800),
        ];
        Self::new(items).expect("built-in menu is valid")
    }

    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&MenuItem> {
        self.index.get(name).map(|&i| &self.items[i])
    }

    pub fn price_of(&self, name: &str) -> Option<Cents> {
        self.get(name).map(|item| item.price_cents)
    }

    /// Select a dish by its 1-based menu number.
    pub fn by_number(&self, number: usize) -> Option<&MenuItem> {
        number.checked_sub(1).and_then(|i| self.items.get(i))
    }

    /// Resolve what a clerk typed: a menu number or an exact dish name.
    pub fn resolve(&self, token: &str) -> Option<&MenuItem> {
        let token = token.trim();
        if let Some(item) = self.get(token) {
            return Some(item);
        }
        token
            .parse::<usize>()
            .ok()
            .and_then(|number| self.by_number(number))
    }

    /// Case-insensitive substring search, in menu order.
    pub fn search(&self, query: &str) -> Vec<&MenuItem> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }
        self.items
            .iter()
            .filter(|item| item.name.to_lowercase().contains(&query))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_lookup() {
        let catalog = Catalog::new(vec![MenuItem::new("rice", 200), MenuItem::new("soup", 1500)])
            .unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.price_of("rice"), Some(200));
        assert_eq!(catalog.price_of("noodles"), None);
        assert!(catalog.contains("soup"));
    }

    #[test]
    fn test_catalog_trims_names() {
        let catalog = Catalog::new(vec![MenuItem::new("  rice ", 200)]).unwrap();
        assert!(catalog.contains("rice"));
        assert_eq!(catalog.items()[0].name, "rice");
    }

    #[test]
    fn test_catalog_rejects_invalid_menus() {
        assert_eq!(Catalog::new(vec![]).unwrap_err(), CatalogError::Empty);

        assert_eq!(
            Catalog::new(vec![MenuItem::new("rice", 200), MenuItem::new(" ", 4300)]).unwrap_err(),
            CatalogError::BlankName { position: 2 }
        );

        assert_eq!(
            Catalog::new(vec![MenuItem::new("rice", 200), MenuItem::new("rice ", 300)])
                .unwrap_err(),
            CatalogError::DuplicateItem("rice".into())
        );

        assert!(matches!(
            Catalog::new(vec![MenuItem::new("rice", 0)]),
            Err(CatalogError::NonPositivePrice { .. })
        ));
    }

    #[test]
    fn test_by_number_is_one_based() {
        let catalog = Catalog::default_menu();
        assert_eq!(catalog.by_number(1).unwrap().name, "braised pork");
        assert_eq!(catalog.by_number(4).unwrap().name, "rice");
        assert!(catalog.by_number(0).is_none());
        assert!(catalog.by_number(catalog.len() + 1).is_none());
    }

    #[test]
    fn test_resolve_prefers_name_then_number() {
        let catalog = Catalog::default_menu();
        assert_eq!(catalog.resolve("soup").unwrap().price_cents, 1500);
        assert_eq!(catalog.resolve(" 6 ").unwrap().name, "soup");
        assert!(catalog.resolve("ramen").is_none());
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let catalog = Catalog::default_menu();
        let names: Vec<_> = catalog.search("S").iter().map(|i| i.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["braised pork", "steamed fish", "salad", "soup", "seafood platter"]
        );
        assert!(catalog.search("   ").is_empty());
    }
}
