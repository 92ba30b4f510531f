//! Character class templates for data-driven unit definitions.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TacticsError};

/// Immutable stat template shared by every unit of one archetype.
///
/// Units hold an `Arc` to their class; classes are never mutated once a
/// match has started. Missing fields fall back to the rifle template.
///
/// # Example RON
///
/// ```ron
/// CharacterClass(
///     name: "Sniper",
///     max_hp: 7,
///     aim: 85,
///     move_range: 4,
///     max_ammo: 3,
///     damage: 5,
///     can_take_cover: false,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterClass {
    /// Display name of the class.
    pub name: String,

    /// Maximum (and starting) hit points.
    pub max_hp: u32,

    /// Action points granted at the start of each turn.
    pub max_ap: u32,

    /// Maximum tiles walked by one move action.
    pub move_range: u32,

    /// Base hit chance in percent (0-100).
    pub aim: u32,

    /// Magazine size.
    pub max_ammo: u32,

    /// Hit points removed by one successful shot.
    pub damage: u32,

    /// AP charged once per move action, however far the unit walks.
    pub move_ap_cost: u32,

    /// Whether the class may enter overwatch.
    pub can_overwatch: bool,

    /// Whether the class seeks cover.
    pub can_take_cover: bool,
}

impl Default for CharacterClass {
    fn default() -> Self {
        Self {
            name: "Rifle".to_string(),
            max_hp: 10,
            max_ap: 2,
            move_range: 6,
            aim: 70,
            max_ammo: 6,
            damage: 3,
            move_ap_cost: 1,
            can_overwatch: true,
            can_take_cover: true,
        }
    }
}

impl CharacterClass {
    /// All-zero template for units whose class could not be resolved.
    ///
    /// A unit built from it starts dead and is pruned at the next turn change.
    #[must_use]
    pub fn inactive(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_hp: 0,
            max_ap: 0,
            move_range: 0,
            aim: 0,
            max_ammo: 0,
            damage: 0,
            move_ap_cost: 0,
            can_overwatch: false,
            can_take_cover: false,
        }
    }
}

/// Lookup table from class id (e.g. `"rifle"`) to its shared template.
#[derive(Debug, Clone, Default)]
pub struct ClassRegistry {
    classes: BTreeMap<String, Arc<CharacterClass>>,
}

impl ClassRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a RON map of class id to [`CharacterClass`].
    ///
    /// ```ron
    /// {
    ///     "rifle": (name: "Rifle"),
    ///     "sniper": (name: "Sniper", aim: 85, move_range: 4),
    /// }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`TacticsError::DataParseError`] if the text is not valid RON.
    pub fn from_ron_str(ron_text: &str) -> Result<Self> {
        let table: BTreeMap<String, CharacterClass> =
            ron::from_str(ron_text).map_err(|e| TacticsError::DataParseError {
                what: "class table".to_string(),
                message: e.to_string(),
            })?;
        Ok(table.into_iter().collect())
    }

    /// Register (or replace) a class under `id`.
    pub fn insert(&mut self, id: impl Into<String>, class: CharacterClass) -> Arc<CharacterClass> {
        let class = Arc::new(class);
        self.classes.insert(id.into(), Arc::clone(&class));
        class
    }

    /// Look up a class.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<CharacterClass>> {
        self.classes.get(id).cloned()
    }

    /// Look up a class, reporting unknown ids as an error.
    ///
    /// # Errors
    ///
    /// Returns [`TacticsError::UnknownClass`] if `id` is not registered.
    pub fn resolve(&self, id: &str) -> Result<Arc<CharacterClass>> {
        self.get(id)
            .ok_or_else(|| TacticsError::UnknownClass(id.to_string()))
    }

    /// Registered class ids in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    /// Number of registered classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Check if no class is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl FromIterator<(String, CharacterClass)> for ClassRegistry {
    fn from_iter<I: IntoIterator<Item = (String, CharacterClass)>>(iter: I) -> Self {
        Self {
            classes: iter.into_iter().map(|(id, c)| (id, Arc::new(c))).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_rifle_template() {
        let rifle = CharacterClass::default();
        assert_eq!(rifle.name, "Rifle");
        assert_eq!((rifle.max_hp, rifle.max_ap, rifle.move_range), (10, 2, 6));
        assert_eq!((rifle.aim, rifle.max_ammo, rifle.damage), (70, 6, 3));
        assert_eq!(rifle.move_ap_cost, 1);
        assert!(rifle.can_overwatch && rifle.can_take_cover);
    }

    #[test]
    fn test_inactive_template_is_zeroed() {
        let dead = CharacterClass::inactive("ghost");
        assert_eq!(dead.max_hp, 0);
        assert_eq!(dead.max_ap, 0);
        assert!(!dead.can_overwatch);
    }

    #[test]
    fn test_registry_from_ron_with_defaults() {
        let registry = ClassRegistry::from_ron_str(
            r#"{
                "rifle": (),
                "sniper": (name: "Sniper", aim: 85, move_range: 4, can_take_cover: false),
            }"#,
        )
        .unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["rifle", "sniper"]);

        let sniper = registry.resolve("sniper").unwrap();
        assert_eq!(sniper.aim, 85);
        assert_eq!(sniper.move_range, 4);
        assert_eq!(sniper.max_hp, 10);
        assert!(!sniper.can_take_cover);

        assert_eq!(*registry.resolve("rifle").unwrap(), CharacterClass::default());
    }

    #[test]
    fn test_registry_unknown_class() {
        let registry = ClassRegistry::new();
        assert!(matches!(
            registry.resolve("grenadier"),
            Err(TacticsError::UnknownClass(id)) if id == "grenadier"
        ));
    }

    #[test]
    fn test_registry_parse_error() {
        assert!(matches!(
            ClassRegistry::from_ron_str("{ \"rifle\": (aim: \"high\") }"),
            Err(TacticsError::DataParseError { .. })
        ));
    }

    #[test]
    fn test_insert_shares_template() {
        let mut registry = ClassRegistry::new();
        let inserted = registry.insert("rifle", CharacterClass::default());
        let fetched = registry.get("rifle").unwrap();
        assert!(Arc::ptr_eq(&inserted, &fetched));
    }
}
