//! Named color collections and the current-collection pointer.
//!
//! Every mutating operation returns `true` when it changed state. Rejected
//! operations (duplicate names, deleting the last collection, out-of-range
//! slots) leave the store untouched and return `false`.

use crate::color::Color;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Name of the collection created when nothing has been persisted yet.
pub const DEFAULT_COLLECTION: &str = "default";

/// A palette position: either a picked color or nothing yet.
///
/// Persisted as a string, `""` for [`Slot::Empty`] and uppercase hex
/// otherwise. Anything else read back from storage becomes empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(into = "String")]
pub enum Slot {
    #[default]
    Empty,
    Filled(Color),
}

impl Slot {
    /// The color in this slot, if any.
    pub fn color(&self) -> Option<Color> {
        match self {
            Slot::Empty => None,
            Slot::Filled(color) => Some(*color),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Slot::Empty)
    }
}

impl From<Color> for Slot {
    fn from(color: Color) -> Self {
        Slot::Filled(color)
    }
}

impl From<String> for Slot {
    fn from(text: String) -> Self {
        if text.trim().is_empty() {
            return Slot::Empty;
        }
        match Color::parse(&text) {
            Some(color) => Slot::Filled(color),
            None => {
                log::warn!("Dropping unrecognized stored color {:?}", text);
                Slot::Empty
            }
        }
    }
}

impl<'de> Deserialize<'de> for Slot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(text) => Slot::from(text),
            Value::Null => Slot::Empty,
            other => {
                log::warn!("Dropping non-text stored color {}", other);
                Slot::Empty
            }
        })
    }
}

impl From<Slot> for String {
    fn from(slot: Slot) -> Self {
        match slot {
            Slot::Empty => String::new(),
            Slot::Filled(color) => color.to_hex(),
        }
    }
}

/// An ordered run of slots.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection {
    slots: Vec<Slot>,
}

static EMPTY_COLLECTION: Collection = Collection { slots: Vec::new() };

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_slots(slots: Vec<Slot>) -> Self {
        Self { slots }
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Slot> {
        self.slots.get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter()
    }

    /// Whether the final slot is the blank "next pick here" slot.
    pub fn ends_with_blank(&self) -> bool {
        self.slots.last().is_some_and(Slot::is_empty)
    }
}

impl FromIterator<Slot> for Collection {
    fn from_iter<I: IntoIterator<Item = Slot>>(iter: I) -> Self {
        Self::from_slots(iter.into_iter().collect())
    }
}

/// Collections keyed by name, in creation order.
pub type CollectionMap = IndexMap<String, Collection>;

/// All collections plus the name of the one being edited.
///
/// The current name always refers to an existing collection and at least
/// one collection always exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionStore {
    collections: CollectionMap,
    current: String,
}

impl Default for CollectionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CollectionStore {
    /// A store holding a single empty `default` collection.
    pub fn new() -> Self {
        let mut collections = CollectionMap::new();
        collections.insert(DEFAULT_COLLECTION.to_string(), Collection::new());
        Self {
            collections,
            current: DEFAULT_COLLECTION.to_string(),
        }
    }

    /// Build a store from possibly incomplete persisted parts.
    ///
    /// An empty map gets a `default` collection. A missing, empty or dangling
    /// current name falls back to `default`, which is created if needed.
    pub fn from_parts(collections: Option<CollectionMap>, current: Option<String>) -> Self {
        let mut collections = collections.unwrap_or_default();
        if collections.is_empty() {
            collections.insert(DEFAULT_COLLECTION.to_string(), Collection::new());
        }

        let current = match current {
            Some(name) if collections.contains_key(&name) => name,
            other => {
                if let Some(name) = other.filter(|n| !n.is_empty()) {
                    log::warn!("Current collection {:?} is missing, using {:?}", name, DEFAULT_COLLECTION);
                }
                collections.entry(DEFAULT_COLLECTION.to_string()).or_default();
                DEFAULT_COLLECTION.to_string()
            }
        };

        Self { collections, current }
    }

    pub fn collections(&self) -> &CollectionMap {
        &self.collections
    }

    /// Collection names in iteration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }

    pub fn current_name(&self) -> &str {
        &self.current
    }

    pub fn current(&self) -> &Collection {
        self.collections.get(&self.current).unwrap_or(&EMPTY_COLLECTION)
    }

    pub fn get(&self, name: &str) -> Option<&Collection> {
        self.collections.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.collections.contains_key(name)
    }

    /// Number of collections.
    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    fn current_mut(&mut self) -> &mut Collection {
        self.collections.entry(self.current.clone()).or_default()
    }

    /// Store `color` at `index` in the current collection.
    ///
    /// `index == len` appends, smaller indices overwrite. Larger indices are
    /// rejected, as is storing the color a slot already holds.
    pub fn set_color(&mut self, index: usize, color: Color) -> bool {
        let collection = self.current_mut();
        let len = collection.len();
        if index > len {
            log::warn!("Ignoring color for slot {} past the end ({} slots)", index, len);
            return false;
        }
        if index == len {
            collection.slots.push(Slot::Filled(color));
        } else if collection.slots[index] == Slot::Filled(color) {
            return false;
        } else {
            collection.slots[index] = Slot::Filled(color);
        }
        true
    }

    /// Remove the slot at `index`, shifting later slots down.
    pub fn remove_color(&mut self, index: usize) -> bool {
        let collection = self.current_mut();
        if index >= collection.len() {
            log::debug!("No slot {} to remove", index);
            return false;
        }
        collection.slots.remove(index);
        true
    }

    /// Rename the current collection.
    ///
    /// Ignored when the trimmed name is empty, unchanged, or taken by another
    /// collection. The renamed collection moves to the end of the order.
    pub fn rename_current(&mut self, new_name: &str) -> bool {
        let new_name = new_name.trim();
        if new_name.is_empty() || new_name == self.current || self.contains(new_name) {
            log::debug!("Rename to {:?} rejected", new_name);
            return false;
        }

        let contents = self.collections.shift_remove(&self.current).unwrap_or_default();
        self.collections.insert(new_name.to_string(), contents);
        self.current = new_name.to_string();
        true
    }

    /// Create an empty collection and make it current.
    pub fn create_collection(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || self.contains(name) {
            log::debug!("Create {:?} rejected", name);
            return false;
        }

        self.collections.insert(name.to_string(), Collection::new());
        self.current = name.to_string();
        true
    }

    /// Delete the current collection and switch to the first remaining one.
    ///
    /// The last remaining collection cannot be deleted.
    pub fn delete_current(&mut self) -> bool {
        if self.collections.len() <= 1 {
            log::debug!("Refusing to delete the only collection {:?}", self.current);
            return false;
        }

        self.collections.shift_remove(&self.current);
        match self.collections.keys().next().cloned() {
            Some(first) => self.current = first,
            None => *self = Self::new(),
        }
        true
    }

    /// Make `name` the current collection.
    pub fn switch_current(&mut self, name: &str) -> bool {
        let name = name.trim();
        if !self.contains(name) {
            log::debug!("No collection named {:?}", name);
            return false;
        }
        if name == self.current {
            return false;
        }
        self.current = name.to_string();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(text: &str) -> Color {
        Color::parse(text).unwrap()
    }

    fn current_hexes(store: &CollectionStore) -> Vec<String> {
        store.current().iter().map(|slot| String::from(*slot)).collect()
    }

    #[test]
    fn test_new_store_has_default() {
        let store = CollectionStore::new();
        assert_eq!(store.current_name(), DEFAULT_COLLECTION);
        assert!(store.current().is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_set_color_appends_at_len() {
        let mut store = CollectionStore::new();
        assert!(store.set_color(0, hex("#FF0000")));
        assert_eq!(current_hexes(&store), vec!["#FF0000"]);

        assert!(store.set_color(1, hex("#00ff00")));
        assert_eq!(current_hexes(&store), vec!["#FF0000", "#00FF00"]);
    }

    #[test]
    fn test_set_color_overwrites() {
        let mut store = CollectionStore::new();
        store.set_color(0, hex("#111111"));
        store.set_color(1, hex("#222222"));
        assert!(store.set_color(0, hex("#333333")));
        assert_eq!(current_hexes(&store), vec!["#333333", "#222222"]);

        assert!(!store.set_color(0, hex("#333")));
    }

    #[test]
    fn test_set_color_past_end_rejected() {
        let mut store = CollectionStore::new();
        store.set_color(0, hex("#111111"));
        let before = store.clone();

        assert!(!store.set_color(5, hex("#222222")));
        assert_eq!(store, before);
    }

    #[test]
    fn test_remove_color_shifts_down() {
        let mut store = CollectionStore::new();
        store.set_color(0, hex("#112233"));
        store.set_color(1, hex("#445566"));

        assert!(store.remove_color(0));
        assert_eq!(current_hexes(&store), vec!["#445566"]);
    }

    #[test]
    fn test_remove_color_out_of_range() {
        let mut store = CollectionStore::new();
        store.set_color(0, hex("#112233"));
        assert!(!store.remove_color(1));
        assert_eq!(store.current().len(), 1);
    }

    #[test]
    fn test_rename_current() {
        let mut store = CollectionStore::new();
        store.set_color(0, hex("#ABCDEF"));

        assert!(store.rename_current("brand"));
        assert_eq!(store.current_name(), "brand");
        assert!(!store.contains(DEFAULT_COLLECTION));
        assert_eq!(current_hexes(&store), vec!["#ABCDEF"]);
    }

    #[test]
    fn test_rename_rejections() {
        let mut store = CollectionStore::new();
        store.create_collection("brand");
        let before = store.clone();

        assert!(!store.rename_current(""));
        assert!(!store.rename_current("   "));
        assert!(!store.rename_current("brand"));
        assert!(!store.rename_current(DEFAULT_COLLECTION));
        assert_eq!(store, before);
    }

    #[test]
    fn test_rename_moves_to_end() {
        let mut store = CollectionStore::new();
        store.create_collection("brand");
        store.switch_current(DEFAULT_COLLECTION);

        assert!(store.rename_current("base"));
        assert_eq!(store.names().collect::<Vec<_>>(), vec!["brand", "base"]);
    }

    #[test]
    fn test_create_collection_switches() {
        let mut store = CollectionStore::new();
        assert!(store.create_collection(" brand "));
        assert_eq!(store.current_name(), "brand");
        assert!(store.current().is_empty());

        assert!(!store.create_collection("brand"));
        assert!(!store.create_collection(""));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_delete_only_collection_is_noop() {
        let mut store = CollectionStore::new();
        store.set_color(0, hex("#010203"));
        let before = store.clone();

        assert!(!store.delete_current());
        assert_eq!(store, before);
    }

    #[test]
    fn test_delete_current_promotes_first() {
        let mut store = CollectionStore::new();
        store.create_collection("brand");
        store.switch_current("brand");
        assert_eq!(store.current_name(), "brand");

        assert!(store.delete_current());
        assert_eq!(store.current_name(), DEFAULT_COLLECTION);
        assert!(!store.contains("brand"));
    }

    #[test]
    fn test_delete_first_promotes_next() {
        let mut store = CollectionStore::new();
        store.create_collection("a");
        store.create_collection("b");
        store.switch_current(DEFAULT_COLLECTION);

        assert!(store.delete_current());
        assert_eq!(store.current_name(), "a");
    }

    #[test]
    fn test_switch_current() {
        let mut store = CollectionStore::new();
        store.create_collection("brand");

        assert!(store.switch_current(DEFAULT_COLLECTION));
        assert_eq!(store.current_name(), DEFAULT_COLLECTION);
        assert!(!store.switch_current(DEFAULT_COLLECTION));
        assert!(!store.switch_current("missing"));
        assert_eq!(store.current_name(), DEFAULT_COLLECTION);
    }

    #[test]
    fn test_switch_current_trims_like_create() {
        let mut store = CollectionStore::new();
        store.create_collection(" brand ");
        store.switch_current(DEFAULT_COLLECTION);

        assert!(store.switch_current(" brand "));
        assert_eq!(store.current_name(), "brand");
        assert!(!store.switch_current("  "));
    }

    #[test]
    fn test_from_parts_defaults() {
        let store = CollectionStore::from_parts(None, None);
        assert_eq!(store, CollectionStore::new());
    }

    #[test]
    fn test_from_parts_dangling_current() {
        let mut map = CollectionMap::new();
        map.insert("brand".to_string(), Collection::new());

        let store = CollectionStore::from_parts(Some(map), Some("gone".to_string()));
        assert_eq!(store.current_name(), DEFAULT_COLLECTION);
        assert_eq!(store.names().collect::<Vec<_>>(), vec!["brand", DEFAULT_COLLECTION]);
    }

    #[test]
    fn test_from_parts_keeps_valid_current() {
        let mut map = CollectionMap::new();
        map.insert("a".to_string(), Collection::new());
        map.insert("b".to_string(), Collection::from_slots(vec![Slot::Filled(Color::WHITE)]));

        let store = CollectionStore::from_parts(Some(map), Some("b".to_string()));
        assert_eq!(store.current_name(), "b");
        assert_eq!(store.current().len(), 1);
    }

    #[test]
    fn test_slot_serde() {
        let slots = vec![Slot::Filled(Color::from_rgb(255, 0, 0)), Slot::Empty];
        let json = serde_json::to_string(&slots).unwrap();
        assert_eq!(json, r##"["#FF0000",""]"##);

        let back: Vec<Slot> = serde_json::from_str(r##"["#f00","","rgb(1, 2, 3)","rgba(0, 0, 0, 0)"]"##).unwrap();
        assert_eq!(
            back,
            vec![
                Slot::Filled(Color::from_rgb(255, 0, 0)),
                Slot::Empty,
                Slot::Filled(Color::from_rgb(1, 2, 3)),
                Slot::Empty,
            ]
        );
    }

    #[test]
    fn test_slot_non_text_is_empty() {
        let map: CollectionMap =
            serde_json::from_str(r##"{"default": ["#FF0000", null, 7, ""], "brand": ["#00FF00"]}"##).unwrap();

        assert_eq!(
            map["default"].slots(),
            &[Slot::Filled(Color::from_rgb(255, 0, 0)), Slot::Empty, Slot::Empty, Slot::Empty]
        );
        assert_eq!(map["brand"].len(), 1);
    }

    #[test]
    fn test_collection_ends_with_blank() {
        assert!(!Collection::new().ends_with_blank());
        assert!(Collection::from_slots(vec![Slot::Empty]).ends_with_blank());
        assert!(!Collection::from_slots(vec![Slot::Empty, Slot::Filled(Color::BLACK)]).ends_with_blank());
    }
}
