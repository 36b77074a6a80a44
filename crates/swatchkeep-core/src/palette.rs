//! Palette view derivation and the persisting editing session.
//!
//! [`derive_slots`] turns a collection into the rows a renderer draws, always
//! ending with one blank "pick here" slot. [`PaletteSession`] owns the
//! collection store and writes it back to storage after every change.

use crate::collection::{Collection, CollectionStore, Slot};
use crate::color::{Color, ColorFormat};
use crate::storage::{BoxFuture, PersistedState, Storage, StorageResult, load_store, save_state};
use std::sync::Arc;

/// One rendered palette slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotView {
    /// Position in the collection, passed back to store operations.
    pub index: usize,
    pub color: Option<Color>,
    pub hex: String,
    pub rgb: String,
    pub hsl: String,
    pub is_blank: bool,
}

impl SlotView {
    fn new(index: usize, slot: Slot) -> Self {
        match slot {
            Slot::Empty => Self {
                index,
                color: None,
                hex: String::new(),
                rgb: String::new(),
                hsl: String::new(),
                is_blank: true,
            },
            Slot::Filled(color) => Self {
                index,
                color: Some(color),
                hex: color.to_hex(),
                rgb: color.to_rgb_string(),
                hsl: color.to_hsl_string(),
                is_blank: false,
            },
        }
    }

    /// The stored slot this view was derived from.
    pub fn slot(&self) -> Slot {
        self.color.map_or(Slot::Empty, Slot::Filled)
    }

    /// Text to copy for `format`, or `None` for a blank slot.
    pub fn value(&self, format: ColorFormat) -> Option<&str> {
        if self.is_blank {
            return None;
        }
        Some(match format {
            ColorFormat::Hex => &self.hex,
            ColorFormat::Rgb => &self.rgb,
            ColorFormat::Hsl => &self.hsl,
        })
    }
}

/// Project a collection into slot views.
///
/// Storage order is preserved. A blank view is appended when the collection
/// is empty or does not already end with a blank slot.
pub fn derive_slots(collection: &Collection) -> Vec<SlotView> {
    let mut views: Vec<SlotView> = collection
        .iter()
        .enumerate()
        .map(|(index, slot)| SlotView::new(index, *slot))
        .collect();

    if !collection.ends_with_blank() {
        views.push(SlotView::new(collection.len(), Slot::Empty));
    }
    views
}

/// Store index for the view rendered at `position`.
pub fn slot_index_of(views: &[SlotView], position: usize) -> Option<usize> {
    views.get(position).map(|view| view.index)
}

/// A deferred storage write.
pub type PendingSave = BoxFuture<'static, StorageResult<()>>;

/// Owns the collection store and persists it after each change.
///
/// Mutations update memory immediately and hand back the write as a
/// [`PendingSave`] for the caller to drive (block on it natively, spawn it
/// on wasm). `None` means the operation was rejected and nothing needs
/// writing.
pub struct PaletteSession<S: Storage + ?Sized> {
    store: CollectionStore,
    storage: Arc<S>,
}

impl<S: Storage + ?Sized + 'static> PaletteSession<S> {
    /// Load persisted state from `storage`.
    pub async fn open(storage: Arc<S>) -> StorageResult<Self> {
        let store = load_store(&*storage).await?;
        log::info!(
            "Opened palette with {} collection(s), current {:?}",
            store.len(),
            store.current_name()
        );
        Ok(Self { store, storage })
    }

    pub fn store(&self) -> &CollectionStore {
        &self.store
    }

    /// Slot views for the current collection.
    pub fn slots(&self) -> Vec<SlotView> {
        derive_slots(self.store.current())
    }

    #[must_use = "the returned future performs the storage write"]
    pub fn set_color(&mut self, index: usize, color: Color) -> Option<PendingSave> {
        let changed = self.store.set_color(index, color);
        self.save_if(changed)
    }

    #[must_use = "the returned future performs the storage write"]
    pub fn remove_color(&mut self, index: usize) -> Option<PendingSave> {
        let changed = self.store.remove_color(index);
        self.save_if(changed)
    }

    #[must_use = "the returned future performs the storage write"]
    pub fn rename_current(&mut self, new_name: &str) -> Option<PendingSave> {
        let changed = self.store.rename_current(new_name);
        self.save_if(changed)
    }

    #[must_use = "the returned future performs the storage write"]
    pub fn create_collection(&mut self, name: &str) -> Option<PendingSave> {
        let changed = self.store.create_collection(name);
        self.save_if(changed)
    }

    #[must_use = "the returned future performs the storage write"]
    pub fn delete_current(&mut self) -> Option<PendingSave> {
        let changed = self.store.delete_current();
        self.save_if(changed)
    }

    #[must_use = "the returned future performs the storage write"]
    pub fn switch_current(&mut self, name: &str) -> Option<PendingSave> {
        let changed = self.store.switch_current(name);
        self.save_if(changed)
    }

    /// Write the full state now.
    pub fn save(&self) -> PendingSave {
        let state = PersistedState::from_store(&self.store);
        let storage = Arc::clone(&self.storage);
        Box::pin(async move { save_state(&*storage, state).await })
    }

    fn save_if(&self, changed: bool) -> Option<PendingSave> {
        changed.then(|| self.save())
    }
}
