//! SwatchKeep Core Library
//!
//! Platform-agnostic palette logic for SwatchKeep: color parsing and
//! conversion, named collections, persistence, pick orchestration and the
//! messages passed between extension contexts.

pub mod collection;
pub mod color;
pub mod message;
pub mod palette;
pub mod picker;
pub mod router;
pub mod storage;

pub use collection::{Collection, CollectionMap, CollectionStore, DEFAULT_COLLECTION, Slot};
pub use color::{Color, ColorFormat, Hsl, ParseColorError, ParseFormatError};
pub use message::Message;
pub use palette::{PaletteSession, PendingSave, SlotView, derive_slots, slot_index_of};
pub use picker::{ColorSampler, PickError, PickOrchestrator, PickOutcome, PickState, SampleError, sample_with_fallback};
pub use router::{BackgroundRouter, ExtensionHost, HostError, RouteError, RouteOutcome, TabId};
pub use storage::{PersistedState, Storage, StorageError, StorageResult};

#[cfg(test)]
pub(crate) mod test_util {
    /// Simple blocking executor for tests.
    pub fn block_on<F: std::future::Future>(f: F) -> F::Output {
        use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

        fn dummy_raw_waker() -> RawWaker {
            fn no_op(_: *const ()) {}
            fn clone(_: *const ()) -> RawWaker {
                dummy_raw_waker()
            }
            static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
            RawWaker::new(std::ptr::null(), &VTABLE)
        }

        let waker = unsafe { Waker::from_raw(dummy_raw_waker()) };
        let mut cx = Context::from_waker(&waker);
        let mut f = std::pin::pin!(f);

        loop {
            match f.as_mut().poll(&mut cx) {
                Poll::Ready(result) => return result,
                Poll::Pending => {}
            }
        }
    }
}
