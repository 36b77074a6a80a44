//! Pick requests: tracking one outstanding request and sampling the page.
//!
//! A request moves `Idle → Requested → Resolved | Failed | Abandoned`. Only
//! one request may be outstanding; the UI is expected to disable its trigger
//! rather than queue a second one.

use crate::color::Color;
use crate::storage::BoxFuture;
use thiserror::Error;

/// Lifecycle of a pick request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PickState {
    #[default]
    Idle,
    /// Waiting for the page to report a color for `slot`.
    Requested { slot: usize },
    Resolved { slot: usize, color: Color },
    Failed { slot: usize, reason: String },
    /// The sampler was dismissed without a choice.
    Abandoned { slot: usize },
}

impl PickState {
    pub fn is_pending(&self) -> bool {
        matches!(self, PickState::Requested { .. })
    }

    /// Slot the request targets, if any.
    pub fn slot(&self) -> Option<usize> {
        match self {
            PickState::Idle => None,
            PickState::Requested { slot }
            | PickState::Resolved { slot, .. }
            | PickState::Failed { slot, .. }
            | PickState::Abandoned { slot } => Some(*slot),
        }
    }
}

/// Invalid transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PickError {
    #[error("a pick for slot {0} is already in progress")]
    AlreadyPending(usize),
    #[error("no pick is in progress")]
    NotPending,
    #[error("result for slot {got} does not match the pending slot {expected}")]
    SlotMismatch { expected: usize, got: usize },
    #[error("sampled value {0:?} is not a color")]
    Unrecognized(String),
}

/// Tracks the single outstanding pick request of one UI.
#[derive(Debug, Default)]
pub struct PickOrchestrator {
    state: PickState,
}

impl PickOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &PickState {
        &self.state
    }

    pub fn is_pending(&self) -> bool {
        self.state.is_pending()
    }

    /// Start a request for `slot`.
    pub fn begin(&mut self, slot: usize) -> Result<(), PickError> {
        if let PickState::Requested { slot: pending } = self.state {
            return Err(PickError::AlreadyPending(pending));
        }
        log::debug!("Pick requested for slot {}", slot);
        self.state = PickState::Requested { slot };
        Ok(())
    }

    /// Accept the sampled `text` for `slot`.
    ///
    /// On success the request is resolved and the parsed color is returned
    /// for the caller to store. Text that is not a color fails the request
    /// and nothing is committed.
    pub fn resolve(&mut self, slot: usize, text: &str) -> Result<Color, PickError> {
        let expected = self.pending_slot()?;
        if expected != slot {
            return Err(PickError::SlotMismatch { expected, got: slot });
        }

        match Color::parse(text) {
            Some(color) => {
                self.state = PickState::Resolved { slot, color };
                Ok(color)
            }
            None => {
                log::warn!("Sampled value {:?} for slot {} is not a color", text, slot);
                self.state = PickState::Failed {
                    slot,
                    reason: format!("unrecognized color {:?}", text),
                };
                Err(PickError::Unrecognized(text.to_string()))
            }
        }
    }

    /// Mark the outstanding request as failed.
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), PickError> {
        let slot = self.pending_slot()?;
        let reason = reason.into();
        log::warn!("Pick for slot {} failed: {}", slot, reason);
        self.state = PickState::Failed { slot, reason };
        Ok(())
    }

    /// Mark the outstanding request as abandoned by the user.
    pub fn abandon(&mut self) -> Result<(), PickError> {
        let slot = self.pending_slot()?;
        log::info!("Pick for slot {} abandoned", slot);
        self.state = PickState::Abandoned { slot };
        Ok(())
    }

    fn pending_slot(&self) -> Result<usize, PickError> {
        match self.state {
            PickState::Requested { slot } => Ok(slot),
            _ => Err(PickError::NotPending),
        }
    }
}

/// Why a sampler produced no color.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SampleError {
    #[error("color sampling is not supported here")]
    Unsupported,
    #[error("color sampling was cancelled")]
    Cancelled,
    #[error("color sampling failed: {0}")]
    Failed(String),
}

pub type SampleResult<T> = Result<T, SampleError>;

/// Something that can read one color off the page, e.g. an eyedropper or a
/// crosshair overlay.
pub trait ColorSampler {
    /// Sample a color, returned as CSS color text.
    fn sample(&self) -> BoxFuture<'_, SampleResult<String>>;
}

/// Result of [`sample_with_fallback`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickOutcome {
    /// CSS color text to report back.
    Picked(String),
    /// Both samplers came back empty; nothing should be reported.
    Abandoned,
}

/// Sample with `primary`, falling back to `fallback` on any primary error.
///
/// If the fallback also fails the pick is abandoned. Nothing is retried.
pub async fn sample_with_fallback<P, F>(primary: &P, fallback: &F) -> PickOutcome
where
    P: ColorSampler + ?Sized,
    F: ColorSampler + ?Sized,
{
    let primary_err = match primary.sample().await {
        Ok(color) => return PickOutcome::Picked(color),
        Err(e) => e,
    };
    log::info!("Primary sampler unavailable ({}), using fallback", primary_err);

    match fallback.sample().await {
        Ok(color) => PickOutcome::Picked(color),
        Err(e) => {
            log::info!("Fallback sampler produced no color: {}", e);
            PickOutcome::Abandoned
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::block_on;
    use std::cell::Cell;

    struct FakeSampler {
        result: SampleResult<String>,
        calls: Cell<usize>,
    }

    impl FakeSampler {
        fn new(result: SampleResult<String>) -> Self {
            Self {
                result,
                calls: Cell::new(0),
            }
        }
    }

    impl ColorSampler for FakeSampler {
        fn sample(&self) -> BoxFuture<'_, SampleResult<String>> {
            self.calls.set(self.calls.get() + 1);
            let result = self.result.clone();
            Box::pin(async move { result })
        }
    }

    #[test]
    fn test_begin_then_resolve() {
        let mut picker = PickOrchestrator::new();
        picker.begin(2).unwrap();
        assert!(picker.is_pending());
        assert_eq!(picker.state().slot(), Some(2));

        let color = picker.resolve(2, "#ff0000").unwrap();
        assert_eq!(color, Color::from_rgb(255, 0, 0));
        assert_eq!(picker.state(), &PickState::Resolved { slot: 2, color });
        assert!(!picker.is_pending());
    }

    #[test]
    fn test_second_begin_while_pending_is_rejected() {
        let mut picker = PickOrchestrator::new();
        picker.begin(0).unwrap();

        assert_eq!(picker.begin(1), Err(PickError::AlreadyPending(0)));
        assert_eq!(picker.state(), &PickState::Requested { slot: 0 });
    }

    #[test]
    fn test_begin_again_after_terminal_state() {
        let mut picker = PickOrchestrator::new();
        picker.begin(0).unwrap();
        picker.abandon().unwrap();
        assert_eq!(picker.state(), &PickState::Abandoned { slot: 0 });

        picker.begin(1).unwrap();
        assert_eq!(picker.state(), &PickState::Requested { slot: 1 });
    }

    #[test]
    fn test_resolve_without_request() {
        let mut picker = PickOrchestrator::new();
        assert_eq!(picker.resolve(0, "#fff"), Err(PickError::NotPending));
        assert_eq!(picker.state(), &PickState::Idle);
    }

    #[test]
    fn test_resolve_wrong_slot() {
        let mut picker = PickOrchestrator::new();
        picker.begin(1).unwrap();
        assert_eq!(
            picker.resolve(0, "#fff"),
            Err(PickError::SlotMismatch { expected: 1, got: 0 })
        );
        assert!(picker.is_pending());
    }

    #[test]
    fn test_resolve_unparseable_fails_request() {
        let mut picker = PickOrchestrator::new();
        picker.begin(0).unwrap();

        let err = picker.resolve(0, "rgba(0, 0, 0, 0)").unwrap_err();
        assert!(matches!(err, PickError::Unrecognized(_)));
        assert!(matches!(picker.state(), PickState::Failed { slot: 0, .. }));
    }

    #[test]
    fn test_fail_records_reason() {
        let mut picker = PickOrchestrator::new();
        assert_eq!(picker.fail("x"), Err(PickError::NotPending));

        picker.begin(3).unwrap();
        picker.fail("no active tab").unwrap();
        assert_eq!(
            picker.state(),
            &PickState::Failed { slot: 3, reason: "no active tab".to_string() }
        );

        picker.begin(4).unwrap();
        assert_eq!(picker.state().slot(), Some(4));
    }

    #[test]
    fn test_primary_success_skips_fallback() {
        let primary = FakeSampler::new(Ok("#123456".to_string()));
        let fallback = FakeSampler::new(Ok("#FFFFFF".to_string()));

        let outcome = block_on(sample_with_fallback(&primary, &fallback));
        assert_eq!(outcome, PickOutcome::Picked("#123456".to_string()));
        assert_eq!(fallback.calls.get(), 0);
    }

    #[test]
    fn test_primary_error_uses_fallback() {
        for err in [SampleError::Unsupported, SampleError::Cancelled, SampleError::Failed("boom".into())] {
            let primary = FakeSampler::new(Err(err));
            let fallback = FakeSampler::new(Ok("rgb(1, 2, 3)".to_string()));

            let outcome = block_on(sample_with_fallback(&primary, &fallback));
            assert_eq!(outcome, PickOutcome::Picked("rgb(1, 2, 3)".to_string()));
            assert_eq!(primary.calls.get(), 1);
            assert_eq!(fallback.calls.get(), 1);
        }
    }

    #[test]
    fn test_both_fail_abandons() {
        let primary = FakeSampler::new(Err(SampleError::Unsupported));
        let fallback = FakeSampler::new(Err(SampleError::Cancelled));

        let outcome = block_on(sample_with_fallback(&primary, &fallback));
        assert_eq!(outcome, PickOutcome::Abandoned);
        assert_eq!(primary.calls.get(), 1);
        assert_eq!(fallback.calls.get(), 1);
    }
}
