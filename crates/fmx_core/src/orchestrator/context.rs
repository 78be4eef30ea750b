//! Per-batch mutable state threaded through argument building.

/// State that lives for exactly one batch run.
///
/// The codec configuration dialog is shown at most once per channel kind per
/// batch; the flags here record whether that already happened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchRunContext {
    color_dialog_shown: bool,
    monochrome_dialog_shown: bool,
}

impl BatchRunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget dialog state; called at the start of every batch.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn dialog_shown(&self, monochrome: bool) -> bool {
        if monochrome {
            self.monochrome_dialog_shown
        } else {
            self.color_dialog_shown
        }
    }

    pub fn mark_dialog_shown(&mut self, monochrome: bool) {
        if monochrome {
            self.monochrome_dialog_shown = true;
        } else {
            self.color_dialog_shown = true;
        }
    }
}
