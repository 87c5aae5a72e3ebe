//! Wizard step sequencing
//!
//! [`WizardStepGate`] owns the persisted [`WizardContent`] and decides which
//! step may be entered, when a step may be left, and what must be revisited
//! after an edit. Steps implement [`WizardStep`]: they rehydrate from the
//! content on load and flatten their state back into it on submit.
//!
//! # Design
//!
//! - A step after the current one is disabled, so the user cannot jump
//!   forward. Steps that only make sense with custom repositories are
//!   disabled unless the download configuration asked for them.
//! - Submitting is guarded twice: by the gate's own "next click in
//!   progress" flag, and by the step's `can_advance`.
//! - An edit on a step marks it and every later step unsaved.

pub mod content;
pub mod steps;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::error::Result;

pub use content::{
    ContentStore, DownloadConfig, GroupRecord, InMemoryContentStore, InstanceRecord,
    JsonFileContentStore, WizardContent,
};

/// Ordered wizard steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[derive(Serialize, Deserialize, Display, EnumString, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WizardStepId {
    #[default]
    InstallOptions,
    ConfigureDownload,
    SelectMpacks,
    CustomMpackRepos,
    DownloadMpacks,
    CustomProductRepos,
    VerifyProducts,
    Review,
}

impl WizardStepId {
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::iter().nth(index)
    }

    /// Steps that exist only to customize URLs
    pub const fn requires_custom_repo(self) -> bool {
        matches!(self, Self::CustomMpackRepos | Self::CustomProductRepos)
    }
}

/// Default forward-jump rule: a step after the current one is disabled
pub fn is_step_disabled(step_index: usize, current_index: usize) -> bool {
    step_index > current_index
}

/// One page of the wizard.
pub trait WizardStep {
    fn id(&self) -> WizardStepId;

    /// Rebuild the step's view from persisted content
    fn load(&mut self, content: &WizardContent) -> Result<()>;

    /// Step-local gate
    fn can_advance(&self) -> bool;

    /// Flatten the step's state into content
    fn save(&self, content: &mut WizardContent);

    /// Report and reset whether the user edited the step since the last call
    fn take_edited(&mut self) -> bool {
        false
    }
}

/// Result of a submit request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Saved and moved to the given step
    Advanced(WizardStepId),
    /// Saved; it was the last step
    Completed,
    /// The step's gate is closed
    Blocked,
    /// A previous submit has not finished its transition, or the step is
    /// not the current one
    Ignored,
}

/// Sequences steps over a [`ContentStore`].
#[derive(Debug)]
pub struct WizardStepGate<S: ContentStore> {
    store: S,
    content: WizardContent,
    next_click_in_progress: bool,
}

impl<S: ContentStore> WizardStepGate<S> {
    /// Open the wizard, resuming at the persisted step
    pub fn new(store: S) -> Result<Self> {
        let content = store.load()?;
        tracing::info!("Wizard opened at step {}", content.current_step);
        Ok(Self {
            store,
            content,
            next_click_in_progress: false,
        })
    }

    pub fn content(&self) -> &WizardContent {
        &self.content
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn current_step(&self) -> WizardStepId {
        self.content.current_step
    }

    pub fn next_click_in_progress(&self) -> bool {
        self.next_click_in_progress
    }

    /// Whether `step` cannot be entered from the current step
    pub fn is_step_disabled(&self, step: WizardStepId) -> bool {
        if is_step_disabled(step.index(), self.current_step().index()) {
            return true;
        }
        step.requires_custom_repo() && !self.content.download_config.use_custom_repo
    }

    pub fn is_step_saved(&self, step: WizardStepId) -> bool {
        self.content.is_step_saved(step)
    }

    /// Mark `step` and every later step unsaved
    pub fn set_step_unsaved(&mut self, step: WizardStepId) {
        for later in WizardStepId::iter().filter(|s| *s >= step) {
            self.content.steps_saved_state.insert(later, false);
        }
    }

    /// Fold a step's pending edits into the saved state
    pub fn record_edits<W: WizardStep + ?Sized>(&mut self, step: &mut W) {
        if step.take_edited() {
            tracing::debug!("Step {} edited", step.id());
            self.set_step_unsaved(step.id());
        }
    }

    /// Rehydrate `step` from the persisted content
    pub fn load_step<W: WizardStep + ?Sized>(&self, step: &mut W) -> Result<()> {
        tracing::debug!("Loading step {}", step.id());
        step.load(&self.content)
    }

    /// Save `step` and move to the next enabled step.
    ///
    /// The gate stays locked until [`Self::finish_transition`] is called by
    /// the shell once the next step is shown.
    pub fn submit<W: WizardStep + ?Sized>(&mut self, step: &mut W) -> Result<SubmitOutcome> {
        if self.next_click_in_progress {
            tracing::debug!("Ignoring submit of {}: transition in progress", step.id());
            return Ok(SubmitOutcome::Ignored);
        }
        if step.id() != self.current_step() {
            tracing::debug!(
                "Ignoring submit of {}: current step is {}",
                step.id(),
                self.current_step()
            );
            return Ok(SubmitOutcome::Ignored);
        }
        self.record_edits(step);
        if !step.can_advance() {
            return Ok(SubmitOutcome::Blocked);
        }

        self.next_click_in_progress = true;
        let previous = self.content.clone();
        step.save(&mut self.content);
        self.content.steps_saved_state.insert(step.id(), true);

        let outcome = match self.next_enabled_after(step.id()) {
            Some(next) => {
                self.content.current_step = next;
                SubmitOutcome::Advanced(next)
            }
            None => SubmitOutcome::Completed,
        };

        if let Err(e) = self.store.save(&self.content) {
            self.content = previous;
            self.next_click_in_progress = false;
            return Err(e);
        }
        tracing::info!("Step {} submitted: {:?}", step.id(), outcome);
        Ok(outcome)
    }

    /// Release the submit lock once the next step is displayed
    pub fn finish_transition(&mut self) {
        self.next_click_in_progress = false;
    }

    /// Go back to the previous enabled step. Content is kept as is.
    pub fn back(&mut self) -> Result<Option<WizardStepId>> {
        let current = self.current_step();
        let Some(previous) = WizardStepId::iter()
            .rev()
            .filter(|s| *s < current)
            .find(|s| self.is_reachable(*s))
        else {
            return Ok(None);
        };
        self.content.current_step = previous;
        self.store.save(&self.content)?;
        tracing::debug!("Back from {} to {}", current, previous);
        Ok(Some(previous))
    }

    /// Jump to an earlier (or the current) step
    pub fn go_to(&mut self, step: WizardStepId) -> Result<bool> {
        if self.is_step_disabled(step) {
            return Ok(false);
        }
        self.content.current_step = step;
        self.store.save(&self.content)?;
        Ok(true)
    }

    fn is_reachable(&self, step: WizardStepId) -> bool {
        !step.requires_custom_repo() || self.content.download_config.use_custom_repo
    }

    fn next_enabled_after(&self, step: WizardStepId) -> Option<WizardStepId> {
        WizardStepId::iter()
            .filter(|s| *s > step)
            .find(|s| self.is_reachable(*s))
    }
}
