//! Font choice state machine.
//!
//! Choices are numbered like the font list shown to the user: the default
//! font at 0, registered fonts after it, and one trailing "add font" entry
//! that opens the picker instead of selecting anything. Leaving the picker
//! without a usable font restores the last valid choice.

use std::path::PathBuf;

use tracing::debug;

use crate::error::FontError;
use crate::fonts::{FontRegistry, FontSource};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SelectorState {
    #[default]
    Idle,
    FontPickerOpen,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FontEvent {
    Select(usize),
    /// `None` when the picker was cancelled.
    PickerClosed(Option<PathBuf>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    Selected(usize),
    PickerOpened,
    PickerCancelled(usize),
    Ignored,
}

#[derive(Clone, Debug, Default)]
pub struct FontSelector {
    state: SelectorState,
    current: usize,
    last_valid: usize,
}

impl FontSelector {
    pub fn state(&self) -> SelectorState {
        self.state
    }

    pub fn current(&self) -> usize {
        self.current
    }

    /// Index of the "add font" entry for a given registry.
    pub fn add_entry_index(registry: &FontRegistry) -> usize {
        registry.choice_count()
    }

    pub fn current_source(&self, registry: &FontRegistry) -> FontSource {
        registry
            .source(self.current)
            .unwrap_or(FontSource::Default)
    }

    pub fn handle(
        &mut self,
        event: FontEvent,
        registry: &mut FontRegistry,
    ) -> Result<Transition, FontError> {
        let transition = match (self.state, event) {
            (SelectorState::Idle, FontEvent::Select(index)) => {
                if index == Self::add_entry_index(registry) {
                    self.state = SelectorState::FontPickerOpen;
                    Transition::PickerOpened
                } else if index < registry.choice_count() {
                    self.current = index;
                    self.last_valid = index;
                    Transition::Selected(index)
                } else {
                    return Err(FontError::NoSuchEntry(index));
                }
            }
            (SelectorState::FontPickerOpen, FontEvent::PickerClosed(None)) => {
                self.rollback();
                Transition::PickerCancelled(self.current)
            }
            (SelectorState::FontPickerOpen, FontEvent::PickerClosed(Some(path))) => {
                match registry.add_user_font(&path) {
                    Ok(index) => {
                        self.state = SelectorState::Idle;
                        self.current = index;
                        self.last_valid = index;
                        Transition::Selected(index)
                    }
                    Err(err) => {
                        self.rollback();
                        return Err(err);
                    }
                }
            }
            (SelectorState::FontPickerOpen, FontEvent::Select(_))
            | (SelectorState::Idle, FontEvent::PickerClosed(_)) => Transition::Ignored,
        };

        debug!(target: "fonts", ?transition, state = ?self.state, "font_selector");

        Ok(transition)
    }

    fn rollback(&mut self) {
        self.state = SelectorState::Idle;
        self.current = self.last_valid;
    }
}
