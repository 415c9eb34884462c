//! State of one interactive session.
//!
//! Every action either succeeds and replaces what it owns, or fails and
//! leaves the previous frequencies, image and font list exactly as they were.

use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use tracing::{debug, error, info, warn};

use crate::{
    error::ActionError,
    fonts::{FontRegistry, FontSource},
    frequency::FrequencyMap,
    i18n::{Language, MessageKey},
    normalize,
    selector::{FontEvent, FontSelector, Transition},
    tokenizer::Segmenter,
    RenderedImage, Renderer,
};

pub const DEFAULT_EXPORT_NAME: &str = "wordcloud.png";

/// Held for the duration of a generation. Dropping it clears the flag on
/// every exit path.
pub struct BusyGuard {
    flag: Arc<AtomicBool>,
}

impl BusyGuard {
    pub fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard { flag: flag.clone() })
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

pub struct Session<R: Renderer> {
    language: Language,
    renderer: R,
    segmenter: Segmenter,
    fonts: FontRegistry,
    selector: FontSelector,
    buffer: String,
    frequencies: Option<FrequencyMap>,
    image: Option<RenderedImage>,
    busy: Arc<AtomicBool>,
}

impl<R: Renderer> Session<R> {
    pub fn new(language: Language, renderer: R, fonts: FontRegistry) -> Self {
        Session {
            language,
            renderer,
            segmenter: Segmenter::default(),
            fonts,
            selector: FontSelector::default(),
            buffer: String::new(),
            frequencies: None,
            image: None,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_segmenter(mut self, segmenter: Segmenter) -> Self {
        self.segmenter = segmenter;
        self
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn set_language(&mut self, language: Language) {
        info!(target: "session", %language, "language_changed");
        self.language = language;
    }

    pub fn tr(&self, key: MessageKey) -> &'static str {
        self.language.tr(key)
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.buffer = text.into();
    }

    pub fn append_line(&mut self, line: &str) {
        if !self.buffer.is_empty() && !self.buffer.ends_with('\n') {
            self.buffer.push('\n');
        }
        self.buffer.push_str(line);
    }

    pub fn clear_text(&mut self) {
        self.buffer.clear();
    }

    pub fn fonts(&self) -> &FontRegistry {
        &self.fonts
    }

    pub fn selector(&self) -> &FontSelector {
        &self.selector
    }

    pub fn font_source(&self) -> FontSource {
        self.selector.current_source(&self.fonts)
    }

    pub fn frequencies(&self) -> Option<&FrequencyMap> {
        self.frequencies.as_ref()
    }

    pub fn image(&self) -> Option<&RenderedImage> {
        self.image.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Shared handle to the in-flight flag, for front-ends that render off
    /// the UI thread.
    pub fn busy_flag(&self) -> Arc<AtomicBool> {
        self.busy.clone()
    }

    /// Replaces the edit buffer with one segmented token per line.
    /// Returns the number of tokens written.
    pub fn split_buffer(&mut self) -> Result<usize, ActionError> {
        if self.buffer.trim().is_empty() {
            debug!(target: "session", "split_empty_input");
            return Err(ActionError::EmptyInput);
        }

        let split = self.segmenter.split_to_lines(&self.buffer);
        let count = split.lines().count();
        self.buffer = split;

        info!(target: "session", tokens = count, "buffer_split");
        Ok(count)
    }

    /// Counts the buffer one word per line and renders it with the current font.
    pub fn generate(&mut self) -> Result<&RenderedImage, ActionError> {
        if self.buffer.trim().is_empty() {
            debug!(target: "session", "generate_empty_input");
            return Err(ActionError::EmptyInput);
        }

        let frequencies = FrequencyMap::from_tokens(normalize::normalize_lines(&self.buffer));
        if frequencies.is_empty() {
            debug!(target: "session", "generate_no_valid_words");
            return Err(ActionError::NoValidWords);
        }

        let Some(_guard) = BusyGuard::acquire(&self.busy) else {
            warn!(target: "session", "generate_rejected_in_flight");
            return Err(ActionError::Busy);
        };

        let font = self.font_source();
        debug!(
            target: "session",
            words = frequencies.len(),
            total = frequencies.total(),
            font = ?font,
            "generate"
        );

        let bitmap = self.renderer.render(&frequencies, &font).map_err(|err| {
            error!(target: "session", %err, "generate_failed");
            ActionError::from(err)
        })?;

        info!(
            target: "session",
            width = bitmap.width(),
            height = bitmap.height(),
            words = frequencies.len(),
            "generated"
        );
        self.frequencies = Some(frequencies);
        Ok(self.image.insert(RenderedImage::new(bitmap)))
    }

    pub fn png_bytes(&self) -> Result<Vec<u8>, ActionError> {
        let image = self.image.as_ref().ok_or(ActionError::NoImage)?;
        Ok(image.to_png_bytes()?)
    }

    /// Writes the current image. A failed export keeps the image for a retry.
    pub fn export(&self, path: &Path) -> Result<(), ActionError> {
        let image = self.image.as_ref().ok_or(ActionError::NoImage)?;

        image.save(path).map_err(|err| {
            error!(target: "session", path = %path.display(), %err, "export_failed");
            ActionError::from(err)
        })?;

        info!(target: "session", path = %path.display(), "exported");
        Ok(())
    }

    pub fn handle_font_event(&mut self, event: FontEvent) -> Result<Transition, ActionError> {
        Ok(self.selector.handle(event, &mut self.fonts)?)
    }

    pub fn font_label(&self, index: usize) -> Option<&str> {
        if index == FontSelector::add_entry_index(&self.fonts) {
            return Some(self.tr(MessageKey::AddFontEntry));
        }
        self.fonts.label(index, self.tr(MessageKey::DefaultFont))
    }
}

/// `~/wordcloud.png`, or the bare file name when there is no home directory.
pub fn default_export_path() -> PathBuf {
    let home = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE"));
    match home {
        Some(home) => PathBuf::from(home).join(DEFAULT_EXPORT_NAME),
        None => PathBuf::from(DEFAULT_EXPORT_NAME),
    }
}
