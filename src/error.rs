use std::path::PathBuf;

use thiserror::Error;

use crate::i18n::{Language, MessageKey};

/// Failures of the rendering step. Prior session state is never touched.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("there are no words to draw")]
    NoWords,

    #[error("unable to read font file {path}: {source}")]
    FontRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("font file {0} may be invalid")]
    InvalidFont(PathBuf),

    #[error("no default font is available")]
    NoDefaultFont,

    #[error("couldn't find space to draw any word in a {width}x{height} canvas")]
    NoSpace { width: u32, height: u32 },
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("unable to save image to {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("unable to encode image: {0}")]
    Encode(#[from] image::ImageError),
}

#[derive(Error, Debug)]
pub enum FontError {
    #[error("a font named \"{0}\" is already registered")]
    DuplicateName(String),

    #[error("not a font file: {0}")]
    NotAFont(PathBuf),

    #[error("no font entry at index {0}")]
    NoSuchEntry(usize),
}

/// Terminal outcome of one user action. None of these crash the process.
#[derive(Error, Debug)]
pub enum ActionError {
    #[error("no input text")]
    EmptyInput,

    #[error("no valid word in input")]
    NoValidWords,

    #[error("a generation is already in progress")]
    Busy,

    #[error("nothing has been generated yet")]
    NoImage,

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Font(#[from] FontError),
}

impl ActionError {
    /// Localized text shown to the user for this failure.
    pub fn user_message(&self, lang: Language) -> String {
        match self {
            ActionError::EmptyInput => lang.tr(MessageKey::EmptyInput).to_string(),
            ActionError::NoValidWords => lang.tr(MessageKey::NoValidWords).to_string(),
            ActionError::Busy => lang.tr(MessageKey::Busy).to_string(),
            ActionError::NoImage => lang.tr(MessageKey::NoImage).to_string(),
            ActionError::Render(err) => lang.fill(MessageKey::GenerateFailed, err),
            ActionError::Export(err) => lang.fill(MessageKey::SaveFailed, err),
            ActionError::Font(FontError::DuplicateName(name)) => {
                lang.fill(MessageKey::DuplicateFont, name)
            }
            ActionError::Font(err) => lang.fill(MessageKey::FontAddFailed, err),
        }
    }

    /// Warnings are recoverable input problems; everything else is an error dialog.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            ActionError::EmptyInput
                | ActionError::NoValidWords
                | ActionError::Busy
                | ActionError::NoImage
                | ActionError::Font(FontError::DuplicateName(_))
        )
    }
}
