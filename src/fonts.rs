//! Font discovery and the session's font list.
//!
//! Every font file is known by a display name read from its `name` table.
//! Names are unique within a registry: while scanning, the first file to
//! claim a name wins and later ones are dropped; a font added by the user
//! that collides with an existing name is rejected.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use regex::Regex;
use tracing::{debug, info, warn};
use ttf_parser::{name_id, Face};
use walkdir::WalkDir;

use crate::{
    error::FontError,
    i18n::{Language, MessageKey},
};

/// Font shipped next to the executable, used when present.
pub const BUNDLED_FONT: &str = "./SMILEYSANS.TTF";

pub const PLACEHOLDER_NAME: &str = "Unknown Font";

const FONT_EXTENSIONS: [&str; 2] = ["ttf", "otf"];

const ENGLISH_US: u16 = 0x0409;

static NAME_CONTROL_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\p{Cc}").expect("Unable to compile font name regex"));

static NAME_DISALLOWED_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^\p{L}\p{N}\s\-_.,'&()+!?:/#@\u{4E00}-\u{9FFF}]")
        .expect("Unable to compile font name regex")
});

static WHITESPACE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Unable to compile font name regex"));

/// Where a font comes from at render time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FontSource {
    /// Whatever the renderer uses when it is not given a font.
    Default,
    Path(PathBuf),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FontDescriptor {
    pub name: String,
    pub path: PathBuf,
}

/// Display names mapped to font files.
///
/// Index 0 of the public numbering is always the default font; registered
/// files follow from index 1 in registration order.
#[derive(Clone, Debug, Default)]
pub struct FontRegistry {
    entries: Vec<FontDescriptor>,
}

impl FontRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The startup registry: the bundled font, then every system font.
    pub fn discover() -> Self {
        let mut registry = Self::new();

        let bundled = PathBuf::from(BUNDLED_FONT);
        if bundled.is_file() {
            registry.register(&bundled);
        }

        let added = registry.scan_dirs(&system_font_dirs());
        info!(target: "fonts", added, total = registry.len(), "font_discovery");

        registry
    }

    /// Registers every `.ttf`/`.otf` below `dirs`. Returns how many were kept.
    pub fn scan_dirs(&mut self, dirs: &[PathBuf]) -> usize {
        dirs.iter()
            .flat_map(|dir| find_font_files(dir))
            .filter(|path| self.register(path))
            .count()
    }

    /// Startup registration: a file whose name is taken is silently skipped.
    pub fn register(&mut self, path: &Path) -> bool {
        let name = display_name(path);

        if self.is_taken(&name) {
            debug!(target: "fonts", name = %name, path = %path.display(), "duplicate_font_skipped");
            return false;
        }

        self.entries.push(FontDescriptor {
            name,
            path: path.to_path_buf(),
        });
        true
    }

    /// A font picked by the user. Returns the new entry's index.
    pub fn add_user_font(&mut self, path: &Path) -> Result<usize, FontError> {
        if !is_font_file(path) {
            return Err(FontError::NotAFont(path.to_path_buf()));
        }

        let name = display_name(path);
        if self.is_taken(&name) {
            warn!(target: "fonts", name = %name, path = %path.display(), "duplicate_font_rejected");
            return Err(FontError::DuplicateName(name));
        }

        info!(target: "fonts", name = %name, path = %path.display(), "font_added");
        self.entries.push(FontDescriptor {
            name,
            path: path.to_path_buf(),
        });

        Ok(self.entries.len())
    }

    /// Registered names plus the default entry's label in every language.
    fn is_taken(&self, name: &str) -> bool {
        self.contains(name)
            || Language::ALL
                .iter()
                .any(|lang| lang.tr(MessageKey::DefaultFont) == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry.name == name)
    }

    /// Number of registered files, not counting the default entry.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[FontDescriptor] {
        &self.entries
    }

    /// Number of selectable choices including the default entry.
    pub fn choice_count(&self) -> usize {
        self.entries.len() + 1
    }

    pub fn source(&self, index: usize) -> Option<FontSource> {
        match index {
            0 => Some(FontSource::Default),
            i => self
                .entries
                .get(i - 1)
                .map(|entry| FontSource::Path(entry.path.clone())),
        }
    }

    /// Display name of a choice; `default_label` names index 0.
    pub fn label<'a>(&'a self, index: usize, default_label: &'a str) -> Option<&'a str> {
        match index {
            0 => Some(default_label),
            i => self.entries.get(i - 1).map(|entry| entry.name.as_str()),
        }
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.name == name)
            .map(|i| i + 1)
    }
}

pub fn is_font_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| FONT_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

/// Font files under `dir`, recursively, in file-name order.
pub fn find_font_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                debug!(target: "fonts", %err, "font_dir_entry_skipped");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_font_file(entry.path()))
        .map(|entry| entry.into_path())
        .collect()
}

#[cfg(target_os = "windows")]
pub fn system_font_dirs() -> Vec<PathBuf> {
    let windir = std::env::var_os("WINDIR").unwrap_or_else(|| "C:\\Windows".into());
    vec![PathBuf::from(windir).join("Fonts")]
}

#[cfg(target_os = "macos")]
pub fn system_font_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![
        PathBuf::from("/System/Library/Fonts"),
        PathBuf::from("/Library/Fonts"),
    ];
    if let Some(home) = std::env::var_os("HOME") {
        dirs.push(PathBuf::from(home).join("Library/Fonts"));
    }
    dirs
}

#[cfg(not(any(target_os = "macos", windows)))]
pub fn system_font_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![
        PathBuf::from("/usr/share/fonts"),
        PathBuf::from("/usr/local/share/fonts"),
    ];
    if let Some(home) = std::env::var_os("HOME") {
        dirs.push(PathBuf::from(home).join(".local/share/fonts"));
    }
    dirs
}

/// Human-readable name for a font file.
///
/// Full name record, then family record, then the file stem, then
/// [`PLACEHOLDER_NAME`].
pub fn display_name(path: &Path) -> String {
    metadata_name(path)
        .or_else(|| {
            path.file_stem()
                .map(|stem| clean_font_name(&stem.to_string_lossy()))
                .filter(|name| !name.is_empty())
        })
        .unwrap_or_else(|| PLACEHOLDER_NAME.to_string())
}

fn metadata_name(path: &Path) -> Option<String> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(err) => {
            debug!(target: "fonts", path = %path.display(), %err, "font_read_failed");
            return None;
        }
    };

    let face = match Face::parse(&data, 0) {
        Ok(face) => face,
        Err(err) => {
            debug!(target: "fonts", path = %path.display(), %err, "font_parse_failed");
            return None;
        }
    };

    name_record(&face, name_id::FULL_NAME).or_else(|| name_record(&face, name_id::FAMILY))
}

/// First usable record with `id`, preferring US English.
fn name_record(face: &Face, id: u16) -> Option<String> {
    let mut fallback = None;

    for name in face.names() {
        if name.name_id != id {
            continue;
        }
        let Some(raw) = name.to_string() else {
            continue;
        };
        let cleaned = clean_font_name(&raw);
        if cleaned.is_empty() {
            continue;
        }
        if name.language_id == ENGLISH_US {
            return Some(cleaned);
        }
        fallback.get_or_insert(cleaned);
    }

    fallback
}

/// Drops control and unusual characters, collapses whitespace runs.
pub fn clean_font_name(raw: &str) -> String {
    let without_controls = NAME_CONTROL_CHARS.replace_all(raw, "");
    let allowed = NAME_DISALLOWED_CHARS.replace_all(&without_controls, "");

    WHITESPACE_RUNS.replace_all(&allowed, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"not really a font").unwrap();
        path
    }

    #[test]
    fn cleans_font_names() {
        assert_eq!(clean_font_name("  Example\u{0}  Sans  Bold "), "Example Sans Bold");
        assert_eq!(clean_font_name("Example\u{0}Sans"), "ExampleSans");
        assert_eq!(clean_font_name("Example\tSans"), "ExampleSans");
        assert_eq!(clean_font_name("Noto Sans CJK SC ™"), "Noto Sans CJK SC");
        assert_eq!(clean_font_name("思源黑体 Regular"), "思源黑体 Regular");
        assert_eq!(clean_font_name("\u{1}\u{2}"), "");
    }

    #[test]
    fn first_file_wins_for_duplicate_names() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let kept = touch(first.path(), "Example Sans.ttf");
        touch(second.path(), "Example Sans.otf");

        let mut registry = FontRegistry::new();
        let added =
            registry.scan_dirs(&[first.path().to_path_buf(), second.path().to_path_buf()]);

        assert_eq!(added, 1);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.entries()[0].name, "Example Sans");
        assert_eq!(registry.entries()[0].path, kept);
    }

    #[test]
    fn scan_is_recursive_and_filters_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("truetype/example");
        fs::create_dir_all(&nested).unwrap();
        touch(&nested, "Alpha.TTF");
        touch(dir.path(), "Beta.otf");
        touch(dir.path(), "readme.txt");
        touch(dir.path(), "Gamma.ttc");

        let files = find_font_files(dir.path());
        assert_eq!(files.len(), 2);

        let mut registry = FontRegistry::new();
        registry.scan_dirs(&[dir.path().to_path_buf()]);
        assert!(registry.contains("Alpha"));
        assert!(registry.contains("Beta"));
    }

    #[test]
    fn user_font_collision_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let other = tempfile::tempdir().unwrap();
        let existing = touch(dir.path(), "Example Sans.ttf");
        let clash = touch(other.path(), "Example Sans.ttf");

        let mut registry = FontRegistry::new();
        assert!(registry.register(&existing));

        let err = registry.add_user_font(&clash).unwrap_err();
        assert!(matches!(err, FontError::DuplicateName(ref name) if name == "Example Sans"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.entries()[0].path, existing);
    }

    #[test]
    fn user_font_cannot_take_the_default_label() {
        let dir = tempfile::tempdir().unwrap();
        let english = touch(dir.path(), "Default font.ttf");
        let chinese = touch(dir.path(), "默认字体.otf");

        let mut registry = FontRegistry::new();
        assert!(matches!(
            registry.add_user_font(&english),
            Err(FontError::DuplicateName(ref name)) if name == "Default font"
        ));
        assert!(matches!(
            registry.add_user_font(&chinese),
            Err(FontError::DuplicateName(ref name)) if name == "默认字体"
        ));
        assert!(!registry.register(&english));
        assert!(registry.is_empty());
    }

    #[test]
    fn user_font_gets_next_index() {
        let dir = tempfile::tempdir().unwrap();
        let a = touch(dir.path(), "A.ttf");
        let b = touch(dir.path(), "B.otf");

        let mut registry = FontRegistry::new();
        registry.register(&a);
        assert_eq!(registry.add_user_font(&b).unwrap(), 2);
        assert_eq!(registry.source(2), Some(FontSource::Path(b)));
        assert_eq!(registry.source(0), Some(FontSource::Default));
        assert_eq!(registry.source(3), None);
        assert_eq!(registry.label(0, "Default font"), Some("Default font"));
        assert_eq!(registry.index_of("A"), Some(1));
    }

    #[test]
    fn non_font_files_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let txt = touch(dir.path(), "notes.txt");

        let mut registry = FontRegistry::new();
        assert!(matches!(
            registry.add_user_font(&txt),
            Err(FontError::NotAFont(_))
        ));
    }

    #[test]
    fn unreadable_metadata_falls_back_to_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = touch(dir.path(), "Some Font-Bold.ttf");
        assert_eq!(display_name(&path), "Some Font-Bold");

        let weird = touch(dir.path(), "\u{1}.ttf");
        assert_eq!(display_name(&weird), PLACEHOLDER_NAME);
    }
}
