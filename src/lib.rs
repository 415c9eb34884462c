use std::{
    fs,
    io::Cursor,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use ab_glyph::{point, FontVec, Point, PxScale};
use image::{imageops, DynamicImage, GrayImage, ImageFormat, ImageOutputFormat, Rgba, RgbaImage};
use nanorand::{Rng, WyRand};
use palette::{Pixel, Srgb};
use sat::{Rect, SummedAreaTable};
use tracing::{debug, info};

pub use error::{ActionError, ExportError, FontError, RenderError};
pub use fonts::{FontDescriptor, FontRegistry, FontSource};
pub use frequency::FrequencyMap;
pub use i18n::{Language, MessageKey};
pub use selector::{FontEvent, FontSelector, SelectorState, Transition};
pub use session::Session;
pub use tokenizer::{Segmenter, Strategy};

pub mod console;
pub mod error;
pub mod fonts;
pub mod frequency;
pub mod i18n;
pub mod normalize;
mod sat;
pub mod selector;
pub mod session;
mod text;
pub mod tokenizer;

pub const DEFAULT_WIDTH: u32 = 800;
pub const DEFAULT_HEIGHT: u32 = 600;
pub const DEFAULT_BACKGROUND: &str = "white";

/// A word placed on the canvas, handed to the colour function.
pub struct Word<'a> {
    pub text: &'a str,
    pub font_size: PxScale,
    pub rotated: bool,
    pub position: Point,
    pub frequency: f32,
    pub index: usize,
}

/// Turns a frequency map into a bitmap.
pub trait Renderer {
    fn render(&self, frequencies: &FrequencyMap, font: &FontSource)
        -> Result<RgbaImage, RenderError>;
}

/// The bitmap produced by one successful generation. Never mutated.
#[derive(Clone, Debug)]
pub struct RenderedImage {
    image: RgbaImage,
}

impl RenderedImage {
    pub fn new(image: RgbaImage) -> Self {
        RenderedImage { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.image
    }

    pub fn to_png_bytes(&self) -> Result<Vec<u8>, ExportError> {
        let mut bytes = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(self.image.clone()).write_to(&mut bytes, ImageOutputFormat::Png)?;
        Ok(bytes.into_inner())
    }

    /// Writes the image to `path`, the format taken from its extension.
    pub fn save(&self, path: &Path) -> Result<(), ExportError> {
        let result = match ImageFormat::from_path(path) {
            // no alpha channel in JPEG
            Ok(ImageFormat::Jpeg) => DynamicImage::ImageRgba8(self.image.clone())
                .into_rgb8()
                .save(path),
            _ => self.image.save(path),
        };

        result.map_err(|source| ExportError::Save {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Colour anchors of the viridis colormap, evenly spaced.
const VIRIDIS: [[u8; 3]; 9] = [
    [68, 1, 84],
    [71, 45, 123],
    [59, 82, 139],
    [44, 114, 142],
    [33, 145, 140],
    [40, 174, 128],
    [94, 201, 98],
    [173, 220, 48],
    [253, 231, 37],
];

pub struct WordCloud {
    background_color: Rgba<u8>,
    width: u32,
    height: u32,
    min_font_size: f32,
    max_font_size: Option<f32>,
    font_step: f32,
    word_margin: u32,
    word_rotate_chance: f64,
    relative_font_scaling: f32,
    max_words: usize,
    rng_seed: Option<u64>,
    default_font_paths: Vec<PathBuf>,
    default_font: OnceLock<Option<FontVec>>,
}

impl Default for WordCloud {
    fn default() -> Self {
        let mut default_font_paths = vec![PathBuf::from(fonts::BUNDLED_FONT)];
        default_font_paths.extend(fallback_font_paths());

        WordCloud {
            background_color: css_color(DEFAULT_BACKGROUND).unwrap_or(Rgba([255, 255, 255, 255])),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            min_font_size: 4.0,
            max_font_size: None,
            font_step: 1.0,
            word_margin: 2,
            // prefer horizontal placement 80% of the time
            word_rotate_chance: 0.20,
            relative_font_scaling: 0.5,
            max_words: 200,
            rng_seed: None,
            default_font_paths,
            default_font: OnceLock::new(),
        }
    }
}

impl WordCloud {
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_background_color(mut self, value: Rgba<u8>) -> Self {
        self.background_color = value;
        self
    }

    pub fn with_prefer_horizontal(mut self, value: f64) -> Self {
        self.word_rotate_chance = 1.0 - value.clamp(0.0, 1.0);
        self
    }

    pub fn with_max_words(mut self, value: usize) -> Self {
        self.max_words = value;
        self
    }

    pub fn with_min_font_size(mut self, value: f32) -> Self {
        self.min_font_size = value.max(1.0);
        self
    }

    pub fn with_max_font_size(mut self, value: Option<f32>) -> Self {
        self.max_font_size = value;
        self
    }

    pub fn with_font_step(mut self, value: f32) -> Self {
        self.font_step = value.max(1.0);
        self
    }

    pub fn with_word_margin(mut self, value: u32) -> Self {
        self.word_margin = value;
        self
    }

    pub fn with_relative_font_scaling(mut self, value: f32) -> Self {
        self.relative_font_scaling = value.clamp(0.0, 1.0);
        self
    }

    pub fn with_rng_seed(mut self, value: u64) -> Self {
        self.rng_seed = Some(value);
        self
    }

    /// Replaces the files tried, in order, for [`FontSource::Default`].
    pub fn with_default_font_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.default_font_paths = paths;
        self.default_font = OnceLock::new();
        self
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn default_font(&self) -> Result<&FontVec, RenderError> {
        self.default_font
            .get_or_init(|| {
                let font = self
                    .default_font_paths
                    .iter()
                    .filter(|path| path.is_file())
                    .find_map(|path| load_font(path).ok());

                font.or_else(|| {
                    fonts::system_font_dirs()
                        .iter()
                        .flat_map(|dir| fonts::find_font_files(dir))
                        .find_map(|path| load_font(&path).ok())
                })
            })
            .as_ref()
            .ok_or(RenderError::NoDefaultFont)
    }

    pub fn generate_from_frequencies(
        &self,
        frequencies: &FrequencyMap,
        font: &FontVec,
    ) -> Result<RgbaImage, RenderError> {
        self.generate_from_frequencies_with_color_func(frequencies, font, viridis_color_rgba)
    }

    pub fn generate_from_frequencies_with_color_func(
        &self,
        frequencies: &FrequencyMap,
        font: &FontVec,
        color_func: fn(&Word, &mut WyRand) -> Rgba<u8>,
    ) -> Result<RgbaImage, RenderError> {
        let words = frequencies.normalized(self.max_words);
        let first_word = words.first().ok_or(RenderError::NoWords)?;

        let mut rng = match self.rng_seed {
            Some(seed) => WyRand::new_seed(seed),
            None => WyRand::new(),
        };

        let mut gray_buffer = GrayImage::new(self.width, self.height);
        let mut summed_area_table = SummedAreaTable::from_occupancy(&gray_buffer);

        let mut font_size = self.initial_font_size(first_word.0, font);
        let mut last_freq = 1.0;
        let mut placed: Vec<(Word, GrayImage)> = Vec::with_capacity(words.len());

        'words: for (index, &(word, freq)) in words.iter().enumerate() {
            if self.relative_font_scaling != 0.0 && index != 0 {
                let rs = self.relative_font_scaling;
                font_size = ((rs * (freq / last_freq) + (1.0 - rs)) * font_size).round();
            }

            let mut rotated = self.roll_rotation(&mut rng);
            let mut tried_other_orientation = false;

            let (mask, position) = loop {
                if font_size < self.min_font_size {
                    debug!(target: "render", placed = placed.len(), "font_size_exhausted");
                    break 'words;
                }

                let Some(mask) = text::rasterize_word(word, font, PxScale::from(font_size)) else {
                    debug!(target: "render", word, "no_drawable_glyphs");
                    continue 'words;
                };
                let mask = if rotated {
                    imageops::rotate270(&mask)
                } else {
                    mask
                };

                let rect = Rect {
                    width: mask.width() + self.word_margin,
                    height: mask.height() + self.word_margin,
                };
                if let Some(position) = summed_area_table.find_space_for_rect(&rect, &mut rng) {
                    break (mask, position);
                }

                if !tried_other_orientation && self.word_rotate_chance > 0.0 {
                    rotated = !rotated;
                    tried_other_orientation = true;
                } else {
                    font_size -= self.font_step;
                    rotated = false;
                }
            };

            let (x, y) = (
                position.x + self.word_margin / 2,
                position.y + self.word_margin / 2,
            );
            text::mark_occupied(&mut gray_buffer, &mask, x, y);
            summed_area_table.update_from_row(&gray_buffer, y);

            placed.push((
                Word {
                    text: word,
                    font_size: PxScale::from(font_size),
                    rotated,
                    position: point(x as f32, y as f32),
                    frequency: freq,
                    index,
                },
                mask,
            ));
            last_freq = freq;
        }

        if placed.is_empty() {
            return Err(RenderError::NoSpace {
                width: self.width,
                height: self.height,
            });
        }

        info!(target: "render", placed = placed.len(), requested = words.len(), "layout_done");

        Ok(Self::generate_from_word_positions(
            &mut rng,
            self.width,
            self.height,
            placed,
            self.background_color,
            color_func,
        ))
    }

    fn generate_from_word_positions(
        rng: &mut WyRand,
        width: u32,
        height: u32,
        word_positions: Vec<(Word, GrayImage)>,
        background_color: Rgba<u8>,
        color_func: fn(&Word, &mut WyRand) -> Rgba<u8>,
    ) -> RgbaImage {
        let mut final_image_buffer = RgbaImage::from_pixel(width, height, background_color);

        for (word, mask) in word_positions {
            let col = color_func(&word, rng);

            text::draw_mask_to_rgba_buffer(
                &mut final_image_buffer,
                &mask,
                word.position.x as u32,
                word.position.y as u32,
                col,
            )
        }

        final_image_buffer
    }

    fn roll_rotation(&self, rng: &mut WyRand) -> bool {
        let threshold = (self.word_rotate_chance * 1000.0).round() as u32;
        rng.generate_range(0..1000u32) < threshold
    }

    //使用第一个词的长宽来作为参考
    fn initial_font_size(&self, text: &str, font: &FontVec) -> f32 {
        let max_height = self.height as f32 * 0.95;
        let ceiling = self.max_font_size.map_or(max_height, |max| max.min(max_height));

        let Some(mask) = text::rasterize_word(text, font, PxScale::from(max_height)) else {
            return ceiling;
        };

        // scale so that the first word spans the canvas width
        let usable_width = self.width.saturating_sub(self.word_margin) as f32;
        let fit_width = max_height * usable_width / mask.width() as f32;

        fit_width.min(ceiling).floor()
    }
}

impl Renderer for WordCloud {
    fn render(
        &self,
        frequencies: &FrequencyMap,
        font: &FontSource,
    ) -> Result<RgbaImage, RenderError> {
        if frequencies.is_empty() {
            return Err(RenderError::NoWords);
        }

        let loaded;
        let font = match font {
            FontSource::Default => self.default_font()?,
            FontSource::Path(path) => {
                loaded = load_font(path)?;
                &loaded
            }
        };

        self.generate_from_frequencies(frequencies, font)
    }
}

pub fn load_font(path: &Path) -> Result<FontVec, RenderError> {
    let font_file = fs::read(path).map_err(|source| RenderError::FontRead {
        path: path.to_path_buf(),
        source,
    })?;

    FontVec::try_from_vec(font_file).map_err(|_| RenderError::InvalidFont(path.to_path_buf()))
}

/// Parses a CSS colour such as `"white"` or `"#ff8800"`.
pub fn css_color(value: &str) -> Option<Rgba<u8>> {
    csscolorparser::parse(value)
        .ok()
        .map(|color| Rgba(color.to_rgba8()))
}

/// Samples the viridis palette at `t` in `[0, 1]`.
pub fn viridis(t: f32) -> Rgba<u8> {
    let scaled = t.clamp(0.0, 1.0) * (VIRIDIS.len() - 1) as f32;
    let lower = scaled.floor() as usize;
    let upper = (lower + 1).min(VIRIDIS.len() - 1);
    let frac = scaled - lower as f32;

    let channel = |i: usize| {
        let (a, b) = (VIRIDIS[lower][i] as f32, VIRIDIS[upper][i] as f32);
        (a + (b - a) * frac) / 255.0
    };

    let rgb: Srgb = Srgb::new(channel(0), channel(1), channel(2));
    let raw: [u8; 3] = rgb.into_format().into_raw();

    Rgba([raw[0], raw[1], raw[2], 0xFF])
}

fn viridis_color_rgba(_: &Word, rng: &mut WyRand) -> Rgba<u8> {
    let position: u32 = rng.generate_range(0..=1000);
    viridis(position as f32 / 1000.0)
}

#[cfg(target_os = "windows")]
fn fallback_font_paths() -> Vec<PathBuf> {
    let windir = std::env::var_os("WINDIR").unwrap_or_else(|| "C:\\Windows".into());
    let dir = PathBuf::from(windir).join("Fonts");
    ["msyh.ttc", "simhei.ttf", "segoeui.ttf", "arial.ttf"]
        .iter()
        .map(|name| dir.join(name))
        .collect()
}

#[cfg(target_os = "macos")]
fn fallback_font_paths() -> Vec<PathBuf> {
    [
        "/System/Library/Fonts/STHeiti Light.ttc",
        "/System/Library/Fonts/Supplemental/Arial Unicode.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        "/Library/Fonts/Arial.ttf",
    ]
    .iter()
    .map(PathBuf::from)
    .collect()
}

#[cfg(not(any(target_os = "macos", windows)))]
fn fallback_font_paths() -> Vec<PathBuf> {
    [
        "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
        "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
        "/usr/share/fonts/truetype/wqy/wqy-microhei.ttc",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    ]
    .iter()
    .map(PathBuf::from)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viridis_endpoints() {
        assert_eq!(viridis(0.0), Rgba([68, 1, 84, 255]));
        assert_eq!(viridis(1.0), Rgba([253, 231, 37, 255]));
        assert_eq!(viridis(0.5), Rgba([33, 145, 140, 255]));
        assert_eq!(viridis(7.0), viridis(1.0));
    }

    #[test]
    fn parses_css_colors() {
        assert_eq!(css_color("white"), Some(Rgba([255, 255, 255, 255])));
        assert_eq!(css_color("#ff8800"), Some(Rgba([255, 136, 0, 255])));
        assert_eq!(css_color("not a colour"), None);
    }

    #[test]
    fn empty_frequencies_are_rejected_before_font_loading() {
        let cloud = WordCloud::default().with_default_font_paths(vec![]);
        let result = cloud.render(&FrequencyMap::default(), &FontSource::Default);
        assert!(matches!(result, Err(RenderError::NoWords)));
    }

    #[test]
    fn missing_font_file_is_a_render_error() {
        let cloud = WordCloud::default();
        let frequencies = FrequencyMap::from_text("cat\ncat\ndog");
        let result = cloud.render(
            &frequencies,
            &FontSource::Path(PathBuf::from("/definitely/not/here.ttf")),
        );
        assert!(matches!(result, Err(RenderError::FontRead { .. })));
    }

    #[test]
    fn garbage_font_file_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ttf");
        fs::write(&path, b"definitely not a font").unwrap();

        let result = WordCloud::default().render(
            &FrequencyMap::from_text("cat"),
            &FontSource::Path(path),
        );
        assert!(matches!(result, Err(RenderError::InvalidFont(_))));
    }

    #[test]
    fn saves_png_and_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let image = RenderedImage::new(RgbaImage::from_pixel(8, 6, Rgba([255, 255, 255, 255])));

        let png = dir.path().join("cloud.png");
        image.save(&png).unwrap();
        assert_eq!(image::open(&png).unwrap().width(), 8);

        let jpg = dir.path().join("cloud.jpg");
        image.save(&jpg).unwrap();
        assert_eq!(image::open(&jpg).unwrap().height(), 6);

        let bytes = image.to_png_bytes().unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn unwritable_path_is_an_export_error() {
        let image = RenderedImage::new(RgbaImage::new(2, 2));
        let result = image.save(Path::new("/definitely/not/here/cloud.png"));
        assert!(matches!(result, Err(ExportError::Save { .. })));
    }
}
