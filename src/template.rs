//! Background image and font assets the board is drawn on.

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use image::RgbImage;
use rusttype::Font;

use crate::error::{MenuError, Result};
use crate::layout::{DATE_FONT_PX, ENTRY_FONT_PX};

/// Pixel multiplier for the built-in 8x8 font.
pub const BUILTIN_SCALE: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplatePaths {
    pub background: PathBuf,
    pub regular_font: PathBuf,
    pub light_font: PathBuf,
    pub bold_font: PathBuf,
}

impl TemplatePaths {
    pub fn in_dir(assets_dir: &Path) -> Self {
        let fonts = assets_dir.join("fonts");
        Self {
            background: assets_dir.join("img").join("cardapio_fundo.jpg"),
            regular_font: fonts.join("Roboto-Regular.ttf"),
            light_font: fonts.join("Roboto-ExtraLight.ttf"),
            bold_font: fonts.join("Roboto-Bold.ttf"),
        }
    }
}

impl Default for TemplatePaths {
    fn default() -> Self {
        Self::in_dir(Path::new("assets"))
    }
}

/// A typeface at a fixed size.
#[derive(Clone)]
pub enum Face {
    Outline { font: Font<'static>, px: f32 },
    Builtin { scale: u32 },
}

impl Face {
    pub fn is_builtin(&self) -> bool {
        matches!(self, Face::Builtin { .. })
    }
}

/// Fonts for the three text roles of the board.
#[derive(Clone)]
pub struct FontSet {
    pub product: Face,
    pub price: Face,
    pub date: Face,
}

impl FontSet {
    pub fn builtin() -> Self {
        let face = Face::Builtin {
            scale: BUILTIN_SCALE,
        };
        Self {
            product: face.clone(),
            price: face.clone(),
            date: face,
        }
    }

    /// Loads the three outline fonts. If any of them fails, every role falls
    /// back to the built-in font and a warning is returned.
    pub fn load(paths: &TemplatePaths) -> (Self, Option<FontWarning>) {
        let loaded = load_font(&paths.regular_font).and_then(|regular| {
            let light = load_font(&paths.light_font)?;
            let bold = load_font(&paths.bold_font)?;
            Ok((regular, light, bold))
        });

        match loaded {
            Ok((regular, light, bold)) => (
                Self {
                    product: Face::Outline {
                        font: regular,
                        px: ENTRY_FONT_PX,
                    },
                    price: Face::Outline {
                        font: light,
                        px: ENTRY_FONT_PX,
                    },
                    date: Face::Outline {
                        font: bold,
                        px: DATE_FONT_PX,
                    },
                },
                None,
            ),
            Err(warning) => {
                log::warn!("{}", warning);
                (Self::builtin(), Some(warning))
            }
        }
    }
}

/// Non-fatal font loading failure; rendering continues with the built-in font.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontWarning {
    pub path: PathBuf,
    pub reason: String,
}

impl fmt::Display for FontWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "using built-in font, could not load {}: {}",
            self.path.display(),
            self.reason
        )
    }
}

fn load_font(path: &Path) -> std::result::Result<Font<'static>, FontWarning> {
    let bytes = fs::read(path).map_err(|e| FontWarning {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Font::try_from_vec(bytes).ok_or_else(|| FontWarning {
        path: path.to_path_buf(),
        reason: "not a TrueType/OpenType font".to_string(),
    })
}

pub struct Template {
    pub background: RgbImage,
    pub fonts: FontSet,
}

impl Template {
    pub fn from_parts(background: RgbImage, fonts: FontSet) -> Self {
        Self { background, fonts }
    }

    /// Reads the background and fonts from disk. The background is required;
    /// fonts degrade to the built-in face.
    pub fn load(paths: &TemplatePaths) -> Result<(Self, Option<FontWarning>)> {
        let background = load_background(&paths.background)?;
        let (fonts, warning) = FontSet::load(paths);
        log::debug!(
            "Template loaded: {}x{} background, builtin fonts: {}",
            background.width(),
            background.height(),
            fonts.product.is_builtin()
        );
        Ok((Self { background, fonts }, warning))
    }
}

fn load_background(path: &Path) -> Result<RgbImage> {
    let bytes = fs::read(path).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            log::error!("Background image not found: {}", path.display());
            MenuError::TemplateMissing(path.to_path_buf())
        } else {
            MenuError::Io(e)
        }
    })?;
    let image = image::load_from_memory(&bytes).map_err(|source| MenuError::TemplateDecode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(image.to_rgb8())
}
