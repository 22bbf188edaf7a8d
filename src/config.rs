use std::path::PathBuf;

use clap::Args;

use crate::export::{JPEG_QUALITY, PDF_DPI};
use crate::history::MAX_HISTORY;
use crate::template::TemplatePaths;

pub const DEFAULT_LIST_LIMIT: usize = 10;

/// Runtime settings, filled from global command-line flags and environment.
#[derive(Debug, Clone, Args)]
pub struct Settings {
    /// Directory holding img/cardapio_fundo.jpg and fonts/
    #[arg(long, env = "CARDAPIO_ASSETS_DIR", default_value = "assets", global = true)]
    pub assets_dir: PathBuf,

    /// Directory where saved menus are kept
    #[arg(long, env = "CARDAPIO_HISTORY_DIR", default_value = "history", global = true)]
    pub history_dir: PathBuf,

    /// Maximum number of menus kept in history
    #[arg(long, default_value_t = MAX_HISTORY, global = true)]
    pub retention: usize,

    /// Number of menus `history` shows by default
    #[arg(long, default_value_t = DEFAULT_LIST_LIMIT, global = true)]
    pub list_limit: usize,

    #[arg(long, default_value_t = JPEG_QUALITY, global = true,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    pub jpeg_quality: u8,

    #[arg(long, default_value_t = PDF_DPI, global = true)]
    pub pdf_dpi: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            assets_dir: PathBuf::from("assets"),
            history_dir: PathBuf::from("history"),
            retention: MAX_HISTORY,
            list_limit: DEFAULT_LIST_LIMIT,
            jpeg_quality: JPEG_QUALITY,
            pdf_dpi: PDF_DPI,
        }
    }
}

impl Settings {
    pub fn template_paths(&self) -> TemplatePaths {
        TemplatePaths::in_dir(&self.assets_dir)
    }
}
