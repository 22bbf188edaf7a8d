//! One operator's working state: the form-driven render and what happens to it.

use crate::config::Settings;
use crate::error::{MenuError, Result};
use crate::export::{self, Exports};
use crate::history::HistoryManager;
use crate::renderer::{self, RenderedMenu};
use crate::template::{Template, TemplatePaths};
use crate::types::{HistoryRecord, MenuForm};

pub struct MenuSession {
    template_paths: TemplatePaths,
    history: HistoryManager,
    jpeg_quality: u8,
    pdf_dpi: f32,
    current: Option<RenderedMenu>,
}

impl MenuSession {
    pub fn new(template_paths: TemplatePaths, history: HistoryManager) -> Self {
        Self {
            template_paths,
            history,
            jpeg_quality: export::JPEG_QUALITY,
            pdf_dpi: export::PDF_DPI,
            current: None,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let history = HistoryManager::new(&settings.history_dir, settings.retention)?
            .with_quality(settings.jpeg_quality);
        let mut session = Self::new(settings.template_paths(), history);
        session.jpeg_quality = settings.jpeg_quality;
        session.pdf_dpi = settings.pdf_dpi;
        Ok(session)
    }

    /// Renders the form against a freshly loaded template and makes it the
    /// current board. On failure there is no current board afterwards.
    pub fn submit(&mut self, form: &MenuForm) -> Result<&RenderedMenu> {
        self.current = None;

        let request = form.to_request()?;
        let (template, warning) = Template::load(&self.template_paths)?;
        let image = renderer::render_menu(&template, &request);

        log::info!(
            "Menu generated for {:?}: {}x{}",
            request.date,
            image.width(),
            image.height()
        );

        Ok(self.current.insert(RenderedMenu {
            image,
            warnings: warning.into_iter().collect(),
        }))
    }

    pub fn current(&self) -> Option<&RenderedMenu> {
        self.current.as_ref()
    }

    /// Saves the current board to history.
    pub fn confirm_save(&self) -> Result<HistoryRecord> {
        let current = self.current.as_ref().ok_or(MenuError::NothingRendered)?;
        self.history.save(&current.image)
    }

    /// JPEG and PDF buffers of the current board.
    pub fn downloads(&self) -> Result<Exports> {
        let current = self.current.as_ref().ok_or(MenuError::NothingRendered)?;
        export::export(&current.image, self.jpeg_quality, self.pdf_dpi)
    }

    pub fn history(&self, limit: usize) -> Result<Vec<HistoryRecord>> {
        self.history.list(limit)
    }

    pub fn history_file(&self, file_name: &str) -> Result<Vec<u8>> {
        self.history.read(file_name)
    }
}
