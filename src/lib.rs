pub mod config;
pub mod error;
pub mod export;
pub mod history;
pub mod layout;
pub mod renderer;
pub mod session;
pub mod template;
pub mod types;

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

use config::Settings;
use session::MenuSession;
use types::MenuForm;

pub use error::{MenuError, Result};

#[derive(Parser, Debug)]
#[command(name = "cardapio", version, about = "Daily menu board generator")]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a menu from a JSON form
    Generate {
        /// Path to the form JSON, or - for stdin
        #[arg(long)]
        form: PathBuf,
        /// Overrides the date in the form
        #[arg(long)]
        date: Option<String>,
        /// Keep a copy in history
        #[arg(long)]
        save: bool,
        /// Write the JPEG download here
        #[arg(long)]
        jpg: Option<PathBuf>,
        /// Write the PDF download here
        #[arg(long)]
        pdf: Option<PathBuf>,
        /// Write cardapio.jpg and cardapio.pdf into this directory
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// List saved menus, newest first
    History {
        /// Defaults to --list-limit
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Copy a saved menu out of history
    Fetch {
        file_name: String,
        #[arg(long)]
        out: PathBuf,
    },
    /// Print the section layout
    Sections,
    /// Print an empty form to fill in
    FormTemplate,
}

pub fn run() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Generate {
            form,
            date,
            save,
            jpg,
            pdf,
            out_dir,
        } => generate(
            &cli.settings,
            &form,
            date,
            save,
            Downloads {
                jpg: jpg.as_deref(),
                pdf: pdf.as_deref(),
                out_dir: out_dir.as_deref(),
            },
        ),
        Command::History { limit, json } => {
            history(&cli.settings, limit.unwrap_or(cli.settings.list_limit), json)
        }
        Command::Fetch { file_name, out } => fetch(&cli.settings, &file_name, &out),
        Command::Sections => {
            print_sections();
            Ok(())
        }
        Command::FormTemplate => {
            println!("{}", serde_json::to_string_pretty(&MenuForm::blank())?);
            Ok(())
        }
    }
}

fn read_form(path: &Path) -> anyhow::Result<MenuForm> {
    let raw = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        fs::read_to_string(path).with_context(|| format!("reading form {}", path.display()))?
    };
    serde_json::from_str(&raw).with_context(|| format!("parsing form {}", path.display()))
}

/// Where `generate` writes the download files.
struct Downloads<'a> {
    jpg: Option<&'a Path>,
    pdf: Option<&'a Path>,
    out_dir: Option<&'a Path>,
}

impl Downloads<'_> {
    fn any(&self) -> bool {
        self.jpg.is_some() || self.pdf.is_some() || self.out_dir.is_some()
    }
}

fn generate(
    settings: &Settings,
    form_path: &Path,
    date: Option<String>,
    save: bool,
    downloads: Downloads<'_>,
) -> anyhow::Result<()> {
    let mut form = read_form(form_path)?;
    if let Some(date) = date {
        form.date = date;
    }

    let mut session = MenuSession::from_settings(settings)?;
    let rendered = session.submit(&form).context("menu generation failed")?;
    for warning in &rendered.warnings {
        eprintln!("warning: {}", warning);
    }
    println!(
        "Menu generated ({}x{})",
        rendered.image.width(),
        rendered.image.height()
    );

    if save {
        let record = session.confirm_save()?;
        println!("Saved to history: {}", record.path);
    }

    if downloads.any() {
        let exports = session.downloads()?;
        if let Some(dir) = downloads.out_dir {
            let (jpeg_path, pdf_path) = exports
                .write_to_dir(dir)
                .with_context(|| format!("writing downloads to {}", dir.display()))?;
            println!("JPEG written to {}", jpeg_path.display());
            println!("PDF written to {}", pdf_path.display());
        }
        if let Some(path) = downloads.jpg {
            fs::write(path, &exports.jpeg).with_context(|| format!("writing {}", path.display()))?;
            println!("JPEG written to {}", path.display());
        }
        if let Some(path) = downloads.pdf {
            fs::write(path, &exports.pdf).with_context(|| format!("writing {}", path.display()))?;
            println!("PDF written to {}", path.display());
        }
    }

    Ok(())
}

fn history(settings: &Settings, limit: usize, json: bool) -> anyhow::Result<()> {
    let session = MenuSession::from_settings(settings)?;
    let records = session.history(limit)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No history yet.");
    }
    for record in &records {
        println!("{:<16} {}", record.label, record.file_name);
    }
    Ok(())
}

fn fetch(settings: &Settings, file_name: &str, out: &Path) -> anyhow::Result<()> {
    let session = MenuSession::from_settings(settings)?;
    let bytes = session.history_file(file_name)?;
    fs::write(out, &bytes).with_context(|| format!("writing {}", out.display()))?;
    println!("{} written to {} ({} bytes)", file_name, out.display(), bytes.len());
    Ok(())
}

fn print_sections() {
    for section in layout::SECTIONS {
        let rows: Vec<String> = section.rows.iter().map(|y| y.to_string()).collect();
        println!("{:<28} {}", section.name, rows.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_limit_defaults_to_settings() {
        let cli = Cli::try_parse_from(["cardapio", "history"]).unwrap();
        assert_eq!(cli.settings.list_limit, 10);
        assert!(matches!(cli.command, Command::History { limit: None, json: false }));

        let cli = Cli::try_parse_from(["cardapio", "--list-limit", "3", "history", "--json"]).unwrap();
        assert_eq!(cli.settings.list_limit, 3);
        assert!(matches!(cli.command, Command::History { limit: None, json: true }));

        let cli = Cli::try_parse_from(["cardapio", "history", "--limit", "5"]).unwrap();
        assert!(matches!(cli.command, Command::History { limit: Some(5), .. }));
    }

    #[test]
    fn generate_accepts_out_dir() {
        let cli = Cli::try_parse_from([
            "cardapio", "generate", "--form", "menu.json", "--out-dir", "downloads",
        ])
        .unwrap();
        match cli.command {
            Command::Generate { out_dir, jpg, pdf, save, .. } => {
                assert_eq!(out_dir, Some(PathBuf::from("downloads")));
                assert!(jpg.is_none() && pdf.is_none() && !save);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn generate_writes_named_downloads() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = Settings {
            assets_dir: tmp.path().join("assets"),
            history_dir: tmp.path().join("history"),
            ..Settings::default()
        };
        let background = settings.template_paths().background;
        fs::create_dir_all(background.parent().unwrap()).unwrap();
        image::RgbImage::from_pixel(120, 80, image::Rgb([255, 255, 255]))
            .save(&background)
            .unwrap();
        let form_path = tmp.path().join("menu.json");
        fs::write(&form_path, r#"{"date": "24/10"}"#).unwrap();
        let out_dir = tmp.path().join("downloads");

        generate(
            &settings,
            &form_path,
            None,
            false,
            Downloads {
                jpg: None,
                pdf: None,
                out_dir: Some(&out_dir),
            },
        )
        .unwrap();

        assert!(out_dir.join(export::JPEG_FILE_NAME).is_file());
        assert!(out_dir.join(export::PDF_FILE_NAME).is_file());
        assert_eq!(fs::read_dir(&settings.history_dir).unwrap().count(), 0);
    }
}
