//! Download encodings of a rendered board: JPEG and a single-page PDF.
//!
//! The PDF is written by hand. It holds the JPEG bytes as a DCTDecode image
//! XObject painted over the whole page, so no re-encoding happens inside the
//! document. The page size follows from the pixel size and the resolution:
//! `points = pixels * 72 / dpi`.
//!
//! ```text
//! %PDF-1.4
//! 1 0 obj  Catalog
//! 2 0 obj  Pages
//! 3 0 obj  Page (MediaBox, Resources, Contents)
//! 4 0 obj  Image XObject (DCTDecode)
//! 5 0 obj  Content stream
//! xref / trailer / startxref
//! %%EOF
//! ```

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;

use crate::error::Result;

pub const JPEG_QUALITY: u8 = 95;
pub const PDF_DPI: f32 = 100.0;

pub const JPEG_FILE_NAME: &str = "cardapio.jpg";
pub const PDF_FILE_NAME: &str = "cardapio.pdf";

/// Both download buffers for one render.
#[derive(Debug, Clone)]
pub struct Exports {
    pub jpeg: Vec<u8>,
    pub pdf: Vec<u8>,
}

impl Exports {
    /// Writes `cardapio.jpg` and `cardapio.pdf` into `dir`, creating it if
    /// needed. Returns the two paths written.
    pub fn write_to_dir(&self, dir: &Path) -> Result<(PathBuf, PathBuf)> {
        fs::create_dir_all(dir)?;
        let jpeg_path = dir.join(JPEG_FILE_NAME);
        let pdf_path = dir.join(PDF_FILE_NAME);
        fs::write(&jpeg_path, &self.jpeg)?;
        fs::write(&pdf_path, &self.pdf)?;
        Ok((jpeg_path, pdf_path))
    }
}

pub fn export(img: &RgbImage, quality: u8, dpi: f32) -> Result<Exports> {
    let jpeg = encode_jpeg(img, quality)?;
    let pdf = pdf_from_jpeg(&jpeg, img.width(), img.height(), dpi)?;
    log::debug!(
        "Exported {}x{} menu: jpeg {} bytes, pdf {} bytes",
        img.width(),
        img.height(),
        jpeg.len(),
        pdf.len()
    );
    Ok(Exports { jpeg, pdf })
}

pub fn encode_jpeg(img: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    encoder.encode_image(img)?;
    Ok(buf)
}

pub fn encode_pdf(img: &RgbImage, quality: u8, dpi: f32) -> Result<Vec<u8>> {
    let jpeg = encode_jpeg(img, quality)?;
    pdf_from_jpeg(&jpeg, img.width(), img.height(), dpi)
}

/// Page size in points for an image of `width x height` pixels.
pub fn page_size(width: u32, height: u32, dpi: f32) -> (f32, f32) {
    let dpi = if dpi > 0.0 { dpi } else { PDF_DPI };
    (width as f32 * 72.0 / dpi, height as f32 * 72.0 / dpi)
}

fn pdf_from_jpeg(jpeg: &[u8], width: u32, height: u32, dpi: f32) -> Result<Vec<u8>> {
    let (page_w, page_h) = page_size(width, height, dpi);
    let page_w = format_number(page_w);
    let page_h = format_number(page_h);

    let mut buffer: Vec<u8> = Vec::with_capacity(jpeg.len() + 1024);
    let mut offsets: Vec<usize> = Vec::with_capacity(5);

    buffer.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

    offsets.push(buffer.len());
    buffer.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");

    offsets.push(buffer.len());
    buffer.extend_from_slice(b"2 0 obj\n<< /Type /Pages /Kids [3 0 R] /Count 1 >>\nendobj\n");

    offsets.push(buffer.len());
    write!(
        buffer,
        "3 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {page_w} {page_h}] \
         /Resources << /XObject << /Im0 4 0 R >> >> /Contents 5 0 R >>\nendobj\n"
    )?;

    offsets.push(buffer.len());
    write!(
        buffer,
        "4 0 obj\n<< /Type /XObject /Subtype /Image /Width {width} /Height {height} \
         /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /DCTDecode /Length {} >>\nstream\n",
        jpeg.len()
    )?;
    buffer.extend_from_slice(jpeg);
    buffer.extend_from_slice(b"\nendstream\nendobj\n");

    let content = format!("q {page_w} 0 0 {page_h} 0 0 cm /Im0 Do Q");
    offsets.push(buffer.len());
    write!(
        buffer,
        "5 0 obj\n<< /Length {} >>\nstream\n{content}\nendstream\nendobj\n",
        content.len()
    )?;

    // Each xref entry is exactly 20 bytes including the two-byte EOL.
    let xref_offset = buffer.len();
    write!(buffer, "xref\n0 {}\n", offsets.len() + 1)?;
    buffer.extend_from_slice(b"0000000000 65535 f \n");
    for offset in &offsets {
        write!(buffer, "{:010} 00000 n \n", offset)?;
    }

    write!(
        buffer,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        offsets.len() + 1,
        xref_offset
    )?;

    Ok(buffer)
}

/// Integers without a decimal point, everything else with at most two places.
fn format_number(n: f32) -> String {
    if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        let s = format!("{:.2}", n);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn sample() -> RgbImage {
        RgbImage::from_fn(200, 100, |x, y| Rgb([(x % 256) as u8, (y * 2 % 256) as u8, 128]))
    }

    #[test]
    fn jpeg_has_soi_marker() {
        let bytes = encode_jpeg(&sample(), JPEG_QUALITY).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn page_size_at_100_dpi() {
        assert_eq!(page_size(100, 200, 100.0), (72.0, 144.0));
        assert_eq!(page_size(100, 100, 0.0), (72.0, 72.0));
    }

    #[test]
    fn numbers_are_compact() {
        assert_eq!(format_number(144.0), "144");
        assert_eq!(format_number(57.6), "57.6");
        assert_eq!(format_number(10.0 / 3.0), "3.33");
    }

    #[test]
    fn pdf_structure() {
        let pdf = encode_pdf(&sample(), JPEG_QUALITY, PDF_DPI).unwrap();
        let text = String::from_utf8_lossy(&pdf);
        assert!(pdf.starts_with(b"%PDF-1.4"));
        assert!(text.trim_end().ends_with("%%EOF"));
        assert!(text.contains("/MediaBox [0 0 144 72]"));
        assert!(text.contains("/Width 200 /Height 100"));
        assert!(text.contains("/Filter /DCTDecode"));
        assert_eq!(text.matches("/Type /Page ").count(), 1);
    }

    #[test]
    fn xref_offsets_point_at_objects() {
        let pdf = encode_pdf(&sample(), JPEG_QUALITY, PDF_DPI).unwrap();
        let text = String::from_utf8_lossy(&pdf).into_owned();

        let startxref = text.rfind("startxref\n").unwrap() + "startxref\n".len();
        let xref_at: usize = text[startxref..].lines().next().unwrap().parse().unwrap();
        assert!(pdf[xref_at..].starts_with(b"xref\n0 6\n"));

        let table = &pdf[xref_at + "xref\n0 6\n".len()..];
        for n in 1..=5usize {
            let entry = std::str::from_utf8(&table[n * 20..n * 20 + 10]).unwrap();
            let offset: usize = entry.parse().unwrap();
            let header = format!("{n} 0 obj");
            assert!(pdf[offset..].starts_with(header.as_bytes()), "object {n}");
        }
    }

    #[test]
    fn downloads_use_fixed_names() {
        let tmp = tempfile::tempdir().unwrap();
        let exports = export(&sample(), JPEG_QUALITY, PDF_DPI).unwrap();
        let dir = tmp.path().join("downloads");

        let (jpeg_path, pdf_path) = exports.write_to_dir(&dir).unwrap();
        assert_eq!(jpeg_path, dir.join("cardapio.jpg"));
        assert_eq!(pdf_path, dir.join("cardapio.pdf"));
        assert_eq!(fs::read(&jpeg_path).unwrap(), exports.jpeg);
        assert_eq!(fs::read(&pdf_path).unwrap(), exports.pdf);
    }

    #[test]
    fn export_produces_both_buffers() {
        let exports = export(&sample(), JPEG_QUALITY, PDF_DPI).unwrap();
        assert!(!exports.jpeg.is_empty());
        let embedded = exports
            .pdf
            .windows(exports.jpeg.len())
            .any(|w| w == exports.jpeg.as_slice());
        assert!(embedded);
    }
}
