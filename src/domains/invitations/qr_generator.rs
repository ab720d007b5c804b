use super::models::QrGenerationError;
use crate::observability::metrics::record_qr_generated;
use anyhow::Context;
use image::{imageops, DynamicImage, ImageBuffer, Luma};
use qrcode::QrCode;
use shared::config::GeneratorConfig;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// QR generation settings
#[derive(Debug, Clone)]
pub struct QrConfig {
    /// URL of the check endpoint; `id=<n>` is appended as a query parameter
    pub base_url: String,
    /// Directory the PNG files are written to
    pub output_dir: PathBuf,
    /// Number of codes, numbered from 1
    pub count: u32,
    /// Target width of each image in pixels
    pub size: u32,
    /// Quiet zone around the code, in modules
    pub margin: u32,
}

impl Default for QrConfig {
    fn default() -> Self {
        Self::from(&GeneratorConfig::default())
    }
}

impl From<&GeneratorConfig> for QrConfig {
    fn from(config: &GeneratorConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            output_dir: PathBuf::from(&config.output_dir),
            count: config.count,
            size: config.image_size,
            margin: config.margin,
        }
    }
}

/// Outcome of a batch run. Failures are per id; the batch never stops early.
#[derive(Debug, Default)]
pub struct GenerationReport {
    pub output_dir: PathBuf,
    pub written: Vec<PathBuf>,
    pub failed: Vec<(u32, String)>,
}

impl GenerationReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Offline generator for the invitation QR codes
pub struct QrGenerator {
    pub config: QrConfig,
}

impl QrGenerator {
    pub fn new(config: QrConfig) -> Self {
        Self { config }
    }

    /// URL encoded in the code for `id`
    pub fn invitation_url(&self, id: u32) -> String {
        let separator = if self.config.base_url.contains('?') { '&' } else { '?' };
        format!("{}{}id={}", self.config.base_url, separator, id)
    }

    pub fn file_name(id: u32) -> String {
        format!("qrcode_{}.png", id)
    }

    pub fn output_path(&self, id: u32) -> PathBuf {
        self.config.output_dir.join(Self::file_name(id))
    }

    /// Encodes the invitation URL for `id` as PNG bytes.
    pub fn render_png(&self, id: u32) -> Result<Vec<u8>, QrGenerationError> {
        let url = self.invitation_url(id);

        let qr = QrCode::new(url.as_bytes()).map_err(|e| QrGenerationError::Encode {
            id,
            message: e.to_string(),
        })?;

        // Module size is picked so code plus quiet zone fits the target width.
        let modules = qr.width() as u32;
        let total_modules = modules + self.config.margin * 2;
        let module_px = (self.config.size / total_modules).max(1);

        let code_image = qr
            .render::<Luma<u8>>()
            .quiet_zone(false)
            .module_dimensions(module_px, module_px)
            .build();

        let framed = self.add_white_margin(code_image, self.config.margin * module_px);

        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageLuma8(framed)
            .write_to(&mut buffer, image::ImageFormat::Png)
            .map_err(|source| QrGenerationError::Render { id, source })?;

        Ok(buffer.into_inner())
    }

    /// Centres the code on a white square at least `config.size` wide.
    fn add_white_margin(
        &self,
        img: ImageBuffer<Luma<u8>, Vec<u8>>,
        margin: u32,
    ) -> ImageBuffer<Luma<u8>, Vec<u8>> {
        let side = (img.width() + margin * 2).max(self.config.size);
        let offset = (side - img.width()) / 2;

        let mut canvas = ImageBuffer::from_pixel(side, side, Luma([255u8]));
        imageops::overlay(&mut canvas, &img, offset as i64, offset as i64);

        canvas
    }

    /// Renders and writes the file for one id.
    pub fn generate_one(&self, id: u32) -> Result<PathBuf, QrGenerationError> {
        let bytes = self.render_png(id)?;
        let path = self.output_path(id);

        fs::write(&path, bytes).map_err(|source| QrGenerationError::Write {
            id,
            path: path.clone(),
            source,
        })?;

        Ok(path)
    }

    /// Writes `qrcode_1.png` .. `qrcode_<count>.png`.
    ///
    /// Only a failure to create the output directory aborts the run; an id
    /// that cannot be encoded or written is logged and skipped.
    pub fn generate_all(&self) -> anyhow::Result<GenerationReport> {
        ensure_dir(&self.config.output_dir)?;

        let mut report = GenerationReport {
            output_dir: self.config.output_dir.clone(),
            ..GenerationReport::default()
        };

        for id in 1..=self.config.count {
            match self.generate_one(id) {
                Ok(path) => {
                    record_qr_generated("success");
                    info!("Generated QR code {}", id);
                    report.written.push(path);
                }
                Err(e) => {
                    record_qr_generated("error");
                    error!("Error generating QR code {}: {}", id, e);
                    report.failed.push((id, e.to_string()));
                }
            }
        }

        Ok(report)
    }
}

fn ensure_dir(dir: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Error creating output directory {}", dir.display()))
}
