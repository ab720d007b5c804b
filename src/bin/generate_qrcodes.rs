// ============================================================================
// QR CODE GENERATOR - Generación offline de los códigos de invitación
// ============================================================================
// Writes qrcode_1.png .. qrcode_<QR_COUNT>.png into QR_OUTPUT_DIR, each one
// encoding <QR_BASE_URL>?id=<n>. Run once before the event; the check service
// never calls this.
// ============================================================================

use anyhow::Result;
use invite_check::domains::invitations::{QrConfig, QrGenerator};
use shared::Config;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    let config = Config::from_env()?;

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::new(&config.app.log_level))
        .with_ansi(!config.is_production())
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let generator = QrGenerator::new(QrConfig::from(&config.generator));
    info!(
        "Generating {} QR codes for {}",
        generator.config.count, generator.config.base_url
    );

    let report = generator.generate_all()?;

    if !report.is_complete() {
        warn!(
            "{} of {} QR codes failed: {:?}",
            report.failed.len(),
            generator.config.count,
            report.failed.iter().map(|(id, _)| id).collect::<Vec<_>>()
        );
    }

    info!(
        "All QR codes generated in the {} folder ({} written)",
        report.output_dir.display(),
        report.written.len()
    );

    Ok(())
}
