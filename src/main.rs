use std::sync::Arc;

use eframe::egui;

mod api;
mod app;
mod localizations;
mod models;
mod session;
mod theme;
mod ui;

use api::HttpBackend;
use app::DownloaderApp;

fn main() -> eframe::Result<()> {
    env_logger::init();

    let base_url =
        std::env::var("YTGRAB_SERVER").unwrap_or_else(|_| HttpBackend::DEFAULT_BASE_URL.to_string());
    log::info!("using download server at {}", base_url);

    let backend = match HttpBackend::new(&base_url) {
        Ok(backend) => Arc::new(backend),
        Err(e) => {
            eprintln!("Failed to set up the HTTP client: {}", e);
            std::process::exit(1);
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([760.0, 640.0])
            .with_min_inner_size([620.0, 480.0])
            .with_title("YouTube Downloader"),
        ..Default::default()
    };

    eframe::run_native(
        "YouTube Downloader",
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::light());
            Box::new(DownloaderApp::new(backend))
        }),
    )
}
