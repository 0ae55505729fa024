use eframe::egui;
use rfd::FileDialog;
use std::path::Path;

use crate::localizations::Localizations;
use crate::models::{AppState, SelectedStream, StreamKind, StreamOption, VideoMetadata};
use crate::theme::*;

pub fn render_url_input(
    ui: &mut egui::Ui,
    state: &mut AppState,
    localizer: &Localizations,
) -> egui::Response {
    ui.label(
        localizer
            .lookup("url-label")
            .unwrap_or_else(|| "Video URL:".to_string()),
    );

    egui::Frame::group(ui.style())
        .fill(INPUT_BG)
        .stroke(egui::Stroke::new(1.0, egui::Color32::LIGHT_GRAY))
        .rounding(4.0)
        .show(ui, |ui| {
            ui.add_sized(
                [ui.available_width(), 40.0],
                egui::TextEdit::singleline(&mut state.url)
                    .hint_text(
                        localizer
                            .lookup("url-placeholder")
                            .unwrap_or_else(|| "https://www.youtube.com/watch?v=...".to_string()),
                    )
                    .font(egui::TextStyle::Body)
                    .font(egui::FontId::proportional(16.0)),
            )
        })
        .inner
}

pub fn render_location_selector(ui: &mut egui::Ui, state: &mut AppState, localizer: &Localizations) {
    ui.vertical(|ui| {
        ui.label(
            localizer
                .lookup("location-label")
                .unwrap_or_else(|| "Download to:".to_string()),
        );

        ui.horizontal(|ui| {
            egui::Frame::none()
                .fill(ui.visuals().extreme_bg_color)
                .rounding(4.0)
                .stroke(ui.visuals().widgets.noninteractive.bg_stroke)
                .show(ui, |ui| {
                    ui.set_min_height(36.0);
                    ui.add_sized(
                        [ui.available_width() - 100.0, 36.0],
                        egui::TextEdit::singleline(&mut state.download_location)
                            .hint_text(
                                localizer
                                    .lookup("location-placeholder")
                                    .unwrap_or_else(|| "Server-side destination".to_string()),
                            )
                            .frame(false)
                            .margin(egui::vec2(8.0, 8.0)),
                    );
                });

            let button = egui::Button::new(
                egui::RichText::new(
                    localizer
                        .lookup("browse-button")
                        .unwrap_or_else(|| "Browse...".to_string()),
                )
                .size(14.0),
            )
            .min_size(egui::vec2(100.0, 36.0))
            .frame(true)
            .fill(ui.visuals().widgets.inactive.bg_fill)
            .rounding(4.0);

            if ui.add(button).clicked() {
                if let Some(path) = FileDialog::new()
                    .set_directory(
                        Path::new(&state.download_location)
                            .parent()
                            .unwrap_or_else(|| Path::new(".")),
                    )
                    .pick_folder()
                {
                    state.download_location = path.to_string_lossy().to_string();
                }
            }
        });
    });
}

pub fn render_video_info(ui: &mut egui::Ui, metadata: &VideoMetadata, localizer: &Localizations) {
    egui::Frame::group(ui.style())
        .rounding(ROUNDING_FRAME)
        .show(ui, |ui| {
            ui.vertical(|ui| {
                ui.strong(&metadata.title);
                ui.label(&metadata.author);
                ui.label(format!(
                    "{} {}  |  {}",
                    format_views(metadata.views),
                    localizer
                        .lookup("views-suffix")
                        .unwrap_or_else(|| "views".to_string()),
                    format_duration(metadata.length_seconds),
                ));
                if !metadata.thumbnail.is_empty() {
                    ui.hyperlink_to(
                        localizer
                            .lookup("thumbnail-link")
                            .unwrap_or_else(|| "Thumbnail".to_string()),
                        &metadata.thumbnail,
                    );
                }
                if !metadata.description.is_empty() {
                    ui.add_space(4.0);
                    ui.label(egui::RichText::new(&metadata.description).weak().small());
                }
            });
        });
}

/// What a stream section renders: one row per option, or exactly one
/// placeholder when the category is empty.
pub enum StreamRow<'a> {
    Option(&'a StreamOption),
    Placeholder,
}

pub fn stream_rows(streams: &[StreamOption]) -> Vec<StreamRow<'_>> {
    if streams.is_empty() {
        vec![StreamRow::Placeholder]
    } else {
        streams.iter().map(StreamRow::Option).collect()
    }
}

fn section_keys(kind: StreamKind) -> (&'static str, &'static str, &'static str, &'static str) {
    match kind {
        StreamKind::Progressive => (
            "progressive-heading",
            "Video + Audio",
            "no-progressive-streams",
            "No progressive streams available",
        ),
        StreamKind::VideoOnly => (
            "video-only-heading",
            "Video Only (high quality)",
            "no-video-only-streams",
            "No video-only streams available",
        ),
        StreamKind::AudioOnly => (
            "audio-only-heading",
            "Audio Only",
            "no-audio-streams",
            "No audio streams available",
        ),
    }
}

pub fn render_stream_sections(
    ui: &mut egui::Ui,
    metadata: &VideoMetadata,
    selected: &mut Option<SelectedStream>,
    localizer: &Localizations,
) {
    for kind in [
        StreamKind::Progressive,
        StreamKind::VideoOnly,
        StreamKind::AudioOnly,
    ] {
        render_stream_section(ui, kind, metadata.streams(kind), selected, localizer);
        ui.add_space(8.0);
    }
}

fn render_stream_section(
    ui: &mut egui::Ui,
    kind: StreamKind,
    streams: &[StreamOption],
    selected: &mut Option<SelectedStream>,
    localizer: &Localizations,
) {
    let (heading_key, heading_fallback, placeholder_key, placeholder_fallback) = section_keys(kind);

    ui.label(
        egui::RichText::new(
            localizer
                .lookup(heading_key)
                .unwrap_or_else(|| heading_fallback.to_string()),
        )
        .strong(),
    );

    for row in stream_rows(streams) {
        match row {
            StreamRow::Option(stream) => {
                let choice = SelectedStream {
                    itag: stream.itag.clone(),
                    kind,
                };
                let label = format!("{}    {:.1} MB", stream.label(), stream.size_mb);
                ui.radio_value(selected, Some(choice), label);
            }
            StreamRow::Placeholder => {
                ui.weak(
                    localizer
                        .lookup(placeholder_key)
                        .unwrap_or_else(|| placeholder_fallback.to_string()),
                );
            }
        }
    }
}

pub fn render_progress(ui: &mut egui::Ui, state: &AppState, localizer: &Localizations) {
    egui::Frame::group(ui.style())
        .rounding(ROUNDING_FRAME)
        .show(ui, |ui| {
            ui.vertical(|ui| {
                ui.add_space(10.0);

                let status_text = if let Some(error) = &state.last_error {
                    let prefix = localizer
                        .lookup("error-prefix")
                        .unwrap_or_else(|| "Error".to_string());
                    egui::RichText::new(format!("{}: {}", prefix, error)).color(TEXT_ERROR)
                } else {
                    egui::RichText::new(&state.status).color(SECONDARY_TEXT)
                };
                ui.label(status_text);

                if state.progress > 0.0 || state.is_submitting {
                    ui.add_space(10.0);
                    ui.add(
                        egui::ProgressBar::new(state.progress / 100.0)
                            .show_percentage()
                            .text(&state.status),
                    );
                }

                if let Some(url) = &state.artifact_url {
                    ui.add_space(10.0);
                    ui.hyperlink_to(
                        egui::RichText::new(
                            localizer
                                .lookup("download-file")
                                .unwrap_or_else(|| "Download file".to_string()),
                        )
                        .color(TEXT_SUCCESS),
                        url,
                    );
                }

                ui.add_space(10.0);
            });
        });
}

/// `h:mm:ss` above an hour, `m:ss` below.
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Thousands-separated view count.
pub fn format_views(views: u64) -> String {
    let digits = views.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
