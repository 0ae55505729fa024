use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;

use eframe::egui;

use crate::api::{ApiError, DownloadBackend, DownloadRequest};
use crate::localizations::Localizations;
use crate::models::{looks_like_video_url, AppState, DownloadStatus};
use crate::session::{self, DownloadSession, PollPolicy, SessionEvent, SessionUpdate};
use crate::theme::*;
use crate::ui;

pub struct DownloaderApp {
    pub state: AppState,
    localizer: Localizations,
    backend: Arc<dyn DownloadBackend>,
    poll_policy: PollPolicy,
    /// Allocator for request tags. Each operation records the tag it is
    /// waiting on; a reply matching no recorded tag is stale and dropped.
    generation: u64,
    pending_fetch: Option<u64>,
    pending_submit: Option<u64>,
    session: Option<DownloadSession>,
    update_sender: Sender<SessionUpdate>,
    update_receiver: Receiver<SessionUpdate>,
}

impl DownloaderApp {
    pub fn new(backend: Arc<dyn DownloadBackend>) -> Self {
        let (tx, rx) = mpsc::channel();
        let localizer = Localizations::new();

        let mut state = AppState::default();
        state.status = localizer
            .lookup("status-ready")
            .unwrap_or_else(|| "Ready".to_string());
        state.download_location = dirs::download_dir()
            .map(|dir| dir.to_string_lossy().to_string())
            .unwrap_or_default();

        Self {
            state,
            localizer,
            backend,
            poll_policy: PollPolicy::default(),
            generation: 0,
            pending_fetch: None,
            pending_submit: None,
            session: None,
            update_sender: tx,
            update_receiver: rx,
        }
    }

    fn text(&self, key: &str, fallback: &str) -> String {
        self.localizer
            .lookup(key)
            .unwrap_or_else(|| fallback.to_string())
    }

    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    pub fn fetch_video_info(&mut self) {
        if self.state.is_fetching {
            return;
        }

        let url = self.state.url.trim().to_string();
        if url.is_empty() {
            self.state.last_error = Some(self.text("error-empty-url", "Please enter a YouTube URL"));
            return;
        }
        if !looks_like_video_url(&url) {
            self.state.last_error =
                Some(self.text("error-invalid-url", "Please enter a valid YouTube URL"));
            return;
        }

        let generation = self.next_generation();
        self.pending_fetch = Some(generation);
        self.state.is_fetching = true;
        self.state.last_error = None;
        self.state.status = self.text("status-fetching", "Fetching video info...");

        session::fetch_video_info(
            self.backend.clone(),
            url,
            generation,
            self.update_sender.clone(),
        );
    }

    /// The download control is enabled iff exactly one format is selected
    /// and nothing is already in flight.
    pub fn can_submit(&self) -> bool {
        self.state.selected.is_some() && !self.state.is_submitting && self.session.is_none()
    }

    pub fn submit_download(&mut self) {
        if !self.can_submit() {
            return;
        }
        let Some(selected) = self.state.selected.clone() else {
            return;
        };

        let request = DownloadRequest {
            url: self.state.url.trim().to_string(),
            itag: selected.itag,
            download_type: selected.kind,
            download_location: self.state.download_location.clone(),
        };

        let generation = self.next_generation();
        self.pending_submit = Some(generation);
        self.state.is_submitting = true;
        self.state.last_error = None;
        self.state.progress = 0.0;
        self.state.artifact_url = None;
        self.state.status = self.text("status-submitting", "Requesting download...");

        session::submit_download(
            self.backend.clone(),
            request,
            generation,
            self.update_sender.clone(),
        );
    }

    pub fn is_polling(&self) -> bool {
        self.session.is_some()
    }

    fn process_updates(&mut self, ctx: &egui::Context) {
        let updates: Vec<SessionUpdate> = self.update_receiver.try_iter().collect();
        if updates.is_empty() {
            return;
        }
        for update in updates {
            self.apply_update(update);
        }
        ctx.request_repaint();
    }

    /// A reply only counts if its tag matches the operation that spawned
    /// it. Fetching and downloading run independently, so a fetch reply
    /// cannot end a session and a progress event cannot clear a fetch.
    fn apply_update(&mut self, update: SessionUpdate) {
        match update.event {
            SessionEvent::InfoFetched(result) => {
                if self.pending_fetch != Some(update.generation) {
                    log::debug!("dropping stale fetch reply, tag {}", update.generation);
                    return;
                }
                self.pending_fetch = None;
                self.state.is_fetching = false;
                match result {
                    Ok(metadata) => {
                        self.state.selected = None;
                        self.state.metadata = Some(metadata);
                        self.state.status =
                            self.text("status-pick-format", "Pick a format to download");
                    }
                    Err(err) => {
                        // Prior metadata stays untouched.
                        self.show_api_error(err);
                    }
                }
            }
            SessionEvent::DownloadSubmitted(result) => {
                if self.pending_submit != Some(update.generation) {
                    log::debug!("dropping stale submit reply, tag {}", update.generation);
                    return;
                }
                self.pending_submit = None;
                self.state.is_submitting = false;
                match result {
                    Ok(download_id) => {
                        self.state.status = self.text("status-starting", "Starting download...");
                        self.start_polling(download_id, update.generation);
                    }
                    Err(err) => self.show_api_error(err),
                }
            }
            SessionEvent::Progress(progress) => {
                if !self.session_matches(update.generation) {
                    log::debug!("dropping progress for an ended session, tag {}", update.generation);
                    return;
                }
                self.state.progress = progress.progress as f32;
                match progress.status {
                    DownloadStatus::Completed => {
                        if let Some(session) = self.session.take() {
                            self.state.artifact_url =
                                Some(self.backend.artifact_url(session.download_id()));
                            session.shutdown();
                        }
                        self.state.status = self.text("status-completed", "Download completed!");
                    }
                    DownloadStatus::Failed(message) => {
                        // The worker stopped itself on the terminal status.
                        self.session.take();
                        self.state.last_error = Some(message);
                        self.state.status = self.text("status-failed", "Download failed");
                    }
                    other => {
                        self.state.status = self.text(other.message_key(), "Processing...");
                    }
                }
            }
            SessionEvent::PollFailed(err) => {
                if !self.session_matches(update.generation) {
                    return;
                }
                self.session.take();
                self.state.status = self.text("status-failed", "Download failed");
                self.show_api_error(err);
            }
        }
    }

    fn session_matches(&self, generation: u64) -> bool {
        self.session
            .as_ref()
            .map(|session| session.generation() == generation)
            .unwrap_or(false)
    }

    fn start_polling(&mut self, download_id: String, generation: u64) {
        // A replaced session stops via its flag before the new one starts.
        if let Some(old) = self.session.take() {
            old.shutdown();
        }
        self.session = Some(DownloadSession::start(
            self.backend.clone(),
            download_id,
            generation,
            self.poll_policy,
            self.update_sender.clone(),
        ));
    }

    fn show_api_error(&mut self, err: ApiError) {
        match err {
            ApiError::Backend(message) => self.state.last_error = Some(message),
            ApiError::Transport(detail) => {
                log::warn!("transport failure: {}", detail);
                self.state.last_error =
                    Some(self.text("error-network", "Could not reach the download server"));
            }
        }
    }

    fn render_buttons(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let fetch_button = egui::Button::new(
                egui::RichText::new(self.text("fetch-button", "Fetch Video Info"))
                    .size(BUTTON_FONT_SIZE)
                    .color(BUTTON_MAIN_TEXT),
            )
            .min_size(MIN_SIZE_BUTTON)
            .fill(PRIMARY_BUTTON_BG)
            .rounding(ROUNDING_BUTTON)
            .stroke(egui::Stroke::new(1.0, BORDER_COLOR));

            if ui
                .add_enabled(!self.state.is_fetching, fetch_button)
                .clicked()
            {
                self.fetch_video_info();
            }

            let download_button = egui::Button::new(
                egui::RichText::new(self.text("download-button", "Download"))
                    .size(BUTTON_FONT_SIZE)
                    .color(BUTTON_MAIN_TEXT),
            )
            .min_size(MIN_SIZE_BUTTON)
            .fill(SECONDARY_BUTTON_BG)
            .rounding(ROUNDING_BUTTON)
            .stroke(egui::Stroke::new(1.0, BORDER_COLOR));

            if ui.add_enabled(self.can_submit(), download_button).clicked() {
                self.submit_download();
            }
        });
    }
}

impl eframe::App for DownloaderApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_updates(ctx);

        // Keep frames coming while workers are busy, so progress moves
        // without user input.
        if self.is_polling() || self.state.is_fetching || self.state.is_submitting {
            ctx.request_repaint_after(Duration::from_millis(200));
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.heading(self.text("app-title", "YouTube Downloader"));
                ui.add_space(20.0);

                let url_response = ui::render_url_input(ui, &mut self.state, &self.localizer);
                if url_response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    self.fetch_video_info();
                }

                ui.add_space(10.0);
                ui::render_location_selector(ui, &mut self.state, &self.localizer);
                ui.add_space(10.0);

                if let Some(metadata) = self.state.metadata.clone() {
                    ui::render_video_info(ui, &metadata, &self.localizer);
                    ui.add_space(10.0);
                    ui::render_stream_sections(ui, &metadata, &mut self.state.selected, &self.localizer);
                    ui.add_space(10.0);
                }

                ui::render_progress(ui, &self.state, &self.localizer);
                ui.add_space(20.0);

                self.render_buttons(ui);
                ui.add_space(10.0);
            });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProgressUpdate, SelectedStream, StreamKind, VideoMetadata};

    struct CannedBackend;

    impl DownloadBackend for CannedBackend {
        fn fetch_video_info(&self, _url: &str) -> Result<VideoMetadata, ApiError> {
            Ok(sample_metadata(1, 1, 1))
        }

        fn submit_download(&self, _request: &DownloadRequest) -> Result<String, ApiError> {
            Ok("dl-1".to_string())
        }

        fn poll_progress(&self, _download_id: &str) -> Result<ProgressUpdate, ApiError> {
            Ok(ProgressUpdate {
                progress: 100.0,
                status: DownloadStatus::Completed,
            })
        }

        fn artifact_url(&self, download_id: &str) -> String {
            format!("http://localhost:5000/download_file/{}", download_id)
        }
    }

    fn sample_metadata(progressive: usize, adaptive: usize, audio: usize) -> VideoMetadata {
        fn streams(count: usize, base_itag: u64) -> serde_json::Value {
            let entries: Vec<serde_json::Value> = (0..count)
                .map(|i| {
                    serde_json::json!({
                        "itag": base_itag + i as u64,
                        "resolution": format!("{}p", 360 + 360 * i),
                        "fps": 30,
                        "size_mb": 10.0 + i as f64
                    })
                })
                .collect();
            serde_json::json!(entries)
        }

        serde_json::from_value(serde_json::json!({
            "title": "A video",
            "author": "Someone",
            "views": 42u64,
            "length": 125,
            "video_streams": streams(progressive, 18),
            "video_only_streams": streams(adaptive, 137),
            "audio_streams": streams(audio, 140),
        }))
        .unwrap()
    }

    fn test_app() -> DownloaderApp {
        DownloaderApp::new(Arc::new(CannedBackend))
    }

    fn update(generation: u64, event: SessionEvent) -> SessionUpdate {
        SessionUpdate { generation, event }
    }

    #[test]
    fn fetch_rejects_bad_urls_before_any_network_call() {
        let mut app = test_app();

        app.state.url = "".to_string();
        app.fetch_video_info();
        assert!(!app.state.is_fetching);
        assert!(app.state.last_error.is_some());

        app.state.url = "https://vimeo.com/123".to_string();
        app.fetch_video_info();
        assert!(!app.state.is_fetching);
        assert!(app.state.last_error.is_some());
    }

    #[test]
    fn submit_is_gated_on_exactly_one_selection() {
        let mut app = test_app();
        assert!(!app.can_submit());

        app.state.selected = Some(SelectedStream {
            itag: "22".to_string(),
            kind: StreamKind::Progressive,
        });
        assert!(app.can_submit());

        app.state.is_submitting = true;
        assert!(!app.can_submit());
    }

    #[test]
    fn stale_generation_updates_are_discarded() {
        let mut app = test_app();
        app.pending_fetch = Some(2);

        app.apply_update(update(
            1,
            SessionEvent::InfoFetched(Ok(sample_metadata(1, 0, 0))),
        ));
        assert!(app.state.metadata.is_none());
    }

    #[test]
    fn successful_fetch_replaces_metadata_and_clears_selection() {
        let mut app = test_app();
        app.pending_fetch = Some(1);
        app.state.selected = Some(SelectedStream {
            itag: "18".to_string(),
            kind: StreamKind::Progressive,
        });

        app.apply_update(update(
            1,
            SessionEvent::InfoFetched(Ok(sample_metadata(2, 3, 0))),
        ));

        let metadata = app.state.metadata.as_ref().unwrap();
        assert_eq!(metadata.video_streams.len(), 2);
        assert_eq!(metadata.video_only_streams.len(), 3);
        assert!(metadata.audio_streams.is_empty());
        assert!(app.state.selected.is_none());
        assert!(!app.state.is_fetching);
    }

    #[test]
    fn failed_fetch_keeps_prior_metadata_and_shows_the_message_verbatim() {
        let mut app = test_app();
        app.pending_fetch = Some(1);
        app.apply_update(update(
            1,
            SessionEvent::InfoFetched(Ok(sample_metadata(1, 1, 1))),
        ));

        app.pending_fetch = Some(2);
        app.apply_update(update(
            2,
            SessionEvent::InfoFetched(Err(ApiError::Backend("Video unavailable".to_string()))),
        ));

        assert!(app.state.metadata.is_some());
        assert_eq!(app.state.last_error.as_deref(), Some("Video unavailable"));
    }

    #[test]
    fn transport_errors_render_as_the_generic_network_message() {
        let mut app = test_app();
        app.pending_fetch = Some(1);
        app.apply_update(update(
            1,
            SessionEvent::InfoFetched(Err(ApiError::Transport(
                "connection refused (os error 111)".to_string(),
            ))),
        ));

        let message = app.state.last_error.unwrap();
        assert!(!message.contains("os error"));
    }

    #[test]
    fn submission_starts_a_polling_session() {
        let mut app = test_app();
        app.pending_submit = Some(1);

        app.apply_update(update(
            1,
            SessionEvent::DownloadSubmitted(Ok("dl-1".to_string())),
        ));
        assert!(app.is_polling());
    }

    #[test]
    fn completed_progress_exposes_the_link_and_ends_the_session() {
        let mut app = test_app();
        app.pending_submit = Some(1);
        app.apply_update(update(
            1,
            SessionEvent::DownloadSubmitted(Ok("dl-1".to_string())),
        ));

        app.apply_update(update(
            1,
            SessionEvent::Progress(ProgressUpdate {
                progress: 100.0,
                status: DownloadStatus::Completed,
            }),
        ));

        assert!(!app.is_polling());
        assert_eq!(
            app.state.artifact_url.as_deref(),
            Some("http://localhost:5000/download_file/dl-1")
        );
        assert_eq!(app.state.progress, 100.0);
    }

    #[test]
    fn failed_progress_shows_the_stripped_message_and_ends_the_session() {
        let mut app = test_app();
        app.pending_submit = Some(1);
        app.apply_update(update(
            1,
            SessionEvent::DownloadSubmitted(Ok("dl-1".to_string())),
        ));

        app.apply_update(update(
            1,
            SessionEvent::Progress(ProgressUpdate {
                progress: 0.0,
                status: DownloadStatus::Failed("Foo".to_string()),
            }),
        ));

        assert!(!app.is_polling());
        assert_eq!(app.state.last_error.as_deref(), Some("Foo"));
        assert!(app.state.artifact_url.is_none());
    }

    #[test]
    fn poll_failure_ends_the_session_with_a_generic_error() {
        let mut app = test_app();
        app.pending_submit = Some(1);
        app.apply_update(update(
            1,
            SessionEvent::DownloadSubmitted(Ok("dl-1".to_string())),
        ));

        app.apply_update(update(
            1,
            SessionEvent::PollFailed(ApiError::Transport("timed out".to_string())),
        ));

        assert!(!app.is_polling());
        assert!(app.state.last_error.is_some());
    }

    #[test]
    fn progress_values_are_applied_in_order() {
        let mut app = test_app();
        app.pending_submit = Some(1);
        app.apply_update(update(
            1,
            SessionEvent::DownloadSubmitted(Ok("dl-1".to_string())),
        ));

        let sequence = [
            (20.0, DownloadStatus::DownloadingVideo),
            (60.0, DownloadStatus::Merging),
            (100.0, DownloadStatus::Completed),
        ];
        let mut seen = Vec::new();
        for (progress, status) in sequence {
            app.apply_update(update(
                1,
                SessionEvent::Progress(ProgressUpdate { progress, status }),
            ));
            seen.push(app.state.progress);
        }

        assert_eq!(seen, vec![20.0, 60.0, 100.0]);
        assert!(!app.is_polling());
        assert!(app.state.artifact_url.is_some());
    }

    #[test]
    fn fetching_while_polling_keeps_the_session_alive() {
        let mut app = test_app();
        app.state.url = "https://www.youtube.com/watch?v=abc".to_string();
        app.state.selected = Some(SelectedStream {
            itag: "18".to_string(),
            kind: StreamKind::Progressive,
        });

        app.submit_download();
        let submit_tag = app.pending_submit.unwrap();
        app.apply_update(update(
            submit_tag,
            SessionEvent::DownloadSubmitted(Ok("dl-1".to_string())),
        ));
        assert!(app.is_polling());

        // Looking up another video while the download runs must not
        // detach the session.
        app.fetch_video_info();
        app.apply_update(update(
            submit_tag,
            SessionEvent::Progress(ProgressUpdate {
                progress: 100.0,
                status: DownloadStatus::Completed,
            }),
        ));

        assert!(!app.is_polling());
        assert!(app.state.artifact_url.is_some());
        assert!(app.can_submit());

        let fetch_tag = app.pending_fetch.unwrap();
        app.apply_update(update(
            fetch_tag,
            SessionEvent::InfoFetched(Ok(sample_metadata(1, 1, 1))),
        ));
        assert!(!app.state.is_fetching);
    }

    #[test]
    fn submitting_does_not_wedge_an_in_flight_fetch() {
        let mut app = test_app();
        app.state.url = "https://www.youtube.com/watch?v=abc".to_string();

        app.fetch_video_info();
        let fetch_tag = app.pending_fetch.unwrap();
        assert!(app.state.is_fetching);

        app.state.selected = Some(SelectedStream {
            itag: "18".to_string(),
            kind: StreamKind::Progressive,
        });
        app.submit_download();

        app.apply_update(update(
            fetch_tag,
            SessionEvent::InfoFetched(Ok(sample_metadata(1, 0, 0))),
        ));
        assert!(!app.state.is_fetching);
        assert!(app.state.metadata.is_some());
    }
}
