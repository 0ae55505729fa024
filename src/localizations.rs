use std::collections::HashMap;

// Simple in-memory translations
#[derive(Default)]
pub struct Translations {
    strings: HashMap<&'static str, &'static str>,
}

impl Translations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &'static str, value: &'static str) {
        self.strings.insert(key, value);
    }

    pub fn lookup(&self, key: &str) -> Option<&'static str> {
        self.strings.get(key).copied()
    }
}

pub struct Localizations {
    translations: HashMap<&'static str, Translations>,
    current_lang: String,
}

impl Localizations {
    pub fn new() -> Self {
        let mut translations = HashMap::new();

        // English translations
        let mut en = Translations::new();
        en.insert("app-title", "YouTube Downloader");
        en.insert("url-label", "Video URL:");
        en.insert("url-placeholder", "https://www.youtube.com/watch?v=...");
        en.insert("fetch-button", "Fetch Video Info");
        en.insert("download-button", "Download");
        en.insert("browse-button", "Browse...");
        en.insert("location-label", "Download to:");
        en.insert("location-placeholder", "Server-side destination");
        en.insert("views-suffix", "views");
        en.insert("thumbnail-link", "Thumbnail");
        en.insert("download-file", "Download file");
        en.insert("progressive-heading", "Video + Audio");
        en.insert("video-only-heading", "Video Only (high quality)");
        en.insert("audio-only-heading", "Audio Only");
        en.insert("no-progressive-streams", "No progressive streams available");
        en.insert("no-video-only-streams", "No video-only streams available");
        en.insert("no-audio-streams", "No audio streams available");
        en.insert("status-ready", "Ready");
        en.insert("status-fetching", "Fetching video info...");
        en.insert("status-pick-format", "Pick a format to download");
        en.insert("status-submitting", "Requesting download...");
        en.insert("status-starting", "Starting download...");
        en.insert("status-downloading-audio", "Downloading audio...");
        en.insert("status-downloading-video", "Downloading video...");
        en.insert("status-merging", "Merging audio and video...");
        en.insert("status-processing", "Processing...");
        en.insert("status-completed", "Download completed!");
        en.insert("status-failed", "Download failed");
        en.insert("error-empty-url", "Please enter a YouTube URL");
        en.insert("error-invalid-url", "Please enter a valid YouTube URL");
        en.insert("error-network", "Could not reach the download server");
        en.insert("error-prefix", "Error");
        translations.insert("en-US", en);

        // Spanish translations
        let mut es = Translations::new();
        es.insert("app-title", "Descargador de YouTube");
        es.insert("url-label", "URL del video:");
        es.insert("url-placeholder", "https://www.youtube.com/watch?v=...");
        es.insert("fetch-button", "Obtener información");
        es.insert("download-button", "Descargar");
        es.insert("browse-button", "Examinar...");
        es.insert("location-label", "Descargar en:");
        es.insert("location-placeholder", "Destino en el servidor");
        es.insert("views-suffix", "vistas");
        es.insert("thumbnail-link", "Miniatura");
        es.insert("download-file", "Descargar archivo");
        es.insert("progressive-heading", "Video + Audio");
        es.insert("video-only-heading", "Solo video (alta calidad)");
        es.insert("audio-only-heading", "Solo audio");
        es.insert("no-progressive-streams", "No hay streams progresivos disponibles");
        es.insert("no-video-only-streams", "No hay streams de solo video disponibles");
        es.insert("no-audio-streams", "No hay streams de audio disponibles");
        es.insert("status-ready", "Listo");
        es.insert("status-fetching", "Obteniendo información del video...");
        es.insert("status-pick-format", "Elija un formato para descargar");
        es.insert("status-submitting", "Solicitando descarga...");
        es.insert("status-starting", "Iniciando descarga...");
        es.insert("status-downloading-audio", "Descargando audio...");
        es.insert("status-downloading-video", "Descargando video...");
        es.insert("status-merging", "Uniendo audio y video...");
        es.insert("status-processing", "Procesando...");
        es.insert("status-completed", "¡Descarga completada!");
        es.insert("status-failed", "La descarga falló");
        es.insert("error-empty-url", "Por favor ingrese una URL de YouTube");
        es.insert("error-invalid-url", "Por favor ingrese una URL de YouTube válida");
        es.insert("error-network", "No se pudo contactar al servidor de descargas");
        es.insert("error-prefix", "Error");
        translations.insert("es-ES", es);

        let mut localizer = Self {
            translations,
            current_lang: "en-US".to_string(),
        };

        // Pick the system language when we have it.
        if let Ok(lang) = std::env::var("LANG") {
            if lang.starts_with("es") {
                let _ = localizer.select("es-ES");
            }
        }

        localizer
    }

    pub fn lookup(&self, key: &str) -> Option<String> {
        self.translations
            .get(self.current_lang.as_str())
            .and_then(|t| t.lookup(key))
            .map(|s| s.to_string())
            .or_else(|| {
                // Fall back to English when the current language misses a key.
                if self.current_lang != "en-US" {
                    self.translations
                        .get("en-US")
                        .and_then(|t| t.lookup(key))
                        .map(|s| s.to_string())
                } else {
                    None
                }
            })
    }

    pub fn select(&mut self, lang: &str) -> Result<(), String> {
        if self.translations.contains_key(lang) {
            self.current_lang = lang.to_string();
            return Ok(());
        }

        // Match on the language part alone.
        let lang_part = lang.split('-').next().unwrap_or(lang);
        for &key in self.translations.keys() {
            if key.starts_with(lang_part) {
                self.current_lang = key.to_string();
                return Ok(());
            }
        }

        self.current_lang = "en-US".to_string();
        Ok(())
    }
}
