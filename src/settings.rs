use std::path::{Path, PathBuf};

use iced::widget::{button, column, container, row, text, text_input, Space};
use iced::{Alignment, Element, Length};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::aggregation::{DEFAULT_ENRICH_CONCURRENCY, DEFAULT_WINDOW_PAGES};
use crate::error::SettingsError;
use crate::media::{ACCENT_BLUE, BACKGROUND_BLACK, TEXT_GRAY, TEXT_WHITE};

pub const API_KEY_ENV: &str = "TMDB_API_KEY";

fn default_language() -> String {
    String::from("en-US")
}

fn default_enrichment_concurrency() -> usize {
    DEFAULT_ENRICH_CONCURRENCY
}

fn default_page_window() -> u32 {
    DEFAULT_WINDOW_PAGES
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_enrichment_concurrency")]
    pub enrichment_concurrency: usize,
    #[serde(default = "default_page_window")]
    pub page_window: u32,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            language: default_language(),
            enrichment_concurrency: default_enrichment_concurrency(),
            page_window: default_page_window(),
        }
    }
}

impl AppSettings {
    pub fn config_path() -> Option<PathBuf> {
        std::env::var("HOME").ok().map(|home| {
            PathBuf::from(home)
                .join(".config")
                .join("movieverse")
                .join("config.json")
        })
    }

    /// File settings with the environment key applied on top. A missing or
    /// unreadable file yields defaults.
    pub fn load() -> Self {
        let from_file = Self::config_path().map(|path| Self::load_from(&path));
        let mut settings = match from_file {
            Some(Ok(settings)) => settings,
            Some(Err(e)) => {
                warn!(error = %e, "config unreadable, using defaults");
                Self::default()
            }
            None => Self::default(),
        };
        settings.apply_env_key(std::env::var(API_KEY_ENV).ok());
        settings
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn apply_env_key(&mut self, key: Option<String>) {
        if let Some(key) = key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty()) {
            info!("using API key from {}", API_KEY_ENV);
            self.api_key = key;
        }
    }

    pub fn save(&self) -> Result<(), SettingsError> {
        let path = Self::config_path().ok_or(SettingsError::NoConfigPath)?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

#[derive(Debug, Clone)]
pub enum SetupMessage {
    ApiKeyChanged(String),
    LanguageChanged(String),
    Submit,
}

pub struct SetupPage {
    pub api_key: String,
    pub language: String,
    pub error: Option<String>,
    base: AppSettings,
}

impl SetupPage {
    pub fn new(base: AppSettings) -> Self {
        Self {
            api_key: base.api_key.clone(),
            language: base.language.clone(),
            error: None,
            base,
        }
    }

    pub fn update(&mut self, message: SetupMessage) -> Option<AppSettings> {
        match message {
            SetupMessage::ApiKeyChanged(key) => {
                self.api_key = key;
                self.error = None;
                None
            }
            SetupMessage::LanguageChanged(lang) => {
                self.language = lang;
                None
            }
            SetupMessage::Submit => {
                if self.api_key.trim().is_empty() {
                    self.error = Some(String::from("API key is required"));
                    return None;
                }
                let settings = AppSettings {
                    api_key: self.api_key.trim().to_string(),
                    language: if self.language.trim().is_empty() {
                        default_language()
                    } else {
                        self.language.trim().to_string()
                    },
                    ..self.base.clone()
                };
                if let Err(e) = settings.save() {
                    self.error = Some(format!("Failed to save: {}", e));
                    return None;
                }
                Some(settings)
            }
        }
    }

    pub fn view(&self) -> Element<'_, SetupMessage> {
        let logo = text("MOVIEVERSE")
            .size(48)
            .color(ACCENT_BLUE)
            .font(iced::Font {
                weight: iced::font::Weight::Bold,
                ..Default::default()
            });

        let title = text("Welcome to Movieverse").size(28).color(TEXT_WHITE);
        let subtitle = text("Configure your TMDB API settings to get started")
            .size(14)
            .color(TEXT_GRAY);

        let api_label = text("TMDB API Key").size(14).color(TEXT_WHITE);
        let api_hint = text("Get your free API key at themoviedb.org/settings/api")
            .size(12)
            .color(TEXT_GRAY);
        let api_input = text_input("Enter your TMDB API key...", &self.api_key)
            .on_input(SetupMessage::ApiKeyChanged)
            .on_submit(SetupMessage::Submit)
            .padding(12)
            .size(14)
            .width(Length::Fill);

        let lang_label = text("Language").size(14).color(TEXT_WHITE);
        let lang_hint = text("Examples: en-US, de-DE, fr-FR, es-ES")
            .size(12)
            .color(TEXT_GRAY);
        let lang_input = text_input("en-US", &self.language)
            .on_input(SetupMessage::LanguageChanged)
            .on_submit(SetupMessage::Submit)
            .padding(12)
            .size(14)
            .width(Length::Fill);

        let submit_button = button(text("Get Started").size(16).color(TEXT_WHITE))
            .padding([12, 32])
            .style(|_theme, status| {
                let bg = match status {
                    button::Status::Hovered => iced::Color::from_rgb(0.22, 0.47, 0.78),
                    _ => ACCENT_BLUE,
                };
                button::Style {
                    background: Some(iced::Background::Color(bg)),
                    text_color: TEXT_WHITE,
                    border: iced::Border::default().rounded(4),
                    ..Default::default()
                }
            })
            .on_press(SetupMessage::Submit);

        let error_text = if let Some(ref err) = self.error {
            text(err).size(14).color(iced::Color::from_rgb(0.9, 0.3, 0.3))
        } else {
            text("").size(14)
        };

        let spacer = || Space::new().height(16);
        let small_spacer = || Space::new().height(4);

        let form = column![
            logo,
            spacer(),
            title,
            small_spacer(),
            subtitle,
            spacer(),
            spacer(),
            api_label,
            small_spacer(),
            api_hint,
            small_spacer(),
            api_input,
            spacer(),
            lang_label,
            small_spacer(),
            lang_hint,
            small_spacer(),
            lang_input,
            spacer(),
            error_text,
            small_spacer(),
            row![submit_button].width(Length::Fill),
        ]
        .width(Length::Fixed(400.0))
        .align_x(Alignment::Start);

        container(form)
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x(Length::Fill)
            .center_y(Length::Fill)
            .style(|_theme| container::Style {
                background: Some(iced::Background::Color(BACKGROUND_BLACK)),
                ..Default::default()
            })
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = AppSettings::load_from(&dir.path().join("config.json")).expect("defaults");
        assert_eq!(settings, AppSettings::default());
        assert!(!settings.is_valid());
        assert_eq!(settings.page_window, 5);
        assert_eq!(settings.enrichment_concurrency, 8);
    }

    #[test]
    fn older_files_without_new_fields_still_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"api_key": "abc", "language": "de-DE"}"#).expect("write");

        let settings = AppSettings::load_from(&path).expect("loads");
        assert_eq!(settings.api_key, "abc");
        assert_eq!(settings.language, "de-DE");
        assert_eq!(settings.page_window, 5);
    }

    #[test]
    fn saved_settings_load_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.json");
        let settings = AppSettings {
            api_key: String::from("key"),
            enrichment_concurrency: 4,
            ..Default::default()
        };
        settings.save_to(&path).expect("saved");
        assert_eq!(AppSettings::load_from(&path).expect("loads"), settings);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").expect("write");
        assert!(matches!(AppSettings::load_from(&path), Err(SettingsError::Json(_))));
    }

    #[test]
    fn environment_key_overrides_file_key() {
        let mut settings = AppSettings {
            api_key: String::from("from-file"),
            ..Default::default()
        };
        settings.apply_env_key(Some(String::from("  ")));
        assert_eq!(settings.api_key, "from-file");
        settings.apply_env_key(Some(String::from("from-env")));
        assert_eq!(settings.api_key, "from-env");
    }

    #[test]
    fn setup_rejects_blank_key() {
        let mut page = SetupPage::new(AppSettings::default());
        page.update(SetupMessage::ApiKeyChanged(String::from("   ")));
        assert!(page.update(SetupMessage::Submit).is_none());
        assert_eq!(page.error.as_deref(), Some("API key is required"));
    }
}
