use anyhow::Result;
use std::sync::Arc;

use quran_core::auxiliary::{AuxiliaryContent, AuxiliaryKind, AuxiliarySource};
use quran_core::{load_corpus, CoreError, FileStore, KeyValueStore, MemoryStore, Reader, SearchResult};

use crate::command_processor::{Command, CommandContext, CommandProcessor};
use crate::config::Config;
use crate::file_manager::FileManager;
use crate::highlight::verse_block;
use crate::status_manager::StatusManager;
use crate::text_width::wrap_indented;

const INDENT: usize = 2;

pub type SessionStore = Box<dyn KeyValueStore>;

/// Composition root: owns the session and everything the commands touch.
pub struct App {
    pub config: Config,
    pub reader: Reader<SessionStore>,
    pub aux: AuxiliarySource,
    pub status: StatusManager,
    pub file_manager: FileManager,
    pub command_processor: CommandProcessor,
    pub last_results: Vec<SearchResult>,
    aux_unavailable: Vec<AuxiliaryKind>,
    should_quit: bool,
}

impl App {
    pub async fn new() -> Result<Self> {
        let config = Config::load().await?;
        let store: SessionStore = match FileStore::open_default() {
            Ok(store) => Box::new(store),
            Err(e) => {
                log::error!("Falling back to in-memory storage: {}", e);
                Box::new(MemoryStore::new())
            }
        };
        let mut app = Self::with_store(config, store).await;
        if app.reader.store().get(quran_core::store::keys::POSITION).is_none() {
            app.status
                .set_info("Welcome. Type 'help' for the list of commands".to_string());
        }
        Ok(app)
    }

    pub async fn with_store(config: Config, mut store: SessionStore) -> Self {
        let source = config.corpus_source();
        let corpus = load_corpus(Some(source.as_path()), &mut store).await;
        let reader = Reader::open(Arc::new(corpus), store);
        let aux = AuxiliarySource::new(config.aux_root());

        let mut app = Self {
            config,
            reader,
            aux,
            status: StatusManager::new(),
            file_manager: FileManager::new(),
            command_processor: CommandProcessor::new(),
            last_results: Vec::new(),
            aux_unavailable: Vec::new(),
            should_quit: false,
        };
        if !app.reader.corpus().is_complete() {
            app.status.set_warning(format!(
                "Only {} chapters are loaded",
                app.reader.corpus().chapters().len()
            ));
        }
        app.status.set_location(app.location_label());
        app
    }

    /// Run one input line and return what should be printed.
    pub async fn handle_line(&mut self, line: &str) -> String {
        let mut output = String::new();

        match Command::parse(line) {
            Ok(Some(command)) => {
                let mut ctx = CommandContext {
                    reader: &mut self.reader,
                    file_manager: &mut self.file_manager,
                    aux: &self.aux,
                    config: &self.config,
                    last_results: &mut self.last_results,
                    should_quit: &mut self.should_quit,
                };
                match self.command_processor.execute_command(command, &mut ctx).await {
                    Ok(outcome) => {
                        if let Some(message) = outcome.status {
                            self.status.set_success(message);
                        }
                        if let Some(text) = outcome.text {
                            output.push_str(&text);
                        }
                        if outcome.show_verse {
                            self.refresh_auxiliary().await;
                            output.push_str(&self.render_current());
                        }
                    }
                    Err(e) => match e.downcast_ref::<CoreError>() {
                        Some(core) => self.status.report(core),
                        None => self.status.set_error(e.to_string()),
                    },
                }
            }
            Ok(None) => {}
            Err(e) => self.status.set_error(e.to_string()),
        }

        for error in self.reader.take_storage_errors() {
            self.status.report(&error);
        }
        self.status.set_location(self.location_label());
        output
    }

    /// Fetch every side panel the preferences ask for. Translation and
    /// tafsir are independent; a result that arrives after the reader has
    /// moved on is dropped by the reader.
    pub async fn refresh_auxiliary(&mut self) {
        let target = self.reader.position();
        self.aux_unavailable.clear();

        if self.translation_shown() {
            let fetched = self
                .aux
                .translation(&self.config.translation_variant, target)
                .await
                .map(AuxiliaryContent::Translation);
            self.accept(target, AuxiliaryKind::Translation, fetched);
        } else {
            self.reader.clear_auxiliary(AuxiliaryKind::Translation);
        }

        if self.reader.preferences().tafsir_enabled {
            let fetched = self
                .aux
                .tafsir(&self.config.tafsir_variant, target)
                .await
                .map(AuxiliaryContent::Tafsir);
            self.accept(target, AuxiliaryKind::Tafsir, fetched);
        } else {
            self.reader.clear_auxiliary(AuxiliaryKind::Tafsir);
        }
    }

    fn accept(
        &mut self,
        target: quran_core::Position,
        kind: AuxiliaryKind,
        fetched: quran_core::Result<AuxiliaryContent>,
    ) {
        match fetched {
            Ok(content) => {
                self.reader.accept_auxiliary(target, content);
            }
            Err(e) => {
                log::debug!("No {} for {}: {}", kind.label(), target, e);
                self.reader.clear_auxiliary(kind);
                self.aux_unavailable.push(kind);
            }
        }
    }

    fn translation_shown(&self) -> bool {
        self.reader.preferences().translation_enabled || self.config.show_translation_inline
    }

    /// The current verse with its header and any side panels.
    pub fn render_current(&self) -> String {
        let pos = self.reader.position();
        let state = self.reader.state();
        let prefs = self.reader.preferences();
        let width = self.config.wrap_width;

        let Some(chapter) = self.reader.corpus().chapter(pos.chapter) else {
            return format!("{} is not loaded", pos);
        };
        let text = chapter
            .verse(pos.verse)
            .map(|v| v.text.as_str())
            .unwrap_or_default();

        let mut markers = String::new();
        if state.is_bookmarked(pos) {
            markers.push_str(" [bookmarked]");
        }
        if state.is_memorized(pos) {
            markers.push_str(" [memorized]");
        }

        let mut out = format!(
            "{} ({}) {}/{}  {}%{}\n{}",
            chapter.name,
            chapter.english_name,
            pos,
            chapter.ayah_count(),
            self.reader.chapter_progress(),
            markers,
            verse_block(text, width, INDENT, prefs.tajweed_enabled)
        );

        if self.translation_shown() {
            match self.reader.auxiliary(AuxiliaryKind::Translation) {
                Some(AuxiliaryContent::Translation(translation)) => {
                    out.push('\n');
                    out.push_str(&wrap_indented(&translation.text, width, INDENT * 2));
                }
                _ => out.push_str(&self.placeholder(AuxiliaryKind::Translation)),
            }
        }

        if prefs.tafsir_enabled {
            match self.reader.auxiliary(AuxiliaryKind::Tafsir) {
                Some(AuxiliaryContent::Tafsir(tafsir)) => {
                    out.push_str(&format!("\n\n  {}:\n", tafsir.name));
                    out.push_str(&wrap_indented(&tafsir.text, width, INDENT * 2));
                }
                _ => out.push_str(&self.placeholder(AuxiliaryKind::Tafsir)),
            }
        }

        out
    }

    fn placeholder(&self, kind: AuxiliaryKind) -> String {
        if self.aux_unavailable.contains(&kind) {
            format!("\n    ({} unavailable for this verse)", kind.label())
        } else {
            String::new()
        }
    }

    pub fn location_label(&self) -> String {
        let pos = self.reader.position();
        match self.reader.corpus().chapter(pos.chapter) {
            Some(chapter) => format!("{} {}", chapter.english_name, pos),
            None => pos.to_string(),
        }
    }

    pub fn update_status(&mut self) {
        self.status.update();
    }

    pub fn prompt(&self) -> String {
        self.status.prompt()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Flush every slice before exit.
    pub fn shutdown(&mut self) {
        self.reader.flush_all();
        for error in self.reader.take_storage_errors() {
            log::error!("Could not save session state: {}", error);
        }
        log::info!("Session closed at {}", self.reader.position());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quran_core::store::keys;
    use quran_core::Position;
    use tempfile::TempDir;

    async fn sample_app(dir: &TempDir) -> App {
        let config = Config {
            corpus_path: Some(dir.path().join("missing.json")),
            aux_data_dir: Some(dir.path().to_path_buf()),
            ..Config::default()
        };
        App::with_store(config, Box::new(MemoryStore::new())).await
    }

    async fn write_aux(dir: &TempDir, relative: &str, body: &str) {
        let path = dir.path().join(relative);
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(path, body).await.unwrap();
    }

    #[tokio::test]
    async fn test_starts_on_sample_corpus() {
        let dir = TempDir::new().unwrap();
        let app = sample_app(&dir).await;
        assert_eq!(app.reader.position(), Position::new(1, 1));
        assert!(app.render_current().starts_with("الفاتحة (Al-Fatiha) 1:1/7"));
        assert!(app.prompt().contains("Al-Fatiha 1:1"));
    }

    #[tokio::test]
    async fn test_handle_line_moves_and_renders() {
        let dir = TempDir::new().unwrap();
        let mut app = sample_app(&dir).await;

        let output = app.handle_line("next").await;
        assert!(output.contains("1:2/7"));
        assert_eq!(app.location_label(), "Al-Fatiha 1:2");

        app.handle_line("goto 1:9").await;
        let message = app.status.get_current_message().unwrap();
        assert!(message.content.contains("outside the corpus"));

        assert!(app.handle_line("unknown-thing").await.is_empty());
        assert!(app.status.has_message());
    }

    #[tokio::test]
    async fn test_translation_panel_and_placeholder() {
        let dir = TempDir::new().unwrap();
        write_aux(
            &dir,
            "translations/en/1_1.json",
            r#"{"text": "In the name of Allah", "translator": "Saheeh"}"#,
        )
        .await;
        let mut app = sample_app(&dir).await;

        let output = app.handle_line("translation").await;
        assert!(output.contains("In the name of Allah"));

        let output = app.handle_line("next").await;
        assert!(output.contains("(translation unavailable for this verse)"));
        assert!(!output.contains("In the name of Allah"));
    }

    #[tokio::test]
    async fn test_tajweed_toggle_changes_rendering() {
        let dir = TempDir::new().unwrap();
        let mut app = sample_app(&dir).await;
        assert!(app.reader.preferences().tajweed_enabled);
        let coloured = app.render_current();

        app.handle_line("tajweed").await;
        assert!(!app.reader.preferences().tajweed_enabled);
        let plain = app.render_current();

        assert_ne!(coloured, plain);
        assert!(coloured.contains('\u{1b}'));
        assert!(!plain.contains('\u{1b}'));
        assert!(plain.contains("بِسْمِ"));
    }

    #[tokio::test]
    async fn test_translation_and_tafsir_show_together() {
        let dir = TempDir::new().unwrap();
        write_aux(
            &dir,
            "translations/en/1_1.json",
            r#"{"text": "In the name of Allah"}"#,
        )
        .await;
        write_aux(
            &dir,
            "tafsir/ibn-kathir/1_1.json",
            r#"{"tafsirName": "Ibn Kathir", "text": "The basmala opens the Book"}"#,
        )
        .await;
        let mut app = sample_app(&dir).await;

        app.handle_line("translation").await;
        let output = app.handle_line("tafsir").await;
        assert!(output.contains("In the name of Allah"));
        assert!(output.contains("Ibn Kathir:"));
        assert!(output.contains("The basmala opens the Book"));

        let output = app.handle_line("translation").await;
        assert!(!output.contains("In the name of Allah"));
        assert!(output.contains("The basmala opens the Book"));
    }

    #[tokio::test]
    async fn test_storage_failure_becomes_warning() {
        let dir = TempDir::new().unwrap();
        let mut store = MemoryStore::new();
        store.set_failing(true);
        let config = Config {
            corpus_path: Some(dir.path().join("missing.json")),
            ..Config::default()
        };
        let mut app = App::with_store(config, Box::new(store)).await;

        app.handle_line("bookmark").await;
        let message = app.status.get_current_message().unwrap();
        assert_eq!(
            message.message_type,
            crate::status_manager::MessageType::Warning
        );
        assert!(app.reader.state().is_bookmarked(Position::new(1, 1)));
    }

    #[tokio::test]
    async fn test_shutdown_flushes_position() {
        let dir = TempDir::new().unwrap();
        let mut app = sample_app(&dir).await;
        app.handle_line("chapter 112").await;
        app.shutdown();
        assert!(app.reader.store().get(keys::POSITION).is_some());
        assert!(app.reader.store().get(keys::PREFERENCES).is_some());
    }
}
