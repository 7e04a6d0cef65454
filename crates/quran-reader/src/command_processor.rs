use anyhow::Result;
use chrono::Local;
use std::path::PathBuf;

use quran_core::auxiliary::{AuxiliaryContent, AuxiliarySource};
use quran_core::preferences::SETTABLE_KEYS;
use quran_core::recitation::{chapter_audio_url, preload_url};
use quran_core::reference::parse_reference;
use quran_core::{search, KeyValueStore, Position, Reader, SearchMode, SearchResult};

use crate::config::Config;
use crate::file_manager::FileManager;
use crate::highlight::verse_block;
use crate::text_width::truncate_to_width;

const FONT_STEP: i32 = 2;
const HISTORY_SHOWN: usize = 10;
const VERSE_INDENT: usize = 2;

pub const HELP: &str = "\
Navigation:  next (n), prev (p), goto <chapter>:<verse>, chapter <n>, chapters
Annotations: bookmark (b), memorize (m), bookmarks, memorized, history
Search:      search [all|chapter|verse|juz] <query>, open <result number>
Display:     show, read [chapter], words, font +|-, theme, tajweed, translation, tafsir
Audio:       audio, speed, volume <0..1>
Settings:    set, set <name> <value>
Data:        export <file>, import <file>, progress, share
Other:       help, quit (q)";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Next,
    Prev,
    Goto(Position),
    Chapter(u16),
    Chapters,
    Read(Option<u16>),
    Bookmark,
    Memorize,
    ListBookmarks,
    ListMemorized,
    History,
    Search(SearchMode, String),
    Open(usize),
    Show,
    Words,
    Font(i32),
    Theme,
    Tajweed,
    Translation,
    Tafsir,
    Audio,
    Speed,
    Volume(f32),
    Set(Option<(String, String)>),
    Export(PathBuf),
    Import(PathBuf),
    Progress,
    Share,
    Help,
    Quit,
}

impl Command {
    /// Parse one input line. Blank lines give `None`.
    pub fn parse(line: &str) -> Result<Option<Command>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "next" | "n" => Command::Next,
            "prev" | "p" => Command::Prev,
            "goto" | "g" => {
                let pos = parse_reference(rest)
                    .ok_or_else(|| anyhow::anyhow!("Usage: goto <chapter>:<verse>"))?;
                Command::Goto(pos)
            }
            "chapter" | "c" => {
                let number = rest
                    .parse()
                    .map_err(|_| anyhow::anyhow!("Usage: chapter <number>"))?;
                Command::Chapter(number)
            }
            "chapters" | "list" => Command::Chapters,
            "read" | "print" => {
                if rest.is_empty() {
                    Command::Read(None)
                } else {
                    let number = rest
                        .parse()
                        .map_err(|_| anyhow::anyhow!("Usage: read [chapter number]"))?;
                    Command::Read(Some(number))
                }
            }
            "bookmark" | "b" => Command::Bookmark,
            "memorize" | "m" => Command::Memorize,
            "bookmarks" => Command::ListBookmarks,
            "memorized" => Command::ListMemorized,
            "history" => Command::History,
            "search" | "/" => {
                if rest.is_empty() {
                    return Err(anyhow::anyhow!("Usage: search [mode] <query>"));
                }
                match rest.split_once(char::is_whitespace) {
                    Some((mode, query)) => match mode.parse::<SearchMode>() {
                        Ok(mode) => Command::Search(mode, query.trim().to_string()),
                        Err(_) => Command::Search(SearchMode::All, rest.to_string()),
                    },
                    None => Command::Search(SearchMode::All, rest.to_string()),
                }
            }
            "open" | "o" => {
                let index = rest
                    .parse()
                    .map_err(|_| anyhow::anyhow!("Usage: open <result number>"))?;
                Command::Open(index)
            }
            "show" => Command::Show,
            "words" => Command::Words,
            "font" => {
                let delta = match rest {
                    "+" | "" => FONT_STEP,
                    "-" => -FONT_STEP,
                    other => other
                        .parse()
                        .map_err(|_| anyhow::anyhow!("Usage: font +|-|<delta>"))?,
                };
                Command::Font(delta)
            }
            "theme" | "dark" => Command::Theme,
            "tajweed" => Command::Tajweed,
            "translation" => Command::Translation,
            "tafsir" => Command::Tafsir,
            "audio" => Command::Audio,
            "speed" => Command::Speed,
            "volume" => {
                let volume = rest
                    .parse()
                    .map_err(|_| anyhow::anyhow!("Usage: volume <0..1>"))?;
                Command::Volume(volume)
            }
            "set" => {
                if rest.is_empty() {
                    Command::Set(None)
                } else {
                    let (name, value) = rest
                        .split_once(char::is_whitespace)
                        .ok_or_else(|| anyhow::anyhow!("Usage: set <name> <value>"))?;
                    Command::Set(Some((name.to_string(), value.trim().to_string())))
                }
            }
            "export" => Command::Export(required_path(rest, "export")?),
            "import" => Command::Import(required_path(rest, "import")?),
            "progress" => Command::Progress,
            "share" => Command::Share,
            "help" | "?" => Command::Help,
            "quit" | "q" | "exit" => Command::Quit,
            other => {
                return Err(anyhow::anyhow!(
                    "Unknown command: {} (type 'help' for a list)",
                    other
                ))
            }
        };

        Ok(Some(command))
    }
}

fn required_path(rest: &str, command: &str) -> Result<PathBuf> {
    if rest.is_empty() {
        return Err(anyhow::anyhow!("Usage: {} <file>", command));
    }
    Ok(PathBuf::from(rest))
}

/// What the front end should do after a command.
#[derive(Debug, Default, PartialEq)]
pub struct Outcome {
    pub status: Option<String>,
    pub text: Option<String>,
    pub show_verse: bool,
}

impl Outcome {
    pub fn status(message: impl Into<String>) -> Self {
        Self {
            status: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn verse() -> Self {
        Self {
            show_verse: true,
            ..Self::default()
        }
    }

    fn and_verse(mut self) -> Self {
        self.show_verse = true;
        self
    }
}

/// The parts of the application a command may touch.
pub struct CommandContext<'a, S: KeyValueStore> {
    pub reader: &'a mut Reader<S>,
    pub file_manager: &'a mut FileManager,
    pub aux: &'a AuxiliarySource,
    pub config: &'a Config,
    pub last_results: &'a mut Vec<SearchResult>,
    pub should_quit: &'a mut bool,
}

pub struct CommandProcessor;

impl CommandProcessor {
    pub fn new() -> Self {
        Self
    }

    pub async fn execute_command<S: KeyValueStore>(
        &self,
        command: Command,
        ctx: &mut CommandContext<'_, S>,
    ) -> Result<Outcome> {
        let reader = &mut *ctx.reader;

        let outcome = match command {
            Command::Next => {
                reader.next();
                Outcome::verse()
            }
            Command::Prev => {
                reader.prev();
                Outcome::verse()
            }
            Command::Goto(pos) => {
                reader.jump_to(pos.chapter, pos.verse)?;
                Outcome::verse()
            }
            Command::Chapter(number) => {
                reader.jump_to(number, 1)?;
                Outcome::verse()
            }
            Command::Chapters => Outcome::text(list_chapters(reader)),
            Command::Read(number) => {
                let number = number.unwrap_or_else(|| reader.position().chapter);
                Outcome::text(read_chapter(reader, number, ctx.config.wrap_width)?)
            }
            Command::Open(index) => {
                let result = index
                    .checked_sub(1)
                    .and_then(|i| ctx.last_results.get(i))
                    .ok_or_else(|| anyhow::anyhow!("No search result #{}", index))?;
                reader.open_result(result)?;
                Outcome::verse()
            }
            Command::Show => Outcome::verse(),
            Command::Bookmark => {
                let pos = reader.position();
                if reader.toggle_bookmark(pos)? {
                    Outcome::status(format!("Bookmarked {}", pos))
                } else {
                    Outcome::status(format!("Removed bookmark at {}", pos))
                }
            }
            Command::Memorize => {
                let pos = reader.position();
                let marked = reader.toggle_memorization(pos)?;
                let verb = if marked { "Marked" } else { "Unmarked" };
                Outcome::status(format!(
                    "{} {} as memorized ({}% of the Quran)",
                    verb,
                    pos,
                    reader.memorization_percentage()
                ))
            }
            Command::ListBookmarks => Outcome::text(list_bookmarks(reader)),
            Command::ListMemorized => Outcome::text(list_memorized(reader)),
            Command::History => Outcome::text(list_history(reader)),
            Command::Search(mode, query) => {
                let results = search(&query, mode, reader.corpus());
                let listing = list_results(&query, mode, &results, ctx.config.wrap_width);
                *ctx.last_results = results;
                Outcome::text(listing)
            }
            Command::Words => {
                let target = reader.position();
                let words = ctx.aux.word_by_word(target).await?;
                let listing = words
                    .words
                    .iter()
                    .map(|w| match w.transliteration {
                        Some(ref trans) => format!("  {}  {}  ({})", w.ar, w.en, trans),
                        None => format!("  {}  {}", w.ar, w.en),
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                reader.accept_auxiliary(target, AuxiliaryContent::Words(words));
                Outcome::text(listing)
            }
            Command::Font(delta) => {
                let size = reader.adjust_font_size(delta);
                Outcome::status(format!("Font size {}px", size))
            }
            Command::Theme => {
                let dark = reader.toggle_dark_mode();
                Outcome::status(if dark { "Dark mode on" } else { "Dark mode off" })
            }
            Command::Tajweed => {
                let on = reader.toggle_tajweed();
                Outcome::status(format!("Tajweed colouring {}", on_off(on)))
            }
            Command::Translation => {
                let on = reader.toggle_translation();
                Outcome::status(format!("Translation {}", on_off(on))).and_verse()
            }
            Command::Tafsir => {
                let on = reader.toggle_tafsir();
                Outcome::status(format!("Tafsir {}", on_off(on))).and_verse()
            }
            Command::Audio => Outcome::text(audio_summary(reader)),
            Command::Speed => {
                let speed = reader.cycle_audio_speed();
                Outcome::status(format!("Playback speed {}x", speed))
            }
            Command::Volume(volume) => {
                let volume = reader.set_volume(volume);
                Outcome::status(format!("Volume {:.0}%", volume * 100.0))
            }
            Command::Set(None) => Outcome::text(list_preferences(reader)),
            Command::Set(Some((name, value))) => {
                let name = reader.set_preference(&name, &value)?;
                let shown = reader
                    .preferences()
                    .describe(name)
                    .unwrap_or_default();
                Outcome::status(format!("{} = {}", name, shown))
            }
            Command::Export(path) => {
                let json = reader.export()?;
                let message = ctx.file_manager.write_export(path, &json).await?;
                Outcome::status(message)
            }
            Command::Import(path) => {
                let json = ctx.file_manager.read_backup(path).await?;
                let summary = reader.import(&json)?;
                Outcome::status(summary.to_string())
            }
            Command::Progress => Outcome::text(progress_summary(reader)),
            Command::Share => {
                let text = reader
                    .share_text()
                    .ok_or_else(|| anyhow::anyhow!("Nothing to share at {}", reader.position()))?;
                Outcome::text(text)
            }
            Command::Help => Outcome::text(HELP),
            Command::Quit => {
                *ctx.should_quit = true;
                Outcome::default()
            }
        };

        Ok(outcome)
    }
}

impl Default for CommandProcessor {
    fn default() -> Self {
        Self::new()
    }
}

fn on_off(on: bool) -> &'static str {
    if on {
        "on"
    } else {
        "off"
    }
}

fn chapter_label<S: KeyValueStore>(reader: &Reader<S>, pos: Position) -> String {
    match reader.corpus().chapter(pos.chapter) {
        Some(chapter) => format!("{} ({}) {}", chapter.name, chapter.english_name, pos),
        None => pos.to_string(),
    }
}

fn list_chapters<S: KeyValueStore>(reader: &Reader<S>) -> String {
    let state = reader.state();
    let current = reader.position().chapter;
    reader
        .corpus()
        .chapters()
        .iter()
        .map(|chapter| {
            let mut line = format!(
                "{} {:>3}. {} ({}) {} verses",
                if chapter.number == current { ">" } else { " " },
                chapter.number,
                chapter.name,
                chapter.english_name,
                chapter.ayah_count()
            );
            if state.chapter_has_bookmark(chapter.number) {
                line.push_str(" [bookmarked]");
            }
            if state.chapter_has_memorized(chapter.number) {
                line.push_str(" [memorized]");
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// A whole chapter: header, then every verse numbered and wrapped.
fn read_chapter<S: KeyValueStore>(reader: &Reader<S>, number: u16, width: usize) -> Result<String> {
    let chapter = reader
        .corpus()
        .chapter(number)
        .ok_or_else(|| quran_core::CoreError::out_of_range(number, 1))?;
    let tajweed = reader.preferences().tajweed_enabled;

    let mut blocks = vec![format!(
        "{} ({}), {} verses",
        chapter.name,
        chapter.english_name,
        chapter.ayah_count()
    )];
    blocks.extend(chapter.ayahs.iter().enumerate().map(|(i, verse)| {
        let numbered = format!("({}) {}", i + 1, verse.text);
        verse_block(&numbered, width, VERSE_INDENT, tajweed)
    }));
    Ok(blocks.join("\n"))
}

fn list_preferences<S: KeyValueStore>(reader: &Reader<S>) -> String {
    let prefs = reader.preferences();
    SETTABLE_KEYS
        .iter()
        .filter_map(|name| {
            prefs
                .describe(name)
                .map(|value| format!("  {:<15} {}", name, value))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn list_bookmarks<S: KeyValueStore>(reader: &Reader<S>) -> String {
    let bookmarks = &reader.state().bookmarks;
    if bookmarks.is_empty() {
        return "No bookmarks yet".to_string();
    }
    bookmarks
        .iter()
        .map(|b| {
            let pos = Position::new(b.chapter, b.verse);
            format!(
                "  {}  {}",
                chapter_label(reader, pos),
                b.created_at.with_timezone(&Local).format("%Y-%m-%d")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn list_memorized<S: KeyValueStore>(reader: &Reader<S>) -> String {
    let state = reader.state();
    if state.memorized.is_empty() {
        return "No memorized verses yet".to_string();
    }
    let mut positions = state.memorized.positions();
    positions.sort();
    let mut lines: Vec<String> = positions
        .into_iter()
        .map(|pos| format!("  {}", chapter_label(reader, pos)))
        .collect();
    lines.push(format!(
        "{} verses, {}%",
        state.memorized_count(),
        state.memorization_percentage()
    ));
    lines.join("\n")
}

fn list_history<S: KeyValueStore>(reader: &Reader<S>) -> String {
    let history = &reader.state().history;
    if history.is_empty() {
        return "No reading history yet".to_string();
    }
    history
        .iter()
        .take(HISTORY_SHOWN)
        .map(|entry| {
            format!(
                "  {}  {}",
                entry.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                chapter_label(reader, entry.position())
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn list_results(query: &str, mode: SearchMode, results: &[SearchResult], width: usize) -> String {
    if results.is_empty() {
        return format!("No results for '{}' ({})", query, mode);
    }
    let mut lines: Vec<String> = results
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let head = format!("{:>3}. {} {}", i + 1, r.chapter_name, r.position());
            let room = width.saturating_sub(head.chars().count() + 2).max(10);
            format!("{}  {}", head, truncate_to_width(&r.matched_text, room))
        })
        .collect();
    lines.push(format!("{} results; 'open <n>' to read one", results.len()));
    lines.join("\n")
}

fn audio_summary<S: KeyValueStore>(reader: &Reader<S>) -> String {
    let prefs = reader.preferences();
    let chapter = reader.position().chapter;
    let mut lines = vec![
        format!("Reciter: {}", prefs.reciter),
        format!("Stream:  {}", chapter_audio_url(&prefs.reciter, chapter)),
    ];
    if let Some(next) = preload_url(&prefs.reciter, chapter) {
        lines.push(format!("Next:    {}", next));
    }
    lines.push(format!(
        "Speed {}x, volume {:.0}%, autoplay {}",
        prefs.audio_speed,
        prefs.audio_volume * 100.0,
        on_off(prefs.auto_play)
    ));
    lines.join("\n")
}

fn progress_summary<S: KeyValueStore>(reader: &Reader<S>) -> String {
    let state = reader.state();
    let daily = reader.daily_progress();
    format!(
        "Memorized {} verses ({}%), {} remaining\nToday: {}/{} verses{}\nChapter progress: {}%",
        state.memorized_count(),
        state.memorization_percentage(),
        state.remaining_count(),
        daily.read_today,
        daily.goal,
        if daily.is_met() { " (goal reached)" } else { "" },
        reader.chapter_progress()
    )
}
