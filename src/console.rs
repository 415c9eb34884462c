//! Line-oriented front-end.
//!
//! Plain lines go into the edit buffer, lines starting with `:` are commands.
//! A line starting with `::` is text with the first colon removed.

use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
};

use tracing::debug;

use crate::{
    error::ActionError,
    i18n::{Language, MessageKey},
    selector::{FontEvent, FontSelector, Transition},
    session::{self, Session},
    Renderer,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Generate,
    Split,
    Save(Option<PathBuf>),
    Fonts,
    Font(usize),
    AddFont,
    Show,
    Clear,
    Lang(String),
    Help,
    Quit,
    Unknown(String),
}

pub enum Input<'a> {
    Text(&'a str),
    Command(Command),
}

pub fn parse_line(line: &str) -> Input<'_> {
    if line.starts_with("::") {
        return Input::Text(&line[1..]);
    }
    let Some(command) = line.strip_prefix(':') else {
        return Input::Text(line);
    };

    let mut parts = command.trim().splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or_default();
    let arg = parts.next().map(str::trim).filter(|arg| !arg.is_empty());

    let command = match (name, arg) {
        ("gen" | "generate", None) => Command::Generate,
        ("split", None) => Command::Split,
        ("save" | "download", path) => Command::Save(path.map(PathBuf::from)),
        ("fonts", None) => Command::Fonts,
        ("font", Some("add")) => Command::AddFont,
        ("font", Some(index)) => match index.parse() {
            Ok(index) => Command::Font(index),
            Err(_) => Command::Unknown(line.to_string()),
        },
        ("show", None) => Command::Show,
        ("clear", None) => Command::Clear,
        ("lang", Some(code)) => Command::Lang(code.to_string()),
        ("help" | "h", None) => Command::Help,
        ("quit" | "q" | "exit", None) => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    };

    Input::Command(command)
}

pub struct Console<R: Renderer, I: BufRead, O: Write> {
    session: Session<R>,
    input: I,
    output: O,
}

impl<R: Renderer, I: BufRead, O: Write> Console<R, I, O> {
    pub fn new(session: Session<R>, input: I, output: O) -> Self {
        Console {
            session,
            input,
            output,
        }
    }

    pub fn session(&self) -> &Session<R> {
        &self.session
    }

    fn lang(&self) -> Language {
        self.session.language()
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(&['\r', '\n'][..]).to_string()))
    }

    fn say(&mut self, key: MessageKey) -> io::Result<()> {
        writeln!(self.output, "{}", self.lang().tr(key))
    }

    fn say_with(&mut self, key: MessageKey, arg: impl std::fmt::Display) -> io::Result<()> {
        let text = self.lang().fill(key, arg);
        writeln!(self.output, "{text}")
    }

    fn report(&mut self, err: &ActionError) -> io::Result<()> {
        let lang = self.lang();
        let title = if err.is_warning() {
            MessageKey::Warning
        } else {
            MessageKey::Error
        };
        writeln!(self.output, "[{}] {}", lang.tr(title), err.user_message(lang))
    }

    /// Runs until `:quit` or end of input.
    pub fn run(&mut self) -> io::Result<()> {
        writeln!(self.output, "== {} ==", self.lang().tr(MessageKey::Title))?;
        self.say(MessageKey::Prompt)?;

        while let Some(line) = self.read_line()? {
            match parse_line(&line) {
                Input::Text(text) => self.session.append_line(text),
                Input::Command(Command::Quit) => break,
                Input::Command(command) => self.execute(command)?,
            }
            self.output.flush()?;
        }

        Ok(())
    }

    pub fn execute(&mut self, command: Command) -> io::Result<()> {
        debug!(target: "console", ?command, "command");

        match command {
            Command::Generate => {
                self.say(MessageKey::Generating)?;
                self.output.flush()?;
                match self.session.generate().map(|_| ()) {
                    Ok(()) => {
                        let words = self.session.frequencies().map_or(0, |f| f.len());
                        self.say_with(MessageKey::Generated, words)?;
                    }
                    Err(err) => self.report(&err)?,
                }
            }
            Command::Split => {
                if self.session.text().trim().is_empty() {
                    return self.report(&ActionError::EmptyInput);
                }
                self.say(MessageKey::SplitConfirm)?;
                self.output.flush()?;
                let answer = self.read_line()?.unwrap_or_default();
                if !matches!(answer.trim(), "y" | "Y" | "yes" | "是") {
                    return self.say(MessageKey::SplitCancelled);
                }
                match self.session.split_buffer() {
                    Ok(count) => {
                        self.say_with(MessageKey::SplitDone, count)?;
                        writeln!(self.output, "{}", self.session.text())?;
                    }
                    Err(err) => self.report(&err)?,
                }
            }
            Command::Save(path) => {
                let path = path.unwrap_or_else(session::default_export_path);
                match self.session.export(&path) {
                    Ok(()) => self.say_with(MessageKey::Saved, path.display())?,
                    Err(err) => self.report(&err)?,
                }
            }
            Command::Fonts => self.list_fonts()?,
            Command::Font(index) => match self.session.handle_font_event(FontEvent::Select(index)) {
                Ok(Transition::PickerOpened) => self.pick_font()?,
                Ok(_) => self.announce_font()?,
                Err(err) => self.report(&err)?,
            },
            Command::AddFont => {
                let add_entry = FontSelector::add_entry_index(self.session.fonts());
                match self.session.handle_font_event(FontEvent::Select(add_entry)) {
                    Ok(Transition::PickerOpened) => self.pick_font()?,
                    Ok(_) => {}
                    Err(err) => self.report(&err)?,
                }
            }
            Command::Show => {
                if self.session.text().is_empty() {
                    self.say(MessageKey::BufferEmpty)?;
                } else {
                    writeln!(self.output, "{}", self.session.text())?;
                }
            }
            Command::Clear => {
                self.session.clear_text();
                self.say(MessageKey::BufferCleared)?;
            }
            Command::Lang(code) => match code.parse::<Language>() {
                Ok(language) => {
                    self.session.set_language(language);
                    self.say(MessageKey::LanguageChanged)?;
                }
                Err(_) => self.say_with(MessageKey::UnknownCommand, format!(":lang {code}"))?,
            },
            Command::Help => self.say(MessageKey::Help)?,
            Command::Quit => {}
            Command::Unknown(line) => self.say_with(MessageKey::UnknownCommand, line)?,
        }

        Ok(())
    }

    fn list_fonts(&mut self) -> io::Result<()> {
        self.say(MessageKey::FontList)?;
        let current = self.session.selector().current();
        let count = FontSelector::add_entry_index(self.session.fonts()) + 1;

        for index in 0..count {
            let marker = if index == current { '*' } else { ' ' };
            let label = self.session.font_label(index).unwrap_or_default().to_string();
            writeln!(self.output, "{marker} {index:>3}  {label}")?;
        }

        Ok(())
    }

    fn announce_font(&mut self) -> io::Result<()> {
        let current = self.session.selector().current();
        let label = self.session.font_label(current).unwrap_or_default().to_string();
        self.say_with(MessageKey::FontSelected, label)
    }

    /// The picker: one line holding a path, empty to cancel.
    fn pick_font(&mut self) -> io::Result<()> {
        self.say(MessageKey::PickerPrompt)?;
        self.output.flush()?;

        let picked = self
            .read_line()?
            .map(|line| line.trim().trim_matches('"').to_string())
            .filter(|line| !line.is_empty())
            .map(PathBuf::from);

        match self.session.handle_font_event(FontEvent::PickerClosed(picked)) {
            Ok(Transition::PickerCancelled(_)) => self.say(MessageKey::PickerCancelled),
            Ok(_) => {
                let current = self.session.selector().current();
                let label = self.session.font_label(current).unwrap_or_default().to_string();
                self.say_with(MessageKey::FontAdded, label)
            }
            Err(err) => self.report(&err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, io::Cursor};

    use image::{Rgba, RgbaImage};

    use super::*;
    use crate::{error::RenderError, fonts::FontRegistry, FontSource, FrequencyMap};

    struct SolidRenderer;

    impl Renderer for SolidRenderer {
        fn render(&self, _: &FrequencyMap, _: &FontSource) -> Result<RgbaImage, RenderError> {
            Ok(RgbaImage::from_pixel(3, 2, Rgba([255, 255, 255, 255])))
        }
    }

    fn run(language: Language, fonts: FontRegistry, script: &str) -> (String, Session<SolidRenderer>) {
        let session = Session::new(language, SolidRenderer, fonts);
        let mut console = Console::new(session, Cursor::new(script.to_string()), Vec::new());
        console.run().unwrap();
        let Console { session, output, .. } = console;
        (String::from_utf8(output).unwrap(), session)
    }

    #[test]
    fn parses_commands_and_text() {
        assert!(matches!(parse_line("cat"), Input::Text("cat")));
        assert!(matches!(parse_line("::gen"), Input::Text(":gen")));
        assert!(matches!(parse_line(":gen"), Input::Command(Command::Generate)));
        assert!(matches!(parse_line(":font 3"), Input::Command(Command::Font(3))));
        assert!(matches!(parse_line(":font add"), Input::Command(Command::AddFont)));
        assert!(matches!(parse_line(":save"), Input::Command(Command::Save(None))));
        assert!(matches!(parse_line(":nope"), Input::Command(Command::Unknown(_))));
    }

    #[test]
    fn generate_without_text_warns() {
        let (output, session) = run(Language::Chinese, FontRegistry::new(), ":gen\n");
        assert!(output.contains("[警告] 请输入文本内容！"));
        assert!(session.image().is_none());
    }

    #[test]
    fn generates_and_saves() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("cloud.png");
        let script = format!("cat\ncat\ndog\n:gen\n:save {}\n", out.display());

        let (output, session) = run(Language::English, FontRegistry::new(), &script);

        assert!(output.contains("Word cloud generated (2 words)"));
        assert!(output.contains("Word cloud saved to:"));
        assert!(out.is_file());
        assert_eq!(session.frequencies().unwrap().get("cat"), Some(2));
    }

    #[test]
    fn split_asks_before_overwriting() {
        let (output, session) = run(Language::English, FontRegistry::new(), "hello, world!\n:split\nn\n");
        assert!(output.contains("Split cancelled"));
        assert_eq!(session.text(), "hello, world!");

        let (_, session) = run(Language::English, FontRegistry::new(), "hello, world!\n:split\ny\n");
        assert_eq!(session.text(), "hello\n,\nworld\n!");
    }

    #[test]
    fn duplicate_font_is_refused_with_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let other = tempfile::tempdir().unwrap();
        let existing = dir.path().join("Example Sans.ttf");
        let clash = other.path().join("Example Sans.ttf");
        fs::write(&existing, b"x").unwrap();
        fs::write(&clash, b"x").unwrap();
        let mut fonts = FontRegistry::new();
        fonts.register(&existing);

        let script = format!(":font 1\n:font add\n{}\n", clash.display());
        let (output, session) = run(Language::English, fonts, &script);

        assert!(output.contains("[Warning] A font named \"Example Sans\" already exists!"));
        assert_eq!(session.fonts().len(), 1);
        assert_eq!(session.selector().current(), 1);
    }

    #[test]
    fn cancelled_picker_keeps_selection() {
        let (output, session) = run(Language::English, FontRegistry::new(), ":font add\n\n:fonts\n");
        assert!(output.contains("Adding a font was cancelled"));
        assert!(output.contains("*   0  Default font"));
        assert_eq!(session.selector().current(), 0);
    }

    #[test]
    fn switches_language() {
        let (output, session) = run(Language::Chinese, FontRegistry::new(), ":lang en\n:gen\n");
        assert!(output.contains("Interface language switched to English"));
        assert!(output.contains("[Warning] Please enter some text!"));
        assert_eq!(session.language(), Language::English);
    }
}
