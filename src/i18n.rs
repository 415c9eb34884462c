//! UI strings for the two supported languages.
//!
//! Messages are looked up by [`MessageKey`] in a per-language table. A key
//! missing from a table falls back to its own identifier, so an incomplete
//! table degrades visibly instead of silently showing another language.

use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    Chinese,
    English,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::Chinese, Language::English];

    pub fn code(self) -> &'static str {
        match self {
            Language::Chinese => "zh",
            Language::English => "en",
        }
    }

    fn table(self) -> &'static [(MessageKey, &'static str)] {
        match self {
            Language::Chinese => ZH,
            Language::English => EN,
        }
    }

    pub fn tr(self, key: MessageKey) -> &'static str {
        lookup(self.table(), key)
    }

    /// Translates `key` and substitutes `arg` for its `{}` placeholder.
    pub fn fill(self, key: MessageKey, arg: impl fmt::Display) -> String {
        self.tr(key).replacen("{}", &arg.to_string(), 1)
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zh" | "zh-cn" | "cn" | "chinese" => Ok(Language::Chinese),
            "en" | "en-us" | "english" => Ok(Language::English),
            other => Err(format!("unsupported language \"{other}\", expected zh or en")),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageKey {
    Title,
    Prompt,
    Help,
    Warning,
    Error,
    EmptyInput,
    NoValidWords,
    Busy,
    Generating,
    Generated,
    GenerateFailed,
    NoImage,
    Saved,
    SaveFailed,
    SplitConfirm,
    SplitDone,
    SplitCancelled,
    DefaultFont,
    AddFontEntry,
    FontList,
    FontSelected,
    PickerPrompt,
    PickerCancelled,
    FontAdded,
    FontAddFailed,
    DuplicateFont,
    LanguageChanged,
    BufferCleared,
    BufferEmpty,
    UnknownCommand,
}

impl MessageKey {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKey::Title => "title",
            MessageKey::Prompt => "prompt",
            MessageKey::Help => "help",
            MessageKey::Warning => "warning",
            MessageKey::Error => "error",
            MessageKey::EmptyInput => "empty_input",
            MessageKey::NoValidWords => "no_valid_words",
            MessageKey::Busy => "busy",
            MessageKey::Generating => "generating",
            MessageKey::Generated => "generated",
            MessageKey::GenerateFailed => "generate_failed",
            MessageKey::NoImage => "no_image",
            MessageKey::Saved => "saved",
            MessageKey::SaveFailed => "save_failed",
            MessageKey::SplitConfirm => "split_confirm",
            MessageKey::SplitDone => "split_done",
            MessageKey::SplitCancelled => "split_cancelled",
            MessageKey::DefaultFont => "default_font",
            MessageKey::AddFontEntry => "add_font_entry",
            MessageKey::FontList => "font_list",
            MessageKey::FontSelected => "font_selected",
            MessageKey::PickerPrompt => "picker_prompt",
            MessageKey::PickerCancelled => "picker_cancelled",
            MessageKey::FontAdded => "font_added",
            MessageKey::FontAddFailed => "font_add_failed",
            MessageKey::DuplicateFont => "duplicate_font",
            MessageKey::LanguageChanged => "language_changed",
            MessageKey::BufferCleared => "buffer_cleared",
            MessageKey::BufferEmpty => "buffer_empty",
            MessageKey::UnknownCommand => "unknown_command",
        }
    }
}

fn lookup(table: &'static [(MessageKey, &'static str)], key: MessageKey) -> &'static str {
    table
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, text)| *text)
        .unwrap_or_else(|| key.as_str())
}

const ZH: &[(MessageKey, &str)] = &[
    (MessageKey::Title, "词云生成器"),
    (MessageKey::Prompt, "请输入词语，每行一个（输入 :help 查看命令）"),
    (
        MessageKey::Help,
        ":gen 生成  :split 自动分词  :save [路径] 下载  :fonts 字体列表  :font <序号> 选择字体  :font add 添加字体  :show 显示文本  :clear 清空  :lang <zh|en> 切换语言  :quit 退出",
    ),
    (MessageKey::Warning, "警告"),
    (MessageKey::Error, "错误"),
    (MessageKey::EmptyInput, "请输入文本内容！"),
    (MessageKey::NoValidWords, "没有有效的词语输入！"),
    (MessageKey::Busy, "词云正在生成中，请稍候……"),
    (MessageKey::Generating, "正在生成词云……"),
    (MessageKey::Generated, "词云已生成（{} 个词语）"),
    (MessageKey::GenerateFailed, "生成词云时出错：{}"),
    (MessageKey::NoImage, "请先生成词云！"),
    (MessageKey::Saved, "词云已保存到：{}"),
    (MessageKey::SaveFailed, "保存图片时出错：{}"),
    (MessageKey::SplitConfirm, "自动分词将覆盖当前文本，是否继续？[y/N]"),
    (MessageKey::SplitDone, "分词完成，共 {} 个词语"),
    (MessageKey::SplitCancelled, "已取消分词"),
    (MessageKey::DefaultFont, "默认字体"),
    (MessageKey::AddFontEntry, "添加字体……"),
    (MessageKey::FontList, "可用字体："),
    (MessageKey::FontSelected, "已选择字体：{}"),
    (MessageKey::PickerPrompt, "请输入字体文件路径（留空取消）："),
    (MessageKey::PickerCancelled, "已取消添加字体"),
    (MessageKey::FontAdded, "已添加字体：{}"),
    (MessageKey::FontAddFailed, "添加字体时出错：{}"),
    (MessageKey::DuplicateFont, "字体“{}”已存在！"),
    (MessageKey::LanguageChanged, "界面语言已切换为中文"),
    (MessageKey::BufferCleared, "文本已清空"),
    (MessageKey::BufferEmpty, "（文本为空）"),
    (MessageKey::UnknownCommand, "未知命令：{}"),
];

const EN: &[(MessageKey, &str)] = &[
    (MessageKey::Title, "Word Cloud Generator"),
    (MessageKey::Prompt, "Enter words, one per line (type :help for commands)"),
    (
        MessageKey::Help,
        ":gen generate  :split auto-split  :save [path] download  :fonts list fonts  :font <n> select font  :font add add a font  :show show text  :clear clear  :lang <zh|en> language  :quit exit",
    ),
    (MessageKey::Warning, "Warning"),
    (MessageKey::Error, "Error"),
    (MessageKey::EmptyInput, "Please enter some text!"),
    (MessageKey::NoValidWords, "No valid words were entered!"),
    (MessageKey::Busy, "A word cloud is being generated, please wait..."),
    (MessageKey::Generating, "Generating word cloud..."),
    (MessageKey::Generated, "Word cloud generated ({} words)"),
    (MessageKey::GenerateFailed, "Error while generating word cloud: {}"),
    (MessageKey::NoImage, "Please generate a word cloud first!"),
    (MessageKey::Saved, "Word cloud saved to: {}"),
    (MessageKey::SaveFailed, "Error while saving image: {}"),
    (
        MessageKey::SplitConfirm,
        "Auto-split will replace the current text. Continue? [y/N]",
    ),
    (MessageKey::SplitDone, "Split finished, {} words"),
    (MessageKey::SplitCancelled, "Split cancelled"),
    (MessageKey::DefaultFont, "Default font"),
    (MessageKey::AddFontEntry, "Add font..."),
    (MessageKey::FontList, "Available fonts:"),
    (MessageKey::FontSelected, "Selected font: {}"),
    (MessageKey::PickerPrompt, "Path to a font file (empty to cancel):"),
    (MessageKey::PickerCancelled, "Adding a font was cancelled"),
    (MessageKey::FontAdded, "Font added: {}"),
    (MessageKey::FontAddFailed, "Error while adding font: {}"),
    (MessageKey::DuplicateFont, "A font named \"{}\" already exists!"),
    (MessageKey::LanguageChanged, "Interface language switched to English"),
    (MessageKey::BufferCleared, "Text cleared"),
    (MessageKey::BufferEmpty, "(text is empty)"),
    (MessageKey::UnknownCommand, "Unknown command: {}"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_per_language() {
        assert_eq!(Language::Chinese.tr(MessageKey::EmptyInput), "请输入文本内容！");
        assert_eq!(Language::English.tr(MessageKey::EmptyInput), "Please enter some text!");
    }

    #[test]
    fn missing_entry_falls_back_to_key() {
        assert_eq!(lookup(&[], MessageKey::Saved), "saved");
        assert_eq!(
            lookup(&[(MessageKey::Title, "t")], MessageKey::Busy),
            MessageKey::Busy.as_str()
        );
    }

    #[test]
    fn fill_substitutes_argument() {
        assert_eq!(
            Language::English.fill(MessageKey::Saved, "/tmp/a.png"),
            "Word cloud saved to: /tmp/a.png"
        );
        assert_eq!(Language::Chinese.fill(MessageKey::SplitDone, 3), "分词完成，共 3 个词语");
    }

    #[test]
    fn parses_language_codes() {
        assert_eq!("en".parse::<Language>(), Ok(Language::English));
        assert_eq!("ZH".parse::<Language>(), Ok(Language::Chinese));
        assert!("fr".parse::<Language>().is_err());
    }
}
