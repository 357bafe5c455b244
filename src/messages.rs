//! User-facing message catalog.
//!
//! Every diagnostic the interpreter prints goes through [`Messages`], so the
//! wording can change with the [`Locale`] while the line structure
//! (`<command>: <subject>: <message>`) stays fixed.

use std::fmt;
use std::str::FromStr;

/// Name the interpreter uses when it reports its own (syntax) errors.
const SHELL_NAME: &str = "terminal";

/// Language of the message catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Locale {
    /// Russian, the reference wording.
    #[default]
    Ru,
    /// English.
    En,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ru" => Ok(Locale::Ru),
            "en" => Ok(Locale::En),
            other => Err(format!("unknown locale `{}`, expected `ru` or `en`", other)),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locale::Ru => f.write_str("ru"),
            Locale::En => f.write_str("en"),
        }
    }
}

/// Renders localized diagnostics. Returned strings carry no line terminator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Messages {
    locale: Locale,
}

impl Messages {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn command_not_found(&self, cmd: &str) -> String {
        match self.locale {
            Locale::Ru => format!("{}: команда не найдена", cmd),
            Locale::En => format!("{}: command not found", cmd),
        }
    }

    /// Reported by `cat`, `wc` and `grep` for any file that cannot be read.
    pub fn no_such_file(&self, cmd: &str, name: &str) -> String {
        match self.locale {
            Locale::Ru => format!("{}: {}: Нет такого файла или каталога", cmd, name),
            Locale::En => format!("{}: {}: No such file or directory", cmd, name),
        }
    }

    pub fn bad_context(&self, cmd: &str) -> String {
        match self.locale {
            Locale::Ru => format!("{}: bad_context: Неверный аргумент длины контекста", cmd),
            Locale::En => format!("{}: bad_context: Invalid context length", cmd),
        }
    }

    /// `flag` is printed as given, including its leading dash.
    pub fn invalid_option(&self, cmd: &str, flag: &str) -> String {
        match self.locale {
            Locale::Ru => format!("{}: {}: Неверный ключ", cmd, flag),
            Locale::En => format!("{}: {}: Invalid option", cmd, flag),
        }
    }

    pub fn missing_pattern(&self, cmd: &str) -> String {
        match self.locale {
            Locale::Ru => format!("{}: pattern: Не задан шаблон поиска", cmd),
            Locale::En => format!("{}: pattern: No pattern given", cmd),
        }
    }

    /// Label of the summary line `wc` prints for several files.
    pub fn total(&self) -> &'static str {
        match self.locale {
            Locale::Ru => "итого",
            Locale::En => "total",
        }
    }

    pub fn unmatched_quote(&self) -> String {
        match self.locale {
            Locale::Ru => format!("{}: синтаксическая ошибка: непарная кавычка", SHELL_NAME),
            Locale::En => format!("{}: syntax error: unmatched quote", SHELL_NAME),
        }
    }

    pub fn empty_stage(&self) -> String {
        match self.locale {
            Locale::Ru => format!(
                "{}: синтаксическая ошибка: пустая команда в конвейере",
                SHELL_NAME
            ),
            Locale::En => format!("{}: syntax error: empty pipeline stage", SHELL_NAME),
        }
    }
}
