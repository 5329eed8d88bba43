//! Detection commands - language, languages and guess

use crate::commands::read_content;
use anyhow::Result;
use clap::ValueEnum;
use enry_bridge::{Enry, Guess};
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Detection strategy for `enry guess`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Extension,
    Filename,
    Content,
    Modeline,
    Emacs,
    Vim,
    Shebang,
}

impl Strategy {
    /// Whether the strategy looks at the file's bytes
    pub fn needs_content(&self) -> bool {
        !matches!(self, Strategy::Extension | Strategy::Filename)
    }
}

#[derive(Debug, Serialize)]
pub struct LanguageReport<'a> {
    file: &'a Path,
    language: String,
}

impl fmt::Display for LanguageReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.language.is_empty() {
            write!(f, "{}: unknown", self.file.display())
        } else {
            write!(f, "{}: {}", self.file.display(), self.language)
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LanguagesReport<'a> {
    file: &'a Path,
    languages: Vec<String>,
}

impl fmt::Display for LanguagesReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.file.display())?;
        if self.languages.is_empty() {
            write!(f, " unknown")
        } else {
            for language in &self.languages {
                write!(f, "\n  {}", language)?;
            }
            Ok(())
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GuessReport<'a> {
    file: &'a Path,
    strategy: Strategy,
    #[serde(flatten)]
    guess: Guess,
}

impl fmt::Display for GuessReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.guess.is_unknown() {
            write!(f, "{}: unknown", self.file.display())
        } else {
            write!(f, "{}: {}", self.file.display(), self.guess)
        }
    }
}

/// Most likely language, from name and content
pub fn language<'a>(enry: &Enry, file: &'a Path) -> Result<LanguageReport<'a>> {
    let content = read_content(file)?;
    let language = enry.get_language(file, &content)?;
    Ok(LanguageReport { file, language })
}

/// Every plausible language
pub fn languages<'a>(enry: &Enry, file: &'a Path) -> Result<LanguagesReport<'a>> {
    let content = read_content(file)?;
    let languages = enry.get_languages(file, &content)?;
    Ok(LanguagesReport { file, languages })
}

/// One strategy's guess
pub fn guess<'a>(enry: &Enry, file: &'a Path, strategy: Strategy) -> Result<GuessReport<'a>> {
    let content = if strategy.needs_content() {
        read_content(file)?
    } else {
        Vec::new()
    };

    let guess = match strategy {
        Strategy::Extension => enry.get_language_by_extension(file)?,
        Strategy::Filename => enry.get_language_by_filename(file)?,
        Strategy::Content => enry.get_language_by_content(file, &content)?,
        Strategy::Modeline => enry.get_language_by_modeline(&content)?,
        Strategy::Emacs => enry.get_language_by_emacs_modeline(&content)?,
        Strategy::Vim => enry.get_language_by_vim_modeline(&content)?,
        Strategy::Shebang => enry.get_language_by_shebang(&content)?,
    };

    Ok(GuessReport {
        file,
        strategy,
        guess,
    })
}
