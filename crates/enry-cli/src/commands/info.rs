//! Info command - metadata about one language

use anyhow::Result;
use enry_bridge::Enry;
use serde::Serialize;
use std::fmt;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LanguageInfo {
    pub language: String,
    pub color: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub extensions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl fmt::Display for LanguageInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.language)?;
        writeln!(f, "  type:       {}", self.kind)?;
        writeln!(f, "  color:      {}", self.color.as_deref().unwrap_or("-"))?;
        write!(f, "  extensions: {}", self.extensions.join(" "))?;
        if let Some(mime) = &self.mime_type {
            write!(f, "\n  mime type:  {}", mime)?;
        }
        Ok(())
    }
}

pub fn run(enry: &Enry, language: &str, path: Option<&Path>) -> Result<LanguageInfo> {
    let color = enry.get_color(language)?;
    Ok(LanguageInfo {
        language: language.to_string(),
        color: (!color.is_empty()).then_some(color),
        kind: enry.get_language_type(language)?,
        extensions: enry.get_language_extensions(language)?,
        mime_type: path
            .map(|path| enry.get_mime_type(path, language))
            .transpose()?,
    })
}
