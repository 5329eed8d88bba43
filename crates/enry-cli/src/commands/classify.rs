//! Classify command - the boolean path classifiers

use crate::commands::read_content;
use anyhow::Result;
use enry_bridge::Enry;
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Flags reported for one file
#[derive(Debug, Serialize)]
pub struct Classification<'a> {
    pub file: &'a Path,
    pub vendor: bool,
    pub generated: bool,
    pub binary: bool,
    pub configuration: bool,
    pub documentation: bool,
    pub dotfile: bool,
    pub image: bool,
    pub test: bool,
}

impl Classification<'_> {
    fn flags(&self) -> [(&'static str, bool); 8] {
        [
            ("vendor", self.vendor),
            ("generated", self.generated),
            ("binary", self.binary),
            ("configuration", self.configuration),
            ("documentation", self.documentation),
            ("dotfile", self.dotfile),
            ("image", self.image),
            ("test", self.test),
        ]
    }
}

impl fmt::Display for Classification<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file.display())?;
        for (name, value) in self.flags() {
            write!(f, "\n  {:<14} {}", name, if value { "yes" } else { "no" })?;
        }
        Ok(())
    }
}

pub fn run<'a>(enry: &Enry, file: &'a Path) -> Result<Classification<'a>> {
    let content = read_content(file)?;

    Ok(Classification {
        file,
        vendor: enry.is_vendor(file)?,
        generated: enry.is_generated(file, &content)?,
        binary: enry.is_binary(&content)?,
        configuration: enry.is_configuration(file)?,
        documentation: enry.is_documentation(file)?,
        dotfile: enry.is_dot_file(file)?,
        image: enry.is_image(file)?,
        test: enry.is_test(file)?,
    })
}
