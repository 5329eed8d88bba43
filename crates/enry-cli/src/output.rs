//! Text or JSON rendering of command results

use anyhow::Result;
use serde::Serialize;
use std::fmt::Display;

/// Print `value` as pretty JSON or with its `Display` form
pub fn emit<T: Serialize + Display>(value: &T, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", value);
    }
    Ok(())
}
