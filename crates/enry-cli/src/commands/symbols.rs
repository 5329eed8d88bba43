//! Symbols command - which declared entry points the library provides

use enry_bridge::Enry;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Serialize)]
pub struct SymbolStatus {
    symbol: &'static str,
    linked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    signature: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SymbolReport {
    origin: String,
    symbols: Vec<SymbolStatus>,
}

impl fmt::Display for SymbolReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.origin)?;
        for status in &self.symbols {
            write!(
                f,
                "\n  {:<30} {}",
                status.symbol,
                status.signature.as_deref().unwrap_or("missing")
            )?;
        }
        Ok(())
    }
}

pub fn run(enry: &Enry) -> SymbolReport {
    let symbols = enry
        .signatures()
        .into_iter()
        .map(|(symbol, signature)| SymbolStatus {
            symbol,
            linked: signature.is_some(),
            signature,
        })
        .collect();

    SymbolReport {
        origin: enry.origin().to_string(),
        symbols,
    }
}
