use std::collections::HashMap;

use thiserror::Error;

/// Symbols bound to lanes `0..4` when no key binding file is present.
pub const DEFAULT_LANE_SYMBOLS: [&str; 4] = ["d", "f", "j", "k"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyMapError {
    #[error("key map has no lanes")]
    Empty,
    #[error("lane {lane} has an empty symbol")]
    EmptySymbol { lane: usize },
    #[error("symbol `{symbol}` is bound to more than one lane")]
    Duplicate { symbol: String },
}

/// Immutable lookup from input symbol to lane index.
///
/// Lane order follows the order the symbols were given in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMap {
    symbols: Vec<String>,
    lanes: HashMap<String, usize>,
}

impl KeyMap {
    pub fn new<I, S>(symbols: I) -> Result<Self, KeyMapError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let symbols: Vec<String> = symbols.into_iter().map(Into::into).collect();
        if symbols.is_empty() {
            return Err(KeyMapError::Empty);
        }

        let mut lanes = HashMap::with_capacity(symbols.len());
        for (lane, symbol) in symbols.iter().enumerate() {
            if symbol.is_empty() {
                return Err(KeyMapError::EmptySymbol { lane });
            }
            if lanes.insert(symbol.clone(), lane).is_some() {
                return Err(KeyMapError::Duplicate {
                    symbol: symbol.clone(),
                });
            }
        }

        Ok(Self { symbols, lanes })
    }

    /// Lane index for a symbol, or `None` if the symbol is not mapped.
    pub fn lane_of(&self, symbol: &str) -> Option<usize> {
        self.lanes.get(symbol).copied()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.lanes.contains_key(symbol)
    }

    pub fn lane_count(&self) -> usize {
        self.symbols.len()
    }

    /// Symbol bound to a lane.
    pub fn symbol(&self, lane: usize) -> Option<&str> {
        self.symbols.get(lane).map(String::as_str)
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }
}

impl Default for KeyMap {
    fn default() -> Self {
        Self {
            symbols: DEFAULT_LANE_SYMBOLS.iter().map(|s| s.to_string()).collect(),
            lanes: DEFAULT_LANE_SYMBOLS
                .iter()
                .enumerate()
                .map(|(lane, s)| (s.to_string(), lane))
                .collect(),
        }
    }
}
