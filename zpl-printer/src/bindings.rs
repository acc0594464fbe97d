//! Placeholder bindings
//!
//! A binding set pairs placeholder tokens with replacement values by position.
//! Both sequences usually arrive as flat comma separated strings from the
//! command line, e.g. `"Product Key^,Barcode^"` and `"RT-4230^,0549D7C2^"`.

use crate::error::{PrintError, PrintResult};

/// Split a comma separated string into tokens
///
/// Only the whole input is trimmed. Tokens keep their inner whitespace and
/// there is no escaping, so a value can never contain a comma. A trailing
/// comma yields an empty final token. Blank input yields no tokens.
pub fn parse_list(input: &str) -> Vec<String> {
    let input = input.trim();
    if input.is_empty() {
        return Vec::new();
    }
    input.split(',').map(str::to_string).collect()
}

/// Ordered (placeholder, value) pairs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingSet {
    pairs: Vec<(String, String)>,
}

impl BindingSet {
    /// Pair names with values by position
    ///
    /// Lengths must match and no name may be empty. Repeated names and values
    /// that contain later names are accepted; substitution is chained.
    pub fn new(names: Vec<String>, values: Vec<String>) -> PrintResult<Self> {
        if names.len() != values.len() {
            return Err(PrintError::BindingLengthMismatch {
                names: names.len(),
                values: values.len(),
            });
        }

        if let Some(index) = names.iter().position(String::is_empty) {
            return Err(PrintError::EmptyPlaceholder(index));
        }

        Ok(Self {
            pairs: names.into_iter().zip(values).collect(),
        })
    }

    /// Parse both comma separated strings and pair them
    pub fn from_csv(names: &str, values: &str) -> PrintResult<Self> {
        Self::new(parse_list(names), parse_list(values))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterate pairs in substitution order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}
