// LabWired - Device Catalog Sync
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Repetition groups: `<dim>`, `<dimIncrement>`, `<dimIndex>`.
//!
//! A group turns one declaration into `dim` instances. Instance names come
//! from substituting index tokens into the declared name template;
//! instance offsets stride by `dimIncrement`.

use std::sync::OnceLock;

use regex::Regex;

use crate::doc::{chain_text, Element};
use crate::hexval::HexValue;

/// Source of the per-instance index tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexSpec {
    /// No `<dimIndex>`: tokens count up from zero.
    Counter,
    /// `start-end`, both decimal: tokens are the inclusive range.
    Range(u64, u64),
    /// Comma-separated literals, kept verbatim.
    List(Vec<String>),
    /// Unrecognized spelling. Tokens degrade to the counter form, but the
    /// group never validates.
    Invalid,
}

/// A parsed repetition group.
#[derive(Debug, Clone)]
pub struct DimGroup {
    count: u64,
    increment: HexValue,
    index: IndexSpec,
}

impl DimGroup {
    /// Reads the group off a derivation chain, if any link declares one.
    pub(crate) fn from_chain(chain: &[Element]) -> Option<DimGroup> {
        let count = chain_text(chain, "dim")?;
        let count = HexValue::parse(count).to_u64().unwrap_or(0);
        let increment = chain_text(chain, "dimIncrement")
            .map(HexValue::parse)
            .unwrap_or_else(HexValue::none);
        let index = match chain_text(chain, "dimIndex") {
            None => IndexSpec::Counter,
            Some(text) => parse_index_spec(text),
        };
        Some(DimGroup {
            count,
            increment,
            index,
        })
    }

    /// Declared instance count.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Offset stride between consecutive instances.
    pub fn increment(&self) -> &HexValue {
        &self.increment
    }

    /// A group is usable when it declares at least two instances, a
    /// present non-zero increment, and an index source whose cardinality
    /// matches the count.
    pub fn is_valid(&self) -> bool {
        if self.count < 2 {
            return false;
        }
        if self.increment.is_none() || self.increment.is_zero() {
            return false;
        }
        match &self.index {
            IndexSpec::Counter => true,
            // count >= 2 and start <= end hold here, so neither side wraps.
            IndexSpec::Range(start, end) => end - start == self.count - 1,
            IndexSpec::List(items) => items.len() as u64 == self.count,
            IndexSpec::Invalid => false,
        }
    }

    /// Per-instance tokens, `count` of them for a valid group.
    pub fn index_tokens(&self) -> Vec<String> {
        match &self.index {
            IndexSpec::Counter | IndexSpec::Invalid => {
                (0..self.count).map(|i| i.to_string()).collect()
            }
            IndexSpec::Range(start, end) => (*start..=*end).map(|i| i.to_string()).collect(),
            IndexSpec::List(items) => items.clone(),
        }
    }
}

fn parse_index_spec(text: &str) -> IndexSpec {
    let text = text.trim();
    if let Some((start, end)) = text.split_once('-') {
        if let (Ok(start), Ok(end)) = (start.trim().parse::<u64>(), end.trim().parse::<u64>()) {
            if start <= end {
                return IndexSpec::Range(start, end);
            }
            return IndexSpec::Invalid;
        }
    }
    if text.contains(',') {
        return IndexSpec::List(text.split(',').map(|item| item.trim().to_string()).collect());
    }
    IndexSpec::Invalid
}

static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();

/// Replaces `%s` in either case, or the bracketed `[%s]` spelling, with an
/// index token. Templates without a placeholder come back unchanged.
pub fn apply_index(template: &str, token: &str) -> String {
    let placeholder =
        PLACEHOLDER.get_or_init(|| Regex::new(r"(?i)\[\s*%s\s*\]|%s").unwrap());
    placeholder
        .replace_all(template, regex::NoExpand(token))
        .into_owned()
}
