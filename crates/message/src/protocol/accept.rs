//! Quality-valued header lists such as `Accept` and `Accept-Language`.
//!
//! A header like `text/html,application/xml;q=0.9,*/*;q=0.8` is grouped by quality
//! value and ordered from the most to the least preferred group. Groups are ordered by
//! the numeric value of their quality, so `0.85` ranks below `0.9` and `1` ties with
//! `1.0` (ties fall back to the quality text in descending order).

use std::cmp::Ordering;

const DEFAULT_QUALITY: &str = "1.0";

/// Tokens sharing one quality value.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityGroup {
    quality: String,
    weight: f64,
    tokens: Vec<String>,
}

impl QualityGroup {
    /// The quality value exactly as written in the header (`"1.0"` when omitted).
    pub fn quality(&self) -> &str {
        &self.quality
    }

    /// The numeric quality, `0.0` when the header carried a non-numeric value.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }
}

/// A parsed quality-valued header, most preferred group first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AcceptList {
    groups: Vec<QualityGroup>,
}

impl AcceptList {
    /// Parses a comma separated `token[;param][;q=value]` list.
    pub fn parse(header: &str) -> Self {
        let mut groups: Vec<QualityGroup> = Vec::new();

        for entry in header.split(',') {
            let entry = entry.trim();
            if entry.is_empty() || entry == "0" {
                continue;
            }

            let mut params = entry.split(';');
            let token = params.next().map(str::trim).unwrap_or_default();
            let quality = params
                .filter_map(|param| {
                    let param = param.trim();
                    param.strip_prefix("q=").or_else(|| param.strip_prefix("Q="))
                })
                .last()
                .map_or(DEFAULT_QUALITY, str::trim);

            let weight = quality.parse::<f64>().ok();
            if token.is_empty() || quality.is_empty() || weight.is_some_and(|weight| weight <= 0.0) {
                continue;
            }

            match groups.iter_mut().find(|group| group.quality == quality) {
                Some(group) => group.tokens.push(token.to_owned()),
                None => groups.push(QualityGroup {
                    quality: quality.to_owned(),
                    weight: weight.unwrap_or_default(),
                    tokens: vec![token.to_owned()],
                }),
            }
        }

        groups.sort_by(|a, b| match b.weight.total_cmp(&a.weight) {
            Ordering::Equal => b.quality.cmp(&a.quality),
            ordering => ordering,
        });

        Self { groups }
    }

    /// Parses an `Accept-Language` value, normalizing locale tags to lower case with
    /// `-` separators (`en_US` becomes `en-us`).
    pub fn parse_language(header: &str) -> Self {
        let mut list = Self::parse(header);
        for group in &mut list.groups {
            for token in &mut group.tokens {
                *token = token.replace('_', "-").to_lowercase();
            }
        }
        list
    }

    pub fn groups(&self) -> &[QualityGroup] {
        &self.groups
    }

    /// Tokens registered under the given quality text.
    pub fn get(&self, quality: &str) -> Option<&[String]> {
        self.groups.iter().find(|group| group.quality == quality).map(|group| group.tokens.as_slice())
    }

    /// All tokens flattened in preference order.
    pub fn preferred(&self) -> Vec<&str> {
        self.groups.iter().flat_map(|group| group.tokens.iter().map(String::as_str)).collect()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.groups.iter().any(|group| group.tokens.iter().any(|t| t == token))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
