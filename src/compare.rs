use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::css::{CssModel, Declaration, collapse_whitespace};

pub const MISSING_VALUE: &str = "(missing)";

/// How an actual declaration value relates to the expected one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Equivalence {
    Exact,
    /// Equal after trimming, collapsing whitespace and ASCII case folding.
    Normalized,
    /// The actual value defers to a custom property; accepted regardless of
    /// the expected literal.
    DynamicReference,
    Mismatch,
}

impl Equivalence {
    pub fn is_match(self) -> bool {
        !matches!(self, Self::Mismatch)
    }
}

fn dynamic_reference() -> &'static Regex {
    static REFERENCE: OnceLock<Regex> = OnceLock::new();
    REFERENCE.get_or_init(|| {
        Regex::new(r"^(?:var\(--[A-Za-z0-9_-]+\)|calc\(var\(--[A-Za-z0-9_-]+\).*\))$")
            .expect("dynamic reference regex should compile")
    })
}

pub fn equivalence(expected: &str, actual: &str) -> Equivalence {
    if expected == actual {
        return Equivalence::Exact;
    }
    if collapse_whitespace(expected).eq_ignore_ascii_case(&collapse_whitespace(actual)) {
        return Equivalence::Normalized;
    }
    if dynamic_reference().is_match(actual.trim()) {
        return Equivalence::DynamicReference;
    }
    Equivalence::Mismatch
}

pub fn values_match(expected: &str, actual: &str) -> bool {
    equivalence(expected, actual).is_match()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueDifference {
    pub expected: String,
    pub actual: String,
    /// Accepted through the dynamic-reference rule; does not fail the case.
    pub tolerated: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ComparisonResult {
    pub passed: bool,
    pub missing_selectors: BTreeMap<String, Vec<Declaration>>,
    pub extra_selectors: BTreeMap<String, Vec<Declaration>>,
    pub value_differences: BTreeMap<String, BTreeMap<String, ValueDifference>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unparsed_expected: Vec<String>,
}

impl ComparisonResult {
    pub fn failing_differences(&self) -> impl Iterator<Item = (&str, &str, &ValueDifference)> {
        self.value_differences
            .iter()
            .flat_map(|(selector, properties)| {
                properties
                    .iter()
                    .map(move |(property, difference)| {
                        (selector.as_str(), property.as_str(), difference)
                    })
            })
            .filter(|(_, _, difference)| !difference.tolerated)
    }
}

pub fn compare_models(expected: &CssModel, actual: &CssModel) -> ComparisonResult {
    let mut result = ComparisonResult {
        unparsed_expected: expected.unparsed.clone(),
        ..ComparisonResult::default()
    };

    for expected_rule in &expected.rules {
        let Some(actual_rule) = actual.rule(&expected_rule.selector) else {
            result.missing_selectors.insert(
                expected_rule.selector.clone(),
                expected_rule.declarations.clone(),
            );
            continue;
        };

        for property in expected_rule.properties() {
            let Some(expected_value) = expected_rule.value_of(property) else {
                continue;
            };
            let difference = match actual_rule.value_of(property) {
                None => Some(ValueDifference {
                    expected: expected_value.to_string(),
                    actual: MISSING_VALUE.to_string(),
                    tolerated: false,
                }),
                Some(actual_value) => match equivalence(expected_value, actual_value) {
                    Equivalence::Exact | Equivalence::Normalized => None,
                    verdict => Some(ValueDifference {
                        expected: expected_value.to_string(),
                        actual: actual_value.to_string(),
                        tolerated: verdict == Equivalence::DynamicReference,
                    }),
                },
            };

            if let Some(difference) = difference {
                result
                    .value_differences
                    .entry(expected_rule.selector.clone())
                    .or_default()
                    .insert(property.to_string(), difference);
            }
        }
    }

    for actual_rule in &actual.rules {
        if expected.rule(&actual_rule.selector).is_none() {
            result
                .extra_selectors
                .insert(actual_rule.selector.clone(), actual_rule.declarations.clone());
        }
    }

    let passed =
        result.missing_selectors.is_empty() && result.failing_differences().next().is_none();
    result.passed = passed;
    result
}
