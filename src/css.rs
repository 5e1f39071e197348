use std::collections::HashMap;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::scan::{Quoting, find_matching};

/// How a selector that appears more than once in one stylesheet is folded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[value(rename_all = "kebab-case")]
pub enum DuplicateSelectorPolicy {
    /// Later declarations are appended, as the cascade would apply them.
    #[default]
    Merge,
    /// The later block replaces the earlier one.
    LastWins,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Declaration {
    pub property: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CssRule {
    pub selector: String,
    pub declarations: Vec<Declaration>,
}

impl CssRule {
    /// The effective value of `property`: the last declaration wins.
    pub fn value_of(&self, property: &str) -> Option<&str> {
        self.declarations
            .iter()
            .rev()
            .find(|declaration| declaration.property == property)
            .map(|declaration| declaration.value.as_str())
    }

    /// Distinct properties in order of first appearance.
    pub fn properties(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for declaration in &self.declarations {
            if !seen.contains(&declaration.property.as_str()) {
                seen.push(declaration.property.as_str());
            }
        }
        seen
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CssModel {
    pub rules: Vec<CssRule>,
    /// At-rule and nested blocks kept as whitespace-collapsed text.
    pub unparsed: Vec<String>,
}

impl CssModel {
    pub fn parse(css: &str, policy: DuplicateSelectorPolicy) -> Self {
        let mut model = Self::default();
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut index = 0usize;

        loop {
            index = skip_trivia(css, index);
            if index >= css.len() {
                break;
            }
            let Some(open) = css[index..].find('{').map(|offset| index + offset) else {
                break;
            };
            let Some(close) = find_matching(css, open, b'{', b'}', Quoting::Literal) else {
                model.unparsed.push(collapse_whitespace(&css[index..]));
                break;
            };

            let prelude = &css[index..open];
            let selector = prelude
                .rfind('}')
                .map_or(prelude, |stray| &prelude[stray + 1..])
                .trim();
            let body = &css[open + 1..close];

            if selector.starts_with('@') || body.contains('{') {
                model.unparsed.push(collapse_whitespace(&css[index..=close]));
            } else if !selector.is_empty() {
                model.add_rule(&mut positions, selector, parse_declarations(body), policy);
            }
            index = close + 1;
        }

        model
    }

    pub fn rule(&self, selector: &str) -> Option<&CssRule> {
        self.rules.iter().find(|rule| rule.selector == selector)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty() && self.unparsed.is_empty()
    }

    fn add_rule(
        &mut self,
        positions: &mut HashMap<String, usize>,
        selector: &str,
        declarations: Vec<Declaration>,
        policy: DuplicateSelectorPolicy,
    ) {
        if let Some(&position) = positions.get(selector) {
            let existing = &mut self.rules[position].declarations;
            match policy {
                DuplicateSelectorPolicy::Merge => existing.extend(declarations),
                DuplicateSelectorPolicy::LastWins => *existing = declarations,
            }
            return;
        }

        positions.insert(selector.to_string(), self.rules.len());
        self.rules.push(CssRule {
            selector: selector.to_string(),
            declarations,
        });
    }
}

fn parse_declarations(body: &str) -> Vec<Declaration> {
    strip_comments(body)
        .split(';')
        .filter_map(|entry| {
            let (property, value) = entry.split_once(':')?;
            let property = property.trim();
            if property.is_empty() {
                return None;
            }
            Some(Declaration {
                property: property.to_string(),
                value: value.trim().to_string(),
            })
        })
        .collect()
}

fn skip_trivia(css: &str, mut index: usize) -> usize {
    loop {
        let rest = &css[index..];
        let trimmed = rest.trim_start();
        index += rest.len() - trimmed.len();
        if !trimmed.starts_with("/*") {
            return index;
        }
        match trimmed[2..].find("*/") {
            Some(end) => index += end + 4,
            None => return css.len(),
        }
    }
}

fn strip_comments(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("/*") {
        output.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => return output,
        }
    }
    output.push_str(rest);
    output
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
