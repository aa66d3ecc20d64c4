//! Message-processor pipeline.
//!
//! Applies an ordered sequence of prepend/append directives to outgoing
//! prompt text, conditional on whether the prompt is the first one sent in
//! the session. Pure — no side effects, no I/O — built by straight
//! concatenation of named pieces.

use serde::{Deserialize, Serialize};

/// When a directive applies, relative to turn position in the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum When {
    First,
    All,
    AllExceptFirst,
    /// Any value the schema doesn't recognize. Never matches — an unknown
    /// `when` is a no-op, not a deserialization failure.
    #[serde(other)]
    Unknown,
}

/// Where a directive's text is spliced relative to the current text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Position {
    Prepend,
    Append,
    /// Unknown position values are a no-op (see [`When::Unknown`]).
    #[serde(other)]
    Unknown,
}

/// A single processor rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Directive {
    pub when: When,
    pub position: Position,
    pub text: String,
}

impl Directive {
    pub fn new(when: When, position: Position, text: impl Into<String>) -> Self {
        Self {
            when,
            position,
            text: text.into(),
        }
    }

    fn applies(&self, is_first: bool) -> bool {
        match self.when {
            When::First => is_first,
            When::All => true,
            When::AllExceptFirst => !is_first,
            When::Unknown => false,
        }
    }
}

/// An ordered, named list of directives — one config layer (global or
/// per-workspace).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// If `true`, this config's directives replace the merged result
    /// entirely rather than being appended to the global list.
    #[serde(default)]
    pub r#override: bool,
    #[serde(default)]
    pub directives: Vec<Directive>,
}

/// Apply `directives`, in declaration order, to `text`. `prepend` concatenates
/// `directive.text + current`; `append` concatenates `current + directive.text`.
/// Directives whose `when` does not match `is_first` are no-ops.
pub fn apply(directives: &[Directive], text: &str, is_first: bool) -> String {
    let mut out = text.to_string();
    for directive in directives {
        if !directive.applies(is_first) {
            continue;
        }
        match directive.position {
            Position::Prepend => out = format!("{}{}", directive.text, out),
            Position::Append => out = format!("{}{}", out, directive.text),
            Position::Unknown => {}
        }
    }
    out
}

/// Merge a global and a workspace-level config: if the workspace config
/// sets `override = true`, only its directives apply;
/// otherwise the two lists are concatenated, global first. Either config may
/// be absent, contributing nothing.
pub fn merge_configs(
    global: Option<&ProcessorConfig>,
    workspace: Option<&ProcessorConfig>,
) -> Vec<Directive> {
    match (global, workspace) {
        (_, Some(ws)) if ws.r#override => ws.directives.clone(),
        (Some(g), Some(ws)) => g
            .directives
            .iter()
            .chain(ws.directives.iter())
            .cloned()
            .collect(),
        (Some(g), None) => g.directives.clone(),
        (None, Some(ws)) => ws.directives.clone(),
        (None, None) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepend_first_only_applies_on_first() {
        let directives = vec![Directive::new(When::First, Position::Prepend, "P:")];
        assert_eq!(apply(&directives, "hi", true), "P:hi");
        assert_eq!(apply(&directives, "hi", false), "hi");
    }

    #[test]
    fn ordered_mixed_directives() {
        let directives = vec![
            Directive::new(When::First, Position::Prepend, "F:"),
            Directive::new(When::All, Position::Append, ":A"),
            Directive::new(When::AllExceptFirst, Position::Prepend, "L:"),
        ];
        assert_eq!(apply(&directives, "x", true), "F:x:A");
        assert_eq!(apply(&directives, "y", false), "L:y:A");
    }

    #[test]
    fn empty_directives_are_identity() {
        assert_eq!(apply(&[], "unchanged", true), "unchanged");
        assert_eq!(apply(&[], "unchanged", false), "unchanged");
    }

    #[test]
    fn merge_concatenates_global_then_workspace_by_default() {
        let global = ProcessorConfig {
            r#override: false,
            directives: vec![Directive::new(When::All, Position::Append, "-g")],
        };
        let workspace = ProcessorConfig {
            r#override: false,
            directives: vec![Directive::new(When::All, Position::Append, "-w")],
        };
        let merged = merge_configs(Some(&global), Some(&workspace));
        assert_eq!(apply(&merged, "x", true), "x-g-w");
    }

    #[test]
    fn workspace_override_discards_global() {
        let global = ProcessorConfig {
            r#override: false,
            directives: vec![Directive::new(When::All, Position::Append, "-g")],
        };
        let workspace = ProcessorConfig {
            r#override: true,
            directives: vec![Directive::new(When::All, Position::Append, "-w")],
        };
        let merged = merge_configs(Some(&global), Some(&workspace));
        assert_eq!(apply(&merged, "x", true), "x-w");
    }

    #[test]
    fn both_configs_absent_yields_no_directives() {
        let merged = merge_configs(None, None);
        assert!(merged.is_empty());
        assert_eq!(apply(&merged, "unchanged", true), "unchanged");
    }

    #[test]
    fn unknown_when_or_position_is_a_no_op() {
        let unknown_when: Directive = serde_json::from_str(
            r#"{"when":"someday","position":"append","text":"x"}"#,
        )
        .unwrap();
        assert_eq!(apply(&[unknown_when], "base", true), "base");

        let unknown_position: Directive = serde_json::from_str(
            r#"{"when":"all","position":"sideways","text":"x"}"#,
        )
        .unwrap();
        assert_eq!(apply(&[unknown_position], "base", true), "base");
    }

    #[test]
    fn unknown_serde_variant_round_trip_is_kebab_case() {
        let d = Directive::new(When::AllExceptFirst, Position::Prepend, "x");
        let json = serde_json::to_string(&d).unwrap();
        assert!(json.contains("\"all-except-first\""));
        assert!(json.contains("\"prepend\""));
    }
}
