//! Deploy-template rendering.
//!
//! Deploy steps are command templates with `{{placeholder}}` slots
//! (whitespace inside the braces is tolerated). Substituted values are
//! shell-quoted before interpolation so a repository URL or workdir can
//! never change the shape of the command it lands in. Unknown placeholders
//! are left untouched rather than erased.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::quote::sh_quote;

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Safety: this is a compile-time constant pattern — cannot fail.
    #[allow(clippy::expect_used)]
    Regex::new(r"\{\{\s*(\w+)\s*\}\}").expect("valid regex")
});

/// Render one template against `context`, shell-quoting every substituted
/// value.
#[must_use]
pub fn render_template(template: &str, context: &BTreeMap<String, String>) -> String {
    PLACEHOLDER_RE
        .replace_all(template, |caps: &Captures<'_>| match context.get(&caps[1]) {
            Some(value) => sh_quote(value).into_owned(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Render a list of templates in order against the same context.
#[must_use]
pub fn render_all(templates: &[String], context: &BTreeMap<String, String>) -> Vec<String> {
    templates
        .iter()
        .map(|template| render_template(template, context))
        .collect()
}
