//! Command allow-list validation.
//!
//! A raw command string becomes a [`CommandPlan`] only after every check
//! passes: no `;`/`|`/backtick anywhere, no lone `&`, POSIX tokenization
//! succeeds, `&&` chaining is well-formed, and the leading executable of
//! *every* segment is allow-listed — chaining must not smuggle a
//! disallowed binary past the first check.
//!
//! Metacharacter rejection happens on the raw string, before tokenization:
//! word splitting alone cannot guarantee those characters are not
//! reinterpreted by the remote shell, so they are refused outright instead
//! of relying on the caller's quoting discipline.

use std::collections::BTreeSet;

use crate::error::ValidateError;

/// Executables permitted by default; overridable at startup, swappable in
/// tests.
pub const DEFAULT_ALLOWED_EXECUTABLES: &[&str] = &[
    "systemctl", "service", "journalctl", "ls", "cat", "tail", "head", "df", "du", "ps", "kill",
    "docker", "git", "curl", "wget", "python3", "pip", "bash", "sh", "apt", "apt-get",
];

/// Characters refused anywhere in a raw command string.
const FORBIDDEN_CHARS: &[char] = &[';', '|', '`'];

// ── Allow-list ───────────────────────────────────────────────────────────────

/// Process-wide, read-only set of permitted executable basenames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowList {
    names: BTreeSet<String>,
}

impl Default for AllowList {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_EXECUTABLES.iter().copied())
    }
}

impl AllowList {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn contains(&self, executable: &str) -> bool {
        self.names.contains(executable)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Sorted, comma-separated rendering for diagnostics.
    #[must_use]
    pub fn display(&self) -> String {
        self.names
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

// ── Command plan ─────────────────────────────────────────────────────────────

/// A validated command: the trimmed original string plus its `&&`-delimited
/// segments as token lists. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPlan {
    rendered: String,
    segments: Vec<Vec<String>>,
}

impl CommandPlan {
    /// The validated command re-joined for transport (trimmed original).
    #[must_use]
    pub fn rendered(&self) -> &str {
        &self.rendered
    }

    #[must_use]
    pub fn segments(&self) -> &[Vec<String>] {
        &self.segments
    }
}

/// Join independently validated plans into one `&&` chain for combined
/// execution (e.g. a `commands` list handed to a single `pct exec`).
#[must_use]
pub fn join_rendered(plans: &[CommandPlan]) -> String {
    plans
        .iter()
        .map(CommandPlan::rendered)
        .collect::<Vec<_>>()
        .join(" && ")
}

// ── Validation ───────────────────────────────────────────────────────────────

/// Validate a single raw command string against `allow`.
///
/// Checks run in a fixed order and short-circuit on the first violation:
/// emptiness, forbidden metacharacters, lone `&`, tokenization, `&&`
/// chaining shape, per-segment allow-list membership.
///
/// # Errors
///
/// Returns the first violated rule as a [`ValidateError`]; an invalid
/// command is invalid forever for that input.
pub fn validate(raw: &str, allow: &AllowList) -> Result<CommandPlan, ValidateError> {
    let command = raw.trim();
    if command.is_empty() {
        return Err(ValidateError::EmptyCommand);
    }

    for &ch in FORBIDDEN_CHARS {
        if command.contains(ch) {
            return Err(ValidateError::ForbiddenMetacharacter(ch));
        }
    }
    if has_lone_ampersand(command) {
        return Err(ValidateError::ForbiddenMetacharacter('&'));
    }

    let tokens =
        shell_words::split(command).map_err(|e| ValidateError::InvalidSyntax(e.to_string()))?;
    if tokens.is_empty() {
        return Err(ValidateError::EmptyCommand);
    }

    let segments = split_segments(tokens)?;

    for segment in &segments {
        let executable = basename(&segment[0]);
        if !allow.contains(executable) {
            return Err(ValidateError::ExecutableNotAllowed {
                executable: executable.to_string(),
                allowed: allow.display(),
            });
        }
    }

    Ok(CommandPlan {
        rendered: command.to_string(),
        segments,
    })
}

/// Validate each command in a list independently.
///
/// # Errors
///
/// Fails with `EmptyCommandList` on an empty list, otherwise with the
/// first command's first violated rule.
pub fn validate_all(raw: &[String], allow: &AllowList) -> Result<Vec<CommandPlan>, ValidateError> {
    if raw.is_empty() {
        return Err(ValidateError::EmptyCommandList);
    }
    raw.iter().map(|command| validate(command, allow)).collect()
}

/// A `&` that is neither preceded nor followed by another `&` — the
/// backgrounding operator, which is disallowed.
fn has_lone_ampersand(command: &str) -> bool {
    let bytes = command.as_bytes();
    bytes.iter().enumerate().any(|(i, &b)| {
        b == b'&'
            && !(i > 0 && bytes[i - 1] == b'&')
            && bytes.get(i + 1).copied() != Some(b'&')
    })
}

/// Split tokens into segments on the literal token `&&`. The operator must
/// be its own whitespace-delimited token with non-empty segments on both
/// sides.
fn split_segments(tokens: Vec<String>) -> Result<Vec<Vec<String>>, ValidateError> {
    let mut segments = Vec::new();
    let mut current = Vec::new();
    for token in tokens {
        if token != "&&" && token.contains("&&") {
            return Err(ValidateError::ChainingSyntax { token });
        }
        if token == "&&" {
            if current.is_empty() {
                return Err(ValidateError::EmptySegment);
            }
            segments.push(std::mem::take(&mut current));
            continue;
        }
        current.push(token);
    }
    if current.is_empty() {
        return Err(ValidateError::TrailingChain);
    }
    segments.push(current);
    Ok(segments)
}

/// Basename of an executable token: allow-listing is on names, not paths.
fn basename(token: &str) -> &str {
    token.rsplit('/').next().unwrap_or(token)
}

/// Validate environment variable names destined for `KEY=value` exports on
/// a remote command line. Only the values get shell-quoted there, so the
/// names themselves must be plain POSIX identifiers — anything else could
/// smuggle shell syntax around the command checks above.
///
/// # Errors
///
/// Returns `InvalidEnvKey` for the first name that is not
/// `[A-Za-z_][A-Za-z0-9_]*`.
pub fn validate_env_keys<'a, I>(keys: I) -> Result<(), ValidateError>
where
    I: IntoIterator<Item = &'a str>,
{
    for key in keys {
        if !is_posix_identifier(key) {
            return Err(ValidateError::InvalidEnvKey {
                key: key.to_string(),
            });
        }
    }
    Ok(())
}

fn is_posix_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
        }
        _ => false,
    }
}
