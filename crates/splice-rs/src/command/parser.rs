//! Tolerant tag parser for agent responses.

use tracing::warn;

/// One ordered search/replace operation inside a `PATCH` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchReplace {
    pub search: String,
    pub replace: String,
}

/// A parsed edit command, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditCommand {
    /// Reveal a file or chunk by its rendered path or ID.
    Show { target: String },
    /// Hide a file or chunk by its rendered path or ID.
    Hide { target: String },
    /// Whole-file create or overwrite.
    Write { path: String, content: String },
    /// Ordered search/replace operations against one file.
    Patch {
        path: String,
        ops: Vec<SearchReplace>,
    },
    /// Delete a file or directory.
    Remove { path: String },
    /// Compaction-stage exclusion of a file from the context.
    Omit { path: String },
}

/// Commands recovered from a response, plus everything skipped along the
/// way. Warnings are diagnostics, never fatal.
#[derive(Debug, Default)]
pub struct ParseOutcome {
    pub commands: Vec<EditCommand>,
    pub warnings: Vec<String>,
}

const SEARCH_OPEN: &str = "<<<<<<< SEARCH";
const DIVIDER: &str = "=======";
const REPLACE_CLOSE: &str = ">>>>>>> REPLACE";

/// Scan a raw agent response for edit commands.
///
/// Unknown tags are skipped with a warning. A known tag missing its
/// required attribute skips that one command. Attribute-only commands
/// accept both self-closing (`<SHOW .../>`) and paired (`<SHOW ...></SHOW>`)
/// forms; stray closing tags are treated as prose.
pub fn parse_commands(input: &str) -> ParseOutcome {
    let mut outcome = ParseOutcome::default();
    let mut rest = input;

    while let Some(idx) = rest.find('<') {
        let (_, at) = rest.split_at(idx);
        let Some((tag, after)) = parse_tag(at) else {
            // Not an open tag (prose, a closing tag, a stray '<'); step
            // over the '<' and keep scanning.
            let (_, next) = at.split_at(1);
            rest = next;
            continue;
        };
        rest = after;

        if tag.name.eq_ignore_ascii_case("WRITE") {
            let Some(path) = tag.target() else {
                outcome.skip("WRITE tag without a path attribute");
                continue;
            };
            match take_body(rest, tag.name) {
                Some((body, next)) => {
                    outcome.commands.push(EditCommand::Write {
                        path: path.to_string(),
                        content: body.to_string(),
                    });
                    rest = next;
                }
                None => outcome.skip(&format!("unterminated WRITE block for '{path}'")),
            }
        } else if tag.name.eq_ignore_ascii_case("PATCH") || tag.name.eq_ignore_ascii_case("RUN") {
            let Some(path) = tag.target() else {
                outcome.skip(&format!("{} tag without a path attribute", tag.name));
                continue;
            };
            match take_body(rest, tag.name) {
                Some((body, next)) => {
                    let ops = parse_patch_body(body, path, &mut outcome.warnings);
                    if ops.is_empty() {
                        outcome.skip(&format!("PATCH for '{path}' has no search/replace blocks"));
                    } else {
                        outcome.commands.push(EditCommand::Patch {
                            path: path.to_string(),
                            ops,
                        });
                    }
                    rest = next;
                }
                None => outcome.skip(&format!("unterminated {} block for '{path}'", tag.name)),
            }
        } else if let Some(build) = attribute_command(&tag.name) {
            match tag.target() {
                Some(target) => outcome.commands.push(build(target.to_string())),
                None => outcome.skip(&format!("{} tag without a path attribute", tag.name)),
            }
        } else {
            outcome.skip(&format!("unknown tag '{}'", tag.name));
        }
    }
    outcome
}

fn attribute_command(name: &str) -> Option<fn(String) -> EditCommand> {
    if name.eq_ignore_ascii_case("SHOW") {
        Some(|target| EditCommand::Show { target })
    } else if name.eq_ignore_ascii_case("HIDE") {
        Some(|target| EditCommand::Hide { target })
    } else if name.eq_ignore_ascii_case("REMOVE") {
        Some(|path| EditCommand::Remove { path })
    } else if name.eq_ignore_ascii_case("OMIT") {
        Some(|path| EditCommand::Omit { path })
    } else {
        None
    }
}

impl ParseOutcome {
    fn skip(&mut self, reason: &str) {
        warn!("skipping command: {reason}");
        self.warnings.push(reason.to_string());
    }
}

// ── Tag lexing ─────────────────────────────────────────────────────

struct Tag<'a> {
    name: &'a str,
    attrs: Vec<(&'a str, &'a str)>,
}

impl Tag<'_> {
    /// The command's target, under either accepted attribute name.
    fn target(&self) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| *k == "path" || *k == "file")
            .map(|(_, v)| *v)
    }
}

/// Parse an open tag at the start of `input` (which begins with `<`).
/// Returns the tag and the remainder after its `>`, or `None` if the text
/// is not a well-formed open tag.
fn parse_tag(input: &str) -> Option<(Tag<'_>, &str)> {
    let rest = input.strip_prefix('<')?;
    let name_len = rest
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(rest.len());
    if name_len == 0 {
        return None;
    }
    let (name, mut rest) = rest.split_at(name_len);

    let mut attrs = Vec::new();
    loop {
        rest = rest.trim_start();
        if let Some(after) = rest.strip_prefix("/>").or_else(|| rest.strip_prefix('>')) {
            return Some((Tag { name, attrs }, after));
        }
        let (key, value, after) = parse_attr(rest)?;
        attrs.push((key, value));
        rest = after;
    }
}

fn parse_attr(input: &str) -> Option<(&str, &str, &str)> {
    let key_len = input
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(input.len());
    if key_len == 0 {
        return None;
    }
    let (key, rest) = input.split_at(key_len);
    let rest = rest.trim_start().strip_prefix('=')?;
    let rest = rest.trim_start().strip_prefix('"')?;
    let end = rest.find('"')?;
    let (value, rest) = rest.split_at(end);
    let (_, rest) = rest.split_at(1);
    Some((key, value, rest))
}

/// Take the body up to the matching close tag, matched case-insensitively
/// like open tags are. The body has one leading and one trailing newline
/// stripped so tag placement on its own line does not leak into file
/// content.
fn take_body<'a>(input: &'a str, name: &str) -> Option<(&'a str, &'a str)> {
    let mut offset = 0;
    let mut search = input;
    loop {
        let at = search.find("</")?;
        let (_, candidate) = search.split_at(at + 2);
        let bytes = candidate.as_bytes();
        if bytes.len() > name.len()
            && bytes[..name.len()].eq_ignore_ascii_case(name.as_bytes())
            && bytes[name.len()] == b'>'
        {
            let (body, rest) = input.split_at(offset + at);
            let (_, rest) = rest.split_at(2 + name.len() + 1);
            let body = body.strip_prefix('\n').unwrap_or(body);
            let body = body.strip_suffix('\n').unwrap_or(body);
            return Some((body, rest));
        }
        offset += at + 2;
        search = candidate;
    }
}

// ── Patch bodies ───────────────────────────────────────────────────

/// Line state machine over a `PATCH` body. Malformed blocks are dropped
/// with a warning; well-formed blocks before and after survive.
fn parse_patch_body(body: &str, path: &str, warnings: &mut Vec<String>) -> Vec<SearchReplace> {
    enum State {
        Scanning,
        Search(Vec<String>),
        Replace(Vec<String>, Vec<String>),
    }

    let mut ops = Vec::new();
    let mut state = State::Scanning;
    for line in body.lines() {
        let marker = line.trim_end();
        state = match state {
            State::Scanning => {
                if marker == SEARCH_OPEN {
                    State::Search(Vec::new())
                } else {
                    State::Scanning
                }
            }
            State::Search(search) => {
                if marker == DIVIDER {
                    State::Replace(search, Vec::new())
                } else {
                    let mut search = search;
                    search.push(line.to_string());
                    State::Search(search)
                }
            }
            State::Replace(search, replace) => {
                if marker == REPLACE_CLOSE {
                    ops.push(SearchReplace {
                        search: search.join("\n"),
                        replace: replace.join("\n"),
                    });
                    State::Scanning
                } else {
                    let mut replace = replace;
                    replace.push(line.to_string());
                    State::Replace(search, replace)
                }
            }
        };
    }
    if !matches!(state, State::Scanning) {
        let reason = format!("unterminated search/replace block in PATCH for '{path}'");
        warn!("{reason}");
        warnings.push(reason);
    }
    ops
}
