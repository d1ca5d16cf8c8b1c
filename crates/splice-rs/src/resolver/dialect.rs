//! Import-marker dialects and task-marker splitting.
//!
//! A dialect is an (open, close) token pair; a line consisting entirely of
//! `open + relative-path + close` is an import marker. Dialects live in an
//! ordered [`DialectSet`] chosen explicitly by the caller — when more than
//! one dialect could match a line, precedence is registration order, never
//! inferred from file extension.

/// End-of-body task markers: everything after the marker on its line, plus
/// all following lines, is the task instruction; everything before is the
/// file body to operate on.
pub const TASK_MARKERS: &[&str] = &["//!", "--!", "##!"];

/// One import-marker syntax: an opening token and a closing token wrapping
/// a relative path on a line of its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerDialect {
    /// Short name used for CLI selection and logging.
    pub tag: String,
    /// Comment-open token.
    pub open: String,
    /// Comment-close token.
    pub close: String,
}

impl MarkerDialect {
    pub fn new(
        tag: impl Into<String>,
        open: impl Into<String>,
        close: impl Into<String>,
    ) -> Self {
        Self {
            tag: tag.into(),
            open: open.into(),
            close: close.into(),
        }
    }

    /// C-style slash markers: `//./path/to/file.ext//`.
    pub fn slash() -> Self {
        Self::new("slash", "//", "//")
    }

    /// Haskell-style brace markers: `{-./path/to/file.ext-}`.
    pub fn brace() -> Self {
        Self::new("brace", "{-", "-}")
    }

    /// Hash markers: `#./path/to/file.ext#`.
    pub fn hash() -> Self {
        Self::new("hash", "#", "#")
    }

    /// If the line is entirely an import marker in this dialect, return the
    /// wrapped reference string.
    ///
    /// The wrapped text must be non-empty and contain no whitespace — a
    /// path, not prose — so ordinary comments never match.
    pub fn match_line<'a>(&self, line: &'a str) -> Option<&'a str> {
        let trimmed = line.trim();
        let inner = trimmed
            .strip_prefix(self.open.as_str())?
            .strip_suffix(self.close.as_str())?;
        if inner.is_empty() || inner.contains(char::is_whitespace) {
            return None;
        }
        Some(inner)
    }
}

/// An ordered list of dialects. First match in registration order wins;
/// exactly one marker is recognized per line.
#[derive(Debug, Clone, Default)]
pub struct DialectSet {
    dialects: Vec<MarkerDialect>,
}

impl DialectSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The three built-in dialects, in slash → brace → hash order.
    pub fn common() -> Self {
        Self::new()
            .with(MarkerDialect::slash())
            .with(MarkerDialect::brace())
            .with(MarkerDialect::hash())
    }

    /// Register a dialect (builder pattern).
    pub fn with(mut self, dialect: MarkerDialect) -> Self {
        self.dialects.push(dialect);
        self
    }

    /// Build a set from CLI tags (`slash`, `brace`, `hash`), preserving the
    /// given order.
    pub fn from_tags(tags: &[String]) -> Result<Self, String> {
        let mut set = Self::new();
        for tag in tags {
            let dialect = match tag.as_str() {
                "slash" => MarkerDialect::slash(),
                "brace" => MarkerDialect::brace(),
                "hash" => MarkerDialect::hash(),
                other => return Err(format!("unknown dialect tag '{other}'")),
            };
            set.dialects.push(dialect);
        }
        Ok(set)
    }

    pub fn dialects(&self) -> &[MarkerDialect] {
        &self.dialects
    }

    /// Match a line against each dialect in registration order.
    pub fn match_line<'a>(&self, line: &'a str) -> Option<&'a str> {
        self.dialects.iter().find_map(|d| d.match_line(line))
    }
}

/// Split file content at the first task marker.
///
/// The marker may appear anywhere in a line; text before it on that line
/// stays in the body. Returns `(body, task)`: the content before the
/// marker, and the instruction text (remainder of the marker line plus all
/// following lines). Without a marker, the whole content is the body and
/// the task is `None`.
pub fn split_task(content: &str) -> (String, Option<String>) {
    let lines: Vec<&str> = content.lines().collect();
    for (idx, line) in lines.iter().enumerate() {
        let hit = TASK_MARKERS
            .iter()
            .filter_map(|m| line.find(m).map(|at| (at, m.len())))
            .min_by_key(|(at, _)| *at);
        let Some((at, marker_len)) = hit else {
            continue;
        };
        let (prefix, rest) = line.split_at(at);
        let (_, rest) = rest.split_at(marker_len);

        let mut body_lines = lines[..idx].to_vec();
        let prefix = prefix.trim_end();
        if !prefix.is_empty() {
            body_lines.push(prefix);
        }
        let body = body_lines.join("\n");

        let mut task_lines = vec![rest.trim()];
        task_lines.extend(lines.iter().skip(idx + 1).copied());
        let task = task_lines.join("\n").trim().to_string();
        return (body, Some(task));
    }
    (content.to_string(), None)
}
