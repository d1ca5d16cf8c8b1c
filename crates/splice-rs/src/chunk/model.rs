//! Blank-line chunk segmentation and hidden-chunk previews.

/// A single addressable chunk of a file.
///
/// `id` is dense, 0-based, and contiguous across the whole chunk set in
/// document order. It is reassigned on every mutation — see the module
/// docs on the ephemeral-ID contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Position in the current chunk list (dense, 0-based).
    pub id: usize,
    /// Index of the owning file in the chunk set's file list.
    pub file: usize,
    /// Non-empty run of non-blank lines, without surrounding blank lines.
    pub text: String,
    /// Whether the chunk's full text is disclosed to the agent.
    pub visible: bool,
}

/// Split file text into chunk texts on blank-line boundaries.
///
/// One or more consecutive blank lines (whitespace-only counts as blank)
/// form a single boundary. Each chunk is a run of non-blank lines; empty
/// chunks are dropped, so leading and trailing blank lines disappear.
pub fn split_chunks(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                chunks.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        chunks.push(current.join("\n"));
    }
    chunks
}

/// Rejoin chunk texts with single blank lines.
///
/// Inverse of [`split_chunks`] modulo outer blank-line trimming and the
/// collapse of multi-blank-line boundaries to one.
pub fn join_chunks<S: AsRef<str>>(chunks: &[S]) -> String {
    chunks
        .iter()
        .map(|c| c.as_ref())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Produce a one-or-two-line preview of a chunk for hidden rendering.
///
/// The preview is the chunk's first comment-like line (if any) plus its
/// first non-comment-like line, letting the agent see *that* a region
/// exists and roughly what it is without spending budget on its full text.
pub fn shorten(text: &str) -> String {
    let comment = text.lines().find(|l| is_comment_like(l));
    let code = text.lines().find(|l| !is_comment_like(l));

    match (comment, code) {
        (Some(c), Some(n)) => format!("{}\n{}", c.trim_end(), n.trim_end()),
        (Some(c), None) => c.trim_end().to_string(),
        (None, Some(n)) => n.trim_end().to_string(),
        (None, None) => String::new(),
    }
}

/// Whether a line looks like a comment in any of the marker dialects the
/// engine understands (line comments, block-comment edges, doc markers).
fn is_comment_like(line: &str) -> bool {
    let trimmed = line.trim_start();
    ["//", "#", "--", "{-", "/*", "*", ";"]
        .iter()
        .any(|prefix| trimmed.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_on_single_blank_lines() {
        let text = "fn a() {}\n\nfn b() {}\n\nfn c() {}";
        let chunks = split_chunks(text);
        assert_eq!(chunks, vec!["fn a() {}", "fn b() {}", "fn c() {}"]);
    }

    #[test]
    fn multiple_blank_lines_are_one_boundary() {
        let text = "a\n\n\n\nb";
        assert_eq!(split_chunks(text), vec!["a", "b"]);
    }

    #[test]
    fn whitespace_only_lines_are_blank() {
        let text = "a\n   \t \nb";
        assert_eq!(split_chunks(text), vec!["a", "b"]);
    }

    #[test]
    fn outer_blank_lines_are_dropped() {
        let text = "\n\nfirst\n\nsecond\n\n";
        assert_eq!(split_chunks(text), vec!["first", "second"]);
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(split_chunks("").is_empty());
        assert!(split_chunks("\n\n\n").is_empty());
    }

    #[test]
    fn multi_line_chunks_keep_internal_lines() {
        let text = "fn a() {\n    body\n}\n\nfn b() {}";
        let chunks = split_chunks(text);
        assert_eq!(chunks[0], "fn a() {\n    body\n}");
        assert_eq!(chunks[1], "fn b() {}");
    }

    // ── Round-trip property ────────────────────────────────────

    #[test]
    fn split_then_join_round_trips_single_blank_separators() {
        for text in [
            "a\n\nb\n\nc",
            "fn main() {\n    run();\n}\n\n// helper\nfn run() {}",
            "only one chunk",
        ] {
            let rejoined = join_chunks(&split_chunks(text));
            assert_eq!(rejoined, text);
        }
    }

    #[test]
    fn round_trip_trims_outer_blank_lines() {
        let text = "\n\na\n\nb\n";
        assert_eq!(join_chunks(&split_chunks(text)), "a\n\nb");
    }

    // ── shorten ────────────────────────────────────────────────

    #[test]
    fn shorten_combines_comment_and_code_line() {
        let chunk = "// adds two numbers\nfn add(a: i32, b: i32) -> i32 {\n    a + b\n}";
        assert_eq!(shorten(chunk), "// adds two numbers\nfn add(a: i32, b: i32) -> i32 {");
    }

    #[test]
    fn shorten_code_only_chunk_takes_first_line() {
        let chunk = "fn add() {\n    body\n}";
        assert_eq!(shorten(chunk), "fn add() {");
    }

    #[test]
    fn shorten_comment_only_chunk_takes_first_comment() {
        let chunk = "-- section header\n-- continues";
        assert_eq!(shorten(chunk), "-- section header");
    }

    #[test]
    fn shorten_picks_comment_even_after_code() {
        let chunk = "let x = 1;\n# explains x";
        assert_eq!(shorten(chunk), "# explains x\nlet x = 1;");
    }
}
