//! Rendering a [`ContextSet`] into the textual block handed to the agent.
//!
//! Every marker carries the path or chunk ID plus a `state` attribute, so
//! a visibility toggle in the agent's reply is a pure function of an ID
//! and a boolean. Chunk IDs count across the whole set in file order,
//! matching the dense numbering the chunk model assigns over the same
//! files in the same order.

use crate::chunk::{shorten, split_chunks};
use crate::context::set::ContextSet;

/// Render the current disclosure: full content for visible files, chunk
/// previews for hidden ones.
pub fn render(context: &ContextSet) -> String {
    let mut blocks = Vec::new();
    let mut chunk_id = 0usize;
    for file in context.files() {
        let chunks = split_chunks(&file.content);
        if file.visible && file.hidden_chunks.is_empty() {
            blocks.push(format!(
                "<FILE path=\"{}\" state=\"shown\">\n{}\n</FILE>",
                file.rel, file.content
            ));
            chunk_id += chunks.len();
            continue;
        }
        // At least one chunk is a preview, so itemize every chunk with
        // its own ID and state.
        let file_state = if file.visible { "shown" } else { "hidden" };
        let mut lines = vec![format!(
            "<FILE path=\"{}\" state=\"{file_state}\">",
            file.rel
        )];
        for (local, chunk) in chunks.iter().enumerate() {
            let hidden = !file.visible || file.hidden_chunks.contains(&local);
            if hidden {
                lines.push(format!(
                    "<CHUNK id=\"{chunk_id}\" state=\"hidden\">\n{}\n</CHUNK>",
                    shorten(chunk)
                ));
            } else {
                lines.push(format!(
                    "<CHUNK id=\"{chunk_id}\" state=\"shown\">\n{chunk}\n</CHUNK>"
                ));
            }
            chunk_id += 1;
        }
        lines.push("</FILE>".to_string());
        blocks.push(lines.join("\n"));
    }
    blocks.join("\n\n")
}
