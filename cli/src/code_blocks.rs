//! Fenced code block extraction from agent replies.
//!
//! The CLI does no markdown rendering; blocks are extracted only to drive
//! the execution bridge (`/run N` in the REPL).

/// One fenced code block from a reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeBlock {
    /// Lowercased language tag; empty for an untagged fence.
    pub language: String,
    pub code: String,
}

/// Extracts ``` fenced blocks in order of appearance. An unclosed fence is
/// ignored.
pub fn extract_code_blocks(text: &str) -> Vec<CodeBlock> {
    let mut blocks = Vec::new();
    let mut lines = text.lines();
    while let Some(line) = lines.next() {
        let trimmed = line.trim_start();
        let Some(tag) = trimmed.strip_prefix("```") else {
            continue;
        };
        let language = tag.trim().to_ascii_lowercase();
        let mut code = String::new();
        let mut closed = false;
        for inner in lines.by_ref() {
            if inner.trim_start().starts_with("```") {
                closed = true;
                break;
            }
            code.push_str(inner);
            code.push('\n');
        }
        if closed {
            blocks.push(CodeBlock { language, code });
        }
    }
    blocks
}
