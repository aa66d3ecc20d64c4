//! Attachment assembler.
//!
//! Converts host-side file references and inline images into ACP content
//! blocks, prepended to the outgoing prompt: images first, then other
//! attachments, then the message text.

use agent_client_protocol::{ContentBlock, ImageContent, ResourceLink, TextContent};
use std::path::PathBuf;

/// A host-side attachment, prior to being turned into an ACP content block.
#[derive(Debug, Clone)]
pub enum Attachment {
    /// Inline image; `data` is base64-encoded.
    Image { data: String, mime_type: String },
    /// A text file read in full; `content` is the raw text.
    TextFile { name: String, content: String },
    /// A binary file referenced by absolute path, not inlined.
    BinaryFile { name: String, file_path: PathBuf },
}

/// Turn one [`Attachment`] into an ACP [`ContentBlock`].
fn to_block(attachment: &Attachment) -> ContentBlock {
    match attachment {
        Attachment::Image { data, mime_type } => {
            ContentBlock::Image(ImageContent::new(data.clone(), mime_type.clone()))
        }
        Attachment::TextFile { name, content } => ContentBlock::Text(TextContent::new(format!(
            "=== File: {name} ===\n{content}\n=== End of {name} ==="
        ))),
        Attachment::BinaryFile { name, file_path } => {
            let uri = format!("file://{}", file_path.display());
            ContentBlock::ResourceLink(ResourceLink::new(name.clone(), uri))
        }
    }
}

/// Build the content-block sequence for an outgoing prompt: every
/// attachment's block (images first, in their given order, then other kinds
/// in their given order), followed by the user's text message if non-empty.
///
/// Images are always placed before text so the agent reads context before
/// the question; caller-given attachment order is preserved within that
/// image-first partition.
pub fn assemble(message: &str, attachments: &[Attachment]) -> Vec<ContentBlock> {
    let (images, rest): (Vec<&Attachment>, Vec<&Attachment>) = attachments
        .iter()
        .partition(|a| matches!(a, Attachment::Image { .. }));

    let mut blocks: Vec<ContentBlock> = images.into_iter().map(to_block).collect();
    blocks.extend(rest.into_iter().map(to_block));

    if !message.is_empty() {
        blocks.push(ContentBlock::Text(TextContent::new(message.to_string())));
    }

    blocks
}
