//! Block list editor state for a single post draft.

use thiserror::Error;

use super::content::{BlockKey, EditingBlock, ImageSource, PendingImage};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditorError {
    #[error("the editor is read-only")]
    ReadOnly,
    #[error("no block with key `{0}`")]
    UnknownBlock(BlockKey),
    #[error("block `{0}` is not a paragraph")]
    NotAParagraph(BlockKey),
    #[error("block `{0}` is not an image")]
    NotAnImage(BlockKey),
}

/// How an image block should be displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImagePreview {
    /// The file only exists in this draft; served from the draft by key.
    Local { key: BlockKey },
    Remote { url: String, alt: String },
    Placeholder,
}

/// Ordered blocks of one draft plus its read-only flag.
#[derive(Debug, Clone, Default)]
pub struct PostEditor {
    blocks: Vec<EditingBlock>,
    read_only: bool,
}

impl PostEditor {
    pub fn new(blocks: Vec<EditingBlock>) -> Self {
        Self {
            blocks,
            read_only: false,
        }
    }

    pub fn read_only(blocks: Vec<EditingBlock>) -> Self {
        Self {
            blocks,
            read_only: true,
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    pub fn blocks(&self) -> &[EditingBlock] {
        &self.blocks
    }

    pub fn into_blocks(self) -> Vec<EditingBlock> {
        self.blocks
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn add_paragraph(&mut self) -> Result<BlockKey, EditorError> {
        self.ensure_writable()?;
        let block = EditingBlock::paragraph(String::new());
        let key = block.key();
        self.blocks.push(block);
        Ok(key)
    }

    /// Append an image block holding a local file. Nothing is uploaded here.
    pub fn add_image(&mut self, image: PendingImage) -> Result<BlockKey, EditorError> {
        self.ensure_writable()?;
        let block = EditingBlock::pending_image(image);
        let key = block.key();
        self.blocks.push(block);
        Ok(key)
    }

    pub fn update_paragraph(&mut self, key: BlockKey, text: &str) -> Result<(), EditorError> {
        self.ensure_writable()?;
        match self.find_mut(key)? {
            EditingBlock::Paragraph { content, .. } => {
                *content = text.to_string();
                Ok(())
            }
            EditingBlock::Image { .. } => Err(EditorError::NotAParagraph(key)),
        }
    }

    /// Swap the file behind an image block, returning the pending file it held, if any.
    pub fn replace_image(
        &mut self,
        key: BlockKey,
        image: PendingImage,
    ) -> Result<Option<PendingImage>, EditorError> {
        self.ensure_writable()?;
        match self.find_mut(key)? {
            EditingBlock::Image { source, .. } => {
                let previous = std::mem::replace(source, ImageSource::Pending(image));
                Ok(match previous {
                    ImageSource::Pending(old) => Some(old),
                    _ => None,
                })
            }
            EditingBlock::Paragraph { .. } => Err(EditorError::NotAnImage(key)),
        }
    }

    /// Remove the block with `key`. The returned block owns any pending file it carried.
    pub fn remove(&mut self, key: BlockKey) -> Result<EditingBlock, EditorError> {
        self.ensure_writable()?;
        let index = self
            .blocks
            .iter()
            .position(|block| block.key() == key)
            .ok_or(EditorError::UnknownBlock(key))?;
        Ok(self.blocks.remove(index))
    }

    pub fn pending_image(&self, key: BlockKey) -> Option<&PendingImage> {
        self.blocks.iter().find_map(|block| match block {
            EditingBlock::Image { key: k, source } if *k == key => source.pending(),
            _ => None,
        })
    }

    /// Number of blocks still holding a local file.
    pub fn pending_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|block| matches!(block, EditingBlock::Image { source: ImageSource::Pending(_), .. }))
            .count()
    }

    fn ensure_writable(&self) -> Result<(), EditorError> {
        if self.read_only {
            Err(EditorError::ReadOnly)
        } else {
            Ok(())
        }
    }

    fn find_mut(&mut self, key: BlockKey) -> Result<&mut EditingBlock, EditorError> {
        self.blocks
            .iter_mut()
            .find(|block| block.key() == key)
            .ok_or(EditorError::UnknownBlock(key))
    }
}

/// Resolve what to show for an image block.
///
/// `image_base` is the API origin used when a persisted image has no resolved url.
pub fn image_preview(key: BlockKey, source: &ImageSource, image_base: &str) -> ImagePreview {
    match source {
        ImageSource::Pending(_) => ImagePreview::Local { key },
        ImageSource::Persisted {
            id,
            url,
            original_name,
        } => {
            let alt = original_name
                .clone()
                .unwrap_or_else(|| format!("Image {id}"));
            match url.as_deref().filter(|url| !url.is_empty()) {
                Some(url) => ImagePreview::Remote {
                    url: url.to_string(),
                    alt,
                },
                None if !id.is_empty() => ImagePreview::Remote {
                    url: format!("{}/images/{id}", image_base.trim_end_matches('/')),
                    alt,
                },
                None => ImagePreview::Placeholder,
            }
        }
        ImageSource::Missing => ImagePreview::Placeholder,
    }
}
