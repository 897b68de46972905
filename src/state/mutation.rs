use crate::models::{Block, Document, RawContent};
use crate::util::make_unique_key;
use strum::IntoStaticStr;
use thiserror::Error;

/// A user-level change to the document, as reported by the render layer.
#[derive(Clone, Debug, PartialEq, IntoStaticStr)]
pub enum Intent {
    CreateBlock { title: String },
    UpdateBlockContent { key: String, content: RawContent },
    UpdateBlockTitle { key: String, title: String },
    DeleteBlock { key: String },
}

impl Intent {
    pub fn kind(&self) -> &'static str {
        self.into()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MutationError {
    #[error("no live block with key {0:?}")]
    UnknownBlock(String),
}

/// Values a new block is stamped with; supplied by the caller so transitions
/// stay pure.
pub struct BlockStamp<'a> {
    pub now_ms: i64,
    pub creator: &'a str,
    pub mint_content_key: fn() -> String,
}

/// Applies `intent` to `doc`, returning the next document.
///
/// `doc` is left untouched; on error the caller keeps using it.
pub fn apply(
    doc: &Document,
    intent: Intent,
    stamp: &BlockStamp<'_>,
) -> Result<Document, MutationError> {
    let mut next = doc.clone();

    match intent {
        Intent::CreateBlock { title } => {
            let key = make_unique_key(&title, &next.block_order);
            let block = Block {
                key: key.clone(),
                title,
                creator: stamp.creator.to_string(),
                created_at: stamp.now_ms,
                content_state: RawContent::empty(stamp.mint_content_key),
            };
            next.blocks.insert(key.clone(), block);
            next.block_order.insert(0, key);
        }
        Intent::UpdateBlockContent { key, content } => {
            live_block(&mut next, &key)?.content_state = content;
        }
        Intent::UpdateBlockTitle { key, title } => {
            live_block(&mut next, &key)?.title = title;
        }
        Intent::DeleteBlock { key } => {
            let Some(pos) = next.block_order.iter().position(|k| k == &key) else {
                return Err(MutationError::UnknownBlock(key));
            };
            next.block_order.remove(pos);
            next.blocks.remove(&key);
        }
    }

    Ok(next)
}

fn live_block<'d>(doc: &'d mut Document, key: &str) -> Result<&'d mut Block, MutationError> {
    if !doc.has_block(key) {
        return Err(MutationError::UnknownBlock(key.to_string()));
    }
    doc.blocks
        .get_mut(key)
        .ok_or_else(|| MutationError::UnknownBlock(key.to_string()))
}

/// Returns a document with a block keyed `day` prepended, or `None` when one
/// already exists.
pub fn ensure_day_block(doc: &Document, day: &str, stamp: &BlockStamp<'_>) -> Option<Document> {
    if doc.has_block(day) {
        return None;
    }
    apply(
        doc,
        Intent::CreateBlock {
            title: day.to_string(),
        },
        stamp,
    )
    .ok()
}
