use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One note in the scratchpad.
///
/// `key` is assigned once by the allocator and never changes; `title` is the
/// editable label shown in the block header.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub key: String,
    pub title: String,
    pub creator: String,
    pub created_at: i64,
    pub content_state: RawContent,
}

/// The whole persisted state: every block plus display order (newest first).
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub blocks: BTreeMap<String, Block>,
    pub block_order: Vec<String>,
}

impl Document {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn has_block(&self, key: &str) -> bool {
        self.block_order.iter().any(|k| k == key)
    }

    pub fn block_at(&self, idx: usize) -> Option<&Block> {
        self.block_order.get(idx).and_then(|k| self.blocks.get(k))
    }

    /// Checks that `block_order` is a duplicate-free permutation of the keys
    /// of `blocks` and that every block sits under its own key.
    ///
    /// Returns a description of the first violation found.
    pub fn check_consistency(&self) -> Result<(), String> {
        if self.block_order.len() != self.blocks.len() {
            return Err(format!(
                "blockOrder has {} entries but there are {} blocks",
                self.block_order.len(),
                self.blocks.len()
            ));
        }

        let mut seen = std::collections::BTreeSet::new();
        for key in &self.block_order {
            if !seen.insert(key.as_str()) {
                return Err(format!("duplicate key in blockOrder: {key:?}"));
            }
            if !self.blocks.contains_key(key) {
                return Err(format!("blockOrder references missing block {key:?}"));
            }
        }

        for (key, block) in &self.blocks {
            if &block.key != key {
                return Err(format!(
                    "block stored under {key:?} carries key {:?}",
                    block.key
                ));
            }
        }

        Ok(())
    }
}

/// Serializable rich-text content.
///
/// Mirrors the raw form used by browser rich-text editors: an ordered list of
/// text blocks, each carrying its own style and entity ranges, plus a shared
/// entity map. Unknown structure inside `data`/`entity_map` is carried as
/// opaque JSON.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawContent {
    pub blocks: Vec<RawBlock>,
    #[serde(default)]
    pub entity_map: BTreeMap<String, serde_json::Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawBlock {
    pub key: String,
    pub text: String,
    #[serde(rename = "type", default = "unstyled")]
    pub kind: String,
    #[serde(default)]
    pub depth: u32,
    #[serde(default)]
    pub inline_style_ranges: Vec<InlineStyleRange>,
    #[serde(default)]
    pub entity_ranges: Vec<EntityRange>,
    #[serde(default)]
    pub data: serde_json::Map<String, serde_json::Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct InlineStyleRange {
    pub offset: u32,
    pub length: u32,
    pub style: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct EntityRange {
    pub offset: u32,
    pub length: u32,
    pub key: u32,
}

fn unstyled() -> String {
    "unstyled".to_string()
}

impl RawBlock {
    fn plain(key: String, text: &str) -> Self {
        Self {
            key,
            text: text.to_string(),
            kind: unstyled(),
            depth: 0,
            inline_style_ranges: vec![],
            entity_ranges: vec![],
            data: serde_json::Map::new(),
        }
    }
}

impl RawContent {
    /// Content with a single empty paragraph, as a fresh editor produces.
    pub fn empty(mut mint_key: impl FnMut() -> String) -> Self {
        Self {
            blocks: vec![RawBlock::plain(mint_key(), "")],
            entity_map: BTreeMap::new(),
        }
    }

    /// One line per text block.
    pub fn to_plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Rebuilds content from edited plain text.
    ///
    /// Lines that are unchanged keep their block (key, type, styles). Changed
    /// lines reuse the key of the block at the same position but drop ranges
    /// that no longer fit the text. New trailing lines get fresh keys.
    pub fn with_plain_text(&self, text: &str, mut mint_key: impl FnMut() -> String) -> Self {
        let blocks = text
            .split('\n')
            .enumerate()
            .map(|(i, line)| match self.blocks.get(i) {
                Some(old) if old.text == line => old.clone(),
                Some(old) => {
                    let len = line.encode_utf16().count() as u32;
                    let mut b = old.clone();
                    b.text = line.to_string();
                    b.inline_style_ranges.retain(|r| r.offset.saturating_add(r.length) <= len);
                    b.entity_ranges.retain(|r| r.offset.saturating_add(r.length) <= len);
                    b
                }
                None => RawBlock::plain(mint_key(), line),
            })
            .collect::<Vec<_>>();

        let live_entities = blocks
            .iter()
            .flat_map(|b| b.entity_ranges.iter().map(|r| r.key.to_string()))
            .collect::<std::collections::BTreeSet<_>>();
        let entity_map = self
            .entity_map
            .iter()
            .filter(|(k, _)| live_entities.contains(*k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Self { blocks, entity_map }
    }
}
