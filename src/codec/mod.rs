//! Document <-> URL fragment codec.
//!
//! The fragment is `base64url(zlib(json(document)))`. Decoding is strict: a
//! string either yields a complete, consistent [`Document`] or a
//! [`CodecError`]; callers that must never fail use [`decode_or_empty`].

use crate::models::Document;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read, Write};
use thiserror::Error;

/// Upper bound on the inflated JSON size.
pub const MAX_INFLATED_BYTES: u64 = 16 * 1024 * 1024;

const LENIENT: GeneralPurposeConfig = GeneralPurposeConfig::new()
    .with_encode_padding(false)
    .with_decode_padding_mode(DecodePaddingMode::Indifferent);

const URL_SAFE: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);
const STANDARD: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("fragment is empty")]
    Empty,

    #[error("fragment is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("fragment does not inflate: {0}")]
    Inflate(#[source] std::io::Error),

    #[error("inflated fragment exceeds {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("fragment is not a document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("document is inconsistent: {0}")]
    Inconsistent(String),
}

pub type CodecResult<T> = Result<T, CodecError>;

/// Serializes `doc` into a URL-fragment-safe string (without the leading `#`).
pub fn encode(doc: &Document) -> String {
    let json = serde_json::to_vec(doc).unwrap_or_else(|e| {
        // Every field is a plain string/number/map; this cannot fail.
        log::error!("document serialization failed: {e}");
        b"{\"blocks\":{},\"blockOrder\":[]}".to_vec()
    });

    let mut enc = ZlibEncoder::new(Vec::with_capacity(json.len() / 2), Compression::best());
    // Writes into a Vec are infallible.
    let compressed = match enc.write_all(&json).and_then(|_| enc.finish()) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::error!("deflate into memory failed: {e}");
            Vec::new()
        }
    };

    URL_SAFE.encode(compressed)
}

/// Parses a fragment (with or without the leading `#`) back into a document.
pub fn decode(fragment: &str) -> CodecResult<Document> {
    let fragment = fragment.trim();
    let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
    if fragment.is_empty() {
        return Err(CodecError::Empty);
    }

    // Older links were written with the standard alphabet.
    let compressed = if fragment.contains(['+', '/']) {
        STANDARD.decode(fragment)?
    } else {
        URL_SAFE.decode(fragment)?
    };

    let mut json = Vec::new();
    ZlibDecoder::new(compressed.as_slice())
        .take(MAX_INFLATED_BYTES + 1)
        .read_to_end(&mut json)
        .map_err(CodecError::Inflate)?;
    if json.len() as u64 > MAX_INFLATED_BYTES {
        return Err(CodecError::TooLarge {
            limit: MAX_INFLATED_BYTES,
        });
    }

    let doc: Document = serde_json::from_slice(&json)?;
    doc.check_consistency().map_err(CodecError::Inconsistent)?;
    Ok(doc)
}

/// [`decode`], falling back to an empty document on any error.
pub fn decode_or_empty(fragment: &str) -> Document {
    match decode(fragment) {
        Ok(doc) => {
            log::info!("restored {} block(s) from fragment", doc.block_order.len());
            doc
        }
        Err(CodecError::Empty) => {
            log::info!("no fragment; starting with an empty document");
            Document::empty()
        }
        Err(e) => {
            log::warn!("discarding unreadable fragment: {e}");
            Document::empty()
        }
    }
}
