//! Wire encoding of stream events.

use bytes::Bytes;

use gradepal_types::stream::{DATA_PREFIX, DONE_SENTINEL, StreamFrame};

/// `data: {json}\n\n`
pub fn encode_frame(frame: &StreamFrame) -> Result<Bytes, serde_json::Error> {
    let json = serde_json::to_string(frame)?;
    Ok(data_block(&json))
}

/// `data: [DONE]\n\n`
pub fn encode_done_sentinel() -> Bytes {
    data_block(DONE_SENTINEL)
}

/// `: text\n\n`, ignored by every consumer.
pub fn encode_comment(text: &str) -> Bytes {
    Bytes::from(format!(": {text}\n\n"))
}

/// Wrap an already-serialized payload in a data block.
pub fn data_block(payload: &str) -> Bytes {
    Bytes::from(format!("{DATA_PREFIX}{payload}\n\n"))
}
