use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

/// Encodes raw file bytes as padded standard base64 for the `content` field.
pub fn encode_content(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}
