pub const MAX_DEPTH: usize = 256;

pub const ROOT_PATH: &str = "";

pub(crate) const PROPERTY_SEPARATOR: u8 = b'.';
pub(crate) const INDEX_OPEN: u8 = b'[';
pub(crate) const INDEX_CLOSE: u8 = b']';
pub(crate) const ESCAPE: u8 = b'\\';

/// Bytes that start a new segment in a canonical path.
#[inline]
pub fn is_segment_start(byte: u8) -> bool {
    byte == PROPERTY_SEPARATOR || byte == INDEX_OPEN
}

/// Bytes that must be escaped inside a property-name segment.
#[inline]
pub fn is_path_reserved(byte: u8) -> bool {
    matches!(
        byte,
        PROPERTY_SEPARATOR | INDEX_OPEN | INDEX_CLOSE | ESCAPE
    )
}
