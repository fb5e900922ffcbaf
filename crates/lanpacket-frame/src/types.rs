//! Reserved frame types.
//!
//! Frame type `0xFF` is reserved for keep-alive traffic. Every other value
//! is application-defined.

/// Keep-alive frame, carries no sub-packets.
pub const NOP: u8 = 0xFF;

/// Returns a human-readable name for a frame type.
pub fn frame_type_name(frame_type: u8) -> &'static str {
    match frame_type {
        NOP => "NOP",
        _ => "USER",
    }
}

/// Returns true if the frame type is reserved by the protocol.
pub fn is_reserved(frame_type: u8) -> bool {
    frame_type == NOP
}
