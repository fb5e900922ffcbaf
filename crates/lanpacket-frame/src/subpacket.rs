use bytes::{BufMut, BytesMut};

use crate::error::{FrameError, Result};
use crate::frame::FrameWrite;
use crate::header::{MAX_SUBPACKET_BODY, MAX_SUBPACKET_SIZE, SUBPACKET_HEADER_SIZE};

/// Builder for one outbound sub-packet.
///
/// Holds a handle to the frame it will be stored into. [`store`](Self::store)
/// consumes the writer, so a stored sub-packet cannot be written again.
pub struct SubPacketWriter<'a> {
    sub_type: u8,
    body: BytesMut,
    target: &'a mut dyn FrameWrite,
}

impl<'a> SubPacketWriter<'a> {
    /// Create a writer bound to `target`.
    pub fn new(sub_type: u8, target: &'a mut dyn FrameWrite) -> Self {
        Self {
            sub_type,
            body: BytesMut::with_capacity(MAX_SUBPACKET_BODY),
            target,
        }
    }

    /// The sub-packet type tag.
    pub fn sub_type(&self) -> u8 {
        self.sub_type
    }

    /// Body bytes written so far.
    pub fn data_size(&self) -> usize {
        self.body.len()
    }

    /// Body bytes that can still be written.
    pub fn free_size(&self) -> usize {
        MAX_SUBPACKET_SIZE - SUBPACKET_HEADER_SIZE - self.body.len()
    }

    /// Append raw bytes to the body.
    pub fn add_data(&mut self, data: &[u8]) -> Result<()> {
        self.ensure_free(data.len())?;
        self.body.put_slice(data);
        Ok(())
    }

    pub fn write_byte(&mut self, value: u8) -> Result<()> {
        self.ensure_free(1)?;
        self.body.put_u8(value);
        Ok(())
    }

    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_byte(u8::from(value))
    }

    /// Append a little-endian u16.
    pub fn write_word(&mut self, value: u16) -> Result<()> {
        self.ensure_free(2)?;
        self.body.put_u16_le(value);
        Ok(())
    }

    /// Append a little-endian IEEE-754 single.
    pub fn write_float(&mut self, value: f32) -> Result<()> {
        self.ensure_free(4)?;
        self.body.put_f32_le(value);
        Ok(())
    }

    /// Append a little-endian IEEE-754 double (8 bytes).
    pub fn write_double(&mut self, value: f64) -> Result<()> {
        self.ensure_free(8)?;
        self.body.put_f64_le(value);
        Ok(())
    }

    /// Append `value` truncated or zero-padded to exactly `size` bytes.
    pub fn write_str_field(&mut self, value: &str, size: usize) -> Result<()> {
        self.ensure_free(size)?;
        let bytes = value.as_bytes();
        let used = bytes.len().min(size);
        self.body.put_slice(&bytes[..used]);
        self.body.put_bytes(0, size - used);
        Ok(())
    }

    /// Serialize `[type, length, body...]` into the owning frame.
    pub fn store(self) -> Result<()> {
        let mut encoded = BytesMut::with_capacity(SUBPACKET_HEADER_SIZE + self.body.len());
        encoded.put_u8(self.sub_type);
        // ensure_free keeps the body within a u8
        encoded.put_u8(self.body.len() as u8);
        encoded.put_slice(&self.body);

        self.target.write_data(&encoded)?;
        self.target.after_store()
    }

    fn ensure_free(&self, additional: usize) -> Result<()> {
        if additional > self.free_size() {
            return Err(FrameError::SubPacketOverflow {
                size: self.body.len() + additional,
                max: MAX_SUBPACKET_BODY,
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for SubPacketWriter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubPacketWriter")
            .field("sub_type", &self.sub_type)
            .field("data_size", &self.body.len())
            .finish()
    }
}

/// Read-only view of one received sub-packet.
///
/// The plain `read_*` accessors return a zero value and leave the cursor in
/// place when too few bytes remain. Use [`readable`](Self::readable) or the
/// `try_read_*` variants to tell a real zero from truncated data.
#[derive(Debug, Clone)]
pub struct SubPacket<'a> {
    sub_type: u8,
    body: &'a [u8],
    pos: usize,
}

impl<'a> SubPacket<'a> {
    pub fn new(sub_type: u8, body: &'a [u8]) -> Self {
        Self {
            sub_type,
            body,
            pos: 0,
        }
    }

    /// The sub-packet type tag.
    pub fn sub_type(&self) -> u8 {
        self.sub_type
    }

    /// Body length in bytes.
    pub fn data_size(&self) -> usize {
        self.body.len()
    }

    /// The whole body, independent of the read cursor.
    pub fn body(&self) -> &'a [u8] {
        self.body
    }

    /// Unread body bytes.
    pub fn remaining(&self) -> usize {
        self.body.len() - self.pos
    }

    /// True if at least `size` unread bytes remain.
    pub fn readable(&self, size: usize) -> bool {
        self.remaining() >= size
    }

    pub fn try_read_byte(&mut self) -> Option<u8> {
        self.take::<1>().map(|[b]| b)
    }

    pub fn try_read_bool(&mut self) -> Option<bool> {
        self.try_read_byte().map(|b| b != 0)
    }

    pub fn try_read_word(&mut self) -> Option<u16> {
        self.take().map(u16::from_le_bytes)
    }

    pub fn try_read_float(&mut self) -> Option<f32> {
        self.take().map(f32::from_le_bytes)
    }

    /// Legacy double decoding: consumes 4 bytes as an f32.
    ///
    /// Existing bus peers decode doubles this way. Use [`try_read_double64`](Self::try_read_double64) for
    /// values produced by [`SubPacketWriter::write_double`].
    pub fn try_read_double(&mut self) -> Option<f64> {
        self.try_read_float().map(f64::from)
    }

    /// Full 8-byte little-endian double.
    pub fn try_read_double64(&mut self) -> Option<f64> {
        self.take().map(f64::from_le_bytes)
    }

    /// Read a fixed-size field, stopping the string at the first NUL.
    pub fn try_read_str_field(&mut self, size: usize) -> Option<String> {
        if !self.readable(size) {
            return None;
        }
        let field = &self.body[self.pos..self.pos + size];
        self.pos += size;
        let text = match field.iter().position(|&b| b == 0) {
            Some(end) => &field[..end],
            None => field,
        };
        Some(String::from_utf8_lossy(text).into_owned())
    }

    pub fn read_byte(&mut self) -> u8 {
        self.try_read_byte().unwrap_or(0)
    }

    pub fn read_bool(&mut self) -> bool {
        self.try_read_bool().unwrap_or(false)
    }

    pub fn read_word(&mut self) -> u16 {
        self.try_read_word().unwrap_or(0)
    }

    pub fn read_float(&mut self) -> f32 {
        self.try_read_float().unwrap_or(0.0)
    }

    pub fn read_double(&mut self) -> f64 {
        self.try_read_double().unwrap_or(0.0)
    }

    pub fn read_double64(&mut self) -> f64 {
        self.try_read_double64().unwrap_or(0.0)
    }

    pub fn read_str_field(&mut self, size: usize) -> String {
        self.try_read_str_field(size).unwrap_or_default()
    }

    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes: [u8; N] = self.body.get(self.pos..self.pos + N)?.try_into().ok()?;
        self.pos += N;
        Some(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Collect {
        data: Vec<u8>,
        stores: usize,
    }

    impl FrameWrite for Collect {
        fn write_data(&mut self, data: &[u8]) -> Result<()> {
            self.data.extend_from_slice(data);
            Ok(())
        }

        fn after_store(&mut self) -> Result<()> {
            self.stores += 1;
            Ok(())
        }
    }

    #[test]
    fn store_writes_type_length_and_body() {
        let mut sink = Collect::default();
        let mut up = SubPacketWriter::new(0x21, &mut sink);
        up.write_byte(0x7F).unwrap();
        up.write_bool(true).unwrap();
        up.write_word(0x1234).unwrap();
        up.store().unwrap();

        assert_eq!(sink.data, vec![0x21, 4, 0x7F, 0x01, 0x34, 0x12]);
        assert_eq!(sink.stores, 1);
    }

    #[test]
    fn typed_fields_read_back() {
        let mut sink = Collect::default();
        let mut up = SubPacketWriter::new(0x02, &mut sink);
        up.write_float(21.5).unwrap();
        up.write_double(-3.25).unwrap();
        up.write_str_field("boiler", 8).unwrap();
        up.write_bool(false).unwrap();
        up.store().unwrap();

        let mut view = SubPacket::new(sink.data[0], &sink.data[2..]);
        assert_eq!(view.sub_type(), 0x02);
        assert_eq!(view.data_size(), 4 + 8 + 8 + 1);
        assert_eq!(view.read_float(), 21.5);
        assert_eq!(view.read_double64(), -3.25);
        assert_eq!(view.read_str_field(8), "boiler");
        assert!(!view.read_bool());
        assert_eq!(view.remaining(), 0);
    }

    #[test]
    fn str_field_truncates_and_pads() {
        let mut sink = Collect::default();
        let mut up = SubPacketWriter::new(0x01, &mut sink);
        up.write_str_field("abcdef", 4).unwrap();
        up.write_str_field("xy", 4).unwrap();
        up.store().unwrap();

        assert_eq!(&sink.data[2..], b"abcdxy\0\0");
    }

    #[test]
    fn body_ceiling_is_enforced() {
        let mut sink = Collect::default();
        let mut up = SubPacketWriter::new(0x01, &mut sink);
        up.add_data(&[0u8; MAX_SUBPACKET_BODY]).unwrap();
        assert_eq!(up.free_size(), 0);

        let err = up.write_byte(1).unwrap_err();
        assert!(matches!(
            err,
            FrameError::SubPacketOverflow {
                size: 254,
                max: 253
            }
        ));
        up.store().unwrap();
        assert_eq!(sink.data.len(), MAX_SUBPACKET_SIZE);
        assert_eq!(sink.data[1], 253);
    }

    #[test]
    fn oversized_add_data_writes_nothing() {
        let mut sink = Collect::default();
        let mut up = SubPacketWriter::new(0x01, &mut sink);
        assert!(up.add_data(&[0u8; 254]).is_err());
        assert_eq!(up.data_size(), 0);
    }

    #[test]
    fn truncated_reads_return_defaults() {
        let body = [0x01, 0x02, 0x03];
        let mut view = SubPacket::new(0x09, &body);

        assert_eq!(view.read_float(), 0.0);
        assert_eq!(view.remaining(), 3);
        assert_eq!(view.read_word(), 0x0201);
        assert_eq!(view.read_word(), 0);
        assert_eq!(view.try_read_word(), None);
        assert_eq!(view.read_byte(), 0x03);
        assert_eq!(view.try_read_byte(), None);
        assert!(!view.read_bool());
        assert_eq!(view.read_str_field(2), "");
    }

    #[test]
    fn read_double_decodes_four_byte_float() {
        let mut body = Vec::new();
        body.extend_from_slice(&1.5f32.to_le_bytes());
        let mut view = SubPacket::new(0x01, &body);

        assert!(view.readable(4));
        assert_eq!(view.read_double(), 1.5);
        assert_eq!(view.remaining(), 0);
    }

    #[test]
    fn write_double_is_not_readable_with_legacy_reader() {
        let mut sink = Collect::default();
        let mut up = SubPacketWriter::new(0x01, &mut sink);
        up.write_double(1.5).unwrap();
        up.store().unwrap();

        let mut legacy = SubPacket::new(0x01, &sink.data[2..]);
        assert_ne!(legacy.read_double(), 1.5);
        assert_eq!(legacy.remaining(), 4);

        let mut full = SubPacket::new(0x01, &sink.data[2..]);
        assert_eq!(full.read_double64(), 1.5);
    }

    #[test]
    fn str_field_stops_at_nul() {
        let body = *b"ok\0zz";
        let mut view = SubPacket::new(0x01, &body);
        assert_eq!(view.try_read_str_field(5).as_deref(), Some("ok"));
        assert_eq!(view.remaining(), 0);
    }
}
