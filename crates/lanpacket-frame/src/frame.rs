use std::ops::Range;

use bytes::{Buf, BytesMut};
use tracing::{debug, trace, warn};

use crate::error::{FrameError, Result};
use crate::header::{
    header_checksum, HEADER_SIZE, MAGIC_END, MAGIC_START, MAX_FRAME_SIZE, OFFSET_CHECKSUM,
    OFFSET_DATA_SIZE, OFFSET_MAGIC_END, OFFSET_REQUEST_ID, OFFSET_TYPE, SUBPACKET_HEADER_SIZE,
};
use crate::subpacket::{SubPacket, SubPacketWriter};

/// Destination for serialized sub-packets.
///
/// Implemented by [`Frame`] itself, and by outbound handles that can flush a
/// full frame before appending more.
pub trait FrameWrite {
    /// Append serialized bytes to the frame payload.
    fn write_data(&mut self, data: &[u8]) -> Result<()>;

    /// Called once a sub-packet has been stored.
    fn after_store(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Configuration for a frame buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameConfig {
    /// Maximum total frame size (header + payload). Default: 512 bytes.
    pub max_frame_size: usize,
}

impl FrameConfig {
    fn effective_max(&self) -> usize {
        self.max_frame_size
            .clamp(HEADER_SIZE, HEADER_SIZE + u16::MAX as usize)
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_frame_size: MAX_FRAME_SIZE,
        }
    }
}

/// One LAN frame buffer.
///
/// On the receive side a single `Frame` is reused as a rolling buffer:
/// [`receive_data`](Self::receive_data) appends, [`sync`](Self::sync) finds the
/// next valid frame, and [`consume_data`](Self::consume_data) strips it.
///
/// On the send side [`create`](Self::create) writes a fresh header,
/// sub-packets are appended through [`up`](Self::up), and
/// [`calc_header`](Self::calc_header) finalizes length and checksum.
#[derive(Debug, Default)]
pub struct Frame {
    buf: BytesMut,
    /// Read position relative to the first payload byte.
    cursor: usize,
    synced: bool,
    data_size: usize,
    session: bool,
    discarded: u64,
    config: FrameConfig,
}

impl Frame {
    /// Create an empty frame buffer with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty frame buffer with explicit configuration.
    pub fn with_config(config: FrameConfig) -> Self {
        Self {
            buf: BytesMut::with_capacity(config.effective_max()),
            config,
            ..Self::default()
        }
    }

    /// Create a send-side frame with its header already written.
    pub fn new_outbound(frame_type: u8, request_id: u16) -> Self {
        let mut frame = Self::new();
        frame.create(frame_type, request_id);
        frame
    }

    /// Replace the buffer with a fresh header.
    pub fn create(&mut self, frame_type: u8, request_id: u16) {
        self.buf.clear();
        self.buf.resize(HEADER_SIZE, 0);
        self.buf[0] = MAGIC_START;
        self.buf[OFFSET_REQUEST_ID..OFFSET_REQUEST_ID + 2]
            .copy_from_slice(&request_id.to_le_bytes());
        self.buf[OFFSET_TYPE] = frame_type;
        self.buf[OFFSET_MAGIC_END] = MAGIC_END;
        self.cursor = 0;
        self.synced = false;
        self.data_size = 0;
        self.session = false;
    }

    /// Clear the buffer entirely.
    pub fn erase(&mut self) {
        self.buf.clear();
        self.cursor = 0;
        self.synced = false;
        self.data_size = 0;
    }

    /// Keep only the header, dropping any payload.
    pub fn truncate(&mut self) {
        self.buf.truncate(HEADER_SIZE);
        self.cursor = 0;
        self.synced = false;
        self.data_size = 0;
    }

    /// XOR of header bytes 0..16, or 0 if the buffer is shorter than that.
    pub fn calc_header_checksum(&self) -> u8 {
        header_checksum(&self.buf)
    }

    /// Write the payload length and checksum into the header.
    ///
    /// Must be called right before the frame bytes are transmitted.
    pub fn calc_header(&mut self) {
        if self.buf.len() < HEADER_SIZE {
            return;
        }
        // write_data keeps the frame within effective_max, which fits a u16 payload
        let size = (self.buf.len() - HEADER_SIZE) as u16;
        self.buf[OFFSET_DATA_SIZE..OFFSET_DATA_SIZE + 2].copy_from_slice(&size.to_le_bytes());
        self.buf[OFFSET_CHECKSUM] = self.calc_header_checksum();
    }

    /// True if the buffer starts with a structurally valid header.
    pub fn check_header(&self) -> bool {
        self.buf.len() >= HEADER_SIZE
            && self.buf[0] == MAGIC_START
            && self.buf[OFFSET_MAGIC_END] == MAGIC_END
            && self.buf[OFFSET_CHECKSUM] == self.calc_header_checksum()
    }

    /// Payload length declared in the header, or 0 if it cannot be read.
    pub fn extract_data_size(&self) -> usize {
        self.buf
            .get(OFFSET_DATA_SIZE..OFFSET_DATA_SIZE + 2)
            .map(|b| u16::from_le_bytes([b[0], b[1]]) as usize)
            .unwrap_or(0)
    }

    /// Locate the next complete, valid frame at the front of the buffer.
    ///
    /// Bytes that cannot start a valid header are discarded one at a time.
    /// Returns false when more data is needed; a partial frame (or a partial
    /// header starting with the start magic) stays buffered.
    pub fn sync(&mut self) -> bool {
        while !self.buf.is_empty() {
            if self.buf.len() < HEADER_SIZE && self.could_be_partial_header() {
                return false;
            }

            if self.check_header() {
                let size = self.extract_data_size();
                let total = HEADER_SIZE + size;
                if total <= self.config.effective_max() {
                    if self.buf.len() < total {
                        trace!(
                            have = self.buf.len(),
                            need = total,
                            "waiting for frame payload"
                        );
                        return false;
                    }
                    if !self.synced {
                        self.cursor = 0;
                    }
                    self.data_size = size;
                    self.synced = true;
                    trace!(
                        frame_type = self.frame_type(),
                        request_id = self.request_id(),
                        size,
                        "frame synced"
                    );
                    return true;
                }
                debug!(size, "header declares oversized payload, resyncing");
            }

            self.buf.advance(1);
            self.discarded += 1;
        }
        false
    }

    /// Strip the synced frame from the front of the buffer.
    ///
    /// A no-op unless the last [`sync`](Self::sync) succeeded.
    pub fn consume_data(&mut self) {
        if !self.synced {
            return;
        }
        let total = (HEADER_SIZE + self.data_size).min(self.buf.len());
        self.buf.advance(total);
        self.cursor = 0;
        self.synced = false;
        self.data_size = 0;
    }

    /// Append raw incoming bytes.
    pub fn receive_data(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Read the next sub-packet of the current frame.
    ///
    /// Returns `Ok(None)` once the payload is exhausted. A sub-packet whose
    /// declared length overruns the payload is an error, and the rest of the
    /// frame is skipped since the cursor can no longer be trusted.
    pub fn try_read_up(&mut self) -> Result<Option<SubPacket<'_>>> {
        let payload_len = self.payload().len();
        match parse_sub_packet(self.payload(), self.cursor) {
            Ok(Some((sub_type, range))) => {
                self.cursor = range.end;
                let body = &self.buf[HEADER_SIZE + range.start..HEADER_SIZE + range.end];
                Ok(Some(SubPacket::new(sub_type, body)))
            }
            Ok(None) => Ok(None),
            Err(err) => {
                self.cursor = payload_len;
                Err(err)
            }
        }
    }

    /// Like [`try_read_up`](Self::try_read_up), logging decode errors as `None`.
    pub fn read_up(&mut self) -> Option<SubPacket<'_>> {
        match self.try_read_up() {
            Ok(up) => up,
            Err(err) => {
                warn!(error = %err, "sub-packet decode error");
                None
            }
        }
    }

    /// Iterate the current frame's sub-packets without moving the read cursor.
    pub fn sub_packets(&self) -> SubPackets<'_> {
        SubPackets {
            payload: self.payload(),
            offset: 0,
            done: false,
        }
    }

    /// Start a new outbound sub-packet stored into this frame.
    pub fn up(&mut self, sub_type: u8) -> SubPacketWriter<'_> {
        SubPacketWriter::new(sub_type, self)
    }

    /// Frame type from the header, 0 if the header is incomplete.
    pub fn frame_type(&self) -> u8 {
        self.buf.get(OFFSET_TYPE).copied().unwrap_or(0)
    }

    /// Request id from the header, 0 if the header is incomplete.
    pub fn request_id(&self) -> u16 {
        self.buf
            .get(OFFSET_REQUEST_ID..OFFSET_REQUEST_ID + 2)
            .map(|b| u16::from_le_bytes([b[0], b[1]]))
            .unwrap_or(0)
    }

    /// Payload length cached by the last successful sync.
    pub fn data_size(&self) -> usize {
        self.data_size
    }

    pub fn is_synced(&self) -> bool {
        self.synced
    }

    /// Payload bytes of the current frame.
    ///
    /// Bounded by the declared length when synced, by the buffer otherwise.
    pub fn payload(&self) -> &[u8] {
        if self.buf.len() <= HEADER_SIZE {
            return &[];
        }
        &self.buf[HEADER_SIZE..self.payload_end()]
    }

    /// The whole buffer, header included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Bytes that can still be appended before the frame is full.
    pub fn free_size(&self) -> usize {
        self.config.effective_max().saturating_sub(self.buf.len())
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    /// Number of garbage bytes dropped by `sync` since the last call.
    pub fn take_discarded_bytes(&mut self) -> u64 {
        std::mem::take(&mut self.discarded)
    }

    /// Start coalescing: sends are suppressed until the session closes.
    pub fn open_session(&mut self) {
        self.session = true;
    }

    pub fn close_session(&mut self) {
        self.session = false;
    }

    pub fn is_session_open(&self) -> bool {
        self.session
    }

    fn payload_end(&self) -> usize {
        if self.synced {
            (HEADER_SIZE + self.data_size).min(self.buf.len())
        } else {
            self.buf.len()
        }
    }

    fn could_be_partial_header(&self) -> bool {
        self.buf[0] == MAGIC_START
            && self
                .buf
                .get(OFFSET_MAGIC_END)
                .is_none_or(|&b| b == MAGIC_END)
    }
}

impl FrameWrite for Frame {
    fn write_data(&mut self, data: &[u8]) -> Result<()> {
        let max = self.config.effective_max();
        let size = self.buf.len() + data.len();
        if size > max {
            return Err(FrameError::FrameOverflow { size, max });
        }
        self.buf.extend_from_slice(data);
        Ok(())
    }
}

/// Iterator over the sub-packets of one frame payload.
///
/// Yields an error once and stops if a sub-packet overruns the payload.
#[derive(Debug, Clone)]
pub struct SubPackets<'a> {
    payload: &'a [u8],
    offset: usize,
    done: bool,
}

impl<'a> Iterator for SubPackets<'a> {
    type Item = Result<SubPacket<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match parse_sub_packet(self.payload, self.offset) {
            Ok(Some((sub_type, range))) => {
                self.offset = range.end;
                Some(Ok(SubPacket::new(sub_type, &self.payload[range])))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Parse the sub-packet header at `offset`, returning its type and body range.
fn parse_sub_packet(payload: &[u8], offset: usize) -> Result<Option<(u8, Range<usize>)>> {
    if offset + SUBPACKET_HEADER_SIZE > payload.len() {
        return Ok(None);
    }
    let sub_type = payload[offset];
    let declared = payload[offset + 1] as usize;
    let start = offset + SUBPACKET_HEADER_SIZE;
    let available = payload.len() - start;
    if declared > available {
        return Err(FrameError::SubPacketTruncated {
            sub_type,
            declared,
            available,
        });
    }
    Ok(Some((sub_type, start..start + declared)))
}
