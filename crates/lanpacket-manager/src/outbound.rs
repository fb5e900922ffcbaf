use lanpacket_frame::{Frame, FrameError, FrameWrite, SubPacketWriter};
use tracing::debug;

use crate::error::Result;
use crate::manager::PacketManager;
use crate::sink::FrameSink;

/// Outbound frame being built on a [`PacketManager`].
///
/// Without a session every stored sub-packet is sent as its own frame. With
/// a session open, sub-packets accumulate until [`send`](Self::send) after
/// [`close_session`](Self::close_session), or [`flush`](Self::flush). A frame
/// that would outgrow the maximum size is flushed before the append, in both
/// modes, keeping the frame type and request id for the next frame.
///
/// Dropping the handle with an unsent payload discards that payload.
pub struct Outbound<'m, S: FrameSink> {
    manager: &'m mut PacketManager<S>,
}

impl<'m, S: FrameSink> Outbound<'m, S> {
    pub(crate) fn new(manager: &'m mut PacketManager<S>, frame_type: u8, request_id: u16) -> Self {
        manager.tx.create(frame_type, request_id);
        Self { manager }
    }

    /// Start a sub-packet that will be stored into this frame.
    pub fn up(&mut self, sub_type: u8) -> SubPacketWriter<'_> {
        SubPacketWriter::new(sub_type, self)
    }

    /// Suppress sends so stored sub-packets coalesce into one frame.
    pub fn open_session(&mut self) {
        self.manager.tx.open_session();
    }

    pub fn close_session(&mut self) {
        self.manager.tx.close_session();
    }

    pub fn is_session_open(&self) -> bool {
        self.manager.tx.is_session_open()
    }

    /// Send the frame unless a session is open.
    pub fn send(&mut self, skip_empty: bool) -> Result<()> {
        if self.is_session_open() {
            return Ok(());
        }
        self.manager.transmit_tx(skip_empty)?;
        Ok(())
    }

    /// Send pending sub-packets now, even inside a session.
    pub fn flush(&mut self) -> Result<()> {
        self.manager.transmit_tx(true)?;
        Ok(())
    }

    /// The frame as built so far.
    pub fn frame(&self) -> &Frame {
        &self.manager.tx
    }
}

impl<S: FrameSink> FrameWrite for Outbound<'_, S> {
    fn write_data(&mut self, data: &[u8]) -> lanpacket_frame::Result<()> {
        let tx = &mut self.manager.tx;
        match tx.write_data(data) {
            Err(FrameError::FrameOverflow { size, max }) if !tx.payload().is_empty() => {
                debug!(size, max, "frame full, sending before append");
                self.manager.transmit_tx(true)?;
                self.manager.tx.write_data(data)
            }
            other => other,
        }
    }

    fn after_store(&mut self) -> lanpacket_frame::Result<()> {
        if self.is_session_open() {
            return Ok(());
        }
        self.manager.transmit_tx(true)?;
        Ok(())
    }
}

impl<S: FrameSink> Drop for Outbound<'_, S> {
    fn drop(&mut self) {
        let tx = &mut self.manager.tx;
        if !tx.payload().is_empty() {
            debug!(
                frame_type = tx.frame_type(),
                size = tx.payload().len(),
                "discarding unsent outbound payload"
            );
        }
        tx.truncate();
        tx.close_session();
    }
}

impl<S: FrameSink> std::fmt::Debug for Outbound<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Outbound")
            .field("frame_type", &self.manager.tx.frame_type())
            .field("payload", &self.manager.tx.payload().len())
            .field("session", &self.is_session_open())
            .finish()
    }
}
