use std::collections::HashMap;
use std::io;

use lanpacket_frame::{is_reserved, Frame, SubPacket, NOP};
use tracing::{debug, trace, warn};

use crate::config::ManagerConfig;
use crate::error::Result;
use crate::outbound::Outbound;
use crate::sink::FrameSink;
use crate::stats::ManagerStats;

/// Callback invoked with each dispatched sub-packet.
pub type Handler = Box<dyn FnMut(&mut SubPacket<'_>) + Send>;

/// Routes received sub-packets to handlers and writes outbound frames.
///
/// Handler tables are per instance, so several managers (one per
/// connection) can live in the same process. Ordering is strict: frames are
/// dispatched in the order they complete, sub-packets in payload order.
pub struct PacketManager<S> {
    handlers: HashMap<u8, HashMap<u8, Handler>>,
    rx: Frame,
    pub(crate) tx: Frame,
    pub(crate) sink: S,
    config: ManagerConfig,
    pub(crate) stats: ManagerStats,
}

impl<S: FrameSink> PacketManager<S> {
    /// Create a manager with default configuration.
    pub fn new(sink: S) -> Self {
        Self::with_config(sink, ManagerConfig::default())
    }

    /// Create a manager with explicit configuration.
    pub fn with_config(sink: S, config: ManagerConfig) -> Self {
        Self {
            handlers: HashMap::new(),
            rx: Frame::with_config(config.frame),
            tx: Frame::with_config(config.frame),
            sink,
            config,
            stats: ManagerStats::default(),
        }
    }

    /// Register `handler` for one (frame type, sub-packet type) pair.
    ///
    /// A later registration for the same pair replaces the earlier one;
    /// returns true when that happened.
    pub fn add_handler<F>(&mut self, frame_type: u8, sub_type: u8, handler: F) -> bool
    where
        F: FnMut(&mut SubPacket<'_>) + Send + 'static,
    {
        let replaced = self
            .handlers
            .entry(frame_type)
            .or_default()
            .insert(sub_type, Box::new(handler))
            .is_some();
        if replaced {
            debug!(frame_type, sub_type, "replaced sub-packet handler");
        }
        replaced
    }

    /// Remove a handler. A frame type left without handlers is dropped on receipt.
    pub fn remove_handler(&mut self, frame_type: u8, sub_type: u8) -> bool {
        let Some(table) = self.handlers.get_mut(&frame_type) else {
            return false;
        };
        let removed = table.remove(&sub_type).is_some();
        if table.is_empty() {
            self.handlers.remove(&frame_type);
        }
        removed
    }

    pub fn has_handler(&self, frame_type: u8, sub_type: u8) -> bool {
        self.handlers
            .get(&frame_type)
            .is_some_and(|table| table.contains_key(&sub_type))
    }

    /// Feed incoming bytes and dispatch every frame they complete.
    ///
    /// Never fails: garbage is skipped, malformed sub-packets are logged and
    /// counted, and a trailing partial frame waits for the next call.
    pub fn receive(&mut self, data: &[u8]) {
        self.rx.receive_data(data);
        while self.rx.sync() {
            self.on_receive_lp();
            self.rx.consume_data();
        }
        let discarded = self.rx.take_discarded_bytes();
        if discarded > 0 {
            debug!(discarded, "skipped bytes while resyncing");
            self.stats.bytes_discarded += discarded;
        }
    }

    /// Start an outbound frame of `frame_type`.
    pub fn create(&mut self, frame_type: u8) -> Outbound<'_, S> {
        self.create_with_request(frame_type, 0)
    }

    /// Start an outbound frame carrying a request id.
    pub fn create_with_request(&mut self, frame_type: u8, request_id: u16) -> Outbound<'_, S> {
        Outbound::new(self, frame_type, request_id)
    }

    /// Finalize `frame` and write it to the sink.
    ///
    /// Empty frames are skipped unless `skip_empty` is false. The frame is
    /// truncated back to its header afterwards, whether or not the write
    /// succeeded.
    pub fn send_lp(&mut self, frame: &mut Frame, skip_empty: bool) -> Result<()> {
        transmit(&mut self.sink, &mut self.stats, frame, skip_empty)?;
        Ok(())
    }

    /// Drop any buffered inbound bytes, including a stalled partial frame.
    pub fn reset_receive(&mut self) {
        if !self.rx.is_empty() {
            debug!(pending = self.rx.len(), "discarding receive buffer");
        }
        self.rx.erase();
    }

    /// Inbound bytes buffered but not yet dispatched.
    pub fn pending_bytes(&self) -> usize {
        self.rx.len()
    }

    pub fn stats(&self) -> &ManagerStats {
        &self.stats
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Borrow the sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Mutably borrow the sink.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Consume the manager and return its sink.
    pub fn into_sink(self) -> S {
        self.sink
    }

    pub(crate) fn transmit_tx(&mut self, skip_empty: bool) -> io::Result<()> {
        transmit(&mut self.sink, &mut self.stats, &mut self.tx, skip_empty)
    }

    fn on_receive_lp(&mut self) {
        let frame_type = self.rx.frame_type();
        let request_id = self.rx.request_id();
        self.stats.frames_received += 1;
        trace!(
            frame_type,
            request_id,
            size = self.rx.data_size(),
            "dispatching frame"
        );

        let Some(table) = self.handlers.get_mut(&frame_type) else {
            if is_reserved(frame_type) && self.config.reply_to_nop {
                let mut reply = Frame::new_outbound(NOP, request_id);
                match transmit(&mut self.sink, &mut self.stats, &mut reply, false) {
                    Ok(()) => self.stats.nop_replies += 1,
                    Err(err) => warn!(error = %err, "failed sending NOP reply"),
                }
            } else {
                self.stats.frames_dropped += 1;
                debug!(frame_type, "no handlers for frame type, dropping");
            }
            return;
        };

        loop {
            match self.rx.try_read_up() {
                Ok(Some(mut up)) => {
                    let sub_type = up.sub_type();
                    match table.get_mut(&sub_type) {
                        Some(handler) => {
                            handler(&mut up);
                            self.stats.sub_packets_dispatched += 1;
                        }
                        None => {
                            self.stats.sub_packets_unhandled += 1;
                            warn!(frame_type, sub_type, "unhandled UP type");
                        }
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    self.stats.decode_errors += 1;
                    warn!(frame_type, error = %err, "sub-packet decode error, dropping rest of frame");
                    break;
                }
            }
        }
    }
}

impl<S> std::fmt::Debug for PacketManager<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handlers: usize = self.handlers.values().map(HashMap::len).sum();
        f.debug_struct("PacketManager")
            .field("handlers", &handlers)
            .field("pending", &self.rx.len())
            .field("stats", &self.stats)
            .finish()
    }
}

fn transmit<S: FrameSink>(
    sink: &mut S,
    stats: &mut ManagerStats,
    frame: &mut Frame,
    skip_empty: bool,
) -> io::Result<()> {
    let result = if !skip_empty || !frame.payload().is_empty() {
        frame.calc_header();
        match sink.write(frame.as_bytes()) {
            Ok(()) => {
                stats.frames_sent += 1;
                trace!(
                    frame_type = frame.frame_type(),
                    size = frame.len(),
                    "frame sent"
                );
                Ok(())
            }
            Err(err) => {
                stats.send_errors += 1;
                Err(err)
            }
        }
    } else {
        Ok(())
    };
    frame.truncate();
    result
}
