use super::codec::{Decoded, decode, encode};
use super::error::{BridgeError, bridge_error};
use super::message::BridgeMessage;
use std::io::{BufRead, Write};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use tracing::{debug, trace, warn};

/// Outbound half of a bridge: accepts one serialized frame at a time.
pub trait FrameSink {
    fn send_frame(&mut self, frame: &str) -> Result<(), BridgeError>;
}

impl FrameSink for Sender<String> {
    fn send_frame(&mut self, frame: &str) -> Result<(), BridgeError> {
        self.send(frame.to_string())
            .map_err(|_| bridge_error("disconnected", "peer endpoint closed"))
    }
}

/// Newline-delimited JSON over any writer.
pub struct LineSink<W: Write> {
    writer: W,
}

impl<W: Write> LineSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> FrameSink for LineSink<W> {
    fn send_frame(&mut self, frame: &str) -> Result<(), BridgeError> {
        self.writer
            .write_all(frame.as_bytes())
            .and_then(|()| self.writer.write_all(b"\n"))
            .and_then(|()| self.writer.flush())
            .map_err(|err| bridge_error("io_error", err.to_string()))
    }
}

/// Read non-empty lines on a helper thread and queue them for the event loop.
///
/// The thread exits at end of input or once the receiver is dropped.
pub fn spawn_line_reader<R>(reader: R, label: &'static str) -> Receiver<String>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in reader.lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    warn!(label, "Stopping line reader: {err}");
                    break;
                }
            };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if tx.send(trimmed.to_string()).is_err() {
                break;
            }
        }
        debug!(label, "Line reader finished");
    });
    rx
}

type Handler = Box<dyn FnMut(&BridgeMessage)>;

/// One endpoint of the host/document bridge.
///
/// Sending never waits on the peer. Inbound frames queue up until the owner
/// calls [`BridgeTransport::pump`] from its event loop, which decodes them in
/// arrival order and drops anything malformed or unknown.
pub struct BridgeTransport {
    label: &'static str,
    sink: Box<dyn FrameSink>,
    inbound: Receiver<String>,
    handlers: Vec<Handler>,
    peer_closed: bool,
}

impl BridgeTransport {
    pub fn new(label: &'static str, sink: impl FrameSink + 'static, inbound: Receiver<String>) -> Self {
        Self {
            label,
            sink: Box::new(sink),
            inbound,
            handlers: Vec::new(),
            peer_closed: false,
        }
    }

    /// Two endpoints joined by in-memory queues: `(host, document)`.
    pub fn pair() -> (Self, Self) {
        let (to_document, document_inbound) = mpsc::channel::<String>();
        let (to_host, host_inbound) = mpsc::channel::<String>();
        (
            Self::new("host", to_document, host_inbound),
            Self::new("document", to_host, document_inbound),
        )
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn send(&mut self, message: &BridgeMessage) -> Result<(), BridgeError> {
        let frame = encode(message)?;
        trace!(label = self.label, %frame, "Bridge send");
        self.sink.send_frame(&frame)
    }

    /// Register an observer invoked once per decoded inbound message.
    pub fn on_message<F>(&mut self, handler: F)
    where
        F: FnMut(&BridgeMessage) + 'static,
    {
        self.handlers.push(Box::new(handler));
    }

    /// Decode every queued frame, notify handlers, and hand the messages back.
    pub fn pump(&mut self) -> Vec<BridgeMessage> {
        let mut messages = Vec::new();
        loop {
            let frame = match self.inbound.try_recv() {
                Ok(frame) => frame,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.peer_closed {
                        debug!(label = self.label, "Bridge peer disconnected");
                        self.peer_closed = true;
                    }
                    break;
                }
            };
            match decode(&frame) {
                Decoded::Message(message) => {
                    for handler in &mut self.handlers {
                        handler(&message);
                    }
                    messages.push(message);
                }
                Decoded::Unknown(tag) => {
                    debug!(label = self.label, %tag, "Ignoring unknown bridge message");
                }
                Decoded::Malformed(reason) => {
                    warn!(label = self.label, %reason, "Dropping malformed bridge frame");
                }
            }
        }
        messages
    }

    pub fn peer_closed(&self) -> bool {
        self.peer_closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::io::Cursor;
    use std::rc::Rc;
    use std::time::Duration;

    #[test]
    fn pair_delivers_fifo_in_both_directions() {
        let (mut host, mut document) = BridgeTransport::pair();

        host.send(&BridgeMessage::GoToPage { page: 2 }).expect("send");
        host.send(&BridgeMessage::Reload).expect("send");
        document
            .send(&BridgeMessage::DocumentLoaded { total_pages: 9 })
            .expect("send");

        assert_eq!(
            document.pump(),
            vec![BridgeMessage::GoToPage { page: 2 }, BridgeMessage::Reload]
        );
        assert_eq!(
            host.pump(),
            vec![BridgeMessage::DocumentLoaded { total_pages: 9 }]
        );
        assert!(host.pump().is_empty());
    }

    #[test]
    fn handlers_see_each_message_once() {
        let (mut host, mut document) = BridgeTransport::pair();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        host.on_message(move |message| sink.borrow_mut().push(message.tag()));

        document
            .send(&BridgeMessage::PageChanged {
                page: 1,
                total_pages: 3,
            })
            .expect("send");
        document
            .send(&BridgeMessage::LoadFailed {
                message: "offline".to_string(),
            })
            .expect("send");
        host.pump();
        host.pump();

        assert_eq!(*seen.borrow(), vec!["pageChange", "loadError"]);
    }

    #[test]
    fn malformed_and_unknown_frames_are_dropped() {
        let (tx, rx) = mpsc::channel::<String>();
        let (sink, _peer) = mpsc::channel::<String>();
        let mut host = BridgeTransport::new("host", sink, rx);

        tx.send("{not json".to_string()).expect("queue");
        tx.send(r#"{"type":"zoomChanged","scale":2}"#.to_string())
            .expect("queue");
        tx.send(r#"{"type":"pdfLoaded","totalPages":4}"#.to_string())
            .expect("queue");

        assert_eq!(
            host.pump(),
            vec![BridgeMessage::DocumentLoaded { total_pages: 4 }]
        );
    }

    #[test]
    fn send_to_dropped_peer_reports_disconnect() {
        let (mut host, document) = BridgeTransport::pair();
        drop(document);

        let err = host.send(&BridgeMessage::Reload).expect_err("peer gone");
        assert_eq!(err.code, "disconnected");
        host.pump();
        assert!(host.peer_closed());
    }

    #[test]
    fn line_sink_writes_one_frame_per_line() {
        let mut sink = LineSink::new(Vec::new());
        sink.send_frame(r#"{"type":"reload"}"#).expect("write");
        sink.send_frame(r#"{"type":"goToPage","page":1}"#).expect("write");

        let text = String::from_utf8(sink.into_inner()).expect("utf8");
        assert_eq!(
            text,
            "{\"type\":\"reload\"}\n{\"type\":\"goToPage\",\"page\":1}\n"
        );
    }

    #[test]
    fn line_reader_skips_blank_lines() {
        let input = Cursor::new("first\n\n   \nsecond\n");
        let rx = spawn_line_reader(input, "test");

        let first = rx.recv_timeout(Duration::from_secs(5)).expect("first");
        let second = rx.recv_timeout(Duration::from_secs(5)).expect("second");
        assert_eq!((first.as_str(), second.as_str()), ("first", "second"));
        assert!(rx.recv_timeout(Duration::from_secs(5)).is_err());
    }
}
