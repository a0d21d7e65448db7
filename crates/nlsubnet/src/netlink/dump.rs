//! Multi-part dump decoding.
//!
//! A dump reply arrives as one or more chunks, each holding zero or more
//! netlink messages, and ends with `NLMSG_DONE`. [`DumpDecoder`] is the
//! explicit state machine over one such exchange; it never touches a socket,
//! so tests drive it with synthetic chunks. [`run_dump`] wires it to any
//! [`ChunkSource`].
//!
//! ```text
//! AwaitingFirstChunk -> ScanningChunk <-> AwaitingNextChunk
//!                            |
//!                            v
//!                          Done            (Failed from any state)
//! ```

use std::future::Future;

use tracing::{debug, trace, warn};

use super::cursor::ByteCursor;
use super::error::{Error, Result};
use super::message::{MessageIter, NLMSG_HDRLEN, NlMsgError, NlMsgType};
use super::messages::DecodedRecord;
use super::request::Request;

/// Where a dump exchange stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpState {
    /// Request sent, nothing received yet.
    AwaitingFirstChunk,
    /// Walking the messages of a chunk.
    ScanningChunk,
    /// Chunk exhausted without a terminator.
    AwaitingNextChunk,
    /// Terminator seen.
    Done,
    /// A decode or kernel error ended the exchange.
    Failed,
}

impl DumpState {
    /// Get the state name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AwaitingFirstChunk => "awaiting-first-chunk",
            Self::ScanningChunk => "scanning-chunk",
            Self::AwaitingNextChunk => "awaiting-next-chunk",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

/// Sanity bounds on a single dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DumpLimits {
    /// Maximum number of chunks to read.
    pub max_chunks: usize,
    /// Maximum number of records to yield.
    pub max_records: usize,
}

impl Default for DumpLimits {
    fn default() -> Self {
        Self {
            max_chunks: 4096,
            max_records: 65536,
        }
    }
}

impl DumpLimits {
    /// Set the chunk bound.
    pub fn with_max_chunks(mut self, max_chunks: usize) -> Self {
        self.max_chunks = max_chunks;
        self
    }

    /// Set the record bound.
    pub fn with_max_records(mut self, max_records: usize) -> Self {
        self.max_records = max_records;
        self
    }
}

/// Counters for a finished dump.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DumpSummary {
    /// Chunks fed to the decoder.
    pub chunks: usize,
    /// Records passed to the sink.
    pub records: usize,
    /// The kernel flagged the dump as interrupted by a concurrent change.
    pub interrupted: bool,
}

/// State machine decoding one dump reply.
#[derive(Debug)]
pub struct DumpDecoder {
    seq: u32,
    limits: DumpLimits,
    state: DumpState,
    summary: DumpSummary,
}

impl DumpDecoder {
    /// Create a decoder expecting replies to sequence number `seq`.
    pub fn new(seq: u32, limits: DumpLimits) -> Self {
        Self {
            seq,
            limits,
            state: DumpState::AwaitingFirstChunk,
            summary: DumpSummary::default(),
        }
    }

    /// Current state.
    pub fn state(&self) -> DumpState {
        self.state
    }

    /// Counters so far.
    pub fn summary(&self) -> DumpSummary {
        self.summary
    }

    /// Feed one received chunk, passing decoded records to `sink`.
    ///
    /// Returns the state after the chunk: `Done` once the terminator was
    /// seen, `AwaitingNextChunk` when more chunks are needed. Any error moves
    /// the decoder to `Failed`.
    pub fn feed<F>(&mut self, chunk: &[u8], sink: &mut F) -> Result<DumpState>
    where
        F: FnMut(DecodedRecord),
    {
        match self.state {
            DumpState::AwaitingFirstChunk | DumpState::AwaitingNextChunk => {}
            other => return Err(Error::InvalidState(other.name())),
        }

        self.state = DumpState::ScanningChunk;
        match self.scan(chunk, sink) {
            Ok(next) => {
                self.state = next;
                Ok(next)
            }
            Err(e) => {
                self.state = DumpState::Failed;
                Err(e)
            }
        }
    }

    fn scan<F>(&mut self, chunk: &[u8], sink: &mut F) -> Result<DumpState>
    where
        F: FnMut(DecodedRecord),
    {
        self.summary.chunks += 1;
        if self.summary.chunks > self.limits.max_chunks {
            return Err(Error::DumpTooLarge {
                what: "chunks",
                limit: self.limits.max_chunks,
            });
        }
        if chunk.is_empty() {
            return Err(Error::Truncated {
                expected: NLMSG_HDRLEN,
                actual: 0,
            });
        }

        for result in MessageIter::new(chunk) {
            let (header, payload) = result?;

            if header.nlmsg_seq != self.seq {
                trace!(
                    seq = header.nlmsg_seq,
                    expected = self.seq,
                    "skipping stale message"
                );
                continue;
            }

            if header.is_dump_interrupted() && !self.summary.interrupted {
                warn!(seq = self.seq, "dump interrupted, results may be inconsistent");
                self.summary.interrupted = true;
            }

            match header.nlmsg_type {
                NlMsgType::DONE => {
                    // Kernels report a dump that failed partway in the DONE payload.
                    match ByteCursor::new(payload).read_header::<i32>() {
                        Ok(code) if code < 0 => return Err(Error::from_errno(code)),
                        _ => return Ok(DumpState::Done),
                    }
                }
                NlMsgType::ERROR => {
                    let err = NlMsgError::from_bytes(payload)?;
                    if !err.is_ack() {
                        return Err(Error::from_errno(err.error));
                    }
                }
                NlMsgType::NOOP => {}
                NlMsgType::OVERRUN => {
                    return Err(Error::InvalidMessage(
                        "kernel reported a receive buffer overrun".into(),
                    ));
                }
                msg_type => match DecodedRecord::decode(msg_type, payload)? {
                    Some(record) => {
                        if self.summary.records >= self.limits.max_records {
                            return Err(Error::DumpTooLarge {
                                what: "records",
                                limit: self.limits.max_records,
                            });
                        }
                        self.summary.records += 1;
                        sink(record);
                    }
                    None => trace!(msg_type, "skipping message"),
                },
            }
        }

        Ok(DumpState::AwaitingNextChunk)
    }
}

/// A transport delivering dump reply chunks.
///
/// [`NetlinkSocket`](super::socket::NetlinkSocket) is the real one; tests
/// script their own.
pub trait ChunkSource {
    /// Allocate the next sequence number.
    fn next_seq(&mut self) -> u32;

    /// Port id stamped into outgoing requests.
    fn port_id(&self) -> u32;

    /// Send one complete request.
    fn send(&mut self, msg: &[u8]) -> impl Future<Output = Result<()>>;

    /// Receive the next chunk.
    fn recv_chunk(&mut self) -> impl Future<Output = Result<&[u8]>>;
}

/// Send `request` once and decode the reply until the terminator.
pub async fn run_dump<S, F>(
    source: &mut S,
    request: &Request,
    limits: DumpLimits,
    mut sink: F,
) -> Result<DumpSummary>
where
    S: ChunkSource,
    F: FnMut(DecodedRecord),
{
    let seq = source.next_seq();
    let msg = request.encode(seq, source.port_id());
    debug!(kind = request.kind(), seq, len = msg.len(), "sending request");
    source.send(&msg).await?;

    let mut decoder = DumpDecoder::new(seq, limits);
    loop {
        let chunk = source.recv_chunk().await?;
        trace!(len = chunk.len(), "received chunk");
        if decoder.feed(chunk, &mut sink)? == DumpState::Done {
            break;
        }
    }

    let summary = decoder.summary();
    debug!(
        kind = request.kind(),
        chunks = summary.chunks,
        records = summary.records,
        "dump complete"
    );
    Ok(summary)
}
