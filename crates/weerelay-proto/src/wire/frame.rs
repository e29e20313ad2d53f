//! Frame extraction (panic-free, incremental).
//!
//! The stream is a sequence of `[u32 BE length][u8 flag][body]` units, where
//! `length` counts the flag byte plus the body. The reader accumulates
//! arbitrarily-chunked input and emits one `Frame` per complete unit,
//! retaining trailing partial bytes for the next feed. Flag `1` means the
//! body is zlib-compressed and is fully expanded before handoff.
//!
//! Error discipline: a bad header resynchronizes on the next plausible frame
//! start; a corrupt compressed body drops that frame only. Neither aborts
//! the stream.

use bytes::Bytes;

use crate::error::{RelayError, Result};

/// Wire size of the length prefix.
const LEN_PREFIX: usize = 4;

/// Default cap on a single frame's declared length.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

/// One length-delimited unit of the stream, with the body already expanded.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Declared wire length (flag byte + on-wire body).
    pub length: u32,
    /// Whether the body arrived zlib-compressed.
    pub compressed: bool,
    /// The message body, after decompression when `compressed`.
    pub payload: Bytes,
}

/// Incremental frame reader.
///
/// Feed it bytes as they arrive, then drain complete frames in a loop. The
/// reader is restartable across reconnects via [`FrameReader::reset`], but
/// never across partial-frame state.
#[derive(Debug)]
pub struct FrameReader {
    max_frame_bytes: usize,
    buffer: Vec<u8>,
}

impl FrameReader {
    pub fn new(max_frame_bytes: usize) -> FrameReader {
        FrameReader {
            max_frame_bytes,
            buffer: Vec::new(),
        }
    }

    /// Append raw transport bytes. No minimum chunking is assumed.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Bytes currently buffered (partial frame remainder included).
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Discard all buffered state. Used when the transport reconnects.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Try to extract the next complete frame.
    ///
    /// `Ok(None)` means more data is required. `Err` reports a frame-local
    /// failure after which the reader has already repositioned itself; the
    /// caller should keep draining.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        let Some((length, flag)) = header_at(&self.buffer, 0) else {
            return Ok(None);
        };

        if length < 1 || length > self.max_frame_bytes {
            let dropped = self.resync();
            return Err(RelayError::Frame(format!(
                "implausible frame length {length}, dropped {dropped} bytes"
            )));
        }

        let total = LEN_PREFIX + length;
        if self.buffer.len() < total {
            return Ok(None);
        }
        let Some(flag) = flag else {
            // total >= 5 and buffer >= total, so the flag byte is present.
            return Ok(None);
        };

        if flag > 1 {
            // Length was plausible, so the end of this frame is the next
            // plausible frame start.
            self.consume(total);
            return Err(RelayError::Frame(format!("unknown compression flag {flag}")));
        }

        let body = self
            .buffer
            .get(LEN_PREFIX + 1..total)
            .map(<[u8]>::to_vec)
            .unwrap_or_default();
        self.consume(total);

        let payload = if flag == 1 {
            inflate(&body)?
        } else {
            body
        };

        Ok(Some(Frame {
            length: length as u32,
            compressed: flag == 1,
            payload: Bytes::from(payload),
        }))
    }

    /// Drop at least one byte, then keep dropping until a plausible header
    /// (in-range length, valid flag) starts the buffer or too little data
    /// remains to judge. Returns the number of bytes dropped.
    fn resync(&mut self) -> usize {
        let mut off = 1;
        loop {
            match header_at(&self.buffer, off) {
                None => break,
                Some((len, flag)) => {
                    let len_ok = len >= 1 && len <= self.max_frame_bytes;
                    let flag_ok = matches!(flag, None | Some(0) | Some(1));
                    if len_ok && flag_ok {
                        break;
                    }
                    off += 1;
                }
            }
        }
        let off = off.min(self.buffer.len());
        self.consume(off);
        tracing::debug!(dropped = off, "frame resync");
        off
    }

    /// Drop `n` leading bytes, compacting the remainder to the front.
    fn consume(&mut self, n: usize) {
        let len = self.buffer.len();
        self.buffer.copy_within(n..len, 0);
        self.buffer.truncate(len - n);
    }
}

/// Peek `[length, flag?]` at `off` without consuming. `None` when fewer than
/// 4 bytes are available there.
fn header_at(buf: &[u8], off: usize) -> Option<(usize, Option<u8>)> {
    let len_bytes: [u8; 4] = buf.get(off..off + LEN_PREFIX)?.try_into().ok()?;
    let length = u32::from_be_bytes(len_bytes) as usize;
    let flag = buf.get(off + LEN_PREFIX).copied();
    Some((length, flag))
}

fn inflate(body: &[u8]) -> Result<Vec<u8>> {
    use std::io::Read;

    let mut out = Vec::with_capacity(body.len().saturating_mul(4));
    let mut decoder = flate2::read::ZlibDecoder::new(body);
    decoder
        .read_to_end(&mut out)
        .map_err(|e| RelayError::Decompress(e.to_string()))?;
    Ok(out)
}
