//! Large objects (CLOB, BLOB) and streams over them.
//!
//! A LOB cell reaches the cursor in one of two ways:
//! 1. **Inline**: the data travelled with the row (small LOBs, prefetched
//!    LOBs, or LOBs built in memory).
//! 2. **Locator**: only a backend handle arrived, and the data is pulled in
//!    chunks through a [`LobReader`] when a stream is read.
//!
//! A [`LobStream`] is only valid while its cursor stays on the row it was
//! opened for. Every read checks this and fails with `ResourceExpired`
//! once the cursor has moved on or been released.

use bytes::{Buf, Bytes};
use std::io::{self, Read};
use std::str::FromStr;

use crate::cursor::RowTicket;
use crate::error::{Error, Result};

/// Backend handle identifying a LOB that was not sent inline.
#[derive(Debug, Clone, PartialEq)]
pub struct LobLocator {
    /// Opaque locator bytes from the backend.
    pub locator: Bytes,
    /// Total size in bytes.
    pub size: u64,
    /// Preferred read size, 0 when the backend does not advertise one.
    pub chunk_size: u32,
}

impl LobLocator {
    /// Create a new LOB locator.
    pub fn new(locator: impl Into<Bytes>, size: u64, chunk_size: u32) -> Self {
        Self {
            locator: locator.into(),
            size,
            chunk_size,
        }
    }
}

/// LOB cell value: inline data, a locator, or both.
#[derive(Debug, Clone, PartialEq)]
pub struct LobValue {
    /// The backend locator, absent for LOBs built in memory.
    pub locator: Option<LobLocator>,
    /// Inline data. For CLOBs this is UTF-8 text.
    pub data: Option<Bytes>,
}

impl LobValue {
    /// Create a LOB value that only exists in memory.
    pub fn inline(data: impl Into<Bytes>) -> Self {
        Self {
            locator: None,
            data: Some(data.into()),
        }
    }

    /// Create a LOB value with prefetched data.
    pub fn with_data(locator: LobLocator, data: impl Into<Bytes>) -> Self {
        Self {
            locator: Some(locator),
            data: Some(data.into()),
        }
    }

    /// Create a LOB value with only a locator (data must be read separately).
    pub fn locator_only(locator: LobLocator) -> Self {
        Self {
            locator: Some(locator),
            data: None,
        }
    }

    /// Check if the data is available without a backend round-trip.
    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    /// Inline data as text, if present and valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        self.data
            .as_deref()
            .and_then(|d| std::str::from_utf8(d).ok())
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        match (&self.data, &self.locator) {
            (Some(data), _) => data.len() as u64,
            (None, Some(locator)) => locator.size,
            (None, None) => 0,
        }
    }
}

/// Chunked access to a LOB behind a locator.
pub trait LobReader: Send {
    /// Read up to `amount` bytes starting at byte `offset`.
    ///
    /// Returns an empty buffer at the end of the LOB.
    fn read(&mut self, offset: u64, amount: u32) -> Result<Bytes>;
}

/// Decoding mode of a LOB stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    /// Character data, non-ASCII characters replaced by `?`.
    Ascii,
    /// Character data as UTF-8.
    Unicode,
    /// Raw bytes.
    Binary,
}

impl StreamKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StreamKind::Ascii => "Ascii",
            StreamKind::Unicode => "Unicode",
            StreamKind::Binary => "Binary",
        }
    }
}

impl FromStr for StreamKind {
    type Err = Error;

    fn from_str(tag: &str) -> Result<Self> {
        [StreamKind::Ascii, StreamKind::Unicode, StreamKind::Binary]
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(tag))
            .ok_or_else(|| Error::UnsupportedStreamKind {
                tag: tag.to_string(),
            })
    }
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps one UTF-8 byte to its ASCII-stream form.
///
/// Stateless per byte so it works across chunk boundaries: a leading byte
/// becomes `?`, continuation bytes are dropped.
fn ascii_byte(b: u8) -> Option<u8> {
    match b {
        0x00..=0x7f => Some(b),
        0x80..=0xbf => None,
        _ => Some(b'?'),
    }
}

enum Source {
    Buffered(Bytes),
    Chunked {
        reader: Box<dyn LobReader>,
        offset: u64,
        size: u64,
        chunk_size: u32,
        pending: Bytes,
    },
}

/// Readable stream over one LOB cell.
pub struct LobStream {
    column: usize,
    kind: StreamKind,
    tickets: Vec<RowTicket>,
    source: Source,
}

impl LobStream {
    /// Stream over data already in memory.
    pub fn buffered(column: usize, kind: StreamKind, ticket: RowTicket, data: Bytes) -> Self {
        let data = if kind == StreamKind::Ascii && !data.is_ascii() {
            data.iter().copied().filter_map(ascii_byte).collect::<Vec<u8>>().into()
        } else {
            data
        };
        Self {
            column,
            kind,
            tickets: vec![ticket],
            source: Source::Buffered(data),
        }
    }

    /// Stream that pulls chunks from a backend reader on demand.
    pub fn chunked(
        column: usize,
        kind: StreamKind,
        ticket: RowTicket,
        reader: Box<dyn LobReader>,
        size: u64,
        chunk_size: u32,
    ) -> Self {
        Self {
            column,
            kind,
            tickets: vec![ticket],
            source: Source::Chunked {
                reader,
                offset: 0,
                size,
                chunk_size: chunk_size.max(1),
                pending: Bytes::new(),
            },
        }
    }

    /// Tie the stream to an additional cursor, e.g. a decorating result.
    pub fn bind(mut self, ticket: RowTicket) -> Self {
        self.tickets.push(ticket);
        self
    }

    /// 1-based index of the column this stream reads.
    pub fn column(&self) -> usize {
        self.column
    }

    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    /// Whether the owning cursor is still on the stream's row.
    pub fn is_valid(&self) -> bool {
        self.check().is_ok()
    }

    fn check(&self) -> Result<()> {
        for ticket in &self.tickets {
            ticket.check().map_err(|reason| Error::ResourceExpired {
                column: self.column,
                reason,
            })?;
        }
        Ok(())
    }

    /// Read the rest of the stream.
    pub fn read_to_bytes(mut self) -> Result<Bytes> {
        self.check()?;
        if let Source::Buffered(data) = &mut self.source {
            return Ok(std::mem::take(data));
        }
        let mut out = Vec::new();
        self.read_to_end(&mut out).map_err(Error::from_io)?;
        Ok(out.into())
    }

    fn needs_chunk(&self) -> bool {
        matches!(
            &self.source,
            Source::Chunked { pending, offset, size, .. } if pending.is_empty() && offset < size
        )
    }

    fn pending_mut(&mut self) -> &mut Bytes {
        match &mut self.source {
            Source::Buffered(data) => data,
            Source::Chunked { pending, .. } => pending,
        }
    }

    fn next_chunk(&mut self) -> Result<()> {
        let Source::Chunked {
            reader,
            offset,
            size,
            chunk_size,
            pending,
        } = &mut self.source
        else {
            return Ok(());
        };
        let amount = (*chunk_size as u64).min(*size - *offset) as u32;
        let chunk = reader.read(*offset, amount)?;
        if chunk.is_empty() {
            // Backend reported the end before the advertised size.
            *size = *offset;
            return Ok(());
        }
        *offset += chunk.len() as u64;
        *pending = if self.kind == StreamKind::Ascii {
            chunk.iter().copied().filter_map(ascii_byte).collect::<Vec<u8>>().into()
        } else {
            chunk
        };
        Ok(())
    }
}

impl Read for LobStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.check().map_err(Error::into_io)?;
        if buf.is_empty() {
            return Ok(0);
        }
        // An ASCII chunk can filter down to nothing, so keep pulling.
        while self.needs_chunk() {
            self.next_chunk().map_err(Error::into_io)?;
        }
        let pending = self.pending_mut();
        let n = pending.len().min(buf.len());
        buf[..n].copy_from_slice(&pending[..n]);
        pending.advance(n);
        Ok(n)
    }
}

impl std::fmt::Debug for LobStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = match &self.source {
            Source::Buffered(data) => format!("buffered({} bytes left)", data.len()),
            Source::Chunked { offset, size, .. } => format!("chunked({}/{})", offset, size),
        };
        f.debug_struct("LobStream")
            .field("column", &self.column)
            .field("kind", &self.kind)
            .field("source", &mode)
            .finish()
    }
}
