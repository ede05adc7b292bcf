//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use bytes::Bytes;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use shard_query_result::{
    ColumnDescriptor, Error, FetchBatch, LobLocator, LobReader, MemoryQueryResult, NativeCell,
    NativeColumn, NativeRow, NativeType, ResultMetadata, Result, RowSource, SqlType, Value,
};

/// NUMBER encodings used across the tests.
pub const NUM_1: &[u8] = &[0xc1, 0x02];
pub const NUM_2: &[u8] = &[0xc1, 0x03];
pub const NUM_42: &[u8] = &[0xc1, 0x2b];
pub const NUM_123_45: &[u8] = &[0xc2, 0x02, 0x18, 0x2e];
/// DATE 2024-10-21 12:36:05.
pub const DATE_2024_10_21: &[u8] = &[0x78, 0x7c, 0x0a, 0x15, 0x0d, 0x25, 0x06];

pub fn data(bytes: &[u8]) -> NativeCell {
    NativeCell::Data(Bytes::copy_from_slice(bytes))
}

pub fn text(s: &str) -> NativeCell {
    NativeCell::Data(Bytes::copy_from_slice(s.as_bytes()))
}

pub fn utf16be(s: &str) -> Bytes {
    s.encode_utf16().flat_map(u16::to_be_bytes).collect::<Vec<u8>>().into()
}

/// Two rows over three columns: `id` integer, `name` text, `note`
/// nullable text.
pub fn people() -> MemoryQueryResult {
    let metadata = ResultMetadata::new(vec![
        ColumnDescriptor::new("id", SqlType::Integer)
            .with_table("t_person")
            .with_nullable(false),
        ColumnDescriptor::new("name", SqlType::Varchar)
            .with_table("t_person")
            .with_length(32),
        ColumnDescriptor::new("note", SqlType::Varchar).with_table("t_person"),
    ]);
    let rows = vec![
        vec![Value::from(1), Value::from("a"), Value::Null],
        vec![Value::from(2), Value::from("b"), Value::from("x")],
    ];
    MemoryQueryResult::new(metadata, rows).expect("valid rows")
}

/// Reader over LOB contents stored by locator bytes.
pub struct MapLobReader {
    data: Bytes,
    reads: Arc<AtomicUsize>,
}

impl LobReader for MapLobReader {
    fn read(&mut self, offset: u64, amount: u32) -> Result<Bytes> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let start = (offset as usize).min(self.data.len());
        let end = (start + amount as usize).min(self.data.len());
        Ok(self.data.slice(start..end))
    }
}

/// Scripted backend statement.
pub struct FakeSource {
    pub columns: Vec<NativeColumn>,
    pub rows: VecDeque<NativeRow>,
    pub lobs: HashMap<Vec<u8>, Bytes>,
    pub fail_on_fetch: Option<usize>,
    pub fetches: usize,
    pub closes: Arc<AtomicUsize>,
    pub lob_reads: Arc<AtomicUsize>,
}

impl FakeSource {
    pub fn new(columns: Vec<NativeColumn>, rows: Vec<NativeRow>) -> Self {
        Self {
            columns,
            rows: rows.into(),
            lobs: HashMap::new(),
            fail_on_fetch: None,
            fetches: 0,
            closes: Arc::new(AtomicUsize::new(0)),
            lob_reads: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Register LOB contents and return a locator cell pointing at them.
    pub fn add_lob(&mut self, key: &[u8], contents: impl Into<Bytes>, chunk_size: u32) -> NativeCell {
        let contents = contents.into();
        let locator = LobLocator::new(key.to_vec(), contents.len() as u64, chunk_size);
        self.lobs.insert(key.to_vec(), contents);
        NativeCell::Lob {
            locator,
            prefetched: None,
        }
    }
}

impl RowSource for FakeSource {
    fn describe(&self) -> &[NativeColumn] {
        &self.columns
    }

    fn fetch(&mut self, max_rows: u32) -> Result<FetchBatch> {
        self.fetches += 1;
        if self.fail_on_fetch == Some(self.fetches) {
            return Err(Error::Backend {
                code: 1013,
                message: "user requested cancel of current operation".into(),
            });
        }
        let n = (max_rows as usize).min(self.rows.len());
        Ok(FetchBatch {
            rows: self.rows.drain(..n).collect(),
            more_rows: !self.rows.is_empty(),
        })
    }

    fn open_lob(&mut self, locator: &LobLocator) -> Result<Box<dyn LobReader>> {
        let data = self
            .lobs
            .get(&locator.locator[..])
            .cloned()
            .ok_or_else(|| Error::data_access("unknown LOB locator"))?;
        Ok(Box::new(MapLobReader {
            data,
            reads: self.lob_reads.clone(),
        }))
    }

    fn close(&mut self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Order table: ID NUMBER(9), AMOUNT NUMBER(10,2), CREATED DATE, NOTE VARCHAR2.
pub fn order_columns() -> Vec<NativeColumn> {
    vec![
        NativeColumn::new(
            "ID",
            NativeType::Number {
                precision: 9,
                scale: 0,
            },
        )
        .with_table("T_ORDER")
        .with_nullable(false)
        .with_identity(true),
        NativeColumn::new(
            "AMOUNT",
            NativeType::Number {
                precision: 10,
                scale: 2,
            },
        )
        .with_table("T_ORDER"),
        NativeColumn::new("CREATED", NativeType::Date).with_table("T_ORDER"),
        NativeColumn::new("NOTE", NativeType::Varchar2 { max_size: 100 }).with_table("T_ORDER"),
    ]
}

pub fn order_rows() -> Vec<NativeRow> {
    vec![
        vec![data(NUM_1), data(NUM_123_45), data(DATE_2024_10_21), text("first")],
        vec![data(NUM_2), NativeCell::Null, data(DATE_2024_10_21), NativeCell::Null],
        vec![data(NUM_42), data(NUM_1), NativeCell::Null, text("last")],
    ]
}
