//! Cursor contract exercised through the in-memory result.

mod common;

use bytes::Bytes;
use chrono::{FixedOffset, NaiveDate, NaiveDateTime};
use std::io::Read;

use shard_query_result::{
    Calendar, ColumnDescriptor, Error, ErrorKind, LobValue, MemoryQueryResult, Position,
    QueryResult, QueryResultExt, ResultMetadata, ResultOptions, SqlType, StreamKind, Value,
};

#[test]
fn test_people_scenario() {
    let mut result = common::people();
    assert_eq!(result.position(), Position::BeforeFirst);

    assert!(result.advance().unwrap());
    assert_eq!(result.get_value::<i32>(1).unwrap(), 1);
    assert!(!result.was_null().unwrap());
    assert_eq!(result.get_value::<String>(2).unwrap(), "a");
    assert_eq!(result.get_value::<Option<String>>(3).unwrap(), None);
    assert!(result.was_null().unwrap());
    // A null read into a non-optional target yields the empty value.
    assert_eq!(result.get_value::<String>(3).unwrap(), "");
    assert!(result.was_null().unwrap());

    assert!(result.advance().unwrap());
    assert_eq!(result.get_value::<i64>(1).unwrap(), 2);
    assert_eq!(result.get_value::<String>(3).unwrap(), "x");
    assert!(!result.was_null().unwrap());

    assert!(!result.advance().unwrap());
    assert_eq!(result.position(), Position::Exhausted);
    assert!(!result.advance().unwrap());
}

#[test]
fn test_state_errors() {
    let mut result = common::people();

    let err = result.get_value::<i32>(1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::State);
    assert!(matches!(
        err,
        Error::InvalidState {
            position: Position::BeforeFirst,
            ..
        }
    ));
    assert_eq!(result.was_null().unwrap_err().kind(), ErrorKind::State);

    assert!(result.advance().unwrap());
    assert!(matches!(result.was_null(), Err(Error::NoValueRead)));

    while result.advance().unwrap() {}
    assert_eq!(result.get_value::<i32>(1).unwrap_err().kind(), ErrorKind::State);
    assert_eq!(
        result
            .get_input_stream(2, StreamKind::Unicode)
            .unwrap_err()
            .kind(),
        ErrorKind::State
    );
}

#[test]
fn test_range_errors() {
    let mut result = common::people();
    assert!(result.advance().unwrap());

    assert!(matches!(
        result.get_value::<i32>(0),
        Err(Error::ColumnIndexOutOfBounds { index: 0, count: 3 })
    ));
    assert_eq!(result.get_value::<i32>(4).unwrap_err().kind(), ErrorKind::Range);
    assert_eq!(result.column_name(4).unwrap_err().kind(), ErrorKind::Range);
    assert_eq!(
        result.get_value_by_label::<i32>("missing").unwrap_err().kind(),
        ErrorKind::Range
    );
    // A failed read leaves the null flag untouched.
    assert!(matches!(result.was_null(), Err(Error::NoValueRead)));
}

#[test]
fn test_null_flag_survives_failed_conversion() {
    let mut result = common::people();
    assert!(result.advance().unwrap());
    assert_eq!(result.get_value::<Option<String>>(3).unwrap(), None);
    assert!(result.was_null().unwrap());
    assert_eq!(result.get_value::<bool>(2).unwrap_err().kind(), ErrorKind::Conversion);
    assert!(result.was_null().unwrap());
}

#[test]
fn test_metadata() {
    let result = common::people();
    assert_eq!(result.column_count(), 3);
    assert_eq!(result.table_name(1).unwrap(), "t_person");
    assert_eq!(result.column_name(2).unwrap(), "name");
    assert_eq!(result.column_label(2).unwrap(), "name");
    assert_eq!(result.column_type(1).unwrap(), SqlType::Integer.code());
    assert_eq!(result.column_type_name(2).unwrap(), "VARCHAR");
    assert_eq!(result.column_length(2).unwrap(), 32);
    assert!(result.is_signed(1).unwrap());
    assert!(!result.is_signed(2).unwrap());
    assert!(!result.is_nullable(1).unwrap());
    assert!(result.is_nullable(3).unwrap());
    assert!(!result.is_auto_increment(1).unwrap());
    assert_eq!(result.find_column("NOTE").unwrap(), 3);
}

#[test]
fn test_metadata_stable_after_close() {
    let mut result = common::people();
    assert!(result.advance().unwrap());
    result.close().unwrap();
    result.close().unwrap();

    assert!(result.is_closed());
    assert_eq!(result.column_count(), 3);
    assert_eq!(result.column_label(3).unwrap(), "note");
    assert!(matches!(
        result.advance(),
        Err(Error::CursorClosed {
            operation: "advance"
        })
    ));
    assert!(matches!(
        result.get_value::<i32>(1),
        Err(Error::CursorClosed { .. })
    ));
    assert_eq!(result.was_null().unwrap_err().kind(), ErrorKind::State);
}

#[test]
fn test_conversion_errors() {
    let mut result = common::people();
    assert!(result.advance().unwrap());

    let err = result.get_value::<i32>(2).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conversion);
    assert_eq!(result.get_value::<NaiveDate>(1).unwrap_err().kind(), ErrorKind::Conversion);
    // The cursor survives a conversion failure.
    assert_eq!(result.get_value::<u8>(1).unwrap(), 1);
    assert!(result.advance().unwrap());
}

#[test]
fn test_temporal_with_calendar() {
    let metadata = ResultMetadata::new(vec![
        ColumnDescriptor::new("created", SqlType::Timestamp),
        ColumnDescriptor::new("day", SqlType::Date),
    ]);
    let created: NaiveDateTime = "2024-10-21T12:00:00".parse().unwrap();
    let day = NaiveDate::from_ymd_opt(2024, 10, 21).unwrap();
    let mut result = MemoryQueryResult::new(metadata, vec![vec![created.into(), day.into()]])
        .unwrap()
        .with_options(ResultOptions::new().with_default_zone(FixedOffset::east_opt(7200).unwrap()));
    assert!(result.advance().unwrap());

    let in_default: chrono::DateTime<chrono::Utc> = result.get_value(1).unwrap();
    assert_eq!(in_default.to_rfc3339(), "2024-10-21T10:00:00+00:00");

    let tokyo: Calendar = "+09:00".parse().unwrap();
    let in_tokyo: chrono::DateTime<chrono::Utc> = result.get_calendar_value(1, &tokyo).unwrap();
    assert_eq!(in_tokyo.to_rfc3339(), "2024-10-21T03:00:00+00:00");

    let same_day: NaiveDate = result.get_calendar_value(2, &tokyo).unwrap();
    assert_eq!(same_day, day);
}

#[test]
fn test_streams() {
    let metadata = ResultMetadata::new(vec![
        ColumnDescriptor::new("body", SqlType::Clob),
        ColumnDescriptor::new("image", SqlType::Blob),
    ]);
    let rows = vec![
        vec![
            Value::Clob(LobValue::inline(Bytes::from("naïve"))),
            Value::Blob(LobValue::inline(Bytes::from_static(&[0, 1, 2]))),
        ],
        vec![Value::Null, Value::Null],
    ];
    let mut result = MemoryQueryResult::new(metadata, rows).unwrap();
    assert!(result.advance().unwrap());

    let unicode = result.get_input_stream(1, StreamKind::Unicode).unwrap();
    assert_eq!(&unicode.read_to_bytes().unwrap()[..], "naïve".as_bytes());
    let ascii = result.get_input_stream_by_tag(1, "Ascii").unwrap();
    assert_eq!(&ascii.read_to_bytes().unwrap()[..], b"na?ve");

    let mut binary = result.get_input_stream(2, StreamKind::Binary).unwrap();
    let mut buf = Vec::new();
    binary.read_to_end(&mut buf).unwrap();
    assert_eq!(buf, vec![0, 1, 2]);

    assert!(matches!(
        result.get_input_stream(2, StreamKind::Unicode),
        Err(Error::StreamTypeMismatch { column: 2, .. })
    ));
    assert!(matches!(
        result.get_input_stream_by_tag(1, "Utf16"),
        Err(Error::UnsupportedStreamKind { .. })
    ));

    assert!(result.advance().unwrap());
    let empty = result.get_input_stream(2, StreamKind::Binary).unwrap();
    assert!(result.was_null().unwrap());
    assert!(empty.read_to_bytes().unwrap().is_empty());
}

#[test]
fn test_stream_expires_on_advance() {
    let metadata = ResultMetadata::new(vec![ColumnDescriptor::new("image", SqlType::Blob)]);
    let rows = vec![
        vec![Value::Blob(LobValue::inline(Bytes::from_static(b"one")))],
        vec![Value::Blob(LobValue::inline(Bytes::from_static(b"two")))],
    ];
    let mut result = MemoryQueryResult::new(metadata, rows).unwrap();
    assert!(result.advance().unwrap());
    let stream = result.get_input_stream(1, StreamKind::Binary).unwrap();
    assert!(result.advance().unwrap());

    assert!(!stream.is_valid());
    let err = stream.read_to_bytes().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResourceExpired);
}

#[test]
fn test_load_from_another_result() {
    let mut source = common::people();
    assert!(source.advance().unwrap());

    let mut copy = MemoryQueryResult::load(&mut source).unwrap();
    assert_eq!(copy.remaining(), 1);
    assert_eq!(copy.metadata(), source.metadata());
    assert!(copy.advance().unwrap());
    assert_eq!(
        copy.row_values().unwrap(),
        vec![Value::from(2), Value::from("b"), Value::from("x")]
    );
}

#[test]
fn test_boxed_result() {
    let mut boxed: Box<dyn QueryResult> = Box::new(common::people());
    assert!(boxed.advance().unwrap());
    assert_eq!(boxed.get_value::<String>(2).unwrap(), "a");
    boxed.close().unwrap();
    assert!(boxed.is_closed());
}
