//! Column metadata, cell values and large objects.

mod calendar;
mod column;
mod lob;
mod sql_type;
mod value;

pub use calendar::Calendar;
pub use column::{ColumnDescriptor, ResultMetadata};
pub use lob::{LobLocator, LobReader, LobStream, LobValue, StreamKind};
pub use sql_type::{SqlType, SQL_TYPE_VOCABULARY_VERSION};
pub use value::Value;
