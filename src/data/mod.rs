//! Record model, value normalisation and ordering, filters, export, and the
//! remote data-store client.

mod error;
mod export;
mod filter;
mod normalize;
mod order;
mod record;
mod source;

pub use error::{DataSourceError, LoadError};
pub use export::{EXPORT_FILE_NAME, ExportSnapshot};
pub use filter::Filters;
pub use normalize::{normalize, normalize_str};
pub use order::{SCALE_UNITS, TIME_UNITS, ValueOrdering, locale_cmp, ordered_values};
pub use record::{ColumnKey, SystemRecord};
pub use source::{
	AirtableClient, LoadState, NewSystem, RecordPage, RemoteRecord, create_payload, parse_page,
};
