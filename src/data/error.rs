use std::fmt;

/// Failure talking to the remote data store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DataSourceError {
	/// The request could not be built or sent.
	Request(String),
	/// The store answered with a non-success status.
	Status { status: u16, body: String },
	/// The response body was not the expected JSON.
	Decode(String),
}

impl fmt::Display for DataSourceError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Request(msg) => write!(f, "request failed: {msg}"),
			Self::Status { status, body } => write!(f, "HTTP error {status}: {body}"),
			Self::Decode(msg) => write!(f, "unexpected response: {msg}"),
		}
	}
}

impl std::error::Error for DataSourceError {}

/// Outcome of a failed `load_records`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadError {
	Source(DataSourceError),
	/// The store answered but held no usable records.
	EmptyDataset,
}

impl fmt::Display for LoadError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Source(err) => write!(f, "Failed to load data: {err}"),
			Self::EmptyDataset => f.write_str("No records found in the data store"),
		}
	}
}

impl std::error::Error for LoadError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Self::Source(err) => Some(err),
			Self::EmptyDataset => None,
		}
	}
}

impl From<DataSourceError> for LoadError {
	fn from(err: DataSourceError) -> Self {
		Self::Source(err)
	}
}
