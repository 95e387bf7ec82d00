//! Error types and result definitions for stress runs.
//!
//! [`StressError`] carries a classification, a static description, optional dynamic detail
//! and source, the callsite and a captured backtrace.

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::error;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

/// Result type used throughout the crate.
pub type StressResult<T> = Result<T, StressError>;

/// Main error type of the stress driver.
///
/// Errors are cheap to clone, which lets a single failure be both logged and delivered to an
/// outcome sink.
#[derive(Debug, Clone)]
pub struct StressError {
    kind: ErrorKind,
    description: Cow<'static, str>,
    detail: Option<Cow<'static, str>>,
    source: Option<Arc<dyn error::Error + Send + Sync>>,
    location: &'static Location<'static>,
    backtrace: Arc<Backtrace>,
}

/// Categories of failures.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // Store connection and execution
    StoreConnectionFailed,
    StoreQueryFailed,

    // Schema
    KeyspaceMissing,
    KeyspaceAlreadyExists,
    TableAlreadyExists,
    SchemaError,

    // Data
    InvalidData,
    ConversionError,

    // Configuration
    ConfigError,

    // External commands
    CommandSpawnFailed,
    CommandIoFailed,
    CommandFailed,

    // Workers
    UnitOfWorkPanic,
    WorkerPoolClosed,

    #[cfg(feature = "failpoints")]
    InjectedFault,
}

impl StressError {
    /// Returns the [`ErrorKind`] of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the static description.
    pub fn description(&self) -> &str {
        self.description.as_ref()
    }

    /// Returns the dynamic detail, if any.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Returns the captured backtrace.
    pub fn backtrace(&self) -> &Backtrace {
        self.backtrace.as_ref()
    }

    /// Returns the callsite at which the error was created.
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    /// Attaches an originating error, exposed through [`error::Error::source`].
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        self.source = Some(Arc::new(source));
        self
    }

    #[track_caller]
    fn from_components(
        kind: ErrorKind,
        description: Cow<'static, str>,
        detail: Option<Cow<'static, str>>,
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    ) -> Self {
        StressError {
            kind,
            description,
            detail,
            source,
            location: Location::caller(),
            backtrace: Arc::new(Backtrace::capture()),
        }
    }
}

impl PartialEq for StressError {
    fn eq(&self, other: &StressError) -> bool {
        self.kind == other.kind
    }
}

impl fmt::Display for StressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let location = self.location;
        write!(
            f,
            "[{:?}] {} @ {}:{}:{}",
            self.kind,
            self.description,
            location.file(),
            location.line(),
            location.column()
        )?;

        write_detail(self.detail.as_deref(), f)?;
        write_backtrace(self.backtrace.as_ref(), f)
    }
}

impl error::Error for StressError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn error::Error + 'static))
    }
}

fn write_backtrace(backtrace: &Backtrace, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let rendered = backtrace.to_string();
    if rendered.trim().is_empty() {
        return Ok(());
    }

    write!(f, "\n  Backtrace:")?;
    for line in rendered.lines() {
        write!(f, "\n    {line}")?;
    }

    Ok(())
}

fn write_detail(detail: Option<&str>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let Some(detail) = detail else {
        return Ok(());
    };

    if detail.trim().is_empty() {
        return write!(f, "\n  Detail: <empty>");
    }

    write!(f, "\n  Detail:")?;
    for line in detail.lines() {
        write!(f, "\n    {line}")?;
    }

    Ok(())
}

impl From<(ErrorKind, &'static str)> for StressError {
    #[track_caller]
    fn from((kind, desc): (ErrorKind, &'static str)) -> StressError {
        StressError::from_components(kind, Cow::Borrowed(desc), None, None)
    }
}

impl<D> From<(ErrorKind, &'static str, D)> for StressError
where
    D: Into<Cow<'static, str>>,
{
    #[track_caller]
    fn from((kind, desc, detail): (ErrorKind, &'static str, D)) -> StressError {
        StressError::from_components(kind, Cow::Borrowed(desc), Some(detail.into()), None)
    }
}

/// Classifies store errors by SQLSTATE.
///
/// Errors without a SQLSTATE come from the connection itself.
impl From<tokio_postgres::Error> for StressError {
    #[track_caller]
    fn from(err: tokio_postgres::Error) -> StressError {
        use tokio_postgres::error::SqlState;

        let (kind, description) = match err.code() {
            Some(sqlstate) => match *sqlstate {
                SqlState::CONNECTION_EXCEPTION
                | SqlState::CONNECTION_DOES_NOT_EXIST
                | SqlState::CONNECTION_FAILURE
                | SqlState::SQLCLIENT_UNABLE_TO_ESTABLISH_SQLCONNECTION
                | SqlState::SQLSERVER_REJECTED_ESTABLISHMENT_OF_SQLCONNECTION
                | SqlState::TOO_MANY_CONNECTIONS => (
                    ErrorKind::StoreConnectionFailed,
                    "Store connection failed",
                ),

                SqlState::INVALID_CATALOG_NAME | SqlState::INVALID_SCHEMA_NAME => {
                    (ErrorKind::KeyspaceMissing, "Keyspace does not exist")
                }
                SqlState::DUPLICATE_DATABASE | SqlState::DUPLICATE_SCHEMA => {
                    (ErrorKind::KeyspaceAlreadyExists, "Keyspace already exists")
                }
                SqlState::DUPLICATE_TABLE => {
                    (ErrorKind::TableAlreadyExists, "Table already exists")
                }
                SqlState::UNDEFINED_TABLE | SqlState::UNDEFINED_COLUMN => {
                    (ErrorKind::SchemaError, "Store schema object not found")
                }

                SqlState::UNIQUE_VIOLATION
                | SqlState::NOT_NULL_VIOLATION
                | SqlState::CHECK_VIOLATION
                | SqlState::INTEGRITY_CONSTRAINT_VIOLATION => {
                    (ErrorKind::InvalidData, "Store constraint violation")
                }

                SqlState::DATA_EXCEPTION
                | SqlState::INVALID_TEXT_REPRESENTATION
                | SqlState::NUMERIC_VALUE_OUT_OF_RANGE
                | SqlState::DATATYPE_MISMATCH => {
                    (ErrorKind::ConversionError, "Store rejected a value")
                }

                SqlState::SYNTAX_ERROR | SqlState::INSUFFICIENT_PRIVILEGE => (
                    ErrorKind::StoreQueryFailed,
                    "Store syntax or access error",
                ),

                SqlState::QUERY_CANCELED => {
                    (ErrorKind::StoreQueryFailed, "Store operation canceled")
                }
                SqlState::OPERATOR_INTERVENTION
                | SqlState::ADMIN_SHUTDOWN
                | SqlState::CRASH_SHUTDOWN => (
                    ErrorKind::StoreConnectionFailed,
                    "Store is shutting down",
                ),

                _ => (ErrorKind::StoreQueryFailed, "Store statement failed"),
            },
            None => (
                ErrorKind::StoreConnectionFailed,
                "Store connection failed",
            ),
        };

        let detail = err.to_string();
        StressError::from_components(
            kind,
            Cow::Borrowed(description),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}
