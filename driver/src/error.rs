use std::backtrace::Backtrace;
use std::error::Error;
use std::fmt;

use stress::error::StressError;

/// Returns whether terminal output should include backtraces.
fn should_render_backtrace() -> bool {
    matches!(
        std::env::var("RUST_BACKTRACE").as_deref(),
        Ok("1") | Ok("full")
    )
}

/// Result type for driver operations.
pub type DriverResult<T> = Result<T, DriverError>;

/// Backtrace captured when a driver error is created.
pub struct CapturedBacktrace(Backtrace);

impl CapturedBacktrace {
    fn capture() -> Self {
        Self(Backtrace::capture())
    }
}

impl fmt::Debug for CapturedBacktrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fatal errors of the driver.
///
/// Only setup failures end up here: failures of individual writes or of the migration command
/// are outcomes of the run, not errors of the driver.
#[derive(Debug)]
pub enum DriverError {
    /// Provisioning, connection or pool setup failure.
    Stress(StressError),
    /// Invalid or unreadable configuration, or tracing setup failure.
    Config(Box<dyn Error + Send + Sync>, CapturedBacktrace),
    /// Runtime setup failure.
    Io(std::io::Error, CapturedBacktrace),
}

impl DriverError {
    /// Returns a short category label for this error.
    pub fn category(&self) -> &'static str {
        match self {
            DriverError::Stress(_) => "stress run error",
            DriverError::Config(_, _) => "configuration error",
            DriverError::Io(_, _) => "i/o error",
        }
    }

    pub fn backtrace(&self) -> Option<&Backtrace> {
        match self {
            DriverError::Stress(err) => Some(err.backtrace()),
            DriverError::Config(_, backtrace) => Some(&backtrace.0),
            DriverError::Io(_, backtrace) => Some(&backtrace.0),
        }
    }

    /// Creates a configuration error from any error.
    pub fn config<E: Error + Send + Sync + 'static>(err: E) -> Self {
        DriverError::Config(Box::new(err), CapturedBacktrace::capture())
    }

    /// Returns a report of the error for terminal output.
    pub fn render_report(&self) -> String {
        let mut out = String::new();
        out.push_str("stress driver failed\n");
        out.push_str(&format!("category: {}\n", self.category()));
        out.push_str(&format!("error: {self}\n"));

        let mut source = Error::source(self);
        let mut index = 1usize;
        while let Some(err) = source {
            out.push_str(&format!("cause {index}: {err}\n"));
            source = err.source();
            index += 1;
        }

        if should_render_backtrace()
            && let Some(backtrace) = self.backtrace()
        {
            out.push_str("backtrace:\n");
            out.push_str(&backtrace.to_string());
            if !out.ends_with('\n') {
                out.push('\n');
            }
        }

        out
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverError::Stress(err) => write!(f, "{err}"),
            DriverError::Config(source, _) => write!(f, "configuration error: {source}"),
            DriverError::Io(source, _) => write!(f, "i/o error: {source}"),
        }
    }
}

impl Error for DriverError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DriverError::Stress(err) => err.source(),
            DriverError::Config(source, _) => Some(source.as_ref()),
            DriverError::Io(source, _) => Some(source),
        }
    }
}

impl From<std::io::Error> for DriverError {
    fn from(err: std::io::Error) -> Self {
        DriverError::Io(err, CapturedBacktrace::capture())
    }
}

impl From<StressError> for DriverError {
    fn from(err: StressError) -> Self {
        DriverError::Stress(err)
    }
}

#[cfg(test)]
mod tests {
    use stress::error::ErrorKind;

    use super::*;

    #[test]
    fn report_lists_category_and_causes() {
        let io = std::io::Error::other("disk unplugged");
        let err = DriverError::from(io);
        let report = err.render_report();

        assert!(report.starts_with("stress driver failed\ncategory: i/o error\n"));
        assert!(report.contains("error: i/o error: disk unplugged"));
        assert!(report.contains("cause 1: disk unplugged"));
    }

    #[test]
    fn stress_errors_keep_their_kind() {
        let err = DriverError::from(StressError::from((
            ErrorKind::StoreConnectionFailed,
            "Store connection failed",
        )));

        assert_eq!(err.category(), "stress run error");
        assert!(matches!(
            err,
            DriverError::Stress(ref inner) if inner.kind() == ErrorKind::StoreConnectionFailed
        ));
    }
}
