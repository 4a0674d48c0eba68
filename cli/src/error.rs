/// Display global error message in unified format
#[derive(Debug, Clone)]
pub struct Error(String, Option<String>);

impl Error {
    pub fn new(message: &str, details: Option<&str>) -> Self {
        Error(message.to_string(), details.map(|d| d.to_string()))
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

/// Display the message and details, as sort of a hint
impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match &self.1 {
            Some(details) => write!(f, "{}\n\n{}", self.0, console::style(details).dim()),
            None => write!(f, "{}", self.0),
        }
    }
}

/// Implement std::error::Error trait for Error
impl std::error::Error for Error {}

/// Automatically convert all eyre error reports
///
/// A report wrapped with `Error` as context keeps the human-friendly message,
/// anything else is shown with its own description.
impl From<eyre::ErrReport> for Error {
    fn from(error: eyre::ErrReport) -> Self {
        log::error!("{error:?}");

        error
            .downcast::<Error>()
            .unwrap_or_else(|err| Error::new(&err.to_string(), None))
    }
}

#[cfg(test)]
mod tests {
    use super::Error;
    use eyre::WrapErr;

    #[test]
    fn keeps_wrapped_error_message() {
        let report = Err::<(), _>(eyre::eyre!("connection reset"))
            .wrap_err(Error::new("Network request failed", Some("Try again.")))
            .unwrap_err();

        assert_eq!(Error::from(report).message(), "Network request failed");
    }

    #[test]
    fn falls_back_to_report_description() {
        let error = Error::from(eyre::eyre!("Status is not 200"));
        assert_eq!(error.message(), "Status is not 200");
        assert_eq!(error.to_string(), "Status is not 200");
    }
}
