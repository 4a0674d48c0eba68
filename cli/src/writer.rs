use crate::error::Error;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Destination of the written bytes
#[derive(Clone)]
pub(crate) enum Sink {
    Stdout,
    Stderr,

    /// Swallow everything, used while the output is intercepted
    Null,

    #[cfg(test)]
    Buffer(Arc<Mutex<Vec<u8>>>),
}

impl Sink {
    fn write(&self, output: &str) -> std::io::Result<()> {
        match self {
            Sink::Stdout => {
                let mut stdout = std::io::stdout();
                stdout.write_all(output.as_bytes())?;
                stdout.flush()
            }
            Sink::Stderr => std::io::stderr().write_all(output.as_bytes()),
            Sink::Null => Ok(()),
            #[cfg(test)]
            Sink::Buffer(buffer) => {
                buffer
                    .lock()
                    .map_err(|_| std::io::Error::other("Output buffer is poisoned"))?
                    .extend_from_slice(output.as_bytes());

                Ok(())
            }
        }
    }
}

/// Write all stdout/stderr outputs in the app
///
/// The handle is shared: every clone writes into the same primary sink, so the
/// deployment engine and the setup steps see the same stream. The primary sink
/// can be temporarily swapped out with [`Writer::intercept`].
#[derive(Clone)]
pub(crate) struct Writer {
    primary: Arc<Mutex<Sink>>,
    errors: Sink,
    is_intercepted: Arc<AtomicBool>,
}

impl Writer {
    pub(crate) fn new(primary: Sink, errors: Sink) -> Self {
        Writer {
            primary: Arc::new(Mutex::new(primary)),
            errors,
            is_intercepted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The real terminal streams
    pub(crate) fn stdio() -> Self {
        Self::new(Sink::Stdout, Sink::Stderr)
    }

    /// Output plain text into the primary stream
    pub(crate) fn text(&self, output: &str) -> Result<(), Error> {
        let sink = self.primary.lock().map_err(|_| output_error())?.clone();
        Self::write(&sink, output)
    }

    /// Output plain text in stderr
    ///
    /// Never intercepted, errors always reach the user.
    pub(crate) fn error(&self, output: &str) -> Result<(), Error> {
        Self::write(&self.errors, output)
    }

    #[cfg(test)]
    pub(crate) fn is_intercepted(&self) -> bool {
        self.is_intercepted.load(Ordering::SeqCst)
    }

    /// Suppress everything written into the primary stream until the returned guard is dropped
    ///
    /// The guard hands out the original sink, so the output can still reach the
    /// terminal through a dedicated channel. Only one interception can be active.
    pub(crate) fn intercept(&self) -> Result<Interception, Error> {
        if self
            .is_intercepted
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            log::error!("Attempted to intercept the output twice");

            return Err(Error::new(
                "Output is already intercepted",
                Some("Please report a bug at https://github.com/serverless/serverless/issues"),
            ));
        }

        let mut primary = match self.primary.lock() {
            Ok(primary) => primary,
            Err(_) => {
                self.is_intercepted.store(false, Ordering::SeqCst);
                return Err(output_error());
            }
        };

        let original = std::mem::replace(&mut *primary, Sink::Null);
        log::debug!("Primary output intercepted");

        Ok(Interception {
            writer: self.clone(),
            original,
        })
    }

    /// General method for writing to a sink
    fn write(sink: &Sink, output: &str) -> Result<(), Error> {
        sink.write(output).map_err(|e| {
            log::error!("Error while writing to std*: {e:?}");
            output_error()
        })
    }
}

fn output_error() -> Error {
    Error::new(
        "Output error",
        Some("Please report a bug at https://github.com/serverless/serverless/issues"),
    )
}

/// Active interception of the primary output
///
/// Restores the original sink when dropped, on every exit path.
pub(crate) struct Interception {
    writer: Writer,
    original: Sink,
}

impl Interception {
    /// A writer bypassing the interception
    pub(crate) fn original(&self) -> OriginalWriter {
        OriginalWriter(self.original.clone())
    }
}

impl Drop for Interception {
    fn drop(&mut self) {
        match self.writer.primary.lock() {
            Ok(mut primary) => *primary = self.original.clone(),

            // Still put the sink back, a poisoned lock only means another writer panicked
            Err(poisoned) => *poisoned.into_inner() = self.original.clone(),
        }

        self.writer.is_intercepted.store(false, Ordering::SeqCst);
        log::debug!("Primary output restored");
    }
}

/// The sink captured at the start of an interception
#[derive(Clone)]
pub(crate) struct OriginalWriter(Sink);

impl OriginalWriter {
    pub(crate) fn text(&self, output: &str) -> Result<(), Error> {
        Writer::write(&self.0, output)
    }
}

#[cfg(test)]
pub(crate) fn buffer() -> (Writer, Arc<Mutex<Vec<u8>>>, Arc<Mutex<Vec<u8>>>) {
    let output = Arc::new(Mutex::new(Vec::new()));
    let errors = Arc::new(Mutex::new(Vec::new()));

    (
        Writer::new(Sink::Buffer(output.clone()), Sink::Buffer(errors.clone())),
        output,
        errors,
    )
}

#[cfg(test)]
pub(crate) fn contents(buffer: &Arc<Mutex<Vec<u8>>>) -> String {
    String::from_utf8_lossy(&buffer.lock().unwrap()).into_owned()
}
