//! Listener that writes tailed lines to an output stream.
//!
//! Each line is written as `<path>\t<line>` or as a single JSON object,
//! depending on [`OutputFormat`]. Lifecycle events (open, close, rotate)
//! are reported through `tracing` only.

use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

use serde::Serialize;

use tailwatch_engine::{Listener, ListenerError};

use crate::cli::OutputFormat;

/// One tailed line in JSON output mode.
#[derive(Debug, Serialize)]
struct LineRecord<'a> {
    path: &'a str,
    line: &'a str,
}

/// Writes every tailed line to the wrapped writer.
pub struct OutputListener {
    format: OutputFormat,
    writer: Mutex<Box<dyn Write + Send>>,
}

impl OutputListener {
    /// Create a listener writing to the given writer.
    pub fn new(format: OutputFormat, writer: Box<dyn Write + Send>) -> Self {
        Self {
            format,
            writer: Mutex::new(writer),
        }
    }

    /// Create a listener writing to stdout.
    pub fn stdout(format: OutputFormat) -> Self {
        Self::new(format, Box::new(io::stdout()))
    }

    fn write_line(&self, path: &Path, line: &str) -> io::Result<()> {
        let path = path.to_string_lossy();
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| io::Error::other("output writer lock poisoned"))?;

        match self.format {
            OutputFormat::Text => writeln!(writer, "{path}\t{line}")?,
            OutputFormat::Json => {
                let record = LineRecord { path: &path, line };
                serde_json::to_writer(&mut *writer, &record).map_err(io::Error::other)?;
                writeln!(writer)?;
            }
        }
        writer.flush()
    }
}

impl Listener for OutputListener {
    fn on_open(&self, path: &Path) -> Result<(), ListenerError> {
        tracing::info!(path = %path.display(), "started tailing");
        Ok(())
    }

    fn on_close(&self, path: &Path) -> Result<(), ListenerError> {
        tracing::info!(path = %path.display(), "stopped tailing");
        Ok(())
    }

    fn on_rotate(&self, path: &Path) -> Result<(), ListenerError> {
        tracing::info!(path = %path.display(), "file rotated, waiting for rediscovery");
        Ok(())
    }

    fn on_read(&self, path: &Path, line: &str) -> Result<(), ListenerError> {
        self.write_line(path, line)
            .map_err(|e| ListenerError::Failed(format!("failed to write line: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn text_output_is_tab_separated() {
        let buffer = SharedBuffer::default();
        let listener = OutputListener::new(OutputFormat::Text, Box::new(buffer.clone()));

        listener.on_read(Path::new("/var/log/gc.log"), "GC(1) Pause").unwrap();
        listener.on_read(Path::new("/var/log/gc.log"), "").unwrap();

        assert_eq!(buffer.contents(), "/var/log/gc.log\tGC(1) Pause\n/var/log/gc.log\t\n");
    }

    #[test]
    fn json_output_escapes_content() {
        let buffer = SharedBuffer::default();
        let listener = OutputListener::new(OutputFormat::Json, Box::new(buffer.clone()));

        listener
            .on_read(Path::new("/var/log/app.log"), "say \"hi\"\tnow")
            .unwrap();

        let value: serde_json::Value = serde_json::from_str(buffer.contents().trim_end()).unwrap();
        assert_eq!(value["path"], "/var/log/app.log");
        assert_eq!(value["line"], "say \"hi\"\tnow");
    }

    #[test]
    fn lifecycle_events_write_nothing() {
        let buffer = SharedBuffer::default();
        let listener = OutputListener::new(OutputFormat::Text, Box::new(buffer.clone()));
        let path = Path::new("/var/log/gc.log");

        listener.on_open(path).unwrap();
        listener.on_rotate(path).unwrap();
        listener.on_close(path).unwrap();

        assert!(buffer.contents().is_empty());
    }
}
