use std::fmt;
use std::sync::{Arc, Mutex};

use log::Level;

/// Destination for log lines.
///
/// Subsystems never write to a global logger directly. They receive a `Logger` wrapping one of
/// these, either at construction or when the host initializes them.
pub trait LogSink : Send + Sync {
    fn log(&self, level: Level, args: fmt::Arguments<'_>);
}

/// Forwards to the `log` facade under a fixed target.
#[derive(Debug, Clone, Copy)]
pub struct LogCrateSink {
    target: &'static str,
}

impl LogCrateSink {
    pub const fn new(target: &'static str) -> Self {
        Self { target }
    }
}

impl Default for LogCrateSink {
    fn default() -> Self {
        Self::new("gscx")
    }
}

impl LogSink for LogCrateSink {
    fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        log::log!(target: self.target, level, "{}", args);
    }
}

/// Collects formatted lines in memory.
#[derive(Debug, Default)]
pub struct BufferSink {
    lines: Mutex<Vec<(Level, String)>>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(Level, String)> {
        match self.lines.lock() {
            Ok(lines) => lines.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|(_, line)| line.contains(needle))
    }
}

impl LogSink for BufferSink {
    fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        let line = args.to_string();
        match self.lines.lock() {
            Ok(mut lines) => lines.push((level, line)),
            Err(poisoned) => poisoned.into_inner().push((level, line)),
        }
    }
}

/// Cheaply clonable handle to a shared `LogSink`.
#[derive(Clone)]
pub struct Logger {
    sink: Arc<dyn LogSink>,
}

impl Logger {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self { sink }
    }

    pub fn with_target(target: &'static str) -> Self {
        Self::new(Arc::new(LogCrateSink::new(target)))
    }

    #[inline]
    pub fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        self.sink.log(level, args);
    }

    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Error, args);
    }

    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Warn, args);
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Info, args);
    }

    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, args);
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(Arc::new(LogCrateSink::default()))
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Logger")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_sink_collects_through_logger() {
        let sink = Arc::new(BufferSink::new());
        let log = Logger::new(sink.clone());

        log.info(format_args!("hello {}", 1));
        log.warn(format_args!("careful"));
        let cloned = log.clone();
        cloned.error(format_args!("broken"));

        assert_eq!(sink.lines(), vec![
            (Level::Info, "hello 1".to_owned()),
            (Level::Warn, "careful".to_owned()),
            (Level::Error, "broken".to_owned()),
        ]);
        assert!(sink.contains("broken"));
        assert!(!sink.contains("missing"));
    }
}
