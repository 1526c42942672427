use std::cell::RefCell;

/// Message severity, most severe first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

/// Destination for diagnostic lines
///
/// The default (no sink bound) routes Info and better to stdout and errors to
/// stderr. Binding a sink redirects everything produced on the current thread,
/// which is how tests capture solver output and how an embedding host routes
/// diagnostics into its own log.
pub trait LogSink {
    fn write(&mut self, level: LogLevel, message: &str);
}

thread_local! {
    static SINK: RefCell<Option<Box<dyn LogSink>>> = const { RefCell::new(None) };
    static LEVEL: RefCell<LogLevel> = const { RefCell::new(LogLevel::Info) };
}

/// Set the verbosity threshold for the current thread
pub fn set_level(level: LogLevel) {
    LEVEL.with(|l| *l.borrow_mut() = level);
}

/// Current verbosity threshold
pub fn level() -> LogLevel {
    LEVEL.with(|l| *l.borrow())
}

/// Emit one diagnostic line at the given level
pub fn emit(level: LogLevel, message: &str) {
    if level > self::level() {
        return;
    }
    let handled = SINK.with(|sink| {
        if let Some(sink) = sink.borrow_mut().as_mut() {
            sink.write(level, message);
            true
        } else {
            false
        }
    });
    if !handled {
        match level {
            LogLevel::Error | LogLevel::Warn => eprintln!("{}", message),
            _ => println!("{}", message),
        }
    }
}

pub fn error(message: &str) {
    emit(LogLevel::Error, message);
}

pub fn warn(message: &str) {
    emit(LogLevel::Warn, message);
}

pub fn info(message: &str) {
    emit(LogLevel::Info, message);
}

pub fn debug(message: &str) {
    emit(LogLevel::Debug, message);
}

/// Scoped sink binding
///
/// Installs a sink for the current thread and restores the previous binding
/// on drop, so a binder around a solve cannot leak its sink past the solve on
/// any exit path.
pub struct ScopedSink {
    previous: Option<Box<dyn LogSink>>,
}

impl ScopedSink {
    pub fn bind(sink: Box<dyn LogSink>) -> Self {
        let previous = SINK.with(|s| s.borrow_mut().replace(sink));
        Self { previous }
    }
}

impl Drop for ScopedSink {
    fn drop(&mut self) {
        let previous = self.previous.take();
        SINK.with(|s| {
            *s.borrow_mut() = previous;
        });
    }
}

/// Sink that accumulates lines in memory; used by tests
#[derive(Debug, Clone, Default)]
pub struct BufferSink {
    lines: std::sync::Arc<std::sync::Mutex<Vec<(LogLevel, String)>>>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to the captured lines
    pub fn lines(&self) -> std::sync::Arc<std::sync::Mutex<Vec<(LogLevel, String)>>> {
        self.lines.clone()
    }
}

impl LogSink for BufferSink {
    fn write(&mut self, level: LogLevel, message: &str) {
        self.lines.lock().unwrap().push((level, message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::Error < LogLevel::Warn);
        assert!(LogLevel::Info < LogLevel::Debug);
    }

    #[test]
    fn test_scoped_sink_captures_and_restores() {
        let sink = BufferSink::new();
        let lines = sink.lines();
        {
            let _bound = ScopedSink::bind(Box::new(sink));
            info("captured");
        }
        // After the binder drops, emission goes back to stdout
        info("not captured");

        let captured = lines.lock().unwrap();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].1, "captured");
        assert_eq!(captured[0].0, LogLevel::Info);
    }

    #[test]
    fn test_level_filtering() {
        let sink = BufferSink::new();
        let lines = sink.lines();
        {
            let _bound = ScopedSink::bind(Box::new(sink));
            set_level(LogLevel::Warn);
            info("filtered");
            warn("kept");
            set_level(LogLevel::Info);
        }

        let captured = lines.lock().unwrap();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].1, "kept");
    }

    #[test]
    fn test_nested_binders() {
        let outer = BufferSink::new();
        let outer_lines = outer.lines();
        let inner = BufferSink::new();
        let inner_lines = inner.lines();

        let _a = ScopedSink::bind(Box::new(outer));
        info("to outer");
        {
            let _b = ScopedSink::bind(Box::new(inner));
            info("to inner");
        }
        info("back to outer");

        assert_eq!(inner_lines.lock().unwrap().len(), 1);
        assert_eq!(outer_lines.lock().unwrap().len(), 2);
    }
}
