use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::rc::Rc;
use std::sync::Mutex;

/// Abstraction over where diagnostic output goes.
///
/// Components that own resources (pager, B-tree, VM, engine) accept a
/// logger at construction. The default is `NullLogger`, so library users
/// and tests get no output unless they ask for it.
pub trait Logger {
    fn debug(&self, message: &str);
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Discards everything.
pub struct NullLogger;

impl Logger for NullLogger {
    fn debug(&self, _message: &str) {}
    fn info(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
}

/// Appends `LEVEL message` lines to a log file. Used by the binary.
pub struct FileLogger {
    file: Mutex<File>,
}

impl FileLogger {
    pub fn open<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(FileLogger {
            file: Mutex::new(file),
        })
    }

    fn write_line(&self, level: &str, message: &str) {
        if let Ok(mut file) = self.file.lock() {
            // A failed log write is not worth failing the query over.
            let _ = writeln!(file, "{} {}", level, message);
        }
    }
}

impl Logger for FileLogger {
    fn debug(&self, message: &str) {
        self.write_line("DEBUG", message);
    }

    fn info(&self, message: &str) {
        self.write_line("INFO", message);
    }

    fn warn(&self, message: &str) {
        self.write_line("WARN", message);
    }

    fn error(&self, message: &str) {
        self.write_line("ERROR", message);
    }
}

/// The default sink, shared-ownership form.
pub fn null() -> Rc<dyn Logger> {
    Rc::new(NullLogger)
}
