//!
//! Diagnostic logging handle owned by the controller.
//!
//! Not to be confused with the contract console: the console is an
//! append-only, consensus-visible buffer owned by the apply context, while
//! this logger carries host-side diagnostics (failed applies, fee-charge
//! failures) and may be disabled entirely by installing the null sink.
//!

use std::cell::RefCell;
use std::rc::Rc;

pub trait Logger: core::fmt::Write {
    /// Raw bytes rendered as hex, for payload dumps.
    fn log_data(&mut self, data: &[u8]) -> core::fmt::Result;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NullLogger;

impl core::fmt::Write for NullLogger {
    #[inline(always)]
    fn write_str(&mut self, _s: &str) -> core::fmt::Result {
        Ok(())
    }

    #[inline(always)]
    fn write_char(&mut self, _c: char) -> core::fmt::Result {
        Ok(())
    }

    #[inline(always)]
    fn write_fmt(&mut self, _args: core::fmt::Arguments<'_>) -> core::fmt::Result {
        Ok(())
    }
}

impl Logger for NullLogger {
    #[inline(always)]
    fn log_data(&mut self, _data: &[u8]) -> core::fmt::Result {
        Ok(())
    }
}

/// Collects diagnostics in a shared buffer: clone one handle into the
/// controller and keep the other to assert on the output afterwards.
#[derive(Clone, Debug, Default)]
pub struct BufferLogger {
    output: Rc<RefCell<String>>,
}

impl BufferLogger {
    pub fn contents(&self) -> String {
        self.output.borrow().clone()
    }
}

impl core::fmt::Write for BufferLogger {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        self.output.borrow_mut().push_str(s);
        Ok(())
    }
}

impl Logger for BufferLogger {
    fn log_data(&mut self, data: &[u8]) -> core::fmt::Result {
        use core::fmt::Write;
        let mut output = self.output.borrow_mut();
        for byte in data {
            write!(&mut *output, "{byte:02x}")?;
        }
        output.push('\n');
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::fmt::Write;

    #[test]
    fn buffer_logger_shares_its_output() {
        let logger = BufferLogger::default();
        let mut handle: Box<dyn Logger> = Box::new(logger.clone());
        write!(handle, "failure in {}", "apply").unwrap();
        handle.log_data(&[0xde, 0xad]).unwrap();
        assert_eq!(logger.contents(), "failure in applydead\n");
    }

    #[test]
    fn null_logger_swallows_everything() {
        let mut logger = NullLogger;
        write!(logger, "dropped").unwrap();
        logger.log_data(&[1, 2, 3]).unwrap();
    }
}
