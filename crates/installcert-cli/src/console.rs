//! Operator I/O: prompts in, report out.

use std::io::{self, BufRead, Write};

use installcert_core::prompt::{decide, question};
use installcert_core::Decision;
use tracing::warn;

/// Line-oriented terminal, generic so tests can script it.
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    /// Wrap an input and output stream.
    pub const fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Output stream for reports.
    pub fn out(&mut self) -> &mut W {
        &mut self.output
    }

    /// Ask a `(Y/n) [Y]` question and read one line.
    ///
    /// End of input rejects.
    ///
    /// # Errors
    ///
    /// Fails only if the question cannot be written.
    pub fn confirm(&mut self, message: &str) -> io::Result<Decision> {
        write!(self.output, "{} ", question(message))?;
        self.output.flush()?;

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => {
                writeln!(self.output)?;
                warn!(message, "no answer on input, treating as no");
                Ok(Decision::Reject)
            }
            Ok(_) => Ok(decide(&line)),
            Err(e) => {
                writeln!(self.output)?;
                warn!(message, error = %e, "cannot read answer, treating as no");
                Ok(Decision::Reject)
            }
        }
    }

    /// Release the streams.
    pub fn into_parts(self) -> (R, W) {
        (self.input, self.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn console(input: &str) -> Console<Cursor<Vec<u8>>, Vec<u8>> {
        Console::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_question_is_written() {
        let mut c = console("\n");
        assert_eq!(c.confirm("Add certificate to keystore").unwrap(), Decision::Accept);
        let (_, out) = c.into_parts();
        assert_eq!(String::from_utf8(out).unwrap(), "Add certificate to keystore (Y/n) [Y] ");
    }

    #[test]
    fn test_answers_are_consumed_in_order() {
        let mut c = console("y\nn\nno\n");
        assert_eq!(c.confirm("a").unwrap(), Decision::Accept);
        assert_eq!(c.confirm("b").unwrap(), Decision::Reject);
        assert_eq!(c.confirm("c").unwrap(), Decision::Accept);
    }

    #[test]
    fn test_end_of_input_rejects() {
        let mut c = console("");
        assert_eq!(c.confirm("Save").unwrap(), Decision::Reject);
    }

    #[test]
    fn test_windows_line_ending() {
        let mut c = console("N\r\n");
        assert_eq!(c.confirm("Save").unwrap(), Decision::Reject);
    }
}
