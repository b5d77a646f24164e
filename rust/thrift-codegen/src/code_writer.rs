//! Indentation-tracking writer for generated JavaScript and TypeScript.
//!
//! Indentation is RAII-based: [`CodeWriter::indent`] returns a guard and the
//! level drops back when the guard goes out of scope. The level lives in an
//! `Rc<Cell<usize>>`, so a live guard never holds a borrow of the writer.
//!
//! ```
//! use thrift_codegen::code_writer::CodeWriter;
//! use thrift_codegen::cw_writeln;
//!
//! let mut w = CodeWriter::with_indent_spaces(String::new(), 2);
//! w.writeln("Point = function(args) {").unwrap();
//! {
//!     let _indent = w.indent();
//!     cw_writeln!(w, "this.{} = null;", "x").unwrap();
//! }
//! w.writeln("};").unwrap();
//! assert_eq!(w.into_inner(), "Point = function(args) {\n  this.x = null;\n};\n");
//! ```

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

pub struct CodeWriter<W> {
    writer: W,
    indent_level: Rc<Cell<usize>>,
    indent_string: String,
    at_line_start: Cell<bool>,
}

impl<W: fmt::Write> CodeWriter<W> {
    pub fn new(writer: W, indent_string: String) -> Self {
        Self {
            writer,
            indent_level: Rc::new(Cell::new(0)),
            indent_string,
            at_line_start: Cell::new(true),
        }
    }

    pub fn with_indent_spaces(writer: W, spaces: usize) -> Self {
        Self::new(writer, " ".repeat(spaces))
    }

    /// Write text without a newline. Indents first if at line start and the
    /// text is not blank.
    pub fn write(&mut self, text: &str) -> fmt::Result {
        if text.is_empty() {
            return Ok(());
        }

        if self.at_line_start.get() && !text.trim().is_empty() {
            for _ in 0..self.indent_level.get() {
                self.writer.write_str(&self.indent_string)?;
            }
            self.at_line_start.set(false);
        }

        self.writer.write_str(text)
    }

    pub fn writeln(&mut self, text: &str) -> fmt::Result {
        self.write(text)?;
        self.writer.write_char('\n')?;
        self.at_line_start.set(true);
        Ok(())
    }

    pub fn blank_line(&mut self) -> fmt::Result {
        self.writer.write_char('\n')?;
        self.at_line_start.set(true);
        Ok(())
    }

    /// Write a multi-line chunk, indenting each non-blank line.
    ///
    /// Every line of `text` is expected to end with `\n`.
    pub fn write_lines(&mut self, text: &str) -> fmt::Result {
        for line in text.lines() {
            self.writeln(line)?;
        }
        Ok(())
    }

    /// Indentation increases while the guard is alive.
    pub fn indent(&mut self) -> IndentGuard {
        self.indent_by(1)
    }

    /// Like [`indent`](Self::indent), `levels` at once.
    pub fn indent_by(&mut self, levels: usize) -> IndentGuard {
        self.indent_level.set(self.indent_level.get() + levels);
        IndentGuard {
            indent_level: Rc::clone(&self.indent_level),
            levels,
        }
    }

    pub fn indent_level(&self) -> usize {
        self.indent_level.get()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Use [`cw_writeln!`](crate::cw_writeln) instead of calling this directly.
    #[doc(hidden)]
    pub fn writeln_fmt(&mut self, args: fmt::Arguments<'_>) -> fmt::Result {
        let formatted = format!("{args}");
        self.writeln(&formatted)
    }
}

pub struct IndentGuard {
    indent_level: Rc<Cell<usize>>,
    levels: usize,
}

impl Drop for IndentGuard {
    fn drop(&mut self) {
        let current = self.indent_level.get();
        self.indent_level.set(current.saturating_sub(self.levels));
    }
}

/// Formatted line to a [`CodeWriter`], like `std::writeln!`.
#[macro_export]
macro_rules! cw_writeln {
    ($writer:expr, $($arg:tt)*) => {
        $writer.writeln_fmt(format_args!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn writer() -> CodeWriter<String> {
        CodeWriter::with_indent_spaces(String::new(), 2)
    }

    #[test]
    fn test_indentation() {
        let mut w = writer();
        w.writeln("while (true) {").unwrap();
        {
            let _indent = w.indent();
            w.writeln("if (ftype == Thrift.Type.STOP) {").unwrap();
            {
                let _indent = w.indent();
                w.writeln("break;").unwrap();
            }
            w.writeln("}").unwrap();
        }
        w.writeln("}").unwrap();

        assert_eq!(
            w.into_inner(),
            "while (true) {\n  if (ftype == Thrift.Type.STOP) {\n    break;\n  }\n}\n"
        );
    }

    #[test]
    fn test_indent_by_drops_all_levels() {
        let mut w = writer();
        {
            let _deep = w.indent_by(2);
            assert_eq!(w.indent_level(), 2);
            w.writeln("return;").unwrap();
        }
        assert_eq!(w.indent_level(), 0);
        w.writeln("}").unwrap();
        assert_eq!(w.into_inner(), "    return;\n}\n");
    }

    #[test]
    fn test_blank_lines_are_not_indented() {
        let mut w = writer();
        let _indent = w.indent();
        w.writeln("a").unwrap();
        w.blank_line().unwrap();
        w.writeln("").unwrap();
        w.writeln("b").unwrap();
        drop(_indent);
        assert_eq!(w.into_inner(), "  a\n\n\n  b\n");
    }

    #[test]
    fn test_write_lines_indents_each_line() {
        let mut w = writer();
        let _indent = w.indent();
        w.write_lines("var a = 1;\n\nvar b = 2;\n").unwrap();
        drop(_indent);
        assert_eq!(w.into_inner(), "  var a = 1;\n\n  var b = 2;\n");
    }

    #[test]
    fn test_macros() {
        let mut w = writer();
        let seqid = "this.seqid()";
        cw_writeln!(w, "output.writeMessageBegin('{}', Thrift.MessageType.CALL, {seqid});", "ping")
            .unwrap();
        assert_eq!(
            w.into_inner(),
            "output.writeMessageBegin('ping', Thrift.MessageType.CALL, this.seqid());\n"
        );
    }
}
