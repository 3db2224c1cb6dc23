use crate::runtime::{
    error::RuntimeResult,
    value::Value,
};
use std::fmt;
use std::io::{self, Write};

/// One observable call to an output primitive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputEvent {
    Int(i64),
    Char(u8),
    Bool(bool),
}

impl fmt::Display for OutputEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputEvent::Int(v) => write!(f, "{v}"),
            OutputEvent::Char(c) => write!(f, "{}", char::from(*c)),
            OutputEvent::Bool(b) => write!(f, "{}", u8::from(*b)),
        }
    }
}

/// Destination of program output.
pub trait OutputSink {
    fn emit(&mut self, event: OutputEvent) -> io::Result<()>;
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<OutputEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Each event rendered as it would be printed.
    pub fn lines(&self) -> Vec<String> {
        self.events.iter().map(ToString::to_string).collect()
    }
}

impl OutputSink for RecordingSink {
    fn emit(&mut self, event: OutputEvent) -> io::Result<()> {
        self.events.push(event);
        Ok(())
    }
}

/// Writes one event per line.
pub struct WriterSink<W: Write> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> OutputSink for WriterSink<W> {
    fn emit(&mut self, event: OutputEvent) -> io::Result<()> {
        match event {
            // A `char` is one byte on the wire, whatever its value.
            OutputEvent::Char(byte) => self.writer.write_all(&[byte, b'\n'])?,
            other => writeln!(self.writer, "{other}")?,
        }
        self.writer.flush()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Builtin {
    PrintInt,
    PrintChar,
    PrintBool,
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "print_int" => Some(Builtin::PrintInt),
            "print_char" => Some(Builtin::PrintChar),
            "print_bool" => Some(Builtin::PrintBool),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::PrintInt => "print_int",
            Builtin::PrintChar => "print_char",
            Builtin::PrintBool => "print_bool",
        }
    }

    /// Converts the argument to the primitive's parameter type and emits it.
    pub fn invoke(self, arg: &Value, sink: &mut dyn OutputSink) -> RuntimeResult<Value> {
        let event = match self {
            Builtin::PrintInt => OutputEvent::Int(arg.as_int()?),
            Builtin::PrintChar => OutputEvent::Char(arg.as_char()?),
            Builtin::PrintBool => OutputEvent::Bool(arg.as_bool()?),
        };
        sink.emit(event)?;
        Ok(Value::Void)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::error::RuntimeError;

    #[test]
    fn primitives_convert_their_argument() {
        let mut sink = RecordingSink::new();
        Builtin::PrintInt.invoke(&Value::Char(b'1'), &mut sink).unwrap();
        Builtin::PrintChar.invoke(&Value::Int(121), &mut sink).unwrap();
        Builtin::PrintBool.invoke(&Value::Int(5), &mut sink).unwrap();
        assert_eq!(sink.lines(), vec!["49", "y", "1"]);
    }

    #[test]
    fn writer_sink_prints_one_event_per_line() {
        let mut sink = WriterSink::new(Vec::new());
        sink.emit(OutputEvent::Int(-3)).unwrap();
        sink.emit(OutputEvent::Bool(false)).unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(text, "-3\n0\n");
    }

    #[test]
    fn writer_sink_emits_chars_as_single_bytes() {
        let mut sink = WriterSink::new(Vec::new());
        Builtin::PrintChar.invoke(&Value::Int(200), &mut sink).unwrap();
        Builtin::PrintChar.invoke(&Value::Char(b'y'), &mut sink).unwrap();
        assert_eq!(sink.into_inner(), vec![200, b'\n', b'y', b'\n']);
    }

    #[test]
    fn aggregate_arguments_are_rejected() {
        let mut sink = RecordingSink::new();
        let err = Builtin::PrintInt
            .invoke(&Value::Array(vec![Value::Int(1)]), &mut sink)
            .unwrap_err();
        assert!(matches!(err, RuntimeError::TypeMismatch { .. }));
        assert!(sink.events.is_empty());
    }
}
