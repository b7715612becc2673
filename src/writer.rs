use crate::{Emitter, Encoding, WriterError};

impl<'w> Emitter<'w> {
    /// Flush the accumulated characters to the output.
    pub fn flush(&mut self) -> Result<(), WriterError> {
        assert!(self.write_handler.is_some());
        assert_ne!(self.encoding, Encoding::Any);

        if self.buffer.is_empty() {
            return Ok(());
        }

        if self.encoding == Encoding::Utf8 {
            let to_emit = self.buffer.as_bytes();
            self.write_handler
                .as_mut()
                .expect("non-null writer")
                .write_all(to_emit)?;
            self.buffer.clear();
            return Ok(());
        }

        let big_endian = match self.encoding {
            Encoding::Any | Encoding::Utf8 => unreachable!("unhandled encoding"),
            Encoding::Utf16Le | Encoding::Utf32Le => false,
            Encoding::Utf16Be | Encoding::Utf32Be => true,
        };

        match self.encoding {
            Encoding::Utf16Le | Encoding::Utf16Be => {
                for unit in self.buffer.encode_utf16() {
                    let bytes = if big_endian {
                        unit.to_be_bytes()
                    } else {
                        unit.to_le_bytes()
                    };
                    self.raw_buffer.extend(bytes);
                }
            }
            _ => {
                for ch in self.buffer.chars() {
                    let bytes = if big_endian {
                        (ch as u32).to_be_bytes()
                    } else {
                        (ch as u32).to_le_bytes()
                    };
                    self.raw_buffer.extend(bytes);
                }
            }
        }

        let to_emit = self.raw_buffer.as_slice();
        self.write_handler
            .as_mut()
            .expect("non-null writer")
            .write_all(to_emit)?;
        self.buffer.clear();
        self.raw_buffer.clear();
        Ok(())
    }
}
