//! We use this mocking module in unit tests to emulate the serial line to a power source.

/// Our mock type used to emulate a serial port.
pub struct MockSerial {
    /// Everything the session wrote to the line
    write_buffer: heapless::Vec<u8, 256>,
    /// Scripted bytes the "device" sends back
    read_buffer: heapless::Vec<u8, 256>,
    /// Current position in the read buffer
    read_position: usize,
    /// Flag to simulate write errors
    should_error_on_write: bool,
    /// Flag to simulate read errors
    should_error_on_read: bool,
    /// Start over from the beginning once the read buffer is exhausted
    repeat_reads: bool,
}

#[derive(thiserror::Error, Debug)]
pub enum MockSerialError {
    /// Nothing left to read, as a real port reports once its timeout elapses
    #[error("read timed out")]
    Timeout,
    /// Simulated buffer overflow
    #[error("mock buffer full")]
    BufferOverflow,
    /// Generic simulated line failure
    #[error("simulated line failure")]
    SimulatedError,
}

impl embedded_io::Error for MockSerialError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            MockSerialError::Timeout => embedded_io::ErrorKind::TimedOut,
            MockSerialError::BufferOverflow => embedded_io::ErrorKind::OutOfMemory,
            MockSerialError::SimulatedError => embedded_io::ErrorKind::Other,
        }
    }
}

impl embedded_io::ErrorType for MockSerial {
    type Error = MockSerialError;
}

impl embedded_io::Write for MockSerial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if self.should_error_on_write {
            return Err(MockSerialError::SimulatedError);
        }
        self.write_buffer
            .extend_from_slice(buf)
            .map_err(|_| MockSerialError::BufferOverflow)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        if self.should_error_on_write {
            return Err(MockSerialError::SimulatedError);
        }
        Ok(())
    }
}

impl embedded_io::Read for MockSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.should_error_on_read {
            return Err(MockSerialError::SimulatedError);
        }

        if self.read_position >= self.read_buffer.len() {
            if !self.repeat_reads || self.read_buffer.is_empty() {
                return Err(MockSerialError::Timeout);
            }
            self.read_position = 0;
        }

        let remaining = &self.read_buffer[self.read_position..];
        let n = core::cmp::min(buf.len(), remaining.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.read_position += n;
        Ok(n)
    }
}

impl MockSerial {
    /// Create a new MockSerial instance with empty buffers
    pub fn new() -> Self {
        Self {
            write_buffer: heapless::Vec::new(),
            read_buffer: heapless::Vec::new(),
            read_position: 0,
            should_error_on_write: false,
            should_error_on_read: false,
            repeat_reads: false,
        }
    }

    /// Set the data that will be returned when read() is called
    pub fn set_read_data(&mut self, data: &[u8]) -> Result<(), MockSerialError> {
        self.read_buffer.clear();
        self.read_position = 0;
        self.read_buffer
            .extend_from_slice(data)
            .map_err(|_| MockSerialError::BufferOverflow)
    }

    /// Get a reference to the data that was written to this mock serial port
    pub fn written_data(&self) -> &[u8] {
        &self.write_buffer
    }

    /// Configure whether write operations should fail with an error
    pub fn set_write_error(&mut self, should_error: bool) {
        self.should_error_on_write = should_error;
    }

    /// Configure whether read operations should fail with an error
    pub fn set_read_error(&mut self, should_error: bool) {
        self.should_error_on_read = should_error;
    }

    /// Play the read data back again after it runs out, emulating a device that gives
    /// the same reply to every request
    pub fn set_repeat_reads(&mut self, repeat: bool) {
        self.repeat_reads = repeat;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_io::{Error, Read, Write};

    #[test]
    fn test_write_frames_accumulate() {
        let mut mock = MockSerial::new();
        mock.write_all(b"@0AOUT?A8\r").unwrap();
        mock.write_all(b"@0AID?3D\r").unwrap();
        assert_eq!(mock.written_data(), b"@0AOUT?A8\r@0AID?3D\r");
    }

    #[test]
    fn test_write_buffer_overflow() {
        let mut mock = MockSerial::new();
        let result = mock.write(&[b'A'; 300]);
        assert!(matches!(result, Err(MockSerialError::BufferOverflow)));
    }

    #[test]
    fn test_read_in_pieces() {
        let mut mock = MockSerial::new();
        mock.set_read_data(b"#0ANAP100\r").unwrap();

        let mut byte = [0u8; 1];
        let mut rest = [0u8; 16];
        assert_eq!(mock.read(&mut byte).unwrap(), 1);
        assert_eq!(&byte, b"#");
        assert_eq!(mock.read(&mut rest).unwrap(), 9);
        assert_eq!(&rest[..9], b"0ANAP100\r");
    }

    #[test]
    fn test_read_times_out_when_exhausted() {
        let mut mock = MockSerial::new();
        mock.set_read_data(b"#0AOK\r").unwrap();

        let mut buffer = [0u8; 16];
        assert!(mock.read(&mut buffer).is_ok());
        let err = mock.read(&mut buffer).unwrap_err();
        assert!(matches!(err.kind(), embedded_io::ErrorKind::TimedOut));
    }

    #[test]
    fn test_repeat_reads() {
        let mut mock = MockSerial::new();
        mock.set_read_data(b"#0BOK\r").unwrap();
        mock.set_repeat_reads(true);

        let mut buffer = [0u8; 6];
        for _ in 0..3 {
            assert_eq!(mock.read(&mut buffer).unwrap(), 6);
            assert_eq!(&buffer, b"#0BOK\r");
        }
    }

    #[test]
    fn test_repeat_reads_with_no_data_times_out() {
        let mut mock = MockSerial::new();
        mock.set_repeat_reads(true);
        assert!(matches!(
            mock.read(&mut [0u8; 4]),
            Err(MockSerialError::Timeout)
        ));
    }

    #[test]
    fn test_error_simulation() {
        let mut mock = MockSerial::new();
        mock.set_read_data(b"#0AOK\r").unwrap();
        mock.set_write_error(true);
        mock.set_read_error(true);

        assert!(matches!(mock.write(b"@"), Err(MockSerialError::SimulatedError)));
        assert!(matches!(mock.flush(), Err(MockSerialError::SimulatedError)));
        assert!(matches!(
            mock.read(&mut [0u8; 4]),
            Err(MockSerialError::SimulatedError)
        ));
        assert!(mock.written_data().is_empty());

        mock.set_write_error(false);
        mock.set_read_error(false);
        assert!(mock.write(b"@").is_ok());
        assert!(mock.read(&mut [0u8; 4]).is_ok());
    }
}
