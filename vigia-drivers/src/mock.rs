//! Scripted I2C bus for driver tests

use std::collections::VecDeque;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, Operation};

/// Records every write and answers reads from a script
#[derive(Default)]
pub struct MockI2c {
    /// (address, bytes) for every write, in order
    pub writes: Vec<(u8, Vec<u8>)>,
    /// (address, length) for every read, in order
    pub reads: Vec<(u8, usize)>,
    responses: VecDeque<Vec<u8>>,
    /// Fail the next N transactions
    pub fail: usize,
}

impl MockI2c {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes for the next read
    pub fn respond(&mut self, bytes: &[u8]) -> &mut Self {
        self.responses.push_back(bytes.to_vec());
        self
    }

    /// Bytes written to `address`, one entry per write
    pub fn writes_to(&self, address: u8) -> Vec<Vec<u8>> {
        self.writes
            .iter()
            .filter(|(a, _)| *a == address)
            .map(|(_, bytes)| bytes.clone())
            .collect()
    }
}

impl ErrorType for MockI2c {
    type Error = ErrorKind;
}

impl I2c for MockI2c {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if self.fail > 0 {
            self.fail -= 1;
            return Err(ErrorKind::Other);
        }
        for op in operations {
            match op {
                Operation::Write(bytes) => self.writes.push((address, bytes.to_vec())),
                Operation::Read(buf) => {
                    self.reads.push((address, buf.len()));
                    let response = self.responses.pop_front().unwrap_or_default();
                    for (dst, src) in buf.iter_mut().zip(response.iter()) {
                        *dst = *src;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Delay that returns immediately
pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}
