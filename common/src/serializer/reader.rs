use super::xdr_padding;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReaderError {
    #[error("Invalid size")]
    InvalidSize,
    #[error("Invalid value")]
    InvalidValue,
    #[error("Unknown enum discriminant {0}")]
    UnknownDiscriminant(u32),
    #[error("Invalid UTF-8 string")]
    InvalidString,
    #[error("Length {0} exceeds the maximum of {1}")]
    TooLong(usize, usize),
    #[error("Non-zero XDR padding")]
    NonZeroPadding,
    #[error("{0} unread bytes left in buffer")]
    TrailingBytes(usize),
}

// Cursor over a borrowed XDR buffer
pub struct Reader<'a> {
    bytes: &'a [u8],
    total: usize,
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, total: 0 }
    }

    fn read_slice(&mut self, n: usize) -> Result<&'a [u8], ReaderError> {
        if n > self.bytes.len() {
            return Err(ReaderError::InvalidSize);
        }
        let (head, tail) = self.bytes.split_at(n);
        self.bytes = tail;
        self.total += n;
        Ok(head)
    }

    fn skip_padding(&mut self, len: usize) -> Result<(), ReaderError> {
        let pad = self.read_slice(xdr_padding(len))?;
        if pad.iter().any(|b| *b != 0) {
            return Err(ReaderError::NonZeroPadding);
        }
        Ok(())
    }

    pub fn read_u32(&mut self) -> Result<u32, ReaderError> {
        let bytes = self.read_slice(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_i32(&mut self) -> Result<i32, ReaderError> {
        self.read_u32().map(|v| v as i32)
    }

    pub fn read_u64(&mut self) -> Result<u64, ReaderError> {
        let high = self.read_u32()? as u64;
        let low = self.read_u32()? as u64;
        Ok((high << 32) | low)
    }

    pub fn read_bool(&mut self) -> Result<bool, ReaderError> {
        match self.read_u32()? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(ReaderError::InvalidValue),
        }
    }

    // opaque[n]
    pub fn read_fixed_opaque(&mut self, n: usize) -> Result<&'a [u8], ReaderError> {
        let data = self.read_slice(n)?;
        self.skip_padding(n)?;
        Ok(data)
    }

    // opaque<max>
    pub fn read_opaque(&mut self, max: Option<usize>) -> Result<Vec<u8>, ReaderError> {
        let len = self.read_u32()? as usize;
        if let Some(max) = max {
            if len > max {
                return Err(ReaderError::TooLong(len, max));
            }
        }
        self.read_fixed_opaque(len).map(|data| data.to_vec())
    }

    // string<max>
    pub fn read_string(&mut self, max: Option<usize>) -> Result<String, ReaderError> {
        let bytes = self.read_opaque(max)?;
        String::from_utf8(bytes).map_err(|_| ReaderError::InvalidString)
    }

    // Take everything left, used for opaque procedure bodies
    pub fn read_remaining(&mut self) -> &'a [u8] {
        let rest = self.bytes;
        self.total += rest.len();
        self.bytes = &[];
        rest
    }

    // Bytes left to read
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    // Bytes consumed so far
    pub fn total_read(&self) -> usize {
        self.total
    }
}
