// XDR (RFC 4506) serialization primitives.
//
// The core never looks inside protocol data structures: anything that goes on
// the wire implements `Serializer` and is handled as an opaque byte buffer by
// the RPC layer.

mod reader;
mod writer;

pub use reader::{Reader, ReaderError};
pub use writer::Writer;

use bytes::Bytes;

// Every XDR item is padded to a multiple of this many bytes
pub const XDR_ALIGNMENT: usize = 4;

// Returns the encoded length of a variable sized opaque/string
// (4 bytes length prefix + data rounded up to the alignment)
#[inline]
pub fn xdr_len(data: &[u8]) -> usize {
    (1 + ((3 + data.len()) >> 2)) << 2
}

// Number of zero bytes required after `len` bytes of data
#[inline]
pub fn xdr_padding(len: usize) -> usize {
    (XDR_ALIGNMENT - len % XDR_ALIGNMENT) % XDR_ALIGNMENT
}

pub trait Serializer {
    fn write(&self, writer: &mut Writer);

    fn read(reader: &mut Reader) -> Result<Self, ReaderError>
    where
        Self: Sized;

    fn size(&self) -> usize {
        let mut writer = Writer::new();
        self.write(&mut writer);
        writer.total_write()
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut writer = Writer::new();
        self.write(&mut writer);
        writer.bytes()
    }

    // Decode the whole buffer, trailing garbage is an error
    fn from_bytes(bytes: &[u8]) -> Result<Self, ReaderError>
    where
        Self: Sized,
    {
        let mut reader = Reader::new(bytes);
        let value = Self::read(&mut reader)?;
        if reader.size() != 0 {
            return Err(ReaderError::TrailingBytes(reader.size()));
        }
        Ok(value)
    }
}

impl Serializer for () {
    fn write(&self, _: &mut Writer) {}

    fn read(_: &mut Reader) -> Result<Self, ReaderError> {
        Ok(())
    }

    fn size(&self) -> usize {
        0
    }
}

impl Serializer for u32 {
    fn write(&self, writer: &mut Writer) {
        writer.write_u32(*self);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        reader.read_u32()
    }

    fn size(&self) -> usize {
        4
    }
}

impl Serializer for u64 {
    fn write(&self, writer: &mut Writer) {
        writer.write_u64(*self);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        reader.read_u64()
    }

    fn size(&self) -> usize {
        8
    }
}

impl Serializer for bool {
    fn write(&self, writer: &mut Writer) {
        writer.write_bool(*self);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        reader.read_bool()
    }

    fn size(&self) -> usize {
        4
    }
}

// Variable length opaque<>
impl Serializer for Bytes {
    fn write(&self, writer: &mut Writer) {
        writer.write_opaque(self);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        reader.read_opaque(None).map(Bytes::from)
    }

    fn size(&self) -> usize {
        xdr_len(self)
    }
}

impl Serializer for String {
    fn write(&self, writer: &mut Writer) {
        writer.write_string(self);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        reader.read_string(None)
    }

    fn size(&self) -> usize {
        xdr_len(self.as_bytes())
    }
}

// XDR optional-data (`*T`)
impl<T: Serializer> Serializer for Option<T> {
    fn write(&self, writer: &mut Writer) {
        match self {
            Some(value) => {
                writer.write_bool(true);
                value.write(writer);
            }
            None => writer.write_bool(false),
        }
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        if reader.read_bool()? {
            Ok(Some(T::read(reader)?))
        } else {
            Ok(None)
        }
    }

    fn size(&self) -> usize {
        4 + self.as_ref().map(|v| v.size()).unwrap_or(0)
    }
}

// Variable length array<>
impl<T: Serializer> Serializer for Vec<T> {
    fn write(&self, writer: &mut Writer) {
        writer.write_u32(self.len() as u32);
        for item in self {
            item.write(writer);
        }
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        let count = reader.read_u32()? as usize;
        // every element takes at least one XDR unit
        if count > reader.size() / XDR_ALIGNMENT {
            return Err(ReaderError::InvalidSize);
        }
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(T::read(reader)?);
        }
        Ok(items)
    }

    fn size(&self) -> usize {
        4 + self.iter().map(|v| v.size()).sum::<usize>()
    }
}
