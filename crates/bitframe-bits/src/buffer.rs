//! Field packing for outgoing headers.
//!
//! Every field goes out in network byte order. The caller sizes the
//! buffer up front (normally to the layout's `header_nbytes()`) and the
//! buffer only tracks how far it has written.

/// An integer type that can be written as a header field.
pub trait HeaderField: Copy {
    /// Width of the type in bytes.
    const WIDTH: usize;

    /// Write the low `len` bytes of `self` to `dst[..len]`.
    ///
    /// When `already_big_endian` is set, the first `len` bytes of the
    /// in-memory representation are copied as-is.
    fn write_field(self, dst: &mut [u8], len: usize, already_big_endian: bool);
}

impl HeaderField for u8 {
    const WIDTH: usize = 1;

    fn write_field(self, dst: &mut [u8], len: usize, _already_big_endian: bool) {
        dst[..len].copy_from_slice(&[self][..len]);
    }
}

macro_rules! impl_header_field {
    ($($ty:ty),*) => {
        $(
            impl HeaderField for $ty {
                const WIDTH: usize = std::mem::size_of::<$ty>();

                fn write_field(self, dst: &mut [u8], len: usize, already_big_endian: bool) {
                    if already_big_endian {
                        dst[..len].copy_from_slice(&self.to_ne_bytes()[..len]);
                    } else {
                        dst[..len].copy_from_slice(&self.to_be_bytes()[Self::WIDTH - len..]);
                    }
                }
            }
        )*
    };
}

impl_header_field!(u16, u32, u64);

/// Append-only writer packing fields into a caller-owned byte buffer.
///
/// No bounds checking is done beyond slice indexing: writing past the end
/// of the buffer, or asking for more bytes than the field type holds, is a
/// caller bug and panics.
#[derive(Debug)]
pub struct HeaderBuffer<'a> {
    buf: &'a mut [u8],
    offset: usize,
}

impl<'a> HeaderBuffer<'a> {
    /// Wrap a pre-sized output buffer. The cursor starts at 0.
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    /// Number of bytes written so far.
    pub fn length(&self) -> usize {
        self.offset
    }

    /// The bytes written so far.
    pub fn header(&self) -> &[u8] {
        &self.buf[..self.offset]
    }

    /// Append the low `len` bytes of `value`, most significant byte first.
    ///
    /// # Panics
    ///
    /// Panics if `len` exceeds the width of `T` or the remaining buffer space.
    pub fn add_field<T: HeaderField>(&mut self, len: usize, value: T, already_big_endian: bool) {
        let end = self.offset + len;
        value.write_field(&mut self.buf[self.offset..end], len, already_big_endian);
        self.offset = end;
    }

    pub fn add_field8(&mut self, value: u8) {
        self.add_field(1, value, false);
    }

    pub fn add_field16(&mut self, value: u16) {
        self.add_field(2, value, false);
    }

    pub fn add_field32(&mut self, value: u32) {
        self.add_field(4, value, false);
    }

    pub fn add_field64(&mut self, value: u64) {
        self.add_field(8, value, false);
    }

    /// Append raw bytes unchanged.
    pub fn add_bytes(&mut self, bytes: &[u8]) {
        let end = self.offset + bytes.len();
        self.buf[self.offset..end].copy_from_slice(bytes);
        self.offset = end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_full_width_fields_big_endian() {
        let mut out = [0u8; 15];
        let mut header = HeaderBuffer::new(&mut out);
        header.add_field8(0x01);
        header.add_field16(0x0203);
        header.add_field32(0x0405_0607);
        header.add_field64(0x0809_0A0B_0C0D_0E0F);
        assert_eq!(header.length(), 15);
        assert_eq!(
            header.header(),
            &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]
        );
    }

    #[test]
    fn truncates_to_low_bytes() {
        let mut out = [0u8; 5];
        let mut header = HeaderBuffer::new(&mut out);
        header.add_field(3, 0x00AB_CDEFu32, false);
        header.add_field(2, 0x1234_AAAA_u64, false);
        assert_eq!(out, [0xAB, 0xCD, 0xEF, 0xAA, 0xAA]);
    }

    #[test]
    fn already_big_endian_is_copied_verbatim() {
        let value = u16::from_be_bytes([0x12, 0x34]);
        let mut out = [0u8; 2];
        let mut header = HeaderBuffer::new(&mut out);
        header.add_field(2, u16::from_ne_bytes(value.to_be_bytes()), true);
        assert_eq!(out, [0x12, 0x34]);
    }

    #[test]
    fn raw_bytes_append_at_cursor() {
        let mut out = [0u8; 4];
        let mut header = HeaderBuffer::new(&mut out);
        header.add_bytes(&[0xAA, 0xBB]);
        header.add_field16(0x0102);
        assert_eq!(out, [0xAA, 0xBB, 0x01, 0x02]);
    }

    #[test]
    #[should_panic]
    fn writing_past_the_end_panics() {
        let mut out = [0u8; 1];
        let mut header = HeaderBuffer::new(&mut out);
        header.add_field16(0xFFFF);
    }
}
