//! Zero-copy reads over the tag-length-value wire format.
//!
//! This module understands just enough of the wire format to frame one
//! record at a time: it decodes the tag, computes the payload slice, and
//! advances the caller's cursor past it. It never decodes a payload's
//! meaning -- that's the evaluator's job once it knows which field tag it's
//! looking for.

pub mod varint;
pub mod wire_type;

pub use wire_type::WireType;

use crate::error::EvalError;

/// One decoded tag-length-value record: the field number from the tag, its
/// wire type, and a borrowed view of the payload bytes.
pub struct Record<'buf> {
    pub field_number: u32,
    pub wire_type: WireType,
    pub payload: &'buf [u8],
}

/// Reads one record starting at `buf[*offset]`, advancing `*offset` past it.
///
/// Returns a [`EvalError::MalformedWire`](crate::error::EvalErrorKind::MalformedWire)
/// if the tag, length, or payload run past the end of `buf`, or if the wire
/// type is `START_GROUP`/`END_GROUP` (unsupported, per the group wire type
/// being out of scope) or otherwise unrecognized.
pub fn read_record<'buf>(
    buf: &'buf [u8],
    offset: &mut usize,
) -> Result<Record<'buf>, EvalError> {
    let start = *offset;
    let rest = buf.get(start..).ok_or_else(|| {
        EvalError::malformed_wire("cursor past end of buffer").at(start)
    })?;

    let mut cursor = rest;
    let before = cursor.len();
    let tag = varint::decode_varint(&mut cursor).map_err(|e| e.at(start))?;
    let tag_len = before - cursor.len();

    let wire_type = WireType::try_from(tag & 0x7).map_err(|e| e.at(start))?;
    let field_number = (tag >> 3) as u32;

    let mut pos = start + tag_len;

    let payload_len = match wire_type {
        WireType::Varint => {
            let mut varint_cursor = buf
                .get(pos..)
                .ok_or_else(|| EvalError::malformed_wire("truncated varint payload").at(pos))?;
            let before = varint_cursor.len();
            varint::decode_varint(&mut varint_cursor).map_err(|e| e.at(pos))?;
            before - varint_cursor.len()
        }
        WireType::ThirtyTwoBit => 4,
        WireType::SixtyFourBit => 8,
        WireType::LengthDelimited => {
            let mut len_cursor = buf
                .get(pos..)
                .ok_or_else(|| EvalError::malformed_wire("truncated length prefix").at(pos))?;
            let before = len_cursor.len();
            let len = varint::decode_varint(&mut len_cursor).map_err(|e| e.at(pos))?;
            let len_bytes = before - len_cursor.len();
            pos += len_bytes;
            usize::try_from(len)
                .map_err(|_| EvalError::malformed_wire("length prefix exceeds usize").at(pos))?
        }
        WireType::StartGroup | WireType::EndGroup => {
            return Err(EvalError::malformed_wire(
                "group wire type is not supported",
            )
            .at(start));
        }
    };

    if payload_len > buf.len().saturating_sub(pos) {
        return Err(EvalError::malformed_wire("record payload runs past end of buffer").at(pos));
    }
    let payload = &buf[pos..pos + payload_len];
    *offset = pos + payload_len;

    Ok(Record {
        field_number,
        wire_type,
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn varint_bytes(mut value: u64) -> Vec<u8> {
        let mut out = Vec::new();
        loop {
            let byte = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                out.push(byte);
                break;
            }
            out.push(byte | 0x80);
        }
        out
    }

    #[test]
    fn reads_length_delimited_record() {
        // field 1, wire type 2 (length-delimited), payload "hi"
        let mut buf = varint_bytes((1 << 3) | 2);
        buf.push(2);
        buf.extend_from_slice(b"hi");

        let mut offset = 0;
        let record = read_record(&buf, &mut offset).unwrap();
        assert_eq!(record.field_number, 1);
        assert_eq!(record.wire_type, WireType::LengthDelimited);
        assert_eq!(record.payload, b"hi");
        assert_eq!(offset, buf.len());
    }

    #[test]
    fn reads_varint_record() {
        let mut buf = varint_bytes((2 << 3) | 0);
        buf.extend(varint_bytes(300));

        let mut offset = 0;
        let record = read_record(&buf, &mut offset).unwrap();
        assert_eq!(record.field_number, 2);
        assert_eq!(record.wire_type, WireType::Varint);
        assert_eq!(record.payload, &buf[1..]);
        assert_eq!(offset, buf.len());
    }

    #[test]
    fn reads_fixed32_and_fixed64() {
        let mut buf = varint_bytes((3 << 3) | 5);
        buf.extend_from_slice(&1.5f32.to_le_bytes());

        let mut offset = 0;
        let record = read_record(&buf, &mut offset).unwrap();
        assert_eq!(record.wire_type, WireType::ThirtyTwoBit);
        assert_eq!(record.payload.len(), 4);

        let mut buf = varint_bytes((3 << 3) | 1);
        buf.extend_from_slice(&1.5f64.to_le_bytes());
        let mut offset = 0;
        let record = read_record(&buf, &mut offset).unwrap();
        assert_eq!(record.wire_type, WireType::SixtyFourBit);
        assert_eq!(record.payload.len(), 8);
    }

    #[test]
    fn rejects_group_wire_types() {
        let buf = varint_bytes((1 << 3) | 3);
        let mut offset = 0;
        assert!(read_record(&buf, &mut offset).is_err());
    }

    #[test]
    fn rejects_truncated_length_prefixed_payload() {
        let mut buf = varint_bytes((1 << 3) | 2);
        buf.push(10); // claims 10 bytes of payload, but none follow
        let mut offset = 0;
        let err = read_record(&buf, &mut offset).unwrap_err();
        assert_eq!(err.offset(), Some(2));
    }

    #[test]
    fn rejects_huge_length_prefix_without_overflowing() {
        // field 1, wire type 2 (length-delimited), length near u64::MAX.
        let mut buf = varint_bytes((1 << 3) | 2);
        buf.extend(varint_bytes(u64::MAX - 1));
        let mut offset = 0;
        let err = read_record(&buf, &mut offset).unwrap_err();
        assert_eq!(err.offset(), Some(buf.len()));
    }
}
