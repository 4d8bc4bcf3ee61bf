use std::io::Cursor;

use isobox::{BodyReader, FourCC, ParseError, StringType};

fn reader_over(data: Vec<u8>) -> (Cursor<Vec<u8>>, u64) {
    let len = data.len() as u64;
    (Cursor::new(data), len)
}

#[test]
fn big_endian_integer_widths() {
    let (mut cur, len) = reader_over(vec![
        0x01, // u8
        0x02, 0x03, // u16
        0x04, 0x05, 0x06, // u24
        0x07, 0x08, 0x09, 0x0A, // u32
        0x0B, 0x0C, 0x0D, 0x0E, 0x0F, 0x10, 0x11, 0x12, // u64
    ]);
    let mut r = BodyReader::new(&mut cur, len);

    assert_eq!(r.read_u8().unwrap(), 0x01);
    assert_eq!(r.read_u16().unwrap(), 0x0203);
    assert_eq!(r.read_u24().unwrap(), 0x040506);
    assert_eq!(r.read_u32().unwrap(), 0x0708090A);
    assert_eq!(r.read_u64().unwrap(), 0x0B0C0D0E0F101112);
    assert!(!r.has_bytes().unwrap());
}

#[test]
fn fixed_point_reads() {
    let (mut cur, len) = reader_over(vec![
        0x00, 0x01, 0x80, 0x00, // 1.5 in 16.16
        0xFF, 0xFF, 0x00, 0x00, // -1.0 in 16.16
        0x01, 0x80, // 1.5 in 8.8
        0xFF, 0x00, // -1.0 in 8.8
    ]);
    let mut r = BodyReader::new(&mut cur, len);

    assert_eq!(r.read_fixed_16_16().unwrap(), 1.5);
    assert_eq!(r.read_fixed_16_16().unwrap(), -1.0);
    assert_eq!(r.read_fixed_8_8().unwrap(), 1.5);
    assert_eq!(r.read_fixed_8_8().unwrap(), -1.0);
}

#[test]
fn version_flags_preamble() {
    let (mut cur, len) = reader_over(vec![0x02, 0x00, 0x00, 0x01]);
    let mut r = BodyReader::new(&mut cur, len);
    let (version, flags) = r.read_version_flags().unwrap();
    assert_eq!(version, 2);
    assert_eq!(flags, 1);
}

#[test]
fn fourcc_read_is_verbatim() {
    let (mut cur, len) = reader_over(b"url ".to_vec());
    let mut r = BodyReader::new(&mut cur, len);
    assert_eq!(r.read_fourcc().unwrap(), FourCC(*b"url "));
}

#[test]
fn cstring_requires_a_terminator() {
    let (mut cur, len) = reader_over(b"hello\0world".to_vec());
    let mut r = BodyReader::new(&mut cur, len);
    assert_eq!(r.read_cstring().unwrap(), "hello");
    // "world" has no NUL before the bound
    assert!(matches!(r.read_cstring(), Err(ParseError::UnexpectedEof)));
}

#[test]
fn pstring_is_length_prefixed() {
    let (mut cur, len) = reader_over(vec![5, b'h', b'e', b'l', b'l', b'o', b'!']);
    let mut r = BodyReader::new(&mut cur, len);
    assert_eq!(r.read_pstring().unwrap(), "hello");
    assert_eq!(r.remaining().unwrap(), 1);
}

#[test]
fn preferred_string_type_falls_back() {
    // No NUL anywhere: the C-string attempt fails and the Pascal read wins.
    let (mut cur, len) = reader_over(vec![3, b'a', b'b', b'c']);
    let mut r = BodyReader::new(&mut cur, len);
    assert_eq!(r.read_string(StringType::NulTerminated).unwrap(), "abc");
}

#[test]
fn bound_refuses_reads_past_the_end() {
    let (mut cur, _) = reader_over(vec![1, 2, 3, 4, 5, 6, 7, 8]);
    // bound the view to the first four bytes
    let mut r = BodyReader::new(&mut cur, 4);

    assert_eq!(r.read_u32().unwrap(), 0x01020304);
    assert!(matches!(r.read_u8(), Err(ParseError::UnexpectedEof)));
    assert_eq!(r.remaining().unwrap(), 0);
}

#[test]
fn sub_view_narrows_the_bound() {
    let (mut cur, len) = reader_over(vec![0xAA; 16]);
    let mut r = BodyReader::new(&mut cur, len);
    let mut sub = r.sub(4);
    assert_eq!(sub.read_to_end().unwrap().len(), 4);
    assert!(matches!(sub.read_u8(), Err(ParseError::UnexpectedEof)));
    // a sub view can never widen the parent bound
    let mut wide = r.sub(99);
    assert_eq!(wide.bound(), len);
}

#[test]
fn tell_seek_remaining_agree() {
    let (mut cur, len) = reader_over((0u8..32).collect());
    let mut r = BodyReader::new(&mut cur, len);

    assert_eq!(r.tell().unwrap(), 0);
    assert_eq!(r.remaining().unwrap(), 32);
    r.seek(16).unwrap();
    assert_eq!(r.tell().unwrap(), 16);
    assert_eq!(r.remaining().unwrap(), 16);
    assert_eq!(r.read_u8().unwrap(), 16);
    r.skip(14).unwrap();
    assert_eq!(r.remaining().unwrap(), 1);
    assert!(r.skip(2).is_err());
}

#[test]
fn sized_uint_widths() {
    let (mut cur, len) = reader_over(vec![0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]);
    let mut r = BodyReader::new(&mut cur, len);
    assert_eq!(r.read_sized_uint(0).unwrap(), 0);
    assert_eq!(r.read_sized_uint(4).unwrap(), 0x01020304);
    assert_eq!(r.read_sized_uint(2).unwrap(), 0x0506);
}
