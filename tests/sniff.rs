use isobox::{BoxData, FourCC, ParseError, Parser};

#[test]
fn garbage_is_not_iso_media() {
    let data: &[u8] = &[
        0xDE, 0xAD, 0xBE, 0xEF, 0xDE, 0xAD, 0xBE, 0xEF, 0xDE, 0xAD, 0xBE, 0xEF, 0xDE, 0xAD,
        0xBE, 0xEF,
    ];
    let mut parser = Parser::new();
    match parser.parse_bytes(data) {
        Err(ParseError::NotIsoMedia) => {}
        other => panic!("expected NotIsoMedia, got {:?}", other),
    }
    assert!(parser.file().is_none());
}

#[test]
fn empty_input_fails() {
    let mut parser = Parser::new();
    assert!(parser.parse_bytes(&[]).is_err());
    assert!(parser.file().is_none());
}

#[test]
fn short_input_is_not_iso_media() {
    // Fewer than 8 bytes: the type field can't even be probed.
    let mut parser = Parser::new();
    match parser.parse_bytes(&[0, 0, 0, 8]) {
        Err(ParseError::NotIsoMedia) => {}
        other => panic!("expected NotIsoMedia, got {:?}", other),
    }
}

#[test]
fn all_accepted_leading_types_pass_the_sniff() {
    for typ in [b"ftyp", b"sinf", b"wide", b"free", b"skip", b"mdat", b"moov", b"pnot"] {
        let mut v = Vec::new();
        v.extend_from_slice(&8u32.to_be_bytes());
        v.extend_from_slice(typ);

        let mut parser = Parser::new();
        parser
            .parse_bytes(&v)
            .unwrap_or_else(|e| panic!("{} rejected: {}", FourCC(*typ), e));
        assert_eq!(parser.file().unwrap().children.len(), 1);
    }
}

#[test]
fn unregistered_top_level_box_yields_opaque_node() {
    // pnot passes the sniff but has no registered payload, so it must come
    // back as an opaque node rather than failing the parse.
    let mut v = Vec::new();
    v.extend_from_slice(&12u32.to_be_bytes());
    v.extend_from_slice(b"pnot");
    v.extend_from_slice(&[1, 2, 3, 4]);

    let mut parser = Parser::new();
    parser.parse_bytes(&v).expect("parse failed");
    let file = parser.file().unwrap();
    assert_eq!(file.children.len(), 1);
    let node = &file.children[0];
    assert_eq!(node.typ(), FourCC(*b"pnot"));
    assert!(matches!(node.data, BoxData::Unknown));
    assert_eq!(node.raw.as_deref(), Some(&[1, 2, 3, 4][..]));
}

#[test]
fn unknown_box_inside_container_does_not_fail_the_parent() {
    // moov { zzzz } — zzzz is nobody's type, the container still parses
    let mut inner = Vec::new();
    inner.extend_from_slice(&12u32.to_be_bytes());
    inner.extend_from_slice(b"zzzz");
    inner.extend_from_slice(&[9, 9, 9, 9]);

    let mut v = Vec::new();
    v.extend_from_slice(&((8 + inner.len()) as u32).to_be_bytes());
    v.extend_from_slice(b"moov");
    v.extend_from_slice(&inner);

    let mut parser = Parser::new();
    parser.parse_bytes(&v).expect("parse failed");
    let file = parser.file().unwrap();
    let moov = &file.children[0];
    assert_eq!(moov.children.len(), 1);
    assert_eq!(moov.children[0].typ(), FourCC(*b"zzzz"));
    assert!(matches!(moov.children[0].data, BoxData::Unknown));
}
