use isobox::known_boxes::Irot;
use isobox::{default_registry, BoxData, FourCC, ParseError, Parser};

#[test]
fn default_registry_knows_the_standard_types() {
    let reg = default_registry();
    for cc in [b"moov", b"trak", b"mdia", b"minf", b"stbl", b"iprp", b"ipco"] {
        assert!(matches!(reg.create(FourCC(*cc)), BoxData::Container));
    }
    assert!(matches!(reg.create(FourCC(*b"ftyp")), BoxData::Ftyp(_)));
    assert!(matches!(reg.create(FourCC(*b"mvhd")), BoxData::Mvhd(_)));
    assert!(matches!(reg.create(FourCC(*b"url ")), BoxData::Url(_)));
    assert!(matches!(reg.create(FourCC(*b"urn ")), BoxData::Urn(_)));
    assert!(matches!(reg.create(FourCC(*b"hvcC")), BoxData::HvcC(_)));
    assert!(matches!(reg.create(FourCC(*b"dimg")), BoxData::ItemRef(_)));
}

#[test]
fn unregistered_type_creates_opaque_payload() {
    let reg = default_registry();
    assert!(matches!(reg.create(FourCC(*b"zzzz")), BoxData::Unknown));
}

#[test]
fn registration_rejects_bad_type_lengths() {
    let mut parser = Parser::new();
    for bad in ["", "abc", "abcde"] {
        match parser.register_container_box(bad) {
            Err(ParseError::InvalidType) => {}
            other => panic!("{:?} accepted: {:?}", bad, other),
        }
    }
    // 4 bytes is fine, including a trailing space
    parser.register_container_box("cst ").unwrap();
}

#[test]
fn latest_registration_wins() {
    let mut parser = Parser::new();
    parser.register_container_box("cust").unwrap();
    assert!(matches!(
        parser.create_box("cust").unwrap(),
        BoxData::Container
    ));

    parser
        .register_box("cust", || BoxData::Irot(Irot::default()))
        .unwrap();
    assert!(matches!(
        parser.create_box("cust").unwrap(),
        BoxData::Irot(_)
    ));
}

#[test]
fn create_box_validates_type_length() {
    let parser = Parser::new();
    assert!(matches!(
        parser.create_box("abc"),
        Err(ParseError::InvalidType)
    ));
    assert!(matches!(parser.create_box("zzzz"), Ok(BoxData::Unknown)));
    assert!(matches!(parser.create_box("ftyp"), Ok(BoxData::Ftyp(_))));
}

#[test]
fn registered_container_nests_known_children() {
    // cust { ispe } after a leading ftyp so the sniff passes
    let mut ispe = Vec::new();
    ispe.extend_from_slice(&20u32.to_be_bytes());
    ispe.extend_from_slice(b"ispe");
    ispe.extend_from_slice(&[0, 0, 0, 0]); // version/flags
    ispe.extend_from_slice(&640u32.to_be_bytes());
    ispe.extend_from_slice(&480u32.to_be_bytes());

    let mut cust = Vec::new();
    cust.extend_from_slice(&((8 + ispe.len()) as u32).to_be_bytes());
    cust.extend_from_slice(b"cust");
    cust.extend_from_slice(&ispe);

    let mut v = Vec::new();
    v.extend_from_slice(&16u32.to_be_bytes());
    v.extend_from_slice(b"ftyp");
    v.extend_from_slice(b"isom");
    v.extend_from_slice(&0u32.to_be_bytes());
    v.extend_from_slice(&cust);

    let mut parser = Parser::new();
    parser.register_container_box("cust").unwrap();
    parser.parse_bytes(&v).expect("parse failed");

    let file = parser.file().unwrap();
    assert_eq!(file.children.len(), 2);
    let cust = &file.children[1];
    assert_eq!(cust.typ(), FourCC(*b"cust"));
    assert!(matches!(cust.data, BoxData::Container));
    assert_eq!(cust.children.len(), 1);
    match &cust.children[0].data {
        BoxData::Ispe(i) => {
            assert_eq!(i.width, 640);
            assert_eq!(i.height, 480);
        }
        other => panic!("expected ispe payload, got {:?}", other),
    }
}

#[test]
fn registries_are_per_parser() {
    let mut parser = Parser::new();
    parser.register_container_box("cust").unwrap();
    // a second parser never sees the first one's bindings
    let other = Parser::new();
    assert!(matches!(other.create_box("cust").unwrap(), BoxData::Unknown));
    assert!(matches!(
        parser.create_box("cust").unwrap(),
        BoxData::Container
    ));
}
