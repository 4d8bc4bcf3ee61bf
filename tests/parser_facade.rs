use std::io::Write;

use isobox::{BoxData, FourCC, Options, Parser};

fn minimal_file() -> Vec<u8> {
    let mut v = Vec::new();
    v.extend_from_slice(&16u32.to_be_bytes());
    v.extend_from_slice(b"ftyp");
    v.extend_from_slice(b"isom");
    v.extend_from_slice(&0u32.to_be_bytes());
    v
}

#[test]
fn parse_from_path_records_provenance() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tiny.mp4");
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(&minimal_file()).unwrap();

    let parser = Parser::with_file(&path).expect("parse failed");
    assert!(parser.file().is_some());
    assert_eq!(parser.path(), Some(path.as_path()));
}

#[test]
fn failed_parse_leaves_no_file() {
    let mut parser = Parser::new();
    assert!(parser.parse_bytes(&[0xFF; 32]).is_err());
    assert!(parser.file().is_none());
    assert!(parser.path().is_none());
}

#[test]
fn reparse_replaces_previous_tree() {
    let mut parser = Parser::new();
    parser.parse_bytes(&minimal_file()).unwrap();
    assert_eq!(parser.file().unwrap().children.len(), 1);

    // a second, failing parse drops the old tree
    assert!(parser.parse_bytes(&[0xFF; 32]).is_err());
    assert!(parser.file().is_none());
}

#[test]
fn options_bit_set_round_trips() {
    let mut parser = Parser::new();
    assert!(!parser.has_option(Options::KEEP_PAYLOAD));
    parser.add_option(Options::KEEP_PAYLOAD);
    assert!(parser.has_option(Options::KEEP_PAYLOAD));
    parser.remove_option(Options::KEEP_PAYLOAD);
    assert!(!parser.has_option(Options::KEEP_PAYLOAD));

    parser.set_options(Options::KEEP_PAYLOAD);
    assert_eq!(parser.options(), Options::KEEP_PAYLOAD);
}

#[test]
fn keep_payload_retains_raw_bytes_on_decoded_nodes() {
    let data = minimal_file();

    let mut plainly = Parser::new();
    plainly.parse_bytes(&data).unwrap();
    assert!(plainly.file().unwrap().children[0].raw.is_none());

    let mut keeping = Parser::new();
    keeping.add_option(Options::KEEP_PAYLOAD);
    keeping.parse_bytes(&data).unwrap();
    let ftyp = &keeping.file().unwrap().children[0];
    assert!(matches!(ftyp.data, BoxData::Ftyp(_)));
    assert_eq!(ftyp.raw.as_deref(), Some(&b"isom\x00\x00\x00\x00"[..]));
}

#[test]
fn info_map_is_cleared_at_parse_start() {
    let mut parser = Parser::new();
    parser.set_info("marker", 17u32);
    assert_eq!(parser.get_info::<u32>("marker"), Some(&17));

    parser.parse_bytes(&minimal_file()).unwrap();
    assert_eq!(parser.get_info::<u32>("marker"), None);

    // state attached after a parse sticks around until the next one
    parser.set_info("post", String::from("kept"));
    assert_eq!(parser.get_info::<String>("post").map(String::as_str), Some("kept"));
    parser.remove_info("post");
    assert_eq!(parser.get_info::<String>("post"), None);
}

#[test]
fn info_map_downcast_is_type_checked() {
    let mut parser = Parser::new();
    parser.set_info("n", 5u64);
    assert_eq!(parser.get_info::<u64>("n"), Some(&5));
    assert_eq!(parser.get_info::<u32>("n"), None);
}

#[test]
fn field_listing_includes_version_and_payload() {
    let mut v = minimal_file();
    let mut pitm = Vec::new();
    pitm.extend_from_slice(&14u32.to_be_bytes());
    pitm.extend_from_slice(b"pitm");
    pitm.extend_from_slice(&[0, 0, 0, 0]);
    pitm.extend_from_slice(&3u16.to_be_bytes());
    let mut meta_body = Vec::new();
    meta_body.extend_from_slice(&[0, 0, 0, 0]);
    meta_body.extend_from_slice(&pitm);
    v.extend_from_slice(&((8 + meta_body.len()) as u32).to_be_bytes());
    v.extend_from_slice(b"meta");
    v.extend_from_slice(&meta_body);

    let mut parser = Parser::new();
    parser.parse_bytes(&v).unwrap();
    let meta = parser.file().unwrap().find(FourCC(*b"meta")).unwrap();
    let pitm = &meta.children[0];

    let fields = pitm.fields();
    let names: Vec<&str> = fields.iter().map(|f| f.name).collect();
    assert_eq!(names, vec!["version", "flags", "item_id"]);
    assert_eq!(fields[2].value, "3");
}

#[test]
fn trees_clone_explicitly() {
    let mut parser = Parser::new();
    parser.parse_bytes(&minimal_file()).unwrap();
    let copy = parser.file().unwrap().clone();
    assert_eq!(copy.children.len(), 1);
    assert_eq!(copy.children[0].typ(), FourCC(*b"ftyp"));
}
