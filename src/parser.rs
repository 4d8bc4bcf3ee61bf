use std::any::Any;
use std::collections::HashMap;

use tracing::{debug, warn};

use crate::api::Options;
use crate::boxes::{BoxHeader, BoxNode};
use crate::known_boxes::{decode_box, BoxData};
use crate::reader::{BodyReader, StringType};
use crate::registry::Registry;

#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("data is not an ISO media file")]
    NotIsoMedia,
    #[error("unexpected end of data")]
    UnexpectedEof,
    #[error("invalid box size")]
    InvalidSize,
    #[error("box type must be 4 characters long")]
    InvalidType,
    #[error("box decoder failed: {0}")]
    DecoderFailure(String),
    #[error("io: {0}")]
    Io(std::io::Error),
}

impl From<std::io::Error> for ParseError {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            ParseError::UnexpectedEof
        } else {
            ParseError::Io(e)
        }
    }
}

pub type Result<T> = std::result::Result<T, ParseError>;

/// Caller-attached ancillary state, keyed by name. Decoders use it to pass
/// context to later or nested decoders within a single parse; it is cleared
/// at the start of every parse, so stale keys never leak across parses.
pub type InfoMap = HashMap<String, Box<dyn Any>>;

/// Per-parse state threaded through the container walk into typed decoders.
pub struct ParseContext<'a> {
    pub registry: &'a Registry,
    pub string_type: StringType,
    pub options: Options,
    pub info: &'a mut InfoMap,
}

impl ParseContext<'_> {
    pub fn set_info<T: Any>(&mut self, key: &str, value: T) {
        self.info.insert(key.to_string(), Box::new(value));
    }

    pub fn get_info<T: Any>(&self, key: &str) -> Option<&T> {
        self.info.get(key).and_then(|v| v.downcast_ref::<T>())
    }
}

/// Decode the length/type preamble of the next box.
///
/// Handles the 32-bit, 64-bit (`size_u32 == 1`) and to-end-of-parent
/// (`size_u32 == 0`) length encodings, plus the 16-byte extended type
/// following a `uuid` type code. The reader's bound is the parent bound:
/// a to-end box resolves its size against it, and a declared size crossing
/// it is rejected.
pub fn read_box_header(r: &mut BodyReader<'_>) -> Result<BoxHeader> {
    let start = r.tell()?;
    let size32 = r.read_u32()?;
    let typ = r.read_fourcc()?;
    let mut size = size32 as u64;

    if size32 == 1 {
        size = r.read_u64()?;
    }

    let mut uuid = None;
    if &typ.0 == b"uuid" {
        let mut u = [0u8; 16];
        r.read_exact(&mut u)?;
        uuid = Some(u);
    }

    let header_size = match (size32 == 1, uuid.is_some()) {
        (true, true) => 8 + 8 + 16,
        (true, false) => 8 + 8,
        (false, true) => 8 + 16,
        (false, false) => 8,
    } as u64;

    if size == 0 {
        // Box extends to the end of the enclosing container.
        size = r.bound() - start;
    }

    if size < header_size || start + size > r.bound() {
        return Err(ParseError::InvalidSize);
    }

    Ok(BoxHeader {
        size,
        typ,
        uuid,
        header_size,
        start,
    })
}

/// Walk a bounded region as a sequence of boxes.
///
/// For each header: construct the typed node through the registry, recurse
/// into containers, hand leaves a body-bounded reader, then advance to the
/// declared end no matter how much the decoder consumed. Framing errors at
/// this level abort the parse; errors inside a typed decoder demote the
/// node to an opaque one carrying its raw body and parsing continues with
/// the next sibling.
pub fn parse_children(r: &mut BodyReader<'_>, ctx: &mut ParseContext<'_>) -> Result<Vec<BoxNode>> {
    let mut kids = Vec::new();

    while r.has_bytes()? {
        let hdr = read_box_header(r)?;
        let box_end = hdr.end();
        let body_start = hdr.body_start();
        debug!(typ = %hdr.typ, offset = hdr.start, size = hdr.size, "box");

        let data = ctx.registry.create(hdr.typ);
        let mut node = BoxNode::new(hdr, data);

        match node.data {
            BoxData::Container => {
                r.seek(body_start)?;
                let mut body = r.sub(box_end);
                node.children = parse_children(&mut body, ctx)?;
            }
            BoxData::Unknown => {
                r.seek(body_start)?;
                let mut body = r.sub(box_end);
                node.raw = Some(body.read_to_end()?);
            }
            _ => {
                r.seek(body_start)?;
                let mut body = r.sub(box_end);
                match decode_box(&mut node, &mut body, ctx) {
                    Ok(()) => {
                        if ctx.options.contains(Options::KEEP_PAYLOAD) {
                            r.seek(body_start)?;
                            node.raw = Some(r.sub(box_end).read_to_end()?);
                        }
                    }
                    Err(e) => {
                        warn!(typ = %node.header.typ, offset = node.header.start, error = %e,
                              "box decoder failed, keeping raw payload");
                        node.data = BoxData::Unknown;
                        node.version = None;
                        node.flags = None;
                        node.children.clear();
                        r.seek(body_start)?;
                        node.raw = Some(r.sub(box_end).read_to_end()?);
                    }
                }
            }
        }

        r.seek(box_end)?;
        kids.push(node);
    }

    Ok(kids)
}
