use std::fmt;

use serde::Serialize;

use crate::known_boxes::BoxData;

/// Four-character box type code. Case-sensitive, space-padded
/// (`"url "` and `"urn "` carry a trailing space).
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    pub fn from_str(s: &str) -> Option<Self> {
        let b = s.as_bytes();
        if b.len() == 4 {
            Some(FourCC([b[0], b[1], b[2], b[3]]))
        } else {
            None
        }
    }

    pub fn as_str_lossy(&self) -> String {
        self.0
            .iter()
            .map(|&c| if (32..=126).contains(&c) { c as char } else { '.' })
            .collect()
    }
}

impl Default for FourCC {
    fn default() -> Self {
        FourCC(*b"    ")
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str_lossy())
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str_lossy())
    }
}

impl Serialize for FourCC {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.as_str_lossy())
    }
}

/// Decoded length/type preamble of a single box.
#[derive(Debug, Clone, Serialize)]
pub struct BoxHeader {
    /// Total size on the wire including the header. A source value of 0
    /// ("extends to end of parent") is resolved to the real length during
    /// framing.
    pub size: u64,
    /// 4CC, or `b"uuid"` when `uuid` is set.
    pub typ: FourCC,
    /// Extended user type following a `uuid` type code.
    pub uuid: Option<[u8; 16]>,
    /// 8, 16, 24 or 32 depending on the 64-bit-size and uuid forms.
    pub header_size: u64,
    /// Absolute offset of the header start in the source.
    pub start: u64,
}

impl BoxHeader {
    /// Absolute offset one past the last byte of this box.
    pub fn end(&self) -> u64 {
        self.start + self.size
    }

    /// Absolute offset of the first body byte.
    pub fn body_start(&self) -> u64 {
        self.start + self.header_size
    }
}

/// A single parsed box: common wire attributes plus a typed payload.
#[derive(Debug, Clone, Serialize)]
pub struct BoxNode {
    pub header: BoxHeader,
    /// Version byte, present for full boxes.
    pub version: Option<u8>,
    /// 24-bit flags word, present for full boxes.
    pub flags: Option<u32>,
    /// Ordered child boxes. Source order is preserved; it is semantically
    /// significant for `ipco` and friends.
    pub children: Vec<BoxNode>,
    /// Raw body bytes. Always present for opaque nodes (unknown types and
    /// contained decoder failures); present on decoded nodes when the
    /// parser runs with `Options::KEEP_PAYLOAD`. Serialized as a byte count
    /// so a JSON dump stays readable next to a multi-megabyte `mdat`.
    #[serde(
        rename = "raw_len",
        skip_serializing_if = "Option::is_none",
        serialize_with = "raw_as_len"
    )]
    pub raw: Option<Vec<u8>>,
    pub data: BoxData,
}

impl BoxNode {
    pub fn new(header: BoxHeader, data: BoxData) -> Self {
        BoxNode {
            header,
            version: None,
            flags: None,
            children: Vec::new(),
            raw: None,
            data,
        }
    }

    pub fn typ(&self) -> FourCC {
        self.header.typ
    }

    pub fn offset(&self) -> u64 {
        self.header.start
    }

    pub fn size_on_wire(&self) -> u64 {
        self.header.size
    }

    /// First direct child with the given type.
    pub fn find(&self, typ: FourCC) -> Option<&BoxNode> {
        self.children.iter().find(|c| c.header.typ == typ)
    }

    /// All direct children with the given type, in source order.
    pub fn find_all(&self, typ: FourCC) -> Vec<&BoxNode> {
        self.children.iter().filter(|c| c.header.typ == typ).collect()
    }

    /// Dynamic field list for printers. Version/flags lead when present,
    /// followed by the payload's own fields.
    pub fn fields(&self) -> Vec<Field> {
        let mut out = Vec::new();
        if let Some(v) = self.version {
            out.push(Field::new("version", v));
        }
        if let Some(f) = self.flags {
            out.push(Field::new("flags", format!("{:#08x}", f)));
        }
        out.extend(self.data.fields());
        out
    }
}

fn raw_as_len<S: serde::Serializer>(v: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
    match v {
        Some(bytes) => s.serialize_u64(bytes.len() as u64),
        None => s.serialize_none(),
    }
}

/// Synthetic root: owns the top-level boxes and has no header of its own.
#[derive(Debug, Clone, Default, Serialize)]
pub struct File {
    pub children: Vec<BoxNode>,
}

impl File {
    pub fn find(&self, typ: FourCC) -> Option<&BoxNode> {
        self.children.iter().find(|c| c.header.typ == typ)
    }

    pub fn find_all(&self, typ: FourCC) -> Vec<&BoxNode> {
        self.children.iter().filter(|c| c.header.typ == typ).collect()
    }
}

/// One named value in a box's dynamic field listing.
#[derive(Debug, Clone, Serialize)]
pub struct Field {
    pub name: &'static str,
    pub value: String,
}

impl Field {
    pub fn new(name: &'static str, value: impl ToString) -> Self {
        Field {
            name,
            value: value.to_string(),
        }
    }
}
