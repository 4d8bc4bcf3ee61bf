use serde::Serialize;

use crate::boxes::{BoxNode, Field, FourCC};
use crate::parser::{parse_children, ParseContext, Result};
use crate::reader::{BodyReader, StringType};

/// Info-map key under which `iref` publishes its version for the nested
/// reference decoders.
pub const IREF_VERSION_KEY: &str = "iref.version";

/// Typed payload of a box: one case per recognized kind plus the opaque
/// case. Containers carry no payload of their own; their children live on
/// the node.
#[derive(Debug, Clone, Serialize)]
pub enum BoxData {
    Container,
    Unknown,
    Ftyp(Ftyp),
    Mvhd(Mvhd),
    Tkhd(Tkhd),
    Mdhd(Mdhd),
    Hdlr(Hdlr),
    Meta,
    Pitm(Pitm),
    Iinf(Iinf),
    Infe(Infe),
    Iref,
    Iloc(Iloc),
    Dref(Dref),
    Url(Url),
    Urn(Urn),
    Irot(Irot),
    HvcC(HvcC),
    ItemRef(ItemRef),
    Colr(Colr),
    Ispe(Ispe),
    Ipma(Ipma),
    Pixi(Pixi),
    Stsd(Stsd),
    Stts(Stts),
    Frma(Frma),
    Schm(Schm),
}

impl BoxData {
    /// Full boxes start their body with a version byte and 24 bits of flags.
    fn is_full_box(&self) -> bool {
        matches!(
            self,
            BoxData::Mvhd(_)
                | BoxData::Tkhd(_)
                | BoxData::Mdhd(_)
                | BoxData::Hdlr(_)
                | BoxData::Meta
                | BoxData::Pitm(_)
                | BoxData::Iinf(_)
                | BoxData::Infe(_)
                | BoxData::Iref
                | BoxData::Iloc(_)
                | BoxData::Dref(_)
                | BoxData::Url(_)
                | BoxData::Urn(_)
                | BoxData::Ispe(_)
                | BoxData::Ipma(_)
                | BoxData::Pixi(_)
                | BoxData::Stsd(_)
                | BoxData::Stts(_)
                | BoxData::Schm(_)
        )
    }
}

/// Decode a leaf or mixed box body into its typed payload.
///
/// Reads the full-box preamble where the kind calls for it, then hands the
/// bounded body to the kind's decoder. Mixed kinds (`meta`, `iinf`, `dref`,
/// `stsd`, `iref`) decode their fixed prefix and delegate the tail back to
/// the container walker.
pub fn decode_box(
    node: &mut BoxNode,
    r: &mut BodyReader<'_>,
    ctx: &mut ParseContext<'_>,
) -> Result<()> {
    let mut data = std::mem::replace(&mut node.data, BoxData::Unknown);

    let result = (|| {
        let (version, flags) = if data.is_full_box() {
            let (v, f) = r.read_version_flags()?;
            node.version = Some(v);
            node.flags = Some(f);
            (v, f)
        } else {
            (0, 0)
        };

        match &mut data {
            BoxData::Container | BoxData::Unknown => Ok(()),
            BoxData::Ftyp(b) => b.read(r),
            BoxData::Mvhd(b) => b.read(version, r),
            BoxData::Tkhd(b) => b.read(version, r),
            BoxData::Mdhd(b) => b.read(version, r),
            BoxData::Hdlr(b) => b.read(ctx.string_type, r),
            BoxData::Meta => {
                node.children = parse_children(r, ctx)?;
                Ok(())
            }
            BoxData::Pitm(b) => b.read(version, r),
            BoxData::Iinf(b) => {
                b.read(version, r)?;
                node.children = parse_children(r, ctx)?;
                Ok(())
            }
            BoxData::Infe(b) => b.read(version, r),
            BoxData::Iref => {
                ctx.set_info(IREF_VERSION_KEY, version);
                node.children = parse_children(r, ctx)?;
                Ok(())
            }
            BoxData::Iloc(b) => b.read(version, r),
            BoxData::Dref(b) => {
                b.read(r)?;
                node.children = parse_children(r, ctx)?;
                Ok(())
            }
            BoxData::Url(b) => b.read(flags, r),
            BoxData::Urn(b) => b.read(r),
            BoxData::Irot(b) => b.read(r),
            BoxData::HvcC(b) => b.read(r),
            BoxData::ItemRef(b) => b.read(ctx, r),
            BoxData::Colr(b) => b.read(r),
            BoxData::Ispe(b) => b.read(r),
            BoxData::Ipma(b) => b.read(version, flags, r),
            BoxData::Pixi(b) => b.read(r),
            BoxData::Stsd(b) => {
                b.read(r)?;
                node.children = parse_children(r, ctx)?;
                Ok(())
            }
            BoxData::Stts(b) => b.read(r),
            BoxData::Frma(b) => b.read(r),
            BoxData::Schm(b) => b.read(flags, r),
        }
    })();

    node.data = data;
    result
}

// ---------- helpers ----------

/// ISO 639-2/T code packed as three 5-bit values biased by 0x60.
fn lang_from_u16(code: u16) -> String {
    if code == 0 {
        return "und".to_string();
    }
    let c1 = ((code >> 10) & 0x1F) as u8 + 0x60;
    let c2 = ((code >> 5) & 0x1F) as u8 + 0x60;
    let c3 = (code & 0x1F) as u8 + 0x60;
    format!("{}{}{}", c1 as char, c2 as char, c3 as char)
}

/// CICP colour primaries (ISO/IEC 23091-2, table 2), well-known values.
pub fn colour_primaries_name(v: u16) -> &'static str {
    match v {
        1 => "BT.709",
        4 => "BT.470M",
        5 => "BT.470BG",
        6 => "BT.601",
        7 => "SMPTE 240M",
        9 => "BT.2020",
        11 => "DCI-P3",
        12 => "Display P3",
        _ => "unknown",
    }
}

/// CICP transfer characteristics, well-known values.
pub fn transfer_characteristics_name(v: u16) -> &'static str {
    match v {
        1 => "BT.709",
        4 => "Gamma 2.2",
        5 => "Gamma 2.8",
        6 => "BT.601",
        7 => "SMPTE 240M",
        8 => "Linear",
        13 => "IEC 61966-2-1",
        14 => "BT.2020 (10-bit)",
        15 => "BT.2020 (12-bit)",
        16 => "SMPTE ST 2084 (PQ)",
        18 => "ARIB STD-B67 (HLG)",
        _ => "unknown",
    }
}

/// CICP matrix coefficients, well-known values.
pub fn matrix_coefficients_name(v: u16) -> &'static str {
    match v {
        0 => "Identity",
        1 => "BT.709",
        5 => "BT.470BG",
        6 => "BT.601",
        7 => "SMPTE 240M",
        9 => "BT.2020 (non-constant)",
        10 => "BT.2020 (constant)",
        _ => "unknown",
    }
}

// ---------- ftyp ----------

#[derive(Debug, Clone, Default, Serialize)]
pub struct Ftyp {
    pub major_brand: FourCC,
    pub minor_version: u32,
    pub compatible_brands: Vec<FourCC>,
}

impl Ftyp {
    fn read(&mut self, r: &mut BodyReader<'_>) -> Result<()> {
        self.major_brand = r.read_fourcc()?;
        self.minor_version = r.read_u32()?;
        while r.remaining()? >= 4 {
            self.compatible_brands.push(r.read_fourcc()?);
        }
        Ok(())
    }

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::new("major_brand", self.major_brand),
            Field::new("minor_version", self.minor_version),
            Field::new(
                "compatible_brands",
                self.compatible_brands
                    .iter()
                    .map(|b| b.to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
        ]
    }
}

// ---------- mvhd ----------

#[derive(Debug, Clone, Default, Serialize)]
pub struct Mvhd {
    pub creation_time: u64,
    pub modification_time: u64,
    pub timescale: u32,
    pub duration: u64,
    pub rate: f64,
    pub volume: f64,
    pub matrix: [i32; 9],
    pub predefined: [u32; 6],
    pub next_track_id: u32,
}

impl Mvhd {
    fn read(&mut self, version: u8, r: &mut BodyReader<'_>) -> Result<()> {
        if version == 1 {
            self.creation_time = r.read_u64()?;
            self.modification_time = r.read_u64()?;
            self.timescale = r.read_u32()?;
            self.duration = r.read_u64()?;
        } else {
            self.creation_time = r.read_u32()? as u64;
            self.modification_time = r.read_u32()? as u64;
            self.timescale = r.read_u32()?;
            self.duration = r.read_u32()? as u64;
        }
        self.rate = r.read_fixed_16_16()?;
        self.volume = r.read_fixed_8_8()?;
        r.skip(2)?; // reserved
        r.skip(8)?; // reserved[2]
        for m in self.matrix.iter_mut() {
            *m = r.read_i32()?;
        }
        for p in self.predefined.iter_mut() {
            *p = r.read_u32()?;
        }
        self.next_track_id = r.read_u32()?;
        Ok(())
    }

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::new("creation_time", self.creation_time),
            Field::new("modification_time", self.modification_time),
            Field::new("timescale", self.timescale),
            Field::new("duration", self.duration),
            Field::new("rate", self.rate),
            Field::new("volume", self.volume),
            Field::new("next_track_id", self.next_track_id),
        ]
    }
}

// ---------- tkhd ----------

#[derive(Debug, Clone, Default, Serialize)]
pub struct Tkhd {
    pub creation_time: u64,
    pub modification_time: u64,
    pub track_id: u32,
    pub duration: u64,
    pub layer: u16,
    pub alternate_group: u16,
    pub volume: f64,
    pub matrix: [i32; 9],
    pub width: f64,
    pub height: f64,
}

impl Tkhd {
    fn read(&mut self, version: u8, r: &mut BodyReader<'_>) -> Result<()> {
        if version == 1 {
            self.creation_time = r.read_u64()?;
            self.modification_time = r.read_u64()?;
            self.track_id = r.read_u32()?;
            r.skip(4)?; // reserved
            self.duration = r.read_u64()?;
        } else {
            self.creation_time = r.read_u32()? as u64;
            self.modification_time = r.read_u32()? as u64;
            self.track_id = r.read_u32()?;
            r.skip(4)?; // reserved
            self.duration = r.read_u32()? as u64;
        }
        r.skip(8)?; // reserved[2]
        self.layer = r.read_u16()?;
        self.alternate_group = r.read_u16()?;
        self.volume = r.read_fixed_8_8()?;
        r.skip(2)?; // reserved
        for m in self.matrix.iter_mut() {
            *m = r.read_i32()?;
        }
        self.width = r.read_fixed_16_16()?;
        self.height = r.read_fixed_16_16()?;
        Ok(())
    }

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::new("track_id", self.track_id),
            Field::new("duration", self.duration),
            Field::new("layer", self.layer),
            Field::new("alternate_group", self.alternate_group),
            Field::new("volume", self.volume),
            Field::new("width", self.width),
            Field::new("height", self.height),
        ]
    }
}

// ---------- mdhd ----------

#[derive(Debug, Clone, Default, Serialize)]
pub struct Mdhd {
    pub creation_time: u64,
    pub modification_time: u64,
    pub timescale: u32,
    pub duration: u64,
    pub language: String,
    pub predefined: u16,
}

impl Mdhd {
    fn read(&mut self, version: u8, r: &mut BodyReader<'_>) -> Result<()> {
        if version == 1 {
            self.creation_time = r.read_u64()?;
            self.modification_time = r.read_u64()?;
            self.timescale = r.read_u32()?;
            self.duration = r.read_u64()?;
        } else {
            self.creation_time = r.read_u32()? as u64;
            self.modification_time = r.read_u32()? as u64;
            self.timescale = r.read_u32()?;
            self.duration = r.read_u32()? as u64;
        }
        self.language = lang_from_u16(r.read_u16()?);
        self.predefined = r.read_u16()?;
        Ok(())
    }

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::new("timescale", self.timescale),
            Field::new("duration", self.duration),
            Field::new("language", self.language.clone()),
        ]
    }
}

// ---------- hdlr ----------

#[derive(Debug, Clone, Default, Serialize)]
pub struct Hdlr {
    pub predefined: u32,
    pub handler_type: FourCC,
    pub name: String,
}

impl Hdlr {
    fn read(&mut self, string_type: StringType, r: &mut BodyReader<'_>) -> Result<()> {
        self.predefined = r.read_u32()?;
        self.handler_type = r.read_fourcc()?;
        r.skip(12)?; // reserved[3]

        // The name fills the rest of the body. Both encodings occur in the
        // wild, so honor the configured preference as a heuristic.
        let mut bytes = r.read_to_end()?;
        if string_type == StringType::Pascal
            && !bytes.is_empty()
            && bytes[0] as usize == bytes.len() - 1
        {
            bytes.remove(0);
        } else {
            while bytes.last() == Some(&0) {
                bytes.pop();
            }
        }
        self.name = String::from_utf8_lossy(&bytes).into_owned();
        Ok(())
    }

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::new("handler_type", self.handler_type),
            Field::new("name", self.name.clone()),
        ]
    }
}

// ---------- pitm ----------

#[derive(Debug, Clone, Default, Serialize)]
pub struct Pitm {
    pub item_id: u32,
}

impl Pitm {
    fn read(&mut self, version: u8, r: &mut BodyReader<'_>) -> Result<()> {
        self.item_id = if version == 0 {
            r.read_u16()? as u32
        } else {
            r.read_u32()?
        };
        Ok(())
    }

    fn fields(&self) -> Vec<Field> {
        vec![Field::new("item_id", self.item_id)]
    }
}

// ---------- iinf ----------

#[derive(Debug, Clone, Default, Serialize)]
pub struct Iinf {
    pub entry_count: u32,
}

impl Iinf {
    fn read(&mut self, version: u8, r: &mut BodyReader<'_>) -> Result<()> {
        self.entry_count = if version < 2 {
            r.read_u16()? as u32
        } else {
            r.read_u32()?
        };
        Ok(())
    }

    fn fields(&self) -> Vec<Field> {
        vec![Field::new("entry_count", self.entry_count)]
    }
}

// ---------- infe ----------

#[derive(Debug, Clone, Default, Serialize)]
pub struct Infe {
    pub item_id: u32,
    pub item_protection_index: u16,
    pub item_type: Option<FourCC>,
    pub item_name: String,
    pub content_type: Option<String>,
    pub content_encoding: Option<String>,
    pub item_uri_type: Option<String>,
}

impl Infe {
    fn read(&mut self, version: u8, r: &mut BodyReader<'_>) -> Result<()> {
        if version < 2 {
            self.item_id = r.read_u16()? as u32;
            self.item_protection_index = r.read_u16()?;
            if r.has_bytes()? {
                self.item_name = r.read_cstring()?;
            }
            if r.has_bytes()? {
                self.content_type = Some(r.read_cstring()?);
            }
            if r.has_bytes()? {
                self.content_encoding = Some(r.read_cstring()?);
            }
        } else {
            self.item_id = if version == 2 {
                r.read_u16()? as u32
            } else {
                r.read_u32()?
            };
            self.item_protection_index = r.read_u16()?;
            let item_type = r.read_fourcc()?;
            self.item_type = Some(item_type);
            if r.has_bytes()? {
                self.item_name = r.read_cstring()?;
            }
            match &item_type.0 {
                b"mime" => {
                    if r.has_bytes()? {
                        self.content_type = Some(r.read_cstring()?);
                    }
                    if r.has_bytes()? {
                        self.content_encoding = Some(r.read_cstring()?);
                    }
                }
                b"uri " => {
                    if r.has_bytes()? {
                        self.item_uri_type = Some(r.read_cstring()?);
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn fields(&self) -> Vec<Field> {
        let mut out = vec![
            Field::new("item_id", self.item_id),
            Field::new("item_protection_index", self.item_protection_index),
        ];
        if let Some(t) = self.item_type {
            out.push(Field::new("item_type", t));
        }
        if !self.item_name.is_empty() {
            out.push(Field::new("item_name", self.item_name.clone()));
        }
        if let Some(ct) = &self.content_type {
            out.push(Field::new("content_type", ct.clone()));
        }
        if let Some(ce) = &self.content_encoding {
            out.push(Field::new("content_encoding", ce.clone()));
        }
        if let Some(u) = &self.item_uri_type {
            out.push(Field::new("item_uri_type", u.clone()));
        }
        out
    }
}

// ---------- iloc ----------

#[derive(Debug, Clone, Default, Serialize)]
pub struct IlocExtent {
    pub index: u64,
    pub offset: u64,
    pub length: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IlocItem {
    pub item_id: u32,
    pub construction_method: u8,
    pub data_reference_index: u16,
    pub base_offset: u64,
    pub extents: Vec<IlocExtent>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Iloc {
    pub offset_size: u8,
    pub length_size: u8,
    pub base_offset_size: u8,
    pub index_size: u8,
    pub items: Vec<IlocItem>,
}

impl Iloc {
    fn read(&mut self, version: u8, r: &mut BodyReader<'_>) -> Result<()> {
        let b = r.read_u8()?;
        self.offset_size = (b >> 4) & 0xF;
        self.length_size = b & 0xF;
        let b = r.read_u8()?;
        self.base_offset_size = (b >> 4) & 0xF;
        self.index_size = if version >= 1 { b & 0xF } else { 0 };

        let item_count = if version < 2 {
            r.read_u16()? as u32
        } else {
            r.read_u32()?
        };

        for _ in 0..item_count {
            let mut item = IlocItem {
                item_id: if version < 2 {
                    r.read_u16()? as u32
                } else {
                    r.read_u32()?
                },
                ..Default::default()
            };
            if version == 1 || version == 2 {
                item.construction_method = (r.read_u16()? & 0xF) as u8;
            }
            item.data_reference_index = r.read_u16()?;
            item.base_offset = r.read_sized_uint(self.base_offset_size)?;

            let extent_count = r.read_u16()?;
            for _ in 0..extent_count {
                let index = if (version == 1 || version == 2) && self.index_size > 0 {
                    r.read_sized_uint(self.index_size)?
                } else {
                    0
                };
                let offset = r.read_sized_uint(self.offset_size)?;
                let length = r.read_sized_uint(self.length_size)?;
                item.extents.push(IlocExtent {
                    index,
                    offset,
                    length,
                });
            }
            self.items.push(item);
        }
        Ok(())
    }

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::new("offset_size", self.offset_size),
            Field::new("length_size", self.length_size),
            Field::new("base_offset_size", self.base_offset_size),
            Field::new("index_size", self.index_size),
            Field::new("item_count", self.items.len()),
        ]
    }
}

// ---------- dref ----------

#[derive(Debug, Clone, Default, Serialize)]
pub struct Dref {
    pub entry_count: u32,
}

impl Dref {
    fn read(&mut self, r: &mut BodyReader<'_>) -> Result<()> {
        self.entry_count = r.read_u32()?;
        Ok(())
    }

    fn fields(&self) -> Vec<Field> {
        vec![Field::new("entry_count", self.entry_count)]
    }
}

// ---------- url / urn ----------

#[derive(Debug, Clone, Default, Serialize)]
pub struct Url {
    pub location: Option<String>,
}

impl Url {
    fn read(&mut self, flags: u32, r: &mut BodyReader<'_>) -> Result<()> {
        // flags bit 0 set means the media data lives in the same file and
        // no location string follows.
        if flags & 1 == 0 && r.has_bytes()? {
            self.location = Some(r.read_cstring()?);
        }
        Ok(())
    }

    fn fields(&self) -> Vec<Field> {
        match &self.location {
            Some(l) => vec![Field::new("location", l.clone())],
            None => vec![Field::new("location", "(self-contained)")],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Urn {
    pub name: Option<String>,
    pub location: Option<String>,
}

impl Urn {
    fn read(&mut self, r: &mut BodyReader<'_>) -> Result<()> {
        if r.has_bytes()? {
            self.name = Some(r.read_cstring()?);
        }
        if r.has_bytes()? {
            self.location = Some(r.read_cstring()?);
        }
        Ok(())
    }

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::new("name", self.name.clone().unwrap_or_default()),
            Field::new("location", self.location.clone().unwrap_or_default()),
        ]
    }
}

// ---------- irot ----------

#[derive(Debug, Clone, Default, Serialize)]
pub struct Irot {
    /// Counter-clockwise rotation in degrees: 0, 90, 180 or 270.
    pub rotation: u16,
}

impl Irot {
    fn read(&mut self, r: &mut BodyReader<'_>) -> Result<()> {
        self.rotation = (r.read_u8()? & 0x3) as u16 * 90;
        Ok(())
    }

    fn fields(&self) -> Vec<Field> {
        vec![Field::new("rotation", self.rotation)]
    }
}

// ---------- hvcC ----------

#[derive(Debug, Clone, Default, Serialize)]
pub struct HvcCArray {
    pub array_completeness: bool,
    pub nal_unit_type: u8,
    pub nalus: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct HvcC {
    pub configuration_version: u8,
    pub general_profile_space: u8,
    pub general_tier_flag: bool,
    pub general_profile_idc: u8,
    pub general_profile_compatibility_flags: u32,
    pub general_constraint_indicator_flags: u64,
    pub general_level_idc: u8,
    pub min_spatial_segmentation_idc: u16,
    pub parallelism_type: u8,
    pub chroma_format: u8,
    pub bit_depth_luma_minus8: u8,
    pub bit_depth_chroma_minus8: u8,
    pub avg_frame_rate: u16,
    pub constant_frame_rate: u8,
    pub num_temporal_layers: u8,
    pub temporal_id_nested: bool,
    pub length_size_minus_one: u8,
    pub arrays: Vec<HvcCArray>,
}

impl HvcC {
    fn read(&mut self, r: &mut BodyReader<'_>) -> Result<()> {
        self.configuration_version = r.read_u8()?;
        let b = r.read_u8()?;
        self.general_profile_space = (b >> 6) & 0x3;
        self.general_tier_flag = (b >> 5) & 0x1 != 0;
        self.general_profile_idc = b & 0x1F;
        self.general_profile_compatibility_flags = r.read_u32()?;
        self.general_constraint_indicator_flags =
            ((r.read_u16()? as u64) << 32) | r.read_u32()? as u64;
        self.general_level_idc = r.read_u8()?;
        self.min_spatial_segmentation_idc = r.read_u16()? & 0x0FFF;
        self.parallelism_type = r.read_u8()? & 0x3;
        self.chroma_format = r.read_u8()? & 0x3;
        self.bit_depth_luma_minus8 = r.read_u8()? & 0x7;
        self.bit_depth_chroma_minus8 = r.read_u8()? & 0x7;
        self.avg_frame_rate = r.read_u16()?;
        let b = r.read_u8()?;
        self.constant_frame_rate = (b >> 6) & 0x3;
        self.num_temporal_layers = (b >> 3) & 0x7;
        self.temporal_id_nested = (b >> 2) & 0x1 != 0;
        self.length_size_minus_one = b & 0x3;

        let num_arrays = r.read_u8()?;
        for _ in 0..num_arrays {
            let b = r.read_u8()?;
            let mut array = HvcCArray {
                array_completeness: (b >> 7) & 0x1 != 0,
                nal_unit_type: b & 0x3F,
                nalus: Vec::new(),
            };
            let num_nalus = r.read_u16()?;
            for _ in 0..num_nalus {
                let len = r.read_u16()? as usize;
                let mut nalu = vec![0u8; len];
                r.read_exact(&mut nalu)?;
                array.nalus.push(nalu);
            }
            self.arrays.push(array);
        }
        Ok(())
    }

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::new("configuration_version", self.configuration_version),
            Field::new("profile_space", self.general_profile_space),
            Field::new("tier_flag", self.general_tier_flag),
            Field::new("profile_idc", self.general_profile_idc),
            Field::new("level_idc", self.general_level_idc),
            Field::new("chroma_format", self.chroma_format),
            Field::new("bit_depth_luma", self.bit_depth_luma_minus8 + 8),
            Field::new("bit_depth_chroma", self.bit_depth_chroma_minus8 + 8),
            Field::new("nalu_length_size", self.length_size_minus_one + 1),
            Field::new("array_count", self.arrays.len()),
        ]
    }
}

// ---------- dimg / thmb / cdsc (inside iref) ----------

/// A single item-reference record. The box's own four-character code names
/// the relation; the id width follows the enclosing `iref` version.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ItemRef {
    pub from_item_id: u32,
    pub to_item_ids: Vec<u32>,
}

impl ItemRef {
    fn read(&mut self, ctx: &ParseContext<'_>, r: &mut BodyReader<'_>) -> Result<()> {
        let version = ctx.get_info::<u8>(IREF_VERSION_KEY).copied().unwrap_or(0);
        self.from_item_id = if version == 0 {
            r.read_u16()? as u32
        } else {
            r.read_u32()?
        };
        let count = r.read_u16()?;
        for _ in 0..count {
            let id = if version == 0 {
                r.read_u16()? as u32
            } else {
                r.read_u32()?
            };
            self.to_item_ids.push(id);
        }
        Ok(())
    }

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::new("from_item_id", self.from_item_id),
            Field::new(
                "to_item_ids",
                self.to_item_ids
                    .iter()
                    .map(|i| i.to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
        ]
    }
}

// ---------- colr ----------

#[derive(Debug, Clone, Default, Serialize)]
pub struct Colr {
    pub colour_type: FourCC,
    pub colour_primaries: Option<u16>,
    pub transfer_characteristics: Option<u16>,
    pub matrix_coefficients: Option<u16>,
    pub full_range: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icc_profile: Option<Vec<u8>>,
}

impl Colr {
    fn read(&mut self, r: &mut BodyReader<'_>) -> Result<()> {
        self.colour_type = r.read_fourcc()?;
        match &self.colour_type.0 {
            b"nclx" => {
                self.colour_primaries = Some(r.read_u16()?);
                self.transfer_characteristics = Some(r.read_u16()?);
                self.matrix_coefficients = Some(r.read_u16()?);
                self.full_range = Some((r.read_u8()? >> 7) & 0x1 != 0);
            }
            b"rICC" | b"prof" => {
                self.icc_profile = Some(r.read_to_end()?);
            }
            _ => {
                // Unrecognized colour type: leave the payload untouched.
            }
        }
        Ok(())
    }

    fn fields(&self) -> Vec<Field> {
        let mut out = vec![Field::new("colour_type", self.colour_type)];
        if let Some(p) = self.colour_primaries {
            out.push(Field::new(
                "colour_primaries",
                format!("{} ({})", p, colour_primaries_name(p)),
            ));
        }
        if let Some(t) = self.transfer_characteristics {
            out.push(Field::new(
                "transfer_characteristics",
                format!("{} ({})", t, transfer_characteristics_name(t)),
            ));
        }
        if let Some(m) = self.matrix_coefficients {
            out.push(Field::new(
                "matrix_coefficients",
                format!("{} ({})", m, matrix_coefficients_name(m)),
            ));
        }
        if let Some(f) = self.full_range {
            out.push(Field::new("full_range", f));
        }
        if let Some(p) = &self.icc_profile {
            out.push(Field::new("icc_profile", format!("{} bytes", p.len())));
        }
        out
    }
}

// ---------- ispe ----------

#[derive(Debug, Clone, Default, Serialize)]
pub struct Ispe {
    pub width: u32,
    pub height: u32,
}

impl Ispe {
    fn read(&mut self, r: &mut BodyReader<'_>) -> Result<()> {
        self.width = r.read_u32()?;
        self.height = r.read_u32()?;
        Ok(())
    }

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::new("width", self.width),
            Field::new("height", self.height),
        ]
    }
}

// ---------- ipma ----------

#[derive(Debug, Clone, Default, Serialize)]
pub struct IpmaAssociation {
    pub essential: bool,
    /// 1-based index into the sibling `ipco` child list.
    pub property_index: u16,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IpmaEntry {
    pub item_id: u32,
    pub associations: Vec<IpmaAssociation>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Ipma {
    pub entries: Vec<IpmaEntry>,
}

impl Ipma {
    fn read(&mut self, version: u8, flags: u32, r: &mut BodyReader<'_>) -> Result<()> {
        let entry_count = r.read_u32()?;
        for _ in 0..entry_count {
            let mut entry = IpmaEntry {
                item_id: if version < 1 {
                    r.read_u16()? as u32
                } else {
                    r.read_u32()?
                },
                ..Default::default()
            };
            let association_count = r.read_u8()?;
            for _ in 0..association_count {
                let assoc = if flags & 1 != 0 {
                    let v = r.read_u16()?;
                    IpmaAssociation {
                        essential: (v >> 15) & 0x1 != 0,
                        property_index: v & 0x7FFF,
                    }
                } else {
                    let v = r.read_u8()?;
                    IpmaAssociation {
                        essential: (v >> 7) & 0x1 != 0,
                        property_index: (v & 0x7F) as u16,
                    }
                };
                entry.associations.push(assoc);
            }
            self.entries.push(entry);
        }
        Ok(())
    }

    fn fields(&self) -> Vec<Field> {
        vec![Field::new("entry_count", self.entries.len())]
    }
}

// ---------- pixi ----------

#[derive(Debug, Clone, Default, Serialize)]
pub struct Pixi {
    pub bits_per_channel: Vec<u8>,
}

impl Pixi {
    fn read(&mut self, r: &mut BodyReader<'_>) -> Result<()> {
        let num_channels = r.read_u8()?;
        for _ in 0..num_channels {
            self.bits_per_channel.push(r.read_u8()?);
        }
        Ok(())
    }

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::new("num_channels", self.bits_per_channel.len()),
            Field::new(
                "bits_per_channel",
                self.bits_per_channel
                    .iter()
                    .map(|b| b.to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
        ]
    }
}

// ---------- stsd ----------

#[derive(Debug, Clone, Default, Serialize)]
pub struct Stsd {
    pub entry_count: u32,
}

impl Stsd {
    fn read(&mut self, r: &mut BodyReader<'_>) -> Result<()> {
        self.entry_count = r.read_u32()?;
        Ok(())
    }

    fn fields(&self) -> Vec<Field> {
        vec![Field::new("entry_count", self.entry_count)]
    }
}

// ---------- stts ----------

#[derive(Debug, Clone, Default, Serialize)]
pub struct SttsEntry {
    pub sample_count: u32,
    pub sample_delta: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Stts {
    pub entries: Vec<SttsEntry>,
}

impl Stts {
    fn read(&mut self, r: &mut BodyReader<'_>) -> Result<()> {
        let entry_count = r.read_u32()?;
        for _ in 0..entry_count {
            self.entries.push(SttsEntry {
                sample_count: r.read_u32()?,
                sample_delta: r.read_u32()?,
            });
        }
        Ok(())
    }

    fn fields(&self) -> Vec<Field> {
        let mut out = vec![Field::new("entry_count", self.entries.len())];
        if let Some(first) = self.entries.first() {
            out.push(Field::new(
                "first",
                format!(
                    "count={} delta={}",
                    first.sample_count, first.sample_delta
                ),
            ));
        }
        out
    }
}

// ---------- frma ----------

#[derive(Debug, Clone, Default, Serialize)]
pub struct Frma {
    pub original_format: FourCC,
}

impl Frma {
    fn read(&mut self, r: &mut BodyReader<'_>) -> Result<()> {
        self.original_format = r.read_fourcc()?;
        Ok(())
    }

    fn fields(&self) -> Vec<Field> {
        vec![Field::new("original_format", self.original_format)]
    }
}

// ---------- schm ----------

#[derive(Debug, Clone, Default, Serialize)]
pub struct Schm {
    pub scheme_type: FourCC,
    pub scheme_version: u32,
    pub scheme_uri: Option<String>,
}

impl Schm {
    fn read(&mut self, flags: u32, r: &mut BodyReader<'_>) -> Result<()> {
        self.scheme_type = r.read_fourcc()?;
        self.scheme_version = r.read_u32()?;
        if flags & 1 != 0 && r.has_bytes()? {
            self.scheme_uri = Some(r.read_cstring()?);
        }
        Ok(())
    }

    fn fields(&self) -> Vec<Field> {
        let mut out = vec![
            Field::new("scheme_type", self.scheme_type),
            Field::new("scheme_version", self.scheme_version),
        ];
        if let Some(u) = &self.scheme_uri {
            out.push(Field::new("scheme_uri", u.clone()));
        }
        out
    }
}

// ---------- dispatch: fields + names ----------

impl BoxData {
    /// Dynamic field listing for printers.
    pub fn fields(&self) -> Vec<Field> {
        match self {
            BoxData::Container | BoxData::Unknown | BoxData::Meta | BoxData::Iref => Vec::new(),
            BoxData::Ftyp(b) => b.fields(),
            BoxData::Mvhd(b) => b.fields(),
            BoxData::Tkhd(b) => b.fields(),
            BoxData::Mdhd(b) => b.fields(),
            BoxData::Hdlr(b) => b.fields(),
            BoxData::Pitm(b) => b.fields(),
            BoxData::Iinf(b) => b.fields(),
            BoxData::Infe(b) => b.fields(),
            BoxData::Iloc(b) => b.fields(),
            BoxData::Dref(b) => b.fields(),
            BoxData::Url(b) => b.fields(),
            BoxData::Urn(b) => b.fields(),
            BoxData::Irot(b) => b.fields(),
            BoxData::HvcC(b) => b.fields(),
            BoxData::ItemRef(b) => b.fields(),
            BoxData::Colr(b) => b.fields(),
            BoxData::Ispe(b) => b.fields(),
            BoxData::Ipma(b) => b.fields(),
            BoxData::Pixi(b) => b.fields(),
            BoxData::Stsd(b) => b.fields(),
            BoxData::Stts(b) => b.fields(),
            BoxData::Frma(b) => b.fields(),
            BoxData::Schm(b) => b.fields(),
        }
    }
}

/// Human-readable box name for UIs, e.g. "File Type Box".
pub fn full_name(typ: FourCC) -> &'static str {
    match &typ.0 {
        b"ftyp" => "File Type Box",
        b"moov" => "Movie Box",
        b"mvhd" => "Movie Header Box",
        b"trak" => "Track Box",
        b"tkhd" => "Track Header Box",
        b"edts" => "Edit Box",
        b"mdia" => "Media Box",
        b"mdhd" => "Media Header Box",
        b"hdlr" => "Handler Reference Box",
        b"minf" => "Media Information Box",
        b"stbl" => "Sample Table Box",
        b"stsd" => "Sample Description Box",
        b"stts" => "Decoding Time-to-Sample Box",
        b"mvex" => "Movie Extends Box",
        b"moof" => "Movie Fragment Box",
        b"traf" => "Track Fragment Box",
        b"mfra" => "Movie Fragment Random Access Box",
        b"meco" => "Additional Metadata Container Box",
        b"mere" => "Metabox Relation Box",
        b"dinf" => "Data Information Box",
        b"dref" => "Data Reference Box",
        b"url " => "Data Entry URL Box",
        b"urn " => "Data Entry URN Box",
        b"ipro" => "Item Protection Box",
        b"sinf" => "Protection Scheme Information Box",
        b"frma" => "Original Format Box",
        b"schm" => "Scheme Type Box",
        b"schi" => "Scheme Information Box",
        b"iprp" => "Item Properties Box",
        b"ipco" => "Item Property Container Box",
        b"ipma" => "Item Property Association Box",
        b"ispe" => "Image Spatial Extents Property",
        b"pixi" => "Pixel Information Property",
        b"irot" => "Image Rotation Property",
        b"colr" => "Colour Information Box",
        b"hvcC" => "HEVC Decoder Configuration Box",
        b"meta" => "Metadata Box",
        b"pitm" => "Primary Item Box",
        b"iinf" => "Item Information Box",
        b"infe" => "Item Info Entry Box",
        b"iloc" => "Item Location Box",
        b"iref" => "Item Reference Box",
        b"dimg" => "Derived Image Reference",
        b"thmb" => "Thumbnail Reference",
        b"cdsc" => "Content Description Reference",
        b"fiin" => "File Delivery Item Information Box",
        b"paen" => "Partition Entry Box",
        b"strk" => "Sub Track Box",
        b"tapt" => "Track Aperture Mode Dimensions Box",
        b"mdat" => "Media Data Box",
        b"free" => "Free Space Box",
        b"skip" => "Skip Box",
        b"wide" => "Wide Placeholder Box",
        b"pnot" => "Preview Box",
        b"uuid" => "UUID Box",
        _ => "Unknown Box",
    }
}
