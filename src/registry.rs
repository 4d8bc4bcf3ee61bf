use std::collections::HashMap;

use crate::known_boxes::{
    BoxData, Colr, Dref, Frma, Ftyp, Hdlr, HvcC, Iinf, Iloc, Infe, Ipma, Irot, Ispe, ItemRef,
    Mdhd, Mvhd, Pitm, Pixi, Schm, Stsd, Stts, Tkhd, Url, Urn,
};
use crate::boxes::FourCC;
use crate::parser::ParseError;

/// Nullary constructor yielding an empty typed payload for a box type.
pub type BoxFactory = Box<dyn Fn() -> BoxData + Send + Sync>;

/// Mapping from four-character type code to payload factory.
///
/// Seeded with the default bindings at construction; user-extensible, and
/// re-registration overwrites (latest factory wins).
pub struct Registry {
    map: HashMap<FourCC, BoxFactory>,
}

impl Registry {
    /// Empty registry with no bindings at all.
    pub fn empty() -> Self {
        Registry {
            map: HashMap::new(),
        }
    }

    /// Registry pre-populated with the default bindings.
    pub fn new() -> Self {
        default_registry()
    }

    /// Bind a factory to a type. The type must be exactly 4 bytes
    /// (space-padded where needed, e.g. `"url "`).
    pub fn register(&mut self, typ: &str, factory: BoxFactory) -> Result<(), ParseError> {
        let cc = FourCC::from_str(typ).ok_or(ParseError::InvalidType)?;
        self.map.insert(cc, factory);
        Ok(())
    }

    /// Bind a type as a plain container of child boxes.
    pub fn register_container(&mut self, typ: &str) -> Result<(), ParseError> {
        self.register(typ, Box::new(|| BoxData::Container))
    }

    /// Construct the payload for a type; unknown types yield the opaque
    /// variant.
    pub fn create(&self, typ: FourCC) -> BoxData {
        match self.map.get(&typ) {
            Some(factory) => factory(),
            None => BoxData::Unknown,
        }
    }

    pub fn is_registered(&self, typ: FourCC) -> bool {
        self.map.contains_key(&typ)
    }

    fn seed(&mut self, typ: &[u8; 4], factory: BoxFactory) {
        self.map.insert(FourCC(*typ), factory);
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// The default bindings: the plain containers of ISO/IEC 14496-12 plus one
/// typed factory per recognized leaf or mixed box.
pub fn default_registry() -> Registry {
    let mut reg = Registry::empty();

    const CONTAINERS: [&[u8; 4]; 22] = [
        b"moov", b"trak", b"edts", b"mdia", b"minf", b"stbl", b"mvex", b"moof", b"traf",
        b"mfra", b"meco", b"mere", b"dinf", b"ipro", b"sinf", b"iprp", b"fiin", b"paen",
        b"strk", b"tapt", b"schi", b"ipco",
    ];
    for t in CONTAINERS {
        reg.seed(t, Box::new(|| BoxData::Container));
    }

    reg.seed(b"ftyp", Box::new(|| BoxData::Ftyp(Ftyp::default())));
    reg.seed(b"mvhd", Box::new(|| BoxData::Mvhd(Mvhd::default())));
    reg.seed(b"tkhd", Box::new(|| BoxData::Tkhd(Tkhd::default())));
    reg.seed(b"meta", Box::new(|| BoxData::Meta));
    reg.seed(b"hdlr", Box::new(|| BoxData::Hdlr(Hdlr::default())));
    reg.seed(b"mdhd", Box::new(|| BoxData::Mdhd(Mdhd::default())));
    reg.seed(b"pitm", Box::new(|| BoxData::Pitm(Pitm::default())));
    reg.seed(b"iinf", Box::new(|| BoxData::Iinf(Iinf::default())));
    reg.seed(b"dref", Box::new(|| BoxData::Dref(Dref::default())));
    reg.seed(b"url ", Box::new(|| BoxData::Url(Url::default())));
    reg.seed(b"urn ", Box::new(|| BoxData::Urn(Urn::default())));
    reg.seed(b"iloc", Box::new(|| BoxData::Iloc(Iloc::default())));
    reg.seed(b"iref", Box::new(|| BoxData::Iref));
    reg.seed(b"infe", Box::new(|| BoxData::Infe(Infe::default())));
    reg.seed(b"irot", Box::new(|| BoxData::Irot(Irot::default())));
    reg.seed(b"hvcC", Box::new(|| BoxData::HvcC(HvcC::default())));
    reg.seed(b"dimg", Box::new(|| BoxData::ItemRef(ItemRef::default())));
    reg.seed(b"thmb", Box::new(|| BoxData::ItemRef(ItemRef::default())));
    reg.seed(b"cdsc", Box::new(|| BoxData::ItemRef(ItemRef::default())));
    reg.seed(b"colr", Box::new(|| BoxData::Colr(Colr::default())));
    reg.seed(b"ispe", Box::new(|| BoxData::Ispe(Ispe::default())));
    reg.seed(b"ipma", Box::new(|| BoxData::Ipma(Ipma::default())));
    reg.seed(b"pixi", Box::new(|| BoxData::Pixi(Pixi::default())));
    reg.seed(b"stsd", Box::new(|| BoxData::Stsd(Stsd::default())));
    reg.seed(b"stts", Box::new(|| BoxData::Stts(Stts::default())));
    reg.seed(b"frma", Box::new(|| BoxData::Frma(Frma::default())));
    reg.seed(b"schm", Box::new(|| BoxData::Schm(Schm::default())));

    reg
}
