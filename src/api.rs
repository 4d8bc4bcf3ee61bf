use std::any::Any;
use std::io::{BufReader, Cursor};
use std::path::{Path, PathBuf};

use bitflags::bitflags;
use tracing::debug;

use crate::boxes::File;
use crate::known_boxes::BoxData;
use crate::parser::{parse_children, InfoMap, ParseContext, ParseError, Result};
use crate::reader::{BodyReader, ReadSeek, StringType};
use crate::registry::{BoxFactory, Registry};

bitflags! {
    /// Open-ended per-parser option bit-set. Bits are additive: they never
    /// change how byte layouts are decoded, only which optional fields a
    /// decoder synthesizes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Options: u64 {
        /// Successfully decoded nodes also retain their raw body bytes.
        const KEEP_PAYLOAD = 1 << 0;
    }
}

/// Box types accepted at the head of a stream. Anything else is rejected
/// as not being an ISO media file.
const TOP_LEVEL_TYPES: [&[u8; 4]; 8] = [
    b"ftyp", b"sinf", b"wide", b"free", b"skip", b"mdat", b"moov", b"pnot",
];

/// Parse orchestrator.
///
/// Owns the registry, the per-parse options and the parsed tree. One
/// `Parser` handles one parse at a time; run separate parsers for disjoint
/// inputs in parallel.
pub struct Parser {
    registry: Registry,
    string_type: StringType,
    options: Options,
    info: InfoMap,
    file: Option<File>,
    path: Option<PathBuf>,
}

impl Parser {
    pub fn new() -> Self {
        Parser {
            registry: Registry::new(),
            string_type: StringType::default(),
            options: Options::empty(),
            info: InfoMap::new(),
            file: None,
            path: None,
        }
    }

    /// Construct and immediately parse a file.
    pub fn with_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut p = Parser::new();
        p.parse_file(path)?;
        Ok(p)
    }

    /// Construct and immediately parse an in-memory buffer.
    pub fn with_bytes(data: &[u8]) -> Result<Self> {
        let mut p = Parser::new();
        p.parse_bytes(data)?;
        Ok(p)
    }

    /// Bind a payload factory to a four-character type. Fails with
    /// `InvalidType` unless the type is exactly 4 bytes; re-registration
    /// overwrites.
    pub fn register_box<F>(&mut self, typ: &str, factory: F) -> Result<()>
    where
        F: Fn() -> BoxData + Send + Sync + 'static,
    {
        self.registry.register(typ, Box::new(factory) as BoxFactory)
    }

    /// Bind a type as a plain container of child boxes.
    pub fn register_container_box(&mut self, typ: &str) -> Result<()> {
        self.registry.register_container(typ)
    }

    /// Construct an empty payload for a type through the registry.
    /// Unregistered types yield the opaque variant.
    pub fn create_box(&self, typ: &str) -> Result<BoxData> {
        let cc = crate::boxes::FourCC::from_str(typ).ok_or(ParseError::InvalidType)?;
        Ok(self.registry.create(cc))
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn preferred_string_type(&self) -> StringType {
        self.string_type
    }

    pub fn set_preferred_string_type(&mut self, value: StringType) {
        self.string_type = value;
    }

    pub fn options(&self) -> Options {
        self.options
    }

    pub fn set_options(&mut self, options: Options) {
        self.options = options;
    }

    pub fn add_option(&mut self, option: Options) {
        self.options |= option;
    }

    pub fn remove_option(&mut self, option: Options) {
        self.options &= !option;
    }

    pub fn has_option(&self, option: Options) -> bool {
        self.options.contains(option)
    }

    /// Attach ancillary state under a key. Decoders read and write the same
    /// map during a parse; the map is cleared when a new parse starts.
    pub fn set_info<T: Any>(&mut self, key: &str, value: T) {
        self.info.insert(key.to_string(), Box::new(value));
    }

    pub fn remove_info(&mut self, key: &str) {
        self.info.remove(key);
    }

    pub fn get_info<T: Any>(&self, key: &str) -> Option<&T> {
        self.info.get(key).and_then(|v| v.downcast_ref::<T>())
    }

    /// The parsed root, or `None` if no parse succeeded yet.
    pub fn file(&self) -> Option<&File> {
        self.file.as_ref()
    }

    /// Source path of the last successful file parse.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn parse_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let f = std::fs::File::open(path)?;
        let mut src = BufReader::new(f);
        self.parse_stream(&mut src)?;
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    pub fn parse_bytes(&mut self, data: &[u8]) -> Result<()> {
        let mut src = Cursor::new(data);
        self.parse_stream(&mut src)
    }

    /// Parse from the stream's current position to its end.
    pub fn parse_stream(&mut self, src: &mut dyn ReadSeek) -> Result<()> {
        self.file = None;
        self.path = None;
        self.info.clear();

        let mut r = BodyReader::to_stream_end(src)?;
        let base = r.tell()?;
        if !r.has_bytes()? {
            return Err(ParseError::UnexpectedEof);
        }

        // Sniff the type field of the first box (bytes 4..8). A short
        // stream leaves the probe zeroed, which also fails the match.
        let mut probe = [0u8; 4];
        if r.remaining()? >= 8 {
            r.seek(base + 4)?;
            r.read_exact(&mut probe)?;
        }
        if !TOP_LEVEL_TYPES.iter().any(|t| **t == probe) {
            return Err(ParseError::NotIsoMedia);
        }
        r.seek(base)?;
        debug!(bound = r.bound(), "parsing top-level boxes");

        let mut ctx = ParseContext {
            registry: &self.registry,
            string_type: self.string_type,
            options: self.options,
            info: &mut self.info,
        };
        let children = parse_children(&mut r, &mut ctx)?;
        self.file = Some(File { children });
        Ok(())
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}
