pub mod api;
pub mod boxes;
pub mod known_boxes;
pub mod parser;
pub mod reader;
pub mod registry;

pub use api::{Options, Parser};
pub use boxes::{BoxHeader, BoxNode, Field, File, FourCC};
pub use known_boxes::BoxData;
pub use parser::{parse_children, read_box_header, ParseError};
pub use reader::{BodyReader, ReadSeek, StringType};
pub use registry::{default_registry, BoxFactory, Registry};
