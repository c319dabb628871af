//! OSM input: raw entities, file decoders, counting and parsing into a graph

pub(crate) mod area;
pub mod counter;
pub mod entity;
pub mod parser;
pub mod pbf;
pub mod source;
pub mod xml;

pub use counter::{count_all, count_entities, EntityCounts};
pub use entity::{tags_from, EntityType, Location, NodeId, NodeRef, RawArea, RawEntity, RawNode, RawWay, Tags};
pub use parser::{default_parsers, parse_graph, OsmParser, TagFilter};
pub use pbf::PbfSource;
pub use source::{open_source, EntitySource};
pub use xml::XmlSource;
