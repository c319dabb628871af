//! OSM XML entity source

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::core::{Error, Result};

use super::area::{AreaAssembler, WayMember};
use super::entity::{Location, RawEntity, RawNode, Tags};
use super::source::EntitySource;

/// Reads raw entities from an `.osm` XML document
pub struct XmlSource {
    path: PathBuf,
}

impl XmlSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn create_reader(&self) -> Result<Reader<BufReader<File>>> {
        let file = File::open(&self.path)
            .map_err(|e| Error::InputUnreadable(format!("{}: {e}", self.path.display())))?;
        let mut reader = Reader::from_reader(BufReader::new(file));
        reader.trim_text(true);
        Ok(reader)
    }
}

/// Element currently being read, collecting its child elements
enum Open {
    Top,
    Node { id: i64, location: Location, tags: Tags },
    Way { id: i64, refs: Vec<i64>, tags: Tags },
    Relation { id: i64, members: Vec<WayMember>, tags: Tags },
}

fn attribute(element: &BytesStart, name: &[u8]) -> Result<Option<String>> {
    for attr in element.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.as_ref() == name {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn parsed<T: std::str::FromStr>(element: &BytesStart, name: &[u8]) -> Result<T> {
    let tag = String::from_utf8_lossy(element.name().as_ref()).into_owned();
    let value = attribute(element, name)?.ok_or_else(|| {
        Error::InputUnreadable(format!(
            "<{tag}> without {} attribute",
            String::from_utf8_lossy(name)
        ))
    })?;
    value
        .parse()
        .map_err(|_| Error::InputUnreadable(format!("<{tag}> has invalid {}: {value}", String::from_utf8_lossy(name))))
}

fn open_element(element: &BytesStart) -> Result<Open> {
    Ok(match element.name().as_ref() {
        b"node" => Open::Node {
            id: parsed(element, b"id")?,
            location: Location::new(parsed(element, b"lon")?, parsed(element, b"lat")?),
            tags: Tags::new(),
        },
        b"way" => Open::Way {
            id: parsed(element, b"id")?,
            refs: Vec::new(),
            tags: Tags::new(),
        },
        b"relation" => Open::Relation {
            id: parsed(element, b"id")?,
            members: Vec::new(),
            tags: Tags::new(),
        },
        _ => Open::Top,
    })
}

fn add_child(open: &mut Open, element: &BytesStart) -> Result<()> {
    match (element.name().as_ref(), open) {
        (b"tag", Open::Node { tags, .. } | Open::Way { tags, .. } | Open::Relation { tags, .. }) => {
            let key: String = parsed(element, b"k")?;
            let value = attribute(element, b"v")?.unwrap_or_default();
            tags.insert(key, value);
        }
        (b"nd", Open::Way { refs, .. }) => refs.push(parsed(element, b"ref")?),
        (b"member", Open::Relation { members, .. }) => {
            if attribute(element, b"type")?.as_deref() == Some("way") {
                members.push(WayMember {
                    way_id: parsed(element, b"ref")?,
                    role: attribute(element, b"role")?.unwrap_or_default(),
                });
            }
        }
        _ => {}
    }
    Ok(())
}

fn close_element(open: Open, assembler: &mut AreaAssembler, visitor: &mut dyn FnMut(&RawEntity)) {
    match open {
        Open::Top => {}
        Open::Node { id, location, tags } => {
            assembler.add_node(id, location);
            visitor(&RawEntity::Node(RawNode { id, location, tags }));
        }
        Open::Way { id, refs, tags } => {
            let (way, area) = assembler.way(id, refs, tags);
            visitor(&way);
            if let Some(area) = area {
                visitor(&area);
            }
        }
        Open::Relation { id, members, tags } => {
            if let Some(area) = assembler.relation(id, &members, tags) {
                visitor(&area);
            }
        }
    }
}

impl EntitySource for XmlSource {
    fn for_each_entity(&self, visitor: &mut dyn FnMut(&RawEntity)) -> Result<()> {
        let mut reader = self.create_reader()?;
        let mut assembler = AreaAssembler::new();
        let mut buf = Vec::new();
        let mut open = Open::Top;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Eof => break,
                Event::Start(e) => {
                    if matches!(open, Open::Top) {
                        open = open_element(&e)?;
                    }
                }
                Event::Empty(e) => {
                    if matches!(open, Open::Top) {
                        close_element(open_element(&e)?, &mut assembler, visitor);
                    } else {
                        add_child(&mut open, &e)?;
                    }
                }
                Event::End(e) => {
                    if matches!(e.name().as_ref(), b"node" | b"way" | b"relation") {
                        let finished = std::mem::replace(&mut open, Open::Top);
                        close_element(finished, &mut assembler, visitor);
                    }
                }
                _ => {}
            }
            buf.clear();
        }

        Ok(())
    }
}
