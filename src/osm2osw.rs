//! Forward conversion: OSM extract to OSW GeoJSON collections

use std::path::{Path, PathBuf};

use log::info;

use crate::core::{ConvertOptions, OutputPaths, Result};
use crate::graph::OsmGraph;
use crate::osm::{count_all, default_parsers, open_source, parse_graph, EntitySource};

/// Runs the forward pipeline on the extract at `input`.
///
/// Returns the collections that were written under `workdir`.
pub fn convert(input: &Path, workdir: &Path, options: &ConvertOptions) -> Result<Vec<PathBuf>> {
    let source = open_source(input)?;
    let prefix = options.prefix_for(input);
    info!("Converting {} to OSW in {}", input.display(), workdir.display());

    let graph = build_graph(source.as_ref(), options)?;
    let paths = OutputPaths::in_dir(workdir, &prefix);
    graph.to_geojson(&paths)
}

/// Count, parse, simplify, construct geometries and normalize, in that order
pub fn build_graph(source: &dyn EntitySource, options: &ConvertOptions) -> Result<OsmGraph> {
    let counts = count_all(source)?;
    let mut parsers = default_parsers(&counts, options.progress.clone());

    let mut graph = parse_graph(source, &mut parsers)?;
    graph.simplify();
    graph.construct_geometries()?;
    graph.normalize_tags()?;
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeKind;
    use crate::osm::{tags_from, Location, NodeRef, RawEntity, RawNode, RawWay, Tags};

    fn node(id: i64, tags: Tags) -> RawEntity {
        RawEntity::Node(RawNode {
            id,
            location: Location::new(id as f64 * 0.001, 47.0),
            tags,
        })
    }

    #[test]
    fn test_build_graph_merges_split_sidewalk() {
        let sidewalk = tags_from([("highway", "footway"), ("footway", "sidewalk")]);
        let source = vec![
            node(1, tags_from([("kerb", "lowered")])),
            node(2, Default::default()),
            node(3, Default::default()),
            RawEntity::Way(RawWay {
                id: 50,
                refs: (1..=3).map(|id| NodeRef::located(id, id as f64 * 0.001, 47.0)).collect(),
                tags: sidewalk,
            }),
        ];

        let graph = build_graph(&source, &ConvertOptions::default()).unwrap();

        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.node_count(), 2);
        let (_, edge) = graph.edges().next().unwrap();
        assert_eq!(edge.ndref(), &[1, 2, 3]);
        assert_eq!(edge.geometry().map(|g| g.0.len()), Some(3));
        let kerb = graph.node(1).and_then(|n| n.normalized()).unwrap();
        assert_eq!(kerb["kerb"], "lowered");
    }

    #[test]
    fn test_bollard_on_sidewalk_becomes_point() {
        let source = vec![
            node(1, Tags::new()),
            node(2, tags_from([("barrier", "bollard")])),
            node(3, Tags::new()),
            RawEntity::Way(RawWay {
                id: 50,
                refs: (1..=3).map(|id| NodeRef::located(id, id as f64 * 0.001, 47.0)).collect(),
                tags: tags_from([("highway", "footway"), ("footway", "sidewalk")]),
            }),
        ];

        let graph = build_graph(&source, &ConvertOptions::default()).unwrap();

        assert_eq!(graph.edge_count(), 1);
        let bollard = graph.feature(NodeKind::Point, 2).unwrap();
        assert_eq!(bollard.normalized().unwrap()["barrier"], "bollard");
        assert!(bollard.geometry().is_some());
    }
}
