/// Region adjacency from shared boundary vertices
///
/// Two regions are neighbors when at least one ring vertex of one is
/// bit-for-bit equal to a ring vertex of the other. There is no tolerance:
/// boundaries digitized separately will not match, which is accepted.
///
/// The graph is cached per scope in `<dir>/<scope>.neighbors`, one line per
/// region record: `region,neighbor1,neighbor2,...`.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::geometry::Point;
use crate::logging::{self, Stage};
use crate::model::{NeighborNotice, Region, Result, SurgeError, Warning};

/// Exact identity of a coordinate pair.
pub type VertexKey = (u64, u64);

/// Hashable key for a vertex. `-0.0` and `0.0` compare equal as floats, so
/// they share a key.
pub fn vertex_key(p: &Point) -> VertexKey {
    ((p.lon + 0.0).to_bits(), (p.lat + 0.0).to_bits())
}

// ---------------------------------------------------------------------------
// Graph
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NeighborGraph {
    entries: Vec<(String, Vec<String>)>,
}

impl NeighborGraph {
    /// Builds the graph over `regions`, one entry per record in order.
    ///
    /// Neighbor lists follow record order, skip the region's own name and
    /// list each name once.
    pub fn build(regions: &[Region]) -> Self {
        let vertex_sets: Vec<HashSet<VertexKey>> = regions
            .par_iter()
            .map(|r| r.vertices().map(vertex_key).collect())
            .collect();

        let entries = regions
            .par_iter()
            .enumerate()
            .map(|(i, region)| {
                let mut neighbors: Vec<String> = Vec::new();
                for (j, other) in regions.iter().enumerate() {
                    if other.name() == region.name() || neighbors.iter().any(|n| n == other.name()) {
                        continue;
                    }
                    if !vertex_sets[i].is_disjoint(&vertex_sets[j]) {
                        neighbors.push(other.name().to_string());
                    }
                }
                (region.name().to_string(), neighbors)
            })
            .collect();

        Self { entries }
    }

    /// Reads the cache-file format. Blank lines are ignored.
    pub fn parse(text: &str) -> Self {
        let entries = text
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                let mut fields = line.split(',');
                let region = fields.next().unwrap_or_default().to_string();
                let neighbors = fields.filter(|f| !f.is_empty()).map(String::from).collect();
                (region, neighbors)
            })
            .collect();
        Self { entries }
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for (region, neighbors) in &self.entries {
            out.push_str(region);
            for n in neighbors {
                out.push(',');
                out.push_str(n);
            }
            out.push('\n');
        }
        out
    }

    pub fn entries(&self) -> &[(String, Vec<String>)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Neighbors listed on the first line for `region`.
    pub fn neighbors_of(&self, region: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(name, _)| name == region)
            .map(|(_, n)| n.as_slice())
    }

    /// `(a, b)` pairs where `b` is listed under `a` but `a` is never listed
    /// under `b`. Empty for any graph produced by `build`.
    pub fn asymmetric_pairs(&self) -> Vec<(String, String)> {
        let mut adjacency: HashMap<&str, HashSet<&str>> = HashMap::new();
        for (region, neighbors) in &self.entries {
            adjacency
                .entry(region.as_str())
                .or_default()
                .extend(neighbors.iter().map(String::as_str));
        }

        let mut pairs = Vec::new();
        for (region, neighbors) in &self.entries {
            for n in neighbors {
                let back = adjacency
                    .get(n.as_str())
                    .is_some_and(|set| set.contains(region.as_str()));
                let pair = (region.clone(), n.clone());
                if !back && !pairs.contains(&pair) {
                    pairs.push(pair);
                }
            }
        }
        pairs
    }
}

// ---------------------------------------------------------------------------
// Cache file
// ---------------------------------------------------------------------------

pub const CACHE_EXTENSION: &str = "neighbors";

pub fn cache_path(dir: &Path, scope: &str) -> PathBuf {
    dir.join(format!("{}.{}", scope, CACHE_EXTENSION))
}

/// Reads the cached graph for `scope`, building and writing it first if the
/// file does not exist yet.
pub fn load_or_build(dir: &Path, scope: &str, regions: &[Region]) -> Result<NeighborGraph> {
    let path = cache_path(dir, scope);
    match fs::read_to_string(&path) {
        Ok(text) => {
            logging::debug(Stage::Neighbors, Some(scope), &format!("using cached graph {}", path.display()));
            Ok(NeighborGraph::parse(&text))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            logging::log_failure(Stage::Neighbors, Some(scope), "neighbor cache read", &SurgeError::io(&path, e));
            logging::info(
                Stage::Neighbors,
                Some(scope),
                &format!("no neighbor file, building {} from {} regions", path.display(), regions.len()),
            );
            let graph = NeighborGraph::build(regions);
            fs::create_dir_all(dir).map_err(|e| SurgeError::io(dir, e))?;
            fs::write(&path, graph.to_text()).map_err(|e| SurgeError::io(&path, e))?;
            let text = fs::read_to_string(&path).map_err(|e| SurgeError::io(&path, e))?;
            Ok(NeighborGraph::parse(&text))
        }
        Err(e) => Err(SurgeError::io(&path, e)),
    }
}

// ---------------------------------------------------------------------------
// Propagation
// ---------------------------------------------------------------------------

/// One notice per graph line whose region has a warning, listing that
/// region's neighbors that have none. A warned region whose neighbors are
/// all warned still gets a (empty) notice.
pub fn propagate(graph: &NeighborGraph, warnings: &[Warning]) -> Vec<NeighborNotice> {
    let affected: HashSet<&str> = warnings.iter().map(|w| w.region.as_str()).collect();

    graph
        .entries()
        .iter()
        .filter(|(region, _)| affected.contains(region.as_str()))
        .map(|(region, neighbors)| {
            let mut notify: Vec<String> = Vec::new();
            for n in neighbors {
                if !affected.contains(n.as_str()) && !notify.contains(n) {
                    notify.push(n.clone());
                }
            }
            NeighborNotice {
                region: region.clone(),
                neighbors: notify,
            }
        })
        .collect()
}
