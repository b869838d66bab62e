//! Segment persistence (snapshot/load).
//!
//! # File Layout
//!
//! ```text
//! <dir>/
//! ├── vectors.bin    # vector per slot up to the high-water mark, absent for holes
//! ├── links_out.bin  # ragged out-adjacency: [slot][layer][position]
//! ├── links_in.bin   # ragged in-adjacency, only written when removal is enabled
//! └── ids.bin        # external id per slot
//! ```
//!
//! All four artifacts are written while holding the segment-wide mutex and
//! the topology lock in write mode, so they describe one logical state.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::core::{EntryPoint, Segment};
use super::node::{Node, NodeId};
use super::params::SegmentParams;
use super::pool::VisitedPool;
use crate::distance::DistanceMetric;
use crate::error::{Error, Result};
use crate::point::Point;

const VECTORS_FILE: &str = "vectors.bin";
const OUT_LINKS_FILE: &str = "links_out.bin";
const IN_LINKS_FILE: &str = "links_in.bin";
const IDS_FILE: &str = "ids.bin";

fn write_artifact<T: Serialize>(dir: &Path, name: &str, value: &T) -> Result<()> {
    let file = File::create(dir.join(name))?;
    let writer = BufWriter::new(file);
    bincode::serialize_into(writer, value).map_err(|e| Error::Serialization(e.to_string()))
}

fn read_artifact<T: DeserializeOwned>(dir: &Path, name: &str) -> Result<T> {
    let file = File::open(dir.join(name))?;
    let reader = BufReader::new(file);
    bincode::deserialize_from(reader).map_err(|e| Error::Serialization(e.to_string()))
}

impl Segment {
    /// Persists the segment under `dir`, creating it if needed.
    ///
    /// The graph is frozen for the duration of the write; concurrent inserts
    /// and searches block until it completes. In-memory state is untouched
    /// by failures.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] or [`Error::Serialization`] on write failures.
    pub fn snapshot<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        let ids = self.ids.lock();
        let _frozen = self.topology.write();
        std::fs::create_dir_all(dir)?;

        let high_water = ids.high_water() as usize;
        let track_in = self.params.remove_enabled;

        let mut vectors: Vec<Option<Vec<f32>>> = Vec::with_capacity(high_water);
        let mut out_links: Vec<Vec<Vec<NodeId>>> = Vec::with_capacity(high_water);
        let mut in_links: Vec<Vec<Vec<NodeId>>> = Vec::with_capacity(high_water);
        let mut externals: Vec<Option<u64>> = Vec::with_capacity(high_water);

        #[allow(clippy::cast_possible_truncation)]
        for slot in 0..high_water {
            let Some(node) = self.node(slot as NodeId) else {
                vectors.push(None);
                externals.push(None);
                out_links.push(Vec::new());
                if track_in {
                    in_links.push(Vec::new());
                }
                continue;
            };
            vectors.push(Some(node.vector().to_vec()));
            externals.push(Some(node.external_id()));
            let links = node.links();
            let levels = node.max_level();
            out_links.push((0..=levels).map(|l| links.out(l).to_vec()).collect());
            if track_in {
                in_links.push((0..=levels).map(|l| links.incoming(l).to_vec()).collect());
            }
        }

        write_artifact(dir, VECTORS_FILE, &vectors)?;
        write_artifact(dir, OUT_LINKS_FILE, &out_links)?;
        if track_in {
            write_artifact(dir, IN_LINKS_FILE, &in_links)?;
        }
        write_artifact(dir, IDS_FILE, &externals)?;

        tracing::info!(
            path = %dir.display(),
            nodes = self.len(),
            high_water,
            "segment snapshot saved"
        );
        Ok(())
    }

    /// Reconstructs a segment from the artifacts under `dir`.
    ///
    /// `params` must match the snapshotted segment's configuration; the
    /// snapshot itself carries only graph content. The entry point is
    /// re-derived as the highest-level live node (lowest internal id on
    /// ties).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when artifacts are missing,
    /// [`Error::Serialization`] when they fail to decode, and
    /// [`Error::Corrupted`] when they disagree with each other or with
    /// `params`.
    pub fn load<P: AsRef<Path>>(
        params: SegmentParams,
        metric: DistanceMetric,
        visited: Arc<VisitedPool>,
        dir: P,
    ) -> Result<Self> {
        let dir = dir.as_ref();
        let segment = Self::new(params, metric, visited)?;

        let vectors: Vec<Option<Vec<f32>>> = read_artifact(dir, VECTORS_FILE)?;
        let out_links: Vec<Vec<Vec<NodeId>>> = read_artifact(dir, OUT_LINKS_FILE)?;
        let in_links: Option<Vec<Vec<Vec<NodeId>>>> = if params.remove_enabled {
            Some(read_artifact(dir, IN_LINKS_FILE)?)
        } else {
            None
        };
        let externals: Vec<Option<u64>> = read_artifact(dir, IDS_FILE)?;

        let high_water = vectors.len();
        if high_water > params.capacity {
            return Err(Error::Corrupted(format!(
                "high-water mark {high_water} exceeds capacity {}",
                params.capacity
            )));
        }
        if out_links.len() != high_water
            || externals.len() != high_water
            || in_links.as_ref().is_some_and(|l| l.len() != high_water)
        {
            return Err(Error::Corrupted("artifact lengths disagree".into()));
        }

        let mut freed: Vec<NodeId> = Vec::new();
        let mut entry: Option<EntryPoint> = None;

        #[allow(clippy::cast_possible_truncation)]
        for slot in 0..high_water {
            let internal = slot as NodeId;
            let Some(vector) = vectors[slot].clone() else {
                if externals[slot].is_some() || !out_links[slot].is_empty() {
                    return Err(Error::Corrupted(format!(
                        "slot {slot} is partially populated"
                    )));
                }
                freed.push(internal);
                continue;
            };
            let Some(external) = externals[slot] else {
                return Err(Error::Corrupted(format!(
                    "slot {slot} has a vector but no external id"
                )));
            };
            let outs = out_links[slot].clone();
            if outs.is_empty() {
                return Err(Error::Corrupted(format!(
                    "slot {slot} has no adjacency lists"
                )));
            }
            for (level, list) in outs.iter().enumerate() {
                for &nbr in list {
                    let live = (nbr as usize) < high_water
                        && vectors[nbr as usize].is_some()
                        && out_links[nbr as usize].len() > level;
                    if !live {
                        return Err(Error::Corrupted(format!(
                            "slot {slot} links to missing node {nbr} on layer {level}"
                        )));
                    }
                }
            }
            let inc = match &in_links {
                Some(all) => {
                    let lists = all[slot].clone();
                    if lists.len() != outs.len() {
                        return Err(Error::Corrupted(format!(
                            "slot {slot} has mismatched in/out layer counts"
                        )));
                    }
                    Some(lists)
                }
                None => None,
            };
            if segment.lookup.get(external).is_some() {
                return Err(Error::Corrupted(format!(
                    "external id {external} appears twice"
                )));
            }

            let node = Arc::new(Node::from_parts(
                internal,
                Point::new(external, vector),
                outs,
                inc,
            ));
            let level = node.max_level();
            segment.slots[slot].store(Some(node));
            segment.lookup.insert(external, internal);
            if entry.is_none_or(|ep| level > ep.level) {
                entry = Some(EntryPoint {
                    id: internal,
                    level,
                });
            }
        }

        #[allow(clippy::cast_possible_truncation)]
        segment.ids.lock().restore(high_water as NodeId, freed);
        *segment.entry.write() = entry;

        tracing::info!(
            path = %dir.display(),
            nodes = segment.len(),
            high_water,
            "segment snapshot loaded"
        );
        Ok(segment)
    }
}
