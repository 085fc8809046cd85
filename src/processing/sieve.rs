// src/processing/sieve.rs
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use crate::error::PipelineError;
use crate::processing::MaskRaster;

/// Pixel adjacency rule for region labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    Four,
    Eight,
}

impl Connectivity {
    pub fn as_u8(self) -> u8 {
        match self {
            Connectivity::Four => 4,
            Connectivity::Eight => 8,
        }
    }
}

/// Removes regions smaller than `min_pixels` by merging each into the
/// neighboring region it shares the longest border with (lowest label
/// on ties). Small regions are processed smallest-first; a merged
/// region that is still under the minimum goes back on the worklist.
/// A region with no neighbor at all is left as-is.
///
/// The output keeps the input's byte classification: an absorbed
/// region takes its absorbing neighbor's value, so the total pixel
/// count per raster is conserved.
pub fn sieve(
    mask: &MaskRaster,
    min_pixels: usize,
    connectivity: Connectivity,
) -> Result<MaskRaster, PipelineError> {
    if min_pixels == 0 {
        return Err(PipelineError::SieveFailure(
            "minimum region size must be at least 1 pixel".into(),
        ));
    }
    if mask.data.len() != mask.geo.pixel_count() {
        return Err(PipelineError::SieveFailure(format!(
            "mask length {} does not match {}x{}",
            mask.data.len(),
            mask.geo.width,
            mask.geo.height
        )));
    }
    if min_pixels == 1 || mask.data.is_empty() {
        return Ok(mask.clone());
    }

    let labeled = label_regions(mask, connectivity);
    let mut regions = RegionForest::new(labeled.sizes, labeled.values, labeled.adjacency);

    // Smallest regions first; stale heap entries are skipped on pop.
    let mut worklist = BinaryHeap::new();
    for label in 0..regions.len() as u32 {
        if regions.size(label) < min_pixels as u64 {
            worklist.push(Reverse((regions.size(label), label)));
        }
    }

    while let Some(Reverse((size, label))) = worklist.pop() {
        let root = regions.find(label);
        if root != label || regions.size(root) != size || regions.size(root) >= min_pixels as u64 {
            continue;
        }
        if let Some(target) = regions.best_neighbor(root) {
            let merged = regions.merge(root, target);
            if regions.size(merged) < min_pixels as u64 {
                worklist.push(Reverse((regions.size(merged), merged)));
            }
        }
        // No neighbor: the region stays, accepted edge case.
    }

    let mut data = Vec::with_capacity(labeled.labels.len());
    for &label in &labeled.labels {
        let root = regions.find(label);
        data.push(regions.value(root));
    }
    Ok(MaskRaster::new(data, mask.geo.clone()))
}

struct Labeled {
    labels: Vec<u32>,
    sizes: Vec<u64>,
    values: Vec<u8>,
    /// Per region: neighbor label -> shared border length. Edge-adjacent
    /// pixel pairs count 1; diagonal pairs (8-connectivity only) count 0
    /// but still register the neighbor as a merge candidate.
    adjacency: Vec<HashMap<u32, u64>>,
}

/// Labels maximal connected components of same-valued pixels,
/// background included, and collects region adjacency in one pass.
fn label_regions(mask: &MaskRaster, connectivity: Connectivity) -> Labeled {
    let (w, h) = (mask.geo.width, mask.geo.height);
    const UNLABELED: u32 = u32::MAX;
    let mut labels = vec![UNLABELED; mask.data.len()];
    let mut sizes = Vec::new();
    let mut values = Vec::new();
    let mut stack = Vec::new();

    for start in 0..mask.data.len() {
        if labels[start] != UNLABELED {
            continue;
        }
        let label = sizes.len() as u32;
        let value = mask.data[start];
        let mut size = 0u64;
        labels[start] = label;
        stack.push(start);
        while let Some(at) = stack.pop() {
            size += 1;
            let (x, y) = (at % w, at / w);
            let mut visit = |nx: isize, ny: isize| {
                if nx < 0 || ny < 0 || nx >= w as isize || ny >= h as isize {
                    return;
                }
                let ni = ny as usize * w + nx as usize;
                if labels[ni] == UNLABELED && mask.data[ni] == value {
                    labels[ni] = label;
                    stack.push(ni);
                }
            };
            visit(x as isize - 1, y as isize);
            visit(x as isize + 1, y as isize);
            visit(x as isize, y as isize - 1);
            visit(x as isize, y as isize + 1);
            if connectivity == Connectivity::Eight {
                visit(x as isize - 1, y as isize - 1);
                visit(x as isize + 1, y as isize - 1);
                visit(x as isize - 1, y as isize + 1);
                visit(x as isize + 1, y as isize + 1);
            }
        }
        sizes.push(size);
        values.push(value);
    }

    let mut adjacency: Vec<HashMap<u32, u64>> = vec![HashMap::new(); sizes.len()];
    let mut record = |a: u32, b: u32, weight: u64| {
        if a != b {
            *adjacency[a as usize].entry(b).or_insert(0) += weight;
            *adjacency[b as usize].entry(a).or_insert(0) += weight;
        }
    };
    for y in 0..h {
        for x in 0..w {
            let at = labels[y * w + x];
            if x + 1 < w {
                record(at, labels[y * w + x + 1], 1);
            }
            if y + 1 < h {
                record(at, labels[(y + 1) * w + x], 1);
            }
            if connectivity == Connectivity::Eight && y + 1 < h {
                if x + 1 < w {
                    record(at, labels[(y + 1) * w + x + 1], 0);
                }
                if x > 0 {
                    record(at, labels[(y + 1) * w + x - 1], 0);
                }
            }
        }
    }

    Labeled {
        labels,
        sizes,
        values,
        adjacency,
    }
}

/// Union-find over region labels with per-root size, class value and
/// accumulated neighbor borders.
struct RegionForest {
    parent: Vec<u32>,
    sizes: Vec<u64>,
    values: Vec<u8>,
    adjacency: Vec<HashMap<u32, u64>>,
}

impl RegionForest {
    fn new(sizes: Vec<u64>, values: Vec<u8>, adjacency: Vec<HashMap<u32, u64>>) -> Self {
        Self {
            parent: (0..sizes.len() as u32).collect(),
            sizes,
            values,
            adjacency,
        }
    }

    fn len(&self) -> usize {
        self.parent.len()
    }

    fn find(&mut self, label: u32) -> u32 {
        let mut root = label;
        while self.parent[root as usize] != root {
            root = self.parent[root as usize];
        }
        let mut at = label;
        while self.parent[at as usize] != root {
            let next = self.parent[at as usize];
            self.parent[at as usize] = root;
            at = next;
        }
        root
    }

    fn size(&self, root: u32) -> u64 {
        self.sizes[root as usize]
    }

    fn value(&self, root: u32) -> u8 {
        self.values[root as usize]
    }

    /// Neighbor root sharing the longest border with `root`, lowest
    /// label on ties. Borders of neighbors that merged together are
    /// summed before comparison.
    fn best_neighbor(&mut self, root: u32) -> Option<u32> {
        let entries: Vec<(u32, u64)> = self.adjacency[root as usize]
            .iter()
            .map(|(&label, &border)| (label, border))
            .collect();
        let mut combined: HashMap<u32, u64> = HashMap::new();
        for (label, border) in entries {
            let neighbor = self.find(label);
            if neighbor != root {
                *combined.entry(neighbor).or_insert(0) += border;
            }
        }
        let mut best: Option<(u64, u32)> = None;
        for (neighbor, border) in combined {
            let better = match best {
                None => true,
                Some((b, n)) => border > b || (border == b && neighbor < n),
            };
            if better {
                best = Some((border, neighbor));
            }
        }
        best.map(|(_, neighbor)| neighbor)
    }

    /// Merges `small` into `target`; the merged region keeps the
    /// target's class value. Returns the surviving root.
    fn merge(&mut self, small: u32, target: u32) -> u32 {
        self.parent[small as usize] = target;
        self.sizes[target as usize] += self.sizes[small as usize];
        let absorbed = std::mem::take(&mut self.adjacency[small as usize]);
        for (label, border) in absorbed {
            if self.find(label) != target {
                *self.adjacency[target as usize].entry(label).or_insert(0) += border;
            }
        }
        target
    }
}
