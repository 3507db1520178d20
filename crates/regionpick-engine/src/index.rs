// Author: Dustin Pilgrim
// License: MIT
//
// Static point-query index over the session's candidate rectangles.
//
// Built once per capture session with sort-tile-recursive packing, then only
// read. Candidates are in global desktop pixels.

use std::rc::Rc;

use regionpick_core::{Candidate, CandidateKind, Point, Rect};

use crate::geometry::normalize;

const NODE_CAPACITY: usize = 16;

#[derive(Debug)]
enum Node {
    Leaf(Vec<usize>),
    Branch(Vec<(Rect, Node)>),
}

#[derive(Debug, Default)]
pub struct SpatialIndex {
    candidates: Vec<Candidate>,
    root: Option<(Rect, Node)>,
}

/// Outcome of a point query against the session's index slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// The index is still being built; skip this update.
    NotReady,
    /// Every candidate containing the point (possibly none).
    Ready(Vec<Candidate>),
}

impl SpatialIndex {
    /// Build from candidates. Inverted corners are fixed up; rects with no
    /// area after that are dropped.
    pub fn build(candidates: Vec<Candidate>) -> Self {
        let candidates: Vec<Candidate> = candidates
            .into_iter()
            .map(|c| Candidate {
                rect: normalize(c.rect),
                ..c
            })
            .filter(|c| !c.rect.is_empty())
            .collect();

        let entries: Vec<(Rect, usize)> = candidates
            .iter()
            .enumerate()
            .map(|(i, c)| (c.rect, i))
            .collect();

        let mut level: Vec<(Rect, Node)> = str_groups(entries)
            .into_iter()
            .map(|group| {
                let bbox = bbox_of(&group);
                (bbox, Node::Leaf(group.into_iter().map(|(_, i)| i).collect()))
            })
            .collect();

        while level.len() > 1 {
            level = str_groups(level)
                .into_iter()
                .map(|group| (bbox_of(&group), Node::Branch(group)))
                .collect();
        }

        Self {
            candidates,
            root: level.pop(),
        }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn bounds(&self) -> Option<Rect> {
        self.root.as_ref().map(|(bbox, _)| *bbox)
    }

    /// All candidates whose rect contains `p`, in ascending rank order.
    pub fn query_point(&self, p: Point) -> Vec<Candidate> {
        let mut hits = Vec::new();

        if let Some((bbox, node)) = &self.root {
            if bbox.contains(p) {
                self.collect(node, p, &mut hits);
            }
        }

        hits.sort_by_key(|c| c.z_rank);
        hits
    }

    fn collect(&self, node: &Node, p: Point, out: &mut Vec<Candidate>) {
        match node {
            Node::Leaf(ids) => {
                for &i in ids {
                    let c = &self.candidates[i];
                    if c.rect.contains(p) {
                        out.push(*c);
                    }
                }
            }
            Node::Branch(children) => {
                for (bbox, child) in children {
                    if bbox.contains(p) {
                        self.collect(child, p, out);
                    }
                }
            }
        }
    }
}

fn bbox_of<T>(group: &[(Rect, T)]) -> Rect {
    group
        .iter()
        .map(|(r, _)| *r)
        .reduce(|a, b| a.union(&b))
        .unwrap_or_default()
}

// Sort-tile-recursive grouping: vertical slabs by center x, then runs of
// NODE_CAPACITY by center y inside each slab.
fn str_groups<T>(mut items: Vec<(Rect, T)>) -> Vec<Vec<(Rect, T)>> {
    let n = items.len();
    if n == 0 {
        return Vec::new();
    }

    let nodes = n.div_ceil(NODE_CAPACITY);
    let slabs = (nodes as f64).sqrt().ceil().max(1.0) as usize;
    let slab_len = NODE_CAPACITY * nodes.div_ceil(slabs);

    items.sort_by_key(|(r, _)| r.min_x as i64 + r.max_x as i64);

    let mut out = Vec::with_capacity(nodes);
    let mut rest = items;

    while !rest.is_empty() {
        let tail = rest.split_off(slab_len.min(rest.len()));
        let mut slab = rest;
        rest = tail;

        slab.sort_by_key(|(r, _)| r.min_y as i64 + r.max_y as i64);

        while !slab.is_empty() {
            let tail = slab.split_off(NODE_CAPACITY.min(slab.len()));
            out.push(slab);
            slab = tail;
        }
    }

    out
}

/// Assemble the session's candidate list in stacking order.
///
/// Enumerated windows come first and keep their order as rank. Monitors are
/// appended behind them, and the desktop fallback (when given) goes last so a
/// query anywhere on the desktop always has a hit.
pub fn assemble_candidates(
    windows: Vec<(u64, Rect)>,
    monitors: &[Rect],
    desktop_fallback: Option<Rect>,
) -> Vec<Candidate> {
    let mut out: Vec<Candidate> = Vec::with_capacity(windows.len() + monitors.len() + 1);

    for (id, rect) in windows {
        let rank = out.len() as u32;
        out.push(Candidate::new(id, rect, rank));
    }

    // Synthetic ids live at the top of the id space to stay clear of
    // platform window ids.
    for (i, rect) in monitors.iter().enumerate() {
        let rank = out.len() as u32;
        out.push(
            Candidate::new(u64::MAX - 1 - i as u64, *rect, rank).with_kind(CandidateKind::Monitor),
        );
    }

    if let Some(rect) = desktop_fallback {
        let rank = out.len() as u32;
        out.push(Candidate::new(u64::MAX, rect, rank).with_kind(CandidateKind::Desktop));
    }

    out
}

/// Order hits for consumption: most specific first.
///
/// A hit nested strictly inside another hit comes before its container
/// (deeper nesting first); hits at the same depth keep ascending rank.
pub fn order_hits(hits: &mut [Candidate]) {
    // Depth is counted per position, so duplicate ids from the host still
    // nest correctly.
    let mut keyed: Vec<(usize, Candidate)> = hits
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let depth = hits
                .iter()
                .enumerate()
                .filter(|(j, o)| *j != i && o.rect != c.rect && o.rect.contains_rect(&c.rect))
                .count();
            (depth, *c)
        })
        .collect();

    keyed.sort_by(|(da, a), (db, b)| db.cmp(da).then(a.z_rank.cmp(&b.z_rank)));

    for (slot, (_, c)) in hits.iter_mut().zip(keyed) {
        *slot = c;
    }
}

/// The session's index, absent until the enumeration finishes.
#[derive(Debug, Default, Clone)]
pub struct IndexSlot {
    index: Option<Rc<SpatialIndex>>,
}

impl IndexSlot {
    pub fn is_ready(&self) -> bool {
        self.index.is_some()
    }

    pub fn install(&mut self, index: SpatialIndex) {
        self.index = Some(Rc::new(index));
    }

    pub fn clear(&mut self) {
        self.index = None;
    }

    pub fn query_point(&self, p: Point) -> Lookup {
        match &self.index {
            Some(index) => Lookup::Ready(index.query_point(p)),
            None => Lookup::NotReady,
        }
    }
}
