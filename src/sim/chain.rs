//! The rolling chain: an ordered, doubly-linked list of track-resident markers
//!
//! Nodes live in an arena and link to each other through generation-checked
//! handles, so splices are O(1) and a handle to a removed marker can never
//! alias a newer one. Head is the marker nearest the sink, tail the one
//! nearest the spawn end; distances strictly increase head → tail.

use serde::{Deserialize, Serialize};

use super::marker::{Color, Marker, MarkerId, MarkerStatus, Placement};

/// Handle to a chain-resident marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainHandle {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Node {
    marker: Marker,
    prev: Option<ChainHandle>,
    next: Option<ChainHandle>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Chain locomotion state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ChainMotion {
    /// Whole chain rolls toward the sink
    Flowing,
    /// Markers behind `front` move at `back_velocity` (negative) to close the gap
    /// between `front` and its successor
    Closing {
        front: ChainHandle,
        back_velocity: f32,
    },
}

/// Result of a batch removal
#[derive(Debug, Clone)]
pub struct Removal {
    /// Nearest surviving marker on the sink side of the removed group
    pub front: Option<ChainHandle>,
    /// Nearest surviving marker on the tail side of the removed group
    pub back: Option<ChainHandle>,
    /// Removed markers (sink → tail), marked `Exploding`
    pub removed: Vec<Marker>,
}

/// The two markers that met when a gap closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Junction {
    pub front: ChainHandle,
    pub back: ChainHandle,
}

/// Outcome of one gap-closing step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GapStep {
    /// Gap still open
    Moving,
    /// Gap finished. Holds every junction that met, sink first; empty when
    /// the front boundary vanished.
    Closed(Vec<Junction>),
}

/// Outcome of one `Chain::update`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainStep {
    Advanced,
    Closing,
    Closed(Vec<Junction>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chain {
    slots: Vec<Slot>,
    free: Vec<u32>,
    head: Option<ChainHandle>,
    tail: Option<ChainHandle>,
    len: usize,
    /// Marker radius; adjacent markers sit at least `2 * radius` apart
    radius: f32,
    /// Normal rolling speed (px/s toward the sink)
    speed: f32,
    /// Speed of the back portion while a gap closes
    snap_speed: f32,
    motion: ChainMotion,
    /// Front boundaries of gaps farther from the sink than the one closing
    pending: Vec<ChainHandle>,
}

/// Slack when deciding whether an inserted marker touches a gap's front boundary
const TOUCH_EPS: f32 = 1e-3;

impl Chain {
    pub fn new(radius: f32, speed: f32, snap_speed: f32) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
            radius,
            speed,
            snap_speed,
            motion: ChainMotion::Flowing,
            pending: Vec::new(),
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Minimum center-to-center distance between neighbours
    #[inline]
    pub fn spacing(&self) -> f32 {
        2.0 * self.radius
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    pub fn motion(&self) -> ChainMotion {
        self.motion
    }

    pub fn is_gap_closing(&self) -> bool {
        matches!(self.motion, ChainMotion::Closing { .. })
    }

    /// Distance at and beyond which markers belong to the closing back portion
    pub fn split(&self) -> Option<f32> {
        match self.motion {
            ChainMotion::Closing { front, .. } => Some(self.distance(front)? + self.spacing()),
            ChainMotion::Flowing => None,
        }
    }

    /// Front boundaries of every open gap, sink first
    pub fn gap_fronts(&self) -> Vec<ChainHandle> {
        match self.motion {
            ChainMotion::Closing { front, .. } => std::iter::once(front)
                .chain(self.pending.iter().copied())
                .collect(),
            ChainMotion::Flowing => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn head(&self) -> Option<ChainHandle> {
        self.head
    }

    pub fn tail(&self) -> Option<ChainHandle> {
        self.tail
    }

    pub fn contains(&self, handle: ChainHandle) -> bool {
        self.node(handle).is_some()
    }

    pub fn get(&self, handle: ChainHandle) -> Option<&Marker> {
        self.node(handle).map(|n| &n.marker)
    }

    pub fn next(&self, handle: ChainHandle) -> Option<ChainHandle> {
        self.node(handle).and_then(|n| n.next)
    }

    pub fn prev(&self, handle: ChainHandle) -> Option<ChainHandle> {
        self.node(handle).and_then(|n| n.prev)
    }

    pub fn distance(&self, handle: ChainHandle) -> Option<f32> {
        self.node(handle).map(|n| resident_distance(&n.marker))
    }

    pub fn color(&self, handle: ChainHandle) -> Option<Color> {
        self.node(handle).map(|n| n.marker.color)
    }

    /// Walk head → tail
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            chain: self,
            cur: self.head,
        }
    }

    /// All handles, head → tail
    pub fn handles(&self) -> Vec<ChainHandle> {
        self.iter().map(|(h, _)| h).collect()
    }

    pub fn handle_of(&self, id: MarkerId) -> Option<ChainHandle> {
        self.iter().find(|(_, m)| m.id == id).map(|(h, _)| h)
    }

    /// Number of resident markers of `color`
    pub fn count_color(&self, color: Color) -> usize {
        self.iter().filter(|(_, m)| m.color == color).count()
    }

    /// Drop every marker and return to the flowing state
    pub fn clear(&mut self) {
        self.free.clear();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.node.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
            self.free.push(index as u32);
        }
        self.head = None;
        self.tail = None;
        self.len = 0;
        self.motion = ChainMotion::Flowing;
        self.pending.clear();
    }

    pub fn set_status(&mut self, handle: ChainHandle, status: MarkerStatus) {
        if let Some(node) = self.node_mut(handle) {
            node.marker.status = status;
        }
    }

    /// Return every `JustInserted` marker to `Resting`
    pub fn settle(&mut self) {
        for node in self.slots.iter_mut().filter_map(|s| s.node.as_mut()) {
            if node.marker.status == MarkerStatus::JustInserted {
                node.marker.status = MarkerStatus::Resting;
            }
        }
    }

    /// Marker after which an entry at `distance` belongs (`None` = new head).
    ///
    /// Searches from the tail toward the head.
    pub fn find_insertion_point(&self, distance: f32) -> Option<ChainHandle> {
        let mut cur = self.tail;
        while let Some(h) = cur {
            if self.distance_of(h) <= distance {
                return Some(h);
            }
            cur = self.prev(h);
        }
        None
    }

    /// Splice `marker` in after `after` (or at the head) at `distance`.
    ///
    /// The inserted marker and everything toward the tail is pushed back until
    /// neighbours are at least `2 * radius` apart. A marker that lands touching
    /// a gap's front boundary becomes that gap's new front boundary.
    pub fn insert(&mut self, after: Option<ChainHandle>, mut marker: Marker, distance: f32) -> ChainHandle {
        let after = after.filter(|&h| {
            let live = self.contains(h);
            debug_assert!(live, "insert after a marker that is not in the chain");
            live
        });

        marker.placement = Placement::Resident {
            distance: distance.max(0.0),
        };
        let next = match after {
            Some(a) => self.next(a),
            None => self.head,
        };
        let handle = self.alloc(Node {
            marker,
            prev: after,
            next,
        });

        match after.and_then(|a| self.node_mut(a)) {
            Some(node) => node.next = Some(handle),
            None => self.head = Some(handle),
        }
        match next.and_then(|n| self.node_mut(n)) {
            Some(node) => node.prev = Some(handle),
            None => self.tail = Some(handle),
        }
        self.len += 1;

        self.enforce_spacing(handle);
        if let Some(a) = after {
            self.adopt_front(a, handle);
        }
        handle
    }

    /// Remove a (typically contiguous) group of markers.
    ///
    /// When survivors remain on both sides, a gap opens behind the front
    /// boundary. With several gaps open, the one nearest the sink closes and
    /// the others are re-packed and reported when it completes.
    pub fn remove_batch(&mut self, handles: &[ChainHandle]) -> Removal {
        let mut doomed: Vec<ChainHandle> = handles
            .iter()
            .copied()
            .filter(|&h| {
                let live = self.contains(h);
                debug_assert!(live, "removing a marker that is not in the chain");
                live
            })
            .collect();
        doomed.sort_by(|a, b| self.distance_of(*a).total_cmp(&self.distance_of(*b)));
        doomed.dedup();

        let (Some(&first), Some(&last)) = (doomed.first(), doomed.last()) else {
            return Removal {
                front: None,
                back: None,
                removed: Vec::new(),
            };
        };

        let mut front = self.prev(first);
        while let Some(f) = front.filter(|f| doomed.contains(f)) {
            front = self.prev(f);
        }
        let mut back = self.next(last);
        while let Some(b) = back.filter(|b| doomed.contains(b)) {
            back = self.next(b);
        }

        let mut removed = Vec::with_capacity(doomed.len());
        for h in doomed {
            if let Some(mut marker) = self.unlink(h) {
                marker.status = MarkerStatus::Exploding;
                removed.push(marker);
            }
        }

        let mut fronts = self.gap_fronts();
        if let (Some(f), Some(_)) = (front, back) {
            log::debug!("Gap opened behind {:.1}", self.distance_of(f));
            fronts.push(f);
        }
        self.set_gaps(fronts);

        Removal {
            front,
            back,
            removed,
        }
    }

    /// Normal locomotion: every marker rolls `speed * dt` toward the sink
    pub fn advance(&mut self, dt: f32) {
        let delta = self.speed * dt;
        for node in self.slots.iter_mut().filter_map(|s| s.node.as_mut()) {
            let d = resident_distance(&node.marker);
            node.marker.placement = Placement::Resident { distance: d - delta };
        }
    }

    /// Gap closing: the back portion moves toward the stationary front portion.
    ///
    /// On contact the back boundary snaps to `front + 2r` and everything behind
    /// it is re-packed at exactly `2r`, which also closes any farther gaps.
    pub fn advance_gap_closing(&mut self, dt: f32) -> GapStep {
        let ChainMotion::Closing {
            front,
            back_velocity,
        } = self.motion
        else {
            return GapStep::Closed(Vec::new());
        };

        let Some(back) = self.next(front) else {
            let rest = std::mem::take(&mut self.pending);
            self.set_gaps(rest);
            return if self.is_gap_closing() {
                GapStep::Moving
            } else {
                GapStep::Closed(Vec::new())
            };
        };

        let delta = back_velocity * dt;
        let mut cur = Some(back);
        while let Some(h) = cur {
            let d = self.distance_of(h);
            self.set_distance(h, d + delta);
            cur = self.next(h);
        }

        if self.distance_of(back) - self.distance_of(front) > self.spacing() {
            return GapStep::Moving;
        }

        let mut junctions = vec![Junction { front, back }];
        for f in std::mem::take(&mut self.pending) {
            if let Some(b) = self.next(f) {
                junctions.push(Junction { front: f, back: b });
            }
        }
        self.repack_after(front);
        self.motion = ChainMotion::Flowing;
        log::debug!("Gap closed ({} junctions)", junctions.len());
        GapStep::Closed(junctions)
    }

    /// Single per-tick entry point, dispatching on the motion state
    pub fn update(&mut self, dt: f32) -> ChainStep {
        match self.motion {
            ChainMotion::Flowing => {
                self.advance(dt);
                ChainStep::Advanced
            }
            ChainMotion::Closing { .. } => match self.advance_gap_closing(dt) {
                GapStep::Moving => ChainStep::Closing,
                GapStep::Closed(junctions) => ChainStep::Closed(junctions),
            },
        }
    }

    /// Open gaps behind `fronts`: the nearest to the sink closes first
    fn set_gaps(&mut self, mut fronts: Vec<ChainHandle>) {
        fronts.retain(|&f| self.next(f).is_some());
        fronts.sort_by(|a, b| self.distance_of(*a).total_cmp(&self.distance_of(*b)));
        fronts.dedup();

        if fronts.is_empty() {
            self.motion = ChainMotion::Flowing;
            self.pending.clear();
            return;
        }
        let front = fronts.remove(0);
        self.motion = ChainMotion::Closing {
            front,
            back_velocity: -self.snap_speed,
        };
        self.pending = fronts;
    }

    /// Hand a gap's front boundary over to a marker spliced in touching it
    fn adopt_front(&mut self, old: ChainHandle, new: ChainHandle) {
        if !self.is_gap_closing() {
            return;
        }
        if self.distance_of(new) - self.distance_of(old) > self.spacing() + TOUCH_EPS {
            return;
        }
        match self.motion {
            ChainMotion::Closing {
                front,
                back_velocity,
            } if front == old => {
                self.motion = ChainMotion::Closing {
                    front: new,
                    back_velocity,
                };
            }
            _ => {}
        }
        for f in self.pending.iter_mut().filter(|f| **f == old) {
            *f = new;
        }
    }

    fn enforce_spacing(&mut self, from: ChainHandle) {
        let spacing = self.spacing();
        if let Some(prev) = self.prev(from) {
            let min = self.distance_of(prev) + spacing;
            if self.distance_of(from) < min {
                self.set_distance(from, min);
            }
        }

        let mut cur = from;
        while let Some(next) = self.next(cur) {
            let min = self.distance_of(cur) + spacing;
            if self.distance_of(next) >= min {
                break;
            }
            self.set_distance(next, min);
            cur = next;
        }
    }

    fn repack_after(&mut self, from: ChainHandle) {
        let spacing = self.spacing();
        let mut d = self.distance_of(from);
        let mut cur = self.next(from);
        while let Some(h) = cur {
            d += spacing;
            self.set_distance(h, d);
            cur = self.next(h);
        }
    }

    fn node(&self, handle: ChainHandle) -> Option<&Node> {
        self.slots
            .get(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.node.as_ref())
    }

    fn node_mut(&mut self, handle: ChainHandle) -> Option<&mut Node> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.node.as_mut())
    }

    /// Distance of a handle known to be live
    fn distance_of(&self, handle: ChainHandle) -> f32 {
        self.distance(handle).unwrap_or(f32::NAN)
    }

    fn set_distance(&mut self, handle: ChainHandle, distance: f32) {
        if let Some(node) = self.node_mut(handle) {
            node.marker.placement = Placement::Resident { distance };
        }
    }

    fn alloc(&mut self, node: Node) -> ChainHandle {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            ChainHandle {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            ChainHandle {
                index,
                generation: 0,
            }
        }
    }

    fn unlink(&mut self, handle: ChainHandle) -> Option<Marker> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);

        match node.prev.and_then(|p| self.node_mut(p)) {
            Some(prev) => prev.next = node.next,
            None => self.head = node.next,
        }
        match node.next.and_then(|n| self.node_mut(n)) {
            Some(next) => next.prev = node.prev,
            None => self.tail = node.prev,
        }
        self.len -= 1;
        Some(node.marker)
    }
}

/// Head → tail iterator over `(handle, marker)`
pub struct Iter<'a> {
    chain: &'a Chain,
    cur: Option<ChainHandle>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (ChainHandle, &'a Marker);

    fn next(&mut self) -> Option<Self::Item> {
        let h = self.cur?;
        let node = self.chain.node(h)?;
        self.cur = node.next;
        Some((h, &node.marker))
    }
}

fn resident_distance(marker: &Marker) -> f32 {
    match marker.placement {
        Placement::Resident { distance } => distance,
        Placement::Flying { .. } => unreachable!("chain markers are always track-resident"),
    }
}
