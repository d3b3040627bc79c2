//! # Loop Tracing and Triangulation
//!
//! Inside one cell, interface segments that share an endpoint and separate the
//! same two materials form chains. A chain either closes on itself or runs
//! between two face centres (or free ends). [`LoopTracer`] orders the chains
//! head-to-tail, flipping segments as needed, and the fan functions turn each
//! ordered chain into triangles.
//!
//! The tracer owns its scratch buffers and is reused for every cell; nothing
//! is allocated once the buffers have grown to the largest cell seen.

use crate::edges::Segment;
use crate::error::TopologyFault;

/// A triangle before orientation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Patch {
    /// Node indices in winding order.
    pub nodes: [usize; 3],
    /// Materials on either side; after orientation `labels[0]` lies behind
    /// the normal.
    pub labels: [i32; 2],
    /// Unit normal, filled by orientation.
    pub normal: [f64; 3],
    /// Area, filled by orientation.
    pub area: f64,
}

impl Patch {
    fn new(nodes: [usize; 3], labels: [i32; 2]) -> Self {
        Self {
            nodes,
            labels,
            normal: [0.0; 3],
            area: 0.0,
        }
    }
}

/// One ordered chain inside the tracer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Chain {
    start: usize,
    len: usize,
    open: bool,
}

/// Reusable chain builder for one cell at a time.
#[derive(Default)]
pub struct LoopTracer {
    segments: Vec<Segment>,
    burnt: Vec<bool>,
    component: Vec<usize>,
    visited: Vec<bool>,
    ordered: Vec<Segment>,
    chains: Vec<Chain>,
}

impl LoopTracer {
    /// Creates an empty tracer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all state for the next cell.
    pub fn begin(&mut self) {
        self.segments.clear();
        self.ordered.clear();
        self.chains.clear();
    }

    /// Adds the segments of one face.
    pub fn extend(&mut self, segments: &[Segment]) {
        self.segments.extend_from_slice(segments);
    }

    /// Number of segments gathered for the current cell.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether no segment has been gathered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Orders the gathered segments into chains.
    ///
    /// Chains touching one of `anchors` start there and are open. With
    /// `allow_open`, an anchorless chain that does not close is accepted as
    /// an open chain starting at its free end; otherwise it is an error.
    ///
    /// # Errors
    ///
    /// [`TopologyFault::UnclosedLoop`] or [`TopologyFault::BrokenChain`].
    pub fn trace(&mut self, anchors: &[usize], allow_open: bool) -> Result<(), TopologyFault> {
        let n = self.segments.len();
        self.burnt.clear();
        self.burnt.resize(n, false);

        for seed in 0..n {
            if self.burnt[seed] {
                continue;
            }
            self.collect_component(seed);
            let (start_pos, start, open) = self.pick_start(anchors, allow_open)?;
            self.walk(start_pos, start, open)?;
        }
        Ok(())
    }

    /// Ordered chains as `(segments, open)`.
    pub fn chains(&self) -> impl Iterator<Item = (&[Segment], bool)> + '_ {
        self.chains
            .iter()
            .map(|c| (&self.ordered[c.start..c.start + c.len], c.open))
    }

    fn collect_component(&mut self, seed: usize) {
        self.component.clear();
        self.component.push(seed);
        self.burnt[seed] = true;
        let mut k = 0;
        while k < self.component.len() {
            let current = self.segments[self.component[k]];
            for j in 0..self.segments.len() {
                let other = &self.segments[j];
                if !self.burnt[j]
                    && other.same_interface(&current)
                    && (other.touches(current.tail) || other.touches(current.head))
                {
                    self.burnt[j] = true;
                    self.component.push(j);
                }
            }
            k += 1;
        }
    }

    fn degree(&self, node: usize) -> usize {
        self.component
            .iter()
            .filter(|&&j| self.segments[j].touches(node))
            .count()
    }

    fn pick_start(
        &self,
        anchors: &[usize],
        allow_open: bool,
    ) -> Result<(usize, Segment, bool), TopologyFault> {
        for (pos, &j) in self.component.iter().enumerate() {
            let segment = self.segments[j];
            if anchors.contains(&segment.tail) {
                return Ok((pos, segment, true));
            }
            if anchors.contains(&segment.head) {
                return Ok((pos, segment.reversed(), true));
            }
        }
        for (pos, &j) in self.component.iter().enumerate() {
            let segment = self.segments[j];
            let free = if self.degree(segment.tail) == 1 {
                Some(segment)
            } else if self.degree(segment.head) == 1 {
                Some(segment.reversed())
            } else {
                None
            };
            if let Some(start) = free {
                return if allow_open {
                    Ok((pos, start, true))
                } else {
                    Err(TopologyFault::UnclosedLoop)
                };
            }
        }
        Ok((0, self.segments[self.component[0]], false))
    }

    fn walk(&mut self, start_pos: usize, start: Segment, open: bool) -> Result<(), TopologyFault> {
        let chain_start = self.ordered.len();
        self.visited.clear();
        self.visited.resize(self.component.len(), false);
        self.visited[start_pos] = true;
        self.ordered.push(start);

        let mut head = start.head;
        while let Some(pos) = (0..self.component.len())
            .find(|&p| !self.visited[p] && self.segments[self.component[p]].touches(head))
        {
            self.visited[pos] = true;
            let segment = self.segments[self.component[pos]];
            let segment = if segment.tail == head {
                segment
            } else {
                segment.reversed()
            };
            head = segment.head;
            self.ordered.push(segment);
        }

        let len = self.ordered.len() - chain_start;
        if len != self.component.len() {
            return Err(TopologyFault::BrokenChain);
        }
        if !open && head != start.tail {
            return Err(TopologyFault::UnclosedLoop);
        }
        self.chains.push(Chain {
            start: chain_start,
            len,
            open,
        });
        Ok(())
    }
}

/// Fans a closed chain of `n` segments into `n - 2` triangles.
///
/// The fan alternates between the front and the back of the chain so the
/// triangles stay close to the loop's outline.
///
/// # Errors
///
/// [`TopologyFault::DegenerateLoop`] for chains shorter than 3.
pub fn fan_closed(chain: &[Segment], out: &mut Vec<Patch>) -> Result<(), TopologyFault> {
    let n = chain.len();
    if n < 3 {
        return Err(TopologyFault::DegenerateLoop(n));
    }
    if n == 3 {
        out.push(Patch::new(
            [chain[0].tail, chain[1].tail, chain[2].tail],
            chain[0].labels,
        ));
        return Ok(());
    }
    let last = chain[n - 1];
    out.push(Patch::new([chain[0].tail, chain[0].head, last.tail], chain[0].labels));
    zigzag(chain, last.tail, n - 1, n - 3, out);
    Ok(())
}

/// Fans an open chain of `k` segments into `k - 1` triangles.
///
/// The chain runs from one face centre (or free end) to the other; the
/// straight line between its two ends closes the polygon.
///
/// # Errors
///
/// [`TopologyFault::DegenerateLoop`] for a single segment.
pub fn fan_open(chain: &[Segment], out: &mut Vec<Patch>) -> Result<(), TopologyFault> {
    let k = chain.len();
    if k < 2 {
        return Err(TopologyFault::DegenerateLoop(k));
    }
    if k == 2 {
        out.push(Patch::new(
            [chain[0].tail, chain[1].tail, chain[1].head],
            chain[0].labels,
        ));
        return Ok(());
    }
    let end = chain[k - 1].head;
    out.push(Patch::new([chain[0].tail, chain[0].head, end], chain[0].labels));
    zigzag(chain, end, k, k - 2, out);
    Ok(())
}

/// Fans every segment of a chain with the body centre.
pub fn fan_body_center(chain: &[Segment], body_center: usize, out: &mut Vec<Patch>) {
    out.extend(
        chain
            .iter()
            .map(|s| Patch::new([body_center, s.tail, s.head], s.labels)),
    );
}

/// Emits `count` triangles alternating forward from the front and backward
/// from `back`, starting with pivot node `pivot`.
fn zigzag(chain: &[Segment], mut pivot: usize, mut back: usize, count: usize, out: &mut Vec<Patch>) {
    let mut front = 0;
    for step in 1..=count {
        if step % 2 == 1 {
            front += 1;
            let s = chain[front];
            out.push(Patch::new([s.tail, s.head, pivot], s.labels));
            pivot = s.head;
        } else {
            back -= 1;
            let s = chain[back];
            out.push(Patch::new([s.tail, s.head, pivot], s.labels));
            pivot = s.tail;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edges::EdgePlacement;

    fn seg(tail: usize, head: usize) -> Segment {
        Segment {
            tail,
            head,
            labels: [1, 2],
            placement: EdgePlacement::Mid,
        }
    }

    fn traced(segments: &[Segment], anchors: &[usize], allow_open: bool) -> Result<LoopTracer, TopologyFault> {
        let mut tracer = LoopTracer::new();
        tracer.begin();
        tracer.extend(segments);
        tracer.trace(anchors, allow_open)?;
        Ok(tracer)
    }

    #[test]
    fn test_closed_loop_is_ordered_and_flipped() {
        let tracer = traced(&[seg(1, 2), seg(3, 2), seg(3, 4), seg(1, 4)], &[], false).unwrap();
        let chains: Vec<_> = tracer.chains().collect();
        assert_eq!(chains.len(), 1);
        let (chain, open) = chains[0];
        assert!(!open);
        for pair in chain.windows(2) {
            assert_eq!(pair[0].head, pair[1].tail);
        }
        assert_eq!(chain.last().unwrap().head, chain[0].tail);
        assert_eq!(chain[1].labels, [2, 1]);
    }

    #[test]
    fn test_open_chain_without_anchor_is_rejected() {
        let err = traced(&[seg(1, 2), seg(2, 3), seg(3, 4)], &[], false).err();
        assert_eq!(err, Some(TopologyFault::UnclosedLoop));
    }

    #[test]
    fn test_anchored_chain_starts_at_anchor() {
        let tracer = traced(&[seg(2, 3), seg(3, 9), seg(1, 2)], &[9], true).unwrap();
        let (chain, open) = tracer.chains().next().unwrap();
        assert!(open);
        let order: Vec<_> = chain.iter().map(|s| (s.tail, s.head)).collect();
        assert_eq!(order, vec![(9, 3), (3, 2), (2, 1)]);
    }

    #[test]
    fn test_different_interfaces_form_separate_chains() {
        let mut other = seg(2, 5);
        other.labels = [1, 7];
        let tracer = traced(&[seg(1, 2), other, seg(2, 3)], &[1, 3, 5], true).unwrap();
        assert_eq!(tracer.chains().count(), 2);
    }

    #[test]
    fn test_closed_fan_counts() {
        for n in 3..=8 {
            let chain: Vec<_> = (0..n).map(|i| seg(i, (i + 1) % n)).collect();
            let mut out = Vec::new();
            fan_closed(&chain, &mut out).unwrap();
            assert_eq!(out.len(), n - 2);
            for patch in &out {
                let [a, b, c] = patch.nodes;
                assert!(a != b && b != c && a != c);
            }
        }
        assert_eq!(fan_closed(&[seg(0, 1), seg(1, 0)], &mut Vec::new()), Err(TopologyFault::DegenerateLoop(2)));
    }

    #[test]
    fn test_closed_fan_covers_pentagon() {
        let chain: Vec<_> = (0..5).map(|i| seg(i, (i + 1) % 5)).collect();
        let mut out = Vec::new();
        fan_closed(&chain, &mut out).unwrap();
        let tris: Vec<_> = out.iter().map(|p| p.nodes).collect();
        assert_eq!(tris, vec![[0, 1, 4], [1, 2, 4], [3, 4, 2]]);
    }

    #[test]
    fn test_open_fan_counts() {
        for k in 2..=7 {
            let chain: Vec<_> = (0..k).map(|i| seg(i, i + 1)).collect();
            let mut out = Vec::new();
            fan_open(&chain, &mut out).unwrap();
            assert_eq!(out.len(), k - 1);
            for patch in &out {
                let [a, b, c] = patch.nodes;
                assert!(a != b && b != c && a != c);
            }
        }
        assert!(fan_open(&[seg(0, 1)], &mut Vec::new()).is_err());
    }

    #[test]
    fn test_body_center_fan() {
        let chain = [seg(1, 2), seg(2, 3)];
        let mut out = Vec::new();
        fan_body_center(&chain, 99, &mut out);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|p| p.nodes[0] == 99));
    }
}
