//! Virtual-channel buffers.
//!
//! A [`Buffer`] owns a fixed number of [`VirtualChannel`] lanes, one per VC
//! index, and dispatches every operation to the indexed lane. Each lane is an
//! independent bounded FIFO so that several logical streams can share one
//! physical link without head-of-line blocking between them.
//!
//! # Example
//!
//! ```
//! use flitsim::buffer::Buffer;
//! use flitsim::flit::Flit;
//!
//! let mut buffer = Buffer::new("input_0", 2, 1);
//! assert!(buffer.add_flit(0, Flit::new(0, 0, 0, 0, 1)).is_ok());
//! assert!(buffer.is_full(0));
//!
//! // A full lane refuses the flit and hands it back
//! let refused = buffer.add_flit(0, Flit::new(1, 1, 0, 0, 1));
//! assert_eq!(refused.unwrap_err().id, 1);
//!
//! // The other lane is unaffected
//! assert!(buffer.is_empty(1));
//! ```

use std::collections::VecDeque;
use std::fmt;

use crate::flit::Flit;
use crate::types::VcIndex;

/// A single bounded FIFO lane.
#[derive(Clone, Debug)]
pub struct VirtualChannel {
    name: String,
    depth: usize,
    flits: VecDeque<Flit>,
}

impl VirtualChannel {
    /// Creates an empty lane holding at most `depth` flits.
    pub fn new(name: impl Into<String>, depth: usize) -> Self {
        assert!(depth > 0, "virtual channel depth must be positive");
        Self {
            name: name.into(),
            depth,
            flits: VecDeque::with_capacity(depth),
        }
    }

    /// Enqueues `flit` at the back of the lane.
    ///
    /// A full lane refuses the flit and returns it unchanged in `Err`; this is
    /// backpressure, not a failure, and occupancy is left as it was.
    pub fn add_flit(&mut self, flit: Flit) -> Result<(), Flit> {
        if self.is_full() {
            return Err(flit);
        }
        self.flits.push_back(flit);
        Ok(())
    }

    /// Dequeues the oldest flit, or `None` if the lane is empty.
    pub fn remove_flit(&mut self) -> Option<Flit> {
        self.flits.pop_front()
    }

    /// Returns the oldest flit without removing it.
    pub fn front(&self) -> Option<&Flit> {
        self.flits.front()
    }

    /// Returns true if the lane holds no flits.
    pub fn is_empty(&self) -> bool {
        self.flits.is_empty()
    }

    /// Returns true if the lane cannot accept another flit.
    pub fn is_full(&self) -> bool {
        self.flits.len() >= self.depth
    }

    /// Number of flits currently held.
    pub fn occupancy(&self) -> usize {
        self.flits.len()
    }

    /// Maximum number of flits the lane can hold.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Name of the lane.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Iterates over held flits, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Flit> {
        self.flits.iter()
    }

    /// Drops every held flit.
    pub fn clear(&mut self) {
        self.flits.clear();
    }
}

impl fmt::Display for VirtualChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}/{}]:", self.name, self.flits.len(), self.depth)?;
        for flit in &self.flits {
            write!(f, " {}", flit.id)?;
        }
        Ok(())
    }
}

/// A set of virtual-channel lanes addressed by index.
///
/// Passing an out-of-range VC index to any operation is a programming error
/// and panics.
#[derive(Clone, Debug)]
pub struct Buffer {
    name: String,
    vcs: Vec<VirtualChannel>,
}

impl Buffer {
    /// Creates a buffer with `num_vcs` lanes named `vc_0 .. vc_{n-1}`, each
    /// holding at most `depth` flits.
    pub fn new(name: impl Into<String>, num_vcs: usize, depth: usize) -> Self {
        assert!(num_vcs > 0, "a buffer needs at least one virtual channel");
        let vcs = (0..num_vcs)
            .map(|i| VirtualChannel::new(format!("vc_{}", i), depth))
            .collect();
        Self {
            name: name.into(),
            vcs,
        }
    }

    /// Attempts to enqueue `flit` on lane `vc`; a full lane hands it back.
    pub fn add_flit(&mut self, vc: VcIndex, flit: Flit) -> Result<(), Flit> {
        self.vc_mut(vc).add_flit(flit)
    }

    /// Dequeues the oldest flit of lane `vc`.
    pub fn remove_flit(&mut self, vc: VcIndex) -> Option<Flit> {
        self.vc_mut(vc).remove_flit()
    }

    /// Oldest flit of lane `vc`, if any.
    pub fn front(&self, vc: VcIndex) -> Option<&Flit> {
        self.vc(vc).front()
    }

    /// Returns true if lane `vc` is empty.
    pub fn is_empty(&self, vc: VcIndex) -> bool {
        self.vc(vc).is_empty()
    }

    /// Returns true if lane `vc` is full.
    pub fn is_full(&self, vc: VcIndex) -> bool {
        self.vc(vc).is_full()
    }

    /// Occupancy of lane `vc`.
    pub fn occupancy(&self, vc: VcIndex) -> usize {
        self.vc(vc).occupancy()
    }

    /// Total flits held across all lanes.
    pub fn total_occupancy(&self) -> usize {
        self.vcs.iter().map(VirtualChannel::occupancy).sum()
    }

    /// Number of lanes.
    pub fn num_vcs(&self) -> usize {
        self.vcs.len()
    }

    /// Name of the buffer.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns lane `vc`.
    pub fn vc(&self, vc: VcIndex) -> &VirtualChannel {
        self.check_vc(vc);
        &self.vcs[vc]
    }

    fn vc_mut(&mut self, vc: VcIndex) -> &mut VirtualChannel {
        self.check_vc(vc);
        &mut self.vcs[vc]
    }

    fn check_vc(&self, vc: VcIndex) {
        assert!(
            vc < self.vcs.len(),
            "VC index {} out of range for buffer {} with {} VCs",
            vc,
            self.name,
            self.vcs.len()
        );
    }

    /// Drops every held flit in every lane.
    pub fn clear(&mut self) {
        self.vcs.iter_mut().for_each(VirtualChannel::clear);
    }

    /// Dumps every lane to the debug log.
    pub fn display(&self) {
        for vc in &self.vcs {
            tracing::debug!(buffer = %self.name, "{}", vc);
        }
    }
}

impl fmt::Display for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.name)?;
        for vc in &self.vcs {
            writeln!(f, "  {}", vc)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flit(id: u64) -> Flit {
        Flit::new(id, id, 0, 0, 1)
    }

    #[test]
    fn test_vc_fifo_order() {
        let mut vc = VirtualChannel::new("vc_0", 3);
        for id in 0..3 {
            vc.add_flit(flit(id)).unwrap();
        }
        assert_eq!(vc.front().map(|f| f.id), Some(0));
        let ids: Vec<_> = std::iter::from_fn(|| vc.remove_flit()).map(|f| f.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert!(vc.is_empty());
    }

    #[test]
    fn test_vc_refuses_when_full() {
        let mut vc = VirtualChannel::new("vc_0", 1);
        assert!(vc.add_flit(flit(0)).is_ok());
        assert!(vc.is_full());

        let refused = vc.add_flit(flit(1)).unwrap_err();
        assert_eq!(refused.id, 1);
        assert_eq!(vc.occupancy(), 1);
    }

    #[test]
    fn test_remove_from_empty_vc() {
        let mut vc = VirtualChannel::new("vc_0", 2);
        assert!(vc.remove_flit().is_none());
    }

    #[test]
    fn test_buffer_lane_names() {
        let buffer = Buffer::new("buf", 3, 4);
        assert_eq!(buffer.num_vcs(), 3);
        assert_eq!(buffer.vc(0).name(), "vc_0");
        assert_eq!(buffer.vc(2).name(), "vc_2");
        assert_eq!(buffer.vc(1).depth(), 4);
    }

    #[test]
    fn test_buffer_lanes_are_independent() {
        let mut buffer = Buffer::new("buf", 2, 1);
        buffer.add_flit(0, flit(0)).unwrap();
        assert!(buffer.is_full(0));
        assert!(buffer.is_empty(1));
        buffer.add_flit(1, flit(1)).unwrap();
        assert_eq!(buffer.total_occupancy(), 2);

        assert_eq!(buffer.remove_flit(1).map(|f| f.id), Some(1));
        assert_eq!(buffer.occupancy(0), 1);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_buffer_out_of_range_vc() {
        let buffer = Buffer::new("buf", 2, 1);
        buffer.is_empty(2);
    }

    #[test]
    #[should_panic(expected = "VC index 3 out of range for buffer buf with 2 VCs")]
    fn test_buffer_out_of_range_remove() {
        let mut buffer = Buffer::new("buf", 2, 1);
        buffer.remove_flit(3);
    }

    #[test]
    fn test_display() {
        let mut buffer = Buffer::new("buf", 2, 2);
        buffer.add_flit(1, flit(5)).unwrap();
        let text = buffer.to_string();
        assert!(text.contains("vc_0 [0/2]:"));
        assert!(text.contains("vc_1 [1/2]: 5"));
    }

    #[test]
    fn test_clear() {
        let mut buffer = Buffer::new("buf", 2, 2);
        buffer.add_flit(0, flit(0)).unwrap();
        buffer.add_flit(1, flit(1)).unwrap();
        buffer.clear();
        assert_eq!(buffer.total_occupancy(), 0);
    }
}
