//! Flit definitions.
//!
//! A flit is the smallest flow-control unit moved through the network. A
//! packet is a contiguous run of flits sharing one packet id; the first flit
//! is the head, the last is the tail. Only the tail triggers retirement of
//! the packet at its destination.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{ClassId, FlitId, NodeIndex, PacketId, SimTime, TransactionId, VcIndex};

/// A single flit in flight.
///
/// Identity and routing fields are fixed when the packet is generated. The
/// timestamps `itime` and `atime` are filled in as the flit enters and leaves
/// the network, and `vc` records the lane it was injected on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flit {
    /// Unique flit id
    pub id: FlitId,
    /// Packet this flit belongs to
    pub pid: PacketId,
    /// Transaction this packet belongs to
    pub tid: TransactionId,
    /// Traffic class
    pub cl: ClassId,
    /// Source node
    pub src: NodeIndex,
    /// Destination node
    pub dest: NodeIndex,
    /// First flit of its packet
    pub head: bool,
    /// Last flit of its packet
    pub tail: bool,
    /// Cycle the packet was created
    pub ctime: SimTime,
    /// Cycle this flit entered the network
    pub itime: SimTime,
    /// Cycle this flit arrived at its destination
    pub atime: SimTime,
    /// Cycle the enclosing transaction started
    pub ttime: SimTime,
    /// Virtual channel the flit was injected on
    pub vc: Option<VcIndex>,
    /// Emit watch records for this flit
    pub watch: bool,
    /// Contributes to measured statistics
    pub record: bool,
}

impl Flit {
    /// Creates a single-flit packet (head and tail) with zeroed timestamps.
    pub fn new(id: FlitId, pid: PacketId, cl: ClassId, src: NodeIndex, dest: NodeIndex) -> Self {
        Self {
            id,
            pid,
            tid: pid,
            cl,
            src,
            dest,
            head: true,
            tail: true,
            ctime: 0,
            itime: 0,
            atime: 0,
            ttime: 0,
            vc: None,
            watch: false,
            record: false,
        }
    }

    /// Network latency of this flit: arrival minus injection.
    pub fn network_latency(&self) -> SimTime {
        self.atime.saturating_sub(self.itime)
    }

    /// Packet latency as seen from this flit: arrival minus packet creation.
    pub fn packet_latency(&self) -> SimTime {
        self.atime.saturating_sub(self.ctime)
    }

    /// Transaction latency as seen from this flit: arrival minus transaction start.
    pub fn transaction_latency(&self) -> SimTime {
        self.atime.saturating_sub(self.ttime)
    }
}

impl fmt::Display for Flit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "flit {} (pid {}, tid {}, class {}, {} -> {}",
            self.id, self.pid, self.tid, self.cl, self.src, self.dest
        )?;
        if self.head {
            write!(f, ", head")?;
        }
        if self.tail {
            write!(f, ", tail")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_flit_is_single_flit_packet() {
        let flit = Flit::new(7, 3, 1, 0, 5);
        assert!(flit.head);
        assert!(flit.tail);
        assert_eq!(flit.tid, 3);
        assert_eq!(flit.vc, None);
        assert!(!flit.record);
    }

    #[test]
    fn test_latencies() {
        let mut flit = Flit::new(0, 0, 0, 0, 1);
        flit.ttime = 2;
        flit.ctime = 4;
        flit.itime = 5;
        flit.atime = 15;

        assert_eq!(flit.network_latency(), 10);
        assert_eq!(flit.packet_latency(), 11);
        assert_eq!(flit.transaction_latency(), 13);
    }

    #[test]
    fn test_display() {
        let flit = Flit::new(1, 2, 0, 3, 4);
        let text = flit.to_string();
        assert!(text.contains("flit 1"));
        assert!(text.contains("3 -> 4"));
        assert!(text.contains("head"));
        assert!(text.contains("tail"));
    }

    #[test]
    fn test_serialization_roundtrip() {
        let flit = Flit::new(9, 9, 2, 1, 0);
        let json = serde_json::to_string(&flit).unwrap();
        let restored: Flit = serde_json::from_str(&json).unwrap();
        assert_eq!(flit, restored);
    }
}
