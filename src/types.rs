//! Core type definitions for the simulator.
//!
//! This module defines the fundamental scalar types used throughout the
//! buffer, network and traffic-engine modules.

/// Simulation time in global cycles.
///
/// Every timestamp carried by a flit (`ctime`, `itime`, `atime`, `ttime`)
/// and every injection-queue timer uses this representation.
pub type SimTime = u64;

/// Index of a terminal node in the simulated network, in `0..nodes`.
pub type NodeIndex = usize;

/// Index of a traffic class, in `0..classes`.
pub type ClassId = usize;

/// Index of a virtual channel within a buffer, in `0..num_vcs`.
pub type VcIndex = usize;

/// Unique identifier of a flit within one engine.
pub type FlitId = u64;

/// Unique identifier of a packet within one engine.
pub type PacketId = u64;

/// Identifier shared by every packet of one transaction.
///
/// A request packet and the reply it spawns carry the same id.
pub type TransactionId = u64;
