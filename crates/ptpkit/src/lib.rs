//! Picture Transfer Protocol (ISO 15740) initiator.
//!
//! ptpkit drives cameras and other still-image devices over PTP: it frames
//! commands, streams data phases of any size, and recovers from stalled
//! endpoints without leaving the session half-open.
//!
//! # Crate Structure
//!
//! - [`transport`]: The bulk/control transport capability and a scripted mock
//! - [`container`]: Container, event and dataset codec plus PTP code tables
//! - [`engine`]: Session, transaction engine, stall recovery and the [`Initiator`](engine::Initiator)

/// Re-export transport types.
pub mod transport {
    pub use ptpkit_transport::*;
}

/// Re-export container types.
pub mod container {
    pub use ptpkit_container::*;
}

/// Re-export engine types.
pub mod engine {
    pub use ptpkit_engine::*;
}
