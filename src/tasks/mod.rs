//! Background Tasks Module
//!
//! Optional tasks that run alongside a map on a tokio runtime.
//!
//! # Tasks
//! - Sweeper: purges expired entries at a fixed interval, for maps whose
//!   insert traffic is too low to trigger sweeps on its own

mod sweeper;

pub use sweeper::spawn_sweeper;
