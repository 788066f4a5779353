//! dxpool Common Library
//!
//! Shared types, errors, events and collaborator traits for the auction
//! pool. A pool gathers many contributors' funds in two assets, sells them
//! as one position in a batch auction on an external exchange, and pays the
//! proceeds back pro rata.
//!
//! ## Lifecycle
//!
//! ```text
//! Open ──list_to_exchange──▶ Listed ──collect_from_exchange──▶ Settled
//!  │ contribute / withdraw      │ locked                          │ claim (once each)
//! ```
//!
//! - **Phase**: monotonic, Settled is terminal
//! - **Ledger**: per-contributor entries plus pool totals
//! - **Records**: listing and settlement data pinned exactly once
//! - **Events**: every successful operation is logged
//! - **Collaborators**: asset ledger, exchange and price oracle as traits
//!
//! This crate is `no_std` compatible when built without the default `std`
//! feature.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

// Re-export Vec for submodules based on feature
#[cfg(not(feature = "std"))]
pub use alloc::vec::Vec;
#[cfg(feature = "std")]
pub use std::vec::Vec;

pub mod config;
pub mod constants;
pub mod errors;
pub mod events;
pub mod math;
pub mod traits;
pub mod types;

// Re-exports for convenience
pub use config::*;
pub use errors::*;
pub use events::*;
pub use traits::*;
pub use types::*;
