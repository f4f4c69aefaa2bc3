//! The cascade controller.
//!
//! Owns the board and sequences swap → resolve → collapse → refill → scan
//! until the board is stable, then recomputes move availability.

mod controller;
mod flight;

pub use controller::{
    Cascade, CascadeReport, Collaborators, Phase, PopulateReport, SwapOutcome, SwapRejection,
};
