//! Grid Traffic Flow Simulation Library
//!
//! Discrete vehicles advance along fixed one-dimensional paths embedded in
//! a shared 2D grid. This crate covers the simulation core only; rendering
//! and audio are external collaborators driven by the query API.

pub mod simulation;
