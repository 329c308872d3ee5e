//! Path-based access to a drive whose remote API only exposes a flat,
//! parent-linked listing of objects.
#![allow(clippy::enum_variant_names)]

pub mod application;
pub mod cli;
pub mod config;
pub mod filesystem;
pub mod storage;
