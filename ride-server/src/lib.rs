//! Ride-sharing web frontend.
//!
//! A server-rendered web application for a carpooling marketplace: search
//! rides between cities, book seats, publish rides as a driver, review
//! drivers and moderate users. All data lives in a REST backend; this
//! server renders pages, keeps sessions and caches ride lookups.

pub mod backend;
pub mod cache;
pub mod config;
pub mod domain;
pub mod search;
pub mod session;
pub mod web;
