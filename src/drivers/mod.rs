//! Raw peripheral initialisation and pin helpers.

pub mod hw_init;
