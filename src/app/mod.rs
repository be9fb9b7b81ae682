//! Application core — pure domain logic, zero I/O.
//!
//! This module contains the control rules for the panel: button gestures,
//! display and brightness state, and command routing.  All interaction with
//! pins and the network happens through **port traits** defined in
//! [`ports`], keeping this layer fully testable without real peripherals.

pub mod button;
pub mod commands;
pub mod display;
pub mod panel;
pub mod ports;
pub mod router;
