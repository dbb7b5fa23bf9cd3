//! Application core — pure domain logic, zero I/O.
//!
//! This module contains the business rules for the lamp: touch
//! classification feeding the mode machine, animation selection, and the
//! render side of the color sync protocol.  All interaction with hardware
//! happens through **port traits** defined in [`ports`], keeping this
//! layer fully testable without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
