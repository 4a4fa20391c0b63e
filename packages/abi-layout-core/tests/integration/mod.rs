//! Integration test suite.
//!
//! 1. Layout properties over randomised inputs
//! 2. Registry sharing across threads
//! 3. Kernel record round trips through raw memory

pub mod layout_properties;
pub mod registry_tests;
pub mod syscall_buffers;
