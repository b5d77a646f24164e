//! Target language backends.

pub mod js;
