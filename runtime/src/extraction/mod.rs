//! Locating data-bearing nodes in the rendered page, across shadow roots.

pub mod deep;
