//! Readers for the site table and swab test data.
mod sites;
mod swabs;

pub use sites::*;
pub use swabs::*;
