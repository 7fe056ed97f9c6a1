#[macro_use]
extern crate bitflags;

pub mod gb;
