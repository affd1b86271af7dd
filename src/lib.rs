//! Simulator and interactive debugger for 16-bit MSP430 memory images.

#![warn(missing_docs)]

pub mod bus;
pub mod db;
pub mod dis;
pub mod parse;
pub mod proc;
pub mod trace;
