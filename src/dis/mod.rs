//! Facilities for decoding and disassembling binary code.

pub mod msp430;

//===========================================================================//
