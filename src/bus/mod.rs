//! Facilities for representing the simulated 64 KiB memory space.

use byteorder::{ByteOrder, LittleEndian};
use std::io::{self, Read, Write};

//===========================================================================//

macro_rules! invalid_data {
    ($e:expr) => {
        return Err(::std::io::Error::new(::std::io::ErrorKind::InvalidData,
                                         $e))
    };
    ($fmt:expr, $($arg:tt)+) => {
        return Err(::std::io::Error::new(::std::io::ErrorKind::InvalidData,
                                         format!($fmt, $($arg)+)))
    };
}

//===========================================================================//

/// The number of bytes in the simulated address space.
pub const MEMORY_SIZE: usize = 0x10000;

/// The address of the little-endian word holding the initial program counter.
pub const RESET_VECTOR: u16 = 0xfffe;

//===========================================================================//

/// A flat, byte-addressable 64 KiB RAM.  Words are stored little-endian, so
/// the word at address `A` is `byte[A] | byte[A + 1] << 8`.
#[derive(Clone)]
pub struct Ram64k {
    ram: Box<[u8; MEMORY_SIZE]>,
}

impl Ram64k {
    /// Returns a new RAM with every byte set to zero.
    pub fn new() -> Ram64k {
        Ram64k { ram: Box::new([0u8; MEMORY_SIZE]) }
    }

    /// Reads a binary memory image (at most 64 KiB) and loads it verbatim
    /// starting at address zero.  Any bytes beyond the end of the image are
    /// left zeroed.
    pub fn from_image<R: Read>(mut reader: R) -> io::Result<Ram64k> {
        let mut image = Vec::<u8>::new();
        reader.read_to_end(&mut image)?;
        if image.len() > MEMORY_SIZE {
            invalid_data!(
                "memory image is {} bytes, but at most {} are allowed",
                image.len(),
                MEMORY_SIZE
            );
        }
        Ok(Ram64k::from_bytes(&image))
    }

    /// Returns a new RAM whose first bytes are copied from `data`.  Panics if
    /// `data` is longer than 64 KiB.
    pub fn from_bytes(data: &[u8]) -> Ram64k {
        let mut ram = Ram64k::new();
        ram.ram[..data.len()].copy_from_slice(data);
        ram
    }

    /// Returns a new RAM holding the given words, stored little-endian
    /// starting at address `start`.
    pub fn from_words(start: u16, words: &[u16]) -> Ram64k {
        let mut ram = Ram64k::new();
        let mut addr = start;
        for &word in words {
            ram.write_word(addr, word);
            addr = addr.wrapping_add(2);
        }
        ram
    }

    /// Writes the entire 64 KiB of memory to `writer`.
    pub fn dump<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(self.ram.as_slice())
    }

    /// Returns the word stored at the reset vector.
    pub fn reset_vector(&self) -> u16 {
        self.read_word(RESET_VECTOR)
    }

    /// Reads a single byte from memory.
    pub fn read_byte(&self, addr: u16) -> u8 {
        self.ram[addr as usize]
    }

    /// Writes a single byte to memory.
    pub fn write_byte(&mut self, addr: u16, data: u8) {
        self.ram[addr as usize] = data;
    }

    /// Reads a little-endian word from memory.  A word at `0xffff` wraps
    /// around to take its high byte from address zero.
    pub fn read_word(&self, addr: u16) -> u16 {
        if addr == 0xffff {
            u16::from_le_bytes([self.ram[0xffff], self.ram[0]])
        } else {
            let start = addr as usize;
            LittleEndian::read_u16(&self.ram[start..start + 2])
        }
    }

    /// Writes a little-endian word to memory.
    pub fn write_word(&mut self, addr: u16, data: u16) {
        if addr == 0xffff {
            let [lo, hi] = data.to_le_bytes();
            self.ram[0xffff] = lo;
            self.ram[0] = hi;
        } else {
            let start = addr as usize;
            LittleEndian::write_u16(&mut self.ram[start..start + 2], data);
        }
    }

    /// Returns the contents of memory as a slice.
    pub fn as_slice(&self) -> &[u8] {
        self.ram.as_slice()
    }
}

impl Default for Ram64k {
    fn default() -> Ram64k {
        Ram64k::new()
    }
}

//===========================================================================//


//===========================================================================//
