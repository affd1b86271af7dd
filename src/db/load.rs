use crate::bus::{MEMORY_SIZE, Ram64k};
use log::{info, warn};
use std::io::{self, Read};

//===========================================================================//

/// Reads a raw memory image and returns the memory it describes.
///
/// The image is loaded verbatim starting at address zero; the program's
/// entry point is the little-endian word at `0xfffe`.  Images shorter than
/// 64 KiB leave the rest of memory zeroed, which usually means the reset
/// vector is zero too.
pub fn load_binary<R: Read>(reader: R) -> io::Result<Ram64k> {
    let ram = Ram64k::from_image(reader)?;
    let entry = ram.reset_vector();
    if entry == 0 {
        warn!("reset vector is zero; execution will start at address 0");
    }
    info!("loaded {MEMORY_SIZE}-byte address space, entry point {entry:04x}");
    Ok(ram)
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::load_binary;
    use std::io::{Cursor, ErrorKind};

    #[test]
    fn full_image() {
        let mut image = vec![0u8; 0x10000];
        image[0x4400] = 0x30;
        image[0x4401] = 0x41;
        image[0xfffe] = 0x00;
        image[0xffff] = 0x44;
        let ram = load_binary(Cursor::new(image)).unwrap();
        assert_eq!(ram.reset_vector(), 0x4400);
        assert_eq!(ram.read_word(0x4400), 0x4130);
    }

    #[test]
    fn short_image_is_zero_filled() {
        let ram = load_binary(Cursor::new(vec![0x12, 0x34])).unwrap();
        assert_eq!(ram.read_word(0), 0x3412);
        assert_eq!(ram.read_word(0x1000), 0);
        assert_eq!(ram.reset_vector(), 0);
    }

    #[test]
    fn oversized_image_is_rejected() {
        let image = vec![0u8; 0x10001];
        let error = load_binary(Cursor::new(image)).err().unwrap();
        assert_eq!(error.kind(), ErrorKind::InvalidData);
    }
}

//===========================================================================//
