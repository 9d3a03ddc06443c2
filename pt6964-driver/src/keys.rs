//! Key matrix scanning

use pt6964_hal::ThreeWireBus;

use crate::encoder::Encoder;

/// Number of key-data bits clocked out per scan
pub const KEY_BITS: u32 = 16;

/// Clock a 16-bit key snapshot out of the chip
///
/// `read_action` must be a read-mode action byte. The first bit sampled
/// becomes bit 0 of the result. Chip select is left high afterwards.
pub(crate) fn scan<B: ThreeWireBus>(
    enc: &mut Encoder<'_, B>,
    read_action: u8,
) -> Result<u16, B::Error> {
    enc.select()?;
    enc.send_byte(read_action)?;
    enc.command_wait();

    let mut keys = 0u16;
    for i in 0..KEY_BITS {
        if enc.clock_in_bit()? {
            keys |= 1 << i;
        }
    }

    enc.release()?;
    Ok(keys)
}
