/*
 * nbsock - non-blocking socket adaptation layer
 * This is free and unencumbered software released into the public domain.
 */

//! Host/network byte-order conversion for 16, 32 and 64-bit integers.
//!
//! All widths use the *same* strategy: the value is converted to or from
//! big-endian depending on the endianness of the host, so every conversion is
//! a no-op on big-endian hosts and a byte reversal on little-endian hosts.
//! [`swap64()`] is provided for peers that expect an unconditional reversal.

#[inline]
pub fn hton16(host: u16) -> u16 {
    host.to_be()
}

#[inline]
pub fn ntoh16(net: u16) -> u16 {
    u16::from_be(net)
}

#[inline]
pub fn hton32(host: u32) -> u32 {
    host.to_be()
}

#[inline]
pub fn ntoh32(net: u32) -> u32 {
    u32::from_be(net)
}

#[inline]
pub fn hton64(host: u64) -> u64 {
    host.to_be()
}

#[inline]
pub fn ntoh64(net: u64) -> u64 {
    u64::from_be(net)
}

/// Reverse the byte order of `value` regardless of the host endianness.
#[inline]
pub fn swap64(value: u64) -> u64 {
    value.swap_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: [u64; 6] = [0, 1, 0x0102_0304_0506_0708, u64::MAX, 0x8000_0000_0000_0000, 0xdead_beef_cafe_babe];

    #[test]
    fn network_order_is_big_endian() {
        assert_eq!(hton16(0x0102).to_ne_bytes(), [0x01, 0x02]);
        assert_eq!(hton32(0x0102_0304).to_ne_bytes(), [0x01, 0x02, 0x03, 0x04]);
        assert_eq!(hton64(0x0102_0304_0506_0708).to_ne_bytes(), [1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn round_trip() {
        for value in SAMPLES {
            assert_eq!(ntoh64(hton64(value)), value);
            assert_eq!(ntoh32(hton32(value as u32)), value as u32);
            assert_eq!(ntoh16(hton16(value as u16)), value as u16);
        }
    }

    #[test]
    fn swap64_reverses_every_byte() {
        assert_eq!(swap64(0x0102_0304_0506_0708), 0x0807_0605_0403_0201);
        for value in SAMPLES {
            assert_eq!(swap64(swap64(value)), value);
        }
    }

    #[test]
    #[cfg(target_endian = "little")]
    fn little_endian_host_swaps() {
        assert_eq!(hton64(0x0102_0304_0506_0708), swap64(0x0102_0304_0506_0708));
        assert_eq!(hton16(0x0102), 0x0201);
    }
}
