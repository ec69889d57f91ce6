/// Little-endian field decoding.
///
/// Every multi-byte on-disk integer goes through [`field`]: the width comes
/// from the requested type and byte 0 is always the least significant.

/// An unsigned integer that can be composed from `WIDTH` little-endian bytes.
pub trait LeInt: Copy {
    const WIDTH: usize;
    fn from_u64(raw: u64) -> Self;
}

macro_rules! le_int {
    ($($ty:ty),*) => {$(
        impl LeInt for $ty {
            const WIDTH: usize = core::mem::size_of::<$ty>();
            fn from_u64(raw: u64) -> Self { raw as $ty }
        }
    )*};
}

le_int!(u8, u16, u32, u64);

/// Compose an integer from `bytes`, byte 0 least significant.
/// At most eight bytes are significant.
pub fn compose(bytes: &[u8]) -> u64 {
    debug_assert!(bytes.len() <= 8);
    bytes.iter().rev().fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
}

/// Decode the `T`-sized field starting at `offset` in `buf`.
///
/// Panics if the field runs past the end of `buf`; callers decode fixed
/// layouts out of buffers they sized themselves.
pub fn field<T: LeInt>(buf: &[u8], offset: usize) -> T {
    T::from_u64(compose(&buf[offset..offset + T::WIDTH]))
}

/// Copy a fixed-size byte array (names, labels, jump code) out of `buf`.
pub fn bytes<const N: usize>(buf: &[u8], offset: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&buf[offset..offset + N]);
    out
}

// ─── Unit tests ────────────────────────────────────────────────────────────────
