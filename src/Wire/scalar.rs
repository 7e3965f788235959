// Fixed-width values stored inline in a header or as sequence elements.
// Always little-endian on the wire, whatever the host.

/// A plain value with a fixed wire width.
///
/// `Default` is the value a bounds-checked read falls back to.
pub trait Scalar: Copy + Default + PartialEq + std::fmt::Debug {
    const WIDTH: u32;

    /// Decode from exactly `WIDTH` bytes.
    fn read_le(bytes: &[u8]) -> Self;

    /// Encode into exactly `WIDTH` bytes.
    fn write_le(self, out: &mut [u8]);
}

macro_rules! impl_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Scalar for $ty {
                const WIDTH: u32 = std::mem::size_of::<$ty>() as u32;

                #[inline(always)]
                fn read_le(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(bytes);
                    <$ty>::from_le_bytes(raw)
                }

                #[inline(always)]
                fn write_le(self, out: &mut [u8]) {
                    out.copy_from_slice(&self.to_le_bytes());
                }
            }
        )*
    };
}

impl_scalar!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

impl Scalar for bool {
    const WIDTH: u32 = 1;

    #[inline(always)]
    fn read_le(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }

    #[inline(always)]
    fn write_le(self, out: &mut [u8]) {
        out[0] = self as u8;
    }
}
