/// Numeric interpretation of a single format component.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum ComponentKind {
    /// Unsigned normalized, `[0, 2^n - 1]` maps onto `[0.0, 1.0]`.
    Unorm,
    /// Signed normalized.
    Snorm,
    /// Unsigned integer, zero extended to 32 bits.
    Uint,
    /// Signed integer, sign extended to 32 bits.
    Sint,
    /// Unsigned integer converted to float without scaling.
    Uscaled,
    /// Signed integer converted to float without scaling.
    Sscaled,
    Float,
}

impl ComponentKind {
    pub fn is_signed(self) -> bool {
        matches!(self, Self::Snorm | Self::Sint | Self::Sscaled)
    }
}

/// Static description of a vertex format as found in the format catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormatInfo {
    pub name: &'static str,
    /// Bits per pixel (all components together).
    pub bits: u32,
    pub components: u32,
    pub kind: [ComponentKind; 4],
    /// Source byte/channel feeding each destination channel.
    pub swizzle: [u8; 4],
}

impl FormatInfo {
    pub fn bytes_per_pixel(&self) -> u32 {
        self.bits / 8
    }

    /// All components of a catalog format share one width.
    pub fn bits_per_component(&self) -> u32 {
        self.bits / self.components
    }
}

macro_rules! formats {
    ($($name:ident => ($bits:literal, $comps:literal, $kind:ident $(, [$($swz:literal),*])?)),* $(,)?) => {
        /// Vertex attribute format id.
        #[allow(non_camel_case_types)]
        #[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
        pub enum Format {
            $($name,)*
        }

        impl Format {
            /// Every format in the catalog, in declaration order.
            pub const ALL: &'static [Format] = &[$(Format::$name,)*];

            /// Look up the catalog entry for this format.
            pub fn info(self) -> &'static FormatInfo {
                match self {
                    $(Format::$name => &FormatInfo {
                        name: stringify!($name),
                        bits: $bits,
                        components: $comps,
                        kind: [ComponentKind::$kind; 4],
                        swizzle: formats!(@swizzle $($($swz),*)?),
                    },)*
                }
            }
        }
    };

    (@swizzle) => { [0, 1, 2, 3] };
    (@swizzle $($swz:literal),*) => { [$($swz),*] };
}

formats! {
    R32G32B32A32_FLOAT => (128, 4, Float),
    R32G32B32A32_UINT => (128, 4, Uint),
    R32G32B32A32_SINT => (128, 4, Sint),
    R32G32B32A32_USCALED => (128, 4, Uscaled),
    R32G32B32A32_SSCALED => (128, 4, Sscaled),
    R32G32B32_FLOAT => (96, 3, Float),
    R32G32B32_UINT => (96, 3, Uint),
    R32G32B32_SINT => (96, 3, Sint),
    R32G32_FLOAT => (64, 2, Float),
    R32G32_UINT => (64, 2, Uint),
    R32G32_SINT => (64, 2, Sint),
    R32_FLOAT => (32, 1, Float),
    R32_UINT => (32, 1, Uint),
    R32_SINT => (32, 1, Sint),
    R32_USCALED => (32, 1, Uscaled),
    R32_SSCALED => (32, 1, Sscaled),

    R16G16B16A16_UNORM => (64, 4, Unorm),
    R16G16B16A16_SNORM => (64, 4, Snorm),
    R16G16B16A16_UINT => (64, 4, Uint),
    R16G16B16A16_SINT => (64, 4, Sint),
    R16G16B16A16_USCALED => (64, 4, Uscaled),
    R16G16B16A16_SSCALED => (64, 4, Sscaled),
    R16G16B16A16_FLOAT => (64, 4, Float),
    R16G16_UNORM => (32, 2, Unorm),
    R16G16_SNORM => (32, 2, Snorm),
    R16G16_UINT => (32, 2, Uint),
    R16G16_SINT => (32, 2, Sint),
    R16G16_USCALED => (32, 2, Uscaled),
    R16G16_SSCALED => (32, 2, Sscaled),
    R16G16_FLOAT => (32, 2, Float),
    R16_UNORM => (16, 1, Unorm),
    R16_SNORM => (16, 1, Snorm),
    R16_UINT => (16, 1, Uint),
    R16_SINT => (16, 1, Sint),
    R16_FLOAT => (16, 1, Float),

    R8G8B8A8_UNORM => (32, 4, Unorm),
    R8G8B8A8_SNORM => (32, 4, Snorm),
    R8G8B8A8_UINT => (32, 4, Uint),
    R8G8B8A8_SINT => (32, 4, Sint),
    R8G8B8A8_USCALED => (32, 4, Uscaled),
    R8G8B8A8_SSCALED => (32, 4, Sscaled),
    B8G8R8A8_UNORM => (32, 4, Unorm, [2, 1, 0, 3]),
    R8G8_UNORM => (16, 2, Unorm),
    R8G8_SNORM => (16, 2, Snorm),
    R8G8_UINT => (16, 2, Uint),
    R8G8_SINT => (16, 2, Sint),
    R8_UNORM => (8, 1, Unorm),
    R8_SNORM => (8, 1, Snorm),
    R8_UINT => (8, 1, Uint),
    R8_SINT => (8, 1, Sint),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_consistent() {
        for format in Format::ALL {
            let info = format.info();
            assert!(info.components >= 1 && info.components <= 4, "{}", info.name);
            assert_eq!(info.bits % info.components, 0, "{}", info.name);
            assert!(
                matches!(info.bits_per_component(), 8 | 16 | 32),
                "{} has {} bits per component",
                info.name,
                info.bits_per_component()
            );

            let mut seen = [false; 4];
            for &s in &info.swizzle {
                assert!(!seen[s as usize], "{} swizzle repeats a channel", info.name);
                seen[s as usize] = true;
            }
        }
    }

    #[test]
    fn lookup() {
        let info = Format::R16G16_SNORM.info();
        assert_eq!(info.name, "R16G16_SNORM");
        assert_eq!(info.bytes_per_pixel(), 4);
        assert_eq!(info.bits_per_component(), 16);
        assert_eq!(info.kind[0], ComponentKind::Snorm);

        let info = Format::B8G8R8A8_UNORM.info();
        assert_eq!(info.swizzle, [2, 1, 0, 3]);
        assert_eq!(info.bytes_per_pixel(), 4);

        assert_eq!(Format::R32G32B32_FLOAT.info().bytes_per_pixel(), 12);
    }
}
