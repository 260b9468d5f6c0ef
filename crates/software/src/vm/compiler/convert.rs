use super::ir::{IR, IRBuilder};
use vfetch_core::{ComponentControl, ComponentKind};

/// How raw channel bits are widened to 32 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extend {
    Zero,
    Sign,
    Half,
}

/// What happens to a widened channel afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    /// keep the integer (or float) bits
    None,
    Normalized,
    UScaled,
    SScaled,
}

/// Split a component kind into its widening and conversion steps.
pub fn classify(kind: ComponentKind) -> (Extend, Conversion) {
    match kind {
        ComponentKind::Unorm => (Extend::Zero, Conversion::Normalized),
        ComponentKind::Uint => (Extend::Zero, Conversion::None),
        ComponentKind::Uscaled => (Extend::Zero, Conversion::UScaled),
        ComponentKind::Snorm => (Extend::Sign, Conversion::Normalized),
        ComponentKind::Sint => (Extend::Sign, Conversion::None),
        ComponentKind::Sscaled => (Extend::Sign, Conversion::SScaled),
        ComponentKind::Float => (Extend::Half, Conversion::None),
    }
}

/// Scale applied after converting a gathered channel to float.
pub fn conversion_factor(extend: Extend, conversion: Conversion, bits: u32) -> f32 {
    match (conversion, extend, bits) {
        (Conversion::Normalized, Extend::Sign, 8) => 1.0 / 127.0,
        (Conversion::Normalized, Extend::Zero, 8) => 1.0 / 255.0,
        (Conversion::Normalized, Extend::Sign, 16) => 1.0 / 32767.0,
        (Conversion::Normalized, Extend::Zero, 16) => 1.0 / 65535.0,
        (Conversion::UScaled, Extend::Sign, _) => panic!("unsigned scaled conversion of a sign extended channel"),
        (Conversion::SScaled, Extend::Zero, _) => panic!("signed scaled conversion of a zero extended channel"),
        (Conversion::UScaled | Conversion::SScaled, _, _) => 1.0,
        _ => panic!("no conversion factor for {conversion:?} {bits} bit {extend:?} channels"),
    }
}

/// Convert a widened gather channel to its final value.
pub fn convert_gathered<'a>(builder: &IRBuilder<'a>, value: IR<'a>, extend: Extend, conversion: Conversion, bits: u32) -> IR<'a> {
    match conversion {
        Conversion::None => value,
        Conversion::Normalized | Conversion::SScaled => {
            let factor = conversion_factor(extend, conversion, bits);
            builder.mul_f(builder.cast_f(value), builder.lit_f(factor))
        }
        Conversion::UScaled => {
            let factor = conversion_factor(extend, conversion, bits);
            builder.mul_f(builder.cast_uf(value), builder.lit_f(factor))
        }
    }
}

/// Convert a component-major vector produced by the linear path.
///
/// Signed normalized values divide by the full power of two here.
pub fn convert_linear<'a>(builder: &IRBuilder<'a>, value: IR<'a>, kind: ComponentKind, bits: u32) -> IR<'a> {
    match (kind, bits) {
        (ComponentKind::Float, 32) | (ComponentKind::Uint | ComponentKind::Sint, _) => value,
        (ComponentKind::Unorm, 8) => builder.mul_f(builder.cast_f(value), builder.lit_f(1.0 / 255.0)),
        (ComponentKind::Unorm, 16) => builder.mul_f(builder.cast_f(value), builder.lit_f(1.0 / 65535.0)),
        (ComponentKind::Snorm, 8) => builder.mul_f(builder.cast_f(value), builder.lit_f(1.0 / 128.0)),
        (ComponentKind::Snorm, 16) => builder.mul_f(builder.cast_f(value), builder.lit_f(1.0 / 32768.0)),
        (ComponentKind::Uscaled, _) => builder.cast_uf(value),
        (ComponentKind::Sscaled, _) => builder.cast_f(value),
        (kind, bits) => panic!("linear fetch does not support {bits} bit {kind:?} components"),
    }
}

/// Value of a component the format does not provide: (0, 0, 0, 1.0).
pub fn default_component<'a>(builder: &IRBuilder<'a>, component: usize) -> IR<'a> {
    match component {
        3 => builder.lit_f(1.0),
        _ => builder.lit_i(0),
    }
}

/// Constant vector for a component control, `None` for `NoStore`.
pub fn control_vector<'a>(builder: &IRBuilder<'a>, control: ComponentControl) -> Option<IR<'a>> {
    match control {
        ComponentControl::NoStore => None,
        ComponentControl::Store0 => Some(builder.lit_i(0)),
        ComponentControl::Store1Fp => Some(builder.lit_f(1.0)),
        ComponentControl::Store1Int => Some(builder.lit_i(1)),
        ComponentControl::StoreSrc => panic!("StoreSrc has no constant vector"),
    }
}
