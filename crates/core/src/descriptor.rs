use crate::Format;
use std::ops::BitOr;
use thiserror::Error;

/// Maximum number of input elements in a layout, and the number of output elements in a [`crate::SimdVertex`].
pub const MAX_ATTRIBUTES: usize = 32;

/// Maximum number of vertex streams an element may reference.
pub const MAX_VERTEX_STREAMS: usize = 32;

/// Width of the index buffer elements.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum IndexType {
    U8,
    U16,
    U32,
}

impl IndexType {
    pub fn bytes(self) -> usize {
        match self {
            IndexType::U8 => 1,
            IndexType::U16 => 2,
            IndexType::U32 => 4,
        }
    }
}

/// Which of the X/Y/Z/W components of an element are materialized.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct ComponentMask(u8);

impl ComponentMask {
    pub const NONE: Self = Self(0);
    pub const X: Self = Self(1);
    pub const Y: Self = Self(2);
    pub const Z: Self = Self(4);
    pub const W: Self = Self(8);
    pub const XY: Self = Self(3);
    pub const XYZ: Self = Self(7);
    pub const XYZW: Self = Self(15);

    pub fn from_bits(bits: u8) -> Self {
        Self(bits & 15)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, component: usize) -> bool {
        component < 4 && self.0 & (1 << component) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn count(self) -> u32 {
        self.0.count_ones()
    }
}

impl BitOr for ComponentMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// What to write into an enabled output component.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum ComponentControl {
    /// Leave the output component unwritten.
    NoStore,
    /// Take the component from the vertex buffer.
    StoreSrc,
    Store0,
    Store1Fp,
    Store1Int,
}

/// Whether an element advances per vertex or per instance.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Instancing {
    PerVertex,
    /// Advance once every `n` instances. A step rate of 0 pins every instance to element 0.
    PerInstance(u32),
}

/// How the attribute loads get lowered.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum FetchStrategy {
    /// Masked per-lane gathers, one per 4 byte group.
    Gather,
    /// Scalar loads per lane followed by an in-register transpose.
    Linear,
}

impl FetchStrategy {
    /// Prefer gathers only when the host has hardware gather instructions.
    pub fn detect() -> Self {
        #[cfg(target_arch = "x86_64")]
        if is_x86_feature_detected!("avx2") {
            return FetchStrategy::Gather;
        }

        FetchStrategy::Linear
    }
}

/// A single attribute binding of a vertex layout.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct InputElement {
    pub stream: u32,
    /// Byte offset of the attribute inside one vertex of its stream.
    pub offset: u32,
    pub format: Format,
    pub packing: ComponentMask,
    pub control: [ComponentControl; 4],
    pub instancing: Instancing,
}

impl InputElement {
    /// Per vertex element that fetches all four components from memory.
    pub fn new(stream: u32, offset: u32, format: Format) -> Self {
        Self {
            stream,
            offset,
            format,
            packing: ComponentMask::XYZW,
            control: [ComponentControl::StoreSrc; 4],
            instancing: Instancing::PerVertex,
        }
    }

    pub fn with_packing(mut self, packing: ComponentMask) -> Self {
        self.packing = packing;
        self
    }

    pub fn with_control(mut self, control: [ComponentControl; 4]) -> Self {
        self.control = control;
        self
    }

    pub fn per_instance(mut self, step_rate: u32) -> Self {
        self.instancing = Instancing::PerInstance(step_rate);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DescriptorError {
    #[error("vertex layout has {count} elements, at most {MAX_ATTRIBUTES} are supported")]
    TooManyElements { count: usize },

    #[error("element {element} references stream {stream}, at most {MAX_VERTEX_STREAMS} streams are supported")]
    StreamOutOfRange { element: usize, stream: u32 },
}

/// Everything that determines the shape of a compiled fetch function.
///
/// Equal descriptors always compile to equivalent functions, so a descriptor can be used as a cache key.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct FetchDescriptor {
    elements: Vec<InputElement>,
    index_type: IndexType,
    oob_checks: bool,
    cut_index: Option<u32>,
    strategy: FetchStrategy,
}

impl FetchDescriptor {
    /// Create a descriptor with out of bounds checking enabled, no cut index and the gather strategy.
    pub fn new(
        index_type: IndexType,
        elements: impl IntoIterator<Item = InputElement>,
    ) -> Result<Self, DescriptorError> {
        let elements = elements.into_iter().collect::<Vec<_>>();

        if elements.len() > MAX_ATTRIBUTES {
            return Err(DescriptorError::TooManyElements { count: elements.len() });
        }

        if let Some((element, stream)) = elements
            .iter()
            .enumerate()
            .find(|(_, e)| e.stream as usize >= MAX_VERTEX_STREAMS)
            .map(|(i, e)| (i, e.stream))
        {
            return Err(DescriptorError::StreamOutOfRange { element, stream });
        }

        Ok(Self {
            elements,
            index_type,
            oob_checks: true,
            cut_index: None,
            strategy: FetchStrategy::Gather,
        })
    }

    pub fn with_oob_checks(mut self, enabled: bool) -> Self {
        self.oob_checks = enabled;
        self
    }

    /// Enable primitive restart: lanes whose index equals `index` get flagged in the cut mask.
    pub fn with_cut_index(mut self, index: Option<u32>) -> Self {
        self.cut_index = index;
        self
    }

    pub fn with_strategy(mut self, strategy: FetchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn elements(&self) -> &[InputElement] {
        &self.elements
    }

    pub fn index_type(&self) -> IndexType {
        self.index_type
    }

    pub fn oob_checks(&self) -> bool {
        self.oob_checks
    }

    pub fn cut_index(&self) -> Option<u32> {
        self.cut_index
    }

    pub fn strategy(&self) -> FetchStrategy {
        self.strategy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn rejects_too_many_elements() {
        let elements = (0..=MAX_ATTRIBUTES as u32).map(|i| InputElement::new(0, i * 4, Format::R32_FLOAT));
        assert_eq!(
            FetchDescriptor::new(IndexType::U32, elements),
            Err(DescriptorError::TooManyElements {
                count: MAX_ATTRIBUTES + 1
            })
        );
    }

    #[test]
    fn rejects_unknown_stream() {
        let elements = [
            InputElement::new(0, 0, Format::R32_FLOAT),
            InputElement::new(MAX_VERTEX_STREAMS as u32, 0, Format::R32_FLOAT),
        ];
        assert_eq!(
            FetchDescriptor::new(IndexType::U16, elements),
            Err(DescriptorError::StreamOutOfRange {
                element: 1,
                stream: MAX_VERTEX_STREAMS as u32
            })
        );
    }

    #[test]
    fn descriptors_hash_by_value() {
        let make = |strategy| {
            FetchDescriptor::new(IndexType::U32, [InputElement::new(0, 0, Format::R8G8B8A8_UNORM)])
                .unwrap()
                .with_strategy(strategy)
        };

        let mut set = HashSet::new();
        set.insert(make(FetchStrategy::Gather));
        set.insert(make(FetchStrategy::Gather));
        set.insert(make(FetchStrategy::Linear));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn detect_is_stable() {
        assert_eq!(FetchStrategy::detect(), FetchStrategy::detect());

        #[cfg(not(target_arch = "x86_64"))]
        assert_eq!(FetchStrategy::detect(), FetchStrategy::Linear);
    }

    #[test]
    fn component_mask() {
        let mask = ComponentMask::X | ComponentMask::W;
        assert!(mask.contains(0));
        assert!(!mask.contains(1));
        assert!(mask.contains(3));
        assert!(!mask.contains(4));
        assert_eq!(mask.count(), 2);
        assert_eq!(ComponentMask::from_bits(0xff), ComponentMask::XYZW);
    }
}
