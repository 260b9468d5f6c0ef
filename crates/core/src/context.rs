use crate::MAX_ATTRIBUTES;

/// Number of vertices processed by one invocation of a fetch function.
///
/// The transpose and shuffle tables are built from 4-wide blocks, so this must stay a multiple of 4.
pub const SIMD_WIDTH: usize = 8;

const _: () = assert!(SIMD_WIDTH % 4 == 0 && SIMD_WIDTH >= 4);

pub type SimdFloat = [f32; SIMD_WIDTH];
pub type SimdInt = [u32; SIMD_WIDTH];

/// A vertex stream bound for the duration of a draw.
#[derive(Clone, Copy, Debug)]
pub struct VertexBuffer<'a> {
    pub data: &'a [u8],
    /// Distance in bytes between two consecutive vertices.
    pub pitch: u32,
    /// Size of the buffer in bytes, reads past it are masked off.
    pub size: u32,
    /// Index of the first vertex that is not fully inside the buffer.
    pub max_vertex: u32,
    /// Number of valid bytes in the vertex at `max_vertex`.
    pub partial_inbounds_size: u32,
}

impl<'a> VertexBuffer<'a> {
    /// Describe `data` as a stream of `pitch` byte vertices, deriving the bounds from its length.
    pub fn new(data: &'a [u8], pitch: u32) -> Self {
        let size = u32::try_from(data.len()).unwrap_or(u32::MAX);
        let (max_vertex, partial_inbounds_size) = match pitch {
            0 if size == 0 => (0, 0),
            0 => (u32::MAX, size),
            pitch => (size / pitch, size % pitch),
        };

        Self {
            data,
            pitch,
            size,
            max_vertex,
            partial_inbounds_size,
        }
    }
}

/// Per-call arguments of a fetch function.
///
/// `vertex_id` and `cut_mask` are written by the fetch function, everything else is read only.
#[derive(Clone, Debug)]
pub struct FetchContext<'a> {
    pub streams: &'a [VertexBuffer<'a>],
    /// Index bytes starting at the first index of the batch.
    pub indices: &'a [u8],
    /// Byte offset one past the last valid index in `indices`.
    pub last_index: usize,
    pub start_vertex: u32,
    pub base_vertex: i32,
    pub start_instance: u32,
    pub cur_instance: u32,

    pub vertex_id: SimdInt,
    pub cut_mask: SimdInt,
}

impl<'a> FetchContext<'a> {
    pub fn new(streams: &'a [VertexBuffer<'a>], indices: &'a [u8]) -> Self {
        Self {
            streams,
            indices,
            last_index: indices.len(),
            start_vertex: 0,
            base_vertex: 0,
            start_instance: 0,
            cur_instance: 0,
            vertex_id: [0; SIMD_WIDTH],
            cut_mask: [0; SIMD_WIDTH],
        }
    }
}

/// Structure of arrays vertex batch, `attrib[element][component][lane]`.
#[derive(Clone, Debug, PartialEq)]
pub struct SimdVertex {
    pub attrib: [[SimdFloat; 4]; MAX_ATTRIBUTES],
}

impl SimdVertex {
    pub fn new() -> Self {
        Self {
            attrib: [[[0.0; SIMD_WIDTH]; 4]; MAX_ATTRIBUTES],
        }
    }

    /// Fill every row with the same bit pattern.
    pub fn filled(bits: u32) -> Self {
        Self {
            attrib: [[[f32::from_bits(bits); SIMD_WIDTH]; 4]; MAX_ATTRIBUTES],
        }
    }

    /// Raw lane bits of one row, for integer formats.
    pub fn bits(&self, element: usize, component: usize) -> SimdInt {
        self.attrib[element][component].map(f32::to_bits)
    }
}

impl Default for SimdVertex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_buffer_bounds() {
        let data = [0u8; 30];

        let buffer = VertexBuffer::new(&data, 8);
        assert_eq!(buffer.size, 30);
        assert_eq!(buffer.max_vertex, 3);
        assert_eq!(buffer.partial_inbounds_size, 6);

        let buffer = VertexBuffer::new(&data[..0], 8);
        assert_eq!(buffer.max_vertex, 0);
        assert_eq!(buffer.partial_inbounds_size, 0);

        let buffer = VertexBuffer::new(&data, 0);
        assert_eq!(buffer.max_vertex, u32::MAX);
    }

    #[test]
    fn simd_vertex_bits() {
        let mut vertex = SimdVertex::filled(7);
        vertex.attrib[1][2][3] = f32::from_bits(42);
        assert_eq!(vertex.bits(1, 2)[3], 42);
        assert_eq!(vertex.bits(0, 0)[0], 7);
    }
}
