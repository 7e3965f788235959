//! Static message layout.
//!
//! A message is a fixed-size header followed by out-of-line payloads:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ Header (schema-fixed size, multiple of 8)                │
//! │   inline field      → value, little-endian, its width    │
//! │   variable field    → Reference (offset, size, stride)   │
//! ├──────────────────────────────────────────────────────────┤
//! │ Payloads, any order, each `byte_size` contiguous bytes   │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Fields are packed in declaration order without interior padding. The header
//! ends at the next multiple of 8 strictly past the last field byte. Producer
//! and consumer must share the schema; nothing on the wire identifies it.

/// Encoded size of a `Reference` in a header slot.
pub const REFERENCE_SIZE: u32 = 12;

/// Header slot of a variable-length field.
///
/// Invariant: `byte_size % element_stride == 0`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Reference {
    /// Offset of the payload from the start of the buffer.
    pub offset: u32,
    /// Payload length in bytes.
    pub byte_size: u32,
    /// Width of one element; fixed per field.
    pub element_stride: u32,
}

impl Reference {
    pub const fn new(offset: u32, byte_size: u32, element_stride: u32) -> Self {
        Self {
            offset,
            byte_size,
            element_stride,
        }
    }

    /// Number of whole elements the payload holds.
    pub const fn element_count(&self) -> u32 {
        if self.element_stride == 0 {
            0
        } else {
            self.byte_size / self.element_stride
        }
    }

    pub fn to_bytes(self) -> [u8; REFERENCE_SIZE as usize] {
        let mut out = [0u8; REFERENCE_SIZE as usize];
        out[0..4].copy_from_slice(&self.offset.to_le_bytes());
        out[4..8].copy_from_slice(&self.byte_size.to_le_bytes());
        out[8..12].copy_from_slice(&self.element_stride.to_le_bytes());
        out
    }

    pub fn from_bytes(bytes: [u8; REFERENCE_SIZE as usize]) -> Self {
        Self {
            offset: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            byte_size: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            element_stride: u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
        }
    }
}

/// How a field is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Fixed-width scalar held directly in the header.
    Inline { width: u32 },
    /// Sequence of `stride`-wide elements held out of line.
    Variable { stride: u32 },
}

impl FieldKind {
    /// Bytes the field occupies inside the header
    pub const fn header_width(&self) -> u32 {
        match *self {
            FieldKind::Inline { width } => width,
            FieldKind::Variable { .. } => REFERENCE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl Field {
    pub const fn inline(name: &'static str, width: u32) -> Self {
        Self {
            name,
            kind: FieldKind::Inline { width },
        }
    }

    pub const fn variable(name: &'static str, stride: u32) -> Self {
        Self {
            name,
            kind: FieldKind::Variable { stride },
        }
    }
}

/// Ordered field list of one message type.
///
/// Every layout query is a `const fn`, so message types pin their header size
/// and slot offsets at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    pub name: &'static str,
    pub fields: &'static [Field],
}

impl Schema {
    pub const fn new(name: &'static str, fields: &'static [Field]) -> Self {
        Self { name, fields }
    }

    /// Header byte offset of field `index`.
    ///
    /// # Panics
    /// At compile time when used in a const with an out-of-range index.
    pub const fn offset_of(&self, index: usize) -> u32 {
        assert!(index < self.fields.len(), "field index out of range");
        let mut offset = 0;
        let mut i = 0;
        while i < index {
            offset += self.fields[i].kind.header_width();
            i += 1;
        }
        offset
    }

    /// Bytes used by the fields themselves, before padding.
    pub const fn content_size(&self) -> u32 {
        let mut size = 0;
        let mut i = 0;
        while i < self.fields.len() {
            size += self.fields[i].kind.header_width();
            i += 1;
        }
        size
    }

    /// Fixed header size, padded to the next multiple of 8 past the content.
    pub const fn header_size(&self) -> u32 {
        (self.content_size() / 8 + 1) * 8
    }

    /// Element width of the variable field at `index`, 0 for inline fields.
    pub const fn stride_of(&self, index: usize) -> u32 {
        match self.fields[index].kind {
            FieldKind::Variable { stride } => stride,
            FieldKind::Inline { .. } => 0,
        }
    }

    /// Find a field by name together with its header offset.
    pub fn field(&self, name: &str) -> Option<(u32, &Field)> {
        let index = self.fields.iter().position(|f| f.name == name)?;
        Some((self.offset_of(index), &self.fields[index]))
    }

    /// Header offsets of every variable field, in declaration order.
    pub fn reference_slots(&self) -> Vec<(&'static str, u32)> {
        self.fields
            .iter()
            .enumerate()
            .filter(|(_, f)| matches!(f.kind, FieldKind::Variable { .. }))
            .map(|(i, f)| (f.name, self.offset_of(i)))
            .collect()
    }
}
