pub mod bones;
pub mod draw;
pub mod material;

use crate::align_to_256;

/// CPU side of a buffer bound with a dynamic offset. Records are packed at a
/// 256 byte stride and written to the GPU in one go per frame.
pub struct DynamicStaging {
    record_size: usize,
    stride: usize,
    capacity: u32,
    bytes: Vec<u8>,
    overflowed: bool,
}

impl DynamicStaging {
    pub fn new(record_size: usize, capacity: u32) -> Self {
        Self {
            record_size,
            stride: align_to_256(record_size),
            capacity,
            bytes: vec![],
            overflowed: false,
        }
    }

    /// Appends a record and returns its dynamic offset, `None` when the
    /// buffer is full.
    pub fn push(&mut self, record: &[u8]) -> Option<u32> {
        debug_assert_eq!(record.len(), self.record_size);
        let index = self.len();
        if index >= self.capacity {
            self.overflowed = true;
            return None;
        }
        let offset = self.bytes.len();
        self.bytes.extend_from_slice(record);
        self.bytes.resize(offset + self.stride, 0);
        Some(offset as u32)
    }

    pub fn len(&self) -> u32 {
        (self.bytes.len() / self.stride) as u32
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn buffer_size(&self) -> wgpu::BufferAddress {
        (self.stride * self.capacity as usize) as wgpu::BufferAddress
    }

    pub fn record_size(&self) -> wgpu::BufferSize {
        wgpu::BufferSize::new(self.record_size as u64).unwrap_or(wgpu::BufferSize::MIN)
    }

    /// Takes this frame's bytes. Returns whether the buffer overflowed, in
    /// which case the capacity has doubled and the GPU buffer must be
    /// recreated.
    pub fn finish(&mut self) -> (Vec<u8>, bool) {
        let grow = std::mem::take(&mut self.overflowed);
        if grow {
            self.capacity *= 2;
        }
        (std::mem::take(&mut self.bytes), grow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_are_packed_at_256_bytes() {
        let mut staging = DynamicStaging::new(192, 4);
        assert_eq!(staging.push(&[1; 192]), Some(0));
        assert_eq!(staging.push(&[2; 192]), Some(256));
        assert_eq!(staging.len(), 2);
        let (bytes, grow) = staging.finish();
        assert!(!grow);
        assert_eq!(bytes.len(), 512);
        assert_eq!(bytes[255], 0);
        assert_eq!(bytes[256], 2);
        assert!(staging.is_empty());
    }

    #[test]
    fn overflow_doubles_capacity_next_frame() {
        let mut staging = DynamicStaging::new(6400, 1);
        assert_eq!(staging.push(&[0; 6400]), Some(0));
        assert_eq!(staging.push(&[0; 6400]), None);
        let (_, grow) = staging.finish();
        assert!(grow);
        assert_eq!(staging.capacity(), 2);
        assert_eq!(staging.buffer_size(), 2 * 6400);
    }
}
