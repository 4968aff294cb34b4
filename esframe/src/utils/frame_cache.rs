use crate::utils::errors::DecodeError;

/// Carry-over buffer for bytes seen but not yet turned into a frame.
///
/// Holds the tail of a frame whose header or payload spans two input chunks.
/// The cache refuses to grow past `limit` so that a corrupt stream which keeps
/// asking for more data cannot make it grow without bound.
#[derive(Debug)]
pub struct FrameCache {
    data: Vec<u8>,
    limit: usize,
}

impl FrameCache {
    /// Creates an empty cache.
    ///
    /// # Arguments
    ///
    /// * `limit` - Maximum number of bytes the cache may hold
    /// * `initial_capacity` - Bytes reserved up front
    pub fn new(limit: usize, initial_capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(initial_capacity.min(limit)),
            limit,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Appends bytes, failing with [`DecodeError::MemLack`] when the limit
    /// would be exceeded. Nothing is appended on failure.
    pub fn extend(&mut self, bytes: &[u8]) -> Result<(), DecodeError> {
        if self.data.len() + bytes.len() > self.limit {
            return Err(DecodeError::MemLack);
        }
        self.data.extend_from_slice(bytes);
        Ok(())
    }

    /// Drops `cnt` bytes from the front.
    pub fn consume_front(&mut self, cnt: usize) {
        self.data.drain(..cnt.min(self.data.len()));
    }

    pub fn truncate(&mut self, len: usize) {
        self.data.truncate(len);
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Releases the backing allocation.
    pub fn release(&mut self) {
        self.data = Vec::new();
    }
}

impl Default for FrameCache {
    fn default() -> Self {
        Self::new(1024 * 1024, 8 * 1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extend_respects_limit() {
        let mut cache = FrameCache::new(8, 4);
        cache.extend(&[1, 2, 3, 4, 5]).unwrap();
        assert_eq!(cache.extend(&[6, 7, 8, 9]), Err(DecodeError::MemLack));
        assert_eq!(cache.as_slice(), &[1, 2, 3, 4, 5]);

        cache.consume_front(2);
        assert_eq!(cache.as_slice(), &[3, 4, 5]);
        cache.extend(&[6, 7, 8, 9, 10]).unwrap();
        assert_eq!(cache.len(), 8);
    }

    #[test]
    fn consume_front_saturates() {
        let mut cache = FrameCache::default();
        cache.extend(b"abc").unwrap();
        cache.consume_front(10);
        assert!(cache.is_empty());
    }
}
