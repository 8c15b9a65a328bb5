//! Pre-sized backing store for field content
//!
//! [`FieldDataStorage`] is a single buffer allocated once per session. Field
//! content is appended into it and referenced by [`FieldHandle`]s, so a
//! screen full of fields costs no per-field allocation. Space is reclaimed
//! only by [`FieldDataStorage::reset`], which invalidates every handle.

use crate::error::{StorageError, StorageResult};

/// Location of one field's bytes inside a [`FieldDataStorage`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldHandle {
    pub offset: usize,
    pub length: usize,
}

impl FieldHandle {
    pub fn end(&self) -> usize {
        self.offset + self.length
    }
}

/// Bump-allocated field content buffer
#[derive(Debug, Clone)]
pub struct FieldDataStorage {
    buffer: Vec<u8>,
    used: usize,
}

impl FieldDataStorage {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0; capacity],
            used: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    pub fn used(&self) -> usize {
        self.used
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.used
    }

    fn allocate(&mut self, length: usize) -> StorageResult<FieldHandle> {
        if length > self.remaining() {
            return Err(StorageError::StorageFull {
                requested: length,
                remaining: self.remaining(),
                capacity: self.capacity(),
            });
        }
        let handle = FieldHandle {
            offset: self.used,
            length,
        };
        self.used += length;
        Ok(handle)
    }

    /// Copy `data` into the store
    pub fn add_field(&mut self, data: &[u8]) -> StorageResult<FieldHandle> {
        let handle = self.allocate(data.len())?;
        self.buffer[handle.offset..handle.end()].copy_from_slice(data);
        Ok(handle)
    }

    /// Allocate `length` bytes filled with `fill`
    pub fn reserve(&mut self, length: usize, fill: u8) -> StorageResult<FieldHandle> {
        let handle = self.allocate(length)?;
        self.buffer[handle.offset..handle.end()].fill(fill);
        Ok(handle)
    }

    fn check(&self, handle: FieldHandle) -> StorageResult<()> {
        if handle.end() > self.used {
            return Err(StorageError::InvalidHandle {
                offset: handle.offset,
                length: handle.length,
                used: self.used,
            });
        }
        Ok(())
    }

    /// Overwrite a field; `data` must match the field length exactly
    pub fn update_field(&mut self, handle: FieldHandle, data: &[u8]) -> StorageResult<()> {
        self.check(handle)?;
        if data.len() != handle.length {
            return Err(StorageError::SizeMismatch {
                expected: handle.length,
                actual: data.len(),
            });
        }
        self.buffer[handle.offset..handle.end()].copy_from_slice(data);
        Ok(())
    }

    pub fn get(&self, handle: FieldHandle) -> StorageResult<&[u8]> {
        self.check(handle)?;
        Ok(&self.buffer[handle.offset..handle.end()])
    }

    pub fn get_mut(&mut self, handle: FieldHandle) -> StorageResult<&mut [u8]> {
        self.check(handle)?;
        Ok(&mut self.buffer[handle.offset..handle.end()])
    }

    /// Set one byte within a field
    pub fn set_byte(&mut self, handle: FieldHandle, offset: usize, byte: u8) -> StorageResult<()> {
        if offset >= handle.length {
            return Err(StorageError::OffsetOutOfRange {
                offset,
                length: handle.length,
            });
        }
        self.get_mut(handle)?[offset] = byte;
        Ok(())
    }

    /// Handle to the first `length` bytes of an existing slot
    ///
    /// The tail stays allocated until the next reset.
    pub fn shrink(&self, handle: FieldHandle, length: usize) -> StorageResult<FieldHandle> {
        self.check(handle)?;
        if length > handle.length {
            return Err(StorageError::SizeMismatch {
                expected: handle.length,
                actual: length,
            });
        }
        Ok(FieldHandle {
            offset: handle.offset,
            length,
        })
    }

    /// Release everything; outstanding handles become invalid
    pub fn reset(&mut self) {
        self.used = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_get() {
        let mut storage = FieldDataStorage::new(16);
        let a = storage.add_field(b"HELLO").unwrap();
        let b = storage.add_field(b"WORLD").unwrap();
        assert_eq!(storage.get(a).unwrap(), b"HELLO");
        assert_eq!(storage.get(b).unwrap(), b"WORLD");
        assert_eq!(storage.used(), 10);
        assert_eq!(storage.remaining(), 6);
    }

    #[test]
    fn test_storage_full_boundary() {
        let mut storage = FieldDataStorage::new(10);
        storage.add_field(&[0; 6]).unwrap();

        assert_eq!(
            storage.add_field(&[0; 5]),
            Err(StorageError::StorageFull { requested: 5, remaining: 4, capacity: 10 })
        );
        // Exactly the remaining capacity fits
        assert!(storage.add_field(&[0; 4]).is_ok());
        assert_eq!(storage.remaining(), 0);
        // Empty fields always fit
        assert!(storage.add_field(&[]).is_ok());
    }

    #[test]
    fn test_update_size_mismatch() {
        let mut storage = FieldDataStorage::new(8);
        let handle = storage.reserve(4, b' ').unwrap();
        assert_eq!(storage.get(handle).unwrap(), b"    ");

        assert_eq!(
            storage.update_field(handle, b"ABC"),
            Err(StorageError::SizeMismatch { expected: 4, actual: 3 })
        );
        storage.update_field(handle, b"ABCD").unwrap();
        assert_eq!(storage.get(handle).unwrap(), b"ABCD");
    }

    #[test]
    fn test_set_byte_and_shrink() {
        let mut storage = FieldDataStorage::new(8);
        let handle = storage.add_field(b"ABCD").unwrap();
        storage.set_byte(handle, 3, b'Z').unwrap();
        assert_eq!(storage.get(handle).unwrap(), b"ABCZ");
        assert!(matches!(
            storage.set_byte(handle, 4, b'X'),
            Err(StorageError::OffsetOutOfRange { offset: 4, length: 4 })
        ));

        let short = storage.shrink(handle, 2).unwrap();
        assert_eq!(storage.get(short).unwrap(), b"AB");
        assert!(storage.shrink(handle, 5).is_err());
    }

    #[test]
    fn test_reset_invalidates_handles() {
        let mut storage = FieldDataStorage::new(8);
        let handle = storage.add_field(b"ABCD").unwrap();
        storage.reset();
        assert_eq!(storage.used(), 0);
        assert!(matches!(storage.get(handle), Err(StorageError::InvalidHandle { .. })));
    }
}
