use bytes::BytesMut;

use crate::dataset::{DatasetReader, DatasetWriter};
use crate::error::Result;

/// The StorageInfo dataset returned by GetStorageInfo.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StorageInfo {
    pub storage_type: u16,
    pub filesystem_type: u16,
    pub access_capability: u16,
    pub max_capacity: u64,
    pub free_space_in_bytes: u64,
    /// Remaining image capacity, `0xFFFFFFFF` when not reported.
    pub free_space_in_images: u32,
    pub storage_description: String,
    pub volume_label: String,
}

impl StorageInfo {
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut r = DatasetReader::new(payload);
        Ok(Self {
            storage_type: r.u16("storage_type")?,
            filesystem_type: r.u16("filesystem_type")?,
            access_capability: r.u16("access_capability")?,
            max_capacity: r.u64("max_capacity")?,
            free_space_in_bytes: r.u64("free_space_in_bytes")?,
            free_space_in_images: r.u32("free_space_in_images")?,
            storage_description: r.string("storage_description")?,
            volume_label: r.string("volume_label")?,
        })
    }

    pub fn encode(&self) -> BytesMut {
        let mut w = DatasetWriter::new();
        w.u16(self.storage_type)
            .u16(self.filesystem_type)
            .u16(self.access_capability)
            .u64(self.max_capacity)
            .u64(self.free_space_in_bytes)
            .u32(self.free_space_in_images)
            .string(&self.storage_description)
            .string(&self.volume_label);
        w.finish()
    }

    /// Access capability 0 is read-write.
    pub fn is_writable(&self) -> bool {
        self.access_capability == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_encoded_dataset() {
        let info = StorageInfo {
            storage_type: 0x0004,
            filesystem_type: 0x0002,
            access_capability: 0,
            max_capacity: 32 * 1024 * 1024 * 1024,
            free_space_in_bytes: 1024,
            free_space_in_images: 0xFFFF_FFFF,
            storage_description: "SD".to_string(),
            volume_label: String::new(),
        };
        let decoded = StorageInfo::decode(&info.encode()).unwrap();
        assert_eq!(decoded, info);
        assert!(decoded.is_writable());
    }
}
