use bytes::BytesMut;

use crate::codes::format;
use crate::dataset::{DatasetReader, DatasetWriter};
use crate::error::Result;

/// The ObjectInfo dataset (GetObjectInfo, SendObjectInfo).
///
/// Dates are PTP date-time strings (`YYYYMMDDThhmmss[.s]`), kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectInfo {
    pub storage_id: u32,
    pub object_format: u16,
    pub protection_status: u16,
    pub object_compressed_size: u32,
    pub thumb_format: u16,
    pub thumb_compressed_size: u32,
    pub thumb_pix_width: u32,
    pub thumb_pix_height: u32,
    pub image_pix_width: u32,
    pub image_pix_height: u32,
    pub image_bit_depth: u32,
    pub parent_object: u32,
    pub association_type: u16,
    pub association_desc: u32,
    pub sequence_number: u32,
    pub filename: String,
    pub capture_date: String,
    pub modification_date: String,
    pub keywords: String,
}

impl ObjectInfo {
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut r = DatasetReader::new(payload);
        Ok(Self {
            storage_id: r.u32("storage_id")?,
            object_format: r.u16("object_format")?,
            protection_status: r.u16("protection_status")?,
            object_compressed_size: r.u32("object_compressed_size")?,
            thumb_format: r.u16("thumb_format")?,
            thumb_compressed_size: r.u32("thumb_compressed_size")?,
            thumb_pix_width: r.u32("thumb_pix_width")?,
            thumb_pix_height: r.u32("thumb_pix_height")?,
            image_pix_width: r.u32("image_pix_width")?,
            image_pix_height: r.u32("image_pix_height")?,
            image_bit_depth: r.u32("image_bit_depth")?,
            parent_object: r.u32("parent_object")?,
            association_type: r.u16("association_type")?,
            association_desc: r.u32("association_desc")?,
            sequence_number: r.u32("sequence_number")?,
            filename: r.string("filename")?,
            capture_date: r.string("capture_date")?,
            modification_date: r.string("modification_date")?,
            keywords: r.string("keywords")?,
        })
    }

    pub fn encode(&self) -> BytesMut {
        let mut w = DatasetWriter::new();
        w.u32(self.storage_id)
            .u16(self.object_format)
            .u16(self.protection_status)
            .u32(self.object_compressed_size)
            .u16(self.thumb_format)
            .u32(self.thumb_compressed_size)
            .u32(self.thumb_pix_width)
            .u32(self.thumb_pix_height)
            .u32(self.image_pix_width)
            .u32(self.image_pix_height)
            .u32(self.image_bit_depth)
            .u32(self.parent_object)
            .u16(self.association_type)
            .u32(self.association_desc)
            .u32(self.sequence_number)
            .string(&self.filename)
            .string(&self.capture_date)
            .string(&self.modification_date)
            .string(&self.keywords);
        w.finish()
    }

    pub fn is_image(&self) -> bool {
        format::is_image(self.object_format)
    }

    pub fn is_association(&self) -> bool {
        self.object_format == format::ASSOCIATION
    }
}
