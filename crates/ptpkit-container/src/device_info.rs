use bytes::BytesMut;

use crate::dataset::{DatasetReader, DatasetWriter};
use crate::error::Result;

/// The DeviceInfo dataset returned by GetDeviceInfo.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceInfo {
    /// PTP version in hundredths (100 = 1.00).
    pub standard_version: u16,
    /// Vendor extension id; 0 when the device uses no extension.
    pub vendor_extension_id: u32,
    pub vendor_extension_version: u16,
    pub vendor_extension_desc: String,
    pub functional_mode: u16,
    pub operations_supported: Vec<u16>,
    pub events_supported: Vec<u16>,
    pub device_properties_supported: Vec<u16>,
    pub capture_formats: Vec<u16>,
    pub image_formats: Vec<u16>,
    pub manufacturer: String,
    pub model: String,
    pub device_version: String,
    pub serial_number: String,
}

impl DeviceInfo {
    /// Decode the dataset from a data-phase payload.
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut r = DatasetReader::new(payload);
        Ok(Self {
            standard_version: r.u16("standard_version")?,
            vendor_extension_id: r.u32("vendor_extension_id")?,
            vendor_extension_version: r.u16("vendor_extension_version")?,
            vendor_extension_desc: r.string("vendor_extension_desc")?,
            functional_mode: r.u16("functional_mode")?,
            operations_supported: r.u16_array("operations_supported")?,
            events_supported: r.u16_array("events_supported")?,
            device_properties_supported: r.u16_array("device_properties_supported")?,
            capture_formats: r.u16_array("capture_formats")?,
            image_formats: r.u16_array("image_formats")?,
            manufacturer: r.string("manufacturer")?,
            model: r.string("model")?,
            device_version: r.string("device_version")?,
            serial_number: r.string("serial_number")?,
        })
    }

    /// Encode the dataset as a responder would send it.
    pub fn encode(&self) -> BytesMut {
        let mut w = DatasetWriter::new();
        w.u16(self.standard_version)
            .u32(self.vendor_extension_id)
            .u16(self.vendor_extension_version)
            .string(&self.vendor_extension_desc)
            .u16(self.functional_mode)
            .u16_array(&self.operations_supported)
            .u16_array(&self.events_supported)
            .u16_array(&self.device_properties_supported)
            .u16_array(&self.capture_formats)
            .u16_array(&self.image_formats)
            .string(&self.manufacturer)
            .string(&self.model)
            .string(&self.device_version)
            .string(&self.serial_number);
        w.finish()
    }

    pub fn supports_operation(&self, code: u16) -> bool {
        self.operations_supported.contains(&code)
    }

    pub fn supports_event(&self, code: u16) -> bool {
        self.events_supported.contains(&code)
    }

    pub fn supports_property(&self, code: u16) -> bool {
        self.device_properties_supported.contains(&code)
    }

    /// True when the device declares a vendor extension.
    pub fn has_vendor_extension(&self) -> bool {
        self.vendor_extension_id != 0
    }
}
