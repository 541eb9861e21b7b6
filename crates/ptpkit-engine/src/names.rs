//! Code-name diagnostics, resolved per vendor extension.

use ptpkit_container::codes::{event, format, operation, property, response};
use ptpkit_container::DeviceInfo;

/// Human-readable names for PTP codes.
pub trait CodeNames {
    fn operation_name(&self, code: u16) -> String;
    fn response_name(&self, code: u16) -> String;
    fn property_name(&self, code: u16) -> String;

    fn event_name(&self, code: u16) -> String {
        event::name(code).map_or_else(|| hex_name("Event", code), str::to_string)
    }

    fn format_name(&self, code: u16) -> String {
        format::name(code).map_or_else(|| hex_name("Format", code), str::to_string)
    }
}

/// Vendor extension declared in DeviceInfo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VendorExtension {
    Standard,
    Kodak,
    Microsoft,
    Nikon,
    Canon,
    Fuji,
    Sony,
    Unknown(u32),
}

impl VendorExtension {
    pub fn from_id(id: u32) -> Self {
        match id {
            0x0000_0000 => VendorExtension::Standard,
            0x0000_0001 => VendorExtension::Kodak,
            0x0000_0006 => VendorExtension::Microsoft,
            0x0000_000A => VendorExtension::Nikon,
            0x0000_000B => VendorExtension::Canon,
            0x0000_000E => VendorExtension::Fuji,
            0x0000_0011 => VendorExtension::Sony,
            other => VendorExtension::Unknown(other),
        }
    }

    pub fn id(self) -> u32 {
        match self {
            VendorExtension::Standard => 0x0000_0000,
            VendorExtension::Kodak => 0x0000_0001,
            VendorExtension::Microsoft => 0x0000_0006,
            VendorExtension::Nikon => 0x0000_000A,
            VendorExtension::Canon => 0x0000_000B,
            VendorExtension::Fuji => 0x0000_000E,
            VendorExtension::Sony => 0x0000_0011,
            VendorExtension::Unknown(id) => id,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            VendorExtension::Standard => "Standard",
            VendorExtension::Kodak => "Kodak",
            VendorExtension::Microsoft => "Microsoft",
            VendorExtension::Nikon => "Nikon",
            VendorExtension::Canon => "Canon",
            VendorExtension::Fuji => "Fuji",
            VendorExtension::Sony => "Sony",
            VendorExtension::Unknown(_) => "Unknown",
        }
    }
}

/// Code tables for one device, resolved once from its DeviceInfo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VendorCodeTables {
    extension: VendorExtension,
}

impl Default for VendorCodeTables {
    fn default() -> Self {
        Self::standard()
    }
}

impl VendorCodeTables {
    /// Tables with no vendor extension.
    pub fn standard() -> Self {
        Self {
            extension: VendorExtension::Standard,
        }
    }

    pub fn for_extension(extension: VendorExtension) -> Self {
        Self { extension }
    }

    pub fn for_device(info: &DeviceInfo) -> Self {
        Self::for_extension(VendorExtension::from_id(info.vendor_extension_id))
    }

    pub fn extension(&self) -> VendorExtension {
        self.extension
    }

    fn vendor_operation(&self, code: u16) -> Option<&'static str> {
        Some(match (self.extension, code) {
            (VendorExtension::Kodak, 0x9003) => "Kodak.GetSerial",
            (VendorExtension::Kodak, 0x9004) => "Kodak.SetSerial",
            (VendorExtension::Kodak, 0x9005) => "Kodak.SendFileObjectInfo",
            (VendorExtension::Kodak, 0x9006) => "Kodak.SendFileObject",
            (VendorExtension::Kodak, 0x9008) => "Kodak.SetText",

            (VendorExtension::Microsoft, 0x9801) => "MTP.GetObjectPropsSupported",
            (VendorExtension::Microsoft, 0x9802) => "MTP.GetObjectPropDesc",
            (VendorExtension::Microsoft, 0x9803) => "MTP.GetObjectPropValue",
            (VendorExtension::Microsoft, 0x9804) => "MTP.SetObjectPropValue",
            (VendorExtension::Microsoft, 0x9805) => "MTP.GetObjectPropList",
            (VendorExtension::Microsoft, 0x9810) => "MTP.GetObjectReferences",
            (VendorExtension::Microsoft, 0x9811) => "MTP.SetObjectReferences",

            (VendorExtension::Nikon, 0x90C0) => "Nikon.Capture",
            (VendorExtension::Nikon, 0x90C1) => "Nikon.AfDrive",
            (VendorExtension::Nikon, 0x90C2) => "Nikon.SetControlMode",
            (VendorExtension::Nikon, 0x90C7) => "Nikon.CheckEvent",
            (VendorExtension::Nikon, 0x90C8) => "Nikon.DeviceReady",
            (VendorExtension::Nikon, 0x9201) => "Nikon.StartLiveView",
            (VendorExtension::Nikon, 0x9202) => "Nikon.EndLiveView",
            (VendorExtension::Nikon, 0x9203) => "Nikon.GetLiveViewImage",

            (VendorExtension::Canon, 0x9001) => "Canon.GetPartialObjectInfo",
            (VendorExtension::Canon, 0x9002) => "Canon.SetObjectArchive",
            (VendorExtension::Canon, 0x9003) => "Canon.KeepDeviceOn",
            (VendorExtension::Canon, 0x9004) => "Canon.LockDeviceUI",
            (VendorExtension::Canon, 0x9005) => "Canon.UnlockDeviceUI",
            (VendorExtension::Canon, 0x9006) => "Canon.GetObjectHandleByName",
            (VendorExtension::Canon, 0x9008) => "Canon.InitiateReleaseControl",
            (VendorExtension::Canon, 0x9009) => "Canon.TerminateReleaseControl",
            (VendorExtension::Canon, 0x900B) => "Canon.ViewfinderOn",
            (VendorExtension::Canon, 0x900C) => "Canon.ViewfinderOff",
            (VendorExtension::Canon, 0x900D) => "Canon.DoAeAfAwb",
            (VendorExtension::Canon, 0x9101) => "Canon.EOS.GetStorageIDs",
            (VendorExtension::Canon, 0x910F) => "Canon.EOS.RemoteRelease",
            (VendorExtension::Canon, 0x9110) => "Canon.EOS.SetDevicePropValueEx",
            (VendorExtension::Canon, 0x9114) => "Canon.EOS.SetRemoteMode",
            (VendorExtension::Canon, 0x9115) => "Canon.EOS.SetEventMode",
            (VendorExtension::Canon, 0x9116) => "Canon.EOS.GetEvent",

            (VendorExtension::Sony, 0x9201) => "Sony.SDIOConnect",
            (VendorExtension::Sony, 0x9202) => "Sony.GetSDIOGetExtDeviceInfo",
            (VendorExtension::Sony, 0x9203) => "Sony.GetDevicePropDesc",
            (VendorExtension::Sony, 0x9204) => "Sony.GetDevicePropertyValue",
            (VendorExtension::Sony, 0x9205) => "Sony.SetControlDeviceA",
            (VendorExtension::Sony, 0x9206) => "Sony.GetControlDeviceDesc",
            (VendorExtension::Sony, 0x9207) => "Sony.SetControlDeviceB",
            (VendorExtension::Sony, 0x9209) => "Sony.GetAllDevicePropData",
            _ => return None,
        })
    }

    fn vendor_response(&self, code: u16) -> Option<&'static str> {
        Some(match (self.extension, code) {
            (VendorExtension::Microsoft, 0xA801) => "MTP.InvalidObjectPropCode",
            (VendorExtension::Microsoft, 0xA802) => "MTP.InvalidObjectPropFormat",
            (VendorExtension::Microsoft, 0xA803) => "MTP.InvalidObjectPropValue",
            (VendorExtension::Microsoft, 0xA804) => "MTP.InvalidObjectReference",
            (VendorExtension::Microsoft, 0xA806) => "MTP.InvalidDataset",
            (VendorExtension::Microsoft, 0xA809) => "MTP.ObjectTooLarge",
            (VendorExtension::Microsoft, 0xA80A) => "MTP.ObjectPropNotSupported",

            (VendorExtension::Nikon, 0xA001) => "Nikon.HardwareError",
            (VendorExtension::Nikon, 0xA002) => "Nikon.OutOfFocus",
            (VendorExtension::Nikon, 0xA00B) => "Nikon.NotLiveView",
            _ => return None,
        })
    }

    fn vendor_property(&self, code: u16) -> Option<&'static str> {
        Some(match (self.extension, code) {
            (VendorExtension::Fuji, 0xD001) => "Fuji.FilmSimulation",
            (VendorExtension::Nikon, 0xD1A2) => "Nikon.LiveViewStatus",
            (VendorExtension::Microsoft, 0xD401) => "MTP.SynchronizationPartner",
            (VendorExtension::Microsoft, 0xD402) => "MTP.DeviceFriendlyName",
            _ => return None,
        })
    }

    fn vendor_fallback(&self, kind: &str, code: u16) -> String {
        format!("{}.{kind}(0x{code:04x})", self.extension.name())
    }
}

impl CodeNames for VendorCodeTables {
    fn operation_name(&self, code: u16) -> String {
        if let Some(name) = operation::name(code) {
            return name.to_string();
        }
        match self.vendor_operation(code) {
            Some(name) => name.to_string(),
            None if operation::is_vendor(code) => self.vendor_fallback("Operation", code),
            None => hex_name("Operation", code),
        }
    }

    fn response_name(&self, code: u16) -> String {
        if let Some(name) = response::name(code) {
            return name.to_string();
        }
        match self.vendor_response(code) {
            Some(name) => name.to_string(),
            None if response::is_vendor(code) => self.vendor_fallback("Response", code),
            None => hex_name("Response", code),
        }
    }

    fn property_name(&self, code: u16) -> String {
        if let Some(name) = property::name(code) {
            return name.to_string();
        }
        match self.vendor_property(code) {
            Some(name) => name.to_string(),
            None if (0xD000..=0xDFFF).contains(&code) => self.vendor_fallback("Property", code),
            None => hex_name("Property", code),
        }
    }
}

fn hex_name(kind: &str, code: u16) -> String {
    format!("{kind}(0x{code:04x})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_names() {
        let names = VendorCodeTables::standard();
        assert_eq!(names.operation_name(operation::GET_OBJECT), "GetObject");
        assert_eq!(names.response_name(response::DEVICE_BUSY), "DeviceBusy");
        assert_eq!(names.property_name(property::F_NUMBER), "FNumber");
        assert_eq!(names.event_name(event::OBJECT_ADDED), "ObjectAdded");
        assert_eq!(names.operation_name(0x9999), "Standard.Operation(0x9999)");
        assert_eq!(names.operation_name(0x7000), "Operation(0x7000)");
    }

    #[test]
    fn vendor_tables_follow_extension_id() {
        let info = DeviceInfo {
            vendor_extension_id: 0x0B,
            ..DeviceInfo::default()
        };
        let names = VendorCodeTables::for_device(&info);
        assert_eq!(names.extension(), VendorExtension::Canon);
        assert_eq!(names.operation_name(0x9116), "Canon.EOS.GetEvent");
        assert_eq!(names.operation_name(0x9FFF), "Canon.Operation(0x9fff)");

        let nikon = VendorCodeTables::for_extension(VendorExtension::Nikon);
        assert_eq!(nikon.operation_name(0x9201), "Nikon.StartLiveView");
        let sony = VendorCodeTables::for_extension(VendorExtension::Sony);
        assert_eq!(sony.operation_name(0x9201), "Sony.SDIOConnect");
    }

    #[test]
    fn extension_ids_round_trip() {
        for id in [0, 1, 6, 0x0A, 0x0B, 0x0E, 0x11, 0x42] {
            assert_eq!(VendorExtension::from_id(id).id(), id);
        }
        assert_eq!(VendorExtension::from_id(0x42), VendorExtension::Unknown(0x42));
    }
}
