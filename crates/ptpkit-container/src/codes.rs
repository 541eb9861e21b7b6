//! Standard PTP (ISO 15740) code values.
//!
//! Codes are grouped by what they name. Vendor extensions live in the
//! `0x9000..=0x9FFF` (operations), `0xA000..=0xAFFF` (responses),
//! `0xC000..=0xCFFF` (events) and `0xD000..=0xDFFF` (properties) ranges.

/// Operation codes (command/data containers).
pub mod operation {
    pub const UNDEFINED: u16 = 0x1000;
    pub const GET_DEVICE_INFO: u16 = 0x1001;
    pub const OPEN_SESSION: u16 = 0x1002;
    pub const CLOSE_SESSION: u16 = 0x1003;
    pub const GET_STORAGE_IDS: u16 = 0x1004;
    pub const GET_STORAGE_INFO: u16 = 0x1005;
    pub const GET_NUM_OBJECTS: u16 = 0x1006;
    pub const GET_OBJECT_HANDLES: u16 = 0x1007;
    pub const GET_OBJECT_INFO: u16 = 0x1008;
    pub const GET_OBJECT: u16 = 0x1009;
    pub const GET_THUMB: u16 = 0x100A;
    pub const DELETE_OBJECT: u16 = 0x100B;
    pub const SEND_OBJECT_INFO: u16 = 0x100C;
    pub const SEND_OBJECT: u16 = 0x100D;
    pub const INITIATE_CAPTURE: u16 = 0x100E;
    pub const FORMAT_STORE: u16 = 0x100F;
    pub const RESET_DEVICE: u16 = 0x1010;
    pub const SELF_TEST: u16 = 0x1011;
    pub const SET_OBJECT_PROTECTION: u16 = 0x1012;
    pub const POWER_DOWN: u16 = 0x1013;
    pub const GET_DEVICE_PROP_DESC: u16 = 0x1014;
    pub const GET_DEVICE_PROP_VALUE: u16 = 0x1015;
    pub const SET_DEVICE_PROP_VALUE: u16 = 0x1016;
    pub const RESET_DEVICE_PROP_VALUE: u16 = 0x1017;
    pub const TERMINATE_OPEN_CAPTURE: u16 = 0x1018;
    pub const MOVE_OBJECT: u16 = 0x1019;
    pub const COPY_OBJECT: u16 = 0x101A;
    pub const GET_PARTIAL_OBJECT: u16 = 0x101B;
    pub const INITIATE_OPEN_CAPTURE: u16 = 0x101C;

    /// Returns the standard name of an operation code.
    pub fn name(code: u16) -> Option<&'static str> {
        Some(match code {
            UNDEFINED => "Undefined",
            GET_DEVICE_INFO => "GetDeviceInfo",
            OPEN_SESSION => "OpenSession",
            CLOSE_SESSION => "CloseSession",
            GET_STORAGE_IDS => "GetStorageIDs",
            GET_STORAGE_INFO => "GetStorageInfo",
            GET_NUM_OBJECTS => "GetNumObjects",
            GET_OBJECT_HANDLES => "GetObjectHandles",
            GET_OBJECT_INFO => "GetObjectInfo",
            GET_OBJECT => "GetObject",
            GET_THUMB => "GetThumb",
            DELETE_OBJECT => "DeleteObject",
            SEND_OBJECT_INFO => "SendObjectInfo",
            SEND_OBJECT => "SendObject",
            INITIATE_CAPTURE => "InitiateCapture",
            FORMAT_STORE => "FormatStore",
            RESET_DEVICE => "ResetDevice",
            SELF_TEST => "SelfTest",
            SET_OBJECT_PROTECTION => "SetObjectProtection",
            POWER_DOWN => "PowerDown",
            GET_DEVICE_PROP_DESC => "GetDevicePropDesc",
            GET_DEVICE_PROP_VALUE => "GetDevicePropValue",
            SET_DEVICE_PROP_VALUE => "SetDevicePropValue",
            RESET_DEVICE_PROP_VALUE => "ResetDevicePropValue",
            TERMINATE_OPEN_CAPTURE => "TerminateOpenCapture",
            MOVE_OBJECT => "MoveObject",
            COPY_OBJECT => "CopyObject",
            GET_PARTIAL_OBJECT => "GetPartialObject",
            INITIATE_OPEN_CAPTURE => "InitiateOpenCapture",
            _ => return None,
        })
    }

    /// True for codes in the vendor-extension range.
    pub fn is_vendor(code: u16) -> bool {
        (0x9000..=0x9FFF).contains(&code)
    }
}

/// Response codes (response containers and device status).
pub mod response {
    pub const UNDEFINED: u16 = 0x2000;
    pub const OK: u16 = 0x2001;
    pub const GENERAL_ERROR: u16 = 0x2002;
    pub const SESSION_NOT_OPEN: u16 = 0x2003;
    pub const INVALID_TRANSACTION_ID: u16 = 0x2004;
    pub const OPERATION_NOT_SUPPORTED: u16 = 0x2005;
    pub const PARAMETER_NOT_SUPPORTED: u16 = 0x2006;
    pub const INCOMPLETE_TRANSFER: u16 = 0x2007;
    pub const INVALID_STORAGE_ID: u16 = 0x2008;
    pub const INVALID_OBJECT_HANDLE: u16 = 0x2009;
    pub const DEVICE_PROP_NOT_SUPPORTED: u16 = 0x200A;
    pub const INVALID_OBJECT_FORMAT_CODE: u16 = 0x200B;
    pub const STORE_FULL: u16 = 0x200C;
    pub const OBJECT_WRITE_PROTECTED: u16 = 0x200D;
    pub const STORE_READ_ONLY: u16 = 0x200E;
    pub const ACCESS_DENIED: u16 = 0x200F;
    pub const NO_THUMBNAIL_PRESENT: u16 = 0x2010;
    pub const SELF_TEST_FAILED: u16 = 0x2011;
    pub const PARTIAL_DELETION: u16 = 0x2012;
    pub const STORE_NOT_AVAILABLE: u16 = 0x2013;
    pub const SPECIFICATION_BY_FORMAT_UNSUPPORTED: u16 = 0x2014;
    pub const NO_VALID_OBJECT_INFO: u16 = 0x2015;
    pub const INVALID_CODE_FORMAT: u16 = 0x2016;
    pub const UNKNOWN_VENDOR_CODE: u16 = 0x2017;
    pub const CAPTURE_ALREADY_TERMINATED: u16 = 0x2018;
    pub const DEVICE_BUSY: u16 = 0x2019;
    pub const INVALID_PARENT_OBJECT: u16 = 0x201A;
    pub const INVALID_DEVICE_PROP_FORMAT: u16 = 0x201B;
    pub const INVALID_DEVICE_PROP_VALUE: u16 = 0x201C;
    pub const INVALID_PARAMETER: u16 = 0x201D;
    pub const SESSION_ALREADY_OPEN: u16 = 0x201E;
    pub const TRANSACTION_CANCELLED: u16 = 0x201F;
    pub const SPECIFICATION_OF_DESTINATION_UNSUPPORTED: u16 = 0x2020;

    /// Returns the standard name of a response code.
    pub fn name(code: u16) -> Option<&'static str> {
        Some(match code {
            UNDEFINED => "Undefined",
            OK => "OK",
            GENERAL_ERROR => "GeneralError",
            SESSION_NOT_OPEN => "SessionNotOpen",
            INVALID_TRANSACTION_ID => "InvalidTransactionID",
            OPERATION_NOT_SUPPORTED => "OperationNotSupported",
            PARAMETER_NOT_SUPPORTED => "ParameterNotSupported",
            INCOMPLETE_TRANSFER => "IncompleteTransfer",
            INVALID_STORAGE_ID => "InvalidStorageID",
            INVALID_OBJECT_HANDLE => "InvalidObjectHandle",
            DEVICE_PROP_NOT_SUPPORTED => "DevicePropNotSupported",
            INVALID_OBJECT_FORMAT_CODE => "InvalidObjectFormatCode",
            STORE_FULL => "StoreFull",
            OBJECT_WRITE_PROTECTED => "ObjectWriteProtected",
            STORE_READ_ONLY => "StoreReadOnly",
            ACCESS_DENIED => "AccessDenied",
            NO_THUMBNAIL_PRESENT => "NoThumbnailPresent",
            SELF_TEST_FAILED => "SelfTestFailed",
            PARTIAL_DELETION => "PartialDeletion",
            STORE_NOT_AVAILABLE => "StoreNotAvailable",
            SPECIFICATION_BY_FORMAT_UNSUPPORTED => "SpecificationByFormatUnsupported",
            NO_VALID_OBJECT_INFO => "NoValidObjectInfo",
            INVALID_CODE_FORMAT => "InvalidCodeFormat",
            UNKNOWN_VENDOR_CODE => "UnknownVendorCode",
            CAPTURE_ALREADY_TERMINATED => "CaptureAlreadyTerminated",
            DEVICE_BUSY => "DeviceBusy",
            INVALID_PARENT_OBJECT => "InvalidParentObject",
            INVALID_DEVICE_PROP_FORMAT => "InvalidDevicePropFormat",
            INVALID_DEVICE_PROP_VALUE => "InvalidDevicePropValue",
            INVALID_PARAMETER => "InvalidParameter",
            SESSION_ALREADY_OPEN => "SessionAlreadyOpen",
            TRANSACTION_CANCELLED => "TransactionCancelled",
            SPECIFICATION_OF_DESTINATION_UNSUPPORTED => "SpecificationOfDestinationUnsupported",
            _ => return None,
        })
    }

    /// True for codes in the vendor-extension range.
    pub fn is_vendor(code: u16) -> bool {
        (0xA000..=0xAFFF).contains(&code)
    }
}

/// Event codes (interrupt-endpoint event containers).
pub mod event {
    pub const UNDEFINED: u16 = 0x4000;
    pub const CANCEL_TRANSACTION: u16 = 0x4001;
    pub const OBJECT_ADDED: u16 = 0x4002;
    pub const OBJECT_REMOVED: u16 = 0x4003;
    pub const STORE_ADDED: u16 = 0x4004;
    pub const STORE_REMOVED: u16 = 0x4005;
    pub const DEVICE_PROP_CHANGED: u16 = 0x4006;
    pub const OBJECT_INFO_CHANGED: u16 = 0x4007;
    pub const DEVICE_INFO_CHANGED: u16 = 0x4008;
    pub const REQUEST_OBJECT_TRANSFER: u16 = 0x4009;
    pub const STORE_FULL: u16 = 0x400A;
    pub const DEVICE_RESET: u16 = 0x400B;
    pub const STORAGE_INFO_CHANGED: u16 = 0x400C;
    pub const CAPTURE_COMPLETE: u16 = 0x400D;
    pub const UNREPORTED_STATUS: u16 = 0x400E;

    /// Returns the standard name of an event code.
    pub fn name(code: u16) -> Option<&'static str> {
        Some(match code {
            UNDEFINED => "Undefined",
            CANCEL_TRANSACTION => "CancelTransaction",
            OBJECT_ADDED => "ObjectAdded",
            OBJECT_REMOVED => "ObjectRemoved",
            STORE_ADDED => "StoreAdded",
            STORE_REMOVED => "StoreRemoved",
            DEVICE_PROP_CHANGED => "DevicePropChanged",
            OBJECT_INFO_CHANGED => "ObjectInfoChanged",
            DEVICE_INFO_CHANGED => "DeviceInfoChanged",
            REQUEST_OBJECT_TRANSFER => "RequestObjectTransfer",
            STORE_FULL => "StoreFull",
            DEVICE_RESET => "DeviceReset",
            STORAGE_INFO_CHANGED => "StorageInfoChanged",
            CAPTURE_COMPLETE => "CaptureComplete",
            UNREPORTED_STATUS => "UnreportedStatus",
            _ => return None,
        })
    }
}

/// Device property codes.
pub mod property {
    pub const UNDEFINED: u16 = 0x5000;
    pub const BATTERY_LEVEL: u16 = 0x5001;
    pub const FUNCTIONAL_MODE: u16 = 0x5002;
    pub const IMAGE_SIZE: u16 = 0x5003;
    pub const COMPRESSION_SETTING: u16 = 0x5004;
    pub const WHITE_BALANCE: u16 = 0x5005;
    pub const RGB_GAIN: u16 = 0x5006;
    pub const F_NUMBER: u16 = 0x5007;
    pub const FOCAL_LENGTH: u16 = 0x5008;
    pub const FOCUS_DISTANCE: u16 = 0x5009;
    pub const FOCUS_MODE: u16 = 0x500A;
    pub const EXPOSURE_METERING_MODE: u16 = 0x500B;
    pub const FLASH_MODE: u16 = 0x500C;
    pub const EXPOSURE_TIME: u16 = 0x500D;
    pub const EXPOSURE_PROGRAM_MODE: u16 = 0x500E;
    pub const EXPOSURE_INDEX: u16 = 0x500F;
    pub const EXPOSURE_BIAS_COMPENSATION: u16 = 0x5010;
    pub const DATE_TIME: u16 = 0x5011;
    pub const CAPTURE_DELAY: u16 = 0x5012;
    pub const STILL_CAPTURE_MODE: u16 = 0x5013;
    pub const CONTRAST: u16 = 0x5014;
    pub const SHARPNESS: u16 = 0x5015;
    pub const DIGITAL_ZOOM: u16 = 0x5016;
    pub const EFFECT_MODE: u16 = 0x5017;
    pub const BURST_NUMBER: u16 = 0x5018;
    pub const BURST_INTERVAL: u16 = 0x5019;
    pub const TIMELAPSE_NUMBER: u16 = 0x501A;
    pub const TIMELAPSE_INTERVAL: u16 = 0x501B;
    pub const FOCUS_METERING_MODE: u16 = 0x501C;
    pub const UPLOAD_URL: u16 = 0x501D;
    pub const ARTIST: u16 = 0x501E;
    pub const COPYRIGHT_INFO: u16 = 0x501F;

    /// Returns the standard name of a device property code.
    pub fn name(code: u16) -> Option<&'static str> {
        Some(match code {
            UNDEFINED => "Undefined",
            BATTERY_LEVEL => "BatteryLevel",
            FUNCTIONAL_MODE => "FunctionalMode",
            IMAGE_SIZE => "ImageSize",
            COMPRESSION_SETTING => "CompressionSetting",
            WHITE_BALANCE => "WhiteBalance",
            RGB_GAIN => "RGBGain",
            F_NUMBER => "FNumber",
            FOCAL_LENGTH => "FocalLength",
            FOCUS_DISTANCE => "FocusDistance",
            FOCUS_MODE => "FocusMode",
            EXPOSURE_METERING_MODE => "ExposureMeteringMode",
            FLASH_MODE => "FlashMode",
            EXPOSURE_TIME => "ExposureTime",
            EXPOSURE_PROGRAM_MODE => "ExposureProgramMode",
            EXPOSURE_INDEX => "ExposureIndex",
            EXPOSURE_BIAS_COMPENSATION => "ExposureBiasCompensation",
            DATE_TIME => "DateTime",
            CAPTURE_DELAY => "CaptureDelay",
            STILL_CAPTURE_MODE => "StillCaptureMode",
            CONTRAST => "Contrast",
            SHARPNESS => "Sharpness",
            DIGITAL_ZOOM => "DigitalZoom",
            EFFECT_MODE => "EffectMode",
            BURST_NUMBER => "BurstNumber",
            BURST_INTERVAL => "BurstInterval",
            TIMELAPSE_NUMBER => "TimelapseNumber",
            TIMELAPSE_INTERVAL => "TimelapseInterval",
            FOCUS_METERING_MODE => "FocusMeteringMode",
            UPLOAD_URL => "UploadURL",
            ARTIST => "Artist",
            COPYRIGHT_INFO => "CopyrightInfo",
            _ => return None,
        })
    }
}

/// Object format codes.
pub mod format {
    pub const UNDEFINED: u16 = 0x3000;
    pub const ASSOCIATION: u16 = 0x3001;
    pub const SCRIPT: u16 = 0x3002;
    pub const EXECUTABLE: u16 = 0x3003;
    pub const TEXT: u16 = 0x3004;
    pub const HTML: u16 = 0x3005;
    pub const DPOF: u16 = 0x3006;
    pub const AIFF: u16 = 0x3007;
    pub const WAV: u16 = 0x3008;
    pub const MP3: u16 = 0x3009;
    pub const AVI: u16 = 0x300A;
    pub const MPEG: u16 = 0x300B;
    pub const ASF: u16 = 0x300C;
    pub const UNDEFINED_IMAGE: u16 = 0x3800;
    pub const EXIF_JPEG: u16 = 0x3801;
    pub const TIFF_EP: u16 = 0x3802;
    pub const FLASHPIX: u16 = 0x3803;
    pub const BMP: u16 = 0x3804;
    pub const CIFF: u16 = 0x3805;
    pub const GIF: u16 = 0x3807;
    pub const JFIF: u16 = 0x3808;
    pub const PCD: u16 = 0x3809;
    pub const PICT: u16 = 0x380A;
    pub const PNG: u16 = 0x380B;
    pub const TIFF: u16 = 0x380D;
    pub const TIFF_IT: u16 = 0x380E;
    pub const JP2: u16 = 0x380F;
    pub const JPX: u16 = 0x3810;

    /// True for image formats (`0x3800..=0x38FF`).
    pub fn is_image(code: u16) -> bool {
        code & 0xFF00 == 0x3800
    }

    /// Returns the standard name of an object format code.
    pub fn name(code: u16) -> Option<&'static str> {
        Some(match code {
            UNDEFINED => "Undefined",
            ASSOCIATION => "Association",
            SCRIPT => "Script",
            EXECUTABLE => "Executable",
            TEXT => "Text",
            HTML => "HTML",
            DPOF => "DPOF",
            AIFF => "AIFF",
            WAV => "WAV",
            MP3 => "MP3",
            AVI => "AVI",
            MPEG => "MPEG",
            ASF => "ASF",
            UNDEFINED_IMAGE => "UndefinedImage",
            EXIF_JPEG => "EXIF/JPEG",
            TIFF_EP => "TIFF/EP",
            FLASHPIX => "FlashPix",
            BMP => "BMP",
            CIFF => "CIFF",
            GIF => "GIF",
            JFIF => "JFIF",
            PCD => "PCD",
            PICT => "PICT",
            PNG => "PNG",
            TIFF => "TIFF",
            TIFF_IT => "TIFF/IT",
            JP2 => "JP2",
            JPX => "JPX",
            _ => return None,
        })
    }
}
