//! USB control-request vocabulary.
//!
//! Still Image class requests from Annex D.5.2 live in `0x64..=0x67`.

/// Class-specific request codes for PTP over USB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ClassRequest {
    /// Abort the transfer identified by the payload's transaction id.
    Cancel = 0x64,
    /// Read extended data for the last interrupt event.
    GetExtendedEventData = 0x65,
    /// Clear stalls, flush buffers and close the current session.
    DeviceReset = 0x66,
    /// Read the device status block (response code + halted endpoints).
    GetDeviceStatus = 0x67,
}

impl ClassRequest {
    /// The `bRequest` value on the wire.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Returns a human-readable name for a class request.
    pub fn name(self) -> &'static str {
        match self {
            ClassRequest::Cancel => "Cancel",
            ClassRequest::GetExtendedEventData => "GetExtendedEventData",
            ClassRequest::DeviceReset => "DeviceReset",
            ClassRequest::GetDeviceStatus => "GetDeviceStatus",
        }
    }

    /// Data stage direction for this request.
    pub fn direction(self) -> Direction {
        match self {
            ClassRequest::Cancel | ClassRequest::DeviceReset => Direction::Out,
            ClassRequest::GetExtendedEventData | ClassRequest::GetDeviceStatus => Direction::In,
        }
    }
}

/// Data stage direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Host to device.
    Out,
    /// Device to host.
    In,
}

/// `bmRequestType` type bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestType {
    Standard,
    Class,
    Vendor,
}

/// `bmRequestType` recipient bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Recipient {
    Device,
    Interface,
    Endpoint,
}

/// A fully described control request, minus its data buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlRequest {
    pub direction: Direction,
    pub request_type: RequestType,
    pub recipient: Recipient,
    pub request: u8,
    pub value: u16,
    pub index: u16,
}

impl ControlRequest {
    /// A Still Image class request addressed to `interface`.
    pub fn class(request: ClassRequest, interface: u16) -> Self {
        Self {
            direction: request.direction(),
            request_type: RequestType::Class,
            recipient: Recipient::Interface,
            request: request.code(),
            value: 0,
            index: interface,
        }
    }

    /// The packed `bmRequestType` byte.
    pub fn request_type_byte(&self) -> u8 {
        let dir = match self.direction {
            Direction::Out => 0x00,
            Direction::In => 0x80,
        };
        let ty = match self.request_type {
            RequestType::Standard => 0x00,
            RequestType::Class => 0x20,
            RequestType::Vendor => 0x40,
        };
        let recipient = match self.recipient {
            Recipient::Device => 0x00,
            Recipient::Interface => 0x01,
            Recipient::Endpoint => 0x02,
        };
        dir | ty | recipient
    }

    /// The class request this describes, if it is one of the PTP requests.
    pub fn class_request(&self) -> Option<ClassRequest> {
        if self.request_type != RequestType::Class {
            return None;
        }
        match self.request {
            0x64 => Some(ClassRequest::Cancel),
            0x65 => Some(ClassRequest::GetExtendedEventData),
            0x66 => Some(ClassRequest::DeviceReset),
            0x67 => Some(ClassRequest::GetDeviceStatus),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_request_type_bytes() {
        let status = ControlRequest::class(ClassRequest::GetDeviceStatus, 0);
        assert_eq!(status.request_type_byte(), 0xA1);
        assert_eq!(status.request, 0x67);

        let reset = ControlRequest::class(ClassRequest::DeviceReset, 2);
        assert_eq!(reset.request_type_byte(), 0x21);
        assert_eq!(reset.index, 2);
    }

    #[test]
    fn class_request_lookup() {
        for req in [
            ClassRequest::Cancel,
            ClassRequest::GetExtendedEventData,
            ClassRequest::DeviceReset,
            ClassRequest::GetDeviceStatus,
        ] {
            let ctl = ControlRequest::class(req, 0);
            assert_eq!(ctl.class_request(), Some(req));
        }

        let vendor = ControlRequest {
            request_type: RequestType::Vendor,
            ..ControlRequest::class(ClassRequest::Cancel, 0)
        };
        assert_eq!(vendor.class_request(), None);
    }
}
