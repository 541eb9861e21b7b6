#![allow(dead_code)]

use std::time::Duration;

use bytes::BytesMut;
use ptpkit_container::codes::operation;
use ptpkit_container::{encode_data_header, Container, DeviceInfo, Params, Response};
use ptpkit_engine::{EngineConfig, RecoveryPolicy};
use ptpkit_transport::{ClassRequest, MockTransport, TransportCall};

/// Engine configuration that does not sleep between status polls.
pub fn fast_config() -> EngineConfig {
    EngineConfig {
        recovery: RecoveryPolicy {
            max_polls: 10,
            poll_interval: Duration::ZERO,
        },
        ..EngineConfig::default()
    }
}

pub fn data_container(code: u16, transaction_id: u32, payload: &[u8]) -> Vec<u8> {
    let mut buf = BytesMut::new();
    encode_data_header(payload.len() as u64, code, transaction_id, &mut buf);
    buf.extend_from_slice(payload);
    buf.to_vec()
}

pub fn response(code: u16, transaction_id: u32, params: &[u32]) -> Vec<u8> {
    let mut buf = BytesMut::new();
    Container::Response(Response {
        code,
        transaction_id,
        params: Params::new(params).unwrap(),
    })
    .encode(&mut buf);
    buf.to_vec()
}

/// A DeviceInfo that supports every standard operation.
pub fn device_info(vendor_extension_id: u32) -> DeviceInfo {
    DeviceInfo {
        standard_version: 100,
        vendor_extension_id,
        operations_supported: (operation::GET_DEVICE_INFO..=operation::INITIATE_OPEN_CAPTURE)
            .collect(),
        manufacturer: "Acme".to_string(),
        model: "Shooter 1".to_string(),
        device_version: "1.0".to_string(),
        serial_number: "0001".to_string(),
        ..DeviceInfo::default()
    }
}

pub fn class_requests(mock: &MockTransport) -> Vec<ClassRequest> {
    mock.calls()
        .into_iter()
        .filter_map(|call| match call {
            TransportCall::Control { request, .. } => request.class_request(),
            _ => None,
        })
        .collect()
}

pub fn was_reset(mock: &MockTransport) -> bool {
    class_requests(mock).contains(&ClassRequest::DeviceReset)
}
