//! Script a device with the mock transport and download one object.
//!
//! Run with: cargo run -p ptpkit --example mock-download

use bytes::BytesMut;
use ptpkit::container::codes::{operation, response};
use ptpkit::container::{encode_data_header, Container, DeviceInfo, Response};
use ptpkit::engine::{DiscardSink, EngineConfig, Initiator};
use ptpkit::transport::MockTransport;

fn data(code: u16, transaction_id: u32, payload: &[u8]) -> Vec<u8> {
    let mut buf = BytesMut::new();
    encode_data_header(payload.len() as u64, code, transaction_id, &mut buf);
    buf.extend_from_slice(payload);
    buf.to_vec()
}

fn ok(transaction_id: u32) -> Vec<u8> {
    let mut buf = BytesMut::new();
    Container::Response(Response::new(response::OK, transaction_id)).encode(&mut buf);
    buf.to_vec()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let device = MockTransport::new(512);

    let info = DeviceInfo {
        standard_version: 100,
        operations_supported: vec![
            operation::GET_DEVICE_INFO,
            operation::OPEN_SESSION,
            operation::CLOSE_SESSION,
            operation::GET_OBJECT,
        ],
        manufacturer: "Example".to_string(),
        model: "Mock Camera".to_string(),
        ..DeviceInfo::default()
    };
    device.push_transfer(data(operation::GET_DEVICE_INFO, 0, &info.encode()));
    device.push_transfer(ok(0));
    device.push_transfer(ok(0));
    device.push_transfer(data(operation::GET_OBJECT, 1, &vec![0xFF; 1 << 20]));
    device.push_transfer(ok(1));
    device.push_transfer(ok(2));

    let initiator = Initiator::attach(device.clone(), EngineConfig::default())?;
    let info = initiator.device_info()?;
    println!("attached: {} {}", info.manufacturer, info.model);

    let session = initiator.open_session()?;
    println!("session {session} open");

    let mut sink = DiscardSink::default();
    initiator.fill_object(1, &mut sink)?;
    println!(
        "downloaded {} bytes in {} bulk reads",
        sink.received,
        device.recv_count()
    );

    initiator.close_session()?;
    Ok(())
}
