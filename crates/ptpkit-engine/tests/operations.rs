mod common;

use std::io::Write;
use std::time::Duration;

use bytes::BytesMut;
use common::{data_container, fast_config, response, was_reset};
use ptpkit_container::codes::{event, format, operation, response as rc};
use ptpkit_container::{
    ContainerError, DatasetWriter, Event, ObjectInfo, Params, StorageInfo, HEADER_SIZE,
};
use ptpkit_engine::{
    FileSink, FileSource, Initiator, PtpError, ReadSource, SliceSource, ALL_STORAGE,
    ROOT_ASSOCIATION,
};
use ptpkit_transport::{MockTransport, TransportCall};

fn opened(mock: &MockTransport) -> Initiator<MockTransport> {
    mock.push_transfer(response(rc::OK, 0, &[]));
    let initiator = Initiator::with_config(mock.clone(), fast_config());
    initiator.open_session().unwrap();
    mock.clear_calls();
    initiator
}

fn u32_array(values: &[u32]) -> Vec<u8> {
    let mut w = DatasetWriter::new();
    w.u32_array(values);
    w.finish().to_vec()
}

#[test]
fn storage_queries() {
    let mock = MockTransport::new(64);
    let initiator = opened(&mock);

    mock.push_transfer(data_container(
        operation::GET_STORAGE_IDS,
        1,
        &u32_array(&[0x0001_0001, 0x0002_0001]),
    ));
    mock.push_transfer(response(rc::OK, 1, &[]));
    assert_eq!(
        initiator.get_storage_ids().unwrap(),
        vec![0x0001_0001, 0x0002_0001]
    );

    let info = StorageInfo {
        storage_type: 4,
        filesystem_type: 2,
        max_capacity: 1 << 34,
        free_space_in_bytes: 1 << 30,
        free_space_in_images: 1200,
        storage_description: "SD card".to_string(),
        ..StorageInfo::default()
    };
    mock.push_transfer(data_container(operation::GET_STORAGE_INFO, 2, &info.encode()));
    mock.push_transfer(response(rc::OK, 2, &[]));
    assert_eq!(initiator.get_storage_info(0x0001_0001).unwrap(), info);

    mock.push_transfer(data_container(operation::GET_STORAGE_INFO, 3, &info.encode()));
    mock.push_transfer(response(rc::OK, 3, &[]));
    assert!(initiator.has_store(0x0001_0001).unwrap());
}

#[test]
fn object_queries() {
    let mock = MockTransport::new(64);
    let initiator = opened(&mock);

    mock.push_transfer(response(rc::OK, 1, &[3]));
    assert_eq!(
        initiator
            .get_num_objects(ALL_STORAGE, 0, ROOT_ASSOCIATION)
            .unwrap(),
        3
    );

    mock.push_transfer(data_container(
        operation::GET_OBJECT_HANDLES,
        2,
        &u32_array(&[1, 2, 3]),
    ));
    mock.push_transfer(response(rc::OK, 2, &[]));
    assert_eq!(
        initiator
            .get_object_handles(ALL_STORAGE, 0, ROOT_ASSOCIATION)
            .unwrap(),
        vec![1, 2, 3]
    );

    let info = ObjectInfo {
        storage_id: 0x0001_0001,
        object_format: format::EXIF_JPEG,
        object_compressed_size: 1234,
        filename: "IMG_0002.JPG".to_string(),
        ..ObjectInfo::default()
    };
    mock.push_transfer(data_container(operation::GET_OBJECT_INFO, 3, &info.encode()));
    mock.push_transfer(response(rc::OK, 3, &[]));
    assert_eq!(initiator.get_object_info(2).unwrap(), info);

    let sent = mock.sent_bytes();
    // GetNumObjects carries three parameters.
    assert_eq!(&sent[..4], &24u32.to_le_bytes());
}

#[test]
fn missing_response_parameter_is_protocol_error() {
    let mock = MockTransport::new(64);
    let initiator = opened(&mock);

    mock.push_transfer(response(rc::OK, 1, &[]));
    let err = initiator.copy_object(5, 0x0001_0001, 0).unwrap_err();
    assert!(matches!(err, PtpError::Protocol(_)));
    // Raised after a complete transaction; the device is not reset.
    assert!(!was_reset(&mock));
    assert!(initiator.is_session_active());
}

#[test]
fn non_ok_response_surfaces_name() {
    let mock = MockTransport::new(64);
    let initiator = opened(&mock);

    mock.push_transfer(response(rc::INVALID_OBJECT_HANDLE, 1, &[]));
    let err = initiator.delete_object(99, 0).unwrap_err();
    match err {
        PtpError::Response { code, name } => {
            assert_eq!(code, rc::INVALID_OBJECT_HANDLE);
            assert_eq!(name, "InvalidObjectHandle");
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(initiator.is_session_active());
}

#[test]
fn send_object_info_then_object_from_file() {
    let mock = MockTransport::new(64);
    let initiator = opened(&mock);

    let info = ObjectInfo {
        object_format: format::EXIF_JPEG,
        object_compressed_size: 200_000,
        filename: "upload.jpg".to_string(),
        ..ObjectInfo::default()
    };
    mock.push_transfer(response(rc::OK, 1, &[0x0001_0001, 0xFFFF_FFFF, 0x77]));
    let placement = initiator.send_object_info(&info, 0, 0).unwrap();
    assert_eq!(placement.handle, 0x77);
    assert_eq!(placement.storage_id, 0x0001_0001);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("upload.jpg");
    let content: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
    std::fs::File::create(&path)
        .unwrap()
        .write_all(&content)
        .unwrap();

    mock.clear_calls();
    mock.push_transfer(response(rc::OK, 2, &[]));
    let mut source = FileSource::open(&path).unwrap();
    initiator.send_object(&mut source).unwrap();

    let sends: Vec<Vec<u8>> = mock
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            TransportCall::Send(bytes) => Some(bytes),
            _ => None,
        })
        .collect();
    // Command, then the data container in two bounded writes.
    assert_eq!(sends.len(), 3);
    assert_eq!(sends[1].len(), 128 * 1024);
    assert_eq!(sends[2].len(), 200_000 + HEADER_SIZE - 128 * 1024);
    let data: Vec<u8> = sends[1..].concat();
    assert_eq!(&data[..4], &((200_000 + HEADER_SIZE) as u32).to_le_bytes());
    assert_eq!(&data[HEADER_SIZE..], content.as_slice());
    assert!(!mock.calls().contains(&TransportCall::ZeroLengthPacket));
}

#[test]
fn outbound_data_on_packet_boundary_gets_terminator() {
    let mock = MockTransport::new(64);
    let initiator = opened(&mock);

    mock.push_transfer(response(rc::OK, 1, &[]));
    initiator
        .set_device_prop_value(0x5001, &[0u8; 64 - HEADER_SIZE])
        .unwrap();

    let calls = mock.calls();
    assert!(matches!(calls[1], TransportCall::Send(ref b) if b.len() == 64));
    assert_eq!(calls[2], TransportCall::ZeroLengthPacket);
}

#[test]
fn short_source_is_premature_eof() {
    let mock = MockTransport::new(64);
    let initiator = opened(&mock);

    let mut source = ReadSource::new(&b"only ten b"[..], 100);
    let err = initiator.send_object(&mut source).unwrap_err();
    assert!(matches!(
        err,
        PtpError::Protocol(ContainerError::PrematureEof {
            expected: 100,
            transferred: 10
        })
    ));
    assert!(was_reset(&mock));
    assert!(!initiator.is_session_active());
}

#[test]
fn fill_object_streams_to_file() {
    let mock = MockTransport::new(64);
    let initiator = opened(&mock);

    let payload: Vec<u8> = (0..5000u32).map(|i| i as u8).collect();
    mock.push_transfer(data_container(operation::GET_OBJECT, 1, &payload));
    mock.push_transfer(response(rc::OK, 1, &[]));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("download.bin");
    let mut sink = FileSink::create(&path).unwrap();
    initiator.fill_object(4, &mut sink).unwrap();
    drop(sink);

    assert_eq!(std::fs::read(&path).unwrap(), payload);
}

#[test]
fn open_capture_round_trip() {
    let mock = MockTransport::new(64);
    let initiator = opened(&mock);

    mock.push_transfer(response(rc::OK, 1, &[]));
    let capture = initiator.initiate_open_capture(0, 0).unwrap();
    assert_eq!(capture, 1);

    mock.push_transfer(response(rc::OK, 2, &[]));
    initiator.terminate_open_capture(capture).unwrap();
    let sent = mock.sent_bytes();
    // Second command: TerminateOpenCapture(1).
    assert_eq!(&sent[20 + 6..20 + 8], &operation::TERMINATE_OPEN_CAPTURE.to_le_bytes());
    assert_eq!(&sent[20 + 12..20 + 16], &1u32.to_le_bytes());
}

#[test]
fn poll_event_decodes_interrupt_transfer() {
    let mock = MockTransport::new(64);
    let initiator = opened(&mock);

    let mut buf = BytesMut::new();
    Event {
        code: event::OBJECT_ADDED,
        transaction_id: 0,
        params: Params::new(&[0x55]).unwrap(),
    }
    .encode(&mut buf);
    mock.push_interrupt(buf.to_vec());

    let ev = initiator
        .poll_event(Duration::from_millis(10))
        .unwrap()
        .unwrap();
    assert_eq!(ev.code, event::OBJECT_ADDED);
    assert_eq!(ev.params.get(0), Some(0x55));

    assert!(initiator
        .poll_event(Duration::from_millis(10))
        .unwrap()
        .is_none());
}

#[test]
fn extended_event_data_is_raw() {
    let mock = MockTransport::new(64);
    let initiator = opened(&mock);

    mock.push_extended_event_data(vec![1, 2, 3]);
    assert_eq!(initiator.extended_event_data(16).unwrap(), vec![1, 2, 3]);
}

#[test]
fn in_memory_source_sends_property_value() {
    let mock = MockTransport::new(64);
    let initiator = opened(&mock);

    mock.push_transfer(response(rc::OK, 1, &[]));
    initiator.set_device_prop_value(0x5007, &[0x18, 0x01]).unwrap();
    let sent = mock.sent_bytes();
    assert_eq!(&sent[16..], &[14, 0, 0, 0, 2, 0, 0x16, 0x10, 1, 0, 0, 0, 0x18, 0x01]);

    let mut source = SliceSource::new(b"");
    mock.push_transfer(response(rc::OK, 2, &[]));
    initiator.send_object(&mut source).unwrap();
}
