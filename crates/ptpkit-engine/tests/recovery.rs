mod common;

use common::{class_requests, data_container, device_info, fast_config, response, was_reset};
use ptpkit_container::codes::{operation, response as rc};
use ptpkit_engine::{
    clear_and_wait, ClearOutcome, DataPhase, Initiator, PtpError, RecoveryPolicy, SliceSource,
    VecSink,
};
use ptpkit_transport::{ClassRequest, MockTransport, TransportCall, TransportError};

fn opened(mock: &MockTransport) -> Initiator<MockTransport> {
    mock.push_transfer(response(rc::OK, 0, &[]));
    let initiator = Initiator::with_config(mock.clone(), fast_config());
    initiator.open_session().unwrap();
    mock.clear_calls();
    initiator
}

fn stall() -> TransportError {
    TransportError::Stalled {
        endpoint: Some(0x81),
    }
}

#[test]
fn stall_resolves_into_device_response() {
    let mock = MockTransport::new(64);
    let initiator = opened(&mock);

    mock.push_in_fault(stall());
    mock.push_status(rc::DEVICE_BUSY, &[0x81, 0x02]);
    // First poll after clearing reports OK.

    let mut sink = VecSink::new();
    let resp = initiator
        .transact(operation::GET_OBJECT, &[3], DataPhase::Inbound(&mut sink))
        .unwrap();

    assert_eq!(resp.code, rc::DEVICE_BUSY);
    assert_eq!(resp.transaction_id, 1);
    assert!(resp.params.is_empty());
    assert!(initiator.is_session_active());
    assert!(!was_reset(&mock));

    let calls = mock.calls();
    assert!(calls.contains(&TransportCall::ClearHalt(0x81)));
    assert!(calls.contains(&TransportCall::ClearHalt(0x02)));
    assert_eq!(
        class_requests(&mock),
        vec![ClassRequest::GetDeviceStatus, ClassRequest::GetDeviceStatus]
    );
}

#[test]
fn stalled_facade_call_reports_response_code() {
    let mock = MockTransport::new(64);
    let initiator = opened(&mock);

    mock.fail_next_send(stall());
    mock.push_status(rc::STORE_NOT_AVAILABLE, &[0x02]);

    assert!(!initiator.has_store(0x0002_0001).unwrap());
    assert!(initiator.is_session_active());
}

#[test]
fn stall_without_halted_endpoints_uses_status_directly() {
    let mock = MockTransport::new(64);
    let initiator = opened(&mock);

    mock.push_in_fault(stall());
    mock.push_status(rc::INCOMPLETE_TRANSFER, &[]);

    let resp = initiator
        .transact(operation::DELETE_OBJECT, &[3, 0], DataPhase::None)
        .unwrap();
    assert_eq!(resp.code, rc::INCOMPLETE_TRANSFER);
    assert_eq!(class_requests(&mock), vec![ClassRequest::GetDeviceStatus]);
}

#[test]
fn stall_with_ok_status_is_unrecoverable() {
    let mock = MockTransport::new(64);
    let initiator = opened(&mock);

    mock.push_in_fault(stall());
    // No scripted status: the device reports OK.

    let err = initiator
        .transact(operation::DELETE_OBJECT, &[3, 0], DataPhase::None)
        .unwrap_err();
    assert!(err.is_stall());
    assert!(was_reset(&mock));
    assert!(!initiator.is_session_active());
}

#[test]
fn exhausted_recovery_propagates_first_fault() {
    let mock = MockTransport::new(64);
    let initiator = opened(&mock);

    mock.push_in_fault(stall());
    mock.push_status(rc::DEVICE_BUSY, &[0x81]);
    for _ in 0..10 {
        mock.push_status(rc::DEVICE_BUSY, &[]);
    }

    let mut sink = VecSink::new();
    let err = initiator
        .transact(operation::GET_OBJECT, &[3], DataPhase::Inbound(&mut sink))
        .unwrap_err();

    assert!(matches!(
        err,
        PtpError::Transport(TransportError::Stalled {
            endpoint: Some(0x81)
        })
    ));
    assert!(!initiator.is_session_active());
    let requests = class_requests(&mock);
    assert_eq!(requests.len(), 12);
    assert_eq!(requests.last(), Some(&ClassRequest::DeviceReset));

    // A faulted transaction leaves the session closed for the next caller.
    let next = initiator
        .transact(operation::GET_OBJECT, &[3], DataPhase::None)
        .unwrap_err();
    assert!(matches!(next, PtpError::IllegalState(_)));
}

#[test]
fn clear_and_wait_reports_exhaustion() {
    let mut mock = MockTransport::new(64);
    mock.push_status(rc::DEVICE_BUSY, &[0x02]);
    for _ in 0..10 {
        mock.push_status(rc::DEVICE_BUSY, &[]);
    }

    let outcome = clear_and_wait(
        &mut mock,
        &RecoveryPolicy {
            max_polls: 10,
            poll_interval: std::time::Duration::ZERO,
        },
    )
    .unwrap();
    assert_eq!(
        outcome,
        ClearOutcome::Exhausted {
            last_status: rc::DEVICE_BUSY
        }
    );
}

#[test]
fn clear_status_surfaces_exhaustion_as_error() {
    let mock = MockTransport::new(64);
    mock.push_status(rc::DEVICE_BUSY, &[0x81]);
    for _ in 0..10 {
        mock.push_status(rc::DEVICE_BUSY, &[]);
    }
    let initiator = Initiator::with_config(mock, fast_config());

    assert!(matches!(
        initiator.clear_status().unwrap_err(),
        PtpError::RecoveryExhausted {
            polls: 10,
            last_status: rc::DEVICE_BUSY
        }
    ));
}

#[test]
fn other_transport_errors_reset_without_status() {
    let mock = MockTransport::new(64);
    let initiator = opened(&mock);

    mock.push_in_fault(TransportError::Disconnected);
    let err = initiator
        .transact(operation::DELETE_OBJECT, &[3, 0], DataPhase::None)
        .unwrap_err();

    assert!(matches!(
        err,
        PtpError::Transport(TransportError::Disconnected)
    ));
    assert_eq!(class_requests(&mock), vec![ClassRequest::DeviceReset]);
    assert!(!initiator.is_session_active());
}

#[test]
fn failed_reset_still_closes_session() {
    let mock = MockTransport::new(64);
    let initiator = opened(&mock);

    mock.push_in_fault(TransportError::Timeout);
    mock.fail_next_control(TransportError::Disconnected);
    let err = initiator
        .transact(operation::DELETE_OBJECT, &[3, 0], DataPhase::None)
        .unwrap_err();

    // The transport fault wins over the reset failure.
    assert!(matches!(err, PtpError::Transport(TransportError::Timeout)));
    assert!(!initiator.is_session_active());
}

#[test]
fn attach_resets_checks_status_and_caches_info() {
    let mock = MockTransport::new(64);
    mock.push_transfer(data_container(
        operation::GET_DEVICE_INFO,
        0,
        &device_info(0x0B).encode(),
    ));
    mock.push_transfer(response(rc::OK, 0, &[]));

    let initiator = Initiator::attach(mock.clone(), fast_config()).unwrap();
    assert_eq!(
        class_requests(&mock),
        vec![ClassRequest::DeviceReset, ClassRequest::GetDeviceStatus]
    );
    assert_eq!(
        initiator.names().extension(),
        ptpkit_engine::VendorExtension::Canon
    );
    assert!(!initiator.is_session_active());
    assert_eq!(initiator.device_info().unwrap().manufacturer, "Acme");
}

#[test]
fn attach_fails_when_device_stays_busy() {
    let mock = MockTransport::new(64);
    mock.push_status(rc::DEVICE_BUSY, &[]);
    mock.push_status(rc::DEVICE_BUSY, &[]);

    let err = Initiator::attach(mock.clone(), fast_config()).unwrap_err();
    assert!(matches!(
        err,
        PtpError::DeviceNotReady {
            status: rc::DEVICE_BUSY
        }
    ));
    assert_eq!(mock.sent_bytes(), Vec::<u8>::new());
}

#[test]
fn malformed_status_is_reported() {
    let mock = MockTransport::new(64);
    mock.push_status_raw(vec![8, 0, 0x01, 0x20]);
    let initiator = Initiator::with_config(mock, fast_config());

    assert!(matches!(
        initiator.device_status().unwrap_err(),
        PtpError::Status {
            declared: 8,
            received: 4
        }
    ));
}

fn recv_sizes(mock: &MockTransport) -> Vec<(usize, usize)> {
    mock.calls()
        .into_iter()
        .filter_map(|call| match call {
            TransportCall::Recv {
                requested,
                returned,
            } => Some((requested, returned)),
            _ => None,
        })
        .collect()
}

#[test]
fn stall_inside_chunked_download_resolves_into_response() {
    let mock = MockTransport::new(64);
    let initiator = opened(&mock);

    let object = data_container(operation::GET_OBJECT, 1, &vec![0x5A; 300 * 1024]);
    mock.push_unterminated(&object[..64]);
    mock.push_in_fault(stall());
    mock.push_status(rc::INCOMPLETE_TRANSFER, &[0x81]);

    let mut sink = VecSink::new();
    let resp = initiator
        .transact(operation::GET_OBJECT, &[3], DataPhase::Inbound(&mut sink))
        .unwrap();

    assert_eq!(resp.code, rc::INCOMPLETE_TRANSFER);
    assert_eq!(resp.transaction_id, 1);
    assert_eq!(sink.as_slice(), &object[12..64]);
    assert_eq!(recv_sizes(&mock), vec![(64, 64), (128 * 1024, 0)]);
    assert!(mock.calls().contains(&TransportCall::ClearHalt(0x81)));
    assert!(initiator.is_session_active());
    assert!(!was_reset(&mock));
}

#[test]
fn disconnect_inside_chunked_download_resets() {
    let mock = MockTransport::new(64);
    let initiator = opened(&mock);

    let object = data_container(operation::GET_OBJECT, 1, &vec![0x5A; 300 * 1024]);
    mock.push_unterminated(&object[..64 + 128 * 1024]);
    mock.push_in_fault(TransportError::Disconnected);

    let mut sink = VecSink::new();
    let err = initiator
        .transact(operation::GET_OBJECT, &[3], DataPhase::Inbound(&mut sink))
        .unwrap_err();

    assert!(matches!(
        err,
        PtpError::Transport(TransportError::Disconnected)
    ));
    assert_eq!(sink.as_slice().len(), 52 + 128 * 1024);
    assert_eq!(sink.as_slice(), &object[12..64 + 128 * 1024]);
    assert_eq!(class_requests(&mock), vec![ClassRequest::DeviceReset]);
    assert!(!initiator.is_session_active());
}

#[test]
fn stall_on_second_outbound_chunk_resolves_into_response() {
    let mock = MockTransport::new(64);
    let initiator = opened(&mock);

    let payload = vec![0xA5u8; 200_000];
    // Command and first data chunk go through.
    mock.pass_next_sends(2);
    mock.fail_next_send(TransportError::Stalled {
        endpoint: Some(0x02),
    });
    mock.push_status(rc::INCOMPLETE_TRANSFER, &[0x02]);

    let mut source = SliceSource::new(&payload);
    let resp = initiator
        .transact(
            operation::SEND_OBJECT,
            &[],
            DataPhase::Outbound(&mut source),
        )
        .unwrap();

    assert_eq!(resp.code, rc::INCOMPLETE_TRANSFER);
    let calls = mock.calls();
    let sends: Vec<usize> = calls
        .iter()
        .filter_map(|call| match call {
            TransportCall::Send(bytes) => Some(bytes.len()),
            _ => None,
        })
        .collect();
    assert_eq!(sends, vec![12, 128 * 1024, 200_000 + 12 - 128 * 1024]);
    assert!(!calls.contains(&TransportCall::ZeroLengthPacket));
    assert!(calls.contains(&TransportCall::ClearHalt(0x02)));
    assert_eq!(mock.recv_count(), 0);
    assert!(initiator.is_session_active());
    assert!(!was_reset(&mock));
}
