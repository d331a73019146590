//! End-to-end session lifecycle tests against the in-process engine.

use crossbeam_channel::Receiver;
use rdp_engine::channels::cliprdr::CF_UNICODETEXT;
use rdp_engine::channels::disp::MonitorLayout;
use rdp_engine::loopback::{
    unicode_text_format_list, ClientClipboardMessage, LoopbackBehavior, LoopbackEngine,
};
use rdp_engine::{CertificateVerdict, EngineError};
use rdp_session::{
    event_channel, ConnectionProfile, SessionController, SessionErrorKind, SessionEvent,
    SessionState, UntrustedCertPolicy,
};
use std::time::{Duration, Instant};

const TIMEOUT: Duration = Duration::from_secs(5);

fn profile() -> ConnectionProfile {
    ConnectionProfile {
        name: "test".into(),
        hostname: "loopback".into(),
        username: "alice".into(),
        password: "secret".into(),
        desktop_width: 800,
        desktop_height: 600,
        ..ConnectionProfile::default()
    }
}

fn wait_for(
    events: &Receiver<SessionEvent>,
    mut pred: impl FnMut(&SessionEvent) -> bool,
) -> SessionEvent {
    let deadline = Instant::now() + TIMEOUT;
    while Instant::now() < deadline {
        if let Ok(event) = events.recv_timeout(Duration::from_millis(100)) {
            if pred(&event) {
                return event;
            }
        }
    }
    panic!("timed out waiting for session event");
}

fn poll_until(mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + TIMEOUT;
    while Instant::now() < deadline {
        if cond() {
            return;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    panic!("timed out waiting for condition");
}

#[test]
fn connect_paints_and_disconnects_cleanly() {
    let engine = LoopbackEngine::new(LoopbackBehavior::default());
    let (tx, rx) = event_channel();
    let session = SessionController::new(engine, tx);

    session.connect(&profile()).unwrap();
    wait_for(&rx, |e| matches!(e, SessionEvent::FrameReady));
    assert!(session.is_connected());

    let fb = session.framebuffer().expect("framebuffer while connected");
    {
        let fb = fb.read();
        assert_eq!((fb.width(), fb.height()), (800, 600));
    }

    session.disconnect();
    wait_for(&rx, |e| matches!(e, SessionEvent::Disconnected));
    assert_eq!(session.state(), SessionState::Idle);
    assert!(session.framebuffer().is_none());
    assert!(session.last_error().is_none());
}

#[test]
fn failed_connect_reports_a_classified_error() {
    let engine = LoopbackEngine::new(LoopbackBehavior {
        fail_connect: Some(EngineError::AuthenticationFailed("bad logon".into())),
        ..LoopbackBehavior::default()
    });
    let (tx, rx) = event_channel();
    let session = SessionController::new(engine, tx);

    session.connect(&profile()).unwrap();
    wait_for(&rx, |e| matches!(e, SessionEvent::ConnectionError));

    poll_until(|| session.state() == SessionState::Failed);
    let err = session.last_error().unwrap();
    assert_eq!(err.kind, SessionErrorKind::AuthenticationFailed);
    assert!(err.detail.contains("bad logon"));

    // A failed session can be retried without an intervening disconnect.
    session.disconnect();
}

#[test]
fn addin_load_failure_aborts_the_connect() {
    let engine = LoopbackEngine::new(LoopbackBehavior {
        fail_addins: true,
        ..LoopbackBehavior::default()
    });
    let (tx, rx) = event_channel();
    let session = SessionController::new(engine.clone(), tx);

    session.connect(&profile()).unwrap();
    wait_for(&rx, |e| matches!(e, SessionEvent::ConnectionError));

    poll_until(|| session.state() == SessionState::Failed);
    assert_eq!(
        session.last_error().unwrap().kind,
        SessionErrorKind::ConnectionFailed
    );
    // The abort happened before the handshake, so no certificate was seen.
    assert_eq!(engine.certificate_verdict(), None);
    assert!(session.framebuffer().is_none());
    session.disconnect();
}

#[test]
fn disconnect_during_connect_cancels_without_an_error() {
    let engine = LoopbackEngine::new(LoopbackBehavior {
        connect_delay: Duration::from_secs(30),
        ..LoopbackBehavior::default()
    });
    let (tx, rx) = event_channel();
    let session = SessionController::new(engine, tx);

    session.connect(&profile()).unwrap();
    std::thread::sleep(Duration::from_millis(50));
    // Joins the worker; must not hang for the full simulated handshake.
    session.disconnect();

    wait_for(&rx, |e| matches!(e, SessionEvent::Disconnected));
    assert_eq!(session.state(), SessionState::Idle);
    assert!(session.last_error().is_none());
}

#[test]
fn ignored_certificate_is_trusted_permanently() {
    let engine = LoopbackEngine::new(LoopbackBehavior::default());
    let (tx, rx) = event_channel();
    let session = SessionController::new(engine.clone(), tx);

    let mut profile = profile();
    profile.ignore_certificate = true;
    session.connect(&profile).unwrap();
    wait_for(&rx, |e| matches!(e, SessionEvent::FrameReady));

    assert_eq!(
        engine.certificate_verdict(),
        Some(CertificateVerdict::AcceptPermanent)
    );
    session.disconnect();
}

#[test]
fn default_policy_accepts_the_certificate_for_this_session_only() {
    let engine = LoopbackEngine::new(LoopbackBehavior::default());
    let (tx, rx) = event_channel();
    let session = SessionController::new(engine.clone(), tx);

    session.connect(&profile()).unwrap();
    wait_for(&rx, |e| matches!(e, SessionEvent::FrameReady));
    assert_eq!(
        engine.certificate_verdict(),
        Some(CertificateVerdict::AcceptOnce)
    );
    session.disconnect();
}

#[test]
fn reject_policy_fails_the_connection() {
    let engine = LoopbackEngine::new(LoopbackBehavior::default());
    let (tx, rx) = event_channel();
    let session = SessionController::new(engine.clone(), tx);

    let mut profile = profile();
    profile.cert_policy = UntrustedCertPolicy::Reject;
    session.connect(&profile).unwrap();

    wait_for(&rx, |e| matches!(e, SessionEvent::ConnectionError));
    assert_eq!(engine.certificate_verdict(), Some(CertificateVerdict::Reject));
    poll_until(|| session.state() == SessionState::Failed);
    assert_eq!(
        session.last_error().unwrap().kind,
        SessionErrorKind::CertificateRejected
    );
}

#[test]
fn clipboard_text_flows_both_ways() {
    let engine = LoopbackEngine::new(LoopbackBehavior {
        server_clipboard_text: "from the server".into(),
        ..LoopbackBehavior::default()
    });
    let (tx, rx) = event_channel();
    let session = SessionController::new(engine.clone(), tx);

    session.connect(&profile()).unwrap();
    wait_for(&rx, |e| matches!(e, SessionEvent::FrameReady));

    // The channel handshake announces capabilities on monitor-ready.
    poll_until(|| {
        engine
            .sent_clipboard()
            .iter()
            .any(|m| matches!(m, ClientClipboardMessage::Capabilities(_)))
    });

    // Client to server: announcing text makes the server request it and
    // receive the encoded payload.
    session.send_clipboard_text("from the client".into()).unwrap();
    poll_until(|| {
        engine.sent_clipboard().iter().any(|m| {
            matches!(
                m,
                ClientClipboardMessage::FormatDataResponse(r)
                    if r.ok && !r.data.is_empty()
            )
        })
    });

    // Server to client: a server format offer ends with latched text.
    engine.push_server_message(
        rdp_engine::channels::cliprdr::ClipboardServerMessage::FormatList(
            unicode_text_format_list(),
        ),
    );
    poll_until(|| {
        engine
            .sent_clipboard()
            .iter()
            .any(|m| matches!(m, ClientClipboardMessage::FormatDataRequest(r) if r.format_id == CF_UNICODETEXT))
    });
    let mut received = None;
    poll_until(|| {
        if let Some(text) = session.received_clipboard_text() {
            received = Some(text);
            true
        } else {
            false
        }
    });
    assert_eq!(received.as_deref(), Some("from the server"));

    session.disconnect();
}

#[test]
fn resolution_change_round_trips_through_the_engine() {
    let engine = LoopbackEngine::new(LoopbackBehavior::default());
    let (tx, rx) = event_channel();
    let session = SessionController::new(engine.clone(), tx);

    session.connect(&profile()).unwrap();
    wait_for(&rx, |e| matches!(e, SessionEvent::FrameReady));
    poll_until(|| session.supports_resolution_change());

    assert!(session.request_resolution_change(1024, 700).unwrap());
    assert_eq!(engine.sent_layouts(), vec![MonitorLayout::primary(1024, 700)]);

    // The event is a bare notification; the new geometry is read back from
    // the framebuffer handle.
    wait_for(&rx, |e| matches!(e, SessionEvent::Resized));
    let fb = session.framebuffer().unwrap();
    poll_until(|| {
        let fb = fb.read();
        (fb.width(), fb.height()) == (1024, 700)
    });

    session.disconnect();
}

#[test]
fn server_initiated_disconnect_ends_the_session() {
    let engine = LoopbackEngine::new(LoopbackBehavior::default());
    let (tx, rx) = event_channel();
    let session = SessionController::new(engine.clone(), tx);

    session.connect(&profile()).unwrap();
    wait_for(&rx, |e| matches!(e, SessionEvent::FrameReady));

    engine.request_disconnect();
    wait_for(&rx, |e| matches!(e, SessionEvent::Disconnected));
    poll_until(|| session.state() == SessionState::Idle);
    // Let the controller reap its worker.
    session.disconnect();
}

#[test]
fn input_is_dropped_until_connected() {
    use rdp_engine::{KeyboardFlags, PointerFlags};

    let engine = LoopbackEngine::new(LoopbackBehavior::default());
    let (tx, rx) = event_channel();
    let session = SessionController::new(engine.clone(), tx);

    // Not connected yet: sends are silently dropped.
    session
        .send_keyboard_event(KeyboardFlags::empty(), 0x1E)
        .unwrap();
    assert!(engine.sent_keys().is_empty());

    session.connect(&profile()).unwrap();
    wait_for(&rx, |e| matches!(e, SessionEvent::FrameReady));

    session
        .send_keyboard_event(KeyboardFlags::empty(), 0x1E)
        .unwrap();
    session
        .send_mouse_event(PointerFlags::MOVE, 10, 20)
        .unwrap();
    assert_eq!(engine.sent_keys(), vec![(KeyboardFlags::empty(), 0x1E)]);
    assert_eq!(engine.sent_pointer(), vec![(PointerFlags::MOVE, 10, 20)]);

    session.disconnect();
}
