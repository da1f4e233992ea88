//! Byte-level checks of the send/delete sequences and modem lifecycle.

mod common;

use std::io;
use std::time::Duration;

use common::ScriptedTransport;
use smsweather::config::TimingConfig;
use smsweather::modem::{Modem, SendError, SendState, TransportError};

fn modem(transport: &ScriptedTransport) -> Modem<ScriptedTransport> {
    Modem::new(transport.clone(), TimingConfig::default())
}

#[tokio::test(start_paused = true)]
async fn send_writes_compose_body_and_terminator() {
    let transport = ScriptedTransport::new();
    let mut modem = modem(&transport);

    let started = tokio::time::Instant::now();
    modem.send("+64211234567", "hello").await.expect("send");

    let wire = transport.wire.lock().unwrap();
    assert_eq!(
        wire.written(),
        vec!["AT+CMGS=\"+64211234567\"\r", "hello\r", "\u{1a}"]
    );
    // settle after compose and after body, then the completion wait
    let times: Vec<Duration> = wire.writes.iter().map(|(t, _)| *t - started).collect();
    assert!(times[0] < Duration::from_millis(1));
    assert!(times[1] >= Duration::from_millis(500) && times[1] < Duration::from_millis(510));
    assert!(times[2] >= Duration::from_millis(1000) && times[2] < Duration::from_millis(1010));
    assert!(started.elapsed() >= Duration::from_millis(3000));
}

#[tokio::test(start_paused = true)]
async fn multi_line_reply_goes_out_as_one_body() {
    let transport = ScriptedTransport::new();
    let mut modem = modem(&transport);

    modem
        .send("+6421", "\nLat: 1.0\nLon: 2.0")
        .await
        .expect("send");

    let wire = transport.wire.lock().unwrap();
    assert_eq!(wire.writes[1].1, b"\nLat: 1.0\nLon: 2.0\r".to_vec());
    assert_eq!(wire.count_prefix("\u{1a}"), 1);
}

#[tokio::test(start_paused = true)]
async fn body_write_failure_aborts_with_escape() {
    let transport = ScriptedTransport::new();
    transport.fail_writes("hello", 1);
    let mut modem = modem(&transport);

    let err = modem.send("+6421", "hello").await.unwrap_err();
    match err {
        SendError::Transport { state, source } => {
            assert_eq!(state, SendState::AwaitingPrompt);
            assert!(matches!(source, TransportError::Io(_)));
        }
        other => panic!("unexpected {:?}", other),
    }

    let wire = transport.wire.lock().unwrap();
    assert_eq!(wire.written(), vec!["AT+CMGS=\"+6421\"\r", "\u{1b}"]);
}

#[tokio::test(start_paused = true)]
async fn terminator_write_failure_aborts_with_escape() {
    let transport = ScriptedTransport::new();
    transport.fail_writes("\u{1a}", 1);
    let mut modem = modem(&transport);

    let err = modem.send("+6421", "hello").await.unwrap_err();
    match err {
        SendError::Transport { state, source } => {
            assert_eq!(state, SendState::BodySent);
            assert!(matches!(source, TransportError::Io(_)));
        }
        other => panic!("unexpected {:?}", other),
    }

    let wire = transport.wire.lock().unwrap();
    assert_eq!(
        wire.written(),
        vec!["AT+CMGS=\"+6421\"\r", "hello\r", "\u{1b}"]
    );
}

#[tokio::test(start_paused = true)]
async fn compose_failure_writes_nothing_else() {
    let transport = ScriptedTransport::new();
    transport.fail_writes("AT+CMGS", 1);
    let mut modem = modem(&transport);

    let err = modem.send("+6421", "hello").await.unwrap_err();
    assert!(matches!(
        err,
        SendError::Transport {
            state: SendState::Idle,
            ..
        }
    ));
    assert!(transport.wire.lock().unwrap().writes.is_empty());
}

#[tokio::test(start_paused = true)]
async fn invalid_recipient_is_rejected_before_any_write() {
    let transport = ScriptedTransport::new();
    let mut modem = modem(&transport);

    for bad in ["", "\"+6421\"", "+64;21", "+6421\r\nAT+CMGD=1", "Vodafone"] {
        let err = modem.send(bad, "hello").await.unwrap_err();
        assert!(
            matches!(err, SendError::InvalidRecipient { .. }),
            "{:?} gave {:?}",
            bad,
            err
        );
    }
    assert!(transport.wire.lock().unwrap().writes.is_empty());
}

#[tokio::test]
async fn delete_writes_index_and_repeats_harmlessly() {
    let transport = ScriptedTransport::new();
    let mut modem = modem(&transport);

    modem.delete("3").expect("first delete");
    modem.delete("3").expect("second delete");
    assert!(modem.delete("3;AT").is_err());

    let wire = transport.wire.lock().unwrap();
    assert_eq!(wire.written(), vec!["AT+CMGD=3\r", "AT+CMGD=3\r"]);
}

#[tokio::test]
async fn initialize_is_best_effort() {
    let transport = ScriptedTransport::new();
    transport.fail_writes("ATZ", 1);
    transport.push_read(Ok("AT+CMGF=1\r\r\nOK\r\n"));
    let mut modem = modem(&transport);

    modem.initialize();

    let wire = transport.wire.lock().unwrap();
    assert_eq!(wire.written(), vec!["AT+CMGF=1\r"]);
}

#[tokio::test]
async fn list_unread_returns_raw_text() {
    let transport = ScriptedTransport::new();
    transport.push_read(Ok("AT+CMGL=\"REC UNREAD\"\r\r\nOK\r\n"));
    transport.push_read(Err(io::ErrorKind::Other));
    let mut modem = modem(&transport);

    let raw = modem.list_unread().expect("listing");
    assert!(raw.ends_with("OK\r\n"));
    assert!(matches!(modem.list_unread(), Err(TransportError::Io(_))));
    assert_eq!(
        transport.wire.lock().unwrap().count_prefix(common::LIST_UNREAD),
        2
    );
}

#[tokio::test(start_paused = true)]
async fn close_after_interrupted_send_aborts_compose() {
    let transport = ScriptedTransport::new();
    let mut modem = modem(&transport);

    // Dropped while waiting for the prompt to settle.
    let interrupted =
        tokio::time::timeout(Duration::from_millis(100), modem.send("+6421", "hello")).await;
    assert!(interrupted.is_err());

    modem.close();
    modem.close();

    let wire = transport.wire.lock().unwrap();
    assert_eq!(wire.written(), vec!["AT+CMGS=\"+6421\"\r", "\u{1b}"]);
    assert!(wire.closed);
}

#[tokio::test(start_paused = true)]
async fn close_after_completed_send_writes_no_escape() {
    let transport = ScriptedTransport::new();
    let mut modem = modem(&transport);

    modem.send("+6421", "hi").await.expect("send");
    modem.close();
    assert!(!modem.is_open());

    let wire = transport.wire.lock().unwrap();
    assert_eq!(wire.count_prefix("\u{1b}"), 0);
}

#[tokio::test]
async fn operations_after_close_report_closed() {
    let transport = ScriptedTransport::new();
    let mut modem = modem(&transport);
    modem.close();

    assert!(matches!(modem.list_unread(), Err(TransportError::Closed)));
    assert!(modem.delete("1").unwrap_err().is_closed());
}

#[tokio::test]
async fn dropping_the_modem_closes_the_transport() {
    let transport = ScriptedTransport::new();
    {
        let _modem = modem(&transport);
    }
    assert!(transport.wire.lock().unwrap().closed);
}

#[tokio::test(start_paused = true)]
async fn verify_send_reads_the_modem_answer() {
    let transport = ScriptedTransport::new();
    transport.push_read(Ok("\r\n+CMS ERROR: 500\r\n"));
    let mut modem = modem(&transport).with_verify_send(true);

    // A rejection is logged only; the send still counts as done.
    modem.send("+6421", "hi").await.expect("send");
    assert!(transport.wire.lock().unwrap().reads.is_empty());
}
