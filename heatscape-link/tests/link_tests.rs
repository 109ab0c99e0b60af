//! Integration tests for heatscape-link
//!
//! Each test runs a throwaway WebSocket "device" on a loopback port and
//! drives a real `DeviceLink` against it.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use heatscape_link::{
    Command, ConnectionState, DeviceLink, DeviceLinkBuilder, Direction, Dispatch, LinkError,
};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{timeout, Instant};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

const STEP: Duration = Duration::from_secs(5);
const RECONNECT: Duration = Duration::from_millis(200);

type DeviceSocket = WebSocketStream<TcpStream>;

async fn listen() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let url = format!("ws://{}", listener.local_addr().expect("No local addr"));
    (listener, url)
}

async fn accept(listener: &TcpListener) -> DeviceSocket {
    let (stream, _) = timeout(STEP, listener.accept())
        .await
        .expect("Timed out waiting for the link to connect")
        .expect("Failed to accept");
    tokio_tungstenite::accept_async(stream)
        .await
        .expect("WebSocket handshake failed")
}

async fn next_text(ws: &mut DeviceSocket) -> String {
    loop {
        let msg = timeout(STEP, ws.next())
            .await
            .expect("Timed out waiting for a frame")
            .expect("Stream ended")
            .expect("Read error");
        if let Message::Text(text) = msg {
            return text.as_str().to_string();
        }
    }
}

async fn send_text(ws: &mut DeviceSocket, text: &str) {
    ws.send(Message::Text(text.to_string().into()))
        .await
        .expect("Failed to send frame");
}

async fn wait_state(link: &DeviceLink, state: ConnectionState) {
    let mut rx = link.watch_state();
    timeout(STEP, rx.wait_for(|s| *s == state))
        .await
        .expect("Timed out waiting for link state")
        .expect("Supervisor gone");
}

fn link_to(url: &str) -> DeviceLink {
    DeviceLinkBuilder::new(url)
        .with_reconnect_delay(RECONNECT)
        .build()
}

/// Test that the status request goes out as soon as the socket opens
#[tokio::test]
async fn test_status_request_on_open() {
    let (listener, url) = listen().await;
    let link = link_to(&url);

    let mut device = accept(&listener).await;
    assert_eq!(next_text(&mut device).await, "GET_CAM_IP");

    wait_state(&link, ConnectionState::Open).await;
    assert!(link.is_ready());

    let entries = link.log().entries();
    assert!(entries
        .iter()
        .any(|e| e.direction == Direction::Outbound && e.text == "GET_CAM_IP"));

    link.shutdown();
}

/// Test that inbound frames update telemetry and the operator log
#[tokio::test]
async fn test_frames_update_telemetry() {
    let (listener, url) = listen().await;
    let link = link_to(&url);
    let mut device = accept(&listener).await;
    next_text(&mut device).await;

    send_text(&mut device, r#"GYRO_DATA:{"gyroX":0.5,"accelZ":9.8}"#).await;
    send_text(&mut device, "CAM_IP:192.168.4.20").await;
    send_text(&mut device, r#"GPS_DATA:{"lat":52.52,"lng":13.40,"satellites":7}"#).await;
    send_text(&mut device, "hello from firmware").await;
    send_text(&mut device, "TEMP_DATA:[20,22,24]").await;

    let mut telemetry = link.telemetry().subscribe();
    let snapshot = timeout(
        STEP,
        telemetry.wait_for(|t| !t.temperature.samples.is_empty()),
    )
    .await
    .expect("Timed out waiting for telemetry")
    .expect("Store gone")
    .clone();

    assert_eq!(snapshot.gps.latitude, 52.52);
    assert_eq!(snapshot.gps.satellites, 7);
    assert_eq!(snapshot.gps.altitude, 0.0);
    assert_eq!(snapshot.imu.gyro_x, 0.5);
    assert_eq!(snapshot.temperature.mean(), Some(22.0));
    assert_eq!(snapshot.camera_url().as_deref(), Some("http://192.168.4.20"));

    let inbound: Vec<String> = link
        .log()
        .entries()
        .into_iter()
        .filter(|e| e.direction == Direction::Inbound)
        .map(|e| e.text)
        .collect();
    // IMU frames are too chatty for the operator log
    assert!(!inbound.iter().any(|t| t.starts_with("GYRO_DATA:")));
    assert!(inbound.iter().any(|t| t == "hello from firmware"));
    assert!(inbound.iter().any(|t| t == "TEMP_DATA:[20,22,24]"));

    link.shutdown();
}

/// Test that a malformed payload is logged and does not touch telemetry
#[tokio::test]
async fn test_malformed_frame_is_discarded() {
    let (listener, url) = listen().await;
    let link = link_to(&url);
    let mut device = accept(&listener).await;
    next_text(&mut device).await;

    send_text(&mut device, "GPS_DATA:{not json").await;
    send_text(&mut device, "CAM_IP:10.0.0.2").await;

    let mut telemetry = link.telemetry().subscribe();
    timeout(STEP, telemetry.wait_for(|t| t.camera_address.is_some()))
        .await
        .expect("Timed out waiting for telemetry")
        .expect("Store gone");

    assert_eq!(link.telemetry().snapshot().gps.latitude, 0.0);
    let entries = link.log().entries();
    assert!(entries.iter().any(|e| e.text == "GPS_DATA:{not json"));
    assert!(entries
        .iter()
        .any(|e| e.direction == Direction::System && e.text.starts_with("Discarded frame")));

    link.shutdown();
}

/// Test that commands reach the device in wire form
#[tokio::test]
async fn test_commands_reach_device() {
    let (listener, url) = listen().await;
    let link = link_to(&url);
    let mut device = accept(&listener).await;
    next_text(&mut device).await;
    wait_state(&link, ConnectionState::Open).await;

    assert_eq!(
        link.submit(Command::Forward).await.expect("Submit failed"),
        Dispatch::Sent
    );
    assert_eq!(next_text(&mut device).await, "forward");

    link.send_now(Command::pan(200)).expect("Send failed");
    assert_eq!(next_text(&mut device).await, "H_TURN_CAM:180");

    link.send_now(Command::SetTarget {
        lat: 52.5,
        lng: 13.25,
    })
    .expect("Send failed");
    assert_eq!(
        next_text(&mut device).await,
        r#"SET_TARGET:{"lat":52.5,"lng":13.25}"#
    );

    link.request_temperature().expect("Send failed");
    assert!(link.telemetry().snapshot().collecting_temperature);
    assert_eq!(next_text(&mut device).await, "get_temp");

    link.shutdown();
}

/// Test that an unexpected drop reconnects after the fixed delay
#[tokio::test]
async fn test_unexpected_drop_reconnects() {
    let (listener, url) = listen().await;
    let link = link_to(&url);

    let mut device = accept(&listener).await;
    next_text(&mut device).await;
    wait_state(&link, ConnectionState::Open).await;

    // Drop without a close handshake
    drop(device);
    let dropped_at = Instant::now();
    wait_state(&link, ConnectionState::Closed).await;

    let mut device = accept(&listener).await;
    assert!(dropped_at.elapsed() >= RECONNECT);
    assert_eq!(next_text(&mut device).await, "GET_CAM_IP");
    wait_state(&link, ConnectionState::Open).await;

    link.shutdown();
}

/// Test that one drop leads to exactly one reconnect attempt
#[tokio::test]
async fn test_single_reconnect_per_drop() {
    let (listener, url) = listen().await;
    let link = link_to(&url);

    let mut device = accept(&listener).await;
    next_text(&mut device).await;
    wait_state(&link, ConnectionState::Open).await;

    drop(device);
    let mut device = accept(&listener).await;
    assert_eq!(next_text(&mut device).await, "GET_CAM_IP");

    let extra = timeout(RECONNECT * 3 / 2, listener.accept()).await;
    assert!(extra.is_err(), "link opened a second socket for one drop");
    wait_state(&link, ConnectionState::Open).await;

    link.shutdown();
}

/// Test that a close from the device completes the close handshake
#[tokio::test]
async fn test_device_close_is_acknowledged() {
    let (listener, url) = listen().await;
    let link = link_to(&url);

    let mut device = accept(&listener).await;
    next_text(&mut device).await;
    wait_state(&link, ConnectionState::Open).await;

    device.close(None).await.expect("Failed to close");
    let acknowledged = timeout(STEP, async {
        while let Some(msg) = device.next().await {
            match msg {
                Ok(Message::Close(_)) => return true,
                Ok(_) => continue,
                Err(_) => return false,
            }
        }
        false
    })
    .await
    .expect("Timed out waiting for the close reply");
    assert!(acknowledged, "socket dropped without a close reply");

    wait_state(&link, ConnectionState::Closed).await;
    link.shutdown();
}

/// Test that a clean close waits for the operator before reconnecting
#[tokio::test]
async fn test_clean_close_waits_for_operator() {
    let (listener, url) = listen().await;
    let link = link_to(&url);

    let mut device = accept(&listener).await;
    next_text(&mut device).await;
    wait_state(&link, ConnectionState::Open).await;

    device.close(None).await.expect("Failed to close");
    wait_state(&link, ConnectionState::Closed).await;

    // Well past the reconnect delay: nothing should arrive
    let idle = timeout(RECONNECT * 3, listener.accept()).await;
    assert!(idle.is_err(), "link reconnected after a clean close");
    assert_eq!(link.state(), ConnectionState::Closed);

    link.reconnect().expect("Supervisor gone");
    let mut device = accept(&listener).await;
    assert_eq!(next_text(&mut device).await, "GET_CAM_IP");

    link.shutdown();
}

/// Test that sending without an open socket fails and nothing is queued
#[tokio::test]
async fn test_send_while_disconnected() {
    let (listener, url) = listen().await;
    // Nothing listens on this port any more
    drop(listener);

    let link = DeviceLinkBuilder::new(&url)
        .with_reconnect_delay(Duration::from_secs(60))
        .build();
    wait_state(&link, ConnectionState::Closed).await;
    assert!(!link.is_ready());

    let err = link.send_now(Command::Forward).expect_err("Send should fail");
    match err {
        LinkError::NotConnected { url: u, command } => {
            assert_eq!(u, url);
            assert_eq!(command, "forward");
        }
        other => panic!("unexpected error: {other}"),
    }

    let err = link
        .submit(Command::EmergencyStop)
        .await
        .expect_err("Submit should fail");
    assert!(matches!(err, LinkError::NotConnected { .. }));

    // A failed temperature request does not leave the flag set
    assert!(link.request_temperature().is_err());
    assert!(!link.telemetry().snapshot().collecting_temperature);

    assert!(link
        .log()
        .entries()
        .iter()
        .any(|e| e.text.starts_with("Connection failed")));

    link.shutdown();
}

/// Test that shutdown closes the socket and stops the supervisor
#[tokio::test]
async fn test_shutdown_closes_socket() {
    let (listener, url) = listen().await;
    let link = link_to(&url);
    let mut device = accept(&listener).await;
    next_text(&mut device).await;
    wait_state(&link, ConnectionState::Open).await;

    link.shutdown();

    let closed = timeout(STEP, async {
        while let Some(Ok(msg)) = device.next().await {
            if msg.is_close() {
                return true;
            }
        }
        true
    })
    .await
    .expect("Timed out waiting for close");
    assert!(closed);

    timeout(STEP, link.stopped())
        .await
        .expect("Supervisor still running");
    assert_eq!(link.state(), ConnectionState::Closed);
    assert!(matches!(link.reconnect(), Err(LinkError::Closed)));
}

/// Test that commands handed over right before shutdown are still delivered
#[tokio::test]
async fn test_shutdown_flushes_outbound() {
    let (listener, url) = listen().await;
    let link = link_to(&url);
    let mut device = accept(&listener).await;
    next_text(&mut device).await;
    wait_state(&link, ConnectionState::Open).await;

    link.send_now(Command::StartAuto).expect("Send failed");
    link.send_now(Command::StopAuto).expect("Send failed");
    link.shutdown();

    assert_eq!(next_text(&mut device).await, "START_AUTO");
    assert_eq!(next_text(&mut device).await, "STOP_AUTO");
    timeout(STEP, link.stopped())
        .await
        .expect("Supervisor still running");
}
