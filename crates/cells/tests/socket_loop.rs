mod common;

use std::rc::Rc;

use anyhow::Result;
use bytes::Bytes;
use cells::{CellHandler, CellSocket, CellsConfig, ChannelTransport, SocketEvent};
use common::*;
use serde_json::json;
use tokio::sync::mpsc;

#[tokio::test]
async fn events_are_applied_in_order_until_close() -> Result<()> {
    let log = Events::default();
    init_logging();
    let (transport, mut outbound) = ChannelTransport::channel();
    let mut handler = CellHandler::new(probe_registry(&log)).with_transport(Rc::new(transport));
    let mut socket = CellSocket::new(&CellsConfig::default());

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let late = frame(json!({
        "nodesCreated": { "late": created("Probe", Some("a"), json!({}), json!({})) },
        "nodesUpdated": { "a": { "children": { "items": ["b", "c", "late"] }, "extraData": {} } }
    }));
    for event in [
        SocketEvent::Opened,
        SocketEvent::Text(first_frame().to_string()),
        SocketEvent::Binary(Bytes::from_static(b"one")),
        SocketEvent::Error("flaky network".to_owned()),
        SocketEvent::Binary(Bytes::from_static(b"two")),
        SocketEvent::Closed { wait_seconds: Some(3) },
        SocketEvent::Text(late.to_string()),
    ] {
        events_tx.send(event)?;
    }
    drop(events_tx);

    socket.run(&mut handler, events_rx).await?;

    assert_eq!(drain(&mut outbound), vec![json!({ "event": "requestSessionId", "target_cell": "main_cells_session" })]);
    assert!(handler.tree().contains("a"));
    assert!(!handler.tree().contains("late"));
    assert_eq!(socket.next_packet_id(), 3);
    assert_eq!(handler.tree().packets().pending_packets(), 2);
    let body = handler.dom().body();
    assert!(handler.dom().text_content(body).contains("Reconnecting in 3 seconds"));
    Ok(())
}

#[tokio::test]
async fn a_failing_frame_is_reported_and_the_loop_continues() -> Result<()> {
    let log = Events::default();
    init_logging();
    let mut handler = CellHandler::new(probe_registry(&log));
    let mut socket = CellSocket::new(&CellsConfig::default());

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    events_tx.send(SocketEvent::Text(
        frame(json!({ "dynamicCellTypeDefinitions": [["missing", ""]] })).to_string(),
    ))?;
    events_tx.send(SocketEvent::Text(first_frame().to_string()))?;
    drop(events_tx);

    socket.run(&mut handler, events_rx).await?;

    assert_eq!(handler.tree().len(), 4);
    let mount = handler.tree().mount_point().expect("mount point");
    let text = handler.dom().text_content(mount);
    assert!(!text.contains("Failed to connect"), "{text}");
    Ok(())
}

#[test]
fn errors_replace_the_page_with_a_message() -> Result<()> {
    let log = Events::default();
    let mut handler = CellHandler::new(probe_registry(&log));
    let mut socket = CellSocket::new(&CellsConfig::default());
    handler.initial_render()?;
    let body = handler.dom().body();
    assert!(handler.dom().text_content(body).contains("Loading..."));

    let flow = socket.dispatch(&mut handler, SocketEvent::Text("{".to_owned()))?;
    assert!(flow.is_continue());
    let text = handler.dom().text_content(body);
    assert!(text.starts_with("Failed to connect: "), "{text}");
    assert!(!text.contains("Loading..."));
    Ok(())
}
