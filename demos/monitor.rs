//! Minimal serial monitor.
//!
//! Connects to a port, prints every received payload, and keeps the link
//! alive with an empty heartbeat frame.
//!
//! Usage: `cargo run --example monitor -- /dev/ttyUSB0 [baud]`

use bytes::Bytes;
use framelink::{
    ConnectionBuilder, ConnectionParameters, ConnectionStatus, DeviceHandler, PayloadError,
    DEFAULT_BAUD_RATE,
};

struct Monitor;

impl DeviceHandler for Monitor {
    fn on_status(&mut self, status: ConnectionStatus) {
        println!("status: {:?}", status);
    }

    fn on_payload(&mut self, payload: Bytes) -> Result<(), PayloadError> {
        println!("rx {:02X?}", &payload[..]);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> framelink::Result<()> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let path = args.next().unwrap_or_else(|| "/dev/ttyUSB0".to_string());
    let baud = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_BAUD_RATE);

    let connection = ConnectionBuilder::new(Monitor)
        .keepalive(|| Bytes::new())
        .spawn();

    connection
        .connect(ConnectionParameters::new(path).with_baud_rate(baud))
        .await?;

    loop {
        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
        if !connection.ping().await {
            break;
        }
    }

    connection.disconnect().await;
    Ok(())
}
