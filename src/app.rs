//! Daemon harness: single-client accept loop over the TCP development link
//!
//! The radio stack on real hardware delivers connect/disconnect events and
//! characteristic writes; here a TCP client plays the controller role.
//! Exactly one client is served at a time - a second connection attempt is
//! rejected while the first is active, mirroring the single-peer design of
//! the radio protocol.
//!
//! Inbound commands are newline-framed ASCII; outbound notify frames are
//! length-prefixed (see `transport::tcp`).

use crate::config::Config;
use crate::devices::create_resources;
use crate::dispatcher::Dispatcher;
use crate::error::{Error, Result};
use crate::transport::TcpRadio;
use std::io::{BufRead, BufReader};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Read timeout on the client socket so the loop can poll shutdown flags
const CLIENT_READ_TIMEOUT: Duration = Duration::from_millis(200);

/// Interval between statistics log lines
const STATS_INTERVAL: Duration = Duration::from_secs(10);

/// Run the accept loop until `running` is cleared
pub fn run(config: &Config, running: Arc<AtomicBool>) -> Result<()> {
    let listener = TcpListener::bind(&config.radio.bind_address).map_err(|e| {
        Error::Other(format!(
            "failed to bind {}: {}",
            config.radio.bind_address, e
        ))
    })?;
    listener.set_nonblocking(true)?;

    log::info!(
        "Listening on {} (one controller at a time)",
        config.radio.bind_address
    );

    // Doubles as the single-client gate: set while a handler thread owns
    // a connection, cleared when it exits
    let client_active = Arc::new(AtomicBool::new(false));
    let mut last_stats = Instant::now();

    while running.load(Ordering::Relaxed) {
        match listener.accept() {
            Ok((stream, addr)) => {
                if client_active.load(Ordering::Relaxed) {
                    log::warn!("Rejecting connection from {}: controller already attached", addr);
                    let _ = stream.shutdown(Shutdown::Both);
                    continue;
                }
                client_active.store(true, Ordering::Relaxed);
                log::info!("Controller connected: {}", addr);

                let handler_config = config.clone();
                let handler_running = Arc::clone(&running);
                let handler_active = Arc::clone(&client_active);

                thread::Builder::new()
                    .name("peer-handler".to_string())
                    .spawn(move || {
                        if let Err(e) = serve_peer(stream, &handler_config, handler_running) {
                            log::error!("Peer handler error: {}", e);
                        }
                        log::info!("Controller disconnected: {}", addr);
                        handler_active.store(false, Ordering::Relaxed);
                    })?;
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                thread::sleep(Duration::from_millis(10));
            }
            Err(e) => {
                log::error!("Accept error: {}", e);
            }
        }

        if last_stats.elapsed() >= STATS_INTERVAL {
            log::info!(
                "Daemon running (controller attached: {})",
                client_active.load(Ordering::Relaxed)
            );
            last_stats = Instant::now();
        }
    }

    log::info!("Accept loop stopped");
    Ok(())
}

/// Serve one attached controller until it disconnects or the daemon stops
fn serve_peer(stream: TcpStream, config: &Config, running: Arc<AtomicBool>) -> Result<()> {
    stream.set_read_timeout(Some(CLIENT_READ_TIMEOUT))?;

    let link = TcpRadio::new(stream.try_clone()?);
    let link_connected = link.connected_flag();

    let resources = create_resources(config)?;
    let dispatcher = Dispatcher::new(Box::new(link), resources, config);

    if let Err(e) = dispatcher.on_connect() {
        log::error!("Resource initialization failed: {}", e);
        return Err(e);
    }

    let mut reader = BufReader::new(stream);
    let mut line = String::new();

    loop {
        if !running.load(Ordering::Relaxed) {
            log::debug!("Daemon shutdown, dropping controller");
            break;
        }
        if !link_connected.load(Ordering::Relaxed) {
            // A task noticed the peer vanish before the reader did
            log::debug!("Notify path reported peer loss");
            break;
        }

        match reader.read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {
                if !line.trim().is_empty() {
                    dispatcher.handle_write(line.trim().as_bytes());
                }
                line.clear();
            }
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                // Timeout; partial input stays buffered in `line`
                continue;
            }
            Err(e) => {
                log::debug!("Command read error: {}", e);
                break;
            }
        }
    }

    link_connected.store(false, Ordering::Relaxed);
    dispatcher.on_disconnect();
    Ok(())
}
