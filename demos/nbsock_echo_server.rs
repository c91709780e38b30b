/*
 * nbsock - non-blocking socket adaptation layer
 * This is free and unencumbered software released into the public domain.
 */
use std::net::Ipv4Addr;
use std::thread;
use std::time::Duration;

use nbsock_rs::{Connection, Endpoint, Listener, RecvEnd, SocketError, SocketManager, Stream};

use crossbeam_channel::Receiver;
use log::{info, warn, error};

const PORT_NUMBER: u16 = 7777;
const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    /* Initialize the log output */
    env_logger::init_from_env(env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"));

    /* Print logo */
    info!("nbsock - Example Echo Server [Version {}]", PKG_VERSION);

    /* Initialize SocketManager */
    let manager = SocketManager::instance().expect("Failed to obtain SocketManager instance!");

    /* Register Canceller with Ctrl+C handler */
    let canceller = manager.canceller();
    ctrlc::set_handler(move || {
        warn!("Shutdown has been requested!");
        canceller.cancel().expect("Failed to cancel operation!");
    })
    .expect("Failed to register CTRL+C handler!");

    /* Bind Listener to local socket */
    let listener = match Listener::bind(&manager, Endpoint::new(Ipv4Addr::LOCALHOST, PORT_NUMBER), 128) {
        Ok(value) => value,
        Err(error) => return error!("Failed to bind Listener: {}", error),
    };

    /* Create Crossbeam channel */
    let (channel_tx, channel_rx) = crossbeam_channel::bounded::<Connection>(256);

    /* Create some worker threads to handle incoming connections */
    let cpu_count = num_cpus::get().max(1);
    let mut threads = Vec::with_capacity(cpu_count);
    for _n in 0..cpu_count {
        let thread_receiver = channel_rx.clone();
        threads.push(thread::spawn(move || thread_worker(thread_receiver)));
    }

    /* Accept all incoming connections */
    info!("Waiting for incoming connections on port {}...", PORT_NUMBER);
    loop {
        match listener.accept(Some(Duration::from_secs(30))) {
            Ok(connection) => {
                info!("Connection received: {:?} -> {}", connection.local(), connection.peer());
                if let Err(error) = channel_tx.send_timeout(connection, Duration::from_secs(15)) {
                    warn!("Failed to enqueue the connection: {:?}", error);
                }
            },
            Err(SocketError::TimedOut) => info!("No connection within 30 seconds, still waiting..."),
            Err(error) => {
                error!("Accept operation has failed: {}", error);
                break;
            },
        }
    }

    /* Close the "sender" end of the channel */
    drop(channel_tx);

    /* Wait for all worker threads to complete */
    threads.drain(..).for_each(|thread| thread.join().expect("Failed to join with worker thread!"));

    /* Bye! */
    info!("That's it, goodbye!");
}

fn thread_worker(receiver: Receiver<Connection>) {
    let manager = SocketManager::instance().expect("Failed to obtain SocketManager instance!");

    /* Process all incoming connections, until the channel is closed */
    while let Ok(connection) = receiver.recv() {
        match Stream::from(&manager, connection) {
            Ok(stream) => handle_connection(stream),
            Err(error) => warn!("Failed to init Stream: {}", error),
        }
    }
}

fn handle_connection(mut stream: Stream) {
    let peer = stream.peer();
    loop {
        let received = match stream.recv_timeout(Some(Duration::from_secs(15))) {
            Ok(received) => received,
            Err(error) => return error!("[{}] Receive operation has failed: {}", peer, error),
        };
        let (data, end) = received.into_parts();
        if let Some(data) = data {
            info!("[{}] Echoing {} bytes", peer, data.len());
            if let Err(error) = stream.send_all(&data, Some(Duration::from_secs(15))) {
                return error!("[{}] Send operation has failed: {}", peer, error);
            }
        }
        match end {
            RecvEnd::WouldBlock => (),
            RecvEnd::Closed => return info!("[{}] Connection closed by peer", peer),
            RecvEnd::Cancelled => return warn!("[{}] Receive operation was cancelled", peer),
            RecvEnd::OutOfMemory => return error!("[{}] Receive buffer could not be grown", peer),
            RecvEnd::Failed(error) => return error!("[{}] Receive operation has failed: {}", peer, error),
        }
    }
}
