/*
 * nbsock - non-blocking socket adaptation layer
 * This is free and unencumbered software released into the public domain.
 */
use std::env;
use std::str;
use std::time::Duration;

use nbsock_rs::{resolve, Protocol, SocketManager, Stream};

use lazy_static::lazy_static;
use log::{debug, info, warn, error};
use regex::bytes::Regex;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_SERVICE: &str = "7777";
const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    /* Initialize the log output */
    env_logger::init_from_env(env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"));

    /* Print logo */
    info!("nbsock - Example Client [Version {}]", PKG_VERSION);

    let mut args = env::args().skip(1);
    let host = args.next().unwrap_or_else(|| DEFAULT_HOST.to_owned());
    let service = args.next().unwrap_or_else(|| DEFAULT_SERVICE.to_owned());

    /* Initialize SocketManager */
    let manager = SocketManager::instance().expect("Failed to obtain SocketManager instance!");

    /* Register Canceller with Ctrl+C handler */
    let canceller = manager.canceller();
    ctrlc::set_handler(move || {
        warn!("Shutdown has been requested!");
        canceller.cancel().expect("Failed to cancel operation!");
    })
    .expect("Failed to register CTRL+C handler!");

    /* Look up the server address */
    let endpoint = match resolve(&host, &service, Protocol::Tcp) {
        Ok(endpoint) => endpoint,
        Err(error) => return error!("{}", error),
    };

    /* Connect to the server */
    info!("Connecting to server: {}", endpoint);
    let mut stream = match Stream::connect(&manager, endpoint, Some(Duration::from_secs(10))) {
        Ok(stream) => stream,
        Err(error) => return error!("Connect operation has failed: {}", error),
    };

    /* Send a line */
    let request = format!("Hello from nbsock {}!\n", PKG_VERSION);
    if let Err(error) = stream.send_all(request.as_bytes(), Some(Duration::from_secs(15))) {
        return error!("Send operation has failed: {}", error);
    }

    /* Collect the reply, until a complete line was received */
    let mut reply = Vec::new();
    while !end_of_line(&reply) {
        match stream.recv_timeout(Some(Duration::from_secs(15))) {
            Ok(received) => {
                let closed = received.is_closed();
                if let Some(data) = received.into_data() {
                    reply.extend_from_slice(&data);
                }
                if closed {
                    warn!("Connection closed by server!");
                    break;
                }
            },
            Err(error) => return error!("Receive operation has failed: {}", error),
        }
    }

    info!("Reply: {:?}", str::from_utf8(&reply[..]).unwrap_or("<invalid utf-8>"));

    /* Bye! */
    info!("That's it, goodbye!");
}

fn end_of_line(buffer: &[u8]) -> bool {
    lazy_static! {
        static ref END_OF_LINE: Regex = Regex::new(r"\r?\n").expect("Failed to create regex!");
    }
    let done = END_OF_LINE.is_match(buffer);
    debug!("Reply complete: {}", done);
    done
}
