//! TCP Server
//!
//! Accepts connections and serves each one on its own thread, up to
//! `max_connections` at a time.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender};

use crate::config::Config;
use crate::error::Result;
use crate::protocol::{write_frame, Frame};
use crate::service::SelectionService;
use super::Connection;

/// How long the acceptor sleeps when no connection is pending
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// TCP server for the selection service
pub struct Server {
    config: Config,
    service: Arc<SelectionService>,
    listener: TcpListener,
    shutdown: Arc<AtomicBool>,
}

/// Stops a running server from another thread
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }
}

/// A connection thread plus a handle on its socket for shutdown
struct Served {
    thread: JoinHandle<()>,
    stream: TcpStream,
}

/// Reports a connection thread as finished, even if it panicked
struct Finished {
    id: u64,
    tx: Sender<u64>,
}

impl Drop for Finished {
    fn drop(&mut self) {
        let _ = self.tx.send(self.id);
    }
}

impl Server {
    /// Bind `config.listen_addr`
    pub fn bind(config: Config, service: Arc<SelectionService>) -> Result<Self> {
        let listener = TcpListener::bind(&config.listen_addr)?;
        listener.set_nonblocking(true)?;

        Ok(Self {
            config,
            service,
            listener,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            flag: Arc::clone(&self.shutdown),
        }
    }

    /// Start the server (blocking until shutdown)
    pub fn run(&self) -> Result<()> {
        let (done_tx, done_rx) = channel::unbounded::<u64>();
        let mut connections: HashMap<u64, Served> = HashMap::new();
        let mut next_id: u64 = 0;

        tracing::info!("Listening on {}", self.local_addr()?);

        while !self.shutdown.load(Ordering::Relaxed) {
            reap(&done_rx, &mut connections);

            match self.listener.accept() {
                Ok((stream, addr)) => {
                    if let Err(e) = stream.set_nonblocking(false) {
                        tracing::warn!("Dropping connection from {}: {}", addr, e);
                        continue;
                    }

                    if connections.len() >= self.config.max_connections {
                        tracing::warn!("Connection limit reached, rejecting {}", addr);
                        reject(stream, "server busy");
                        continue;
                    }

                    let id = next_id;
                    next_id += 1;
                    match self.spawn_connection(id, stream, done_tx.clone()) {
                        Ok(served) => {
                            tracing::debug!("Accepted connection {} from {}", id, addr);
                            connections.insert(id, served);
                        }
                        Err(e) => tracing::warn!("Could not serve {}: {}", addr, e),
                    }
                }
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) => {
                    tracing::warn!("Accept failed: {}", e);
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
            }
        }

        tracing::info!("Shutting down, closing {} connection(s)", connections.len());
        for (_, served) in connections.drain() {
            let _ = served.stream.shutdown(Shutdown::Both);
            if served.thread.join().is_err() {
                tracing::error!("Connection thread panicked");
            }
        }

        Ok(())
    }

    fn spawn_connection(&self, id: u64, stream: TcpStream, done: Sender<u64>) -> Result<Served> {
        let handle = stream.try_clone()?;
        let service = Arc::clone(&self.service);
        let (read_ms, write_ms) = (self.config.read_timeout_ms, self.config.write_timeout_ms);

        let thread = thread::Builder::new()
            .name(format!("oracle-select-conn-{}", id))
            .spawn(move || {
                let _finished = Finished { id, tx: done };
                let served = Connection::new(stream, service).and_then(|mut conn| {
                    conn.set_timeouts(read_ms, write_ms)?;
                    conn.handle()
                });

                if let Err(e) = served {
                    tracing::warn!("Connection {} ended with error: {}", id, e);
                }
            })?;

        Ok(Served {
            thread,
            stream: handle,
        })
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

/// Join connection threads that have reported back
fn reap(done: &Receiver<u64>, connections: &mut HashMap<u64, Served>) {
    for id in done.try_iter() {
        if let Some(served) = connections.remove(&id) {
            if served.thread.join().is_err() {
                tracing::error!("Connection thread {} panicked", id);
            }
        }
    }
}

fn reject(mut stream: TcpStream, reason: &str) {
    let _ = write_frame(&mut stream, &Frame::error(reason));
}
