//! Server network layer: TCP listener, one task per connection, and the
//! periodic save and statistics tasks

use crate::client_manager::{ClientManager, OUTBOUND_CAPACITY};
use crate::config::ServerConfig;
use crate::dictionary::Dictionary;
use crate::leaderboard::Leaderboard;
use crate::play::PlayService;
use crate::session::{Dispatch, Session, SessionEvent};
use crate::stats::ServerStats;
use crate::word_selector::WordSelector;
use log::{debug, error, info, warn};
use parking_lot::RwLock;
use shared::Notification;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};

/// State shared by every connection task
struct Shared {
    clients: Arc<RwLock<ClientManager>>,
    play: PlayService,
    stats: Arc<ServerStats>,
    latency: Duration,
}

/// Main server accepting connections
pub struct Server {
    listener: TcpListener,
    shared: Arc<Shared>,
    leaderboard: Arc<Leaderboard>,
    save_period: Duration,
    stats_period: Duration,
}

impl Server {
    /// Binds the listener and builds the shared state of the server
    ///
    /// The leaderboard should already be loaded: the periodic save only
    /// starts when its load succeeded.
    pub async fn bind(
        config: &ServerConfig,
        dictionary: Arc<Dictionary>,
        leaderboard: Arc<Leaderboard>,
    ) -> io::Result<Self> {
        let listener = TcpListener::bind(&config.address).await?;
        info!("Server listening on {}", listener.local_addr()?);

        let clients = Arc::new(RwLock::new(ClientManager::new(config.max_clients)));
        let stats = ServerStats::new();
        let play = PlayService::new(
            Arc::clone(&clients),
            WordSelector::new(dictionary),
            Arc::clone(&leaderboard),
            Arc::clone(&stats),
        );

        Ok(Server {
            listener,
            shared: Arc::new(Shared {
                clients,
                play,
                stats,
                latency: config.latency,
            }),
            leaderboard,
            save_period: config.save_period,
            stats_period: config.stats_period,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn stats(&self) -> Arc<ServerStats> {
        Arc::clone(&self.shared.stats)
    }

    /// Spawns task that saves the leaderboard periodically
    ///
    /// Nothing is spawned when the period is zero or when persistence is
    /// unavailable (no store, or the startup load failed). The file I/O runs
    /// on the blocking pool so connection tasks are never stalled by it.
    fn spawn_saver(&self) {
        if self.save_period.is_zero() || !self.leaderboard.is_persistence_available() {
            return;
        }
        let leaderboard = Arc::clone(&self.leaderboard);
        let period = self.save_period;

        tokio::spawn(async move {
            let mut timer = interval(period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // Skip the first tick since it fires immediately
            timer.tick().await;

            loop {
                timer.tick().await;
                let leaderboard = Arc::clone(&leaderboard);
                if let Err(e) = tokio::task::spawn_blocking(move || leaderboard.save()).await {
                    error!("Top scores save task failed: {}", e);
                }
            }
        });
    }

    /// Spawns task that logs the usage counters, unless the period is zero
    fn spawn_stats_logger(&self) {
        if self.stats_period.is_zero() {
            return;
        }
        let stats = Arc::clone(&self.shared.stats);
        let period = self.stats_period;

        tokio::spawn(async move {
            let mut timer = interval(period);
            timer.tick().await;

            loop {
                timer.tick().await;
                info!("Stats: {}", stats.describe());
            }
        });
    }

    /// Main server loop
    ///
    /// Starts the periodic tasks, then accepts connections until the future
    /// is dropped, spawning one task per connection. Accept errors are
    /// logged and retried after a short pause.
    pub async fn run(self) -> io::Result<()> {
        self.spawn_saver();
        self.spawn_stats_logger();

        info!("Server started successfully");

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let shared = Arc::clone(&self.shared);
                    tokio::spawn(async move {
                        handle_connection(stream, addr, shared).await;
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }
        }
    }
}

/// Writes one notification as a JSON line
async fn write_notification(
    writer: &mut OwnedWriteHalf,
    notification: &Notification,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut line = notification.to_line()?;
    line.push('\n');
    writer.write_all(line.as_bytes()).await?;
    Ok(())
}

/// Runs one client session until the connection ends
///
/// The task owns the session state and waits on three sources:
/// - Inbound lines, delayed by the configured latency, then validated and
///   dispatched by the session
/// - Events queued by other sessions: notifications written to the socket
///   and moves applied to the session state
/// - The overflow signal, raised when the client stopped reading and its
///   outbound channel is full
///
/// Whatever ends the loop, the session is closed so its game and display
/// name are released, and the client is removed from the registry.
async fn handle_connection(stream: TcpStream, addr: SocketAddr, shared: Arc<Shared>) {
    let (tx, mut rx) = mpsc::channel::<SessionEvent>(OUTBOUND_CAPACITY);
    let added = {
        let mut clients = shared.clients.write();
        clients
            .add_client(addr, tx)
            .and_then(|id| clients.get(&id).map(|c| (id, c.overflow_signal())))
    };
    let Some((client_id, overflow)) = added else {
        warn!("Server full, rejecting connection from {}", addr);
        return;
    };
    shared.stats.users.increment();

    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();
    let mut session = Session::new(client_id);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        warn!("Error reading from client {}: {}", client_id, e);
                        break;
                    }
                };
                debug!("Client {} sent '{}'", client_id, line);

                if !shared.latency.is_zero() {
                    tokio::time::sleep(shared.latency).await;
                }

                let result = session.process(&line, &*shared.clients, &shared.play);
                match result {
                    Ok(Dispatch::Reply(notification)) => {
                        if let Err(e) = write_notification(&mut writer, &notification).await {
                            warn!("Failed to send to client {}: {}", client_id, e);
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Client {} message '{}' failed: {}", client_id, line.trim(), e);
                    }
                }
            },

            event = rx.recv() => {
                let Some(event) = event else {
                    break;
                };
                session.apply_event(&event);
                if let SessionEvent::Notify(notification) = event {
                    if let Err(e) = write_notification(&mut writer, &notification).await {
                        warn!("Failed to send to client {}: {}", client_id, e);
                        break;
                    }
                }
            },

            _ = overflow.notified() => {
                warn!("Closing connection of client {}, too many pending messages", client_id);
                break;
            },
        }
    }

    session.close(&*shared.clients, &shared.play);
    shared.clients.write().remove_client(&client_id);
    shared.stats.users.decrement();
}
