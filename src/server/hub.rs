use std::collections::HashMap;

use tokio::sync::mpsc;
use tokio::time::{self, Duration, Instant};

use crate::quotes::QuoteBook;

/// One broadcast round per period.
pub const BROADCAST_PERIOD: Duration = Duration::from_secs(1);

/// Capacity of each client's outbound queue.
pub const SEND_BUF: usize = 256;

/// The hub's view of a connected client: the id it was registered under
/// and the sending side of its outbound queue. The hub holds the only
/// sender, so dropping the handle closes the queue.
pub struct ClientHandle {
    pub id: u64,
    pub tx: mpsc::Sender<Vec<u8>>,
}

pub enum HubCommand {
    Register(ClientHandle),
    Unregister(u64),
}

/// Hub fans a random quote out to every connected client once per tick.
/// All membership changes arrive over the command channel and only the
/// hub's own loop ever touches the client map, so no locking is needed.
pub struct Hub {
    clients: HashMap<u64, ClientHandle>,
    rx: mpsc::Receiver<HubCommand>,
    quotes: QuoteBook,
}

impl Hub {
    pub fn new(rx: mpsc::Receiver<HubCommand>, quotes: QuoteBook) -> Self {
        Self {
            clients: HashMap::new(),
            rx,
            quotes,
        }
    }

    /// Spawn the hub as a tokio task and hand back the command side.
    pub fn spawn(quotes: QuoteBook) -> mpsc::Sender<HubCommand> {
        let (tx, rx) = mpsc::channel(SEND_BUF);
        tokio::spawn(Hub::new(rx, quotes).run());
        tx
    }

    /// Runs for the life of the process; returns only if every command
    /// sender has been dropped.
    pub async fn run(mut self) {
        let mut ticker = time::interval_at(Instant::now() + BROADCAST_PERIOD, BROADCAST_PERIOD);

        loop {
            tokio::select! {
                cmd = self.rx.recv() => match cmd {
                    Some(HubCommand::Register(handle)) => self.register(handle),
                    Some(HubCommand::Unregister(id)) => self.unregister(id),
                    None => return,
                },
                _ = ticker.tick() => self.broadcast(),
            }
        }
    }

    fn register(&mut self, handle: ClientHandle) {
        tracing::info!(id = handle.id, total = self.clients.len() + 1, "client registered");
        self.clients.insert(handle.id, handle);
    }

    /// Unregistering an unknown id is a no-op. Removing a member drops
    /// its handle, which is the queue-closure signal its write pump
    /// terminates on.
    fn unregister(&mut self, id: u64) {
        if self.clients.remove(&id).is_some() {
            tracing::info!(id, total = self.clients.len(), "client unregistered");
        }
    }

    /// Non-blocking delivery: a client whose queue is full is treated as
    /// dead or too slow and evicted within this tick, so one stalled
    /// consumer never delays the rest.
    fn broadcast(&mut self) {
        let quote = self.quotes.random();

        let mut to_remove = Vec::new();
        for (id, handle) in &self.clients {
            if handle.tx.try_send(quote.clone().into_bytes()).is_err() {
                tracing::warn!(id = *id, "dropping slow client");
                to_remove.push(*id);
            }
        }
        for id in to_remove {
            self.clients.remove(&id);
        }
    }
}
