//! Notification routing.
//!
//! [`HttpStack`] owns the transport, the client session and the listening
//! servers. The transport's event loop hands every notification to
//! [`HttpStack::dispatch`], which looks the handle up in the connection
//! registry and forwards the event to whoever owns that connection.

use super::client::{Accepted, ClientSession, Options, ResponseHandler};
use super::error::Error;
use super::server::{RequestHandler, Server, ServerConfig};
use super::Method;
use crate::network::error::Error as NetworkError;
use crate::network::registry::Registry;
use crate::network::{Event, Handle, Transport};
use core::fmt;
use heapless::Vec;

/// Number of listening servers one stack can host.
pub const MAX_SERVERS: usize = 2;
/// Number of connections (client, listeners and accepted) tracked at once.
///
/// One slot is always kept for the client connection, so listeners and
/// accepted connections share the remaining `MAX_CONNECTIONS - 1`.
pub const MAX_CONNECTIONS: usize = 8;

/// Who a transport handle belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    /// The client session's outbound connection.
    Client,
    /// A listening socket.
    Listener,
    /// A connection accepted by `listener`.
    Inbound { listener: Handle },
}

/// The HTTP core for one transport.
pub struct HttpStack<T, C, S> {
    transport: T,
    client: ClientSession<C>,
    servers: Vec<Server<S>, MAX_SERVERS>,
    registry: Registry<Owner, MAX_CONNECTIONS>,
}

impl<T, C, S> fmt::Debug for HttpStack<T, C, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpStack")
            .field("client", &self.client)
            .field("servers", &self.servers)
            .field("registry", &self.registry)
            .finish()
    }
}

impl<T, C, S> HttpStack<T, C, S>
where
    T: Transport,
    C: ResponseHandler,
    S: RequestHandler,
{
    pub fn new(transport: T, options: Options) -> Self {
        Self {
            transport,
            client: ClientSession::new(options),
            servers: Vec::new(),
            registry: Registry::new(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn client(&self) -> &ClientSession<C> {
        &self.client
    }

    pub fn registry(&self) -> &Registry<Owner, MAX_CONNECTIONS> {
        &self.registry
    }

    /// Returns `true` when no outbound request is in flight.
    pub fn client_ready(&self) -> bool {
        self.client.is_ready()
    }

    /// Forcibly tears down the in-flight request, if any. Safe to call at any
    /// time; does nothing when idle.
    pub fn client_reset(&mut self) {
        if let Some(handle) = self.client.reset(&mut self.transport) {
            self.registry.release(handle);
        }
    }

    /// Starts an outbound request. See [`ClientSession::request`].
    pub fn request(
        &mut self,
        url: &str,
        body: Option<&[u8]>,
        headers: Option<&str>,
        method: Method,
        handler: C,
    ) -> Result<Accepted, Error> {
        let accepted = self
            .client
            .request(&mut self.transport, url, body, headers, method, handler)?;

        if let Some(handle) = self.client.handle() {
            if let Err(err) = self.registry.bind(handle, Owner::Client) {
                warn!("client handle {} not registered: {}", handle, err);
                self.client.reset(&mut self.transport);
                return Err(Error::Transport(err));
            }
        }
        Ok(accepted)
    }

    /// `GET url`.
    pub fn get(&mut self, url: &str, headers: Option<&str>, handler: C) -> Result<Accepted, Error> {
        self.request(url, None, headers, Method::Get, handler)
    }

    /// `POST url` with `body`.
    pub fn post(
        &mut self,
        url: &str,
        body: &[u8],
        headers: Option<&str>,
        handler: C,
    ) -> Result<Accepted, Error> {
        self.request(url, Some(body), headers, Method::Post, handler)
    }

    /// Starts a server on `port` with default settings.
    pub fn create_server(&mut self, port: u16, handler: S) -> Result<Handle, Error> {
        self.create_server_with(ServerConfig::new(port, handler))
    }

    /// Starts a server and returns its listening handle.
    ///
    /// # Errors
    ///
    /// * [`Error::MemError`] - [`MAX_SERVERS`] servers are already running
    /// * [`Error::Transport`] - the transport refused to listen, or only the
    ///   slot kept for the client is left in the registry
    pub fn create_server_with(&mut self, config: ServerConfig<S>) -> Result<Handle, Error> {
        if self.servers.is_full() {
            return Err(Error::MemError);
        }

        if !self.server_slot_free() {
            return Err(Error::Transport(NetworkError::OutOfResources));
        }

        let port = config.port;
        let listener = self.transport.listen(port)?;
        if let Err(err) = self.registry.bind(listener, Owner::Listener) {
            close(&mut self.transport, listener);
            return Err(Error::Transport(err));
        }
        if self.servers.push(Server::new(listener, config)).is_err() {
            self.registry.release(listener);
            close(&mut self.transport, listener);
            return Err(Error::MemError);
        }

        info!("listening on port {} ({})", port, listener);
        Ok(listener)
    }

    /// Routes one transport notification for `handle`.
    pub fn dispatch(&mut self, handle: Handle, event: Event<'_>) {
        if let Event::Accepted { listener } = event {
            self.accept(handle, listener);
            return;
        }

        match self.registry.owner(handle).copied() {
            Some(Owner::Client) => {
                self.client.handle_event(&mut self.transport, event);
                if self.client.handle() != Some(handle) {
                    self.registry.release(handle);
                }
            }
            Some(Owner::Inbound { listener }) => match event {
                Event::Received(data) => {
                    match self.servers.iter_mut().find(|s| s.listener() == listener) {
                        Some(server) => server.on_receive(&mut self.transport, handle, data),
                        None => warn!("no server for listener {}", listener),
                    }
                }
                event if event.is_terminal() => {
                    self.registry.release(handle);
                }
                _ => trace!("ignoring notification on inbound {}", handle),
            },
            Some(Owner::Listener) => {
                if event.is_terminal() {
                    warn!("listener {} closed", handle);
                    self.registry.release(handle);
                    self.servers.retain(|s| s.listener() != handle);
                }
            }
            None => trace!("notification for unknown handle {}", handle),
        }
    }

    /// Whether a listener or inbound connection may take a slot without
    /// using the one kept for the client.
    fn server_slot_free(&self) -> bool {
        let reserved = usize::from(self.client.handle().is_none());
        self.registry.len() + reserved < MAX_CONNECTIONS
    }

    fn accept(&mut self, conn: Handle, listener: Handle) {
        if self.registry.owner(listener) != Some(&Owner::Listener) {
            warn!("connection {} accepted on unknown listener {}", conn, listener);
            close(&mut self.transport, conn);
            return;
        }
        if !self.server_slot_free() {
            warn!("refusing connection {}: no free slot", conn);
            close(&mut self.transport, conn);
            return;
        }
        match self.registry.bind(conn, Owner::Inbound { listener }) {
            Ok(()) => debug!("accepted {} on {}", conn, listener),
            Err(err) => {
                warn!("refusing connection {}: {}", conn, err);
                close(&mut self.transport, conn);
            }
        }
    }
}

fn close<T: Transport>(transport: &mut T, handle: Handle) {
    if let Err(err) = transport.close(handle) {
        warn!("closing {} failed: {}", handle, err);
    }
}
