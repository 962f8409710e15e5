//! Connection lifecycle and the protocol state machine.
//!
//! One `BoltConnection` owns one socket and drives it through
//! handshake, authentication and the request/response exchanges. The
//! connection is generic over the stream so hosts can supply their own
//! transport (e.g. an established TLS session) and tests can run
//! against in-memory duplex pipes.

use std::collections::HashMap;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, warn};

use crate::bolt::codec::ChunkCodec;
use crate::bolt::handshake::{default_proposal, parse_reply, BoltVersion, REPLY_SIZE};
use crate::bolt::message::{
    AuthToken, BoltRequest, BoltResponse, FailureMessage, HelloMessage, NotificationConfig,
    RecordMessage, RouteMessage, RunMessage, StreamExtras, SuccessMessage, TxExtras,
};
use crate::bolt::packstream::Value;

use super::config::Config;
use super::error::{DriverError, DriverResult};
use super::record::QueryResult;
use super::transport;

/// Protocol state of one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Socket open, handshake not yet done.
    Connected,
    /// Version agreed, not yet authenticated.
    Negotiated,
    /// HELLO/INIT/LOGON in flight.
    Authentication,
    Ready,
    Streaming,
    TxReady,
    TxStreaming,
    /// Server reported FAILURE; only RESET (or ACK_FAILURE on v<=3)
    /// is accepted.
    Failed,
    /// RESET sent, draining stale responses.
    Interrupted,
    /// Unusable; the pool discards it.
    Defunct,
}

impl ConnectionStatus {
    pub fn in_transaction(self) -> bool {
        matches!(self, ConnectionStatus::TxReady | ConnectionStatus::TxStreaming)
    }

    pub fn is_streaming(self) -> bool {
        matches!(self, ConnectionStatus::Streaming | ConnectionStatus::TxStreaming)
    }
}

/// Hints the server sends in the HELLO/INIT SUCCESS metadata.
#[derive(Debug, Clone, Default)]
pub struct ServerHints {
    /// Server-requested receive deadline.
    pub recv_timeout: Option<Duration>,
    pub telemetry_enabled: bool,
    pub ssr_enabled: bool,
    /// The full hint map as received.
    pub raw: HashMap<String, Value>,
}

impl ServerHints {
    pub fn from_success(success: &SuccessMessage) -> Self {
        let raw = success.hints().cloned().unwrap_or_default();
        let recv_timeout = raw
            .get("connection.recv_timeout_seconds")
            .and_then(Value::as_int)
            .filter(|secs| *secs > 0)
            .map(|secs| Duration::from_secs(secs as u64));
        let telemetry_enabled = raw
            .get("telemetry.enabled")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let ssr_enabled = raw
            .get("ssr.enabled")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        Self {
            recv_timeout,
            telemetry_enabled,
            ssr_enabled,
            raw,
        }
    }
}

/// Outcome of a successful RUN.
#[derive(Debug, Clone)]
pub struct StatementHandle {
    /// Column names for the coming records.
    pub fields: Vec<String>,
    /// Statement handle for sized PULL/DISCARD (Bolt 4+).
    pub qid: Option<i64>,
}

/// Outcome of a PULL: the records plus the terminal SUCCESS.
#[derive(Debug)]
pub struct PullOutcome {
    pub records: Vec<RecordMessage>,
    pub summary: SuccessMessage,
}

impl PullOutcome {
    pub fn has_more(&self) -> bool {
        self.summary.has_more()
    }
}

/// Parsed ROUTE response. Addresses are kept as `host:port` strings;
/// resolving or caching them is the caller's concern.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    pub ttl: u64,
    pub db: Option<String>,
    pub routers: Vec<String>,
    pub readers: Vec<String>,
    pub writers: Vec<String>,
}

impl RoutingTable {
    pub fn from_success(success: &SuccessMessage) -> Option<Self> {
        let rt = success.routing_table()?;
        let ttl = rt.get("ttl").and_then(Value::as_int).unwrap_or(300) as u64;
        let db = rt.get("db").and_then(Value::as_str).map(str::to_owned);
        let mut table = Self {
            ttl,
            db,
            ..Self::default()
        };
        for server in rt.get("servers").and_then(Value::as_list).unwrap_or(&[]) {
            let Some(entry) = server.as_map() else { continue };
            let addresses: Vec<String> = entry
                .get("addresses")
                .and_then(Value::as_string_list)
                .unwrap_or_default();
            match entry.get("role").and_then(Value::as_str) {
                Some("ROUTE") => table.routers.extend(addresses),
                Some("READ") => table.readers.extend(addresses),
                Some("WRITE") => table.writers.extend(addresses),
                _ => {}
            }
        }
        Some(table)
    }
}

/// One Bolt connection over stream `S`.
pub struct BoltConnection<S = TcpStream> {
    stream: S,
    codec: ChunkCodec,
    read_buf: BytesMut,
    write_buf: BytesMut,
    version: BoltVersion,
    status: ConnectionStatus,
    tx_depth: u32,
    recv_timeout: Duration,
    ping_timeout: Duration,
    hints: ServerHints,
    server_agent: Option<String>,
    connection_id: Option<String>,
}

impl BoltConnection<TcpStream> {
    /// Resolve, dial, handshake and authenticate.
    pub async fn connect(config: &Config) -> DriverResult<Self> {
        let stream = transport::connect_tcp(config).await?;
        Self::establish(stream, config).await
    }
}

impl<S> BoltConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Drive an already-connected stream through handshake and the
    /// version-appropriate authentication flow.
    pub async fn establish(mut stream: S, config: &Config) -> DriverResult<Self> {
        stream
            .write_all(&default_proposal())
            .await
            .map_err(|e| DriverError::Handshake(format!("proposal write failed: {e}")))?;
        stream
            .flush()
            .await
            .map_err(|e| DriverError::Handshake(format!("proposal write failed: {e}")))?;

        let mut reply = [0u8; REPLY_SIZE];
        timeout(config.timeout, stream.read_exact(&mut reply))
            .await
            .map_err(|_| DriverError::Handshake("server did not answer the handshake".to_owned()))?
            .map_err(|e| DriverError::Handshake(format!("reply read failed: {e}")))?;
        let version = parse_reply(reply)?;
        debug!(%version, "negotiated protocol version");

        let mut conn = Self {
            stream,
            codec: ChunkCodec::new(),
            read_buf: BytesMut::with_capacity(8192),
            write_buf: BytesMut::with_capacity(8192),
            version,
            status: ConnectionStatus::Negotiated,
            tx_depth: 0,
            recv_timeout: config.recv_timeout,
            ping_timeout: config.ping_timeout,
            hints: ServerHints::default(),
            server_agent: None,
            connection_id: None,
        };
        conn.authenticate(config).await?;
        Ok(conn)
    }

    async fn authenticate(&mut self, config: &Config) -> DriverResult<()> {
        self.status = ConnectionStatus::Authentication;
        let auth = config
            .basic_auth
            .as_ref()
            .map(|a| AuthToken::basic(&a.username, &a.password));

        let mut hello = HelloMessage::new(&config.user_agent);
        // For 5.1+ the encoder leaves auth out of HELLO; it travels in
        // the LOGON below.
        if let Some(ref token) = auth {
            hello = hello.with_auth(token.clone());
        }
        if self.version.supports_routing_context() {
            if let Some(ref context) = config.routing_context {
                let map = context
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
                    .collect();
                hello = hello.with_routing(map);
            }
        }
        hello.notifications = NotificationConfig {
            minimum_severity: config
                .notifications_minimum_severity
                .clone()
                .filter(|_| self.version.supports_notification_filtering()),
            disabled_classifications: config
                .notifications_disabled_classifications
                .clone()
                .filter(|_| self.version.supports_notification_classifications()),
        };

        let success = self.auth_exchange(BoltRequest::Hello(hello)).await?;
        self.server_agent = success.server().map(str::to_owned);
        self.connection_id = success.connection_id().map(str::to_owned);
        self.hints = ServerHints::from_success(&success);
        if let Some(server_timeout) = self.hints.recv_timeout {
            self.recv_timeout = server_timeout;
        }

        if self.version.supports_logon() {
            let token = auth.unwrap_or_else(AuthToken::none);
            self.auth_exchange(BoltRequest::Logon(token)).await?;
        }

        self.status = ConnectionStatus::Ready;
        Ok(())
    }

    async fn auth_exchange(&mut self, request: BoltRequest) -> DriverResult<SuccessMessage> {
        self.send_request(request).await?;
        match self.recv_response().await? {
            BoltResponse::Success(success) => Ok(success),
            BoltResponse::Failure(failure) => {
                // Rejected credentials leave nothing to salvage.
                self.status = ConnectionStatus::Defunct;
                Err(DriverError::Auth {
                    code: failure.code,
                    message: failure.message,
                })
            }
            other => Err(self.recover_protocol(format!(
                "unexpected {} during authentication",
                other.name()
            ))
            .await),
        }
    }

    /// Re-authenticate on Bolt 5.1+.
    pub async fn logon(&mut self, token: AuthToken) -> DriverResult<()> {
        self.auth_exchange(BoltRequest::Logon(token)).await?;
        self.status = ConnectionStatus::Ready;
        Ok(())
    }

    /// Drop authentication on Bolt 5.1+.
    pub async fn logoff(&mut self) -> DriverResult<()> {
        self.send_request(BoltRequest::Logoff).await?;
        match self.recv_response().await? {
            BoltResponse::Success(_) => {
                self.status = ConnectionStatus::Authentication;
                Ok(())
            }
            BoltResponse::Failure(failure) => Err(self.recover_failure(failure).await),
            other => {
                Err(self
                    .recover_protocol(format!("unexpected {} to LOGOFF", other.name()))
                    .await)
            }
        }
    }

    /// Send RUN and await the field list.
    pub async fn run(
        &mut self,
        query: impl Into<String>,
        parameters: HashMap<String, Value>,
        extras: TxExtras,
    ) -> DriverResult<StatementHandle> {
        let was_tx = match self.status {
            ConnectionStatus::Ready => false,
            ConnectionStatus::TxReady => true,
            other => {
                return Err(DriverError::Protocol(format!(
                    "RUN is not valid in state {other:?}"
                )))
            }
        };
        let run = RunMessage::new(query)
            .with_parameters(parameters)
            .with_extras(extras);
        self.send_request(BoltRequest::Run(run)).await?;
        match self.recv_response().await? {
            BoltResponse::Success(success) => {
                self.status = if was_tx {
                    ConnectionStatus::TxStreaming
                } else {
                    ConnectionStatus::Streaming
                };
                Ok(StatementHandle {
                    fields: success.fields().unwrap_or_default(),
                    qid: success.qid(),
                })
            }
            BoltResponse::Failure(failure) => Err(self.recover_failure(failure).await),
            BoltResponse::Ignored => Err(self.recover_ignored().await),
            other => {
                Err(self
                    .recover_protocol(format!("unexpected {} to RUN", other.name()))
                    .await)
            }
        }
    }

    /// Consume records until the terminal SUCCESS.
    pub async fn pull(&mut self, extras: StreamExtras) -> DriverResult<PullOutcome> {
        self.stream_exchange(BoltRequest::Pull(extras), true).await
    }

    /// Drop server-side records; no RECORDs are delivered.
    pub async fn discard(&mut self, extras: StreamExtras) -> DriverResult<SuccessMessage> {
        let outcome = self
            .stream_exchange(BoltRequest::Discard(extras), false)
            .await?;
        Ok(outcome.summary)
    }

    async fn stream_exchange(
        &mut self,
        request: BoltRequest,
        keep_records: bool,
    ) -> DriverResult<PullOutcome> {
        if !self.status.is_streaming() {
            return Err(DriverError::Protocol(format!(
                "no result stream open in state {:?}",
                self.status
            )));
        }
        let was_tx = self.status == ConnectionStatus::TxStreaming;
        self.send_request(request).await?;

        let mut records = Vec::new();
        loop {
            match self.recv_response().await? {
                BoltResponse::Record(record) => {
                    if keep_records {
                        records.push(record);
                    } else {
                        return Err(self
                            .recover_protocol("RECORD received in response to DISCARD".to_owned())
                            .await);
                    }
                }
                BoltResponse::Success(summary) => {
                    if !summary.has_more() {
                        self.status = if was_tx {
                            ConnectionStatus::TxReady
                        } else {
                            ConnectionStatus::Ready
                        };
                    }
                    return Ok(PullOutcome { records, summary });
                }
                BoltResponse::Failure(failure) => return Err(self.recover_failure(failure).await),
                BoltResponse::Ignored => return Err(self.recover_ignored().await),
            }
        }
    }

    /// Open an explicit transaction, or bump the depth when one is
    /// already open (nested transactions never reach the wire).
    pub async fn begin(&mut self, extras: TxExtras) -> DriverResult<()> {
        if self.status.in_transaction() {
            self.tx_depth += 1;
            return Ok(());
        }
        if self.status != ConnectionStatus::Ready {
            return Err(DriverError::Protocol(format!(
                "BEGIN is not valid in state {:?}",
                self.status
            )));
        }
        self.send_request(BoltRequest::Begin(extras)).await?;
        match self.recv_response().await? {
            BoltResponse::Success(_) => {
                self.status = ConnectionStatus::TxReady;
                self.tx_depth = 1;
                Ok(())
            }
            BoltResponse::Failure(failure) => Err(self.recover_failure(failure).await),
            BoltResponse::Ignored => Err(self.recover_ignored().await),
            other => {
                Err(self
                    .recover_protocol(format!("unexpected {} to BEGIN", other.name()))
                    .await)
            }
        }
    }

    /// Commit the transaction. Only the outermost commit reaches the
    /// wire; inner commits just unwind the depth.
    pub async fn commit(&mut self) -> DriverResult<Option<String>> {
        if self.tx_depth > 1 {
            self.tx_depth -= 1;
            return Ok(None);
        }
        self.ensure_tx_ready("COMMIT")?;
        self.send_request(BoltRequest::Commit).await?;
        match self.recv_response().await? {
            BoltResponse::Success(success) => {
                self.status = ConnectionStatus::Ready;
                self.tx_depth = 0;
                Ok(success.bookmark().map(str::to_owned))
            }
            BoltResponse::Failure(failure) => Err(self.recover_failure(failure).await),
            BoltResponse::Ignored => Err(self.recover_ignored().await),
            other => {
                Err(self
                    .recover_protocol(format!("unexpected {} to COMMIT", other.name()))
                    .await)
            }
        }
    }

    /// Roll the transaction back, with the same depth unwinding as
    /// [`Self::commit`].
    pub async fn rollback(&mut self) -> DriverResult<()> {
        if self.tx_depth > 1 {
            self.tx_depth -= 1;
            return Ok(());
        }
        self.ensure_tx_ready("ROLLBACK")?;
        self.send_request(BoltRequest::Rollback).await?;
        match self.recv_response().await? {
            BoltResponse::Success(_) => {
                self.status = ConnectionStatus::Ready;
                self.tx_depth = 0;
                Ok(())
            }
            BoltResponse::Failure(failure) => Err(self.recover_failure(failure).await),
            BoltResponse::Ignored => Err(self.recover_ignored().await),
            other => {
                Err(self
                    .recover_protocol(format!("unexpected {} to ROLLBACK", other.name()))
                    .await)
            }
        }
    }

    fn ensure_tx_ready(&self, op: &str) -> DriverResult<()> {
        match self.status {
            ConnectionStatus::TxReady => Ok(()),
            ConnectionStatus::TxStreaming => Err(DriverError::Protocol(format!(
                "{op} with an undrained result stream"
            ))),
            other => Err(DriverError::Protocol(format!(
                "{op} outside a transaction (state {other:?})"
            ))),
        }
    }

    /// Send RESET and drain stale responses until its SUCCESS.
    ///
    /// Accepted in any live state; pending records and IGNOREDs from
    /// interrupted requests are discarded.
    pub async fn reset(&mut self) -> DriverResult<()> {
        self.interrupt_with(BoltRequest::Reset).await
    }

    /// Acknowledge a FAILURE. This is the v1-v3 recovery message; on
    /// v4+ it is sent as RESET.
    pub async fn ack_failure(&mut self) -> DriverResult<()> {
        self.interrupt_with(BoltRequest::AckFailure).await
    }

    async fn interrupt_with(&mut self, request: BoltRequest) -> DriverResult<()> {
        if self.status == ConnectionStatus::Defunct {
            return Err(DriverError::Connection("connection is defunct".to_owned()));
        }
        self.send_request(request).await?;
        self.status = ConnectionStatus::Interrupted;
        loop {
            match self.recv_response().await? {
                BoltResponse::Success(_) => {
                    self.status = ConnectionStatus::Ready;
                    self.tx_depth = 0;
                    return Ok(());
                }
                // Responses to interrupted requests; drop them.
                BoltResponse::Record(_) | BoltResponse::Ignored | BoltResponse::Failure(_) => {}
            }
        }
    }

    /// RESET with a short deadline, used as a liveness probe. Any
    /// failure means the connection must be discarded.
    pub async fn ping(&mut self) -> DriverResult<()> {
        let deadline = self.ping_timeout;
        let saved = self.recv_timeout;
        self.recv_timeout = deadline;
        let outcome = self.reset().await;
        self.recv_timeout = saved;
        outcome.map_err(|e| {
            self.status = ConnectionStatus::Defunct;
            DriverError::Connection(format!("ping failed: {e}"))
        })
    }

    /// Best-effort GOODBYE (v3+), then mark the connection done. Write
    /// failures are tolerated; the server may already be gone.
    pub async fn goodbye(&mut self) {
        if self.status != ConnectionStatus::Defunct && self.version.supports_goodbye() {
            if let Err(e) = self.send_request(BoltRequest::Goodbye).await {
                debug!("GOODBYE not delivered: {e}");
            }
        }
        self.status = ConnectionStatus::Defunct;
        let _ = self.stream.shutdown().await;
    }

    /// Fetch the routing table (Bolt 4.3+). The table is returned, not
    /// cached; caching policy belongs to the caller.
    pub async fn route(&mut self, message: RouteMessage) -> DriverResult<RoutingTable> {
        if self.status != ConnectionStatus::Ready {
            return Err(DriverError::Protocol(format!(
                "ROUTE is not valid in state {:?}",
                self.status
            )));
        }
        self.send_request(BoltRequest::Route(message)).await?;
        match self.recv_response().await? {
            BoltResponse::Success(success) => RoutingTable::from_success(&success).ok_or_else(|| {
                DriverError::Protocol("ROUTE response carries no routing table".to_owned())
            }),
            BoltResponse::Failure(failure) => Err(self.recover_failure(failure).await),
            BoltResponse::Ignored => Err(self.recover_ignored().await),
            other => {
                Err(self
                    .recover_protocol(format!("unexpected {} to ROUTE", other.name()))
                    .await)
            }
        }
    }

    /// Report a driver api usage point (Bolt 5.4+). Server-side
    /// failures are suppressed; telemetry must never break a caller.
    pub async fn telemetry(&mut self, api: i64) -> DriverResult<()> {
        if !self.version.supports_telemetry() || !self.hints.telemetry_enabled {
            return Ok(());
        }
        self.send_request(BoltRequest::Telemetry(api)).await?;
        match self.recv_response().await? {
            BoltResponse::Success(_) => Ok(()),
            BoltResponse::Failure(failure) => {
                debug!("TELEMETRY rejected: {failure}");
                let _ = self.recover_failure(failure).await;
                Ok(())
            }
            BoltResponse::Ignored => {
                let _ = self.recover_ignored().await;
                Ok(())
            }
            other => {
                Err(self
                    .recover_protocol(format!("unexpected {} to TELEMETRY", other.name()))
                    .await)
            }
        }
    }

    /// RUN + PULL-all convenience.
    pub async fn execute(
        &mut self,
        query: impl Into<String>,
        parameters: HashMap<String, Value>,
        extras: TxExtras,
    ) -> DriverResult<QueryResult> {
        let handle = self.run(query, parameters, extras).await?;
        let outcome = self.pull(StreamExtras::all()).await?;
        Ok(QueryResult::new(handle.fields, outcome))
    }

    // Failure-path cleanup: every path that lands in Failed issues a
    // RESET before the connection can re-enter the pool; a RESET
    // failure leaves the connection Defunct.

    async fn recover_failure(&mut self, failure: FailureMessage) -> DriverError {
        self.status = ConnectionStatus::Failed;
        let err = DriverError::from_failure(&failure);
        if let Err(reset_err) = self.reset().await {
            warn!("RESET after FAILURE did not complete: {reset_err}");
            self.status = ConnectionStatus::Defunct;
        }
        err
    }

    async fn recover_ignored(&mut self) -> DriverError {
        self.status = ConnectionStatus::Failed;
        if let Err(reset_err) = self.reset().await {
            warn!("RESET after IGNORED did not complete: {reset_err}");
            self.status = ConnectionStatus::Defunct;
        }
        DriverError::Ignored
    }

    async fn recover_protocol(&mut self, message: String) -> DriverError {
        self.status = ConnectionStatus::Failed;
        if let Err(reset_err) = self.reset().await {
            warn!("RESET after protocol violation did not complete: {reset_err}");
            self.status = ConnectionStatus::Defunct;
        }
        DriverError::Protocol(message)
    }

    async fn send_request(&mut self, request: BoltRequest) -> DriverResult<()> {
        // Illegal message/version combinations and bad extras fail here
        // without any wire I/O.
        let structure = request.to_structure(self.version)?;
        self.write_buf.clear();
        let value = Value::Structure(structure);
        self.codec.encode(&value, &mut self.write_buf)?;
        self.stream.write_all(&self.write_buf).await.map_err(|e| {
            self.status = ConnectionStatus::Defunct;
            DriverError::Connection(format!("send failed: {e}"))
        })?;
        self.stream.flush().await.map_err(|e| {
            self.status = ConnectionStatus::Defunct;
            DriverError::Connection(format!("flush failed: {e}"))
        })
    }

    async fn recv_response(&mut self) -> DriverResult<BoltResponse> {
        let deadline = self.recv_timeout;
        match timeout(deadline, self.recv_unbounded()).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => {
                if e.is_connection_error() {
                    self.status = ConnectionStatus::Defunct;
                }
                Err(e)
            }
            Err(_) => {
                self.status = ConnectionStatus::Defunct;
                Err(DriverError::Connection(format!(
                    "receive timed out after {deadline:?}"
                )))
            }
        }
    }

    async fn recv_unbounded(&mut self) -> DriverResult<BoltResponse> {
        loop {
            if let Some(value) = self.codec.decode(&mut self.read_buf)? {
                return BoltResponse::from_value(value).map_err(Into::into);
            }
            let n = self
                .stream
                .read_buf(&mut self.read_buf)
                .await
                .map_err(|e| DriverError::Connection(format!("read failed: {e}")))?;
            if n == 0 {
                return Err(DriverError::Connection(
                    "connection closed by server".to_owned(),
                ));
            }
        }
    }

    pub fn version(&self) -> BoltVersion {
        self.version
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn tx_depth(&self) -> u32 {
        self.tx_depth
    }

    pub fn server_hints(&self) -> &ServerHints {
        &self.hints
    }

    pub fn server_agent(&self) -> Option<&str> {
        self.server_agent.as_deref()
    }

    pub fn connection_id(&self) -> Option<&str> {
        self.connection_id.as_deref()
    }

    /// Whether the pool may hand this connection out again.
    pub fn is_healthy(&self) -> bool {
        matches!(
            self.status,
            ConnectionStatus::Ready
                | ConnectionStatus::Streaming
                | ConnectionStatus::TxReady
                | ConnectionStatus::TxStreaming
        )
    }

    /// Mark the connection unusable after an asynchronous close/error
    /// notification; no GOODBYE will be attempted.
    pub fn mark_defunct(&mut self) {
        self.status = ConnectionStatus::Defunct;
    }
}

impl<S> std::fmt::Debug for BoltConnection<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoltConnection")
            .field("version", &self.version)
            .field("status", &self.status)
            .field("tx_depth", &self.tx_depth)
            .field("server_agent", &self.server_agent)
            .field("connection_id", &self.connection_id)
            .finish()
    }
}
