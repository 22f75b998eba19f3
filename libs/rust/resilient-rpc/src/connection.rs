//! Transport connection to a remote gRPC service.
//!
//! A [`Connection`] performs single unary attempts on already-encoded
//! payloads. Operation names are opaque: they are mapped onto a gRPC path
//! and nothing else, so no generated stub is needed per operation.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use bytes::{Buf, BufMut, Bytes};
use tonic::codec::{Codec, DecodeBuf, Decoder, EncodeBuf, Encoder};
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Channel, Endpoint as TransportEndpoint};
use tonic::{Request, Status};
use tracing::{debug, info, instrument};

use crate::error::ClientError;

/// Address of a remote service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    /// Creates a new endpoint.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidEndpoint` if the host is blank or the
    /// port is zero.
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self, ClientError> {
        let host = host.into().trim().to_string();
        if host.is_empty() {
            return Err(ClientError::invalid_endpoint("host cannot be empty"));
        }
        if port == 0 {
            return Err(ClientError::invalid_endpoint("port must be between 1 and 65535"));
        }
        Ok(Self { host, port })
    }

    /// Returns the host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns the plaintext HTTP/2 URI for this endpoint.
    #[must_use]
    pub fn uri(&self) -> String {
        format!("http://{self}")
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') && !self.host.starts_with('[') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// A transport handle shared by every in-flight call of one client.
///
/// Implementations must allow concurrent `unary` calls.
#[async_trait]
pub trait Connection: Send + Sync + 'static {
    /// Performs one attempt of a unary call.
    ///
    /// `operation` is either a bare method name, resolved against the
    /// connection's default service, or a fully qualified `package.Service/Method`.
    async fn unary(
        &self,
        operation: &str,
        request: Bytes,
        timeout: Duration,
    ) -> Result<Bytes, Status>;

    /// Releases the transport.
    async fn close(&self) -> Result<(), ClientError>;
}

/// Options for opening a [`GrpcConnection`].
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// Fully qualified gRPC service for bare operation names
    pub service: String,
    /// Dial during `open` instead of on the first call
    pub connect_eagerly: bool,
    /// Timeout for establishing the transport
    pub connect_timeout: Duration,
}

impl ConnectOptions {
    /// Creates options for the given fully qualified service.
    #[must_use]
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            connect_eagerly: false,
            connect_timeout: Duration::from_secs(5),
        }
    }

    /// Dial eagerly on open.
    #[must_use]
    pub const fn with_connect_eagerly(mut self, eager: bool) -> Self {
        self.connect_eagerly = eager;
        self
    }

    /// Sets the connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

/// [`Connection`] backed by a tonic HTTP/2 channel.
///
/// All calls are multiplexed over the one underlying connection.
pub struct GrpcConnection {
    endpoint: Endpoint,
    service: String,
    channel: ArcSwapOption<Channel>,
}

impl GrpcConnection {
    /// Opens a channel to the endpoint.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidConfig` for an empty service name,
    /// `ClientError::InvalidEndpoint` for an unparsable URI, and
    /// `ClientError::Connect` if an eager dial fails.
    #[instrument(skip(options), fields(service = %options.service))]
    pub async fn open(endpoint: Endpoint, options: ConnectOptions) -> Result<Self, ClientError> {
        if options.service.trim().is_empty() {
            return Err(ClientError::invalid_config("service name cannot be empty"));
        }

        let transport = TransportEndpoint::from_shared(endpoint.uri())
            .map_err(|e| ClientError::invalid_endpoint(format!("{endpoint}: {e}")))?
            .connect_timeout(options.connect_timeout);

        let channel = if options.connect_eagerly {
            transport
                .connect()
                .await
                .map_err(|e| ClientError::connect(endpoint.uri(), e.to_string()))?
        } else {
            transport.connect_lazy()
        };

        info!(endpoint = %endpoint, eager = options.connect_eagerly, "gRPC channel opened");

        Ok(Self {
            endpoint,
            service: options.service,
            channel: ArcSwapOption::from_pointee(channel),
        })
    }

    /// Checks if the connection has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.channel.load().is_none()
    }
}

#[async_trait]
impl Connection for GrpcConnection {
    async fn unary(
        &self,
        operation: &str,
        request: Bytes,
        timeout: Duration,
    ) -> Result<Bytes, Status> {
        let channel = self
            .channel
            .load_full()
            .ok_or_else(|| Status::cancelled("connection closed"))?;
        let path = rpc_path(&self.service, operation)?;

        let mut grpc = tonic::client::Grpc::new((*channel).clone());
        grpc.ready()
            .await
            .map_err(|e| Status::unavailable(format!("service was not ready: {e}")))?;

        let mut request = Request::new(request);
        request.set_timeout(timeout);

        let response = grpc.unary(request, path, RawCodec).await?;
        Ok(response.into_inner())
    }

    async fn close(&self) -> Result<(), ClientError> {
        if self.channel.swap(None).is_some() {
            info!(endpoint = %self.endpoint, "gRPC channel closed");
        } else {
            debug!(endpoint = %self.endpoint, "gRPC channel already closed");
        }
        Ok(())
    }
}

/// Builds the gRPC path for an operation.
///
/// # Errors
///
/// Returns `INVALID_ARGUMENT` for an empty or malformed operation name.
pub fn rpc_path(service: &str, operation: &str) -> Result<PathAndQuery, Status> {
    let operation = operation.trim_start_matches('/');
    if operation.is_empty() {
        return Err(Status::invalid_argument("operation name cannot be empty"));
    }

    let full = if operation.contains('/') {
        format!("/{operation}")
    } else {
        format!("/{service}/{operation}")
    };

    PathAndQuery::from_str(&full)
        .map_err(|e| Status::invalid_argument(format!("invalid operation '{operation}': {e}")))
}

/// Pass-through codec for pre-encoded protobuf payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawCodec;

impl Codec for RawCodec {
    type Encode = Bytes;
    type Decode = Bytes;
    type Encoder = RawCodec;
    type Decoder = RawCodec;

    fn encoder(&mut self) -> Self::Encoder {
        Self
    }

    fn decoder(&mut self) -> Self::Decoder {
        Self
    }
}

impl Encoder for RawCodec {
    type Item = Bytes;
    type Error = Status;

    fn encode(&mut self, item: Self::Item, dst: &mut EncodeBuf<'_>) -> Result<(), Self::Error> {
        dst.put(item);
        Ok(())
    }
}

impl Decoder for RawCodec {
    type Item = Bytes;
    type Error = Status;

    fn decode(&mut self, src: &mut DecodeBuf<'_>) -> Result<Option<Self::Item>, Self::Error> {
        let len = src.remaining();
        Ok(Some(src.copy_to_bytes(len)))
    }
}
