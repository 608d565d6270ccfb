//! Handshake and length-prefixed framed I/O over an accepted TCP connection.
//!
//! ```text
//! NEW --accept--> AWAITING_HANDSHAKE --handshake_ok--> OPEN
//!                        | fail                         | error / EOF
//!                        v                               v
//!                     CLOSED <-------------------------+
//! ```

use std::time::Duration;

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    time::timeout,
};
use waypoint_crypto::{ClientPublicKey, SessionKey};
use waypoint_proto::MAX_FRAME_SIZE;

use crate::error::ChannelError;

const HANDSHAKE_DEADLINE: Duration = Duration::from_secs(5);
const IDLE_DEADLINE: Duration = Duration::from_secs(10 * 60);

/// A framed packet read post-handshake: the request id and its decrypted
/// payload.
pub struct Packet {
    /// Echoed back verbatim in the response.
    pub request_id: u32,
    /// Decrypted plaintext payload.
    pub payload: Vec<u8>,
}

/// An open, authenticated connection: a TCP socket plus the session key
/// negotiated during the handshake.
///
/// Requests on one connection are handled sequentially (see the crate's
/// accept loop), so no write lock is needed here: a `SecureChannel` is never
/// shared across tasks.
pub struct SecureChannel {
    stream: TcpStream,
    session_key: SessionKey,
}

impl SecureChannel {
    /// Perform the server side of the handshake on a freshly accepted
    /// socket.
    ///
    /// Reads a 4-byte request id (must be `0`), a 4-byte PEM length, and the
    /// PEM bytes; parses the client's RSA public key; generates a fresh
    /// session key; and writes the wrapped key back unframed (no request id,
    /// no length prefix — see the wire format's handshake asymmetry). The
    /// whole exchange is bounded by a 5-second deadline.
    ///
    /// # Errors
    ///
    /// [`ChannelError::Handshake`] for a non-zero request id or a PEM/crypto
    /// failure. [`ChannelError::Io`] / [`ChannelError::Closed`] for socket
    /// failure or a deadline timeout.
    pub async fn handshake(stream: TcpStream) -> Result<Self, ChannelError> {
        timeout(HANDSHAKE_DEADLINE, Self::run_handshake(stream)).await?
    }

    async fn run_handshake(mut stream: TcpStream) -> Result<Self, ChannelError> {
        let request_id = stream.read_u32_le().await?;
        if request_id != 0 {
            return Err(ChannelError::Handshake(format!(
                "expected request id 0 for handshake, got {request_id}"
            )));
        }

        let pem_len = stream.read_u32_le().await? as usize;
        let mut pem = vec![0u8; pem_len];
        stream.read_exact(&mut pem).await?;

        let public_key = ClientPublicKey::from_pem(&pem)
            .map_err(|err| ChannelError::Handshake(err.to_string()))?;

        let session_key = SessionKey::generate();
        let wrapped =
            public_key.wrap(session_key.raw()).map_err(|err| ChannelError::Handshake(err.to_string()))?;

        stream.write_all(&wrapped).await?;
        stream.flush().await?;

        Ok(Self { stream, session_key })
    }

    /// Read one framed packet, applying the 10-minute idle deadline.
    ///
    /// # Errors
    ///
    /// [`ChannelError::Closed`] on clean peer EOF. [`ChannelError::FrameTooLarge`]
    /// if the declared length exceeds [`MAX_FRAME_SIZE`]. [`ChannelError::Crypto`]
    /// if authentication fails. [`ChannelError::Io`] on any other socket or
    /// deadline failure.
    pub async fn read_packet(&mut self) -> Result<Packet, ChannelError> {
        timeout(IDLE_DEADLINE, self.read_packet_inner()).await?
    }

    async fn read_packet_inner(&mut self) -> Result<Packet, ChannelError> {
        let request_id = self.stream.read_u32_le().await?;
        let length = self.stream.read_u32_le().await? as usize;

        if length > MAX_FRAME_SIZE {
            return Err(ChannelError::FrameTooLarge { got: length, max: MAX_FRAME_SIZE });
        }

        let mut sealed = vec![0u8; length];
        self.stream.read_exact(&mut sealed).await?;

        let payload = self.session_key.open(&sealed)?;

        Ok(Packet { request_id, payload })
    }

    /// Seal and write `plaintext` as a framed packet carrying `request_id`.
    ///
    /// # Errors
    ///
    /// [`ChannelError::Crypto`] if sealing fails. [`ChannelError::Io`] on
    /// socket write failure.
    pub async fn write_packet(&mut self, request_id: u32, plaintext: &[u8]) -> Result<(), ChannelError> {
        let sealed = self.session_key.seal(plaintext)?;

        self.stream.write_u32_le(request_id).await?;
        self.stream.write_u32_le(sealed.len() as u32).await?;
        self.stream.write_all(&sealed).await?;
        self.stream.flush().await?;

        Ok(())
    }

    /// The peer's address, for logging.
    ///
    /// # Errors
    ///
    /// Propagates the underlying socket error.
    pub fn peer_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.stream.peer_addr()
    }
}
