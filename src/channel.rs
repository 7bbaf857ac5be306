//! The transport capability and the lossy decorator.
//!
//! Protocol loops never talk to a socket type directly; they are generic
//! over [`Channel`], which carries exactly two operations: send a packet to
//! an address, receive the next packet.  Two implementations ship here:
//!
//! - [`Socket`] — the real thing; every send reaches the wire.
//! - [`LossyChannel`] — wraps any other channel and silently discards each
//!   outbound packet with probability `p`, emulating an unreliable network
//!   at the sender's own boundary.  Receive is never touched: all loss is
//!   modelled as "the packet never left the sender".
//!
//! `p = 0.0` makes [`LossyChannel`] a perfect pass-through, which the
//! deterministic tests rely on.  The RNG is seedable so lossy runs are
//! reproducible.

use std::net::SocketAddr;
use std::sync::Mutex;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::packet::Packet;
use crate::socket::{Socket, SocketError};

/// A bidirectional packet transport between this endpoint and its peers.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Deliver `packet` to `dest` (or pretend to, for lossy implementations).
    async fn send_to(&self, packet: &Packet, dest: SocketAddr) -> Result<(), SocketError>;

    /// Wait for the next inbound packet and the address it came from.
    ///
    /// A datagram that fails to decode surfaces as
    /// [`SocketError::Packet`]; callers treat it as if it had been lost.
    async fn recv_from(&self) -> Result<(Packet, SocketAddr), SocketError>;
}

#[async_trait]
impl Channel for Socket {
    async fn send_to(&self, packet: &Packet, dest: SocketAddr) -> Result<(), SocketError> {
        Socket::send_to(self, packet, dest).await
    }

    async fn recv_from(&self) -> Result<(Packet, SocketAddr), SocketError> {
        Socket::recv_from(self).await
    }
}

/// Decorator that drops outbound packets with a configured probability.
pub struct LossyChannel<C> {
    inner: C,
    loss: f64,
    rng: Mutex<StdRng>,
}

impl<C: Channel> LossyChannel<C> {
    /// Wrap `inner`, dropping each outbound packet with probability `loss`
    /// (clamped to `[0.0, 1.0]`).  The RNG is seeded from the OS.
    pub fn new(inner: C, loss: f64) -> Self {
        Self::from_rng(inner, loss, StdRng::from_entropy())
    }

    /// Like [`new`](Self::new) but with a fixed seed for reproducible runs.
    pub fn with_seed(inner: C, loss: f64, seed: u64) -> Self {
        Self::from_rng(inner, loss, StdRng::seed_from_u64(seed))
    }

    fn from_rng(inner: C, loss: f64, rng: StdRng) -> Self {
        Self {
            inner,
            loss: loss.clamp(0.0, 1.0),
            rng: Mutex::new(rng),
        }
    }

    /// Access the wrapped channel (e.g. to read a bound address).
    pub fn inner(&self) -> &C {
        &self.inner
    }

    fn roll_drop(&self) -> bool {
        if self.loss <= 0.0 {
            return false;
        }
        let mut rng = self.rng.lock().expect("loss RNG poisoned");
        rng.gen::<f64>() < self.loss
    }
}

#[async_trait]
impl<C: Channel> Channel for LossyChannel<C> {
    async fn send_to(&self, packet: &Packet, dest: SocketAddr) -> Result<(), SocketError> {
        if self.roll_drop() {
            // The packet "never existed": no error, nothing on the wire.
            log::debug!("[lossy] simulating loss of {:?} seq={} to {dest}", packet.kind, packet.seq);
            return Ok(());
        }
        self.inner.send_to(packet, dest).await
    }

    async fn recv_from(&self) -> Result<(Packet, SocketAddr), SocketError> {
        self.inner.recv_from().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn ephemeral() -> Socket {
        let addr = "127.0.0.1:0".parse().unwrap();
        Socket::bind(addr).await.expect("bind failed")
    }

    #[tokio::test]
    async fn zero_loss_is_pass_through() {
        let a = LossyChannel::new(ephemeral().await, 0.0);
        let b = ephemeral().await;

        a.send_to(&Packet::ack(1), b.local_addr).await.unwrap();
        let (pkt, _) = b.recv_from().await.unwrap();
        assert_eq!(pkt, Packet::ack(1));
    }

    #[tokio::test]
    async fn full_loss_never_transmits() {
        let a = LossyChannel::with_seed(ephemeral().await, 1.0, 7);
        let b = ephemeral().await;

        for _ in 0..20 {
            a.send_to(&Packet::ack(0), b.local_addr).await.unwrap();
        }
        let waited = tokio::time::timeout(Duration::from_millis(100), b.recv_from()).await;
        assert!(waited.is_err(), "a packet leaked through p=1.0");
    }

    #[tokio::test]
    async fn receive_path_is_unaffected_by_loss() {
        let a = ephemeral().await;
        let b = LossyChannel::with_seed(ephemeral().await, 1.0, 7);
        let b_addr = b.inner.local_addr;

        a.send_to(&Packet::end(1), b_addr).await.unwrap();
        let (pkt, from) = b.recv_from().await.unwrap();
        assert_eq!(pkt, Packet::end(1));
        assert_eq!(from, a.local_addr);
    }
}
