//! UDP datagram endpoints for the sender and receiver sides of the diode.
//!
//! Sockets are built with `socket2` (`Socket::new` + explicit options) and
//! only handed to the async runtime once they're fully configured, since we
//! need `SO_BROADCAST` and a specific bind address set before the runtime
//! takes ownership of the file descriptor.

use crate::error::{classify_receive_bind_error, classify_send_bind_error, DiodeError};
use socket2::{Domain, Protocol, Socket, Type};
use std::net::{IpAddr, SocketAddr};
use tokio::net::UdpSocket;

/// The sender's half of the transport: a socket bound to `write_ip` with an
/// ephemeral port, broadcast enabled, sending to a fixed `(read_ip, port)`
/// destination.
pub struct SenderTransport {
    socket: UdpSocket,
    destination: SocketAddr,
}

impl SenderTransport {
    pub async fn bind(write_ip: IpAddr, read_ip: IpAddr, port: u16) -> Result<Self, DiodeError> {
        let domain = if write_ip.is_ipv6() {
            Domain::IPV6
        } else {
            Domain::IPV4
        };
        let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_broadcast(true)?;
        socket
            .bind(&SocketAddr::new(write_ip, 0).into())
            .map_err(|e| classify_send_bind_error(e, &write_ip.to_string(), &read_ip.to_string()))?;
        socket.set_nonblocking(true)?;

        let std_socket: std::net::UdpSocket = socket.into();
        let socket = UdpSocket::from_std(std_socket)?;

        Ok(Self {
            socket,
            destination: SocketAddr::new(read_ip, port),
        })
    }

    pub async fn send(&self, datagram: &[u8]) -> Result<(), DiodeError> {
        self.socket.send_to(datagram, self.destination).await?;
        Ok(())
    }
}

/// The receiver's half: a socket bound to `(read_ip, port)`, reading
/// fixed-size datagrams with no destination of its own.
pub struct ReceiverTransport {
    socket: UdpSocket,
}

impl ReceiverTransport {
    pub async fn bind(read_ip: IpAddr, port: u16) -> Result<Self, DiodeError> {
        let domain = if read_ip.is_ipv6() {
            Domain::IPV6
        } else {
            Domain::IPV4
        };
        let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
        // Deliberately no SO_REUSEADDR: a second receiver on an occupied
        // (read_ip, port) must fail with AddrInUse, not silently share the
        // socket.
        socket
            .bind(&SocketAddr::new(read_ip, port).into())
            .map_err(|e| classify_receive_bind_error(e, &read_ip.to_string()))?;
        socket.set_nonblocking(true)?;

        let std_socket: std::net::UdpSocket = socket.into();
        let socket = UdpSocket::from_std(std_socket)?;

        Ok(Self { socket })
    }

    /// Read one datagram into `buf`, returning the number of bytes written.
    pub async fn recv(&self, buf: &mut [u8]) -> Result<usize, DiodeError> {
        let (len, _from) = self.socket.recv_from(buf).await?;
        Ok(len)
    }

    /// Expose the locally bound address, mainly useful in tests that bind to
    /// an ephemeral port and need to learn which one was chosen.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}
