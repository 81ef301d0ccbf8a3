//! Listening endpoint construction

use socket2::{Domain, Protocol, Socket, Type};
use std::net::{SocketAddr, TcpListener};

use crate::{Result, TelemetryError};

/// Pending connections the kernel may queue; only one is ever served
const LISTEN_BACKLOG: i32 = 16;

/// Bind a non-blocking listener with address reuse enabled.
///
/// Address reuse lets a restarted visualizer rebind the port while the previous
/// session's socket sits in `TIME_WAIT`.
pub(super) fn bind_listener(addr: SocketAddr) -> Result<TcpListener> {
    let bind_err = |e| TelemetryError::bind_error(addr.to_string(), e);

    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))
        .map_err(bind_err)?;
    socket.set_reuse_address(true).map_err(bind_err)?;
    socket.bind(&addr.into()).map_err(bind_err)?;
    socket.listen(LISTEN_BACKLOG).map_err(bind_err)?;
    socket.set_nonblocking(true).map_err(bind_err)?;

    Ok(socket.into())
}
