use tokio_tungstenite::tungstenite;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("server is unavailable")]
    Unavailable,

    #[error("websocket error: {0}")]
    WebSocket(#[source] Box<tungstenite::Error>),

    #[error("connect failed: {0}")]
    Connect(String),
}

impl TransportError {
    /// Refused/reset/aborted sockets mean nobody is listening; everything else
    /// is kept as the underlying websocket error.
    pub fn from_tungstenite(err: tungstenite::Error) -> Self {
        let is_connect = match &err {
            tungstenite::Error::Io(io_err) => matches!(
                io_err.kind(),
                std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
            ),
            _ => false,
        };
        if is_connect {
            Self::Unavailable
        } else {
            Self::WebSocket(Box::new(err))
        }
    }
}
