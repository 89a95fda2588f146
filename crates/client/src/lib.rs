pub mod config;
pub mod connection;
pub mod error;
pub mod runner;
pub mod transport;

pub use config::ClientConfig;
pub use connection::{disconnect, Connection};
pub use error::ClientError;
pub use runner::DiagnosticsRunner;
pub use transport::{Transport, WssTransport};

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;

    use crate::error::ClientError;
    use crate::transport::Transport;
    use tokio_tungstenite::tungstenite;

    /// Scripted peer: hands out queued frames on receive and records every
    /// frame sent.
    pub struct MockTransport {
        pub incoming: VecDeque<String>,
        pub sent: Vec<String>,
        pub closed: bool,
        /// When true, an empty incoming queue models a server that never
        /// replies instead of a closed socket.
        pub hang_when_empty: bool,
    }

    impl MockTransport {
        pub fn scripted<'a>(frames: impl IntoIterator<Item = &'a str>) -> Self {
            MockTransport {
                incoming: frames.into_iter().map(str::to_string).collect(),
                sent: Vec::new(),
                closed: false,
                hang_when_empty: false,
            }
        }
    }

    impl Transport for MockTransport {
        async fn send_text(&mut self, frame: String) -> Result<(), ClientError> {
            if self.closed {
                return Err(ClientError::Transport(tungstenite::Error::AlreadyClosed));
            }
            self.sent.push(frame);
            Ok(())
        }

        async fn recv_text(&mut self) -> Result<String, ClientError> {
            match self.incoming.pop_front() {
                Some(frame) => Ok(frame),
                None if self.hang_when_empty => {
                    std::future::pending::<Result<String, ClientError>>().await
                }
                None => Err(ClientError::Transport(tungstenite::Error::ConnectionClosed)),
            }
        }

        async fn close(&mut self) -> Result<(), ClientError> {
            if self.closed {
                return Err(ClientError::Transport(tungstenite::Error::AlreadyClosed));
            }
            self.closed = true;
            Ok(())
        }
    }
}
