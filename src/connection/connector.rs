//! Transports a [`Connection`](super::Connection) can open.

use std::fmt::Debug;
use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncRead;

/// The read half of an established channel.
pub type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;

/// Opens a name-addressed byte stream to the producer.
#[async_trait]
pub trait Connector: Send + Sync + Debug {
    /// Connect to the channel called `channel`.
    async fn connect(&self, channel: &str) -> io::Result<BoxedReader>;

    /// Human-readable address of `channel`, for logs.
    fn address(&self, channel: &str) -> String;
}

/// Connects to the producer's local pipe.
///
/// On Windows this is the named pipe `\\.\pipe\<channel>`. Elsewhere it is a
/// Unix domain socket called `<channel>` inside a directory, the system
/// temporary directory by default.
#[derive(Debug, Clone)]
pub struct PipeConnector {
    #[cfg_attr(windows, allow(dead_code))]
    dir: PathBuf,
}

impl PipeConnector {
    pub fn new() -> Self {
        Self {
            dir: std::env::temp_dir(),
        }
    }

    /// Look for Unix sockets in `dir` instead of the temporary directory.
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl Default for PipeConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for PipeConnector {
    #[cfg(unix)]
    async fn connect(&self, channel: &str) -> io::Result<BoxedReader> {
        let stream = tokio::net::UnixStream::connect(self.dir.join(channel)).await?;
        Ok(Box::new(stream))
    }

    #[cfg(windows)]
    async fn connect(&self, channel: &str) -> io::Result<BoxedReader> {
        use tokio::net::windows::named_pipe::ClientOptions;

        let client = ClientOptions::new().open(self.address(channel))?;
        Ok(Box::new(client))
    }

    #[cfg(unix)]
    fn address(&self, channel: &str) -> String {
        self.dir.join(channel).display().to_string()
    }

    #[cfg(windows)]
    fn address(&self, channel: &str) -> String {
        format!(r"\\.\pipe\{}", channel)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::UnixListener;

    #[tokio::test]
    async fn connects_to_unix_socket_in_dir() {
        let dir = tempfile::tempdir().unwrap();
        let listener = UnixListener::bind(dir.path().join("ab2sd-1")).unwrap();
        let connector = PipeConnector::with_dir(dir.path());

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            stream.write_all(b"[]").await.unwrap();
        });

        let mut reader = connector.connect("ab2sd-1").await.unwrap();
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await.unwrap();
        server.await.unwrap();

        assert_eq!(buf, b"[]");
    }

    #[tokio::test]
    async fn missing_socket_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let connector = PipeConnector::with_dir(dir.path());
        assert!(connector.connect("nobody-home").await.is_err());
    }

    #[test]
    fn address_joins_dir_and_channel() {
        let connector = PipeConnector::with_dir("/run/telemetry");
        assert_eq!(connector.address("ab2sd-1"), "/run/telemetry/ab2sd-1");
    }
}
