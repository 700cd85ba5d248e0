use log::debug;
use pnet::util::MacAddr;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::constants::CAPTURE_BUF_LEN;
use crate::error::{Error, Result};
use crate::frame::accept_reply;
use crate::node::NodeSender;

/// Forwards ARP replies seen on an interface to the node queue.
///
/// Replies are accepted whether or not they answer one of our requests.
#[derive(Debug)]
pub struct Receiver<R> {
    source: R,
    mac: MacAddr,
    queue: NodeSender,
}

impl<R> Receiver<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(source: R, mac: MacAddr, queue: NodeSender) -> Self {
        Self { source, mac, queue }
    }

    /// Reads frames until the capture fails or ends.
    pub async fn listen(&mut self) -> Result<()> {
        let mut buf = vec![0; CAPTURE_BUF_LEN];
        loop {
            let read_bytes = self.source.read(&mut buf).await.map_err(Error::Receive)?;
            if read_bytes == 0 {
                return Err(Error::CaptureClosed);
            }
            let Some(node) = accept_reply(&buf[..read_bytes], self.mac) else {
                continue;
            };
            debug!("ARP reply from {} ({})", node.ip, node.mac);
            self.queue
                .send(node)
                .map_err(|_| Error::Opaque("node queue closed".into()))?;
        }
    }
}
