use std::time::Duration;

use log::debug;
use pnet::util::MacAddr;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};
use crate::frame::request_frame;
use crate::scope::NetworkScope;

/// Sweeps a network with broadcast ARP requests on a fixed interval.
#[derive(Debug)]
pub struct Transmitter<W> {
    sink: W,
    mac: MacAddr,
    scope: NetworkScope,
    interval: Duration,
}

impl<W> Transmitter<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(sink: W, mac: MacAddr, scope: NetworkScope, interval: Duration) -> Self {
        Self {
            sink,
            mac,
            scope,
            interval,
        }
    }

    /// Writes one request per address of the scope, in ascending order.
    ///
    /// Returns the number of requests written.
    ///
    /// # Errors
    /// The first failed write aborts the sweep.
    pub async fn sweep(&mut self) -> Result<usize> {
        let mut sent = 0;
        for target_ip in self.scope.addresses() {
            let frame = request_frame(self.mac, self.scope.addr(), target_ip)?;
            self.sink.write_all(&frame).await.map_err(Error::Transmit)?;
            sent += 1;
        }
        debug!("sent {} ARP requests for {}", sent, self.scope.net());
        Ok(sent)
    }

    /// Sweeps, then sleeps for the interval, until a sweep fails.
    pub async fn run(&mut self) -> Error {
        loop {
            if let Err(err) = self.sweep().await {
                return err;
            }
            tokio::time::sleep(self.interval).await;
        }
    }
}
