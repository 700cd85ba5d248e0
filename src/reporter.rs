use std::error::Error as StdError;
use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use log::warn;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode, Url};

use crate::config::ReportSink;
use crate::dns::DnsCache;
use crate::error::{Error, Result};
use crate::node::NodeSnapshot;

/// What happened to a flushed snapshot.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Delivery {
    /// The snapshot was empty and nothing was sent.
    Skipped,
    Printed,
    Posted,
    /// Delivery failed and the snapshot was dropped.
    Failed,
}

/// Delivers node snapshots to stdout or an HTTP endpoint.
///
/// Failures are logged and the snapshot is dropped; nothing is retried.
#[derive(Debug, Clone)]
pub struct Reporter {
    sink: ReportSink,
    client: Client,
    console: Console,
}

/// Writer behind [`ReportSink::Stdout`].
#[derive(Clone)]
struct Console(Arc<Mutex<Box<dyn Write + Send>>>);

impl Console {
    fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self(Arc::new(Mutex::new(Box::new(writer))))
    }

    fn print(&self, body: &str) -> Result<()> {
        let mut out = self
            .0
            .lock()
            .map_err(|_| Error::Stdout(io::Error::other("console lock poisoned")))?;
        writeln!(out, "{}", body).map_err(Error::Stdout)?;
        out.flush().map_err(Error::Stdout)
    }
}

impl fmt::Debug for Console {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Console")
    }
}

impl Reporter {
    /// Creates a reporter for `sink`, resolving the endpoint through
    /// `dns_cache` when one is given.
    pub fn new(sink: ReportSink, dns_cache: Option<DnsCache>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(cache) = dns_cache {
            builder = builder.dns_resolver(std::sync::Arc::new(cache));
        }
        Ok(Self {
            sink,
            client: builder.build()?,
            console: Console::new(io::stdout()),
        })
    }

    /// Prints stdout reports to `writer` instead.
    pub fn with_console<W: Write + Send + 'static>(mut self, writer: W) -> Self {
        self.console = Console::new(writer);
        self
    }

    pub async fn report(&self, snapshot: &NodeSnapshot) -> Delivery {
        if snapshot.is_empty() {
            return Delivery::Skipped;
        }
        match self.deliver(snapshot).await {
            Ok(delivery) => delivery,
            Err(err) => {
                warn!("{}", describe(&err));
                Delivery::Failed
            }
        }
    }

    async fn deliver(&self, snapshot: &NodeSnapshot) -> Result<Delivery> {
        let body = snapshot.to_json()?;
        match &self.sink {
            ReportSink::Stdout => {
                self.console.print(&body)?;
                Ok(Delivery::Printed)
            }
            ReportSink::Http(url) => {
                self.post(url, body).await?;
                Ok(Delivery::Posted)
            }
        }
    }

    async fn post(&self, url: &Url, body: String) -> Result<()> {
        let response = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Status { status, body });
        }
        Ok(())
    }
}

/// Renders `err` with every cause not already part of its message.
pub(crate) fn describe(err: &Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_message = cause.to_string();
        if !message.contains(&cause_message) {
            message.push_str(": ");
            message.push_str(&cause_message);
        }
        source = cause.source();
    }
    message
}
