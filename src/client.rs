//! Client - connection lifecycle and one async method per protocol verb.
//!
//! A [`Client`] owns one connection. Connecting spawns two tasks, exactly
//! one of each per connection:
//! 1. a writer task owning the write half (see [`crate::writer`])
//! 2. a read task owning the read half, the frame assembler and the
//!    dispatch into the command queue
//!
//! Submitting a command pushes a [`PendingCommand`] onto the queue and
//! hands the encoded bytes to the writer under one lock, so queue order
//! always equals wire order even with many concurrent callers. Callers may
//! pipeline freely: issuing a command never waits for earlier responses,
//! only for its own.
//!
//! # Example
//!
//! ```ignore
//! use beanline::Client;
//!
//! #[tokio::main]
//! async fn main() -> beanline::Result<()> {
//!     let client = Client::connect(beanline::DEFAULT_ADDR).await?;
//!     client.use_tube("emails").await?;
//!     let id = client.put(b"welcome-mail:42").await?;
//!     println!("queued job {id}");
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;

use crate::dispatch::{verbs, CommandQueue, PendingCommand, Reply, Step};
use crate::error::{BeanlineError, Result};
use crate::job::{Job, JobId};
use crate::protocol::wire::{self, DEFAULT_DELAY, DEFAULT_PRIORITY, DEFAULT_TTR};
use crate::protocol::FrameBuffer;
use crate::stats::Stats;
use crate::writer::{spawn_writer_task, WriterHandle};

/// The protocol's conventional default address.
pub const DEFAULT_ADDR: &str = "127.0.0.1:11300";

/// Size of the read buffer handed to the socket.
const READ_BUF_SIZE: usize = 8 * 1024;

/// Job scheduling options for `put`.
///
/// The defaults match what the encoder substitutes when a caller uses
/// [`Client::put`]: most-urgent priority, no delay, sixty seconds to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PutOptions {
    /// Priority; 0 is most urgent.
    pub priority: u32,
    /// Seconds the job stays delayed before becoming ready.
    pub delay: u32,
    /// Seconds a reserving worker gets before the job is released back.
    pub ttr: u32,
}

impl Default for PutOptions {
    fn default() -> Self {
        Self {
            priority: DEFAULT_PRIORITY,
            delay: DEFAULT_DELAY,
            ttr: DEFAULT_TTR,
        }
    }
}

/// A connected client for one server connection.
pub struct Client {
    queue: Arc<Mutex<CommandQueue>>,
    writer: WriterHandle,
    _writer_task: JoinHandle<Result<()>>,
    _read_task: JoinHandle<()>,
}

impl Client {
    /// Connect over TCP.
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Ok(Self::from_stream(stream))
    }

    /// Build a client on top of an already-established byte stream.
    ///
    /// Tests drive this with `tokio::io::duplex`; production code normally
    /// wants [`Client::connect`].
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, write_half) = tokio::io::split(stream);
        let (writer, writer_task) = spawn_writer_task(write_half);
        let queue = Arc::new(Mutex::new(CommandQueue::new()));
        let read_task = tokio::spawn(read_loop(reader, queue.clone()));
        Self {
            queue,
            writer,
            _writer_task: writer_task,
            _read_task: read_task,
        }
    }

    /// Submit a job to the currently used tube with default options.
    pub async fn put(&self, body: impl AsRef<[u8]>) -> Result<JobId> {
        self.put_with(body, PutOptions::default()).await
    }

    /// Submit a job with explicit priority/delay/ttr.
    pub async fn put_with(&self, body: impl AsRef<[u8]>, opts: PutOptions) -> Result<JobId> {
        let bytes = wire::put(opts.priority, opts.delay, opts.ttr, body.as_ref());
        match self.submit(bytes, verbs::put()).await? {
            Reply::Inserted(id) => Ok(id),
            other => Err(mismatch(other)),
        }
    }

    /// Serialize a value as JSON and submit it as a job body.
    pub async fn put_json<T: Serialize>(&self, value: &T) -> Result<JobId> {
        let body = serde_json::to_vec(value)?;
        self.put(body).await
    }

    /// Reserve the next ready job and decode its body as UTF-8 text.
    ///
    /// Blocks server-side until a job is ready on a watched tube.
    pub async fn reserve(&self) -> Result<(JobId, String)> {
        let job = self.reserve_raw().await?;
        let body = job.payload_str()?;
        Ok((job.id, body))
    }

    /// Reserve the next ready job, keeping the body as raw bytes.
    pub async fn reserve_raw(&self) -> Result<Job> {
        match self.submit(wire::reserve(), verbs::reserve()).await? {
            Reply::Job(job) => Ok(job),
            other => Err(mismatch(other)),
        }
    }

    /// Reserve with a server-side timeout in seconds.
    ///
    /// A timeout of 0 returns immediately. Expiry surfaces as a protocol
    /// error carrying `TIMED_OUT`; no client-side timer is involved.
    pub async fn reserve_with_timeout(&self, seconds: u32) -> Result<Job> {
        let bytes = wire::reserve_with_timeout(seconds);
        match self.submit(bytes, verbs::reserve_with_timeout()).await? {
            Reply::Job(job) => Ok(job),
            other => Err(mismatch(other)),
        }
    }

    /// Reserve a specific job by id, bypassing tube watching.
    pub async fn reserve_job(&self, id: JobId) -> Result<Job> {
        match self.submit(wire::reserve_job(id), verbs::reserve_job()).await? {
            Reply::Job(job) => Ok(job),
            other => Err(mismatch(other)),
        }
    }

    /// Delete a job.
    pub async fn delete(&self, id: JobId) -> Result<()> {
        self.unit(wire::delete(id), verbs::delete()).await
    }

    /// Release a reserved job back to the ready (or delayed) state.
    pub async fn release(&self, id: JobId, priority: u32, delay: u32) -> Result<()> {
        self.unit(wire::release(id, priority, delay), verbs::release())
            .await
    }

    /// Bury a reserved job.
    pub async fn bury(&self, id: JobId, priority: u32) -> Result<()> {
        self.unit(wire::bury(id, priority), verbs::bury()).await
    }

    /// Refresh a reserved job's time-to-run.
    pub async fn touch(&self, id: JobId) -> Result<()> {
        self.unit(wire::touch(id), verbs::touch()).await
    }

    /// Select the tube subsequent `put`s go into. Returns the tube name.
    pub async fn use_tube(&self, name: &str) -> Result<String> {
        match self.submit(wire::use_tube(name)?, verbs::use_tube()).await? {
            Reply::Using(tube) => Ok(tube),
            other => Err(mismatch(other)),
        }
    }

    /// Add a tube to the watch list. Returns the watched-tube count.
    pub async fn watch(&self, name: &str) -> Result<u32> {
        match self.submit(wire::watch(name)?, verbs::watch()).await? {
            Reply::Watching(count) => Ok(count),
            other => Err(mismatch(other)),
        }
    }

    /// Remove a tube from the watch list. Returns the watched-tube count.
    ///
    /// Removing the last watched tube is refused by the server with
    /// `NOT_IGNORED`.
    pub async fn ignore(&self, name: &str) -> Result<u32> {
        match self.submit(wire::ignore(name)?, verbs::ignore()).await? {
            Reply::Watching(count) => Ok(count),
            other => Err(mismatch(other)),
        }
    }

    /// Peek at a job by id without reserving it.
    pub async fn peek(&self, id: JobId) -> Result<Job> {
        self.peeked(wire::peek(id)).await
    }

    /// Peek at the next ready job in the used tube.
    pub async fn peek_ready(&self) -> Result<Job> {
        self.peeked(wire::peek_ready()).await
    }

    /// Peek at the delayed job with the shortest remaining delay.
    pub async fn peek_delayed(&self) -> Result<Job> {
        self.peeked(wire::peek_delayed()).await
    }

    /// Peek at the oldest buried job.
    pub async fn peek_buried(&self) -> Result<Job> {
        self.peeked(wire::peek_buried()).await
    }

    /// Kick at most `bound` buried (or else delayed) jobs back to ready.
    /// Returns the number of jobs actually kicked.
    pub async fn kick(&self, bound: u64) -> Result<u64> {
        match self.submit(wire::kick(bound), verbs::kick()).await? {
            Reply::Kicked(count) => Ok(count),
            other => Err(mismatch(other)),
        }
    }

    /// Kick a single job by id.
    pub async fn kick_job(&self, id: JobId) -> Result<()> {
        self.unit(wire::kick_job(id), verbs::kick_job()).await
    }

    /// Pause a tube: no jobs are handed out from it for `delay` seconds.
    pub async fn pause_tube(&self, name: &str, delay: u32) -> Result<()> {
        self.unit(wire::pause_tube(name, delay)?, verbs::pause_tube())
            .await
    }

    /// Server-wide statistics.
    pub async fn stats(&self) -> Result<Stats> {
        self.statistics(wire::stats(), verbs::server_stats()).await
    }

    /// Statistics for one tube.
    pub async fn stats_tube(&self, name: &str) -> Result<Stats> {
        self.statistics(wire::stats_tube(name)?, verbs::scoped_stats())
            .await
    }

    /// Statistics for one job.
    pub async fn stats_job(&self, id: JobId) -> Result<Stats> {
        self.statistics(wire::stats_job(id), verbs::scoped_stats())
            .await
    }

    /// Names of all tubes on the server.
    pub async fn list_tubes(&self) -> Result<Vec<String>> {
        self.tube_list(wire::list_tubes()).await
    }

    /// Names of the tubes this connection watches.
    pub async fn list_tubes_watched(&self) -> Result<Vec<String>> {
        self.tube_list(wire::list_tubes_watched()).await
    }

    /// Name of the tube this connection puts into.
    pub async fn list_tube_used(&self) -> Result<String> {
        match self
            .submit(wire::list_tube_used(), verbs::list_tube_used())
            .await?
        {
            Reply::Using(tube) => Ok(tube),
            other => Err(mismatch(other)),
        }
    }

    /// Number of commands currently awaiting responses.
    pub async fn in_flight(&self) -> usize {
        self.queue.lock().await.len()
    }

    async fn unit(&self, bytes: Bytes, steps: Vec<Step>) -> Result<()> {
        match self.submit(bytes, steps).await? {
            Reply::Done => Ok(()),
            other => Err(mismatch(other)),
        }
    }

    async fn peeked(&self, bytes: Bytes) -> Result<Job> {
        match self.submit(bytes, verbs::peek()).await? {
            Reply::Job(job) => Ok(job),
            other => Err(mismatch(other)),
        }
    }

    async fn tube_list(&self, bytes: Bytes) -> Result<Vec<String>> {
        match self.submit(bytes, verbs::list_tubes()).await? {
            Reply::Tubes(tubes) => Ok(tubes),
            other => Err(mismatch(other)),
        }
    }

    async fn statistics(&self, bytes: Bytes, steps: Vec<Step>) -> Result<Stats> {
        match self.submit(bytes, steps).await? {
            Reply::Stats(stats) => Ok(stats),
            other => Err(mismatch(other)),
        }
    }

    /// Enqueue a pending command and hand its bytes to the writer.
    ///
    /// The queue lock spans both so that queue order equals wire order;
    /// once the bytes are queued there is no cancellation, only disregard
    /// of the eventual reply.
    async fn submit(&self, bytes: Bytes, steps: Vec<Step>) -> Result<Reply> {
        let (tx, rx) = oneshot::channel();
        {
            let mut queue = self.queue.lock().await;
            queue.push(PendingCommand::new(steps, tx));
            self.writer.send(bytes).await?;
        }
        rx.await.map_err(|_| BeanlineError::ConnectionClosed)?
    }
}

fn mismatch(reply: Reply) -> BeanlineError {
    BeanlineError::UnexpectedResponse(format!("reply kind mismatch: {reply:?}"))
}

/// Read task: socket chunks in, frames dispatched, pending commands failed
/// on disconnect.
async fn read_loop<R>(mut reader: R, queue: Arc<Mutex<CommandQueue>>)
where
    R: AsyncRead + Unpin,
{
    let mut assembler = FrameBuffer::new();
    let mut buf = vec![0u8; READ_BUF_SIZE];

    loop {
        match reader.read(&mut buf).await {
            // Connection closed by the server.
            Ok(0) => break,
            Ok(n) => {
                assembler.extend(&buf[..n]);
                let mut queue = queue.lock().await;
                while let Some(frame) = assembler.next_frame() {
                    queue.dispatch(frame, &mut assembler);
                }
            }
            Err(err) => {
                tracing::error!("read loop error: {err}");
                break;
            }
        }
    }

    queue.lock().await.fail_all();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn test_put_round_trip_over_duplex() {
        let (near, mut far) = duplex(4096);
        let client = Client::from_stream(near);

        let server = tokio::spawn(async move {
            let mut buf = vec![0u8; b"put 0 0 60 5\r\nhello\r\n".len()];
            far.read_exact(&mut buf).await.unwrap();
            assert_eq!(buf, b"put 0 0 60 5\r\nhello\r\n");
            far.write_all(b"INSERTED 1\r\n").await.unwrap();
            far
        });

        let id = client.put(b"hello").await.unwrap();
        assert_eq!(id, 1);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_usage_error_never_reaches_the_wire() {
        let (near, _far) = duplex(4096);
        let client = Client::from_stream(near);

        let err = client.use_tube("").await.unwrap_err();
        assert!(matches!(err, BeanlineError::Usage(_)));
        assert_eq!(client.in_flight().await, 0);
    }

    #[test]
    fn test_put_options_defaults() {
        let opts = PutOptions::default();
        assert_eq!(opts.priority, 0);
        assert_eq!(opts.delay, 0);
        assert_eq!(opts.ttr, 60);
    }
}
