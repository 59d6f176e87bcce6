//! Dedicated writer task for outgoing commands.
//!
//! Commands arrive pre-encoded as one contiguous `Bytes` buffer each and
//! are funneled through an mpsc channel to a single task owning the write
//! half of the connection. The protocol carries no request ids, so FIFO
//! channel order is also wire order, and because every command is a single
//! buffer, no two commands' bytes can interleave.
//!
//! ```text
//! caller 1 ─┐
//! caller 2 ─┼─► mpsc::Sender<Bytes> ─► writer task ─► socket
//! caller N ─┘
//! ```
//!
//! Ready commands are batched into a single `write_vectored` call.

use std::io::IoSlice;

use bytes::Bytes;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{BeanlineError, Result};

/// Capacity of the writer channel; filling it applies backpressure to
/// submitters.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Maximum commands to coalesce into one write call.
const MAX_BATCH_SIZE: usize = 64;

/// Handle for queueing encoded commands to the writer task.
///
/// Cheaply cloneable; dropping every handle shuts the task down.
#[derive(Debug, Clone)]
pub struct WriterHandle {
    tx: mpsc::Sender<Bytes>,
}

impl WriterHandle {
    /// Queue one encoded command for writing.
    ///
    /// Waits when the channel is full. Fails with
    /// [`BeanlineError::ConnectionClosed`] once the writer task has exited.
    pub async fn send(&self, command: Bytes) -> Result<()> {
        self.tx
            .send(command)
            .await
            .map_err(|_| BeanlineError::ConnectionClosed)
    }
}

/// Spawn the writer task for the given write half.
pub fn spawn_writer_task<W>(writer: W) -> (WriterHandle, JoinHandle<Result<()>>)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(DEFAULT_CHANNEL_CAPACITY);
    let task = tokio::spawn(writer_loop(rx, writer));
    (WriterHandle { tx }, task)
}

/// Main writer loop - receives commands and writes them to the socket.
async fn writer_loop<W>(mut rx: mpsc::Receiver<Bytes>, mut writer: W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    loop {
        let first = match rx.recv().await {
            Some(command) => command,
            // All handles dropped, clean shutdown.
            None => return Ok(()),
        };

        let mut batch = Vec::with_capacity(MAX_BATCH_SIZE);
        batch.push(first);
        while batch.len() < MAX_BATCH_SIZE {
            match rx.try_recv() {
                Ok(command) => batch.push(command),
                Err(_) => break,
            }
        }

        write_batch(&mut writer, &batch).await?;
    }
}

/// Write a batch of commands with scatter/gather I/O.
async fn write_batch<W>(writer: &mut W, batch: &[Bytes]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    if batch.is_empty() {
        return Ok(());
    }

    let total: usize = batch.iter().map(Bytes::len).sum();
    let slices: Vec<IoSlice<'_>> = batch.iter().map(|b| IoSlice::new(b)).collect();

    let mut written = writer.write_vectored(&slices).await?;
    if written == 0 && total > 0 {
        return Err(BeanlineError::Io(std::io::Error::new(
            std::io::ErrorKind::WriteZero,
            "write_vectored returned 0",
        )));
    }

    // Partial write: rebuild slices past the bytes already accepted.
    while written < total {
        let remaining = remaining_slices(batch, written);
        let n = writer.write_vectored(&remaining).await?;
        if n == 0 {
            return Err(BeanlineError::Io(std::io::Error::new(
                std::io::ErrorKind::WriteZero,
                "write_vectored returned 0",
            )));
        }
        written += n;
    }

    writer.flush().await?;
    Ok(())
}

/// Build the IoSlice array for the bytes still unwritten after `skip`.
fn remaining_slices(batch: &[Bytes], skip: usize) -> Vec<IoSlice<'_>> {
    let mut slices = Vec::with_capacity(batch.len());
    let mut offset = 0;
    for command in batch {
        let end = offset + command.len();
        if skip < end {
            let start = skip.saturating_sub(offset);
            slices.push(IoSlice::new(&command[start..]));
        }
        offset = end;
    }
    slices
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::time::Duration;
    use tokio::io::duplex;

    #[tokio::test]
    async fn test_send_reaches_the_socket() {
        let (client, mut server) = duplex(4096);
        let (handle, _task) = spawn_writer_task(client);

        handle.send(Bytes::from_static(b"reserve\r\n")).await.unwrap();

        let mut buf = vec![0u8; 64];
        let n = tokio::io::AsyncReadExt::read(&mut server, &mut buf)
            .await
            .unwrap();
        assert_eq!(&buf[..n], b"reserve\r\n");
    }

    #[tokio::test]
    async fn test_commands_arrive_in_submission_order() {
        let (client, mut server) = duplex(4096);
        let (handle, _task) = spawn_writer_task(client);

        for i in 0..10u64 {
            handle
                .send(Bytes::from(format!("delete {}\r\n", i)))
                .await
                .unwrap();
        }
        tokio::time::sleep(Duration::from_millis(20)).await;

        let mut expected = Vec::new();
        for i in 0..10u64 {
            expected.extend_from_slice(format!("delete {}\r\n", i).as_bytes());
        }
        let mut buf = vec![0u8; expected.len()];
        tokio::io::AsyncReadExt::read_exact(&mut server, &mut buf)
            .await
            .unwrap();
        assert_eq!(buf, expected);
    }

    #[tokio::test]
    async fn test_write_batch_multiple() {
        let mut buf = Cursor::new(Vec::new());
        let batch = vec![
            Bytes::from_static(b"use jobs\r\n"),
            Bytes::from_static(b"put 0 0 60 2\r\nhi\r\n"),
        ];

        write_batch(&mut buf, &batch).await.unwrap();

        assert_eq!(buf.into_inner(), b"use jobs\r\nput 0 0 60 2\r\nhi\r\n");
    }

    #[test]
    fn test_remaining_slices_no_skip() {
        let batch = vec![Bytes::from_static(b"abc"), Bytes::from_static(b"defg")];
        let slices = remaining_slices(&batch, 0);
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].len(), 3);
        assert_eq!(slices[1].len(), 4);
    }

    #[test]
    fn test_remaining_slices_mid_command() {
        let batch = vec![Bytes::from_static(b"abc"), Bytes::from_static(b"defg")];
        let slices = remaining_slices(&batch, 4);
        assert_eq!(slices.len(), 1);
        assert_eq!(&slices[0][..], b"efg");
    }

    #[test]
    fn test_remaining_slices_at_boundary() {
        let batch = vec![Bytes::from_static(b"abc"), Bytes::from_static(b"defg")];
        let slices = remaining_slices(&batch, 3);
        assert_eq!(slices.len(), 1);
        assert_eq!(&slices[0][..], b"defg");
    }

    #[tokio::test]
    async fn test_shutdown_on_handle_drop() {
        let (client, _server) = duplex(4096);
        let (handle, task) = spawn_writer_task(client);

        drop(handle);

        let result = task.await.unwrap();
        assert!(result.is_ok());
    }
}
