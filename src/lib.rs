//! # beanline
//!
//! Async client for the beanstalkd work-queue protocol with command
//! pipelining.
//!
//! The protocol is a hybrid of newline-delimited ASCII and raw binary:
//! every command and response starts with a `\r\n`-terminated line, and
//! job bodies follow as raw bytes of a length declared in that line. The
//! server answers strictly in the order commands were received, so the
//! client pipelines freely and correlates responses by FIFO position alone.
//!
//! ## Architecture
//!
//! - **Wire codec** ([`protocol::wire`], [`protocol::status`]): pure
//!   command encoding and status-line classification
//! - **Frame assembler** ([`protocol::FrameBuffer`]): turns arbitrarily
//!   fragmented socket chunks into discrete line/payload frames
//! - **Execution queue** ([`dispatch`]): feeds frames to the oldest
//!   in-flight command's next handler step
//! - **Client** ([`Client`]): one async method per protocol verb
//!
//! ## Example
//!
//! ```ignore
//! use beanline::Client;
//!
//! #[tokio::main]
//! async fn main() -> beanline::Result<()> {
//!     let client = Client::connect(beanline::DEFAULT_ADDR).await?;
//!     client.watch("emails").await?;
//!     let (id, body) = client.reserve().await?;
//!     println!("job {id}: {body}");
//!     client.delete(id).await?;
//!     Ok(())
//! }
//! ```

pub mod dispatch;
pub mod error;
pub mod job;
pub mod protocol;
pub mod stats;

mod client;
mod writer;

pub use client::{Client, PutOptions, DEFAULT_ADDR};
pub use error::{BeanlineError, Result};
pub use job::{Job, JobId};
pub use stats::Stats;
