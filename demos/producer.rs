//! Producer demo: submit a handful of jobs to a local server.
//!
//! Run with a beanstalkd instance on the default port:
//! `cargo run --example producer`

use beanline::{Client, PutOptions, DEFAULT_ADDR};

#[tokio::main(flavor = "current_thread")]
async fn main() -> beanline::Result<()> {
    tracing_subscriber::fmt::init();

    let client = Client::connect(DEFAULT_ADDR).await?;
    client.use_tube("demo").await?;

    for n in 0..5u32 {
        let id = client.put(format!("job number {n}")).await?;
        println!("queued job {id}");
    }

    // A delayed, low-urgency job.
    let id = client
        .put_with(
            b"cleanup",
            PutOptions {
                priority: 1000,
                delay: 30,
                ttr: 60,
            },
        )
        .await?;
    println!("queued delayed job {id}");

    let stats = client.stats_tube("demo").await?;
    println!("tube stats: {stats:?}");
    Ok(())
}
