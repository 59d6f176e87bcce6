//! Worker demo: drain jobs from a tube until it runs dry.
//!
//! Run with a beanstalkd instance on the default port:
//! `cargo run --example worker`

use beanline::{BeanlineError, Client, DEFAULT_ADDR};

#[tokio::main(flavor = "current_thread")]
async fn main() -> beanline::Result<()> {
    tracing_subscriber::fmt::init();

    let client = Client::connect(DEFAULT_ADDR).await?;
    client.watch("demo").await?;
    client.ignore("default").await?;

    loop {
        let job = match client.reserve_with_timeout(2).await {
            Ok(job) => job,
            Err(BeanlineError::Protocol(line)) if line == "TIMED_OUT" => {
                println!("tube is empty, done");
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        println!("job {}: {:?}", job.id, job.payload_str());
        client.delete(job.id).await?;
    }
}
