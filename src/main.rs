use clap::Parser;

use crate::opts::Opts;

mod engine;
mod graph;
mod helpers;
mod math;
mod opts;
mod prelude;
mod tracing;
mod trainer;

pub use prelude::Result;

#[tokio::main]
async fn main() -> Result {
    let opts = Opts::parse();
    let _sentry_guard =
        crate::tracing::init(opts.sentry_dsn, opts.traces_sample_rate, opts.trainer.debug)?;
    trainer::run(opts.trainer).await?;
    Ok(())
}
