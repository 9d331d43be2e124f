// Author: Dustin Pilgrim
// License: MIT

use clap::Parser;

use idlecheck::{app, cli};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = cli::Args::parse();
    app::run(args).await
}
