use anyhow::Result;
use clap::Parser;

use site_mirror::logging::init_logging;
use site_mirror::{MirrorCommand, WebsiteMirror};

#[tokio::main]
async fn main() -> Result<()> {
    // Settings may also come from a .env file in the working directory.
    dotenv::dotenv().ok();

    let args = MirrorCommand::parse();
    init_logging(args.verbose);

    let mirror = WebsiteMirror::new(args.into_config()?)?;
    mirror.mirror_website().await?;

    Ok(())
}
