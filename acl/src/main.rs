use clap::Parser;
use coronado_acl::{dal_init, run, setup_tracing, Args};
use tracing::trace;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    setup_tracing(args.log_level, args.log_format)?;

    trace!(command = ?args.command, "parsed args");

    let dal = dal_init(&args.db_connection_uri).await?;
    let output = run(dal.as_ref(), args.command).await?;

    println!("{output}");

    Ok(())
}
