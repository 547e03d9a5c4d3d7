use auditfs::{umask, FileLog, PassthroughFs, Server};
use auditfs_ops::{Capabilities, Capability, OperationTable};

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use structopt::StructOpt;
use tracing::debug;

#[derive(Debug, StructOpt)]
struct Args {
    #[structopt(name = "TARGET", help = "The mount point of auditfs")]
    target: PathBuf,

    #[structopt(
        short = "l",
        long = "log-file",
        default_value = "logfile.txt",
        help = "The file every call is appended to"
    )]
    log_file: PathBuf,

    #[structopt(short = "o", long, help = "Allow other users to access the mount")]
    allow_other: bool,

    #[structopt(long, default_value = "auditfs", help = "The source name of the mount")]
    fsname: String,

    #[structopt(long, help = "Disable utimens")]
    no_utimens: bool,

    #[structopt(long, help = "Disable fallocate")]
    no_fallocate: bool,

    #[structopt(long, help = "Disable extended attributes")]
    no_xattr: bool,
}

impl Args {
    fn capabilities(&self) -> Capabilities {
        let mut caps = Capabilities::detect();
        if self.no_utimens {
            caps = caps.without(Capability::Utimens);
        }
        if self.no_fallocate {
            caps = caps.without(Capability::Fallocate);
        }
        if self.no_xattr {
            caps = caps.without(Capability::XAttr);
        }
        caps
    }
}

fn setup_tracing() {
    use tracing_error::ErrorLayer;
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    tracing_subscriber::fmt()
        .event_format(fmt::format::Format::default().pretty())
        .with_env_filter(EnvFilter::from_default_env())
        .with_timer(fmt::time::ChronoLocal::rfc_3339())
        .finish()
        .with(ErrorLayer::default())
        .init();
}

fn main() -> Result<()> {
    setup_tracing();
    let args = Args::from_args();
    async_std::task::block_on(run(args))?;
    Ok(())
}

#[allow(clippy::unit_arg)]
#[tracing::instrument(err)]
async fn run(args: Args) -> Result<()> {
    let cwd = env::current_dir()?;
    let target = cwd.join(&args.target);
    let log_file = cwd.join(&args.log_file);

    debug!(target = %target.display(), log_file = %log_file.display());

    let log = FileLog::open(&log_file)
        .with_context(|| format!("failed to open the call log {}", log_file.display()))?;

    let _ = umask(0);

    let table = OperationTable::new(args.capabilities());
    debug!(?table);

    let fs = PassthroughFs::new(Arc::new(log), table);
    let server = Server::mount(target, fs)
        .fs_name(args.fsname.as_str())
        .allow_other(args.allow_other)
        .initialize()
        .await
        .context("failed to mount")?;
    server.run().await?;

    Ok(())
}
