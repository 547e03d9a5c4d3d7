use crate::host::Host;

use auditfs_ops::FileSystem;

use std::fmt;
use std::io;
use std::path::PathBuf;

use blocking::unblock;
use fuser::{MountOption, Session};
use tracing::debug;

pub struct ServerBuilder<F> {
    mount_point: PathBuf,
    fs: F,
    fs_name: String,
    allow_other: bool,
}

impl<F> ServerBuilder<F>
where
    F: FileSystem + 'static,
{
    #[must_use]
    pub fn new(mount_point: PathBuf, fs: F) -> Self {
        Self {
            mount_point,
            fs,
            fs_name: "auditfs".to_owned(),
            allow_other: false,
        }
    }

    /// Sets the name shown as the source of the mount
    #[must_use]
    pub fn fs_name(mut self, fs_name: impl Into<String>) -> Self {
        self.fs_name = fs_name.into();
        self
    }

    /// Lets users other than the owner access the mount
    #[must_use]
    pub const fn allow_other(mut self, allow_other: bool) -> Self {
        self.allow_other = allow_other;
        self
    }

    fn options(&self) -> Vec<MountOption> {
        let mut options = vec![
            MountOption::FSName(self.fs_name.clone()),
            MountOption::Subtype("auditfs".to_owned()),
        ];
        if self.allow_other {
            options.push(MountOption::AllowOther);
        }
        options
    }

    /// Mounts the filesystem
    pub async fn initialize(self) -> io::Result<Server<F>> {
        let options = self.options();
        let mount_point = self.mount_point;
        debug!(?mount_point, ?options, "mounting");

        let host = Host::new(self.fs);
        let (session, mount_point) = unblock(move || {
            let session = Session::new(host, &mount_point, &options)?;
            <io::Result<_>>::Ok((session, mount_point))
        })
        .await?;

        debug!(?mount_point, "mounted");

        Ok(Server {
            session,
            mount_point,
        })
    }
}

pub struct Server<F>
where
    F: FileSystem + 'static,
{
    session: Session<Host<F>>,
    mount_point: PathBuf,
}

impl<F> fmt::Debug for Server<F>
where
    F: FileSystem + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("mount_point", &self.mount_point)
            .finish()
    }
}

impl<F> Server<F>
where
    F: FileSystem + 'static,
{
    #[must_use]
    pub fn mount(mount_point: PathBuf, fs: F) -> ServerBuilder<F> {
        ServerBuilder::new(mount_point, fs)
    }

    /// Serves requests until the filesystem is unmounted
    pub async fn run(self) -> io::Result<()> {
        let Self {
            mut session,
            mount_point,
        } = self;

        debug!(?mount_point, "serving");
        unblock(move || session.run()).await?;
        debug!(?mount_point, "unmounted");

        Ok(())
    }
}
