use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use rusqlite::Connection;
use tracing::debug;

use crate::error::{Error, Result};

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// A SQLite connection opened on first use.
///
/// Opening is bounded by the connect timeout: lock contention past it, or a
/// database that cannot be opened at all, surfaces as
/// [`Error::StoreUnavailable`] instead of blocking.
pub struct LazyConnection {
    path: PathBuf,
    connect_timeout: Duration,
    #[cfg_attr(not(unix), allow(dead_code))]
    private: bool,
    conn: Mutex<Option<Connection>>,
}

impl LazyConnection {
    pub fn new<P: AsRef<Path>>(path: P, connect_timeout: Duration) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            connect_timeout,
            private: false,
            conn: Mutex::new(None),
        }
    }

    /// Keeps the database file and its WAL sidecars readable by the owner only.
    #[must_use]
    pub fn private(mut self) -> Self {
        self.private = true;
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Runs `f` against the connection, opening it first if needed.
    pub fn with_conn<T>(&self, f: impl FnOnce(&mut Connection) -> Result<T>) -> Result<T> {
        let mut guard = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        if guard.is_none() {
            *guard = Some(self.connect()?);
        }
        match guard.as_mut() {
            Some(conn) => f(conn),
            None => Err(self.unavailable("connection was not established")),
        }
    }

    fn connect(&self) -> Result<Connection> {
        // SQLite creates -wal and -shm with the mode of the main file.
        #[cfg(unix)]
        if self.private {
            restrict_permissions(&self.path).map_err(|e| self.unavailable(e))?;
        }

        let conn = Connection::open(&self.path).map_err(|e| self.unavailable(e))?;

        conn.busy_timeout(self.connect_timeout)
            .map_err(|e| self.unavailable(e))?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| self.unavailable(e))?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map_err(|e| self.unavailable(e))?;

        #[cfg(unix)]
        if self.private {
            restrict_permissions(&self.path).map_err(|e| self.unavailable(e))?;
        }

        debug!(path = %self.path.display(), "opened database connection");
        Ok(conn)
    }

    fn unavailable(&self, reason: impl std::fmt::Display) -> Error {
        Error::StoreUnavailable(format!("{}: {reason}", self.path.display()))
    }
}

/// Creates the database file with mode 0600 if missing, and forces 0600 on
/// it and on any WAL sidecars already present.
#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::fs::{self, OpenOptions, Permissions};
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    OpenOptions::new()
        .create(true)
        .append(true)
        .mode(0o600)
        .open(path)?;

    for suffix in ["", "-wal", "-shm"] {
        let mut file = path.as_os_str().to_owned();
        file.push(suffix);
        let file = PathBuf::from(file);
        if file.exists() {
            fs::set_permissions(&file, Permissions::from_mode(0o600))?;
        }
    }
    Ok(())
}
