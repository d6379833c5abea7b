pub const SCHEMA: &str = r#"
-- Projects, keyed by their immutable name
CREATE TABLE IF NOT EXISTS projects (
    name TEXT PRIMARY KEY,
    creation_date TEXT,
    last_event_context TEXT,       -- JSON document, NULL when no event was seen
    shipyard TEXT NOT NULL DEFAULT '',
    shipyard_version TEXT NOT NULL DEFAULT '',
    stages TEXT NOT NULL DEFAULT '[]',  -- JSON array

    -- Legacy inline git credentials (cleared by migration)
    git_remote_url TEXT,
    git_user TEXT,
    git_token TEXT,
    git_proxy_url TEXT,
    git_proxy_scheme TEXT,
    git_proxy_user TEXT,
    git_proxy_password TEXT,
    insecure_skip_tls INTEGER NOT NULL DEFAULT 0,

    -- Secure credentials: JSON, never holds secret values
    git_credentials TEXT
);

CREATE INDEX IF NOT EXISTS idx_projects_git_remote_url ON projects(git_remote_url);
"#;

pub const SECRETS_SCHEMA: &str = r#"
-- Secret entries, one per project
CREATE TABLE IF NOT EXISTS secrets (
    name TEXT PRIMARY KEY,
    project TEXT NOT NULL UNIQUE,
    payload TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);
"#;
