use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use async_trait::async_trait;
use tokio::fs;

use crate::auth::{UserIdentity, decode_claims};

/// Snapshot of what a store holds: the bearer token and the identity
/// derived from it at login time. Either may be absent independently
/// (a half-written store must not take the session down).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredSession {
    pub token: Option<String>,
    pub user: Option<UserIdentity>,
}

/// Persistence for the login session, the crate's stand-in for browser
/// local storage. Single-owner: no cross-process coordination.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self) -> anyhow::Result<StoredSession>;
    async fn save(&self, token: &str, user: &UserIdentity) -> anyhow::Result<()>;
    async fn clear(&self) -> anyhow::Result<()>;
}

/// File-backed store: token as a plain string, user snapshot as JSON,
/// both under `{base_dir}/session/`.
#[derive(Debug, Clone)]
pub struct LocalFsSessionStore {
    base_dir: PathBuf,
}

impl LocalFsSessionStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn session_dir(&self) -> PathBuf {
        self.base_dir.join("session")
    }

    fn token_path(&self) -> PathBuf {
        self.session_dir().join("access_token")
    }

    fn user_path(&self) -> PathBuf {
        self.session_dir().join("user.json")
    }
}

#[async_trait]
impl SessionStore for LocalFsSessionStore {
    async fn load(&self) -> anyhow::Result<StoredSession> {
        let token = match fs::read_to_string(self.token_path()).await {
            Ok(raw) => {
                let raw = raw.trim().to_string();
                (!raw.is_empty()).then_some(raw)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("read: {}", self.token_path().display()));
            }
        };

        let user = read_json(&self.user_path())
            .await
            .with_context(|| format!("read: {}", self.user_path().display()))?;

        Ok(StoredSession { token, user })
    }

    async fn save(&self, token: &str, user: &UserIdentity) -> anyhow::Result<()> {
        fs::create_dir_all(self.session_dir())
            .await
            .with_context(|| format!("create session dir: {}", self.session_dir().display()))?;

        write_atomic(&self.token_path(), token.as_bytes())
            .await
            .context("write access_token")?;
        let user_json = serde_json::to_vec_pretty(user).context("serialize user")?;
        write_atomic(&self.user_path(), &user_json)
            .await
            .context("write user.json")?;
        Ok(())
    }

    async fn clear(&self) -> anyhow::Result<()> {
        remove_if_exists(&self.token_path()).await?;
        remove_if_exists(&self.user_path()).await?;
        Ok(())
    }
}

/// Per-process holder of the current token and derived identity, the
/// session context the UI layer reads. Passed explicitly to callers, never
/// ambient global state, so authentication stays testable in isolation.
pub struct AuthSession {
    store: Arc<dyn SessionStore>,
    token: Option<String>,
    user: Option<UserIdentity>,
}

impl AuthSession {
    /// Initializes from the store, read once. Later external mutations of
    /// the store are not observed.
    pub async fn load(store: Arc<dyn SessionStore>) -> anyhow::Result<Self> {
        let stored = store.load().await.context("load session")?;
        Ok(Self {
            store,
            token: stored.token,
            user: stored.user,
        })
    }

    /// Decodes the token locally (no signature check, display-only trust),
    /// persists token and derived identity, and updates in-memory state.
    pub async fn login_with_token(&mut self, token: String) -> anyhow::Result<UserIdentity> {
        let user = decode_claims(&token).context("decode access token claims")?;
        self.store
            .save(&token, &user)
            .await
            .context("persist session")?;
        self.token = Some(token);
        self.user = Some(user.clone());
        Ok(user)
    }

    /// Clears in-memory state and the persisted entries.
    pub async fn logout(&mut self) -> anyhow::Result<()> {
        self.store.clear().await.context("clear session")?;
        self.token = None;
        self.user = None;
        Ok(())
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&UserIdentity> {
        self.user.as_ref()
    }

    pub fn authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// UI gating only. The backend's 403 on a write remains the
    /// authoritative denial even when this returns true.
    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(UserIdentity::is_admin)
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<Option<T>> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    let value = serde_json::from_slice(&bytes).context("parse json")?;
    Ok(Some(value))
}

async fn write_atomic(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, data)
        .await
        .with_context(|| format!("write tmp: {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path)
        .await
        .with_context(|| format!("rename tmp to final: {}", path.display()))?;
    Ok(())
}

async fn remove_if_exists(path: &Path) -> anyhow::Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err).with_context(|| format!("remove: {}", path.display())),
    }
}
