//! 登录凭证 - 基础设施层
//!
//! 只负责"保存 / 读取 / 清除 bearer token"，不关心登录流程

use std::path::PathBuf;
use std::sync::RwLock;
use tracing::{debug, warn};

/// 凭证提供者
///
/// API 客户端每次请求前读取 token，收到 401 时调用 `clear`
pub trait CredentialProvider: Send + Sync {
    fn token(&self) -> Option<String>;

    fn store(&self, token: &str) -> std::io::Result<()>;

    fn clear(&self);

    fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }
}

/// 内存凭证，用于测试和一次性进程
#[derive(Debug, Default)]
pub struct MemoryCredential {
    token: RwLock<Option<String>>,
}

impl MemoryCredential {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: RwLock::new(token),
        }
    }
}

impl CredentialProvider for MemoryCredential {
    fn token(&self) -> Option<String> {
        self.token.read().ok().and_then(|t| t.clone())
    }

    fn store(&self, token: &str) -> std::io::Result<()> {
        let mut slot = self
            .token
            .write()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
        *slot = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) {
        if let Ok(mut slot) = self.token.write() {
            *slot = None;
        }
    }
}

/// 保存在本地文件中的凭证
pub struct TokenFile {
    path: PathBuf,
}

impl TokenFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CredentialProvider for TokenFile {
    fn token(&self) -> Option<String> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        let token = content.trim();
        if token.is_empty() {
            None
        } else {
            Some(token.to_string())
        }
    }

    fn store(&self, token: &str) -> std::io::Result<()> {
        debug!("写入凭证文件: {}", self.path.display());
        std::fs::write(&self.path, token.trim())
    }

    fn clear(&self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("删除凭证文件失败 ({}): {}", self.path.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_credential_lifecycle() {
        let cred = MemoryCredential::default();
        assert!(!cred.is_authenticated());

        cred.store("abc").unwrap();
        assert_eq!(cred.token().as_deref(), Some("abc"));

        cred.clear();
        assert!(cred.token().is_none());
    }

    #[test]
    fn test_memory_credential_reports_poisoned_lock() {
        let cred = std::sync::Arc::new(MemoryCredential::default());
        let holder = cred.clone();
        let _ = std::thread::spawn(move || {
            let _guard = holder.token.write().unwrap();
            panic!("持锁线程崩溃");
        })
        .join();

        assert!(cred.store("abc").is_err());
        assert!(!cred.is_authenticated());
    }

    #[test]
    fn test_token_file_roundtrip() {
        let path = std::env::temp_dir().join(format!("exam_token_test_{}", std::process::id()));
        let cred = TokenFile::new(&path);

        cred.store("  token-123\n").unwrap();
        assert_eq!(cred.token().as_deref(), Some("token-123"));

        cred.clear();
        assert!(cred.token().is_none());
        // 再次清除不存在的文件不应报错
        cred.clear();
    }
}
