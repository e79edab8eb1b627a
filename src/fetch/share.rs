//! File fetcher backed by a mounted file share

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{FetchError, FileFetcher};

/// Resolves remote paths below a local mount point of the share
#[derive(Debug, Clone)]
pub struct LocalShareFetcher {
    mount: PathBuf,
}

impl LocalShareFetcher {
    pub fn new(mount: impl Into<PathBuf>) -> Self {
        Self {
            mount: mount.into(),
        }
    }

    pub fn mount(&self) -> &Path {
        &self.mount
    }

    fn resolve(&self, remote: &str) -> PathBuf {
        remote
            .split('/')
            .filter(|part| !part.is_empty() && *part != "..")
            .fold(self.mount.clone(), |path, part| path.join(part))
    }

    async fn ensure_mounted(&self) -> Result<(), FetchError> {
        match tokio::fs::metadata(&self.mount).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            _ => Err(FetchError::Unavailable(self.mount.display().to_string())),
        }
    }
}

#[async_trait]
impl FileFetcher for LocalShareFetcher {
    async fn fetch(&self, remote: &str, local_dir: &Path) -> Result<PathBuf, FetchError> {
        self.ensure_mounted().await?;

        let source = self.resolve(remote);
        let Some(file_name) = source.file_name() else {
            return Err(FetchError::NotFound(remote.to_string()));
        };
        if !tokio::fs::try_exists(&source).await.unwrap_or(false) {
            return Err(FetchError::NotFound(remote.to_string()));
        }

        let destination = local_dir.join(file_name);
        let copy_err = |source| FetchError::Copy {
            remote: remote.to_string(),
            local: destination.clone(),
            source,
        };
        tokio::fs::create_dir_all(local_dir).await.map_err(copy_err)?;
        tokio::fs::copy(&source, &destination)
            .await
            .map_err(copy_err)?;

        tracing::debug!("Fetched {} -> {}", remote, destination.display());
        Ok(destination)
    }

    async fn list(&self, remote_dir: &str) -> Result<Vec<String>, FetchError> {
        self.ensure_mounted().await?;

        let dir = self.resolve(remote_dir);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(FetchError::NotFound(remote_dir.to_string()));
            }
            Err(source) => {
                return Err(FetchError::List {
                    remote: remote_dir.to_string(),
                    source,
                });
            }
        };

        let mut names = Vec::new();
        loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => {
                    if let Some(name) = entry.file_name().to_str() {
                        names.push(name.to_string());
                    }
                }
                Ok(None) => break,
                Err(source) => {
                    return Err(FetchError::List {
                        remote: remote_dir.to_string(),
                        source,
                    });
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_fetch_copies_into_local_dir() {
        let share = tempdir().unwrap();
        let cache = tempdir().unwrap();
        let remote_dir = share.path().join("seq/Seq010");
        std::fs::create_dir_all(&remote_dir).unwrap();
        std::fs::write(remote_dir.join("stats.json"), "{}").unwrap();

        let fetcher = LocalShareFetcher::new(share.path());
        let local = fetcher
            .fetch("/seq/Seq010/stats.json", &cache.path().join("copy"))
            .await
            .unwrap();
        assert_eq!(local, cache.path().join("copy/stats.json"));
        assert_eq!(std::fs::read_to_string(local).unwrap(), "{}");
    }

    #[tokio::test]
    async fn test_missing_file_and_dir() {
        let share = tempdir().unwrap();
        let fetcher = LocalShareFetcher::new(share.path());
        assert!(matches!(
            fetcher.fetch("/nope.json", share.path()).await,
            Err(FetchError::NotFound(_))
        ));
        assert!(matches!(fetcher.list("/nope").await, Err(FetchError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_unmounted_share_is_unavailable() {
        let share = tempdir().unwrap();
        let fetcher = LocalShareFetcher::new(share.path().join("not-mounted"));
        assert!(matches!(fetcher.list("/").await, Err(FetchError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_list_sorted_names() {
        let share = tempdir().unwrap();
        for name in ["Shot030", "Shot010", "Shot020"] {
            std::fs::create_dir_all(share.path().join("render_data").join(name)).unwrap();
        }
        let fetcher = LocalShareFetcher::new(share.path());
        let names = fetcher.list("/render_data").await.unwrap();
        assert_eq!(names, vec!["Shot010", "Shot020", "Shot030"]);
    }
}
