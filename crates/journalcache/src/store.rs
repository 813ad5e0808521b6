//! Named response stores
//!
//! Directory layout for a persistent `CacheStorage`:
//! - `<name>.cache`: one file per cache generation, see `parser` for the format
//!
//! Records are appended on every put and replayed on open; the last record
//! for a URL wins.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ahash::RandomState;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::parser::{
    create_header, encode_record, parse_header, parse_records, CacheRecord, HEADER_LEN,
};
use crate::request::{Request, Response};

/// File extension of cache files
const CACHE_EXT: &str = "cache";

struct Stored {
    response: Response,
    stored_at: i64,
}

impl From<CacheRecord> for Stored {
    fn from(record: CacheRecord) -> Self {
        let response = record
            .headers
            .into_iter()
            .fold(Response::new(record.status, record.body), |resp, (n, v)| {
                resp.with_header(n, v)
            });
        Stored {
            response,
            stored_at: record.stored_at,
        }
    }
}

fn to_record(url: &str, stored: &Stored) -> CacheRecord {
    CacheRecord {
        url: url.to_string(),
        status: stored.response.status(),
        stored_at: stored.stored_at,
        headers: stored.response.headers().to_vec(),
        body: stored.response.body().to_vec(),
    }
}

/// A single cache generation: request URL to response
pub struct CacheStore {
    /// Generation name
    name: String,

    /// URL -> stored response
    entries: RwLock<HashMap<String, Stored, RandomState>>,

    /// Backing file, absent for in-memory stores
    file: Option<Mutex<File>>,
}

impl CacheStore {
    fn in_memory(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: RwLock::new(HashMap::with_hasher(RandomState::new())),
            file: None,
        }
    }

    fn open_file(name: &str, path: &Path) -> Result<Self> {
        let (file, entries) = if path.exists() {
            Self::load(path)?
        } else {
            let mut file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)?;
            file.write_all(&create_header())?;
            file.sync_data()?;
            (file, HashMap::with_hasher(RandomState::new()))
        };

        Ok(Self {
            name: name.to_string(),
            entries: RwLock::new(entries),
            file: Some(Mutex::new(file)),
        })
    }

    fn load(path: &Path) -> Result<(File, HashMap<String, Stored, RandomState>)> {
        let bytes = fs::read(path)?;
        parse_header(&bytes)?;

        let body = &bytes[HEADER_LEN..];
        let (records, used) = parse_records(body);
        let replayed = records.len();

        let mut entries = HashMap::with_hasher(RandomState::new());
        for record in records {
            entries.insert(record.url.clone(), Stored::from(record));
        }

        let mut file = OpenOptions::new().read(true).write(true).open(path)?;

        let torn = used < body.len();
        if torn {
            warn!(
                "Discarding {} trailing bytes in {:?}",
                body.len() - used,
                path
            );
        }
        if torn || replayed > entries.len() {
            Self::rewrite(&mut file, &entries)?;
            debug!("Compacted {:?}: {} -> {} records", path, replayed, entries.len());
        }

        file.seek(SeekFrom::End(0))?;
        Ok((file, entries))
    }

    fn rewrite(file: &mut File, entries: &HashMap<String, Stored, RandomState>) -> Result<()> {
        let mut buf = create_header();
        for (url, stored) in entries {
            buf.extend_from_slice(&encode_record(&to_record(url, stored))?);
        }
        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        file.write_all(&buf)?;
        file.sync_data()?;
        Ok(())
    }

    /// Generation name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stored response for exactly this request URL
    pub fn match_request(&self, request: &Request) -> Option<Response> {
        self.entries
            .read()
            .get(request.url())
            .map(|stored| stored.response.clone())
    }

    /// When the response for `request` was stored
    pub fn stored_at(&self, request: &Request) -> Option<DateTime<Utc>> {
        let ms = self.entries.read().get(request.url())?.stored_at;
        Utc.timestamp_millis_opt(ms).single()
    }

    /// Store one response
    pub fn put(&self, request: &Request, response: Response) -> Result<()> {
        self.put_all(vec![(request.clone(), response)])
    }

    /// Store several responses with a single write
    ///
    /// Nothing becomes visible unless the write to the backing file succeeds.
    pub fn put_all(&self, items: Vec<(Request, Response)>) -> Result<()> {
        let now = Utc::now().timestamp_millis();
        let items: Vec<(String, Stored)> = items
            .into_iter()
            .map(|(req, response)| {
                (
                    req.url().to_string(),
                    Stored {
                        response,
                        stored_at: now,
                    },
                )
            })
            .collect();

        if let Some(file) = &self.file {
            let mut buf = Vec::new();
            for (url, stored) in &items {
                buf.extend_from_slice(&encode_record(&to_record(url, stored))?);
            }
            let mut file = file.lock();
            file.write_all(&buf)?;
            file.sync_data()?;
        }

        let mut entries = self.entries.write();
        for (url, stored) in items {
            entries.insert(url, stored);
        }
        Ok(())
    }

    /// Stored URLs, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Number of stored responses
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if nothing is stored
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidCacheName(name.to_string()))
    }
}

/// All cache generations of one application
pub struct CacheStorage {
    /// Directory holding cache files, absent for in-memory storage
    dir: Option<PathBuf>,

    /// Name -> open store
    caches: RwLock<HashMap<String, Arc<CacheStore>, RandomState>>,
}

impl CacheStorage {
    /// Storage that lives only as long as the process
    pub fn in_memory() -> Self {
        Self {
            dir: None,
            caches: RwLock::new(HashMap::with_hasher(RandomState::new())),
        }
    }

    /// Open or create storage in `path`, loading every cache file found
    ///
    /// # Arguments
    /// * `path` - Directory for cache files
    ///
    /// # Returns
    /// * `Result<CacheStorage>` - Storage handle
    pub fn open_dir<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        fs::create_dir_all(path)?;

        let mut caches = HashMap::with_hasher(RandomState::new());
        for entry in fs::read_dir(path)? {
            let file_path = entry?.path();
            if file_path.extension().and_then(|e| e.to_str()) != Some(CACHE_EXT) {
                continue;
            }
            let name = match file_path.file_stem().and_then(|s| s.to_str()) {
                Some(name) if validate_name(name).is_ok() => name.to_string(),
                _ => continue,
            };
            let store = CacheStore::open_file(&name, &file_path)?;
            debug!("Loaded cache {} ({} entries)", name, store.len());
            caches.insert(name, Arc::new(store));
        }

        info!("Cache storage at {:?}: {} caches", path, caches.len());
        Ok(Self {
            dir: Some(path.to_path_buf()),
            caches: RwLock::new(caches),
        })
    }

    fn file_path(dir: &Path, name: &str) -> PathBuf {
        dir.join(format!("{}.{}", name, CACHE_EXT))
    }

    /// Open the store called `name`, creating it if absent
    pub fn open(&self, name: &str) -> Result<Arc<CacheStore>> {
        validate_name(name)?;

        if let Some(store) = self.caches.read().get(name) {
            return Ok(Arc::clone(store));
        }

        let mut caches = self.caches.write();
        if let Some(store) = caches.get(name) {
            return Ok(Arc::clone(store));
        }

        let store = match &self.dir {
            Some(dir) => CacheStore::open_file(name, &Self::file_path(dir, name))?,
            None => CacheStore::in_memory(name),
        };
        let store = Arc::new(store);
        caches.insert(name.to_string(), Arc::clone(&store));
        Ok(store)
    }

    /// Check if a store called `name` exists
    pub fn has(&self, name: &str) -> bool {
        self.caches.read().contains_key(name)
    }

    /// Delete the store called `name` and its file
    ///
    /// # Returns
    /// * `Result<bool>` - Whether a store was deleted
    pub fn delete(&self, name: &str) -> Result<bool> {
        if self.caches.write().remove(name).is_none() {
            return Ok(false);
        }
        if let Some(dir) = &self.dir {
            match fs::remove_file(Self::file_path(dir, name)) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(true)
    }

    /// Names of all stores, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.caches.read().keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn json(body: &'static str) -> Response {
        Response::new(200, body).with_header("Content-Type", "application/json")
    }

    #[test]
    fn test_put_and_match() {
        let storage = CacheStorage::in_memory();
        let store = storage.open("v1").unwrap();

        let req = Request::get("https://a.test/entries");
        store.put(&req, json("[]")).unwrap();

        let hit = store.match_request(&req).unwrap();
        assert_eq!(hit.body().as_ref(), b"[]");
        assert_eq!(hit.header("content-type"), Some("application/json"));
        assert!(store.stored_at(&req).is_some());
    }

    #[test]
    fn test_match_is_exact() {
        let storage = CacheStorage::in_memory();
        let store = storage.open("v1").unwrap();
        store.put(&Request::get("https://a.test/entries"), json("[]")).unwrap();

        assert!(store.match_request(&Request::get("https://a.test/entries/")).is_none());
        assert!(store.match_request(&Request::get("https://a.test/entries?x=1")).is_none());
    }

    #[test]
    fn test_open_returns_same_store() {
        let storage = CacheStorage::in_memory();
        let a = storage.open("v1").unwrap();
        let b = storage.open("v1").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(storage.keys(), vec!["v1".to_string()]);
    }

    #[test]
    fn test_invalid_names() {
        let storage = CacheStorage::in_memory();
        assert!(matches!(storage.open(""), Err(Error::InvalidCacheName(_))));
        assert!(matches!(storage.open("../x"), Err(Error::InvalidCacheName(_))));
        assert!(matches!(storage.open(".hidden"), Err(Error::InvalidCacheName(_))));
        assert!(storage.open("journal-cache-v1").is_ok());
    }

    #[test]
    fn test_delete() {
        let storage = CacheStorage::in_memory();
        storage.open("v1").unwrap();
        storage.open("v2").unwrap();

        assert!(storage.delete("v1").unwrap());
        assert!(!storage.delete("v1").unwrap());
        assert!(!storage.has("v1"));
        assert_eq!(storage.keys(), vec!["v2".to_string()]);
    }

    #[test]
    fn test_persistence() {
        let dir = TempDir::new().unwrap();
        let req = Request::get("https://a.test/entries");

        {
            let storage = CacheStorage::open_dir(dir.path()).unwrap();
            let store = storage.open("v1").unwrap();
            store.put(&req, json(r#"[{"title":"Trip"}]"#)).unwrap();
        }

        let storage = CacheStorage::open_dir(dir.path()).unwrap();
        assert!(storage.has("v1"));
        let store = storage.open("v1").unwrap();
        let hit = store.match_request(&req).unwrap();
        assert_eq!(hit.status(), 200);
        assert_eq!(hit.text(), r#"[{"title":"Trip"}]"#);
        assert_eq!(hit.header("Content-Type"), Some("application/json"));
    }

    #[test]
    fn test_unencodable_put_leaves_store_unchanged() {
        let dir = TempDir::new().unwrap();
        let req = Request::get("https://a.test/entries");
        let oversized = json("[]").with_header("x".repeat(u16::MAX as usize + 1), "v");

        {
            let storage = CacheStorage::open_dir(dir.path()).unwrap();
            let store = storage.open("v1").unwrap();
            assert!(matches!(store.put(&req, oversized), Err(Error::Parse(_))));
            assert!(store.match_request(&req).is_none());
            store.put(&req, json("[1]")).unwrap();
        }

        let storage = CacheStorage::open_dir(dir.path()).unwrap();
        let store = storage.open("v1").unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.match_request(&req).unwrap().text(), "[1]");
    }

    #[test]
    fn test_last_write_wins_and_compacts() {
        let dir = TempDir::new().unwrap();
        let req = Request::get("https://a.test/entries");

        {
            let storage = CacheStorage::open_dir(dir.path()).unwrap();
            let store = storage.open("v1").unwrap();
            store.put(&req, json("[1]")).unwrap();
            store.put(&req, json("[2]")).unwrap();
        }

        let path = dir.path().join("v1.cache");
        let before = fs::metadata(&path).unwrap().len();

        let storage = CacheStorage::open_dir(dir.path()).unwrap();
        let store = storage.open("v1").unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.match_request(&req).unwrap().text(), "[2]");

        let after = fs::metadata(&path).unwrap().len();
        assert!(after < before);
    }

    #[test]
    fn test_torn_tail_is_discarded() {
        let dir = TempDir::new().unwrap();
        let req = Request::get("https://a.test/entries");

        {
            let storage = CacheStorage::open_dir(dir.path()).unwrap();
            storage.open("v1").unwrap().put(&req, json("[]")).unwrap();
        }

        let path = dir.path().join("v1.cache");
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(&[7, 0, 0]).unwrap();
        drop(file);

        let storage = CacheStorage::open_dir(dir.path()).unwrap();
        let store = storage.open("v1").unwrap();
        assert_eq!(store.len(), 1);

        // The next put lands after the last good record
        store.put(&Request::get("https://a.test/other"), json("{}")).unwrap();
        drop(storage);
        drop(store);

        let storage = CacheStorage::open_dir(dir.path()).unwrap();
        assert_eq!(storage.open("v1").unwrap().len(), 2);
    }

    #[test]
    fn test_delete_removes_file() {
        let dir = TempDir::new().unwrap();
        let storage = CacheStorage::open_dir(dir.path()).unwrap();
        storage.open("old-v0").unwrap();
        assert!(dir.path().join("old-v0.cache").exists());

        storage.delete("old-v0").unwrap();
        assert!(!dir.path().join("old-v0.cache").exists());
    }

    #[test]
    fn test_corrupt_file_fails_open() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bad.cache"), b"not a cache file").unwrap();
        assert!(matches!(
            CacheStorage::open_dir(dir.path()),
            Err(Error::Parse(_))
        ));
    }
}
