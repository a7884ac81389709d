// File: src/persistence.rs
use crate::core::engine::Lexicon;
use crate::core::store::sort_by_recency;
use crate::core::types::{fold, WordEntry};
use crate::error::PersistError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

const MAGIC: &[u8; 4] = b"LKWD";
const VERSION: u8 = 1;
const HEADER_LEN: usize = 5;

/// One persisted word. The index is not stored; it is rebuilt from `word`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordRecord {
    pub word: String,
    pub display: String,
    pub frequency: u64,
    pub recency: u64,
}

impl From<&WordEntry> for WordRecord {
    fn from(entry: &WordEntry) -> Self {
        Self {
            word: entry.word.clone(),
            display: entry.display.clone(),
            frequency: entry.frequency,
            recency: entry.recency,
        }
    }
}

/// Durable storage for the serialized dictionary, seen as one opaque blob.
pub trait PersistentBackend: Send + Sync {
    /// Returns `Ok(None)` when nothing has been stored yet.
    fn read(&self) -> io::Result<Option<Vec<u8>>>;
    fn write(&self, bytes: &[u8]) -> io::Result<()>;
}

/// Stores the dictionary in a single file, replaced atomically on every write.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PersistentBackend for FileBackend {
    fn read(&self) -> io::Result<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&self, bytes: &[u8]) -> io::Result<()> {
        let parent_dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent_dir)?;

        let temp_file = NamedTempFile::new_in(parent_dir)?;
        {
            let mut writer = BufWriter::new(&temp_file);
            writer.write_all(bytes)?;
            writer.flush()?;
        }
        temp_file.as_file().sync_all()?;
        temp_file.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Keeps the serialized dictionary in memory. Useful for embedding hosts
/// that own their storage, and for tests.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    bytes: Mutex<Option<Vec<u8>>>,
    writes: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes: Mutex::new(Some(bytes)), writes: AtomicUsize::new(0) }
    }

    pub fn contents(&self) -> Option<Vec<u8>> {
        self.bytes.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl PersistentBackend for MemoryBackend {
    fn read(&self) -> io::Result<Option<Vec<u8>>> {
        Ok(self.contents())
    }

    fn write(&self, bytes: &[u8]) -> io::Result<()> {
        *self.bytes.lock().unwrap_or_else(PoisonError::into_inner) = Some(bytes.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Serializes entries into the LKWD format: magic, version byte, bincode body.
pub fn encode(entries: &[WordEntry]) -> Result<Vec<u8>, PersistError> {
    let records: Vec<WordRecord> = entries.iter().map(WordRecord::from).collect();
    let body = bincode::serialize(&records).map_err(PersistError::Serialize)?;

    let mut buf = Vec::with_capacity(HEADER_LEN + body.len());
    buf.extend_from_slice(MAGIC);
    buf.push(VERSION);
    buf.extend_from_slice(&body);
    Ok(buf)
}

pub fn decode(bytes: &[u8]) -> Result<Vec<WordRecord>, PersistError> {
    if bytes.len() < HEADER_LEN {
        return Err(PersistError::InvalidHeader);
    }
    if &bytes[0..4] != MAGIC {
        return Err(PersistError::InvalidMagic);
    }
    if bytes[4] != VERSION {
        return Err(PersistError::UnsupportedVersion(bytes[4]));
    }
    bincode::deserialize(&bytes[HEADER_LEN..]).map_err(PersistError::Deserialize)
}

/// Reads and decodes whatever the backend holds. `Ok(None)` means first run.
pub fn read_records(backend: &dyn PersistentBackend) -> Result<Option<Vec<WordRecord>>, PersistError> {
    match backend.read()? {
        Some(bytes) => decode(&bytes).map(Some),
        None => Ok(None),
    }
}

/// Rebuilds store and index by replaying records oldest first.
///
/// Records with a blank word are skipped, frequencies are clamped to at least
/// 1, and when two records fold to the same word the later one wins.
pub fn lexicon_from_records(mut records: Vec<WordRecord>) -> Lexicon {
    records.sort_by(|a, b| a.recency.cmp(&b.recency).then_with(|| a.word.cmp(&b.word)));

    let mut lexicon = Lexicon::default();
    for record in records {
        let key = fold(record.word.trim());
        if key.is_empty() {
            continue;
        }
        if let Some(id) = lexicon.store.find(&key) {
            lexicon.store.remove(id);
            lexicon.index.remove(&key);
        }
        let display = if fold(&record.display) == key { record.display } else { key.clone() };
        let entry = WordEntry {
            word: key.clone(),
            display,
            frequency: record.frequency.max(1),
            recency: record.recency,
        };
        let rank = entry.rank_key();
        let id = lexicon.store.insert(entry);
        lexicon.index.insert(&key, id, rank);
        lexicon.sequence = lexicon.sequence.max(record.recency);
    }
    lexicon
}

/// Best-effort load: any failure is logged and yields an empty lexicon.
pub fn load_lexicon(backend: &dyn PersistentBackend) -> Lexicon {
    match read_records(backend) {
        Ok(Some(records)) => {
            let lexicon = lexicon_from_records(records);
            info!(words = lexicon.store.len(), "dictionary loaded");
            lexicon
        }
        Ok(None) => {
            info!("no stored dictionary, starting empty");
            Lexicon::default()
        }
        Err(e) => {
            warn!(error = %e, "stored dictionary unreadable, starting empty");
            Lexicon::default()
        }
    }
}

/// Serializes writes to one backend. Each write snapshots the lexicon while
/// holding the I/O lock, so a later write never carries older state.
pub struct Persister {
    backend: Arc<dyn PersistentBackend>,
    io_lock: Mutex<()>,
}

impl Persister {
    pub fn new(backend: Arc<dyn PersistentBackend>) -> Self {
        Self { backend, io_lock: Mutex::new(()) }
    }

    /// Clones the entries under the read lock, then sorts, encodes and writes
    /// outside it. Returns the number of words written.
    pub fn save(&self, lexicon: &RwLock<Lexicon>) -> Result<usize, PersistError> {
        let _io = self.io_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = lexicon.read().unwrap_or_else(PoisonError::into_inner).store.cloned_entries();
        sort_by_recency(&mut entries);
        let bytes = encode(&entries)?;
        self.backend.write(&bytes)?;
        Ok(entries.len())
    }
}

/// Background thread performing batched saves off the interactive path.
///
/// Requests are coalesced: a burst of requests results in one write of the
/// latest state. Dropping the writer lets queued requests finish first.
pub struct SnapshotWriter {
    tx: Option<mpsc::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl SnapshotWriter {
    pub fn spawn(persister: Arc<Persister>, lexicon: Arc<RwLock<Lexicon>>) -> io::Result<Self> {
        let (tx, rx) = mpsc::channel::<()>();
        let handle = thread::Builder::new()
            .name("keyboard-dict-writer".into())
            .spawn(move || writer_loop(rx, persister, lexicon))?;
        Ok(Self { tx: Some(tx), handle: Some(handle) })
    }

    pub fn request(&self) {
        if let Some(tx) = &self.tx {
            if tx.send(()).is_err() {
                warn!("dictionary writer is gone, save request dropped");
            }
        }
    }
}

impl Drop for SnapshotWriter {
    fn drop(&mut self) {
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("dictionary writer panicked");
            }
        }
    }
}

fn writer_loop(rx: mpsc::Receiver<()>, persister: Arc<Persister>, lexicon: Arc<RwLock<Lexicon>>) {
    while rx.recv().is_ok() {
        // Drain: one write covers every queued request
        while rx.try_recv().is_ok() {}

        match persister.save(&lexicon) {
            Ok(words) => debug!(words, "background save complete"),
            Err(e) => warn!(error = %e, "background save failed"),
        }
    }
}
