//! File-based storage implementation.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Result, SpimiError};
use crate::storage::{Storage, StorageConfig, StorageInput, StorageOutput};

/// A storage rooted at a single directory on the local file system.
#[derive(Debug)]
pub struct FileStorage {
    /// The root directory for storage.
    directory: PathBuf,
    /// Storage configuration.
    config: StorageConfig,
    /// Counter used to name temporary files.
    temp_counter: AtomicU64,
}

impl FileStorage {
    /// Create a new file storage in the given directory, creating it if needed.
    pub fn new<P: AsRef<Path>>(directory: P, config: StorageConfig) -> Result<Self> {
        let directory = directory.as_ref().to_path_buf();

        if !directory.exists() {
            fs::create_dir_all(&directory).map_err(|e| {
                SpimiError::storage(format!(
                    "Failed to create directory {}: {e}",
                    directory.display()
                ))
            })?;
        }

        if !directory.is_dir() {
            return Err(SpimiError::storage(format!(
                "Path is not a directory: {}",
                directory.display()
            )));
        }

        Ok(FileStorage {
            directory,
            config,
            temp_counter: AtomicU64::new(0),
        })
    }

    /// The root directory of this storage.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.directory.join(name)
    }

    fn io_error(action: &str, name: &str, err: std::io::Error) -> SpimiError {
        SpimiError::storage(format!("Failed to {action} {name}: {err}"))
    }
}

impl Storage for FileStorage {
    fn open_input(&self, name: &str) -> Result<Box<dyn StorageInput>> {
        let file = File::open(self.file_path(name)).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                SpimiError::storage(format!("File not found: {name}"))
            } else {
                Self::io_error("open", name, e)
            }
        })?;

        Ok(Box::new(FileInput::new(file, self.config.buffer_size)?))
    }

    fn create_output(&self, name: &str) -> Result<Box<dyn StorageOutput>> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(self.file_path(name))
            .map_err(|e| Self::io_error("create", name, e))?;

        Ok(Box::new(FileOutput::new(
            file,
            self.config.buffer_size,
            self.config.sync_writes,
        )))
    }

    fn create_temp_output(&self, prefix: &str) -> Result<(String, Box<dyn StorageOutput>)> {
        loop {
            let counter = self.temp_counter.fetch_add(1, Ordering::Relaxed);
            let temp_name = format!("{prefix}_{counter}.tmp");

            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(self.file_path(&temp_name))
            {
                Ok(file) => {
                    let output =
                        FileOutput::new(file, self.config.buffer_size, self.config.sync_writes);
                    return Ok((temp_name, Box::new(output)));
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(Self::io_error("create", &temp_name, e)),
            }
        }
    }

    fn file_exists(&self, name: &str) -> bool {
        self.file_path(name).exists()
    }

    fn delete_file(&self, name: &str) -> Result<()> {
        match fs::remove_file(self.file_path(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::io_error("delete", name, e)),
        }
    }

    fn list_files(&self) -> Result<Vec<String>> {
        let mut files = Vec::new();

        for entry in fs::read_dir(&self.directory)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    files.push(name.to_string());
                }
            }
        }

        files.sort();
        Ok(files)
    }

    fn file_size(&self, name: &str) -> Result<u64> {
        let metadata = fs::metadata(self.file_path(name))
            .map_err(|e| Self::io_error("stat", name, e))?;
        Ok(metadata.len())
    }

    fn rename_file(&self, old_name: &str, new_name: &str) -> Result<()> {
        fs::rename(self.file_path(old_name), self.file_path(new_name))
            .map_err(|e| Self::io_error("rename", old_name, e))
    }

    fn clear(&self) -> Result<()> {
        for name in self.list_files()? {
            self.delete_file(&name)?;
        }
        Ok(())
    }

    fn sync(&self) -> Result<()> {
        // Directory handles can only be fsynced on unix.
        #[cfg(unix)]
        {
            File::open(&self.directory)?.sync_all()?;
        }
        Ok(())
    }
}

/// A buffered file reader.
#[derive(Debug)]
pub struct FileInput {
    reader: BufReader<File>,
    size: u64,
}

impl FileInput {
    fn new(file: File, buffer_size: usize) -> Result<Self> {
        let size = file.metadata()?.len();
        let reader = BufReader::with_capacity(buffer_size, file);

        Ok(FileInput { reader, size })
    }
}

impl Read for FileInput {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.reader.read(buf)
    }
}

impl Seek for FileInput {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.reader.seek(pos)
    }
}

impl StorageInput for FileInput {
    fn size(&self) -> Result<u64> {
        Ok(self.size)
    }
}

/// A buffered file writer.
#[derive(Debug)]
pub struct FileOutput {
    writer: BufWriter<File>,
    sync_writes: bool,
    position: u64,
}

impl FileOutput {
    fn new(file: File, buffer_size: usize, sync_writes: bool) -> Self {
        FileOutput {
            writer: BufWriter::with_capacity(buffer_size, file),
            sync_writes,
            position: 0,
        }
    }
}

impl Write for FileOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let bytes_written = self.writer.write(buf)?;
        self.position += bytes_written as u64;
        Ok(bytes_written)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

impl StorageOutput for FileOutput {
    fn flush_and_sync(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| SpimiError::storage(format!("Failed to flush: {e}")))?;

        self.writer
            .get_ref()
            .sync_all()
            .map_err(|e| SpimiError::storage(format!("Failed to sync: {e}")))?;

        Ok(())
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn close(&mut self) -> Result<()> {
        if self.sync_writes {
            self.flush_and_sync()
        } else {
            self.writer.flush().map_err(SpimiError::from)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, FileStorage) {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path(), StorageConfig::default()).unwrap();
        (temp_dir, storage)
    }

    #[test]
    fn test_creates_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");

        let storage = FileStorage::new(&nested, StorageConfig::default()).unwrap();

        assert!(nested.is_dir());
        assert_eq!(storage.directory(), nested.as_path());
    }

    #[test]
    fn test_rejects_file_path() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("plain");
        fs::write(&file_path, b"x").unwrap();

        assert!(FileStorage::new(&file_path, StorageConfig::default()).is_err());
    }

    #[test]
    fn test_create_and_read_file() {
        let (_temp_dir, storage) = create_test_storage();

        let mut output = storage.create_output("test.txt").unwrap();
        output.write_all(b"Hello, World!").unwrap();
        assert_eq!(output.position(), 13);
        output.close().unwrap();

        let mut input = storage.open_input("test.txt").unwrap();
        let mut buffer = Vec::new();
        input.read_to_end(&mut buffer).unwrap();

        assert_eq!(buffer, b"Hello, World!");
        assert_eq!(input.size().unwrap(), 13);
    }

    #[test]
    fn test_seek_then_read() {
        let (_temp_dir, storage) = create_test_storage();

        let mut output = storage.create_output("data").unwrap();
        output.write_all(b"0123456789").unwrap();
        output.close().unwrap();

        let mut input = storage.open_input("data").unwrap();
        input.seek(SeekFrom::Start(6)).unwrap();
        let mut buffer = [0u8; 3];
        input.read_exact(&mut buffer).unwrap();

        assert_eq!(&buffer, b"678");
    }

    #[test]
    fn test_file_operations() {
        let (_temp_dir, storage) = create_test_storage();

        assert!(!storage.file_exists("test.txt"));

        let mut output = storage.create_output("test.txt").unwrap();
        output.write_all(b"Test content").unwrap();
        output.close().unwrap();

        assert!(storage.file_exists("test.txt"));
        assert_eq!(storage.file_size("test.txt").unwrap(), 12);
        assert_eq!(storage.list_files().unwrap(), vec!["test.txt"]);

        storage.rename_file("test.txt", "renamed.txt").unwrap();
        assert!(!storage.file_exists("test.txt"));
        assert!(storage.file_exists("renamed.txt"));

        storage.delete_file("renamed.txt").unwrap();
        assert!(!storage.file_exists("renamed.txt"));

        // Deleting twice is fine
        storage.delete_file("renamed.txt").unwrap();
    }

    #[test]
    fn test_rename_replaces_existing() {
        let (_temp_dir, storage) = create_test_storage();

        for (name, content) in [("old", b"old".as_slice()), ("new", b"newer".as_slice())] {
            let mut output = storage.create_output(name).unwrap();
            output.write_all(content).unwrap();
            output.close().unwrap();
        }

        storage.rename_file("new", "old").unwrap();
        storage.sync().unwrap();

        assert_eq!(storage.list_files().unwrap(), vec!["old"]);
        assert_eq!(storage.file_size("old").unwrap(), 5);
    }

    #[test]
    fn test_temp_file_creation() {
        let (_temp_dir, storage) = create_test_storage();

        let (first, mut output) = storage.create_temp_output("merge").unwrap();
        output.write_all(b"Temporary content").unwrap();
        output.close().unwrap();
        let (second, _) = storage.create_temp_output("merge").unwrap();

        assert!(first.starts_with("merge_"));
        assert!(first.ends_with(".tmp"));
        assert_ne!(first, second);
        assert_eq!(storage.file_size(&first).unwrap(), 17);
    }

    #[test]
    fn test_clear_removes_files_only() {
        let (temp_dir, storage) = create_test_storage();
        fs::create_dir(temp_dir.path().join("nested")).unwrap();

        for name in ["1.dict", "1.post", "2.dict"] {
            storage.create_output(name).unwrap().close().unwrap();
        }

        storage.clear().unwrap();

        assert!(storage.list_files().unwrap().is_empty());
        assert!(temp_dir.path().join("nested").is_dir());
    }

    #[test]
    fn test_file_not_found() {
        let (_temp_dir, storage) = create_test_storage();

        assert!(storage.open_input("nonexistent.txt").is_err());
        assert!(storage.file_size("nonexistent.txt").is_err());
    }
}
