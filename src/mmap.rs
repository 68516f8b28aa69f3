//! Read-only memory-mapped files.
//!
//! `MappedFile` owns the descriptor and the mapping of one file. The mapped
//! bytes are exposed as a plain `&[u8]` so every decode in the crate is a
//! bounds-checked slice read. Searches borrow the handle, so the mapping
//! cannot be released while a search over it is still running.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use memmap2::{Mmap, MmapOptions};
use tracing::debug;

use crate::config::MapOptions;
use crate::error::Result;

/// A file mapped read-only for its full length.
#[derive(Debug)]
pub struct MappedFile {
    path: PathBuf,
    file: File,
    mmap: Mmap,
}

impl MappedFile {
    /// Map a file with default options.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with(path, &MapOptions::default())
    }

    /// Map a file read-only.
    ///
    /// Fails with `Io` when the path is missing, is not a regular file,
    /// is empty, or cannot be mapped.
    pub fn open_with(path: &Path, options: &MapOptions) -> Result<Self> {
        let file = File::open(path)?;
        let meta = file.metadata()?;
        if !meta.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not a regular file: {}", path.display()),
            )
            .into());
        }
        if meta.len() == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("cannot map empty file: {}", path.display()),
            )
            .into());
        }

        let mut mmap_options = MmapOptions::new();
        if options.populate {
            mmap_options.populate();
        }
        // SAFETY: the mapping is read-only and the crate never hands out
        // mutable access; concurrent truncation by another process is outside
        // the contract of this type.
        let mmap = unsafe { mmap_options.map(&file) }?;

        #[cfg(unix)]
        {
            if options.random_access {
                if let Err(e) = mmap.advise(memmap2::Advice::Random) {
                    tracing::warn!(path = %path.display(), error = %e, "madvise(RANDOM) failed");
                }
            }
        }

        debug!(path = %path.display(), size = mmap.len(), "mapped file");
        Ok(Self {
            path: path.to_path_buf(),
            file,
            mmap,
        })
    }

    /// The mapped bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.mmap
    }

    /// File size in bytes.
    #[inline]
    pub fn size(&self) -> u64 {
        self.mmap.len() as u64
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Unmap and close the file descriptor.
    ///
    /// Consumes the handle, so a second close cannot be expressed. Dropping
    /// a `MappedFile` also releases it but swallows close errors.
    pub fn close(self) -> Result<()> {
        let Self { path, file, mmap } = self;
        let size = mmap.len();
        drop(mmap);
        close_descriptor(file)?;
        debug!(path = %path.display(), size, "unmapped file");
        Ok(())
    }
}

impl AsRef<[u8]> for MappedFile {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

#[cfg(unix)]
fn close_descriptor(file: File) -> io::Result<()> {
    use std::os::unix::io::IntoRawFd;

    let fd = file.into_raw_fd();
    // SAFETY: `fd` was just released by an owned `File`, nothing else holds it.
    if unsafe { libc::close(fd) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(not(unix))]
fn close_descriptor(file: File) -> io::Result<()> {
    drop(file);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SearchError;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_open_and_close() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "data.bin", &[1, 2, 3, 4, 5]);

        let mf = MappedFile::open(&path).unwrap();
        assert_eq!(mf.size(), 5);
        assert_eq!(mf.as_bytes(), &[1, 2, 3, 4, 5]);
        assert_eq!(mf.path(), path.as_path());
        mf.close().unwrap();
    }

    #[test]
    fn test_open_with_populate() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "data.bin", &[7u8; 4096]);
        let options = MapOptions {
            populate: true,
            random_access: false,
        };
        let mf = MappedFile::open_with(&path, &options).unwrap();
        assert!(mf.as_bytes().iter().all(|&b| b == 7));
        mf.close().unwrap();
    }

    #[test]
    fn test_open_missing() {
        let err = MappedFile::open(Path::new("/nonexistent/binsearch/error")).unwrap_err();
        assert!(matches!(err, SearchError::Io(_)));
    }

    #[test]
    fn test_open_directory() {
        let dir = TempDir::new().unwrap();
        let err = MappedFile::open(dir.path()).unwrap_err();
        assert!(matches!(err, SearchError::Io(_)));
    }

    #[test]
    fn test_open_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "empty.bin", &[]);
        let err = MappedFile::open(&path).unwrap_err();
        assert_eq!(err.code(), "IO_ERROR");
    }

    #[test]
    fn test_mapped_file_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MappedFile>();
    }
}
