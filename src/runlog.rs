use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// An append-only binary sink for per-epoch step counts: a raw
/// little-endian `u32` stream, `N/2` values per epoch in pair-index order,
/// with no header or framing.
pub struct RunLog {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl RunLog {
    /// Open (creating if absent, appending if present) the log at `path`.
    /// Failure here is a configuration error: it must be surfaced before
    /// any arena work begins.
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(RunLog {
            writer: BufWriter::new(file),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one epoch's worth of pair step counts, in pair-index order.
    pub fn append(&mut self, pair_steps: &[u32]) -> io::Result<()> {
        for &s in pair_steps {
            self.writer.write_all(&s.to_le_bytes())?;
        }
        Ok(())
    }

    pub fn close(mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn appends_little_endian_u32_stream() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("complife-runlog-test-{}.bin", std::process::id()));
        {
            let mut log = RunLog::create(&path).unwrap();
            log.append(&[1, 2, 3]).unwrap();
            log.append(&[4]).unwrap();
            log.close().unwrap();
        }
        let mut bytes = Vec::new();
        File::open(&path).unwrap().read_to_end(&mut bytes).unwrap();
        assert_eq!(bytes.len(), 4 * 4);
        let values: Vec<u32> = bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes(c.try_into().unwrap()))
            .collect();
        assert_eq!(values, vec![1, 2, 3, 4]);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn open_fails_for_unwritable_directory() {
        let path = PathBuf::from("/nonexistent-directory-for-complife/runlog.bin");
        assert!(RunLog::create(&path).is_err());
    }
}
