use std::fs::File;
use std::path::Path;

use memmap::{Mmap, MmapOptions};

use crate::errors::ResultExt;
use crate::Error;

/// Maps a file read-only. The caller keeps the `File` alive for as long as
/// the map is in use. Zero-length files cannot be mapped and must be
/// handled by the caller.
pub fn read<P>(path: P) -> Result<(File, Mmap), Error>
where
    P: AsRef<Path>,
{
    let file = File::open(&path).io_err(&path)?;
    let len = file.metadata().io_err(&path)?.len() as usize;

    let mut opts = MmapOptions::new();
    opts.len(len);

    let mmap = unsafe { opts.map(&file) };
    let mmap = mmap.io_err(&path)?;

    Ok((file, mmap))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    use crate::testing;

    #[test]
    fn read_whole_file() {
        let file = testing::temp_file(".bin");
        {
            let mut f = File::create(&file).unwrap();
            f.write_all(b"segmented").unwrap();
        }

        let (_file, map) = read(&file).unwrap();
        assert_eq!(&map[..], b"segmented");
    }
}
