//! Fixed-size chunker for splitting a byte stream into ordered fragments.

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::ChunkError;

/// One slice of the original file: its 0-based ordinal and its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Position within the file, 0-based and contiguous.
    pub index: u32,
    /// The raw fragment bytes.
    pub data: Bytes,
}

impl Fragment {
    /// Fragment length in bytes.
    pub fn size(&self) -> u32 {
        self.data.len() as u32
    }
}

/// Fixed-size chunker.
///
/// All fragments have exactly `chunk_size` bytes except possibly the final
/// one, which carries the remainder (`total mod chunk_size`) — a
/// zero-length final fragment is never produced. Empty input produces zero
/// fragments.
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    chunk_size: u32,
}

impl Chunker {
    /// Create a chunker with the given fragment size in bytes.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size` is zero. Runtime-supplied sizes are
    /// validated at configuration load, before a `Chunker` exists.
    pub fn new(chunk_size: u32) -> Self {
        assert!(chunk_size > 0, "chunk_size must be positive");
        Self { chunk_size }
    }

    /// The configured fragment size.
    pub fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    /// Number of fragments a file of `total_size` bytes splits into:
    /// `ceil(total_size / chunk_size)`, and 0 for an empty file.
    pub fn fragment_count(&self, total_size: u64) -> u32 {
        (total_size.div_ceil(u64::from(self.chunk_size))) as u32
    }

    /// Lazily split `data` into ordered fragments.
    ///
    /// The returned iterator borrows `data` and yields fragments in index
    /// order as it is consumed.
    pub fn split<'a>(&self, data: &'a [u8]) -> impl Iterator<Item = Fragment> + 'a {
        data.chunks(self.chunk_size as usize)
            .enumerate()
            .map(|(index, slice)| Fragment {
                index: index as u32,
                data: Bytes::copy_from_slice(slice),
            })
    }
}

/// Lazily splits an async byte stream into ordered fragments.
///
/// Consumes the underlying reader as fragments are pulled; once consumed it
/// cannot be restarted.
pub struct StreamSplitter<R> {
    reader: R,
    chunk_size: usize,
    next_index: u32,
    done: bool,
}

impl<R: AsyncRead + Unpin> StreamSplitter<R> {
    /// Wrap a reader, producing fragments of `chunk_size` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size` is zero.
    pub fn new(reader: R, chunk_size: u32) -> Self {
        assert!(chunk_size > 0, "chunk_size must be positive");
        Self {
            reader,
            chunk_size: chunk_size as usize,
            next_index: 0,
            done: false,
        }
    }

    /// Pull the next fragment, or `Ok(None)` at end of stream.
    pub async fn next_fragment(&mut self) -> Result<Option<Fragment>, ChunkError> {
        if self.done {
            return Ok(None);
        }

        let mut buf = vec![0u8; self.chunk_size];
        let mut filled = 0;

        // Read exactly chunk_size bytes, or until EOF.
        while filled < self.chunk_size {
            let n = self.reader.read(&mut buf[filled..]).await?;
            if n == 0 {
                self.done = true;
                break;
            }
            filled += n;
        }

        if filled == 0 {
            return Ok(None);
        }

        buf.truncate(filled);
        let fragment = Fragment {
            index: self.next_index,
            data: Bytes::from(buf),
        };
        self.next_index += 1;
        Ok(Some(fragment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(chunker: &Chunker, data: &[u8]) -> Vec<Fragment> {
        chunker.split(data).collect()
    }

    #[test]
    fn test_split_empty_data() {
        let chunker = Chunker::new(1024);
        assert!(collect(&chunker, b"").is_empty());
        assert_eq!(chunker.fragment_count(0), 0);
    }

    #[test]
    fn test_split_exactly_chunk_size() {
        let chunker = Chunker::new(16);
        let data = vec![0xABu8; 16];
        let fragments = collect(&chunker, &data);
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].index, 0);
        assert_eq!(fragments[0].data, data.as_slice());
    }

    #[test]
    fn test_split_chunk_size_plus_one() {
        let chunker = Chunker::new(16);
        let data = vec![0xCDu8; 17];
        let fragments = collect(&chunker, &data);
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].size(), 16);
        assert_eq!(fragments[1].size(), 1);
        assert_eq!(fragments[1].index, 1);
    }

    #[test]
    fn test_split_exact_multiple_no_empty_tail() {
        let chunker = Chunker::new(100);
        let data = vec![0u8; 300];
        let fragments = collect(&chunker, &data);
        assert_eq!(fragments.len(), 3);
        assert!(fragments.iter().all(|f| f.size() == 100));
    }

    #[test]
    fn test_split_short_final_fragment() {
        // 10,000 bytes at 4096 splits into 4096, 4096, 1808.
        let chunker = Chunker::new(4096);
        let data = vec![7u8; 10_000];
        let fragments = collect(&chunker, &data);
        assert_eq!(fragments.len(), 3);
        assert_eq!(
            fragments.iter().map(Fragment::size).collect::<Vec<_>>(),
            [4096, 4096, 1808]
        );
        assert_eq!(
            fragments.iter().map(|f| f.index).collect::<Vec<_>>(),
            [0, 1, 2]
        );
    }

    #[test]
    fn test_fragment_count_ceiling() {
        let chunker = Chunker::new(4096);
        assert_eq!(chunker.fragment_count(1), 1);
        assert_eq!(chunker.fragment_count(4096), 1);
        assert_eq!(chunker.fragment_count(4097), 2);
        assert_eq!(chunker.fragment_count(10_000), 3);
    }

    #[test]
    fn test_split_is_lazy() {
        let chunker = Chunker::new(4);
        let data = vec![0u8; 1024];
        let mut iter = chunker.split(&data);
        // Pulling one fragment must not require consuming the rest.
        assert_eq!(iter.next().unwrap().index, 0);
        assert_eq!(iter.next().unwrap().index, 1);
    }

    #[test]
    #[should_panic(expected = "chunk_size must be positive")]
    fn test_zero_chunk_size_panics() {
        let _ = Chunker::new(0);
    }

    #[tokio::test]
    async fn test_stream_matches_sync() {
        let chunker = Chunker::new(10);
        let data = b"hello world, this is streaming splitter test data!";

        let sync: Vec<Fragment> = chunker.split(data).collect();

        let mut splitter = StreamSplitter::new(std::io::Cursor::new(data), 10);
        let mut streamed = Vec::new();
        while let Some(fragment) = splitter.next_fragment().await.unwrap() {
            streamed.push(fragment);
        }

        assert_eq!(sync, streamed);
    }

    #[tokio::test]
    async fn test_stream_empty() {
        let mut splitter = StreamSplitter::new(std::io::Cursor::new(b""), 1024);
        assert_eq!(splitter.next_fragment().await.unwrap(), None);
        // Still None on repeated pulls.
        assert_eq!(splitter.next_fragment().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_stream_not_restartable() {
        let data = vec![1u8; 32];
        let mut splitter = StreamSplitter::new(std::io::Cursor::new(data), 16);
        while splitter.next_fragment().await.unwrap().is_some() {}
        // The source is consumed; pulling again yields nothing.
        assert_eq!(splitter.next_fragment().await.unwrap(), None);
    }
}
