use std::fmt;
use std::io::Read;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    Tar(Compression),
}

/// Compression codec wrapping a tar stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compression {
    Gzip,
    Bzip2,
}

impl Compression {
    /// Wrap `reader` in the streaming decoder for this codec.
    pub fn decoder<'r, R: Read + 'r>(self, reader: R) -> Box<dyn Read + 'r> {
        match self {
            Self::Gzip => Box::new(flate2::read::GzDecoder::new(reader)),
            Self::Bzip2 => Box::new(bzip2::read::BzDecoder::new(reader)),
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zip => f.write_str("zip"),
            Self::Tar(Compression::Gzip) => f.write_str("tar.gz"),
            Self::Tar(Compression::Bzip2) => f.write_str("tar.bz2"),
        }
    }
}
