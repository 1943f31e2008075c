use clap::ValueEnum;
use mrf_extractor::Compression;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum CompressionFlag {
    Auto,
    Gzip,
    Plain,
}

impl CompressionFlag {
    pub(crate) const fn as_domain(self) -> Compression {
        match self {
            CompressionFlag::Auto => Compression::Auto,
            CompressionFlag::Gzip => Compression::Gzip,
            CompressionFlag::Plain => Compression::Plain,
        }
    }
}
