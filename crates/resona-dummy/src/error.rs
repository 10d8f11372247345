use std::io;

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("failed to spawn worker thread")]
    ThreadSpawn(#[source] io::Error),

    #[error("worker thread crashed")]
    ThreadCrashed,
}

pub type Result<T> = std::result::Result<T, Error>;
