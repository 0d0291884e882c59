use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Browser(#[from] keepfresh_browser::Error),

    #[error("Portal session error: {0}")]
    Session(String),
}

pub type Result<T> = std::result::Result<T, Error>;
