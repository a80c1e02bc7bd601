//! Error types shared by the component lifecycle and framing subsystems.

use thiserror::Error;

use crate::component::State;
use crate::framing::codec::CodecError;
use crate::framing::compress::CompressError;

/// Errors surfaced by the lifecycle core.
#[derive(Debug, Error)]
pub enum Error {
    #[error("component '{0}' is already registered")]
    AlreadyRegistered(String),

    #[error("component '{0}' is not registered")]
    NotRegistered(String),

    #[error("wrong state: component is {current:?}, transition accepts {accepted:?}")]
    WrongState {
        current: State,
        accepted: &'static [State],
    },

    #[error("timer is already running")]
    AlreadyRunning,

    #[error("timer is not running")]
    NotRunning,

    #[error("invalid protocol version: received {received}, expected {expected}")]
    InvalidVersion { received: u8, expected: u8 },

    #[error("component hook failed: {0}")]
    Hook(#[from] anyhow::Error),

    #[error("object codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("compressor error: {0}")]
    Compress(#[from] CompressError),
}

pub type Result<T> = std::result::Result<T, Error>;
