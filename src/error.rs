use crate::bridge::BridgeError;
use crate::tui::TuiError;
use std::process::ExitCode;
use thiserror::Error;
use wacore::frame::FrameError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Failed to initialise session: {0:#}")]
    SessionInit(#[source] anyhow::Error),
    #[error("Failed to fetch joined groups: {0:#}")]
    GroupFetch(#[source] anyhow::Error),
    #[error("Failed to fetch contacts: {0:#}")]
    ContactFetch(#[source] anyhow::Error),
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    #[error(transparent)]
    Tui(#[from] TuiError),
    #[error("Failed to set up logging: {0:#}")]
    Logging(#[source] anyhow::Error),
    #[error("Failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Process exit statuses, one per failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitStatus {
    Success = 0,
    Generic = 1,
    SessionInit = 10,
    GroupFetch = 20,
    ContactFetch = 21,
    ServerStart = 22,
    ServerAccept = 23,
    ClientConnect = 24,
    ClientRun = 25,
    DataMarshal = 26,
    DataUnmarshal = 27,
    BridgeWrite = 28,
}

impl ExitStatus {
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status.code())
    }
}

impl AppError {
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            AppError::SessionInit(_) => ExitStatus::SessionInit,
            AppError::GroupFetch(_) => ExitStatus::GroupFetch,
            AppError::ContactFetch(_) => ExitStatus::ContactFetch,
            AppError::Bridge(err) => match err {
                BridgeError::Bind { .. } => ExitStatus::ServerStart,
                BridgeError::Accept(_) => ExitStatus::ServerAccept,
                BridgeError::Connect { .. } => ExitStatus::ClientConnect,
                BridgeError::Read(_) => ExitStatus::ClientRun,
                BridgeError::Write(_) => ExitStatus::BridgeWrite,
                BridgeError::Frame(FrameError::Encode { .. }) => ExitStatus::DataMarshal,
                BridgeError::Frame(_) => ExitStatus::DataUnmarshal,
            },
            AppError::Tui(_) => ExitStatus::ClientRun,
            AppError::Logging(_) | AppError::Runtime(_) => ExitStatus::Generic,
        }
    }
}
