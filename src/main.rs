use clap::Parser;
use log::error;
use std::process::ExitCode;
use whatsapp_tui::commands;
use whatsapp_tui::config::Cli;
use whatsapp_tui::error::{AppError, ExitStatus};
use whatsapp_tui::logging::{self, LogTarget};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let owns_terminal = cli.command.owns_terminal();

    let target = if owns_terminal {
        LogTarget::File(cli.log_file.clone())
    } else {
        LogTarget::Stderr
    };
    if let Err(e) = logging::init(&target) {
        eprintln!("{}", AppError::Logging(e));
        return ExitStatus::Generic.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            let err = AppError::Runtime(e);
            error!("{err}");
            eprintln!("{err}");
            return err.exit_status().into();
        }
    };

    match rt.block_on(commands::run(cli.command)) {
        Ok(()) => ExitStatus::Success.into(),
        Err(err) => {
            error!("{err}");
            // The log went to a file; the user still needs to see why we quit.
            if owns_terminal {
                eprintln!("Error: {err}");
            }
            err.exit_status().into()
        }
    }
}
