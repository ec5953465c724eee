//! Interactive domain prompt

use std::io::{BufRead, Write};

use tokio_util::sync::CancellationToken;

use ct_core::{Domain, SetupError};

const DOMAIN_PROMPT: &str = "Enter the full domain you want to use (e.g., code.mydomain.com): ";

/// Ask the operator for the public domain
///
/// Reads a single line. Empty input or EOF yields `DomainRequired`; there is
/// no retry loop.
pub fn prompt_domain<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
) -> Result<Domain, SetupError> {
    writer.write_all(DOMAIN_PROMPT.as_bytes())?;
    writer.flush()?;

    let mut line = String::new();
    reader.read_line(&mut line)?;
    Domain::parse(&line)
}

/// Ask for the domain on a blocking thread, giving up when `cancel` fires
///
/// The read itself cannot be aborted. On cancellation the blocking thread is
/// left parked on the reader and `Interrupted` is returned at once, so the
/// caller should exit the process rather than wait for runtime shutdown.
pub async fn prompt_domain_until<R, W>(
    reader: R,
    writer: W,
    cancel: &CancellationToken,
) -> Result<Domain, SetupError>
where
    R: BufRead + Send + 'static,
    W: Write + Send + 'static,
{
    let read = tokio::task::spawn_blocking(move || {
        let (mut reader, mut writer) = (reader, writer);
        prompt_domain(&mut reader, &mut writer)
    });

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(SetupError::Interrupted),
        joined = read => joined.map_err(|e| {
            SetupError::Io(std::io::Error::new(std::io::ErrorKind::Other, e))
        })?,
    }
}
