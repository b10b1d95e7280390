//! Transport retry for Zenodo and GitLab requests.
//!
//! A request that never produced a response (refused connection, DNS
//! failure, timeout) is sent again after a growing pause. Any response,
//! whatever its status, ends the loop and is handed back to the client,
//! which maps the status into a `SourceError`.

use std::time::Duration;

use reqwest::blocking::Response;

/// Resends after the first failed attempt.
const RESENDS: u32 = 3;

/// Pause before the first resend; doubled for each one after it.
const FIRST_PAUSE: Duration = Duration::from_millis(200);

/// Pause before resend number `resend` (1-based).
fn pause_before(resend: u32) -> Duration {
    FIRST_PAUSE * 2u32.pow(resend.saturating_sub(1))
}

/// Run `send` until it yields a response or the resends are used up.
pub(crate) fn retry_send<F>(endpoint: &str, send: F) -> Result<Response, reqwest::Error>
where
    F: Fn() -> Result<Response, reqwest::Error>,
{
    let mut outcome = send();
    let mut resend = 0;
    while let Err(e) = &outcome {
        if resend == RESENDS {
            break;
        }
        resend += 1;
        let pause = pause_before(resend);
        tracing::warn!(
            attempt = resend,
            max_retries = RESENDS,
            endpoint,
            error = %e,
            pause_ms = pause.as_millis() as u64,
            "no response from remote source, resending"
        );
        std::thread::sleep(pause);
        outcome = send();
    }
    outcome
}
