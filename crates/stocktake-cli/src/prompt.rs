//! Interactive credential recovery for 401s.

use std::io::{BufRead, Write};

use stocktake_api::{Credential, CredentialSource};

/// Prompts the operator on stderr and reads a replacement pair from stdin.
/// Returns `None` on EOF or blank input, which ends the run once the
/// rotation budget is spent. The password echoes.
pub struct StdinCredentials;

impl CredentialSource for StdinCredentials {
    fn next_credential(&self) -> Option<Credential> {
        let stdin = std::io::stdin();
        let mut lines = stdin.lock().lines();

        eprint!("API login: ");
        std::io::stderr().flush().ok();
        let login = lines.next()?.ok()?;

        eprint!("API password: ");
        std::io::stderr().flush().ok();
        let secret = lines.next()?.ok()?;

        let login = login.trim();
        let secret = secret.trim();
        if login.is_empty() || secret.is_empty() {
            return None;
        }
        Some(Credential {
            login: login.to_owned(),
            secret: secret.to_owned(),
        })
    }
}
