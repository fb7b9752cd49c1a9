use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};

pub const PASSWORD_ENV: &str = "BLOG_PASSWORD";

/// Password from `--password`, then `BLOG_PASSWORD`, then one line of stdin.
pub fn resolve_password(
    flag: Option<String>,
    lookup: impl Fn(&str) -> Option<String>,
    input: &mut impl BufRead,
) -> Result<String> {
    if let Some(password) = flag.or_else(|| lookup(PASSWORD_ENV)) {
        return Ok(password);
    }

    eprint!("Password: ");
    io::stderr().flush().context("failed to write password prompt")?;
    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("failed to read password from stdin")?;
    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        bail!("no password given; pass --password, set {PASSWORD_ENV} or type it on stdin");
    }
    Ok(password.to_string())
}

#[cfg(test)]
#[path = "tests/credentials_tests.rs"]
mod tests;
