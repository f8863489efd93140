use std::env;
use std::io::{self, BufRead, Write};

use anyhow::{Context, Result, bail};

pub const EMAIL_SENTINEL: &str = r"\q";

pub fn read_email_from_terminal() -> Result<String> {
    eprintln!("Please paste the email from OS");
    let stdin = io::stdin();
    read_email_text(stdin.lock(), EMAIL_SENTINEL, true)
}

pub fn read_email_text<R: BufRead>(reader: R, sentinel: &str, show_prompt: bool) -> Result<String> {
    let mut content = String::new();
    let mut lines = reader.lines();

    loop {
        if show_prompt {
            eprint!("({sentinel} to finish) > ");
            io::stderr().flush().ok();
        }

        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("failed to read email text")?;
        if line.trim() == sentinel {
            break;
        }
        content.push_str(line.trim());
        content.push('\n');
    }

    Ok(content)
}

pub fn resolve_password(user: &str) -> Result<String> {
    if let Ok(password) = env::var("PGPASSWORD") {
        return Ok(password);
    }

    eprint!("password for {user} > ");
    io::stderr().flush().ok();

    let mut password = String::new();
    let read = io::stdin()
        .lock()
        .read_line(&mut password)
        .context("failed to read password")?;
    if read == 0 {
        bail!("no password supplied for {user}");
    }

    Ok(password.trim_end_matches(['\r', '\n']).to_string())
}
