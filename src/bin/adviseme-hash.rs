//! Generate Argon2id password hashes for the web form's login gate.

use adviseme::auth::hash_password;
use anyhow::{bail, Context, Result};
use clap::Parser;
use std::io::{self, BufRead};

/// Hash one or more passwords for ADVISEME_PASSWORD_HASH.
#[derive(Parser, Debug)]
#[command(
    name = "adviseme-hash",
    version,
    about = "Generate Argon2id password hashes for the AdviseMe login gate",
    long_about = "Hash each PASSWORD given on the command line. With no arguments, one \
password is read from the first line of stdin so it does not end up in shell history."
)]
struct Cli {
    /// Passwords to hash.
    passwords: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let passwords = if cli.passwords.is_empty() {
        let mut line = String::new();
        io::stdin()
            .lock()
            .read_line(&mut line)
            .context("Failed to read password from stdin")?;
        let password = line.trim_end_matches(['\r', '\n']).to_string();
        if password.is_empty() {
            bail!("No password given on the command line or stdin");
        }
        vec![password]
    } else {
        cli.passwords
    };

    println!("Generated password hashes:");
    for (i, password) in passwords.iter().enumerate() {
        let hash = hash_password(password).with_context(|| format!("Failed to hash password {}", i + 1))?;
        println!("  Password {}: {}", i + 1, hash);
    }

    println!();
    println!("Set ADVISEME_USERNAME and ADVISEME_PASSWORD_HASH (in .env or the environment)");
    println!("to require this login before the upload form is shown.");
    println!("In a .env file, wrap the hash in single quotes: the '$' characters are literal.");

    Ok(())
}
