//! `offmap login` and `offmap logout`

use console::style;
use dialoguer::Password;
use offmap::auth::{AuthGate, TokenFileGate};
use offmap::config::ConfigFile;

use crate::error::CliError;

pub fn login(config: &ConfigFile, token: Option<String>) -> Result<(), CliError> {
    let gate = TokenFileGate::new(&config.auth.token_file);
    let token = match token {
        Some(token) => token,
        None => Password::new().with_prompt("Identity token").interact()?,
    };

    gate.save_token(&token)?;
    if gate.status().is_signed_in() {
        println!("{} Signed in", style("✓").green().bold());
    } else {
        println!("{}", style("Token saved, but it has already expired.").yellow());
    }
    Ok(())
}

pub fn logout(config: &ConfigFile) -> Result<(), CliError> {
    TokenFileGate::new(&config.auth.token_file).clear()?;
    println!("{} Signed out", style("✓").green().bold());
    Ok(())
}
