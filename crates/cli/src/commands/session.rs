//! Sign-in, navigation and display preference commands.

use radapos_client::preferences::Theme;
use radapos_client::routes::{self, RouteDecision};
use secrecy::SecretString;

use super::{CliError, Terminal};

/// Sign in and persist the session.
///
/// # Errors
///
/// Returns error if the backend rejects the credentials.
pub async fn login(terminal: &Terminal, email: &str, password: String) -> Result<(), CliError> {
    let password = SecretString::from(password);
    let identity = terminal.client.login(email, &password).await?;
    println!(
        "Signed in as {} ({}). Start at {}",
        identity.name,
        identity.role.as_str(),
        routes::landing_path(identity.role)
    );
    Ok(())
}

/// Forget the stored session.
///
/// # Errors
///
/// Returns error if the stored keys cannot be removed.
pub fn logout(terminal: &Terminal) -> Result<(), CliError> {
    terminal.client.logout()?;
    println!("Signed out");
    Ok(())
}

pub fn whoami(terminal: &Terminal) {
    match terminal.session.identity() {
        Some(identity) => println!(
            "{} <{}> role={} active={}",
            identity.name,
            identity.email,
            identity.role.as_str(),
            identity.is_active
        ),
        None => println!("Not signed in"),
    }
}

/// Print what the route guard decides for `path`.
pub fn route(terminal: &Terminal, path: &str) {
    let identity = terminal.session.identity();
    match routes::guard(path, identity.as_ref()) {
        RouteDecision::Render(page) => println!("render {page:?}"),
        RouteDecision::Redirect(target) => println!("redirect {target}"),
        RouteDecision::NotFound => println!("not found"),
    }
}

/// Print or flip the stored theme.
///
/// # Errors
///
/// Returns error if the preference cannot be read or written.
pub fn theme(terminal: &Terminal, toggle: bool) -> Result<(), CliError> {
    let theme = if toggle {
        Theme::toggle(terminal.store.as_ref())?
    } else {
        Theme::load(terminal.store.as_ref())?
    };
    println!("{theme}");
    Ok(())
}
