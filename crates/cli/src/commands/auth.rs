//! Sign-in commands.

use greenshoes_client::{RegisterForm, Storefront};

use super::{CommandError, output};

pub async fn login(store: &Storefront, login: &str, password: &str) -> Result<(), CommandError> {
    let user = store.login(login, password).await?;
    output::line(format_args!("Signed in as {}", user.name));
    Ok(())
}

pub async fn register(
    store: &Storefront,
    full_name: String,
    email: String,
    password: String,
    confirm_password: String,
) -> Result<(), CommandError> {
    let form = RegisterForm {
        full_name,
        email,
        password,
        confirm_password,
    };
    let user = store.register(&form).await?;
    output::line(format_args!("Welcome, {}", user.name));
    Ok(())
}

pub fn logout(store: &Storefront) {
    store.logout();
    output::line("Signed out.");
}

pub fn whoami(store: &Storefront) {
    match store.identity().current_user() {
        Some(user) => output::user(&user),
        None => output::line(format_args!("Guest {}", store.session().guest_id())),
    }
}

pub async fn check_email(store: &Storefront, email: &str) -> Result<(), CommandError> {
    let exists = store.identity().check_email(email).await?;
    if exists {
        output::line("An account already uses this email.");
    } else {
        output::line("This email is available.");
    }
    Ok(())
}
