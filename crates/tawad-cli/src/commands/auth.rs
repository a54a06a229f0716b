use crate::commands::common::build_context;
use crate::error::CliError;
use crate::session_store::SessionStore;

pub async fn run_login(
    profile: Option<&str>,
    email: &str,
    password: &str,
) -> Result<(), CliError> {
    let context = build_context(profile)?;
    let session = context.api.login(email, password).await?;
    SessionStore::new(&context.profile_name).save(&session)?;

    println!(
        "Signed in as {} ({})",
        session.user.display_name, session.user.id
    );
    Ok(())
}

pub async fn run_status(profile: Option<&str>) -> Result<(), CliError> {
    let context = build_context(profile)?;
    let store = SessionStore::new(&context.profile_name);

    match store.load()? {
        Some(session) => {
            println!(
                "Profile '{}': signed in as {} ({})",
                context.profile_name, session.user.display_name, session.user.id
            );
            // Check the token against the API without failing the command
            context
                .api
                .set_access_token(Some(session.token.clone()))
                .await;
            match context.api.profile().await {
                Ok(_) => println!("Session is valid"),
                Err(error) => println!("Session check failed: {error}"),
            }
        }
        None => println!("Profile '{}': not signed in", context.profile_name),
    }
    Ok(())
}

pub fn run_logout(profile: Option<&str>) -> Result<(), CliError> {
    let context = build_context(profile)?;
    SessionStore::new(&context.profile_name).clear()?;
    println!("Signed out of profile '{}'", context.profile_name);
    Ok(())
}
