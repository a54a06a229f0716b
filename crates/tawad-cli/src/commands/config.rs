use crate::error::CliError;
use crate::profiles::CliProfilesConfig;

pub fn run_init(
    profile: Option<&str>,
    api_base_url: Option<String>,
    events_url: Option<String>,
    api_key: Option<String>,
    no_activate: bool,
) -> Result<(), CliError> {
    let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile);

    let entry = config.profile_mut_or_default(&profile_name);
    if api_base_url.is_some() {
        entry.api_base_url = api_base_url;
    }
    if events_url.is_some() {
        entry.events_url = events_url;
    }
    if api_key.is_some() {
        entry.api_key = api_key;
    }

    if !no_activate {
        config.active_profile = Some(profile_name.clone());
    }

    let path = config.save().map_err(CliError::Config)?;
    println!("Profile '{profile_name}' saved to {}", path.display());
    Ok(())
}

pub fn run_show(profile: Option<&str>) -> Result<(), CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile);

    match config.profile(&profile_name) {
        Some(entry) => {
            println!("Profile: {profile_name}");
            println!(
                "  api_base_url: {}",
                entry.api_base_url().as_deref().unwrap_or("(unset)")
            );
            println!(
                "  events_url:   {}",
                entry.events_url().as_deref().unwrap_or("(inherits api_base_url)")
            );
            println!(
                "  api_key:      {}",
                if entry.api_key().is_some() {
                    "(set)"
                } else {
                    "(unset)"
                }
            );
        }
        None => println!("Profile '{profile_name}' is not configured"),
    }
    Ok(())
}
