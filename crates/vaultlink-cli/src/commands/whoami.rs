//! `vaultlink whoami`: probe the web app session

use anyhow::{Context, Result};
use url::Url;
use vaultlink_core::{SessionProbe, UserProfile};

pub fn describe(profile: &UserProfile) -> String {
    let name = profile
        .name
        .as_deref()
        .or(profile.email.as_deref())
        .or(profile.sub.as_deref())
        .unwrap_or("unknown user");
    match (&profile.email, &profile.sub) {
        (Some(email), _) if profile.name.is_some() => format!("{} <{}>", name, email),
        (_, Some(sub)) if name != sub => format!("{} ({})", name, sub),
        _ => name.to_string(),
    }
}

pub async fn execute(origin: Url) -> Result<()> {
    let probe = SessionProbe::new(origin.clone());
    let profile = probe
        .profile()
        .await
        .with_context(|| format!("Failed to reach {}", origin))?;

    match profile {
        Some(profile) => println!("Logged in as {}", describe(&profile)),
        None => println!(
            "Not logged in. Visit {}",
            origin.join(&vaultlink_core::links::login_url(&origin))?
        ),
    }
    Ok(())
}
