//! `vaultlink links`: print the web app's session links

use anyhow::Result;
use url::Url;
use vaultlink_core::links;

pub fn render(origin: &Url, page_path: &str) -> Result<Vec<(&'static str, Url)>> {
    let here = origin.join(page_path)?;
    Ok(vec![
        ("login", origin.join(&links::login_url(&here))?),
        ("signup", origin.join(&links::signup_url())?),
        ("logout", origin.join(&links::logout_url(&here))?),
        ("connect", origin.join(&links::connect_account_url(&here))?),
    ])
}

pub fn execute(origin: &Url, page_path: &str) -> Result<()> {
    for (label, url) in render(origin, page_path)? {
        println!("{:<8} {}", label, url);
    }
    Ok(())
}
