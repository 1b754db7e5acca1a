use keycloak_provisioner::AppResources;
use keycloak_provisioner::api::start_webserver;
use keycloak_provisioner::config::load_config;
use keycloak_provisioner::logging::init_tracing;

#[tokio::main]
async fn main() -> color_eyre::eyre::Result<()> {
    color_eyre::install().expect("Failed to install `color_eyre::install`");
    dotenvy::dotenv().ok();

    // Config comes first: it decides where logs go.
    let config = load_config()?;
    let _log_guard = init_tracing(&config.logger);

    tracing::info!(
        host = %config.keycloak.host,
        realms = ?config.keycloak.realms,
        mode = ?config.provisioning.mode,
        legacy_passwords = %config.provisioning.legacy_passwords,
        "identity provider configuration"
    );
    if config.provisioning.legacy_passwords {
        tracing::warn!("legacy_passwords is enabled: temporary passwords are predictable");
    }

    let resources = AppResources::from_config(config)?;
    start_webserver(resources).await?;
    Ok(())
}
