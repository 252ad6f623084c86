use std::env;

use clickhouse::Client;

fn read_env_var(key: &str) -> Option<String> {
    env::var(key).ok()
}

/// Client for the postcode coordinate database, if the connection variables
/// are set. `CLICKHOUSE_PASSWORD` may be left unset for passwordless users.
pub fn try_get_client() -> Option<Client> {
    let url = read_env_var("CLICKHOUSE_URL")?;
    let user = read_env_var("CLICKHOUSE_USER")?;
    let database = read_env_var("CLICKHOUSE_DATABASE")?;

    log::info!("Using ClickHouse at {} (database {})", url, database);
    let client = Client::default()
        .with_url(url)
        .with_user(user)
        .with_database(database)
        // Average price updates are mutations; wait for them to apply
        .with_option("mutations_sync", "1");

    Some(match read_env_var("CLICKHOUSE_PASSWORD") {
        Some(password) => client.with_password(password),
        None => client,
    })
}
