use blacklake::{Client, ClientConfig};
use serde_json::{Value, json};
use std::time::Duration;
use wiremock::MockServer;

pub const TIMESTAMP: &str = "2024-03-01T10:00:00Z";

pub fn client_for(server: &MockServer) -> Client {
    Client::new(ClientConfig::new(server.uri()).with_timeout(Duration::from_secs(5)))
        .expect("client builds")
}

pub fn client_with_key(server: &MockServer, key: &str) -> Client {
    Client::new(
        ClientConfig::new(server.uri())
            .with_api_key(key)
            .with_timeout(Duration::from_secs(5)),
    )
    .expect("client builds")
}

pub fn repository_json(name: &str) -> Value {
    json!({
        "id": format!("id-{}", name),
        "name": name,
        "description": "quarterly ledgers",
        "created_at": TIMESTAMP,
        "updated_at": TIMESTAMP,
        "tenant_id": "t-1"
    })
}

pub fn export_json(id: &str, status: &str) -> Value {
    let download_url = if status == "completed" {
        Value::from("https://dl.example.com/e.zip")
    } else {
        Value::Null
    };
    json!({
        "export_id": id,
        "status": status,
        "created_at": TIMESTAMP,
        "download_url": download_url
    })
}
