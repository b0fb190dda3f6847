use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use corral_models::{CompositeServiceRequest, Service, ServiceDetail};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::commands::server::{api_url, ensure_server_running};

/// Thin HTTP client for the management API
struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    tenant: String,
}

impl ApiClient {
    fn from_env(tenant: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: api_url(),
            token: std::env::var("CORRAL_API_TOKEN").ok().filter(|t| !t.is_empty()),
            tenant,
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/api/{}{}", self.base_url, self.tenant, path);
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = builder
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to connect to API: {}", e))?;
        decode(response).await
    }
}

/// Turn an error body `{"error", "message"}` into an anyhow error
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return response.json().await.context("Invalid API response");
    }

    let body: serde_json::Value = response.json().await.unwrap_or_default();
    let kind = body["error"].as_str().unwrap_or("error");
    let message = body["message"].as_str().unwrap_or("no details");
    anyhow::bail!("{} ({}): {}", kind, status, message)
}

fn read_request(file: &Path) -> Result<CompositeServiceRequest> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    // YAML is a superset of JSON, so either format parses
    serde_yaml::from_str(&raw).with_context(|| format!("Invalid request in {}", file.display()))
}

pub async fn run_create(file: PathBuf, tenant: String) -> Result<()> {
    let request = read_request(&file)?;
    ensure_server_running().await?;

    let client = ApiClient::from_env(tenant);
    let detail: ServiceDetail = client
        .send(client.request(Method::POST, "/services").json(&request))
        .await?;

    println!("✓ Service created");
    println!();
    print_detail(&detail);
    Ok(())
}

pub async fn run_get(cluster: String, name: String, tenant: String, output: String) -> Result<()> {
    ensure_server_running().await?;

    let client = ApiClient::from_env(tenant);
    let path = format!("/clusters/{}/services/{}", cluster, name);
    let detail: ServiceDetail = client.send(client.request(Method::GET, &path)).await?;

    if output == "json" {
        println!("{}", serde_json::to_string_pretty(&detail)?);
    } else {
        print_detail(&detail);
    }
    Ok(())
}

pub async fn run_list(cluster: String, tenant: String, output: String) -> Result<()> {
    ensure_server_running().await?;

    let client = ApiClient::from_env(tenant);
    let path = format!("/clusters/{}/services", cluster);
    let services: Vec<Service> = client.send(client.request(Method::GET, &path)).await?;

    if output == "json" {
        println!("{}", serde_json::to_string_pretty(&services)?);
        return Ok(());
    }

    println!(
        "{:<20} {:<10} {:<8} {:<8} {:<20}",
        "NAME", "STATUS", "DESIRED", "RUNNING", "TASK TEMPLATE"
    );
    println!("{}", "-".repeat(70));
    for service in &services {
        println!(
            "{:<20} {:<10} {:<8} {:<8} {:<20}",
            service.name,
            format!("{:?}", service.status).to_uppercase(),
            service.desired_count,
            service.running_count,
            service.task_template
        );
    }
    println!();
    println!("{} service(s) found on cluster {}", services.len(), cluster);
    Ok(())
}

pub async fn run_delete(
    cluster: String,
    name: String,
    recursive: bool,
    wait: u64,
    tenant: String,
) -> Result<()> {
    ensure_server_running().await?;

    let client = ApiClient::from_env(tenant);
    let path = format!(
        "/clusters/{}/services/{}?recursive={}&wait_secs={}",
        cluster, name, recursive, wait
    );
    if recursive {
        println!("Deleting {}/{} and its dependencies (waiting up to {}s)...", cluster, name, wait);
    }
    let deletion: serde_json::Value = client.send(client.request(Method::DELETE, &path)).await?;

    println!("✓ Service {}/{} deleted", cluster, name);
    if let Some(template) = deletion["task_template"].as_object() {
        println!(
            "  Task template:  {}:{} deregistered",
            template["family"].as_str().unwrap_or("-"),
            template["revision"]
        );
    }
    if let Some(secrets) = deletion["deleted_secrets"].as_array() {
        for secret in secrets {
            println!("  Secret:         {} scheduled for deletion", secret.as_str().unwrap_or("-"));
        }
    }
    if let Some(teardowns) = deletion["teardowns"].as_array() {
        for teardown in teardowns {
            println!(
                "  {:<15} {} -> {}",
                format!("{}:", teardown["resource"].as_str().unwrap_or("-")),
                teardown["id"].as_str().unwrap_or("-"),
                teardown["outcome"].as_str().unwrap_or("-")
            );
            if let Some(error) = teardown["error"].as_str() {
                println!("                  {}", error);
            }
        }
    }
    Ok(())
}

fn print_detail(detail: &ServiceDetail) {
    let service = &detail.service;
    println!("Service: {}/{}", service.cluster, service.name);
    println!("{}", "=".repeat(60));
    println!();
    println!("Status:");
    println!("  State:          {:?}", service.status);
    println!(
        "  Tasks:          {} running, {} pending, {} desired",
        service.running_count, service.pending_count, service.desired_count
    );
    println!();
    println!("Task Template:");
    println!("  Revision:       {}", detail.task_template.id());
    for container in &detail.task_template.containers {
        println!("  Container:      {} ({})", container.name, container.image);
    }
    println!();
    println!("Network:");
    println!(
        "  Endpoint:       {}",
        detail.endpoint.as_deref().unwrap_or("-")
    );
    println!("  ARN:            {}", service.arn);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_yaml_request() {
        let dir = std::env::temp_dir().join(format!("corral-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("web.yaml");
        std::fs::write(
            &file,
            "service:\n  name: web\n  cluster: shared\n  task_template: web:3\n",
        )
        .unwrap();

        let request = read_request(&file).unwrap();

        let service = request.service.unwrap();
        assert_eq!(service.cluster.as_deref(), Some("shared"));
        assert_eq!(service.task_template.as_deref(), Some("web:3"));
        std::fs::remove_dir_all(&dir).ok();
    }
}
