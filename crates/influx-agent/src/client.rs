// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! HTTP client for the InfluxDB line-protocol write endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, info};

use crate::errors::{Creation, Write};

/// Destination for line-protocol records. Agents only talk to the database through this trait.
#[async_trait]
pub trait RecordWriter: Send + Sync {
    /// Writes one record.
    async fn write_string(&self, record: &str) -> Result<(), Write>;

    /// Writes records in order and stops at the first failure.
    async fn write_strings(&self, records: &[String]) -> Result<(), Write> {
        for record in records {
            self.write_string(record).await?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct InfluxDbClient {
    client: reqwest::Client,
    host: String,
    port: u16,
    database: String,
}

impl InfluxDbClient {
    /// Builds a client for `http://{host}:{port}/write?db={database}`. Every request is bounded
    /// by `timeout`.
    pub fn new(host: &str, port: u16, database: &str, timeout: Duration) -> Result<Self, Creation> {
        if host.is_empty() || port == 0 || database.is_empty() {
            return Err(Creation::InvalidTarget {
                host: host.to_string(),
                port,
                database: database.to_string(),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(Creation::HttpClient)?;

        info!("Created InfluxDB Client: host={host}, port={port}, database={database}");
        Ok(Self {
            client,
            host: host.to_string(),
            port,
            database: database.to_string(),
        })
    }

    pub fn write_url(&self) -> String {
        format!(
            "http://{}:{}/write?db={}",
            self.host, self.port, self.database
        )
    }
}

#[async_trait]
impl RecordWriter for InfluxDbClient {
    async fn write_string(&self, record: &str) -> Result<(), Write> {
        if record.is_empty() {
            return Err(Write::EmptyRecord);
        }

        let resp = self
            .client
            .post(self.write_url())
            .body(record.to_string())
            .send()
            .await
            .map_err(Write::Request)?;

        match resp.status() {
            StatusCode::NO_CONTENT => {
                debug!("Wrote record of {} bytes", record.len());
                Ok(())
            }
            status => {
                let body = resp.text().await.map_err(Write::Request)?;
                Err(Write::UnexpectedStatus { status, body })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn client_for(server: &Server) -> InfluxDbClient {
        let address = server.host_with_port();
        let (host, port) = address.rsplit_once(':').unwrap();
        InfluxDbClient::new(host, port.parse().unwrap(), "metrics", Duration::from_secs(1))
            .unwrap()
    }

    #[test]
    fn test_new_rejects_missing_target() {
        let timeout = Duration::from_secs(1);
        assert!(matches!(
            InfluxDbClient::new("", 8086, "metrics", timeout),
            Err(Creation::InvalidTarget { .. })
        ));
        assert!(matches!(
            InfluxDbClient::new("localhost", 0, "metrics", timeout),
            Err(Creation::InvalidTarget { .. })
        ));
        assert!(matches!(
            InfluxDbClient::new("localhost", 8086, "", timeout),
            Err(Creation::InvalidTarget { .. })
        ));
    }

    #[test]
    fn test_write_url() {
        let client =
            InfluxDbClient::new("influx.local", 8086, "metrics", Duration::from_secs(1)).unwrap();
        assert_eq!(client.write_url(), "http://influx.local:8086/write?db=metrics");
    }

    #[tokio::test]
    async fn test_write_string_no_content_is_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/write")
            .match_query(Matcher::UrlEncoded("db".into(), "metrics".into()))
            .match_body("cpu,host=a value=1 100")
            .with_status(204)
            .create_async()
            .await;

        let client = client_for(&server);
        client.write_string("cpu,host=a value=1 100").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_write_string_other_status_carries_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/write")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("partial write")
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client.write_string("cpu value=1").await.unwrap_err();
        match err {
            Write::UnexpectedStatus { status, body } => {
                assert_eq!(status, StatusCode::OK);
                assert_eq!(body, "partial write");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_write_string_rejects_empty_record() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/write")
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let client = client_for(&server);
        assert!(matches!(
            client.write_string("").await,
            Err(Write::EmptyRecord)
        ));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_write_strings_stops_at_first_failure() {
        let mut server = Server::new_async().await;
        let ok = server
            .mock("POST", "/write")
            .match_query(Matcher::Any)
            .match_body("a value=1")
            .with_status(204)
            .expect(1)
            .create_async()
            .await;
        let failing = server
            .mock("POST", "/write")
            .match_query(Matcher::Any)
            .match_body("b value=2")
            .with_status(400)
            .with_body("bad")
            .expect(1)
            .create_async()
            .await;
        let never = server
            .mock("POST", "/write")
            .match_query(Matcher::Any)
            .match_body("c value=3")
            .with_status(204)
            .expect(0)
            .create_async()
            .await;

        let client = client_for(&server);
        let records = vec![
            "a value=1".to_string(),
            "b value=2".to_string(),
            "c value=3".to_string(),
        ];
        assert!(client.write_strings(&records).await.is_err());

        ok.assert_async().await;
        failing.assert_async().await;
        never.assert_async().await;
    }
}
