// src/index/client.rs
// =============================================================================
// Queries the CDX index and turns its answer into snapshot descriptors.
//
// The index answers with a JSON table of strings:
//
//   [["timestamp","digest","length"],
//    ["20200101000000","3I42H3S6NNFQ2MSVX7XZKYAYSCX5QBYJ","1024"],
//    ...]
//
// Row 0 is a header and is dropped. Every other row must carry at least the
// three requested columns. A short row means we are not talking to the
// index we think we are, so it is an error rather than something to skip.
// =============================================================================

use log::{debug, info};
use reqwest::Client;
use thiserror::Error;

use crate::snapshot::SnapshotDescriptor;

/// Everything that can go wrong while listing snapshots. All of it is fatal.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("index request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("index request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("index response is not a JSON table of strings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("index row {row} has {columns} column(s), expected at least 3")]
    MalformedRow { row: usize, columns: usize },
}

/// Performs the index query and returns descriptors in index order.
pub async fn fetch_snapshots(
    client: &Client,
    request_url: &str,
) -> Result<Vec<SnapshotDescriptor>, IndexError> {
    info!("Querying index: {}", request_url);

    let transport = |source: reqwest::Error| IndexError::Transport {
        url: request_url.to_string(),
        source,
    };

    let response = client.get(request_url).send().await.map_err(transport)?;

    let status = response.status();
    if !status.is_success() {
        return Err(IndexError::Status {
            url: request_url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response.bytes().await.map_err(transport)?;
    debug!("Index answered with {} byte(s)", body.len());

    let descriptors = parse_index_rows(&body)?;
    info!("Index listed {} snapshot(s)", descriptors.len());
    Ok(descriptors)
}

/// Parses the raw index body into descriptors, dropping the header row.
pub fn parse_index_rows(body: &[u8]) -> Result<Vec<SnapshotDescriptor>, IndexError> {
    let rows: Vec<Vec<String>> = serde_json::from_slice(body)?;

    rows.into_iter()
        .enumerate()
        .skip(1)
        .map(|(row, columns)| {
            // Destructure by value so we move the strings out instead of cloning
            let mut columns = columns.into_iter();
            match (columns.next(), columns.next(), columns.next()) {
                (Some(timestamp), Some(digest), Some(length)) => Ok(SnapshotDescriptor {
                    timestamp,
                    digest,
                    length,
                }),
                (a, b, _) => Err(IndexError::MalformedRow {
                    row,
                    columns: a.iter().count() + b.iter().count(),
                }),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TABLE: &str = r#"[["timestamp","digest","length"],
        ["20200101000000","abc","100"],
        ["20200601000000","def","120"]]"#;

    #[test]
    fn test_header_is_dropped_and_order_kept() {
        let descriptors = parse_index_rows(TABLE.as_bytes()).unwrap();
        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0].timestamp, "20200101000000");
        assert_eq!(descriptors[0].digest, "abc");
        assert_eq!(descriptors[0].length, "100");
        assert_eq!(descriptors[1].timestamp, "20200601000000");
    }

    #[test]
    fn test_extra_columns_are_ignored() {
        let body = br#"[["timestamp","digest","length","x"],["20200101000000","abc","100","extra"]]"#;
        let descriptors = parse_index_rows(body).unwrap();
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].length, "100");
    }

    #[test]
    fn test_empty_table_yields_nothing() {
        assert!(parse_index_rows(b"[]").unwrap().is_empty());
        assert!(parse_index_rows(br#"[["timestamp","digest","length"]]"#)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_short_row_is_an_error() {
        let body = br#"[["timestamp","digest","length"],["20200101000000","abc","100"],["20200601000000","def"]]"#;
        match parse_index_rows(body) {
            Err(IndexError::MalformedRow { row, columns }) => {
                assert_eq!(row, 2);
                assert_eq!(columns, 2);
            }
            other => panic!("expected MalformedRow, got {:?}", other),
        }
    }

    #[test]
    fn test_non_json_body_is_an_error() {
        let result = parse_index_rows(b"<html>rate limited</html>");
        assert!(matches!(result, Err(IndexError::Parse(_))));
    }

    #[test]
    fn test_non_string_cells_are_an_error() {
        let result = parse_index_rows(br#"[["timestamp"],[20200101000000, 1, 2]]"#);
        assert!(matches!(result, Err(IndexError::Parse(_))));
    }

    #[tokio::test]
    async fn test_fetch_snapshots_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cdx/search/cdx"))
            .and(query_param("url", "example.com"))
            .and(query_param("output", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(TABLE))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!(
            "{}/cdx/search/cdx?url=example.com&output=json&fl=timestamp,digest,length",
            server.uri()
        );
        let descriptors = fetch_snapshots(&Client::new(), &url).await.unwrap();
        assert_eq!(descriptors.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_snapshots_rejects_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let url = format!("{}/cdx/search/cdx?url=example.com", server.uri());
        let result = fetch_snapshots(&Client::new(), &url).await;
        assert!(matches!(result, Err(IndexError::Status { status: 429, .. })));
    }
}
